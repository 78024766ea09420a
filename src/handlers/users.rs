use super::message_response;
use crate::core::error::{ApiError, ProviderError};
use crate::core::state::AppState;
use crate::dataprovider::queries::SortOrder;
use crate::models::api::ListUsersQuery;
use crate::models::user::User;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::Value;
use std::sync::Arc;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 500;

/// Paginated user listing. Credentials are never included.
///
/// GET /users?limit=<n>&offset=<n>&order=<ASC|DESC>&username=<name>
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListUsersQuery>, QueryRejection>,
) -> Result<Json<Vec<User>>, ApiError> {
    let Query(params) = query?;

    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    if limit < 0 {
        return Err(ApiError::BadRequest("Invalid limit".to_string()));
    }
    let limit = limit.min(MAX_LIMIT);

    let offset = params.offset.unwrap_or(0);
    if offset < 0 {
        return Err(ApiError::BadRequest("Invalid offset".to_string()));
    }

    let order = match params.order.as_deref() {
        None => SortOrder::Asc,
        Some(value) => SortOrder::parse(value).ok_or_else(|| {
            ApiError::BadRequest(format!("Invalid order: {value}, must be ASC or DESC"))
        })?,
    };

    let users = state
        .provider
        .list_users(limit, offset, order, params.username.as_deref())
        .await?;

    Ok(Json(users))
}

/// POST /users
pub async fn add_user_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<User>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(user) = payload?;

    let id = state.provider.add_user(&user).await?;
    let created = state.provider.get_user_by_id(id).await?;

    Ok((StatusCode::CREATED, Json(created.without_credentials())).into_response())
}

/// Single user, credentials included
///
/// GET /users/{user_id}
pub async fn get_user_handler(
    State(state): State<Arc<AppState>>,
    user_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<User>, ApiError> {
    let Path(user_id) = user_id?;

    let user = state.provider.get_user_by_id(user_id).await?;

    Ok(Json(user))
}

/// Update a user's settings. The body is applied over the stored record, so
/// omitted fields keep their current values. The username and usage counters
/// are kept.
///
/// PUT /users/{user_id}
pub async fn update_user_handler(
    State(state): State<Arc<AppState>>,
    user_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Path(user_id) = user_id?;
    let Json(body) = payload?;

    let Value::Object(changes) = body else {
        return Err(ApiError::BadRequest(
            "request body must be a JSON object".to_string(),
        ));
    };

    let existing = state.provider.get_user_by_id(user_id).await?;
    let mut merged = serde_json::to_value(&existing)
        .map_err(|e| ProviderError::Configuration(e.to_string()))?;
    if let Value::Object(fields) = &mut merged {
        fields.extend(changes);
    }

    let mut user: User = serde_json::from_value(merged)
        .map_err(|e| ApiError::BadRequest(format!("Invalid user: {e}")))?;
    user.id = existing.id;
    user.username = existing.username;

    state.provider.update_user(&user).await?;

    Ok(message_response(StatusCode::OK, "User updated"))
}

/// DELETE /users/{user_id}
pub async fn delete_user_handler(
    State(state): State<Arc<AppState>>,
    user_id: Result<Path<i64>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(user_id) = user_id?;

    let user = state.provider.get_user_by_id(user_id).await?;
    state.provider.delete_user(&user).await?;

    Ok(message_response(StatusCode::OK, "User deleted"))
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::{test_app, TestApp};
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};
    use ssh_key::public::{Ed25519PublicKey, KeyData};

    fn user_body(username: &str) -> Value {
        json!({
            "username": username,
            "password": "$2b$10$abcdefghijklmnopqrstuuFHYSmGmHZ3LiBOSl/QcLzxZvqK4yrp2",
            "public_key": "",
            "home_dir": format!("/srv/sftp/{username}"),
            "uid": 1000,
            "gid": 1000,
            "max_sessions": 2,
            "quota_size": 0,
            "quota_files": 0,
            "permissions": ["list", "download"],
            "upload_bandwidth": 0,
            "download_bandwidth": 0,
            "used_quota_size": 12345,
            "used_quota_files": 12
        })
    }

    async fn create(app: &TestApp, username: &str) -> i64 {
        let (status, body) = app
            .request(Method::POST, "/users", Some(user_body(username)))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn test_create_user() {
        let app = test_app().await;

        let (status, body) = app
            .request(Method::POST, "/users", Some(user_body("alice")))
            .await;

        assert_eq!(status, StatusCode::CREATED);
        assert!(body["id"].as_i64().unwrap() > 0);
        assert_eq!(body["username"], "alice");
        assert!(body.get("password").is_none());
        // Usage is server maintained
        assert_eq!(body["used_quota_size"], 0);
        assert_eq!(body["used_quota_files"], 0);
    }

    #[tokio::test]
    async fn test_create_duplicate_user() {
        let app = test_app().await;
        create(&app, "alice").await;

        let (status, body) = app
            .request(Method::POST, "/users", Some(user_body("alice")))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["status"], 409);
    }

    #[tokio::test]
    async fn test_create_invalid_user() {
        let app = test_app().await;
        let mut body = user_body("alice");
        body["home_dir"] = json!("relative");

        let (status, body) = app.request(Method::POST, "/users", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("home_dir"));

        let (status, _) = app.raw_request(Method::POST, "/users", "[1, 2").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_user() {
        let app = test_app().await;
        let id = create(&app, "alice").await;

        let (status, body) = app.request(Method::GET, &format!("/users/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");
        assert_eq!(body["password"], user_body("alice")["password"]);

        let (status, body) = app.request(Method::GET, "/users/9999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 404);

        let (status, _) = app.request(Method::GET, "/users/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_user() {
        let app = test_app().await;
        let id = create(&app, "alice").await;

        let mut body = user_body("renamed");
        body["home_dir"] = json!("/data/alice");
        body["permissions"] = json!(["*"]);

        let (status, resp) = app
            .request(Method::PUT, &format!("/users/{id}"), Some(body))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp["message"], "User updated");

        let stored = app.state.provider.get_user_by_id(id).await.unwrap();
        assert_eq!(stored.username, "alice");
        assert_eq!(stored.home_dir, "/data/alice");
        assert_eq!(stored.permissions, vec!["*".to_string()]);
        assert_eq!(stored.used_quota_size, 0);
    }

    #[tokio::test]
    async fn test_get_then_put_keeps_credentials() {
        let app = test_app().await;
        let password = "s3cret";
        let key = ssh_key::PublicKey::new(
            KeyData::Ed25519(Ed25519PublicKey([7; 32])),
            "alice@laptop",
        );
        let mut body = user_body("alice");
        body["password"] = json!(bcrypt::hash(password, 4).unwrap());
        body["public_key"] = json!(key.to_openssh().unwrap());
        let (status, created) = app.request(Method::POST, "/users", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_i64().unwrap();

        let (_, mut fetched) = app.request(Method::GET, &format!("/users/{id}"), None).await;
        fetched["max_sessions"] = json!(5);
        let (status, _) = app
            .request(Method::PUT, &format!("/users/{id}"), Some(fetched))
            .await;
        assert_eq!(status, StatusCode::OK);

        // A partial body leaves the omitted fields alone
        let (status, _) = app
            .request(
                Method::PUT,
                &format!("/users/{id}"),
                Some(json!({"home_dir": "/data/alice"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let stored = app.state.provider.get_user_by_id(id).await.unwrap();
        assert_eq!(stored.max_sessions, 5);
        assert_eq!(stored.home_dir, "/data/alice");
        assert!(app
            .state
            .provider
            .validate_user_and_password("alice", password)
            .await
            .is_ok());
        assert!(app
            .state
            .provider
            .validate_user_and_public_key("alice", &key.to_bytes().unwrap())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_update_errors() {
        let app = test_app().await;
        let id = create(&app, "alice").await;

        let (status, _) = app
            .request(Method::PUT, "/users/9999", Some(user_body("ghost")))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let mut body = user_body("alice");
        body["permissions"] = json!([]);
        let (status, _) = app
            .request(Method::PUT, &format!("/users/{id}"), Some(body))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .request(Method::PUT, &format!("/users/{id}"), Some(json!([1, 2])))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_user() {
        let app = test_app().await;
        let id = create(&app, "alice").await;

        let (status, body) = app
            .request(Method::DELETE, &format!("/users/{id}"), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "User deleted");

        let (status, _) = app
            .request(Method::DELETE, &format!("/users/{id}"), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_users() {
        let app = test_app().await;
        for name in ["bob", "alice", "carol"] {
            create(&app, name).await;
        }

        let (status, body) = app.request(Method::GET, "/users", None).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["username"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["alice", "bob", "carol"]);
        assert!(body
            .as_array()
            .unwrap()
            .iter()
            .all(|u| u.get("password").is_none() && u.get("public_key").is_none()));

        let (_, body) = app
            .request(Method::GET, "/users?order=DESC&limit=1", None)
            .await;
        assert_eq!(body[0]["username"], "carol");
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (_, body) = app.request(Method::GET, "/users?username=bob", None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["username"], "bob");
    }

    #[tokio::test]
    async fn test_list_users_bad_params() {
        let app = test_app().await;

        for uri in [
            "/users?order=sideways",
            "/users?limit=-1",
            "/users?limit=ten",
            "/users?offset=-3",
        ] {
            let (status, body) = app.request(Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["status"], 400);
        }
    }
}
