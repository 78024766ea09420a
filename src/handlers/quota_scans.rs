use super::message_response;
use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::models::quota_scan::{QuotaScan, QuotaScanRequest};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{Json, Response},
};
use std::sync::Arc;

/// List scans in flight
///
/// GET /quota-scans
pub async fn list_quota_scans_handler(State(state): State<Arc<AppState>>) -> Json<Vec<QuotaScan>> {
    Json(state.quota_scans.list())
}

/// Start a rescan for the user named in the body
///
/// POST /quota-scans {"username": "..."}
///
/// Answers as soon as the scan is admitted; the walk runs in the background.
pub async fn start_quota_scan_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QuotaScanRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    if request.username.is_empty() {
        return Err(ApiError::BadRequest("username is mandatory".to_string()));
    }

    // Detached: dropping the handle leaves the scan running
    let _scan = state.scanner.start_scan(&request.username).await?;

    Ok(message_response(StatusCode::CREATED, "Scan started"))
}

#[cfg(test)]
mod tests {
    use crate::dataprovider::test_support::sample_user;
    use crate::handlers::test_support::{test_app, test_app_with_walker};
    use crate::scanner::walker::test_support::GatedWalker;
    use crate::scanner::walker::DirUsage;
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    async fn wait_until_idle(app: &crate::handlers::test_support::TestApp) {
        for _ in 0..200 {
            if app.state.quota_scans.is_empty() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("quota scan did not finish");
    }

    #[tokio::test]
    async fn test_start_scan_lifecycle() {
        let (walker, tx) = GatedWalker::new(DirUsage { files: 3, size: 300 });
        let app = test_app_with_walker(Arc::new(walker)).await;
        app.state.provider.add_user(&sample_user("alice")).await.unwrap();

        let (status, body) = app
            .request(Method::POST, "/quota-scans", Some(json!({"username": "alice"})))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Scan started");

        let (status, body) = app.request(Method::GET, "/quota-scans", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["username"], "alice");
        assert!(body[0]["start_time"].as_i64().unwrap() > 0);

        let (status, _) = app
            .request(Method::POST, "/quota-scans", Some(json!({"username": "alice"})))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        tx.send(()).unwrap();
        wait_until_idle(&app).await;

        let (status, body) = app.request(Method::GET, "/quota-scans", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
        assert_eq!(
            app.state.provider.get_used_quota("alice").await.unwrap(),
            (3, 300)
        );
    }

    #[tokio::test]
    async fn test_start_scan_unknown_user() {
        let app = test_app().await;

        let (status, body) = app
            .request(Method::POST, "/quota-scans", Some(json!({"username": "nobody"})))
            .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 404);
        assert!(app.state.quota_scans.is_empty());
    }

    #[tokio::test]
    async fn test_start_scan_bad_body() {
        let app = test_app().await;

        let (status, body) = app.raw_request(Method::POST, "/quota-scans", "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);

        let (status, _) = app
            .request(Method::POST, "/quota-scans", Some(json!({"username": ""})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
