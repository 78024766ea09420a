use super::message_response;
use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::models::connection::ConnectionStats;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Json, Response},
};
use std::sync::Arc;
use tracing::info;

/// GET /connections
pub async fn list_connections_handler(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<ConnectionStats>> {
    Json(state.connections.active_connections())
}

/// Force-close a session
///
/// DELETE /connections/{connection_id}
pub async fn close_connection_handler(
    State(state): State<Arc<AppState>>,
    Path(connection_id): Path<String>,
) -> Result<Response, ApiError> {
    if connection_id.is_empty() {
        return Err(missing_connection_id());
    }

    if !state.connections.close_connection(&connection_id) {
        return Err(ApiError::NotFound("Not Found".to_string()));
    }

    info!(connection_id = %connection_id, "Connection closed on request");
    Ok(message_response(StatusCode::OK, "Connection closed"))
}

/// DELETE /connections/
pub async fn missing_connection_id_handler() -> ApiError {
    missing_connection_id()
}

fn missing_connection_id() -> ApiError {
    ApiError::BadRequest("connection_id is mandatory".to_string())
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::test_app;
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_list_and_close_connection() {
        let app = test_app().await;
        app.connections.register("conn-1", "alice", "192.0.2.10:40000");

        let (status, body) = app.request(Method::GET, "/connections", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["connection_id"], "conn-1");
        assert_eq!(body[0]["username"], "alice");

        let (status, body) = app.request(Method::DELETE, "/connections/conn-1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Connection closed");
        assert!(app.connections.is_empty());
    }

    #[tokio::test]
    async fn test_close_unknown_connection() {
        let app = test_app().await;

        let (status, body) = app.request(Method::DELETE, "/connections/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 404);
    }

    #[tokio::test]
    async fn test_close_without_id() {
        let app = test_app().await;

        let (status, body) = app.request(Method::DELETE, "/connections/", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "connection_id is mandatory");
    }
}
