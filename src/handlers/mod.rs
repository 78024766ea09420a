pub mod connections;
pub mod fallback;
pub mod health;
pub mod quota_scans;
pub mod users;

use crate::models::api::ApiResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

/// Success envelope carrying only a message.
pub(crate) fn message_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ApiResponse {
            message: message.to_string(),
            error: String::new(),
            status: status.as_u16(),
        }),
    )
        .into_response()
}
