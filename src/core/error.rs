// Centralized error handling for the data provider and the management API

use crate::models::api::ApiResponse;
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors surfaced by the data provider: credential checks, quota accounting
/// and user CRUD.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password hashing error: {0}")]
    Hashing(String),

    #[error("Another quota scan is already in progress for user {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Storage error during {operation}: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

/// Errors returned by management API handlers.
///
/// Rendered as the `{message, error, status}` envelope. Backend failures are
/// reduced to a generic message so query text never reaches the client.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Provider(err) => match err {
                ProviderError::InvalidInput(_) | ProviderError::Validation(_) => {
                    StatusCode::BAD_REQUEST
                }
                ProviderError::NotFound(_) => StatusCode::NOT_FOUND,
                ProviderError::DuplicateUsername(_) | ProviderError::Conflict(_) => {
                    StatusCode::CONFLICT
                }
                ProviderError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                ProviderError::Hashing(_)
                | ProviderError::Configuration(_)
                | ProviderError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (message, error) = match &self {
            ApiError::NotFound(message) => (message.clone(), String::new()),
            ApiError::MethodNotAllowed => (self.to_string(), String::new()),
            _ if status == StatusCode::INTERNAL_SERVER_ERROR => {
                (String::new(), "Internal server error".to_string())
            }
            _ => (String::new(), self.to_string()),
        };

        (
            status,
            Json(ApiResponse {
                message,
                error,
                status: status.as_u16(),
            }),
        )
            .into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
