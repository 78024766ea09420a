use crate::core::error::ApiError;

/// Any path that matches no route
pub async fn not_found_handler() -> ApiError {
    ApiError::NotFound("Not Found".to_string())
}

/// A known path requested with a method it does not serve
pub async fn method_not_allowed_handler() -> ApiError {
    ApiError::MethodNotAllowed
}
