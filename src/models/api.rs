use serde::{Deserialize, Serialize};

/// Response envelope used by every status-only API reply and by all errors.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub message: String,
    pub error: String,
    pub status: u16,
}

/// Query parameters for `GET /users`
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub order: Option<String>,
    pub username: Option<String>,
}
