// HTTP routes configuration

use crate::core::state::AppState;
use crate::handlers::{connections, fallback, health, quota_scans, users};
use axum::{
    routing::{delete, get},
    Router,
};
use std::sync::Arc;

pub const QUOTA_SCAN_PATH: &str = "/quota-scans";
pub const CONNECTIONS_PATH: &str = "/connections";
pub const USERS_PATH: &str = "/users";

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            QUOTA_SCAN_PATH,
            get(quota_scans::list_quota_scans_handler).post(quota_scans::start_quota_scan_handler),
        )
        .route(CONNECTIONS_PATH, get(connections::list_connections_handler))
        .route(
            &format!("{CONNECTIONS_PATH}/"),
            delete(connections::missing_connection_id_handler),
        )
        .route(
            &format!("{CONNECTIONS_PATH}/{{connection_id}}"),
            delete(connections::close_connection_handler),
        )
        .route(
            USERS_PATH,
            get(users::list_users_handler).post(users::add_user_handler),
        )
        .route(
            &format!("{USERS_PATH}/{{user_id}}"),
            get(users::get_user_handler)
                .put(users::update_user_handler)
                .delete(users::delete_user_handler),
        )
        // Envelopes for unmatched routes and methods
        .fallback(fallback::not_found_handler)
        .method_not_allowed_fallback(fallback::method_not_allowed_handler)
        .with_state(state)
}
