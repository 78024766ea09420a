pub mod api;
pub mod connection;
pub mod quota_scan;
pub mod user;
