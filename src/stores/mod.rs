pub mod connections;
pub mod quota_scans;
