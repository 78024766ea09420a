use serde::{Deserialize, Serialize};

/// An in-flight quota rescan. Exists from claim until release.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaScan {
    pub username: String,
    /// Milliseconds since epoch
    pub start_time: i64,
}

/// Body of `POST /quota-scans`
#[derive(Debug, Deserialize)]
pub struct QuotaScanRequest {
    pub username: String,
}
