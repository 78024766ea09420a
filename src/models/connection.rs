use serde::{Deserialize, Serialize};

/// Snapshot of an active SFTP session as reported by the connection tracker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStats {
    pub connection_id: String,
    pub username: String,
    pub remote_address: String,
    /// Milliseconds since epoch
    pub connection_time: i64,
    /// Milliseconds since epoch
    pub last_activity: i64,
}
