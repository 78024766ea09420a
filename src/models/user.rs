use serde::{Deserialize, Serialize};

/// Permission granting every capability.
pub const PERMISSION_ANY: &str = "*";

/// Capabilities a user may be granted. Stored as an ordered list.
pub const VALID_PERMISSIONS: &[&str] = &[
    PERMISSION_ANY,
    "list",
    "download",
    "upload",
    "delete",
    "rename",
    "create_dirs",
    "create_symlinks",
];

/// An SFTP user as persisted by the data provider.
///
/// Usage fields (`used_quota_size`, `used_quota_files`, `last_quota_update`)
/// are maintained by the server; values sent by API clients are ignored on
/// create and update.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    /// Storage assigned identifier, 0 until persisted
    pub id: i64,
    pub username: String,
    /// Scheme prefixed hash, or a legacy plaintext value
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    /// OpenSSH authorized-key line
    #[serde(skip_serializing_if = "String::is_empty")]
    pub public_key: String,
    pub home_dir: String,
    pub uid: i64,
    pub gid: i64,
    /// 0 means unlimited
    pub max_sessions: i64,
    /// Byte ceiling, 0 means unlimited
    pub quota_size: i64,
    /// File count ceiling, 0 means unlimited
    pub quota_files: i64,
    pub permissions: Vec<String>,
    pub used_quota_size: i64,
    pub used_quota_files: i64,
    /// Milliseconds since epoch of the last usage update
    pub last_quota_update: i64,
    /// KB/s, 0 means unlimited
    pub upload_bandwidth: i64,
    /// KB/s, 0 means unlimited
    pub download_bandwidth: i64,
}

impl User {
    /// Drop both credentials, used before a record leaves through a listing.
    pub fn without_credentials(mut self) -> Self {
        self.password.clear();
        self.public_key.clear();
        self
    }
}
