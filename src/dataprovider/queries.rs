//! Dialect specific statement text.
//!
//! The provider only ever talks to storage through a [`QueryProvider`], so
//! adding a backend means adding one implementation here. Statements use `$N`
//! placeholders, which both SQLite and PostgreSQL accept through sqlx.

use crate::core::config::Driver;
use std::fmt;
use std::sync::Arc;

/// Column list shared by every statement that materializes a [`User`].
///
/// [`User`]: crate::models::user::User
pub const USER_COLUMNS: &str = "id, username, password, public_key, home_dir, uid, gid, \
     max_sessions, quota_size, quota_files, permissions, used_quota_size, used_quota_files, \
     last_quota_update, upload_bandwidth, download_bandwidth";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Parse the `order` query parameter. Only `ASC` and `DESC` are accepted.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ASC" => Some(Self::Asc),
            "DESC" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Source of parameterized statements for one storage dialect.
pub trait QueryProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// DDL run at startup. Must be idempotent.
    fn create_schema(&self) -> &'static [&'static str];

    /// Floor both usage counters of `$1` (username) at zero.
    fn clamp_quota(&self) -> &'static str;

    /// `$1` username
    fn user_by_username(&self) -> String {
        format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1")
    }

    /// `$1` id
    fn user_by_id(&self) -> String {
        format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1")
    }

    /// `$1` username, yields `(used_quota_size, used_quota_files)`
    fn used_quota(&self) -> &'static str {
        "SELECT used_quota_size, used_quota_files FROM users WHERE username = $1"
    }

    /// Apply deltas in place: `$1` size delta, `$2` files delta,
    /// `$3` timestamp, `$4` username. Returns the new counters.
    fn add_quota(&self) -> &'static str {
        "UPDATE users SET used_quota_size = used_quota_size + $1, \
         used_quota_files = used_quota_files + $2, last_quota_update = $3 \
         WHERE username = $4 RETURNING used_quota_size, used_quota_files"
    }

    /// Overwrite counters: `$1` size, `$2` files, `$3` timestamp, `$4` username.
    fn set_quota(&self) -> &'static str {
        "UPDATE users SET used_quota_size = $1, used_quota_files = $2, \
         last_quota_update = $3 WHERE username = $4"
    }

    /// Twelve parameters in column order, returns the new id.
    fn insert_user(&self) -> &'static str {
        "INSERT INTO users (username, password, public_key, home_dir, uid, gid, max_sessions, \
         quota_size, quota_files, permissions, upload_bandwidth, download_bandwidth) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING id"
    }

    /// Replaces every mutable, client-settable field. `$12` is the id.
    fn update_user(&self) -> &'static str {
        "UPDATE users SET password = $1, public_key = $2, home_dir = $3, uid = $4, gid = $5, \
         max_sessions = $6, quota_size = $7, quota_files = $8, permissions = $9, \
         upload_bandwidth = $10, download_bandwidth = $11 WHERE id = $12"
    }

    /// `$1` id
    fn delete_user(&self) -> &'static str {
        "DELETE FROM users WHERE id = $1"
    }

    /// Paginated listing ordered by username. With a filter the parameters
    /// are `$1` username, `$2` limit, `$3` offset, otherwise `$1` limit and
    /// `$2` offset.
    fn list_users(&self, order: SortOrder, filtered: bool) -> String {
        if filtered {
            format!(
                "SELECT {USER_COLUMNS} FROM users WHERE username = $1 \
                 ORDER BY username {order} LIMIT $2 OFFSET $3"
            )
        } else {
            format!("SELECT {USER_COLUMNS} FROM users ORDER BY username {order} LIMIT $1 OFFSET $2")
        }
    }
}

pub struct SqliteQueries;

impl QueryProvider for SqliteQueries {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn create_schema(&self) -> &'static [&'static str] {
        &["CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password TEXT NULL,
            public_key TEXT NULL,
            home_dir TEXT NOT NULL,
            uid INTEGER NOT NULL,
            gid INTEGER NOT NULL,
            max_sessions INTEGER NOT NULL,
            quota_size INTEGER NOT NULL,
            quota_files INTEGER NOT NULL,
            permissions TEXT NOT NULL,
            used_quota_size INTEGER NOT NULL DEFAULT 0,
            used_quota_files INTEGER NOT NULL DEFAULT 0,
            last_quota_update INTEGER NOT NULL DEFAULT 0,
            upload_bandwidth INTEGER NOT NULL,
            download_bandwidth INTEGER NOT NULL
        )"]
    }

    fn clamp_quota(&self) -> &'static str {
        "UPDATE users SET used_quota_size = MAX(used_quota_size, 0), \
         used_quota_files = MAX(used_quota_files, 0) WHERE username = $1"
    }
}

pub struct PostgresQueries;

impl QueryProvider for PostgresQueries {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn create_schema(&self) -> &'static [&'static str] {
        &["CREATE TABLE IF NOT EXISTS users (
            id BIGSERIAL PRIMARY KEY,
            username VARCHAR(255) NOT NULL UNIQUE,
            password VARCHAR(255) NULL,
            public_key TEXT NULL,
            home_dir TEXT NOT NULL,
            uid BIGINT NOT NULL,
            gid BIGINT NOT NULL,
            max_sessions BIGINT NOT NULL,
            quota_size BIGINT NOT NULL,
            quota_files BIGINT NOT NULL,
            permissions TEXT NOT NULL,
            used_quota_size BIGINT NOT NULL DEFAULT 0,
            used_quota_files BIGINT NOT NULL DEFAULT 0,
            last_quota_update BIGINT NOT NULL DEFAULT 0,
            upload_bandwidth BIGINT NOT NULL,
            download_bandwidth BIGINT NOT NULL
        )"]
    }

    fn clamp_quota(&self) -> &'static str {
        "UPDATE users SET used_quota_size = GREATEST(used_quota_size, 0), \
         used_quota_files = GREATEST(used_quota_files, 0) WHERE username = $1"
    }
}

pub fn for_driver(driver: Driver) -> Arc<dyn QueryProvider> {
    match driver {
        Driver::Sqlite => Arc::new(SqliteQueries),
        Driver::Postgres => Arc::new(PostgresQueries),
    }
}
