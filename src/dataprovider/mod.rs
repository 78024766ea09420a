//! User and quota persistence.
//!
//! [`DataProvider`] owns the connection pool and the dialect's
//! [`QueryProvider`]. It is built once by the process entry point and shared
//! with every component that needs storage:
//!
//! - `users`: CRUD and listing
//! - `quota`: usage counters
//! - `auth`: password and public key verification
//! - `validation`: field rules applied before any write

mod auth;
mod quota;
mod users;

pub mod queries;
pub mod validation;

pub use auth::{ARGON2_PREFIX, BCRYPT_PREFIXES};

use crate::core::config::{DataProviderConfig, Driver};
use crate::core::error::{ProviderError, ProviderResult};
use queries::QueryProvider;
use sqlx::any::AnyPoolOptions;
use sqlx::{AnyPool, Executor};
use std::sync::Arc;
use tracing::info;

pub(crate) trait SqlxResultExt<T> {
    /// Wrap a sqlx failure as a storage error tagged with the operation name.
    fn storage(self, operation: &'static str) -> ProviderResult<T>;
}

impl<T> SqlxResultExt<T> for Result<T, sqlx::Error> {
    fn storage(self, operation: &'static str) -> ProviderResult<T> {
        self.map_err(|source| ProviderError::Storage { operation, source })
    }
}

pub struct DataProvider {
    pool: AnyPool,
    queries: Arc<dyn QueryProvider>,
    allow_plaintext_passwords: bool,
}

impl DataProvider {
    /// Open the pool described by `config` and make sure the schema exists.
    pub async fn connect(config: &DataProviderConfig) -> ProviderResult<Self> {
        sqlx::any::install_default_drivers();

        let mut options = AnyPoolOptions::new().max_connections(config.max_connections);

        if config.driver == Driver::Sqlite {
            let in_memory = config.connection_string.contains("mode=memory");
            options = options.after_connect(move |conn, _meta| {
                Box::pin(async move {
                    // Writers queue on the database lock instead of failing fast
                    conn.execute("PRAGMA busy_timeout = 5000;").await?;
                    if !in_memory {
                        conn.execute("PRAGMA journal_mode = WAL;").await?;
                    }
                    Ok(())
                })
            });
        }

        let pool = options
            .connect(&config.connection_string)
            .await
            .storage("connect")?;

        let provider = Self::with_pool(
            pool,
            queries::for_driver(config.driver),
            config.allow_plaintext_passwords,
        );
        provider.initialize_schema().await?;

        info!(
            driver = provider.queries.name(),
            max_connections = config.max_connections,
            allow_plaintext_passwords = config.allow_plaintext_passwords,
            "Data provider initialized"
        );

        Ok(provider)
    }

    pub fn with_pool(
        pool: AnyPool,
        queries: Arc<dyn QueryProvider>,
        allow_plaintext_passwords: bool,
    ) -> Self {
        Self {
            pool,
            queries,
            allow_plaintext_passwords,
        }
    }

    pub async fn initialize_schema(&self) -> ProviderResult<()> {
        for statement in self.queries.create_schema() {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .storage("create_schema")?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn dialect(&self) -> &'static str {
        self.queries.name()
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::models::user::User;
    use tempfile::TempDir;

    /// A provider backed by a throwaway SQLite file. Keep the `TempDir`
    /// alive for as long as the provider is used.
    pub async fn sqlite_provider(allow_plaintext_passwords: bool) -> (DataProvider, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.db");
        let config = DataProviderConfig {
            driver: Driver::Sqlite,
            connection_string: format!("sqlite:{}?mode=rwc", path.display()),
            max_connections: 5,
            allow_plaintext_passwords,
        };
        let provider = DataProvider::connect(&config).await.unwrap();
        (provider, dir)
    }

    pub fn sample_user(username: &str) -> User {
        User {
            username: username.to_string(),
            password: "$2b$04$placeholderplaceholderplaceholderplaceholderplace".to_string(),
            home_dir: format!("/srv/sftp/{username}"),
            uid: 1000,
            gid: 1000,
            max_sessions: 2,
            quota_size: 1_048_576,
            quota_files: 100,
            permissions: vec!["list".to_string(), "download".to_string()],
            upload_bandwidth: 100,
            download_bandwidth: 200,
            ..Default::default()
        }
    }
}
