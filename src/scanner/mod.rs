//! Background quota rescans.
//!
//! A scan is admitted through the [`QuotaScanRegistry`], runs detached from the
//! request that started it, and always gives its claim back, including when
//! the walk fails or the task panics.

pub mod walker;

use crate::core::error::{ProviderError, ProviderResult};
use crate::dataprovider::DataProvider;
use crate::stores::quota_scans::QuotaScanRegistry;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, info_span, warn, Instrument};
use walker::{DirUsage, DirectoryWalker};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("failed to scan {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("scan worker failed: {0}")]
    Worker(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

pub type ScanHandle = JoinHandle<Result<DirUsage, ScanError>>;

/// Releases the registry claim when dropped.
struct ScanClaim {
    registry: Arc<QuotaScanRegistry>,
    username: String,
}

impl ScanClaim {
    fn acquire(registry: &Arc<QuotaScanRegistry>, username: &str) -> Option<Self> {
        registry.claim(username).then(|| Self {
            registry: Arc::clone(registry),
            username: username.to_string(),
        })
    }
}

impl Drop for ScanClaim {
    fn drop(&mut self) {
        self.registry.release(&self.username);
    }
}

pub struct QuotaScanner {
    provider: Arc<DataProvider>,
    registry: Arc<QuotaScanRegistry>,
    walker: Arc<dyn DirectoryWalker>,
}

impl QuotaScanner {
    pub fn new(
        provider: Arc<DataProvider>,
        registry: Arc<QuotaScanRegistry>,
        walker: Arc<dyn DirectoryWalker>,
    ) -> Self {
        Self {
            provider,
            registry,
            walker,
        }
    }

    pub fn registry(&self) -> &Arc<QuotaScanRegistry> {
        &self.registry
    }

    /// Start a rescan of `username`'s home directory.
    ///
    /// Returns once the claim is held; the walk and the quota overwrite run
    /// on a spawned task. The handle can be awaited for the outcome but
    /// dropping it does not cancel the scan.
    pub async fn start_scan(&self, username: &str) -> ProviderResult<ScanHandle> {
        let user = self.provider.get_user_by_username(username).await?;

        let claim = ScanClaim::acquire(&self.registry, &user.username).ok_or_else(|| {
            info!(username = %user.username, "Quota scan already in progress");
            ProviderError::Conflict(user.username.clone())
        })?;

        info!(username = %user.username, home_dir = %user.home_dir, "Quota scan started");

        let provider = Arc::clone(&self.provider);
        let walker = Arc::clone(&self.walker);
        let span = info_span!("quota_scan", username = %user.username);

        Ok(tokio::spawn(
            async move {
                let _claim = claim;
                let result =
                    run_scan(&provider, walker, &user.username, PathBuf::from(&user.home_dir))
                        .await;
                if let Err(e) = &result {
                    warn!(error = %e, "Quota scan failed");
                }
                result
            }
            .instrument(span),
        ))
    }
}

async fn run_scan(
    provider: &DataProvider,
    walker: Arc<dyn DirectoryWalker>,
    username: &str,
    home_dir: PathBuf,
) -> Result<DirUsage, ScanError> {
    let root = home_dir.clone();
    let usage = tokio::task::spawn_blocking(move || walker.scan(&root))
        .await
        .map_err(|e| ScanError::Worker(e.to_string()))?
        .map_err(|source| ScanError::Walk {
            path: home_dir.clone(),
            source,
        })?;

    provider
        .update_quota(username, usage.files, usage.size, true)
        .await?;

    info!(
        home_dir = %home_dir.display(),
        files = usage.files,
        size = usage.size,
        "Quota scan completed"
    );
    Ok(usage)
}
