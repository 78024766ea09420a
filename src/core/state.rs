// Application state (AppState)

use crate::core::config::Config;
use crate::dataprovider::DataProvider;
use crate::scanner::walker::DirectoryWalker;
use crate::scanner::QuotaScanner;
use crate::stores::connections::ConnectionTracker;
use crate::stores::quota_scans::QuotaScanRegistry;
use std::sync::Arc;

/// Shared application state
///
/// Built once by the entry point and handed to every request handler.
/// All fields are wrapped in Arc for cheap cloning across tasks.
#[derive(Clone)]
pub struct AppState {
    /// User repository, quota ledger and credential verifier
    pub provider: Arc<DataProvider>,

    /// Usernames with a rescan in flight
    pub quota_scans: Arc<QuotaScanRegistry>,

    /// Starts background rescans
    pub scanner: Arc<QuotaScanner>,

    /// Live SFTP sessions, owned by the protocol engine
    pub connections: Arc<dyn ConnectionTracker>,

    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        config: Config,
        provider: DataProvider,
        connections: Arc<dyn ConnectionTracker>,
        walker: Arc<dyn DirectoryWalker>,
    ) -> Self {
        let provider = Arc::new(provider);
        let quota_scans = Arc::new(QuotaScanRegistry::new());
        let scanner = Arc::new(QuotaScanner::new(
            Arc::clone(&provider),
            Arc::clone(&quota_scans),
            walker,
        ));

        Self {
            provider,
            quota_scans,
            scanner,
            connections,
            config: Arc::new(config),
        }
    }
}
