use anyhow::{Context, Result};
use axum::serve;
use sftp_dataprovider::core::config::Config;
use sftp_dataprovider::core::routes::build_router;
use sftp_dataprovider::core::state::AppState;
use sftp_dataprovider::core::tracing_init::init_tracing;
use sftp_dataprovider::dataprovider::DataProvider;
use sftp_dataprovider::scanner::walker::FsWalker;
use sftp_dataprovider::stores::connections::ActiveConnections;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

fn main() -> Result<()> {
    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = Config::from_file(&config_path).context(format!(
        "Failed to load configuration from '{}'. \
        Copy config.example.toml to config.toml and adjust the values.",
        config_path.display()
    ))?;

    init_tracing(&config.logging);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.num_threads)
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    runtime.block_on(async_main(config, config_path))
}

async fn async_main(config: Config, config_path: PathBuf) -> Result<()> {
    info!(
        config_path = %config_path.display(),
        port = config.server.port,
        num_threads = config.server.num_threads,
        driver = ?config.data_provider.driver,
        log_level = %config.logging.level,
        "SFTP data provider starting"
    );

    let provider = DataProvider::connect(&config.data_provider)
        .await
        .context("Failed to initialize data provider")?;

    let addr = format!("{}:{}", config.server.bind_address, config.server.port);
    let state = Arc::new(AppState::new(
        config,
        provider,
        Arc::new(ActiveConnections::new()),
        Arc::new(FsWalker),
    ));

    let app = build_router(Arc::clone(&state)).layer(
        ServiceBuilder::new().layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
        ),
    );

    let listener = TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind management API listener to {}", addr))?;

    info!(address = %addr, "Management API listening");

    serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Management API server error")?;

    info!(
        scans_in_flight = state.quota_scans.len(),
        "Shutting down gracefully"
    );
    state.provider.close().await;

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
