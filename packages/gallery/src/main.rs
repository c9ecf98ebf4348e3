use std::sync::Arc;

use anyhow::Context;
use common::storage::FilesystemMediaStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gallery::config::AppConfig;
use gallery::services::export::{ZipCompressor, clear_scratch_root};
use gallery::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    if config.auth.admin_password == "admin" {
        warn!("Using the default admin password; set GALLERY__AUTH__ADMIN_PASSWORD");
    }

    tokio::fs::create_dir_all(&config.storage.data_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.storage.data_dir.display()))?;
    clear_scratch_root(&config.storage.tmp_dir())
        .await
        .context("Failed to prepare scratch directory")?;

    let db = gallery::database::init_db(&config.database.url)
        .await
        .context("Failed to initialize database")?;

    let store = FilesystemMediaStore::new(config.storage.upload_dir.clone())
        .await
        .context("Failed to initialize upload directories")?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        db,
        config,
        store: Arc::new(store),
        compressor: Arc::new(ZipCompressor),
    };

    let app = gallery::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Gallery running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => warn!("Failed to listen for SIGTERM: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
