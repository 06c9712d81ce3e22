// ---------------------------------------------------------------------------
// REST API server
// ---------------------------------------------------------------------------
//
// Exposes network scanning and the scan archive over HTTP.

pub mod error;
mod routes;
pub mod state;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use netsweep_common::clock::SystemClock;
use netsweep_common::config::Config;
use netsweep_core::archive::{SqliteArchive, spawn_reaper};
use netsweep_core::scanner::NmapScanner;
use state::AppState;

/// Build the axum Router (useful for testing).
pub fn build_router(state: Arc<AppState>) -> axum::Router {
    routes::build_router(state)
}

/// Start the API server and the expiry reaper, and block until shutdown (Ctrl+C).
pub async fn start_server(cfg: &Config) -> anyhow::Result<()> {
    let archive: Arc<SqliteArchive> = Arc::new(SqliteArchive::from_config(cfg)?);
    let scanner: Arc<NmapScanner> = Arc::new(NmapScanner::from_config(cfg));
    let state: Arc<AppState> = Arc::new(AppState::new(scanner, archive.clone(), Arc::new(SystemClock)));

    let reaper = spawn_reaper(archive, cfg.reap_interval, state.shutdown.clone());

    let app = build_router(state.clone());
    let listener = tokio::net::TcpListener::bind(cfg.listen_addr).await?;
    info!(addr = %cfg.listen_addr, db = %cfg.db_path.display(), "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state.shutdown.clone()))
        .await?;

    state.shutdown.cancel();
    reaper.await?;
    info!("API server shut down");
    Ok(())
}

async fn shutdown_signal(token: CancellationToken) {
    tokio::select! {
        res = tokio::signal::ctrl_c() => match res {
            Ok(()) => info!("shutdown signal received"),
            Err(e) => {
                warn!(error = %e, "cannot listen for Ctrl+C");
                token.cancelled().await;
            }
        },
        _ = token.cancelled() => {}
    }
    token.cancel();
}
