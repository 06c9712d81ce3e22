// ---------------------------------------------------------------------------
// Route registration
// ---------------------------------------------------------------------------

mod scans;
mod system;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(system::health_check))
        .route("/api/network-scan/scan", post(scans::perform_scan))
        .route("/api/network-scan/results", get(scans::list_results))
        .route("/api/network-scan/latest/{ip}", get(scans::latest_for_ip))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(16 * 1024)) // a scan request is one short string
        .with_state(state)
}
