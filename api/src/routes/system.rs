// ---------------------------------------------------------------------------
// System routes: health check
// ---------------------------------------------------------------------------

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// Whether the scanning tool answered its version probe.
    pub scanner: bool,
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        scanner: state.scans.scanner().is_available().await,
    })
}
