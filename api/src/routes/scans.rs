// ---------------------------------------------------------------------------
// Network scan routes
// ---------------------------------------------------------------------------

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use netsweep_core::archive::{Page, StoredRecord};
use netsweep_core::discovery::PersistFailure;
use netsweep_core::parser::SkippedHost;
use netsweep_core::query::QueryError;
use netsweep_core::{ScanOutcome, ScanReport};

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// POST /api/network-scan/scan: run a scan and archive its hosts
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    #[serde(default, alias = "target")]
    pub subnet: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub success: bool,
    pub message: String,
    pub hosts_scanned: usize,
    pub results: Vec<StoredRecord>,
    pub skipped: Vec<SkippedHost>,
    pub failed: Vec<PersistFailure>,
}

impl From<ScanReport> for ScanResponse {
    fn from(report: ScanReport) -> Self {
        let message: String = match report.outcome() {
            ScanOutcome::NoHosts => "Scan completed - no active hosts found".to_string(),
            ScanOutcome::HostsFound(_) => format!("Scan completed for {}", report.target),
        };
        Self {
            success: true,
            message,
            hosts_scanned: report.hosts_found(),
            results: report.records,
            skipped: report.skipped,
            failed: report.failed,
        }
    }
}

pub async fn perform_scan(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<ScanResponse>, ApiError> {
    let Json(request): Json<ScanRequest> = body?;
    let subnet: &str = request
        .subnet
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Subnet parameter is required".into()))?;

    info!(%subnet, "initiating network scan");
    // A dropped request drops this future, which kills the scanner too.
    let report: ScanReport = state.scans.run(subnet, state.shutdown.child_token()).await?;

    Ok(Json(ScanResponse::from(report)))
}

// ---------------------------------------------------------------------------
// GET /api/network-scan/results: paginated history
// ---------------------------------------------------------------------------

/// Pagination values arrive as text; anything non-numeric means "default".
#[derive(Debug, Default, Deserialize)]
pub struct ResultsQuery {
    pub ip: Option<String>,
    pub limit: Option<String>,
    pub skip: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub total: u64,
    pub limit: u32,
    pub skip: u64,
}

#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub success: bool,
    pub results: Vec<StoredRecord>,
    pub pagination: Pagination,
}

fn parse_number(value: Option<&str>) -> Option<i64> {
    value.and_then(|v| v.trim().parse().ok())
}

pub async fn list_results(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResultsQuery>,
) -> Result<Json<ResultsResponse>, ApiError> {
    let page: Page<StoredRecord> = state
        .query
        .list(
            params.ip.as_deref(),
            parse_number(params.limit.as_deref()),
            parse_number(params.skip.as_deref()),
        )
        .await
        .map_err(|e| {
            error!(error = %e, "error fetching scan results");
            ApiError::Internal("Failed to fetch scan results".into())
        })?;

    Ok(Json(ResultsResponse {
        success: true,
        pagination: Pagination {
            total: page.total,
            limit: page.limit,
            skip: page.offset,
        },
        results: page.items,
    }))
}

// ---------------------------------------------------------------------------
// GET /api/network-scan/latest/{ip}
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct LatestResponse {
    pub success: bool,
    pub result: StoredRecord,
}

pub async fn latest_for_ip(
    State(state): State<Arc<AppState>>,
    Path(ip): Path<String>,
) -> Result<Json<LatestResponse>, ApiError> {
    match state.query.latest(&ip).await {
        Ok(result) => Ok(Json(LatestResponse { success: true, result })),
        Err(e @ QueryError::NotFound { .. }) => Err(ApiError::NotFound(e.to_string())),
        Err(QueryError::Persistence(e)) => {
            error!(error = %e, %ip, "error fetching latest scan");
            Err(ApiError::Internal("Failed to fetch latest scan result".into()))
        }
    }
}
