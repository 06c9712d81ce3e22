// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use netsweep_common::clock::Clock;
use netsweep_core::archive::ScanArchive;
use netsweep_core::scanner::NetworkScanner;
use netsweep_core::{QueryService, ScanService};

/// Global application state for the API server.
pub struct AppState {
    pub scans: ScanService,
    pub query: QueryService,
    /// Cancelled on shutdown; in-flight scans are killed with it.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(scanner: Arc<dyn NetworkScanner>, archive: Arc<dyn ScanArchive>, clock: Arc<dyn Clock>) -> Self {
        Self {
            scans: ScanService::new(scanner, Arc::clone(&archive), clock),
            query: QueryService::new(archive),
            shutdown: CancellationToken::new(),
        }
    }
}
