//! The central **abstraction** for running the external scanning tool.
//!
//! [`NetworkScanner`] is the seam between the pipeline and the process that
//! actually probes the network. The pipeline only knows *that* a scanner can
//! report its availability and turn a validated target into a raw structured
//! document; the [`nmap`] submodule knows *how*.
//!
//! **Lifecycle note:**
//! There is no shared scanner instance holding a process open. Every call to
//! [`NetworkScanner::scan`] spawns, owns and reaps its own child process, and
//! kills the child's whole process group if the call is cancelled, times out
//! or is dropped mid-flight.

use std::path::Path;

use async_trait::async_trait;
use netsweep_common::network::target::NormalizedTarget;
use tokio_util::sync::CancellationToken;

use crate::error::ScanError;

mod nmap;
mod process;
mod tool;

pub use nmap::{NMAP_FIXED_ARGS, NmapScanner};
pub use tool::is_available;

/// Everything the scanner printed during one successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawScanOutput {
    /// The complete structured document from standard output.
    pub document: String,
    /// Diagnostics printed on standard error, kept verbatim.
    pub stderr: String,
}

impl RawScanOutput {
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            stderr: String::new(),
        }
    }
}

#[async_trait]
pub trait NetworkScanner: Send + Sync {
    /// The executable this scanner launches, for diagnostics.
    fn program(&self) -> &Path;

    /// Whether the scanning tool can be launched right now.
    ///
    /// Never fails: any launch problem simply reads as "unavailable".
    async fn is_available(&self) -> bool;

    /// Runs one scan of `target` to completion and returns its buffered output.
    ///
    /// Resolves to [`ScanError::Cancelled`] as soon as `cancel` fires.
    async fn scan(
        &self,
        target: &NormalizedTarget,
        cancel: CancellationToken,
    ) -> Result<RawScanOutput, ScanError>;
}
