//! # Network Discovery Service
//!
//! Implements the core "Network Scan" use case.
//!
//! Orchestrates one scan request end to end:
//! 1. **Validation**: the raw input is normalized and validated before any
//!    process is spawned.
//! 2. **Availability**: the scanner is probed; a missing tool fails fast.
//! 3. **Scanning**: delegated to the [`NetworkScanner`] trait.
//! 4. **Parsing**: the raw report becomes [`ScanRecord`]s.
//! 5. **Archiving**: each record is saved on its own; one failed save does
//!    not undo the others.

use std::net::Ipv4Addr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use netsweep_common::clock::Clock;
use netsweep_common::network::host::ScanRecord;
use netsweep_common::network::target::{NormalizedTarget, normalize_input, validate};

use crate::archive::{ScanArchive, StoredRecord};
use crate::error::{PersistenceError, PipelineError};
use crate::parser::{self, ParsedScan, SkippedHost};
use crate::scanner::{NetworkScanner, RawScanOutput};

/// A record the archive refused.
#[derive(Debug, Serialize)]
pub struct PersistFailure {
    pub address: Ipv4Addr,
    #[serde(serialize_with = "serialize_display")]
    pub error: PersistenceError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The scan completed and found no active hosts.
    NoHosts,
    HostsFound(usize),
}

#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub target: NormalizedTarget,
    pub started_at: DateTime<Utc>,
    /// Successfully archived records, in scanner order.
    pub records: Vec<StoredRecord>,
    pub skipped: Vec<SkippedHost>,
    pub failed: Vec<PersistFailure>,
}

impl ScanReport {
    /// Hosts the scanner reported with a usable address, archived or not.
    pub fn hosts_found(&self) -> usize {
        self.records.len() + self.failed.len()
    }

    pub fn outcome(&self) -> ScanOutcome {
        match self.hosts_found() {
            0 => ScanOutcome::NoHosts,
            n => ScanOutcome::HostsFound(n),
        }
    }
}

/// Application Service for Network Discovery.
#[derive(Clone)]
pub struct ScanService {
    scanner: Arc<dyn NetworkScanner>,
    archive: Arc<dyn ScanArchive>,
    clock: Arc<dyn Clock>,
}

impl ScanService {
    pub fn new(scanner: Arc<dyn NetworkScanner>, archive: Arc<dyn ScanArchive>, clock: Arc<dyn Clock>) -> Self {
        Self {
            scanner,
            archive,
            clock,
        }
    }

    pub fn scanner(&self) -> &Arc<dyn NetworkScanner> {
        &self.scanner
    }

    /// Runs a scan of `input`, which may be a CIDR block or a bare address.
    pub async fn run(&self, input: &str, cancel: CancellationToken) -> Result<ScanReport, PipelineError> {
        let target: NormalizedTarget = validate(&normalize_input(input))?;

        if !self.scanner.is_available().await {
            return Err(self.dependency_missing());
        }

        let started_at: DateTime<Utc> = self.clock.now();
        info!(subnet = %target, hosts = target.range().len(), "starting scan");

        let raw: RawScanOutput = self.scanner.scan(&target, cancel).await?;
        let parsed: ParsedScan = parser::parse(&raw, self.clock.now())?;

        for host in &parsed.skipped {
            warn!(
                subnet = %target,
                addresses = ?host.reported_addresses,
                reason = %host.reason,
                "host reported without a usable IPv4 address"
            );
        }

        let (records, failed) = self.archive_all(&target, parsed.records).await;

        let report: ScanReport = ScanReport {
            target,
            started_at,
            records,
            skipped: parsed.skipped,
            failed,
        };
        info!(
            subnet = %report.target,
            hosts = report.hosts_found(),
            archived = report.records.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "scan finished"
        );
        Ok(report)
    }

    async fn archive_all(
        &self,
        target: &NormalizedTarget,
        records: Vec<ScanRecord>,
    ) -> (Vec<StoredRecord>, Vec<PersistFailure>) {
        let mut stored: Vec<StoredRecord> = Vec::with_capacity(records.len());
        let mut failed: Vec<PersistFailure> = Vec::new();

        for record in records {
            let address: Ipv4Addr = record.address();
            if !target.range().contains(address) {
                warn!(subnet = %target, %address, "scanner reported a host outside the requested range");
            }

            match self.archive.save(&record).await {
                Ok(id) => stored.push(StoredRecord { id, record }),
                Err(e) => {
                    error!(%address, error = %e, "failed to archive scan record");
                    failed.push(PersistFailure { address, error: e });
                }
            }
        }
        (stored, failed)
    }

    fn dependency_missing(&self) -> PipelineError {
        PipelineError::DependencyMissing {
            program: self.scanner.program().to_path_buf(),
        }
    }
}

fn serialize_display<S, T>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
    T: std::fmt::Display,
{
    serializer.collect_str(value)
}
