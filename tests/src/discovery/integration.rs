use std::net::Ipv4Addr;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tokio_util::sync::CancellationToken;

use netsweep_common::clock::ManualClock;
use netsweep_common::network::host::Reachability;
use netsweep_core::archive::{ScanArchive, SqliteArchive, StoredRecord};
use netsweep_core::error::{PipelineError, ScanError};
use netsweep_core::scanner::NmapScanner;
use netsweep_core::{QueryService, ScanOutcome, ScanReport, ScanService};

use crate::support::{self, NO_HOSTS_XML, ONE_HOST_XML, StubTool};

struct Pipeline {
    service: ScanService,
    query: QueryService,
    archive: Arc<SqliteArchive>,
    clock: Arc<ManualClock>,
}

fn pipeline(stub: &StubTool) -> Pipeline {
    let start: DateTime<Utc> = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
    let clock: Arc<ManualClock> = Arc::new(ManualClock::new(start));
    let archive: Arc<SqliteArchive> =
        Arc::new(SqliteArchive::open_in_memory(TimeDelta::days(30), clock.clone()).unwrap());
    let scanner: Arc<NmapScanner> = Arc::new(NmapScanner::new(stub.path()));

    Pipeline {
        service: ScanService::new(scanner, archive.clone(), clock.clone()),
        query: QueryService::new(archive.clone()),
        archive,
        clock,
    }
}

/// Runs a scan of a single address through the stub and reads it back.
#[tokio::test]
async fn scan_single_address_end_to_end() {
    let _lock = support::exclusive().await;
    let stub: StubTool = StubTool::new(&support::print_document(ONE_HOST_XML));
    let p: Pipeline = pipeline(&stub);

    let report: ScanReport = p.service.run("192.168.50.10", CancellationToken::new()).await.unwrap();

    assert_eq!(report.target.to_string(), "192.168.50.10/32");
    assert_eq!(report.outcome(), ScanOutcome::HostsFound(1));
    assert_eq!(stub.recorded_args().unwrap().last().map(String::as_str), Some("192.168.50.10/32"));

    let latest: StoredRecord = p.query.latest("192.168.50.10").await.unwrap();
    assert_eq!(latest.id, report.records[0].id);
    assert_eq!(latest.record.address(), Ipv4Addr::new(192, 168, 50, 10));
    assert_eq!(latest.record.reachability(), Reachability::Up);
    assert_eq!(latest.record.os_guess(), "Linux 5.0 - 5.14");
    assert_eq!(latest.record.ports().len(), 2);
    assert_eq!(latest.record.open_ports().count(), 1);
}

#[tokio::test]
async fn repeated_scans_build_history_that_expires() {
    let _lock = support::exclusive().await;
    let stub: StubTool = StubTool::new(&support::print_document(ONE_HOST_XML));
    let p: Pipeline = pipeline(&stub);

    p.service.run("192.168.50.0/24", CancellationToken::new()).await.unwrap();
    p.clock.advance(TimeDelta::days(10));
    p.service.run("192.168.50.0/24", CancellationToken::new()).await.unwrap();

    assert_eq!(p.query.list(Some("192.168.50.10"), None, None).await.unwrap().total, 2);

    p.clock.advance(TimeDelta::days(25));
    assert_eq!(p.query.list(Some("192.168.50.10"), None, None).await.unwrap().total, 1);

    assert_eq!(p.archive.purge_expired().await.unwrap(), 1);
    assert_eq!(p.archive.row_count().await.unwrap(), 1);
}

#[tokio::test]
async fn zero_hosts_is_success_with_nothing_archived() {
    let _lock = support::exclusive().await;
    let stub: StubTool = StubTool::new(&support::print_document(NO_HOSTS_XML));
    let p: Pipeline = pipeline(&stub);

    let report: ScanReport = p.service.run("10.77.0.0/30", CancellationToken::new()).await.unwrap();

    assert_eq!(report.outcome(), ScanOutcome::NoHosts);
    assert!(report.records.is_empty());
    assert_eq!(p.archive.row_count().await.unwrap(), 0);
}

#[tokio::test]
async fn unparseable_output_fails_the_scan() {
    let _lock = support::exclusive().await;
    for body in [
        "echo 'Starting Nmap 7.94 ( https://nmap.org )'",
        "true",
        "printf '<nmaprun><host><address addr=\"10.0.0.1\"'",
    ] {
        let stub: StubTool = StubTool::new(body);
        let p: Pipeline = pipeline(&stub);

        let err: PipelineError = p.service.run("10.0.0.0/24", CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Parse(_)), "{body:?} gave {err}");
        assert_eq!(p.archive.row_count().await.unwrap(), 0);
    }
}

#[tokio::test]
async fn tool_failure_is_reported_with_its_stderr() {
    let _lock = support::exclusive().await;
    let stub: StubTool = StubTool::new("echo 'Failed to open device eth7' >&2\nexit 1");
    let p: Pipeline = pipeline(&stub);

    let err: PipelineError = p.service.run("10.0.0.0/24", CancellationToken::new()).await.unwrap_err();
    match err {
        PipelineError::Scan(ScanError::Exit { code, stderr }) => {
            assert_eq!(code, Some(1));
            assert_eq!(stderr, "Failed to open device eth7\n");
        }
        other => panic!("expected a scan failure, got {other}"),
    }
}

#[tokio::test]
async fn missing_tool_fails_fast() {
    let _lock = support::exclusive().await;
    let stub: StubTool = StubTool::broken();
    let p: Pipeline = pipeline(&stub);

    let err: PipelineError = p.service.run("10.0.0.0/24", CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, PipelineError::DependencyMissing { .. }));
}

#[tokio::test]
async fn invalid_target_never_launches_the_tool() {
    let _lock = support::exclusive().await;
    let stub: StubTool = StubTool::new(&support::print_document(ONE_HOST_XML));
    let p: Pipeline = pipeline(&stub);

    for input in ["10.0.0.0/24 -oN /tmp/x", "10.0.0.0/24;id", "$(id)", "10.0.0.0/-1"] {
        let err: PipelineError = p.service.run(input, CancellationToken::new()).await.unwrap_err();
        assert!(err.is_client_fault(), "{input:?} gave {err}");
    }
    assert_eq!(stub.recorded_args(), None);
}

#[tokio::test]
async fn cancelled_pipeline_archives_nothing() {
    let _lock = support::exclusive().await;
    let stub: StubTool = StubTool::new("sleep 30");
    let p: Pipeline = pipeline(&stub);
    let cancel: CancellationToken = CancellationToken::new();

    let canceller = tokio::spawn({
        let cancel: CancellationToken = cancel.clone();
        async move {
            tokio::time::sleep(std::time::Duration::from_millis(300)).await;
            cancel.cancel();
        }
    });

    let err: PipelineError = p.service.run("10.0.0.0/24", cancel).await.unwrap_err();
    canceller.await.unwrap();

    assert!(matches!(err, PipelineError::Scan(ScanError::Cancelled)));
    assert_eq!(p.archive.row_count().await.unwrap(), 0);
}
