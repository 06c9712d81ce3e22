use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use netsweep_common::network::target::NormalizedTarget;
use netsweep_core::error::ScanError;
use netsweep_core::scanner::{NMAP_FIXED_ARGS, NetworkScanner, NmapScanner, RawScanOutput};

use crate::support::{self, ONE_HOST_XML, StubTool};

fn target(s: &str) -> NormalizedTarget {
    s.parse().unwrap()
}

#[tokio::test]
async fn successful_scan_returns_the_whole_document() {
    let _lock = support::exclusive().await;
    let body: String = format!(
        "echo 'Warning: 192.168.50.10 giving up on port because retransmission cap hit (2).' >&2\n{}",
        support::print_document(ONE_HOST_XML)
    );
    let stub: StubTool = StubTool::new(&body);
    let scanner: NmapScanner = NmapScanner::new(stub.path());

    assert!(scanner.is_available().await);
    let output: RawScanOutput = scanner
        .scan(&target("192.168.50.0/24"), CancellationToken::new())
        .await
        .unwrap();

    assert!(output.document.trim_start().starts_with("<?xml"));
    assert!(output.document.trim_end().ends_with("</nmaprun>"));
    assert!(output.stderr.contains("retransmission cap hit"));
}

#[tokio::test]
async fn target_is_the_only_variable_argument() {
    let _lock = support::exclusive().await;
    let stub: StubTool = StubTool::new(&support::print_document(ONE_HOST_XML));
    let scanner: NmapScanner = NmapScanner::new(stub.path());

    scanner
        .scan(&target("010.001.000.000/16"), CancellationToken::new())
        .await
        .unwrap();

    let mut expected: Vec<String> = NMAP_FIXED_ARGS.iter().map(|a| a.to_string()).collect();
    expected.push("10.1.0.0/16".to_string());
    assert_eq!(stub.recorded_args(), Some(expected));
}

#[tokio::test]
async fn non_zero_exit_carries_stderr_verbatim() {
    let _lock = support::exclusive().await;
    let stub: StubTool = StubTool::new(
        "printf 'You requested a scan type which requires root privileges.\\nQUITTING!\\n' >&2\nexit 1",
    );
    let scanner: NmapScanner = NmapScanner::new(stub.path());

    let err: ScanError = scanner
        .scan(&target("10.0.0.0/24"), CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        ScanError::Exit { code, stderr } => {
            assert_eq!(code, Some(1));
            assert_eq!(
                stderr,
                "You requested a scan type which requires root privileges.\nQUITTING!\n"
            );
        }
        other => panic!("expected an exit error, got {other:?}"),
    }
}

#[tokio::test]
async fn failing_version_probe_is_dependency_missing() {
    let _lock = support::exclusive().await;
    let stub: StubTool = StubTool::broken();
    let scanner: NmapScanner = NmapScanner::new(stub.path());

    assert!(!scanner.is_available().await);
    let err: ScanError = scanner
        .scan(&target("10.0.0.0/24"), CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ScanError::DependencyMissing { .. }));
    assert_eq!(stub.recorded_args(), None);
}

#[tokio::test]
async fn cancellation_stops_the_scan_promptly() {
    let _lock = support::exclusive().await;
    let stub: StubTool = StubTool::new("sleep 30 &\necho $! > '{dir}/child.pid'\nwait");
    let scanner: NmapScanner = NmapScanner::new(stub.path());
    let cancel: CancellationToken = CancellationToken::new();

    let scan = tokio::spawn({
        let cancel: CancellationToken = cancel.clone();
        async move { scanner.scan(&target("10.0.0.0/24"), cancel).await }
    });

    let child: u32 = support::wait_for_pid(&stub.file("child.pid")).await;
    let started: Instant = Instant::now();
    cancel.cancel();

    let result = tokio::time::timeout(Duration::from_secs(10), scan)
        .await
        .expect("scan did not stop after cancellation")
        .unwrap();
    assert!(matches!(result, Err(ScanError::Cancelled)));
    assert!(started.elapsed() < Duration::from_secs(10));

    #[cfg(target_os = "linux")]
    assert_process_gone(child).await;
    let _ = child;
}

#[tokio::test]
async fn timeout_kills_a_hung_scan() {
    let _lock = support::exclusive().await;
    let stub: StubTool = StubTool::new("sleep 30 &\necho $! > '{dir}/child.pid'\nwait");
    let scanner: NmapScanner = NmapScanner::new(stub.path()).with_timeout(Some(Duration::from_millis(500)));

    let started: Instant = Instant::now();
    let err: ScanError = scanner
        .scan(&target("10.0.0.0/24"), CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ScanError::TimedOut(limit) if limit == Duration::from_millis(500)));
    assert!(started.elapsed() < Duration::from_secs(10));

    #[cfg(target_os = "linux")]
    {
        let child: u32 = support::wait_for_pid(&stub.file("child.pid")).await;
        assert_process_gone(child).await;
    }
}

#[tokio::test]
async fn dropping_the_scan_kills_the_process_group() {
    let _lock = support::exclusive().await;
    let stub: StubTool = StubTool::new("sleep 30 &\necho $! > '{dir}/child.pid'\nwait");
    let scanner: NmapScanner = NmapScanner::new(stub.path());

    let pid_file = stub.file("child.pid");
    let subnet: NormalizedTarget = target("10.0.0.0/24");
    let abandoned = tokio::time::timeout(Duration::from_secs(10), async {
        tokio::select! {
            _ = scanner.scan(&subnet, CancellationToken::new()) => {
                panic!("stub scan finished on its own");
            }
            pid = support::wait_for_pid(&pid_file) => pid,
        }
    })
    .await
    .unwrap();

    #[cfg(target_os = "linux")]
    assert_process_gone(abandoned).await;
    let _ = abandoned;
}

#[tokio::test]
async fn leftover_background_process_does_not_hold_the_scan_open() {
    let _lock = support::exclusive().await;
    let body: String = format!(
        "sleep 6 &\necho $! > '{{dir}}/child.pid'\n{}\nexit 0",
        support::print_document(ONE_HOST_XML)
    );
    let stub: StubTool = StubTool::new(&body);
    let scanner: NmapScanner = NmapScanner::new(stub.path()).with_timeout(Some(Duration::from_millis(500)));
    let cancel: CancellationToken = CancellationToken::new();

    let canceller = tokio::spawn({
        let cancel: CancellationToken = cancel.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(700)).await;
            cancel.cancel();
        }
    });

    let started: Instant = Instant::now();
    let result: Result<RawScanOutput, ScanError> = scanner.scan(&target("10.0.0.0/24"), cancel).await;
    let elapsed: Duration = started.elapsed();
    canceller.await.unwrap();

    assert!(elapsed < Duration::from_secs(3), "scan took {elapsed:?}");
    match result {
        Ok(output) => assert!(output.document.trim_end().ends_with("</nmaprun>")),
        Err(err) => assert!(
            matches!(err, ScanError::TimedOut(_) | ScanError::Cancelled),
            "unexpected error {err:?}"
        ),
    }

    #[cfg(target_os = "linux")]
    {
        let child: u32 = support::wait_for_pid(&stub.file("child.pid")).await;
        assert_process_gone(child).await;
    }
}

#[cfg(target_os = "linux")]
async fn assert_process_gone(pid: u32) {
    for _ in 0..500 {
        if !support::is_alive(pid) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("process {pid} outlived the scan");
}
