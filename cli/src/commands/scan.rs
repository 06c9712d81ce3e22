use std::sync::Arc;
use std::time::{Duration, Instant};

use colored::*;
use tokio_util::sync::CancellationToken;

use crate::commands::open_archive;
use crate::mprint;
use crate::terminal::spinner::Spinner;
use crate::terminal::{colors, format, print};
use netsweep_common::clock::SystemClock;
use netsweep_common::config::Config;
use netsweep_common::{success, warn};
use netsweep_core::scanner::NmapScanner;
use netsweep_core::{ScanOutcome, ScanReport, ScanService};

pub async fn scan(target: &str, cfg: &Config) -> anyhow::Result<()> {
    let archive = open_archive(cfg).await?;
    let scanner: Arc<NmapScanner> = Arc::new(NmapScanner::from_config(cfg));
    let service: ScanService = ScanService::new(scanner, archive, Arc::new(SystemClock));

    let cancel: CancellationToken = CancellationToken::new();
    let interrupt = tokio::spawn({
        let cancel: CancellationToken = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping the scanner");
                cancel.cancel();
            }
        }
    });

    let start_time: Instant = Instant::now();
    let spinner: Spinner = Spinner::start(format!("Scanning {}...", target.trim().bold()));
    let result = service.run(target, cancel).await;
    drop(spinner);
    interrupt.abort();

    let report: ScanReport = result?;
    scan_ends(&report, start_time.elapsed());
    Ok(())
}

fn scan_ends(report: &ScanReport, total_time: Duration) {
    for host in &report.skipped {
        warn!(
            "Host without an IPv4 address skipped ({})",
            host.reported_addresses.join(", ")
        );
    }
    for failure in &report.failed {
        warn!("Could not archive {}: {}", failure.address, failure.error);
    }

    match report.outcome() {
        ScanOutcome::NoHosts => {
            print::header("ZERO HOSTS DETECTED");
            print::no_results();
        }
        ScanOutcome::HostsFound(count) => {
            print::header("Scan Results");
            for (idx, stored) in report.records.iter().enumerate() {
                print::tree_head(idx, &format::record_title(stored));
                print::as_tree_one_level(&format::record_details(&stored.record));
                if idx + 1 != report.records.len() {
                    mprint!();
                }
            }
            print_summary(report, count, total_time);
        }
    }
}

fn print_summary(report: &ScanReport, hosts: usize, total_time: Duration) {
    let active_hosts: ColoredString = format!("{hosts} hosts").bold().green();
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let output: String = format!(
        "Scan of {} complete: {active_hosts} in {total_time}",
        format::target(&report.target)
    )
        .color(colors::TEXT_DEFAULT)
        .to_string();

    print::fat_separator();
    print::centerln(&output);
    success!("{} record(s) archived", report.records.len());
}
