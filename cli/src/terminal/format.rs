use chrono::Local;
use colored::*;

use netsweep_common::network::host::{PortObservation, Reachability, ScanRecord};
use netsweep_common::network::target::NormalizedTarget;
use netsweep_core::archive::StoredRecord;

use crate::terminal::colors;

pub type Detail = (String, ColoredString);

pub fn reachability(status: Reachability) -> ColoredString {
    let color: Color = match status {
        Reachability::Up => colors::HOST_UP,
        Reachability::Down => colors::HOST_DOWN,
        Reachability::Unknown => colors::HOST_UNKNOWN,
    };
    status.as_str().color(color)
}

pub fn port_state(state: &str) -> ColoredString {
    match state {
        "open" => state.color(colors::PORT_OPEN).bold(),
        "closed" => state.color(colors::PORT_CLOSED),
        s if s.contains("filtered") => state.color(colors::PORT_FILTERED),
        _ => state.color(colors::TEXT_DEFAULT),
    }
}

/// `10.0.0.0/24`, address and prefix in their own colours.
pub fn target(target: &NormalizedTarget) -> String {
    format!(
        "{}{}",
        target.addr().to_string().color(colors::IPV4_ADDR),
        format!("/{}", target.prefix()).color(colors::IPV4_PREFIX)
    )
}

/// `22/tcp open ssh`
pub fn port_line(port: &PortObservation) -> ColoredString {
    let id: String = format!("{}/{}", port.port_id, port.protocol);
    let service: &str = if port.service.is_empty() { "?" } else { &port.service };
    format!("{:<9} {} {}", id, port_state(&port.state), service.dimmed()).normal()
}

pub fn record_details(record: &ScanRecord) -> Vec<Detail> {
    let seen: String = record
        .observed_at()
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();
    let open: usize = record.open_ports().count();

    let mut details: Vec<Detail> = vec![
        ("Status".to_string(), reachability(record.reachability())),
        ("OS".to_string(), record.os_guess().color(colors::OS_GUESS)),
        ("Seen".to_string(), seen.color(colors::TIMESTAMP)),
        (
            "Ports".to_string(),
            format!("{open} open of {} reported", record.ports().len()).normal(),
        ),
    ];

    for port in record.ports() {
        details.push(("Port".to_string(), port_line(port)));
    }
    for vuln in record.vulnerabilities() {
        details.push((
            "Vuln".to_string(),
            format!("[{:?}] {}: {}", vuln.severity, vuln.kind, vuln.description).red(),
        ));
    }
    details
}

pub fn record_title(stored: &StoredRecord) -> String {
    format!(
        "{} {}",
        stored.record.address().to_string().color(colors::IPV4_ADDR),
        format!("#{}", stored.id).color(colors::SEPARATOR)
    )
}
