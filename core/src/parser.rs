//! # Scan Result Parser
//!
//! Turns the scanner's XML report into [`ScanRecord`]s.
//!
//! Parsing happens in two passes:
//! 1. **Shape check**: a streaming walk over the document confirms it is
//!    well-formed, complete and rooted at `<nmaprun>`. Anything else is a
//!    [`ParseError`], never an empty result.
//! 2. **Decode**: the document is deserialized into the typed schema in
//!    [`schema`], and each host entry is normalized into a record.
//!
//! The parser is a pure function of its input and the supplied timestamp.
//! A document with no `<host>` entries is a valid, empty [`ParsedScan`].

use chrono::{DateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::Serialize;
use tracing::debug;

use netsweep_common::network::host::{
    PortObservation, Reachability, ScanRecord, UNKNOWN_OS, UNKNOWN_PORT_STATE,
};

use crate::error::ParseError;
use crate::scanner::RawScanOutput;

mod schema;

use schema::{HostEntry, NmapRun, PortEntry};

const ROOT_ELEMENT: &[u8] = b"nmaprun";
const EXCERPT_CHARS: usize = 80;

/// A host the scanner reported but that could not become a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedHost {
    /// Whatever addresses the scanner did report, as `type:addr`.
    pub reported_addresses: Vec<String>,
    pub status: Reachability,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedScan {
    /// Records in the order the scanner listed the hosts.
    pub records: Vec<ScanRecord>,
    pub skipped: Vec<SkippedHost>,
}

impl ParsedScan {
    /// No host could be turned into a record.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub fn parse(raw: &RawScanOutput, observed_at: DateTime<Utc>) -> Result<ParsedScan, ParseError> {
    parse_document(&raw.document, observed_at)
}

pub fn parse_document(document: &str, observed_at: DateTime<Utc>) -> Result<ParsedScan, ParseError> {
    check_shape(document)?;

    let run: NmapRun = quick_xml::de::from_str(document).map_err(|e| ParseError {
        message: e.to_string(),
        excerpt: excerpt(document, 0),
    })?;

    let mut parsed: ParsedScan = ParsedScan::default();
    for host in run.hosts {
        match to_record(host, observed_at) {
            Ok(record) => parsed.records.push(record),
            Err(skipped) => parsed.skipped.push(skipped),
        }
    }
    Ok(parsed)
}

fn to_record(host: HostEntry, observed_at: DateTime<Utc>) -> Result<ScanRecord, SkippedHost> {
    let reachability: Reachability = Reachability::from_tool(
        host.status
            .as_ref()
            .and_then(|status| status.state.as_deref()),
    );

    let Some(address) = host.ipv4_address() else {
        return Err(SkippedHost {
            reported_addresses: host.describe_addresses(),
            status: reachability,
            reason: "no IPv4 address reported".to_string(),
        });
    };

    let ports: Vec<PortObservation> = host
        .ports
        .map(|group| group.ports)
        .unwrap_or_default()
        .into_iter()
        .filter_map(to_port)
        .collect();

    let os_guess: String = host
        .os
        .and_then(|os| os.matches.into_iter().next())
        .and_then(|best| best.name)
        .unwrap_or_else(|| UNKNOWN_OS.to_string());

    Ok(ScanRecord::new(address, observed_at, reachability, ports, os_guess))
}

fn to_port(entry: PortEntry) -> Option<PortObservation> {
    let port_id: String = entry.port_id.filter(|id| !id.trim().is_empty())?;
    let Some(protocol) = entry.protocol.filter(|p| !p.trim().is_empty()) else {
        debug!(port = %port_id, "dropping port entry without protocol");
        return None;
    };

    Some(PortObservation {
        port_id,
        protocol: protocol.into(),
        state: entry
            .state
            .and_then(|state| state.state)
            .unwrap_or_else(|| UNKNOWN_PORT_STATE.to_string()),
        service: entry
            .service
            .and_then(|service| service.name)
            .unwrap_or_default(),
    })
}

/// Confirms the document is a single, complete `<nmaprun>` element.
fn check_shape(document: &str) -> Result<(), ParseError> {
    if document.trim().is_empty() {
        return Err(ParseError {
            message: "scanner produced no output".to_string(),
            excerpt: String::new(),
        });
    }

    let mut reader = Reader::from_str(document);
    let mut depth: usize = 0;
    let mut seen_root: bool = false;

    loop {
        let position: usize = usize::try_from(reader.buffer_position()).unwrap_or(0);
        let event = reader.read_event().map_err(|e| ParseError {
            message: format!("malformed XML: {e}"),
            excerpt: excerpt(document, usize::try_from(reader.error_position()).unwrap_or(0)),
        })?;

        match event {
            Event::Start(ref tag) | Event::Empty(ref tag) => {
                if depth == 0 {
                    if seen_root {
                        return Err(shape_error("more than one root element", document, position));
                    }
                    if tag.local_name().as_ref() != ROOT_ELEMENT {
                        let found: String = String::from_utf8_lossy(tag.local_name().as_ref()).into_owned();
                        return Err(shape_error(
                            &format!("expected <nmaprun> root element, found <{found}>"),
                            document,
                            position,
                        ));
                    }
                    seen_root = true;
                }
                if matches!(event, Event::Start(_)) {
                    depth += 1;
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Text(ref text) if depth == 0 => {
                if !text.iter().all(u8::is_ascii_whitespace) {
                    return Err(shape_error("text outside the root element", document, position));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(shape_error("document has no root element", document, 0));
    }
    if depth > 0 {
        return Err(shape_error(
            &format!("document is truncated ({depth} unclosed element(s))"),
            document,
            document.len(),
        ));
    }
    Ok(())
}

fn shape_error(message: &str, document: &str, position: usize) -> ParseError {
    ParseError {
        message: message.to_string(),
        excerpt: excerpt(document, position),
    }
}

/// A single-line window of `document` around byte `position`.
fn excerpt(document: &str, position: usize) -> String {
    let mut start: usize = position.saturating_sub(EXCERPT_CHARS / 2).min(document.len());
    while !document.is_char_boundary(start) {
        start -= 1;
    }
    document[start..]
        .chars()
        .take(EXCERPT_CHARS)
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}
