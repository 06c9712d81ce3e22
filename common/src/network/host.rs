//! # Host Records
//!
//! The normalized form of one host as seen by one scan run.
//!
//! A [`ScanRecord`] is built once by the result parser and never edited
//! afterwards: its fields are private and the only "modifier",
//! [`ScanRecord::with_vulnerabilities`], consumes the record and returns a new
//! one. Serialized field names follow the archive's public record shape
//! (`ip`, `timestamp`, `status`, `ports`, `osMatch`, `vulnerabilities`).

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// OS label used when the scanner reports no OS match.
pub const UNKNOWN_OS: &str = "Unknown";

/// Port state used when the scanner omits one.
pub const UNKNOWN_PORT_STATE: &str = "unknown";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reachability {
    Up,
    Down,
    #[default]
    Unknown,
}

impl Reachability {
    /// Maps the scanner's host state attribute, `unknown` when absent or unrecognized.
    pub fn from_tool(state: Option<&str>) -> Self {
        state
            .and_then(|s| s.parse().ok())
            .unwrap_or(Reachability::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Reachability::Up => "up",
            Reachability::Down => "down",
            Reachability::Unknown => "unknown",
        }
    }
}

impl FromStr for Reachability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Reachability::Up),
            "down" => Ok(Reachability::Down),
            "unknown" => Ok(Reachability::Unknown),
            other => Err(format!("unknown host state: {other}")),
        }
    }
}

impl fmt::Display for Reachability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport protocol of a port observation.
///
/// Protocols other than TCP and UDP are kept verbatim rather than dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Protocol {
    Tcp,
    Udp,
    Other(String),
}

impl Protocol {
    pub fn as_str(&self) -> &str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::Other(name) => name,
        }
    }
}

impl From<String> for Protocol {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "tcp" => Protocol::Tcp,
            "udp" => Protocol::Udp,
            _ => Protocol::Other(value),
        }
    }
}

impl From<&str> for Protocol {
    fn from(value: &str) -> Self {
        Protocol::from(value.to_string())
    }
}

impl From<Protocol> for String {
    fn from(value: Protocol) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortObservation {
    /// Port number exactly as the scanner printed it.
    pub port_id: String,
    pub protocol: Protocol,
    /// Passed through from the scanner (`open`, `closed`, `filtered`, ...).
    pub state: String,
    /// Best-effort service name, empty when unknown.
    pub service: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vulnerability {
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: Severity,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    #[serde(rename = "ip")]
    address: Ipv4Addr,
    #[serde(rename = "timestamp")]
    observed_at: DateTime<Utc>,
    #[serde(rename = "status")]
    reachability: Reachability,
    ports: Vec<PortObservation>,
    #[serde(rename = "osMatch")]
    os_guess: String,
    vulnerabilities: Vec<Vulnerability>,
}

impl ScanRecord {
    /// Builds a record with no vulnerabilities.
    ///
    /// An empty `os_guess` is stored as [`UNKNOWN_OS`]. `observed_at` is cut
    /// to whole milliseconds, the precision the archive keeps.
    pub fn new(
        address: Ipv4Addr,
        observed_at: DateTime<Utc>,
        reachability: Reachability,
        ports: Vec<PortObservation>,
        os_guess: impl Into<String>,
    ) -> Self {
        let os_guess: String = os_guess.into();
        Self {
            address,
            observed_at: observed_at.trunc_subsecs(3),
            reachability,
            ports,
            os_guess: if os_guess.trim().is_empty() {
                UNKNOWN_OS.to_string()
            } else {
                os_guess
            },
            vulnerabilities: Vec::new(),
        }
    }

    /// Returns a copy of this record carrying `vulnerabilities`, duplicates removed.
    ///
    /// Used by enrichment steps that run before the record is archived.
    pub fn with_vulnerabilities(mut self, vulnerabilities: Vec<Vulnerability>) -> Self {
        let mut unique: Vec<Vulnerability> = Vec::with_capacity(vulnerabilities.len());
        for vuln in vulnerabilities {
            if !unique.contains(&vuln) {
                unique.push(vuln);
            }
        }
        self.vulnerabilities = unique;
        self
    }

    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }

    pub fn reachability(&self) -> Reachability {
        self.reachability
    }

    pub fn ports(&self) -> &[PortObservation] {
        &self.ports
    }

    pub fn os_guess(&self) -> &str {
        &self.os_guess
    }

    pub fn vulnerabilities(&self) -> &[Vulnerability] {
        &self.vulnerabilities
    }

    pub fn open_ports(&self) -> impl Iterator<Item = &PortObservation> {
        self.ports.iter().filter(|port| port.state == "open")
    }
}
