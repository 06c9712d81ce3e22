//! Typed view of the parts of nmap's XML report the parser reads.
//!
//! Every attribute is optional here; deciding what a missing value means is
//! left to the parser. Elements and attributes not listed are ignored.

use std::net::Ipv4Addr;

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NmapRun {
    #[serde(rename = "host", default)]
    pub hosts: Vec<HostEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct HostEntry {
    #[serde(rename = "address", default)]
    pub addresses: Vec<AddressEntry>,
    #[serde(default)]
    pub status: Option<StatusEntry>,
    #[serde(default)]
    pub ports: Option<PortsEntry>,
    #[serde(default)]
    pub os: Option<OsEntry>,
}

impl HostEntry {
    /// The first address tagged IPv4 that actually parses as one.
    ///
    /// nmap's DTD makes `ipv4` the default `addrtype`, so an untagged address
    /// also qualifies.
    pub fn ipv4_address(&self) -> Option<Ipv4Addr> {
        self.addresses
            .iter()
            .filter(|entry| {
                entry
                    .addr_type
                    .as_deref()
                    .is_none_or(|kind| kind.eq_ignore_ascii_case("ipv4"))
            })
            .find_map(|entry| entry.addr.as_deref()?.trim().parse().ok())
    }

    /// All reported addresses as `type:addr`, for diagnostics.
    pub fn describe_addresses(&self) -> Vec<String> {
        self.addresses
            .iter()
            .filter_map(|entry| {
                let addr: &str = entry.addr.as_deref()?;
                let kind: &str = entry.addr_type.as_deref().unwrap_or("ipv4");
                Some(format!("{kind}:{addr}"))
            })
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AddressEntry {
    #[serde(rename = "@addr")]
    pub addr: Option<String>,
    #[serde(rename = "@addrtype")]
    pub addr_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StatusEntry {
    #[serde(rename = "@state")]
    pub state: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PortsEntry {
    #[serde(rename = "port", default)]
    pub ports: Vec<PortEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PortEntry {
    #[serde(rename = "@protocol")]
    pub protocol: Option<String>,
    #[serde(rename = "@portid")]
    pub port_id: Option<String>,
    #[serde(default)]
    pub state: Option<PortStateEntry>,
    #[serde(default)]
    pub service: Option<ServiceEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PortStateEntry {
    #[serde(rename = "@state")]
    pub state: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ServiceEntry {
    #[serde(rename = "@name")]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OsEntry {
    #[serde(rename = "osmatch", default)]
    pub matches: Vec<OsMatchEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OsMatchEntry {
    #[serde(rename = "@name")]
    pub name: Option<String>,
}
