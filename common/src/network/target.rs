//! # Scan Target Model
//!
//! Validation of the only user-supplied value that reaches the scanner's
//! argument vector.
//!
//! A target is accepted in strict CIDR form `a.b.c.d/m`: four decimal octets
//! of one to three digits each in `0..=255`, and a one or two digit mask in
//! `0..=32`. Anything else is rejected as-is; [`validate`] never rewrites its
//! input. Turning a bare address into a `/32` is the job of the caller, see
//! [`normalize_input`].

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::network::range::{self, Ipv4Range};

const MAX_OCTET_DIGITS: usize = 3;
const MAX_MASK_DIGITS: usize = 2;

/// A CIDR block that passed [`validate`].
///
/// Its [`Display`](fmt::Display) form is rebuilt from the parsed numbers, so
/// the string handed to the scanner never contains a byte of the raw input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NormalizedTarget {
    addr: Ipv4Addr,
    prefix: u8,
}

impl NormalizedTarget {
    pub fn addr(&self) -> Ipv4Addr {
        self.addr
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Every address covered by the block, network and broadcast included.
    pub fn range(&self) -> Ipv4Range {
        range::cidr_range(self.addr, self.prefix)
    }
}

impl fmt::Display for NormalizedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix)
    }
}

impl FromStr for NormalizedTarget {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate(s)
    }
}

impl Serialize for NormalizedTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Subnet parameter is required")]
    Empty,
    #[error("Invalid subnet format. Expected format: xxx.xxx.xxx.xxx/xx")]
    Format,
    #[error("IP address octets must be between 0 and 255 (got {0})")]
    OctetOutOfRange(u16),
    #[error("Subnet mask must be between 0 and 32 (got {0})")]
    MaskOutOfRange(u8),
}

/// Checks that `input` is a CIDR block and returns its parsed form.
///
/// Pure: no I/O, no allocation beyond the octet split.
pub fn validate(input: &str) -> Result<NormalizedTarget, ValidationError> {
    if input.is_empty() {
        return Err(ValidationError::Empty);
    }

    let (ip_str, mask_str) = input.split_once('/').ok_or(ValidationError::Format)?;

    let octet_strs: Vec<&str> = ip_str.split('.').collect();
    if octet_strs.len() != 4 {
        return Err(ValidationError::Format);
    }
    if !octet_strs
        .iter()
        .all(|octet| is_short_decimal(octet, MAX_OCTET_DIGITS))
    {
        return Err(ValidationError::Format);
    }
    if !is_short_decimal(mask_str, MAX_MASK_DIGITS) {
        return Err(ValidationError::Format);
    }

    let mut octets: [u8; 4] = [0; 4];
    for (slot, octet_str) in octets.iter_mut().zip(&octet_strs) {
        // at most three digits, always fits
        let value: u16 = octet_str.parse().map_err(|_| ValidationError::Format)?;
        *slot = u8::try_from(value).map_err(|_| ValidationError::OctetOutOfRange(value))?;
    }

    let prefix: u8 = mask_str.parse().map_err(|_| ValidationError::Format)?;
    if prefix > 32 {
        return Err(ValidationError::MaskOutOfRange(prefix));
    }

    Ok(NormalizedTarget {
        addr: Ipv4Addr::from(octets),
        prefix,
    })
}

/// Prepares raw user input for [`validate`].
///
/// Surrounding whitespace is dropped and a bare dotted quad gets a `/32`
/// mask. Everything else passes through untouched so the validator can
/// reject it.
pub fn normalize_input(input: &str) -> String {
    let trimmed: &str = input.trim();
    if is_bare_dotted_quad(trimmed) {
        format!("{trimmed}/32")
    } else {
        trimmed.to_string()
    }
}

fn is_bare_dotted_quad(s: &str) -> bool {
    let parts: Vec<&str> = s.split('.').collect();
    parts.len() == 4 && parts.iter().all(|part| is_short_decimal(part, MAX_OCTET_DIGITS))
}

fn is_short_decimal(s: &str, max_digits: usize) -> bool {
    !s.is_empty() && s.len() <= max_digits && s.bytes().all(|b| b.is_ascii_digit())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
