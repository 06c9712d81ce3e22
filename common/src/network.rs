//! Network-facing value types.
//!
//! * [`target`]: parsing and validation of scan targets (CIDR blocks).
//! * [`range`]: inclusive IPv4 ranges covered by a target.
//! * [`host`]: the normalized record of one discovered host.

pub mod host;
pub mod range;
pub mod target;
