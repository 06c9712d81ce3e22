//! # netsweep common
//!
//! Types shared by every netsweep crate: the scan target model and its
//! validator, the host record model persisted by the archive, runtime
//! configuration, the clock abstraction and the user-facing log macros.

pub mod clock;
pub mod config;
pub mod network;
pub mod print;

#[doc(hidden)]
pub use tracing as __tracing;
