//! User-facing log macros.
//!
//! These forward to `tracing` under the `netsweep::status` target so the CLI
//! formatter can render them with its status symbols, while library crates
//! stay free of any terminal handling.

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::__tracing::info!(target: "netsweep::status", $($arg)*)
    };
}

#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        $crate::__tracing::info!(target: "netsweep::status", success = true, $($arg)*)
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::__tracing::warn!(target: "netsweep::status", $($arg)*)
    };
}
