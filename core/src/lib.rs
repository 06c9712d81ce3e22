//! Scan pipeline: tool invocation, report parsing, archiving and queries.

pub mod archive;
pub mod discovery;
pub mod error;
pub mod parser;
pub mod query;
pub mod scanner;

pub use discovery::{ScanOutcome, ScanReport, ScanService};
pub use query::QueryService;
