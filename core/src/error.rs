//! Error taxonomy of the scan pipeline.
//!
//! Each stage fails with its own type; [`PipelineError`] is the sum the
//! callers (CLI, HTTP API) match on to decide between a client fault and a
//! server fault.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use netsweep_common::network::target::ValidationError;

/// Longest stderr excerpt kept in a [`ScanError`]'s `Display` output.
const STDERR_DISPLAY_LIMIT: usize = 512;

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("scanning tool '{}' is not installed or not accessible", program.display())]
    DependencyMissing { program: PathBuf },

    #[error("failed to launch '{}': {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("scan failed with code {}: {}", display_code(*code), truncate(stderr, STDERR_DISPLAY_LIMIT))]
    Exit { code: Option<i32>, stderr: String },

    #[error("scan was cancelled")]
    Cancelled,

    #[error("scan exceeded the {}s time limit", .0.as_secs())]
    TimedOut(Duration),

    #[error("i/o error while reading scanner output: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("could not parse scan output: {message} (near `{excerpt}`)")]
pub struct ParseError {
    pub message: String,
    /// The offending fragment of the raw document.
    pub excerpt: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupt record {id}: {reason}")]
    Corrupt { id: i64, reason: String },

    #[error("storage task failed: {0}")]
    Task(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid subnet: {0}")]
    Validation(#[from] ValidationError),

    #[error("scanning tool '{}' is not installed or not accessible", program.display())]
    DependencyMissing { program: PathBuf },

    #[error(transparent)]
    Scan(ScanError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl From<ScanError> for PipelineError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::DependencyMissing { program } => PipelineError::DependencyMissing { program },
            other => PipelineError::Scan(other),
        }
    }
}

impl PipelineError {
    /// True when the failure was caused by the caller's input.
    pub fn is_client_fault(&self) -> bool {
        matches!(self, PipelineError::Validation(_))
    }
}

fn display_code(code: Option<i32>) -> String {
    code.map_or_else(|| "none (terminated by signal)".to_string(), |c| c.to_string())
}

pub(crate) fn truncate(s: &str, max_chars: usize) -> String {
    let trimmed: &str = s.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
