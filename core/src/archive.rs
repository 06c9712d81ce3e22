//! # Scan Archive
//!
//! Append-only storage of [`ScanRecord`]s with automatic expiry.
//!
//! Records are inserted, read and eventually removed by age; nothing is ever
//! updated in place. Reads only return records younger than the retention
//! window, and the [`reaper`] deletes the rest from storage on a schedule.

use async_trait::async_trait;
use serde::Serialize;

use netsweep_common::network::host::ScanRecord;

use crate::error::PersistenceError;

pub mod reaper;
mod schema;
mod sqlite;

pub use reaper::spawn_reaper;
pub use sqlite::SqliteArchive;

/// Storage-assigned identifier of an archived record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A record as read back from the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredRecord {
    pub id: RecordId,
    #[serde(flatten)]
    pub record: ScanRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Matching records across all pages.
    pub total: u64,
    pub limit: u32,
    pub offset: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Exact dotted-quad match.
    pub address: Option<String>,
}

impl ListFilter {
    pub fn address(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
        }
    }
}

#[async_trait]
pub trait ScanArchive: Send + Sync {
    /// Appends `record`. Saves are independent of each other.
    async fn save(&self, record: &ScanRecord) -> Result<RecordId, PersistenceError>;

    /// Unexpired records matching `filter`, newest `observed_at` first.
    async fn list(
        &self,
        filter: &ListFilter,
        limit: u32,
        offset: u64,
    ) -> Result<Page<StoredRecord>, PersistenceError>;

    /// Permanently deletes expired records, returning how many were removed.
    async fn purge_expired(&self) -> Result<u64, PersistenceError>;

    async fn find_by_address(
        &self,
        address: &str,
        limit: u32,
        offset: u64,
    ) -> Result<Page<StoredRecord>, PersistenceError> {
        self.list(&ListFilter::address(address), limit, offset).await
    }

    async fn latest_for_address(&self, address: &str) -> Result<Option<StoredRecord>, PersistenceError> {
        let page: Page<StoredRecord> = self.find_by_address(address, 1, 0).await?;
        Ok(page.items.into_iter().next())
    }
}
