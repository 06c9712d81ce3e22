//! Read side of the archive, as exposed to the CLI and the HTTP API.
//!
//! Only translates the caller's filter and clamps pagination; all ordering
//! and expiry rules live in the archive.

use std::sync::Arc;

use crate::archive::{ListFilter, Page, ScanArchive, StoredRecord};
use crate::error::PersistenceError;

pub const DEFAULT_LIMIT: u32 = 100;
pub const MAX_LIMIT: u32 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("No scan results found for this IP")]
    NotFound { address: String },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[derive(Clone)]
pub struct QueryService {
    archive: Arc<dyn ScanArchive>,
}

impl QueryService {
    pub fn new(archive: Arc<dyn ScanArchive>) -> Self {
        Self { archive }
    }

    /// Lists unexpired records, newest first.
    ///
    /// A blank `address` means no filter. `limit` defaults to
    /// [`DEFAULT_LIMIT`]; negative values become 0 and `limit` is capped at
    /// [`MAX_LIMIT`].
    pub async fn list(
        &self,
        address: Option<&str>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Page<StoredRecord>, QueryError> {
        let filter: ListFilter = ListFilter {
            address: address
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string),
        };
        let (limit, offset) = clamp_page(limit, offset);

        Ok(self.archive.list(&filter, limit, offset).await?)
    }

    pub async fn latest(&self, address: &str) -> Result<StoredRecord, QueryError> {
        let address: &str = address.trim();
        self.archive
            .latest_for_address(address)
            .await?
            .ok_or_else(|| QueryError::NotFound {
                address: address.to_string(),
            })
    }
}

pub fn clamp_page(limit: Option<i64>, offset: Option<i64>) -> (u32, u64) {
    let limit: u32 = match limit {
        None => DEFAULT_LIMIT,
        Some(n) => u32::try_from(n.clamp(0, i64::from(MAX_LIMIT))).unwrap_or(MAX_LIMIT),
    };
    let offset: u64 = offset.map_or(0, |n| n.max(0).unsigned_abs());
    (limit, offset)
}
