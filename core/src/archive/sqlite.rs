use std::net::Ipv4Addr;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

use netsweep_common::clock::{Clock, SystemClock};
use netsweep_common::config::Config;
use netsweep_common::network::host::{PortObservation, Reachability, ScanRecord, Vulnerability};

use super::{ListFilter, Page, RecordId, ScanArchive, StoredRecord, schema};
use crate::error::PersistenceError;

const SELECT_COLUMNS: &str = "id, ip, observed_at, status, os_match, ports_json, vulns_json";

/// Scan archive backed by a single SQLite connection.
///
/// Statements run on the blocking pool so a slow disk never stalls the
/// async runtime.
pub struct SqliteArchive {
    conn: Arc<Mutex<Connection>>,
    clock: Arc<dyn Clock>,
    retention: TimeDelta,
}

impl SqliteArchive {
    pub fn open(path: &Path, retention: TimeDelta, clock: Arc<dyn Clock>) -> Result<Self, PersistenceError> {
        debug!(path = %path.display(), "opening scan archive");
        Self::with_connection(Connection::open(path)?, retention, clock)
    }

    pub fn open_in_memory(retention: TimeDelta, clock: Arc<dyn Clock>) -> Result<Self, PersistenceError> {
        Self::with_connection(Connection::open_in_memory()?, retention, clock)
    }

    pub fn from_config(cfg: &Config) -> Result<Self, PersistenceError> {
        Self::open(&cfg.db_path, cfg.retention(), Arc::new(SystemClock))
    }

    fn with_connection(
        conn: Connection,
        retention: TimeDelta,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, PersistenceError> {
        schema::initialize(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            clock,
            retention,
        })
    }

    /// Rows physically present, expired or not.
    pub async fn row_count(&self) -> Result<u64, PersistenceError> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM scan_records", [], |row| row.get(0))?;
            Ok(count.unsigned_abs())
        })
        .await
    }

    /// Oldest `observed_at` that is still inside the retention window.
    fn cutoff(&self) -> DateTime<Utc> {
        self.clock.now() - self.retention
    }

    async fn with_conn<F, T>(&self, f: F) -> Result<T, PersistenceError>
    where
        F: FnOnce(&Connection) -> Result<T, PersistenceError> + Send + 'static,
        T: Send + 'static,
    {
        let conn: Arc<Mutex<Connection>> = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| PersistenceError::Task("archive connection lock poisoned".to_string()))?;
            f(&guard)
        })
        .await
        .map_err(|e| PersistenceError::Task(e.to_string()))?
    }
}

#[async_trait]
impl ScanArchive for SqliteArchive {
    async fn save(&self, record: &ScanRecord) -> Result<RecordId, PersistenceError> {
        let ip: String = record.address().to_string();
        let observed_at: i64 = record.observed_at().timestamp_millis();
        let status: &'static str = record.reachability().as_str();
        let os_match: String = record.os_guess().to_string();
        let ports_json: String = serde_json::to_string(record.ports())?;
        let vulns_json: String = serde_json::to_string(record.vulnerabilities())?;

        let id: i64 = self
            .with_conn(move |conn| {
                conn.execute(
                    "INSERT INTO scan_records (ip, observed_at, status, os_match, ports_json, vulns_json)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![ip, observed_at, status, os_match, ports_json, vulns_json],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;

        debug!(id, address = %record.address(), "archived scan record");
        Ok(RecordId(id))
    }

    async fn list(
        &self,
        filter: &ListFilter,
        limit: u32,
        offset: u64,
    ) -> Result<Page<StoredRecord>, PersistenceError> {
        let cutoff: i64 = self.cutoff().timestamp_millis();
        let address: Option<String> = filter.address.clone();

        let (items, total) = self
            .with_conn(move |conn| {
                let total: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM scan_records
                     WHERE observed_at >= ?1 AND (?2 IS NULL OR ip = ?2)",
                    params![cutoff, address],
                    |row| row.get(0),
                )?;

                let mut stmt = conn.prepare(&format!(
                    "SELECT {SELECT_COLUMNS} FROM scan_records
                     WHERE observed_at >= ?1 AND (?2 IS NULL OR ip = ?2)
                     ORDER BY observed_at DESC, id DESC
                     LIMIT ?3 OFFSET ?4"
                ))?;
                let rows = stmt.query_map(
                    params![
                        cutoff,
                        address,
                        i64::from(limit),
                        i64::try_from(offset).unwrap_or(i64::MAX)
                    ],
                    RawRow::from_row,
                )?;

                let mut items: Vec<StoredRecord> = Vec::new();
                for row in rows {
                    items.push(row?.into_stored()?);
                }
                Ok((items, total))
            })
            .await?;

        Ok(Page {
            items,
            total: total.unsigned_abs(),
            limit,
            offset,
        })
    }

    async fn latest_for_address(&self, address: &str) -> Result<Option<StoredRecord>, PersistenceError> {
        let cutoff: i64 = self.cutoff().timestamp_millis();
        let address: String = address.to_string();

        self.with_conn(move |conn| {
            let raw: Option<RawRow> = conn
                .query_row(
                    &format!(
                        "SELECT {SELECT_COLUMNS} FROM scan_records
                         WHERE ip = ?1 AND observed_at >= ?2
                         ORDER BY observed_at DESC, id DESC
                         LIMIT 1"
                    ),
                    params![address, cutoff],
                    RawRow::from_row,
                )
                .optional()?;
            raw.map(RawRow::into_stored).transpose()
        })
        .await
    }

    async fn purge_expired(&self) -> Result<u64, PersistenceError> {
        let cutoff: DateTime<Utc> = self.cutoff();
        let cutoff_ms: i64 = cutoff.timestamp_millis();

        let removed: usize = self
            .with_conn(move |conn| {
                Ok(conn.execute(
                    "DELETE FROM scan_records WHERE observed_at < ?1",
                    params![cutoff_ms],
                )?)
            })
            .await?;

        debug!(removed, %cutoff, "purged expired scan records");
        Ok(removed as u64)
    }
}

/// Column values of one `scan_records` row before validation.
struct RawRow {
    id: i64,
    ip: String,
    observed_at: i64,
    status: String,
    os_match: String,
    ports_json: String,
    vulns_json: String,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            ip: row.get(1)?,
            observed_at: row.get(2)?,
            status: row.get(3)?,
            os_match: row.get(4)?,
            ports_json: row.get(5)?,
            vulns_json: row.get(6)?,
        })
    }

    fn into_stored(self) -> Result<StoredRecord, PersistenceError> {
        let corrupt = |reason: String| PersistenceError::Corrupt { id: self.id, reason };

        let address: Ipv4Addr = self
            .ip
            .parse()
            .map_err(|_| corrupt(format!("invalid address '{}'", self.ip)))?;
        let observed_at: DateTime<Utc> = DateTime::from_timestamp_millis(self.observed_at)
            .ok_or_else(|| corrupt(format!("timestamp {} out of range", self.observed_at)))?;
        let reachability: Reachability = self.status.parse().map_err(corrupt)?;
        let ports: Vec<PortObservation> = serde_json::from_str(&self.ports_json)?;
        let vulnerabilities: Vec<Vulnerability> = serde_json::from_str(&self.vulns_json)?;

        let record: ScanRecord = ScanRecord::new(address, observed_at, reachability, ports, self.os_match)
            .with_vulnerabilities(vulnerabilities);

        Ok(StoredRecord {
            id: RecordId(self.id),
            record,
        })
    }
}
