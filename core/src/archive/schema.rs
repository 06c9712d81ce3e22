use rusqlite::Connection;

use crate::error::PersistenceError;

const SCHEMA_SQL: &str = r#"
-- One row per host per scan run
CREATE TABLE IF NOT EXISTS scan_records (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    ip           TEXT NOT NULL CHECK (ip <> ''),
    observed_at  INTEGER NOT NULL,  -- ms since the UNIX epoch, UTC
    status       TEXT NOT NULL,
    os_match     TEXT NOT NULL,
    ports_json   TEXT NOT NULL,
    vulns_json   TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_records_ip_time ON scan_records(ip, observed_at DESC);
CREATE INDEX IF NOT EXISTS idx_records_time ON scan_records(observed_at);

-- Records are append-only
CREATE TRIGGER IF NOT EXISTS scan_records_no_update
BEFORE UPDATE ON scan_records
BEGIN
    SELECT RAISE(ABORT, 'scan records are immutable');
END;
"#;

pub(crate) fn initialize(conn: &Connection) -> Result<(), PersistenceError> {
    // In-memory databases answer "memory" here; that is fine.
    let mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    tracing::debug!(journal_mode = %mode, "archive journal mode");
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
