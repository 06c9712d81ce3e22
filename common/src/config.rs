use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Number of days a scan record is kept before the archive removes it.
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

/// Seconds between two sweeps of the expiry reaper.
pub const DEFAULT_REAP_INTERVAL_SECS: u64 = 3600;

pub const DEFAULT_NMAP_PATH: &str = "nmap";
pub const DEFAULT_DB_PATH: &str = "netsweep.db";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:5000";

#[derive(Debug, Clone)]
pub struct Config {
    /// Name or path of the scanning executable.
    ///
    /// Resolved through `PATH` when it is a bare name.
    pub nmap_path: PathBuf,

    /// SQLite file backing the scan archive.
    pub db_path: PathBuf,

    /// Records older than this many days are removed by the archive.
    pub retention_days: u32,

    /// How often the background reaper deletes expired records.
    pub reap_interval: Duration,

    /// Hard wall-clock limit on a single scan.
    ///
    /// `None` leaves the running time bounded only by the scanner's own
    /// timing flags.
    pub scan_timeout: Option<Duration>,

    /// Socket the HTTP API binds to.
    pub listen_addr: SocketAddr,
}

impl Config {
    pub fn retention(&self) -> chrono::TimeDelta {
        chrono::TimeDelta::days(i64::from(self.retention_days))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nmap_path: PathBuf::from(DEFAULT_NMAP_PATH),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            retention_days: DEFAULT_RETENTION_DAYS,
            reap_interval: Duration::from_secs(DEFAULT_REAP_INTERVAL_SECS),
            scan_timeout: None,
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
        }
    }
}
