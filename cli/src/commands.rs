pub mod check;
pub mod results;
pub mod scan;
pub mod serve;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;

use netsweep_common::config::{
    Config, DEFAULT_DB_PATH, DEFAULT_LISTEN_ADDR, DEFAULT_NMAP_PATH, DEFAULT_REAP_INTERVAL_SECS,
    DEFAULT_RETENTION_DAYS,
};
use netsweep_core::archive::{ScanArchive, SqliteArchive};

#[derive(Parser)]
#[command(name = "netsweep", version)]
#[command(about = "Network scan discovery with an expiring result archive.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Scanning executable (name on PATH or full path)
    #[arg(long, global = true, env = "NETSWEEP_NMAP", default_value = DEFAULT_NMAP_PATH)]
    pub nmap: PathBuf,

    /// SQLite file holding the scan archive
    #[arg(long, global = true, env = "NETSWEEP_DB", default_value = DEFAULT_DB_PATH)]
    pub db: PathBuf,

    /// Days a scan record is kept
    #[arg(
        long,
        global = true,
        env = "NETSWEEP_RETENTION_DAYS",
        default_value_t = DEFAULT_RETENTION_DAYS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub retention_days: u32,

    /// Seconds between expiry sweeps while serving
    #[arg(long, global = true, env = "NETSWEEP_REAP_INTERVAL", default_value_t = DEFAULT_REAP_INTERVAL_SECS)]
    pub reap_interval_secs: u64,

    /// Kill a scan still running after this many seconds
    #[arg(long, global = true, env = "NETSWEEP_SCAN_TIMEOUT")]
    pub scan_timeout_secs: Option<u64>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a subnet or a single host and archive what is found
    #[command(alias = "s")]
    Scan {
        /// CIDR block (192.168.1.0/24) or a bare IPv4 address
        target: String,
    },
    /// List archived results, newest first
    #[command(alias = "r")]
    Results {
        /// Only results for this address
        #[arg(long)]
        ip: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        limit: Option<i64>,
        #[arg(long, allow_negative_numbers = true)]
        skip: Option<i64>,
    },
    /// Show the most recent result for one address
    #[command(alias = "l")]
    Latest { ip: String },
    /// Serve the HTTP API
    Serve {
        #[arg(long, env = "NETSWEEP_LISTEN", default_value = DEFAULT_LISTEN_ADDR)]
        listen: SocketAddr,
    },
    /// Check whether the scanning tool can be launched
    #[command(alias = "c")]
    Check,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn config(&self) -> Config {
        let mut cfg: Config = Config {
            nmap_path: self.nmap.clone(),
            db_path: self.db.clone(),
            retention_days: self.retention_days,
            reap_interval: Duration::from_secs(self.reap_interval_secs),
            scan_timeout: self.scan_timeout_secs.map(Duration::from_secs),
            ..Config::default()
        };
        if let Commands::Serve { listen } = self.command {
            cfg.listen_addr = listen;
        }
        cfg
    }
}

/// Opens the archive and clears out anything already expired.
pub async fn open_archive(cfg: &Config) -> anyhow::Result<Arc<SqliteArchive>> {
    let archive: SqliteArchive = SqliteArchive::from_config(cfg)?;
    let removed: u64 = archive.purge_expired().await?;
    debug!(removed, "expired records purged on open");
    Ok(Arc::new(archive))
}
