//! An **nmap**-backed scanner.
//!
//! Runs a SYN scan across the full TCP port range with OS detection and
//! collects the XML report from standard output. The argument vector is
//! fixed; the validated target is its only variable element.

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use netsweep_common::config::Config;
use netsweep_common::network::target::NormalizedTarget;

use super::process::{self, GroupGuard};
use super::{NetworkScanner, RawScanOutput, tool};
use crate::error::ScanError;

/// Every nmap argument except the target, in order.
pub const NMAP_FIXED_ARGS: [&str; 10] = [
    "-sS",             // SYN scan
    "-T4",             // aggressive timing
    "--max-retries",
    "2",
    "-p-",             // all ports
    "-n",              // no reverse DNS
    "-O",
    "--osscan-guess",
    "-oX",             // XML report...
    "-",               // ...on stdout
];

#[derive(Debug, Clone)]
pub struct NmapScanner {
    program: PathBuf,
    timeout: Option<Duration>,
}

enum Exit {
    Finished(io::Result<ExitStatus>),
    Interrupted(Interrupt),
}

enum Interrupt {
    Cancelled,
    TimedOut,
}

impl NmapScanner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.nmap_path.clone()).with_timeout(cfg.scan_timeout)
    }

    /// Kill the scan if it is still running after `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The complete argument vector for `target`.
    pub fn arguments(target: &NormalizedTarget) -> Vec<String> {
        NMAP_FIXED_ARGS
            .iter()
            .map(|arg| arg.to_string())
            .chain(std::iter::once(target.to_string()))
            .collect()
    }

    fn interrupted(&self, interrupt: Interrupt, target: &NormalizedTarget) -> ScanError {
        match interrupt {
            Interrupt::Cancelled => {
                info!(subnet = %target, "scan cancelled, scanner terminated");
                ScanError::Cancelled
            }
            Interrupt::TimedOut => {
                let limit: Duration = self.timeout.unwrap_or_default();
                info!(subnet = %target, secs = limit.as_secs(), "scan timed out, scanner terminated");
                ScanError::TimedOut(limit)
            }
        }
    }

    fn spawn(&self, target: &NormalizedTarget) -> Result<Child, ScanError> {
        let args: Vec<String> = Self::arguments(target);
        debug!(program = %self.program.display(), ?args, "launching scanner");

        let mut command: Command = Command::new(&self.program);
        command.args(&args);
        process::configure(&mut command);

        command.spawn().map_err(|source| ScanError::Spawn {
            program: self.program.clone(),
            source,
        })
    }
}

#[async_trait]
impl NetworkScanner for NmapScanner {
    fn program(&self) -> &Path {
        &self.program
    }

    async fn is_available(&self) -> bool {
        tool::is_available(&self.program).await
    }

    async fn scan(
        &self,
        target: &NormalizedTarget,
        cancel: CancellationToken,
    ) -> Result<RawScanOutput, ScanError> {
        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }
        // Re-check: the tool may have vanished since the caller last looked.
        if !self.is_available().await {
            return Err(ScanError::DependencyMissing {
                program: self.program.clone(),
            });
        }

        let mut child: Child = self.spawn(target)?;
        let mut guard: GroupGuard = GroupGuard::new(&child);

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("scanner stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::other("scanner stderr was not captured"))?;

        let deadline: Option<Instant> = self.timeout.map(|limit| Instant::now() + limit);
        let mut stdout_task: JoinHandle<io::Result<String>> = tokio::spawn(process::read_to_string(stdout));
        let mut stderr_task: JoinHandle<io::Result<String>> = tokio::spawn(process::drain_stderr(stderr));

        let exit: Exit = tokio::select! {
            status = child.wait() => Exit::Finished(status),
            interrupt = interruption(&cancel, deadline) => Exit::Interrupted(interrupt),
        };

        let status: ExitStatus = match exit {
            Exit::Finished(status) => status?,
            Exit::Interrupted(interrupt) => {
                abandon(guard, &mut child, [stdout_task, stderr_task]).await;
                return Err(self.interrupted(interrupt, target));
            }
        };

        // The leader is gone; whatever is left in its group only keeps the pipes open.
        guard.kill_now();

        let drained: Result<Result<(String, String), ScanError>, Interrupt> = tokio::select! {
            output = drain(&mut stdout_task, &mut stderr_task) => Ok(output),
            interrupt = interruption(&cancel, deadline) => Err(interrupt),
        };
        let (document, stderr): (String, String) = match drained {
            Ok(output) => output?,
            Err(interrupt) => {
                stdout_task.abort();
                stderr_task.abort();
                return Err(self.interrupted(interrupt, target));
            }
        };

        if status.success() {
            debug!(subnet = %target, bytes = document.len(), "scanner finished");
            Ok(RawScanOutput { document, stderr })
        } else {
            Err(ScanError::Exit {
                code: status.code(),
                stderr,
            })
        }
    }
}

/// Resolves when the caller cancels or the deadline passes, whichever is first.
async fn interruption(cancel: &CancellationToken, deadline: Option<Instant>) -> Interrupt {
    tokio::select! {
        _ = cancel.cancelled() => Interrupt::Cancelled,
        _ = process::deadline(deadline) => Interrupt::TimedOut,
    }
}

async fn drain(
    stdout: &mut JoinHandle<io::Result<String>>,
    stderr: &mut JoinHandle<io::Result<String>>,
) -> Result<(String, String), ScanError> {
    let document: String = process::join_reader(stdout).await?;
    let stderr: String = process::join_reader(stderr).await?;
    Ok((document, stderr))
}

/// Tears down a scan that will not complete: kills the process group, reaps
/// the child and stops the output readers.
async fn abandon(mut guard: GroupGuard, child: &mut Child, readers: [JoinHandle<io::Result<String>>; 2]) {
    guard.kill_now();
    process::reap(child).await;
    for reader in readers {
        reader.abort();
    }
}
