//! Child process plumbing shared by the scanner implementations.

use std::io;
use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::ScanError;

const STDERR_CHUNK: usize = 4096;

/// Pipes stdout/stderr, detaches stdin and puts the child in its own process group.
pub(crate) fn configure(command: &mut Command) {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    #[cfg(unix)]
    command.process_group(0);
}

/// Kills the child's process group when dropped, unless already killed.
///
/// `kill_on_drop` only reaches the direct child; this also takes down
/// anything the scanner forked.
pub(crate) struct GroupGuard {
    pgid: Option<i32>,
}

impl GroupGuard {
    pub(crate) fn new(child: &Child) -> Self {
        Self {
            pgid: child.id().and_then(|pid| i32::try_from(pid).ok()),
        }
    }

    pub(crate) fn kill_now(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_group(pgid);
        }
    }
}

impl Drop for GroupGuard {
    fn drop(&mut self) {
        self.kill_now();
    }
}

#[cfg(unix)]
fn kill_group(pgid: i32) {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
        Ok(()) => debug!(pgid, "killed scanner process group"),
        Err(Errno::ESRCH) => {}
        Err(e) => warn!(pgid, error = %e, "failed to kill scanner process group"),
    }
}

#[cfg(not(unix))]
fn kill_group(_pgid: i32) {}

/// Kills the direct child (if still running) and reaps it.
pub(crate) async fn reap(child: &mut Child) {
    if let Err(e) = child.kill().await {
        debug!(error = %e, "scanner child already gone");
    }
}

/// Resolves at `deadline`, or never when there is none.
pub(crate) async fn deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

/// Buffers a whole stream; the document is only parsed once complete.
pub(crate) async fn read_to_string<R>(mut reader: R) -> io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut buf: Vec<u8> = Vec::new();
    reader.read_to_end(&mut buf).await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Buffers stderr verbatim, logging each chunk as it arrives.
pub(crate) async fn drain_stderr<R>(mut reader: R) -> io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut captured: Vec<u8> = Vec::new();
    let mut chunk: [u8; STDERR_CHUNK] = [0; STDERR_CHUNK];

    loop {
        let read: usize = reader.read(&mut chunk).await?;
        if read == 0 {
            break;
        }
        let text = String::from_utf8_lossy(&chunk[..read]);
        for line in text.lines().filter(|line| !line.trim().is_empty()) {
            warn!(target: "netsweep::scanner", "scanner warning: {line}");
        }
        captured.extend_from_slice(&chunk[..read]);
    }

    Ok(String::from_utf8_lossy(&captured).into_owned())
}

pub(crate) async fn join_reader(handle: &mut JoinHandle<io::Result<String>>) -> Result<String, ScanError> {
    let output: String = handle.await.map_err(io::Error::other)??;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn drain_stderr_keeps_bytes_verbatim() {
        let input: &[u8] = b"Warning: 1 retransmission\n\nsecond line without newline";
        let captured: String = drain_stderr(input).await.unwrap();
        assert_eq!(captured.as_bytes(), input);
    }

    #[tokio::test]
    async fn read_to_string_replaces_invalid_utf8() {
        let input: &[u8] = b"<nmaprun>\xff</nmaprun>";
        let text: String = read_to_string(input).await.unwrap();
        assert_eq!(text, "<nmaprun>\u{fffd}</nmaprun>");
    }

    #[tokio::test]
    async fn deadline_without_limit_never_fires() {
        let fired = tokio::time::timeout(Duration::from_millis(50), deadline(None)).await;
        assert!(fired.is_err());

        let fired = tokio::time::timeout(
            Duration::from_secs(5),
            deadline(Some(Instant::now() + Duration::from_millis(10))),
        )
        .await;
        assert!(fired.is_ok());
    }
}
