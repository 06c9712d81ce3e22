use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

/// Upper bound on the version probe; a hung binary counts as unavailable.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs `<program> --version` and reports whether it exited cleanly.
///
/// Cheap and side-effect free, so it is safe to call before every scan.
pub async fn is_available(program: &Path) -> bool {
    let mut command: Command = Command::new(program);
    command
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    match tokio::time::timeout(PROBE_TIMEOUT, command.status()).await {
        Ok(Ok(status)) if status.success() => true,
        Ok(Ok(status)) => {
            debug!(program = %program.display(), %status, "version probe exited with failure");
            false
        }
        Ok(Err(e)) => {
            debug!(program = %program.display(), error = %e, "version probe could not be launched");
            false
        }
        Err(_) => {
            debug!(program = %program.display(), "version probe timed out");
            false
        }
    }
}
