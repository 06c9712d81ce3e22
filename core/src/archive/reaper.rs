//! Background deletion of expired records.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::ScanArchive;

const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Runs [`ScanArchive::purge_expired`] immediately and then every `interval`
/// until `cancel` fires.
pub fn spawn_reaper(
    archive: Arc<dyn ScanArchive>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval.max(MIN_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => match archive.purge_expired().await {
                    Ok(0) => debug!("expiry sweep found nothing to remove"),
                    Ok(removed) => info!(removed, "removed expired scan records"),
                    Err(e) => warn!(error = %e, "expiry sweep failed"),
                },
            }
        }
        debug!("expiry reaper stopped");
    })
}
