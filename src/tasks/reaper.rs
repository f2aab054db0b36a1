//! TTL Reaper Task
//!
//! Background task that periodically removes expired cache entries.

use std::sync::Weak;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Something the reaper can sweep for expired entries.
pub trait PurgeExpired: Send + Sync + 'static {
    /// Removes every expired entry and returns how many were removed.
    fn purge_expired(&self) -> usize;
}

/// Spawns a background task that periodically purges expired entries.
///
/// The task holds only a weak reference to its target: it stops when the
/// target is dropped or when `cancel` fires, whichever comes first. The first
/// sweep happens one full `interval` after spawning.
///
/// Returns `None` when no tokio runtime is available to run the task.
///
/// # Example
/// ```ignore
/// let token = CancellationToken::new();
/// let handle = spawn_reaper_task(Arc::downgrade(&engine), Duration::from_secs(60), token.clone());
/// // Later, during shutdown:
/// token.cancel();
/// ```
pub fn spawn_reaper_task<P: PurgeExpired>(
    target: Weak<P>,
    interval: Duration,
    cancel: CancellationToken,
) -> Option<JoinHandle<()>> {
    let runtime = match Handle::try_current() {
        Ok(handle) => handle,
        Err(_) => {
            warn!("No tokio runtime available, expired entries are only removed lazily");
            return None;
        }
    };

    Some(runtime.spawn(async move {
        info!("Starting TTL reaper task with interval of {:?}", interval);

        let mut ticker = interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let Some(target) = target.upgrade() else {
                break;
            };
            let removed = target.purge_expired();

            if removed > 0 {
                info!("TTL reaper: removed {} expired entries", removed);
            } else {
                debug!("TTL reaper: no expired entries found");
            }
        }

        info!("TTL reaper task stopped");
    }))
}
