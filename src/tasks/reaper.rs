//! Expiry Reaper Task
//!
//! Background task that periodically removes entries whose TTL elapsed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, RwLock};
use tracing::{debug, info};

use crate::cache::ExpiryStore;
use crate::tasks::WorkerHandle;

/// Spawns the reaper for an expiry cache.
///
/// The task loops forever: sleep for `interval`, take the store's write
/// lock, sweep expired entries, release. The stop channel is checked on
/// every wake, so `WorkerHandle::shutdown` ends the loop within one
/// sleep period at most.
pub(crate) fn spawn_reaper_task(
    store: Arc<RwLock<ExpiryStore>>,
    interval: Duration,
) -> WorkerHandle {
    let (stop_tx, mut stop_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        debug!("Starting expiry reaper with interval {:?}", interval);

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    let removed = {
                        let mut store = store.write().await;
                        store.sweep()
                    };

                    if removed > 0 {
                        info!("Expiry sweep removed {} entries", removed);
                    } else {
                        debug!("Expiry sweep found nothing to remove");
                    }
                }
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
            }
        }

        debug!("Expiry reaper stopped");
    });

    WorkerHandle::new(stop_tx, task)
}
