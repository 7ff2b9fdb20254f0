//! Memory Monitor Task
//!
//! Background task that watches system memory utilization and evicts a
//! batch of cold entries whenever it crosses the configured ceiling.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, RwLock};
use tracing::{debug, info};

use crate::cache::PressureStore;
use crate::memory::MemoryProbe;
use crate::tasks::WorkerHandle;

/// Spawns the monitor for a pressure-aware cache.
///
/// Each wake samples the probe before touching the lock; only a reading
/// above `max_memory_percent` triggers an eviction batch. A probe that
/// cannot produce a reading is logged and skipped, never an error.
pub(crate) fn spawn_monitor_task(
    store: Arc<RwLock<PressureStore>>,
    probe: Arc<dyn MemoryProbe>,
    max_memory_percent: f64,
    interval: Duration,
) -> WorkerHandle {
    let (stop_tx, mut stop_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        debug!(
            "Starting memory monitor with interval {:?}, ceiling {}%",
            interval, max_memory_percent
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    match probe.utilization_percent() {
                        Some(pct) if pct > max_memory_percent => {
                            let evicted = {
                                let mut store = store.write().await;
                                store.evict_batch()
                            };
                            if evicted > 0 {
                                info!(
                                    "Memory at {:.1}%: monitor evicted {} entries",
                                    pct, evicted
                                );
                            }
                        }
                        Some(pct) => {
                            debug!("Memory at {:.1}%, below ceiling", pct);
                        }
                        None => {
                            debug!("Memory reading unavailable; skipping sweep");
                        }
                    }
                }
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
            }
        }

        debug!("Memory monitor stopped");
    });

    WorkerHandle::new(stop_tx, task)
}
