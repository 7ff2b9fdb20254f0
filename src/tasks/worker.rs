//! Worker Handle Module
//!
//! Pairs a background task with the stop signal it watches, so the owning
//! cache can tear the task down deterministically.

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::warn;

// == Worker Handle ==
/// Controls one background task.
///
/// The task is expected to select over its work timer and the stop
/// channel, exiting its loop once the flag flips to `true`.
/// [`shutdown`](Self::shutdown) flips the flag and joins the task;
/// dropping the handle without shutting down aborts the task instead,
/// so a discarded cache never leaks a live worker.
#[derive(Debug)]
pub struct WorkerHandle {
    /// Stop flag observed by the task on every wake
    stop: watch::Sender<bool>,
    /// Join handle, taken by the first shutdown
    task: Mutex<Option<JoinHandle<()>>>,
}

impl WorkerHandle {
    // == Constructor ==
    /// Wraps a freshly spawned task and the sender half of its stop channel.
    pub fn new(stop: watch::Sender<bool>, task: JoinHandle<()>) -> Self {
        Self {
            stop,
            task: Mutex::new(Some(task)),
        }
    }

    // == Shutdown ==
    /// Signals the task to stop and waits for it to finish.
    ///
    /// Safe to call more than once; only the first call joins.
    pub async fn shutdown(&self) {
        let _ = self.stop.send(true);
        if let Some(task) = self.task.lock().await.take() {
            if let Err(err) = task.await {
                if !err.is_cancelled() {
                    warn!("Background worker ended abnormally: {}", err);
                }
            }
        }
    }

    // == Is Stopped ==
    /// Whether a stop has been requested.
    pub fn is_stopped(&self) -> bool {
        *self.stop.borrow()
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        let _ = self.stop.send(true);
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}
