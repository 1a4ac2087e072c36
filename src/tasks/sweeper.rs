//! Expiry Sweeper Task
//!
//! Background task that periodically removes expired entries from an
//! in-process store, independent of any reads.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::cache::StoreInner;

/// Owning handle to a running sweeper.
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Asks the sweeper to stop without waiting for it.
    pub fn signal(&self) {
        // Err only means the task already exited
        let _ = self.shutdown.send(true);
    }

    /// Stops the sweeper and waits for the task to finish.
    pub async fn shutdown(self) -> Result<(), JoinError> {
        self.signal();
        self.task.await
    }
}

/// Spawns the sweeper loop for `inner` on `runtime`.
///
/// Each tick collects expired keys under the read lock, then removes them
/// under the write lock. A shutdown signal is honoured while waiting for the
/// next tick and between the two phases; an interrupted sweep is simply
/// picked up by the next read or tick.
pub(crate) fn spawn_sweeper(
    runtime: &Handle,
    inner: Arc<StoreInner>,
    interval: Duration,
) -> SweeperHandle {
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    let task = runtime.spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "Starting expiry sweeper");

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => break,
                _ = ticker.tick() => {}
            }

            let expired = inner.collect_expired().await;
            if *shutdown_rx.borrow() {
                break;
            }

            let removed = inner.remove_expired(&expired).await;
            if removed > 0 {
                info!("Sweeper removed {} expired entries", removed);
            } else {
                debug!("Sweeper found no expired entries");
            }
        }

        debug!("Expiry sweeper stopped");
    });

    SweeperHandle { shutdown, task }
}
