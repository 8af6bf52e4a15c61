//! Periodic removal of expired drivers.
//!
//! The store only answers "is this record expired?"; deciding when to act on
//! it is the embedding service's policy. This task purges on a fixed interval
//! until shutdown is initiated.

use crate::shutdown::ShutdownState;
use driver_store::{DriverId, DriverStore, StoreError};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Interval-driven sweeper over a shared store.
#[derive(Debug, Clone)]
pub struct ExpirySweeper {
    store: Arc<DriverStore>,
    interval: Duration,
}

impl ExpirySweeper {
    pub fn new(store: Arc<DriverStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Runs a single sweep and returns the purged ids.
    pub fn sweep_once(&self) -> Result<Vec<DriverId>, StoreError> {
        self.store.purge_expired()
    }

    /// Spawns the sweep loop. The handle resolves to the total number of
    /// drivers purged once shutdown is observed.
    pub fn spawn(self, shutdown: ShutdownState) -> JoinHandle<usize> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut total_purged = 0usize;

            loop {
                ticker.tick().await;
                if shutdown.is_shutdown_initiated() {
                    break;
                }

                match self.sweep_once() {
                    Ok(purged) if !purged.is_empty() => {
                        total_purged += purged.len();
                        info!("🧹 Purged {} expired drivers", purged.len());
                        debug!(?purged, "expired driver ids");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        // Left for the next tick; an inconsistency is logged by the store too.
                        error!("❌ Expiry sweep failed: {e}");
                    }
                }
            }

            debug!(total_purged, "expiry sweeper stopped");
            total_purged
        })
    }
}
