//! Two-phase stop flag shared by the service's tasks.
//!
//! The sweeper and the stats reporter check `is_shutdown_initiated` on each
//! tick; the application reads final store statistics only after
//! `complete_shutdown`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Cloneable handle to the stop flags. Clones observe the same flags.
#[derive(Debug, Clone, Default)]
pub struct ShutdownState {
    /// Raised when a stop was requested
    shutdown_initiated: Arc<AtomicBool>,
    /// Raised after the last background task returned
    shutdown_complete: Arc<AtomicBool>,
}

impl ShutdownState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_shutdown_initiated(&self) -> bool {
        self.shutdown_initiated.load(Ordering::Acquire)
    }

    pub fn is_shutdown_complete(&self) -> bool {
        self.shutdown_complete.load(Ordering::Acquire)
    }

    /// Asks background tasks to stop at their next tick.
    pub fn initiate_shutdown(&self) {
        self.shutdown_initiated.store(true, Ordering::Release);
        info!("🛑 Stop requested, waiting for sweeper and reporter");
    }

    /// Records that every background task has returned.
    pub fn complete_shutdown(&self) {
        self.shutdown_complete.store(true, Ordering::Release);
        info!("✅ Sweeper and reporter stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_are_shared_between_clones() {
        let state = ShutdownState::new();
        let observer = state.clone();
        assert!(!observer.is_shutdown_initiated());
        assert!(!observer.is_shutdown_complete());

        state.initiate_shutdown();
        assert!(observer.is_shutdown_initiated());
        assert!(!observer.is_shutdown_complete());

        state.complete_shutdown();
        assert!(observer.is_shutdown_complete());
    }
}
