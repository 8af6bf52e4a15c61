//! Error types for the driver store.
//!
//! Every failure is returned to the caller synchronously. Nothing is retried
//! internally.

use crate::types::DriverId;

/// Enumeration of possible store errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// A recency cache was requested with a capacity of zero
    #[error("invalid cache capacity: {0} (must be at least 1)")]
    InvalidCapacity(usize),

    /// Envelope padding was NaN, infinite or negative
    #[error("invalid envelope padding: {0} (must be finite and non-negative)")]
    InvalidPadding(f64),

    /// No driver is registered under the given id
    #[error("driver {0} does not exist")]
    NotFound(DriverId),

    /// The spatial index refused to remove an entry the store believed it held.
    /// The map and the index have drifted apart; this is a bug, not an absence.
    #[error("spatial index is out of sync for driver {0}")]
    IndexInconsistency(DriverId),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
