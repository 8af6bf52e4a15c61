//! Driver records held by the store.

use crate::cache::RecencyCache;
use crate::types::{DriverId, Position, PositionSample};
use crate::utils::current_timestamp_nanos;

/// Everything the store knows about one driver.
///
/// Records handed out by [`crate::DriverStore`] are snapshots; mutating a
/// returned record has no effect on the store.
#[derive(Debug, Clone)]
pub struct DriverRecord {
    pub id: DriverId,
    /// Last reported position, also the position the spatial index reflects
    pub last_position: Position,
    /// Unix timestamp in nanoseconds after which the record is stale.
    /// `None` means the record never expires.
    pub expires_at: Option<u64>,
    /// Number of updates applied since registration (starts at 1)
    pub revision: u64,
    /// Unix timestamp in nanoseconds of the last update
    pub updated_at: u64,
    history: RecencyCache<u64, PositionSample>,
}

impl DriverRecord {
    pub(crate) fn new(
        id: DriverId,
        position: Position,
        expires_at: Option<u64>,
        history: RecencyCache<u64, PositionSample>,
    ) -> Self {
        let mut record = Self {
            id,
            last_position: position,
            expires_at: normalize_expiry(expires_at),
            revision: 0,
            updated_at: 0,
            history,
        };
        record.record_update(position, expires_at);
        record
    }

    /// Applies an update in place and appends it to the history window.
    pub(crate) fn record_update(&mut self, position: Position, expires_at: Option<u64>) {
        let now = current_timestamp_nanos();
        self.revision += 1;
        self.updated_at = now;
        self.last_position = position;
        self.expires_at = normalize_expiry(expires_at);
        self.history.add(
            self.revision,
            PositionSample {
                position,
                recorded_at: now,
            },
        );
    }

    /// Whether the record is logically expired at time `now` (unix ns).
    pub fn is_expired_at(&self, now: u64) -> bool {
        match self.expires_at {
            None => false,
            Some(deadline) => now > deadline,
        }
    }

    /// Whether the record is logically expired right now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_nanos())
    }

    /// Recent positions, most recent first, bounded by the store's history
    /// capacity.
    pub fn history(&self) -> Vec<PositionSample> {
        self.history.iter().map(|(_, sample)| *sample).collect()
    }
}

/// `Some(0)` is the wire-level "never expires" sentinel.
fn normalize_expiry(expires_at: Option<u64>) -> Option<u64> {
    expires_at.filter(|&deadline| deadline != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(expires_at: Option<u64>) -> DriverRecord {
        DriverRecord::new(
            DriverId(1),
            Position::new(1.0, 2.0),
            expires_at,
            RecencyCache::new(3).unwrap(),
        )
    }

    #[test]
    fn test_zero_expiry_never_expires() {
        let sentinel = record(Some(0));
        assert_eq!(sentinel.expires_at, None);
        assert!(!sentinel.is_expired_at(u64::MAX));
        assert!(!record(None).is_expired());
    }

    #[test]
    fn test_expiry_boundaries() {
        let record = record(Some(1_000));
        assert!(!record.is_expired_at(999));
        assert!(!record.is_expired_at(1_000));
        assert!(record.is_expired_at(1_001));
    }

    #[test]
    fn test_history_is_bounded_and_most_recent_first() {
        let mut record = record(None);
        for step in 1..=5 {
            record.record_update(Position::new(1.0, 2.0 + f64::from(step)), None);
        }

        assert_eq!(record.revision, 6);
        let history = record.history();
        assert_eq!(history.len(), 3);
        let longitudes: Vec<f64> = history.iter().map(|s| s.position.longitude).collect();
        assert_eq!(longitudes, vec![7.0, 6.0, 5.0]);
        assert_eq!(record.last_position, Position::new(1.0, 7.0));
    }
}
