//! # Utility Functions
//!
//! Timestamp helpers shared by the store and its records. All expiry and
//! history timestamps go through [`current_timestamp_nanos()`] so they are
//! comparable with each other.

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current Unix timestamp in nanoseconds.
///
/// A clock set before the Unix epoch yields `0` rather than panicking.
pub fn current_timestamp_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

/// Converts a duration from now into an absolute expiry timestamp.
///
/// Handy for callers that think in TTLs rather than deadlines.
pub fn expires_in(ttl: std::time::Duration) -> u64 {
    let ttl = u64::try_from(ttl.as_nanos()).unwrap_or(u64::MAX);
    current_timestamp_nanos().saturating_add(ttl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_timestamp_is_monotonic_enough() {
        let first = current_timestamp_nanos();
        let second = current_timestamp_nanos();
        assert!(first > 0);
        assert!(second >= first);
    }

    #[test]
    fn test_expires_in_is_in_the_future() {
        let now = current_timestamp_nanos();
        let deadline = expires_in(Duration::from_secs(60));
        assert!(deadline > now);
        assert!(deadline - now >= Duration::from_secs(59).as_nanos() as u64);
    }
}
