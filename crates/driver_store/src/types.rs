//! # Core Type Definitions
//!
//! Fundamental value types shared by the cache, the spatial index and the
//! store.
//!
//! - [`DriverId`] - Unique identifier for a tracked driver
//! - [`Position`] - Latitude/longitude pair in degrees
//! - [`PositionSample`] - A position stamped with the time it was recorded

use serde::{Deserialize, Serialize};

/// Unique identifier for a driver.
///
/// A thin wrapper so driver ids cannot be mixed up with revisions, counts or
/// timestamps, which are also plain integers in this crate.
///
/// ```rust
/// use driver_store::DriverId;
///
/// let id = DriverId(7);
/// assert_eq!(id.to_string(), "7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DriverId(pub u64);

impl std::fmt::Display for DriverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for DriverId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Geographic position in degrees.
///
/// No normalization or range checking is performed. Callers are expected to
/// supply latitudes in `[-90, 90]` and longitudes in `[-180, 180]`; out of
/// range values are stored as given so upstream bugs stay visible.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Latitude in degrees (Y axis of the spatial index)
    pub latitude: f64,
    /// Longitude in degrees (X axis of the spatial index)
    pub longitude: f64,
}

impl Position {
    /// Creates a new position from latitude and longitude in degrees.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Great-circle distance to `other` in meters.
    pub fn distance_to(&self, other: &Position) -> f64 {
        crate::geo::distance(self.latitude, self.longitude, other.latitude, other.longitude)
    }

    /// Coordinates in the order used by the spatial index.
    pub(crate) fn as_point(&self) -> [f64; 2] {
        [self.latitude, self.longitude]
    }
}

/// A position together with the moment it was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    /// Reported position
    pub position: Position,
    /// Unix timestamp in nanoseconds
    pub recorded_at: u64,
}
