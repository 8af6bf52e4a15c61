//! Spatial indexing for driver positions
//!
//! The store does not care how nearest-neighbour search is implemented; it
//! only needs the [`SpatialIndex`] capability. [`RTreeIndex`] is the default
//! implementation, backed by an R*-tree.

mod rtree;

pub use rtree::{RTreeIndex, SpatialIndexStats};

use crate::types::{DriverId, Position};

/// Half-width in degrees of the box placed around each driver's point.
pub const DEFAULT_ENVELOPE_PADDING: f64 = 0.01;

/// Axis-aligned bounding box in (latitude, longitude) degrees.
///
/// Single points have zero-area boxes, so each driver is indexed with a small
/// square pad around its position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Envelope {
    /// Builds a square envelope of half-width `padding` around `position`.
    pub fn around(position: Position, padding: f64) -> Self {
        let [lat, lon] = position.as_point();
        Self {
            min: [lat - padding, lon - padding],
            max: [lat + padding, lon + padding],
        }
    }

    /// Centre of the box, which is the indexed driver's position.
    pub fn center(&self) -> [f64; 2] {
        [
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
        ]
    }

    /// Squared planar distance (in degrees²) from `point` to the nearest edge
    /// of the box, zero when the point lies inside it.
    pub fn distance_2(&self, point: [f64; 2]) -> f64 {
        let mut total = 0.0;
        for axis in 0..2 {
            let delta = if point[axis] < self.min[axis] {
                self.min[axis] - point[axis]
            } else if point[axis] > self.max[axis] {
                point[axis] - self.max[axis]
            } else {
                0.0
            };
            total += delta * delta;
        }
        total
    }
}

/// A driver handle together with the envelope it was indexed under.
///
/// Removal needs the envelope the entry was inserted with, so the store keeps
/// enough state to rebuild it from the record's last reconciled position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexEntry {
    pub id: DriverId,
    pub envelope: Envelope,
}

impl IndexEntry {
    pub fn new(id: DriverId, position: Position, padding: f64) -> Self {
        Self {
            id,
            envelope: Envelope::around(position, padding),
        }
    }
}

/// Capability the store requires from a spatial index.
///
/// Implementations are driven exclusively by [`crate::DriverStore`], which
/// holds its write lock around `insert`/`delete` and its read lock around
/// `nearest_neighbors`.
pub trait SpatialIndex: Send + Sync {
    /// Adds an entry.
    fn insert(&mut self, entry: IndexEntry);

    /// Removes a previously inserted entry. Returns `false` if it was not found.
    fn delete(&mut self, entry: &IndexEntry) -> bool;

    /// Up to `k` driver ids, closest first. Distance is measured to each
    /// driver's indexed point, not to the edge of its envelope.
    fn nearest_neighbors(&self, k: usize, point: Position) -> Vec<DriverId>;

    /// Number of entries currently indexed.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_around_point() {
        let envelope = Envelope::around(Position::new(10.0, 20.0), 0.5);
        assert_eq!(envelope.min, [9.5, 19.5]);
        assert_eq!(envelope.max, [10.5, 20.5]);
        assert_eq!(envelope.center(), [10.0, 20.0]);
    }

    #[test]
    fn test_envelope_distance() {
        let envelope = Envelope::around(Position::new(0.0, 0.0), 1.0);
        assert_eq!(envelope.distance_2([0.5, -0.5]), 0.0);
        assert_eq!(envelope.distance_2([3.0, 0.0]), 4.0);
        assert_eq!(envelope.distance_2([4.0, 5.0]), 9.0 + 16.0);
    }
}
