//! R*-tree backed spatial index
//!
//! Adapter that lets `rstar` serve as the store's [`SpatialIndex`]. Entries
//! are removed by value, so callers pass back the exact entry they inserted.
//! Neighbours are ranked by planar distance to each driver's point, not to
//! the edge of its padded box.

use super::{IndexEntry, SpatialIndex};
use crate::types::{DriverId, Position};
use rstar::{PointDistance, RTree, RTreeObject, AABB};

impl RTreeObject for IndexEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.envelope.min, self.envelope.max)
    }
}

impl PointDistance for IndexEntry {
    /// Distance to the box centre. Never less than the distance to the box,
    /// so the tree's envelope pruning stays a valid lower bound, and drivers
    /// whose boxes all contain the query point still rank apart.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let [lat, lon] = self.envelope.center();
        let (d_lat, d_lon) = (point[0] - lat, point[1] - lon);
        d_lat * d_lat + d_lon * d_lon
    }

    fn contains_point(&self, point: &[f64; 2]) -> bool {
        self.envelope.distance_2(*point) == 0.0
    }
}

/// Counters for analyzing index behaviour
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct SpatialIndexStats {
    pub total_insertions: u64,
    pub total_removals: u64,
    /// Removals that did not find the requested entry
    pub failed_removals: u64,
    pub total_queries: u64,
    pub last_query_result_count: usize,
}

/// R*-tree over driver envelopes.
#[derive(Debug, Default)]
pub struct RTreeIndex {
    tree: RTree<IndexEntry>,
    stats: SpatialIndexStats,
    /// Query counters are bumped behind `&self`
    queries: std::sync::atomic::AtomicU64,
    last_query_result_count: std::sync::atomic::AtomicUsize,
}

impl RTreeIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index from existing entries in one pass, which yields a
    /// better balanced tree than repeated inserts.
    pub fn bulk_load(entries: Vec<IndexEntry>) -> Self {
        let total_insertions = entries.len() as u64;
        Self {
            tree: RTree::bulk_load(entries),
            stats: SpatialIndexStats {
                total_insertions,
                ..SpatialIndexStats::default()
            },
            ..Self::default()
        }
    }

    /// Snapshot of the index counters.
    pub fn stats(&self) -> SpatialIndexStats {
        use std::sync::atomic::Ordering;

        let mut stats = self.stats.clone();
        stats.total_queries = self.queries.load(Ordering::Relaxed);
        stats.last_query_result_count = self.last_query_result_count.load(Ordering::Relaxed);
        stats
    }

    /// Checks whether `entry` is indexed exactly as given.
    pub fn contains(&self, entry: &IndexEntry) -> bool {
        self.tree
            .locate_in_envelope(&entry.envelope())
            .any(|candidate| candidate == entry)
    }
}

impl SpatialIndex for RTreeIndex {
    fn insert(&mut self, entry: IndexEntry) {
        self.tree.insert(entry);
        self.stats.total_insertions += 1;
    }

    fn delete(&mut self, entry: &IndexEntry) -> bool {
        let removed = self.tree.remove(entry).is_some();
        if removed {
            self.stats.total_removals += 1;
        } else {
            self.stats.failed_removals += 1;
        }
        removed
    }

    fn nearest_neighbors(&self, k: usize, point: Position) -> Vec<DriverId> {
        use std::sync::atomic::Ordering;

        let results: Vec<DriverId> = if k == 0 {
            Vec::new()
        } else {
            self.tree
                .nearest_neighbor_iter(&point.as_point())
                .take(k)
                .map(|entry| entry.id)
                .collect()
        };

        self.queries.fetch_add(1, Ordering::Relaxed);
        self.last_query_result_count.store(results.len(), Ordering::Relaxed);
        results
    }

    fn len(&self) -> usize {
        self.tree.size()
    }
}
