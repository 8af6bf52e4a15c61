//! Coordinating driver store
//!
//! [`DriverStore`] owns the authoritative `id -> record` map and the spatial
//! index mirroring each driver's last known position. Both live behind one
//! reader/writer lock so they can never be observed out of step: a `set` that
//! moves a driver deletes and reinserts its index entry while holding the
//! write lock, so concurrent `nearest` calls see either the old envelope or
//! the new one, never zero or two.

mod record;

pub use record::DriverRecord;

use crate::cache::RecencyCache;
use crate::error::{Result, StoreError};
use crate::spatial::{IndexEntry, RTreeIndex, SpatialIndex, DEFAULT_ENVELOPE_PADDING};
use crate::types::{DriverId, Position, PositionSample};
use crate::utils::current_timestamp_nanos;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, error, trace};

/// Default number of recent positions retained per driver.
pub const DEFAULT_HISTORY_CAPACITY: usize = 16;

/// Candidates requested from the index per requested driver. The index ranks
/// in planar degrees, which overstate longitude away from the equator, so a
/// wider pool is re-ranked by great-circle distance before truncating.
const CANDIDATE_OVERFETCH: usize = 4;

/// Construction-time settings, uniform across all drivers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Capacity of each driver's position history
    pub history_capacity: usize,
    /// Half-width in degrees of the envelope indexed around each driver
    pub envelope_padding: f64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            envelope_padding: DEFAULT_ENVELOPE_PADDING,
        }
    }
}

/// Point-in-time counters for monitoring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Registered drivers
    pub drivers: usize,
    /// Entries in the spatial index; equal to `drivers` unless something is wrong
    pub index_entries: usize,
    /// Drivers past their expiry that nobody has purged yet
    pub expired: usize,
    pub history_capacity: usize,
}

/// A driver returned by a radius-bounded query, with its great-circle
/// distance to the query point.
#[derive(Debug, Clone)]
pub struct NearbyDriver {
    pub record: DriverRecord,
    pub distance_m: f64,
}

#[derive(Debug)]
struct StoreInner<I> {
    drivers: HashMap<DriverId, DriverRecord>,
    index: I,
}

/// Thread-safe store of driver positions.
///
/// Share it between tasks as `Arc<DriverStore>`. Readers (`get`, `nearest`,
/// `history`, ...) run concurrently; writers (`set`, `delete`,
/// `purge_expired`) are exclusive. No I/O happens under the lock.
///
/// ```rust
/// use driver_store::{DriverId, DriverStore, Position, StoreConfig};
///
/// let store = DriverStore::new(StoreConfig::default())?;
/// store.set(DriverId(7), Position::new(55.75, 37.61), None)?;
///
/// let nearest = store.nearest(1, Position::new(55.76, 37.60));
/// assert_eq!(nearest[0].id, DriverId(7));
/// # Ok::<(), driver_store::StoreError>(())
/// ```
#[derive(Debug)]
pub struct DriverStore<I = RTreeIndex> {
    config: StoreConfig,
    inner: RwLock<StoreInner<I>>,
}

impl DriverStore<RTreeIndex> {
    /// Creates a store backed by an R*-tree index.
    ///
    /// Fails with [`StoreError::InvalidCapacity`] if
    /// `config.history_capacity` is zero, or [`StoreError::InvalidPadding`]
    /// if `config.envelope_padding` is negative or not finite.
    pub fn new(config: StoreConfig) -> Result<Self> {
        Self::with_index(config, RTreeIndex::new())
    }
}

impl<I: SpatialIndex> DriverStore<I> {
    /// Creates a store driving the given spatial index, which must be empty.
    pub fn with_index(config: StoreConfig, index: I) -> Result<Self> {
        if config.history_capacity == 0 {
            return Err(StoreError::InvalidCapacity(config.history_capacity));
        }
        // A NaN box can never be located again, so every later delete would fail.
        if !config.envelope_padding.is_finite() || config.envelope_padding < 0.0 {
            return Err(StoreError::InvalidPadding(config.envelope_padding));
        }
        debug!(
            history_capacity = config.history_capacity,
            envelope_padding = config.envelope_padding,
            "driver store created"
        );
        Ok(Self {
            config,
            inner: RwLock::new(StoreInner {
                drivers: HashMap::new(),
                index,
            }),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Registers a driver or updates its position and expiry.
    ///
    /// `expires_at` is a unix timestamp in nanoseconds; `None` or `Some(0)`
    /// means the record never expires. When an existing driver moves, its
    /// index entry is deleted and reinserted at the new position. If the
    /// index cannot find the old entry the update is abandoned and
    /// [`StoreError::IndexInconsistency`] is returned with the record left as
    /// it was.
    pub fn set(&self, id: DriverId, position: Position, expires_at: Option<u64>) -> Result<()> {
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        match inner.drivers.get_mut(&id) {
            Some(record) => {
                if record.last_position != position {
                    let stale = self.entry_for(id, record.last_position);
                    if !inner.index.delete(&stale) {
                        error!(driver = %id, "🔴 index entry missing while moving driver");
                        return Err(StoreError::IndexInconsistency(id));
                    }
                    inner.index.insert(self.entry_for(id, position));
                }
                record.record_update(position, expires_at);
                trace!(driver = %id, revision = record.revision, "driver updated");
            }
            None => {
                let history = RecencyCache::new(self.config.history_capacity)?;
                let record = DriverRecord::new(id, position, expires_at, history);
                inner.index.insert(self.entry_for(id, position));
                inner.drivers.insert(id, record);
                debug!(driver = %id, "driver registered");
            }
        }

        Ok(())
    }

    /// Removes a driver and its index entry, returning the removed record.
    pub fn delete(&self, id: DriverId) -> Result<DriverRecord> {
        let mut guard = self.inner.write();
        let record = self.remove_locked(&mut guard, id)?;
        debug!(driver = %id, "driver removed");
        Ok(record)
    }

    /// Snapshot of a driver's record.
    pub fn get(&self, id: DriverId) -> Result<DriverRecord> {
        self.inner
            .read()
            .drivers
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    pub fn contains(&self, id: DriverId) -> bool {
        self.inner.read().drivers.contains_key(&id)
    }

    /// Up to `k` drivers nearest to `point`, closest first by great-circle
    /// distance.
    ///
    /// The index selects a candidate pool, which is then re-ranked with
    /// [`geo::distance`](crate::geo::distance). Index handles whose record no
    /// longer exists are skipped rather than reported as errors.
    pub fn nearest(&self, k: usize, point: Position) -> Vec<DriverRecord> {
        self.ranked(k, point)
            .into_iter()
            .map(|nearby| nearby.record)
            .collect()
    }

    /// Like [`nearest`](Self::nearest), but also reports each driver's
    /// distance and drops those farther than `radius_m` meters.
    pub fn nearest_within(&self, k: usize, point: Position, radius_m: f64) -> Vec<NearbyDriver> {
        self.ranked(k, point)
            .into_iter()
            .filter(|nearby| nearby.distance_m <= radius_m)
            .collect()
    }

    fn ranked(&self, k: usize, point: Position) -> Vec<NearbyDriver> {
        if k == 0 {
            return Vec::new();
        }
        let candidates = k.saturating_mul(CANDIDATE_OVERFETCH);

        let mut found: Vec<NearbyDriver> = {
            let inner = self.inner.read();
            inner
                .index
                .nearest_neighbors(candidates, point)
                .into_iter()
                .filter_map(|id| {
                    let record = inner.drivers.get(&id).cloned();
                    if record.is_none() {
                        trace!(driver = %id, "skipping stale index handle");
                    }
                    record
                })
                .map(|record| {
                    let distance_m = record.last_position.distance_to(&point);
                    NearbyDriver { record, distance_m }
                })
                .collect()
        };

        // Stable: equal distances keep the index's order.
        found.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
        found.truncate(k);
        found
    }

    /// Recent positions of a driver, most recent first.
    pub fn history(&self, id: DriverId) -> Result<Vec<PositionSample>> {
        self.inner
            .read()
            .drivers
            .get(&id)
            .map(DriverRecord::history)
            .ok_or(StoreError::NotFound(id))
    }

    /// Whether `record` is logically expired. The store never removes
    /// expired records on its own; see [`purge_expired`](Self::purge_expired).
    pub fn is_expired(&self, record: &DriverRecord) -> bool {
        record.is_expired()
    }

    /// Ids of all logically expired drivers, sorted.
    pub fn expired_ids(&self) -> Vec<DriverId> {
        let now = current_timestamp_nanos();
        let mut ids: Vec<DriverId> = self
            .inner
            .read()
            .drivers
            .values()
            .filter(|record| record.is_expired_at(now))
            .map(|record| record.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Removes every driver that is expired at the time of the call and
    /// returns their ids, sorted.
    ///
    /// Stops at the first index inconsistency; drivers removed before it stay
    /// removed.
    pub fn purge_expired(&self) -> Result<Vec<DriverId>> {
        let now = current_timestamp_nanos();
        let mut guard = self.inner.write();

        let mut expired: Vec<DriverId> = guard
            .drivers
            .values()
            .filter(|record| record.is_expired_at(now))
            .map(|record| record.id)
            .collect();
        expired.sort_unstable();

        for &id in &expired {
            self.remove_locked(&mut guard, id)?;
        }

        if !expired.is_empty() {
            debug!(count = expired.len(), "purged expired drivers");
        }
        Ok(expired)
    }

    pub fn len(&self) -> usize {
        self.inner.read().drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().drivers.is_empty()
    }

    pub fn stats(&self) -> StoreStats {
        let now = current_timestamp_nanos();
        let inner = self.inner.read();
        StoreStats {
            drivers: inner.drivers.len(),
            index_entries: inner.index.len(),
            expired: inner
                .drivers
                .values()
                .filter(|record| record.is_expired_at(now))
                .count(),
            history_capacity: self.config.history_capacity,
        }
    }

    fn entry_for(&self, id: DriverId, position: Position) -> IndexEntry {
        IndexEntry::new(id, position, self.config.envelope_padding)
    }

    /// Removes a driver while the caller holds the write lock. The map entry
    /// is kept if the index refuses the delete.
    fn remove_locked(&self, inner: &mut StoreInner<I>, id: DriverId) -> Result<DriverRecord> {
        let position = inner
            .drivers
            .get(&id)
            .map(|record| record.last_position)
            .ok_or(StoreError::NotFound(id))?;

        if !inner.index.delete(&self.entry_for(id, position)) {
            error!(driver = %id, "🔴 index entry missing while removing driver");
            return Err(StoreError::IndexInconsistency(id));
        }

        inner.drivers.remove(&id).ok_or(StoreError::NotFound(id))
    }
}
