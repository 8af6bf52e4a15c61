//! # Driver Store
//!
//! In-memory tracking of a fleet of drivers by id and current position, with
//! low-latency "k nearest drivers to this point" queries for dispatch.
//!
//! ## Components
//!
//! - [`RecencyCache`] - fixed-capacity LRU cache, used for per-driver position
//!   history
//! - [`geo::distance`] - haversine great-circle distance in meters
//! - [`SpatialIndex`] - capability the store needs from a spatial index, with
//!   [`RTreeIndex`] as the default R*-tree implementation
//! - [`DriverStore`] - the coordinating store; one reader/writer lock guards
//!   the driver map and the index together
//!
//! ## Quick Start
//!
//! ```rust
//! use driver_store::{DriverId, DriverStore, Position, StoreConfig};
//!
//! let store = DriverStore::new(StoreConfig::default())?;
//! store.set(DriverId(1), Position::new(52.5200, 13.4050), None)?;
//! store.set(DriverId(2), Position::new(52.5300, 13.4100), None)?;
//!
//! let pickup = Position::new(52.5210, 13.4060);
//! let nearby = store.nearest_within(5, pickup, 2_000.0);
//! assert_eq!(nearby[0].record.id, DriverId(1));
//! # Ok::<(), driver_store::StoreError>(())
//! ```
//!
//! Coordinates are degrees and are not validated; keeping them in range is
//! the caller's job.

pub mod cache;
pub mod error;
pub mod geo;
pub mod spatial;
pub mod store;
pub mod types;
pub mod utils;

pub use cache::RecencyCache;
pub use error::{Result, StoreError};
pub use spatial::{Envelope, IndexEntry, RTreeIndex, SpatialIndex, SpatialIndexStats};
pub use store::{DriverRecord, DriverStore, NearbyDriver, StoreConfig, StoreStats};
pub use types::{DriverId, Position, PositionSample};
pub use utils::{current_timestamp_nanos, expires_in};
