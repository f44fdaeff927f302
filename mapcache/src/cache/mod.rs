//! Tile-indexed fetch-through cache for map data.
//!
//! [`MapDataCache`] is the entry point. It combines an element store, a
//! geometry store, two reverse indices and an LRU set of authoritative tiles,
//! and asks the backing store (fetch closures or the [`MapDataLoader`]) only
//! for what it cannot answer itself.

mod error;
mod index;
mod loader;
mod map_data_cache;
mod policy;
mod shared;
mod spatial;
mod stats;
mod store;
mod update;

pub use error::CacheError;
pub use index::{RelationsByElementIndex, ReverseIndex, WaysByNodeIndex};
pub use loader::{EmptyLoader, MapDataChunk, MapDataLoader};
pub use map_data_cache::MapDataCache;
pub use policy::CachePolicy;
pub use shared::SharedMapDataCache;
pub use spatial::SpatialTileCache;
pub use stats::{CacheStatistics, CacheStats};
pub use store::{ElementStore, GeometryStore};
pub use update::UpdateBatch;
