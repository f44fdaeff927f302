//! mapcache - Tile-indexed fetch-through cache for map data
//!
//! This library keeps map elements (nodes, ways and relations) and their
//! display geometries in memory, tracks which map tiles are known to be
//! complete and consults the backing store only for what it cannot answer
//! with certainty.
//!
//! # High-Level API
//!
//! ```
//! use std::convert::Infallible;
//! use mapcache::cache::{MapDataCache, MapDataChunk};
//! use mapcache::config::CacheConfig;
//! use mapcache::element::{ElementType, Node};
//! use mapcache::tiles::{BoundingBox, LatLon};
//!
//! let loader = |_bbox: &BoundingBox| -> Result<MapDataChunk, Infallible> {
//!     Ok(MapDataChunk::new(
//!         vec![Node::new(1, LatLon::new(0.0001, 0.0001)).into()],
//!         Vec::new(),
//!     ))
//! };
//! let mut cache = MapDataCache::new(CacheConfig::default(), loader).unwrap();
//!
//! let data = cache
//!     .map_data_with_geometry(&BoundingBox::new(0.0, 0.0, 0.001, 0.001))
//!     .unwrap();
//! assert_eq!(data.node_count(), 1);
//!
//! // Served from the now authoritative tile, no fetch needed
//! let node = cache
//!     .get_element(ElementType::Node, 1, |_, _| Err("offline"))
//!     .unwrap();
//! assert!(node.is_some());
//! ```

pub mod cache;
pub mod config;
pub mod element;
pub mod tiles;

/// Version of the mapcache library.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
