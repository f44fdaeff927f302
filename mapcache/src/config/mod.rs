//! Cache configuration.
//!
//! [`CacheConfig`] holds the construction parameters of a
//! [`MapDataCache`](crate::cache::MapDataCache). Values can be set in code
//! with the `with_*` builders or loaded from the `[map_cache]` section of an
//! INI file (see [`CacheConfig::load_from`]).

mod file;

pub use file::ConfigFileError;

use crate::cache::CacheError;
use crate::tiles::{validate_zoom, MAX_ZOOM};

/// Default tile zoom level; tiles are roughly 600 m wide at the equator.
pub const DEFAULT_TILE_ZOOM: u8 = 16;

/// Default maximum number of authoritative tiles.
pub const DEFAULT_MAX_TILES: usize = 64;

/// Default initial capacity of the element and geometry stores.
pub const DEFAULT_INITIAL_CAPACITY: usize = 50_000;

/// Construction parameters of the map data cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Zoom level of the tiles used as unit of spatial completeness
    pub tile_zoom: u8,
    /// Maximum number of tiles kept authoritative before LRU eviction
    pub max_tiles: usize,
    /// Number of entries the stores are pre-sized for
    pub initial_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            tile_zoom: DEFAULT_TILE_ZOOM,
            max_tiles: DEFAULT_MAX_TILES,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
        }
    }
}

impl CacheConfig {
    /// Create a configuration with explicit values.
    pub fn new(tile_zoom: u8, max_tiles: usize, initial_capacity: usize) -> Self {
        Self {
            tile_zoom,
            max_tiles,
            initial_capacity,
        }
    }

    /// Set the tile zoom level.
    pub fn with_tile_zoom(mut self, tile_zoom: u8) -> Self {
        self.tile_zoom = tile_zoom;
        self
    }

    /// Set the maximum number of authoritative tiles.
    pub fn with_max_tiles(mut self, max_tiles: usize) -> Self {
        self.max_tiles = max_tiles;
        self
    }

    /// Set the initial store capacity.
    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// Check that the configuration can be used to build a cache.
    pub fn validate(&self) -> Result<(), CacheError> {
        validate_zoom(self.tile_zoom).map_err(|_| {
            CacheError::InvalidConfig(format!(
                "tile_zoom {} exceeds maximum zoom {}",
                self.tile_zoom, MAX_ZOOM
            ))
        })?;
        if self.max_tiles == 0 {
            return Err(CacheError::InvalidConfig(
                "max_tiles must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CacheConfig::default();
        assert_eq!(config.tile_zoom, DEFAULT_TILE_ZOOM);
        assert_eq!(config.max_tiles, DEFAULT_MAX_TILES);
        assert_eq!(config.initial_capacity, DEFAULT_INITIAL_CAPACITY);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_setters() {
        let config = CacheConfig::default()
            .with_tile_zoom(14)
            .with_max_tiles(4)
            .with_initial_capacity(10);
        assert_eq!(config, CacheConfig::new(14, 4, 10));
    }

    #[test]
    fn test_validate_rejects_zoom_too_high() {
        let config = CacheConfig::default().with_tile_zoom(MAX_ZOOM + 1);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, CacheError::InvalidConfig(_)));
        assert!(err.to_string().contains("tile_zoom"));
    }

    #[test]
    fn test_validate_rejects_zero_tiles() {
        let config = CacheConfig::default().with_max_tiles(0);
        assert!(matches!(
            config.validate(),
            Err(CacheError::InvalidConfig(_))
        ));
    }
}
