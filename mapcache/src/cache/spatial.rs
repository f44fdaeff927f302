//! Bounded LRU set of authoritative tiles.
//!
//! A tile in this set is *complete*: every node inside it is held by the
//! element store, so the absence of a node there proves it doesn't exist.
//! The set itself holds no element data; callers cascade evictions.

use std::collections::HashSet;
use std::num::NonZeroUsize;

use lru::LruCache;

use crate::tiles::{TilePos, TilesRect};

/// LRU-ordered set of tiles with a fixed capacity.
pub struct SpatialTileCache {
    tiles: LruCache<TilePos, ()>,
}

impl SpatialTileCache {
    /// Create an empty tile set holding at most `capacity` tiles.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            tiles: LruCache::new(capacity),
        }
    }

    /// Marks every tile of `rect` as cached and most recently used.
    ///
    /// Returns the previously cached tiles evicted to stay within capacity,
    /// oldest first. If the rect alone exceeds the capacity, only its last
    /// tiles (row-major) are marked and the rest of the rect is never visited.
    pub fn mark_cached(&mut self, rect: &TilesRect) -> Vec<TilePos> {
        let capacity = self.capacity();
        let mut evicted = Vec::new();

        if rect.size() >= capacity {
            let kept: Vec<TilePos> = rect.last_tiles(capacity).collect();
            let keep: HashSet<TilePos> = kept.iter().copied().collect();
            while let Some((tile, ())) = self.tiles.pop_lru() {
                if !keep.contains(&tile) {
                    evicted.push(tile);
                }
            }
            for tile in kept {
                self.tiles.put(tile, ());
            }
            return evicted;
        }

        for tile in rect.tiles() {
            // push hands back the displaced LRU entry, or the old value of `tile`
            if let Some((old, ())) = self.tiles.push(tile, ()) {
                if old != tile {
                    evicted.push(old);
                }
            }
        }
        evicted
    }

    /// Whether the tile is cached. Does not affect recency.
    #[inline]
    pub fn contains(&self, tile: &TilePos) -> bool {
        self.tiles.contains(tile)
    }

    /// Marks a cached tile as most recently used; no-op for unknown tiles.
    pub fn touch(&mut self, tile: &TilePos) {
        self.tiles.promote(tile);
    }

    /// Evicts least recently used tiles until at most `max` remain.
    pub fn trim(&mut self, max: usize) -> Vec<TilePos> {
        self.evict_down_to(max)
    }

    fn evict_down_to(&mut self, max: usize) -> Vec<TilePos> {
        let mut evicted = Vec::new();
        while self.tiles.len() > max {
            match self.tiles.pop_lru() {
                Some((tile, ())) => evicted.push(tile),
                None => break,
            }
        }
        evicted
    }

    /// Cached tiles, most recently used first.
    pub fn tiles(&self) -> impl Iterator<Item = TilePos> + '_ {
        self.tiles.iter().map(|(tile, _)| *tile)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.tiles.cap().get()
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
    }
}

impl std::fmt::Debug for SpatialTileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialTileCache")
            .field("len", &self.tiles.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}
