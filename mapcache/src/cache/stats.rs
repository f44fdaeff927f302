//! Cache statistics tracking and reporting.

use std::time::Instant;

/// Cache statistics for monitoring and debugging.
#[derive(Debug, Clone)]
pub struct CacheStats {
    // Element lookups
    pub element_hits: u64,
    pub element_misses: u64,

    // Geometry lookups
    pub geometry_hits: u64,
    pub geometry_misses: u64,

    // Reverse index lookups
    pub index_hits: u64,
    pub index_misses: u64,

    // Backing store traffic
    pub fetches: u64,
    pub loader_calls: u64,

    // Spatial cache
    pub tiles_loaded: u64,
    pub tiles_evicted: u64,
    pub trims: u64,

    // Timing
    pub created_at: Instant,
}

impl Default for CacheStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStats {
    /// Create a new statistics tracker.
    pub fn new() -> Self {
        Self {
            element_hits: 0,
            element_misses: 0,
            geometry_hits: 0,
            geometry_misses: 0,
            index_hits: 0,
            index_misses: 0,
            fetches: 0,
            loader_calls: 0,
            tiles_loaded: 0,
            tiles_evicted: 0,
            trims: 0,
            created_at: Instant::now(),
        }
    }

    /// Element hit rate (0.0 to 1.0).
    pub fn element_hit_rate(&self) -> f64 {
        rate(self.element_hits, self.element_misses)
    }

    /// Geometry hit rate (0.0 to 1.0).
    pub fn geometry_hit_rate(&self) -> f64 {
        rate(self.geometry_hits, self.geometry_misses)
    }

    /// Hit rate over all lookups (0.0 to 1.0).
    pub fn overall_hit_rate(&self) -> f64 {
        rate(
            self.element_hits + self.geometry_hits + self.index_hits,
            self.element_misses + self.geometry_misses + self.index_misses,
        )
    }

    /// Get the uptime duration since statistics started.
    pub fn uptime(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }

    pub fn record_element_hits(&mut self, count: u64) {
        self.element_hits += count;
    }

    pub fn record_element_misses(&mut self, count: u64) {
        self.element_misses += count;
    }

    pub fn record_geometry_hits(&mut self, count: u64) {
        self.geometry_hits += count;
    }

    pub fn record_geometry_misses(&mut self, count: u64) {
        self.geometry_misses += count;
    }

    pub fn record_index_hit(&mut self) {
        self.index_hits += 1;
    }

    pub fn record_index_miss(&mut self) {
        self.index_misses += 1;
    }

    /// Record a call to a fetch closure.
    pub fn record_fetch(&mut self) {
        self.fetches += 1;
    }

    /// Record a bulk loader call covering `tiles` tiles.
    pub fn record_load(&mut self, tiles: u64) {
        self.loader_calls += 1;
        self.tiles_loaded += tiles;
    }

    pub fn record_tile_evictions(&mut self, count: u64) {
        self.tiles_evicted += count;
    }

    pub fn record_trim(&mut self) {
        self.trims += 1;
    }
}

fn rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

/// Snapshot of cache statistics for reporting.
#[derive(Debug, Clone)]
pub struct CacheStatistics {
    pub stats: CacheStats,
    pub cached_tiles: usize,
    pub element_count: usize,
    pub geometry_count: usize,
    pub element_hit_rate_percent: f64,
    pub geometry_hit_rate_percent: f64,
    pub overall_hit_rate_percent: f64,
    pub uptime_secs: u64,
}

impl CacheStatistics {
    /// Create a statistics snapshot from current stats and store sizes.
    pub fn from_stats(
        stats: &CacheStats,
        cached_tiles: usize,
        element_count: usize,
        geometry_count: usize,
    ) -> Self {
        Self {
            stats: stats.clone(),
            cached_tiles,
            element_count,
            geometry_count,
            element_hit_rate_percent: stats.element_hit_rate() * 100.0,
            geometry_hit_rate_percent: stats.geometry_hit_rate() * 100.0,
            overall_hit_rate_percent: stats.overall_hit_rate() * 100.0,
            uptime_secs: stats.uptime().as_secs(),
        }
    }

    /// Format statistics as a human-readable string.
    pub fn format(&self) -> String {
        let stats = &self.stats;

        format!(
            r#"Map Data Cache Statistics

TILES
  Cached:      {}
  Loaded:      {}
  Evicted:     {}
  Trims:       {}

ELEMENTS
  Stored:      {}
  Hits:        {}
  Misses:      {}
  Hit Rate:    {:.1}%

GEOMETRIES
  Stored:      {}
  Hits:        {}
  Misses:      {}
  Hit Rate:    {:.1}%

BACKING STORE
  Fetches:     {}
  Bulk Loads:  {}

OVERALL
  Hit Rate:    {:.1}%
  Uptime:      {}s
"#,
            self.cached_tiles,
            stats.tiles_loaded,
            stats.tiles_evicted,
            stats.trims,
            self.element_count,
            stats.element_hits,
            stats.element_misses,
            self.element_hit_rate_percent,
            self.geometry_count,
            stats.geometry_hits,
            stats.geometry_misses,
            self.geometry_hit_rate_percent,
            stats.fetches,
            stats.loader_calls,
            self.overall_hit_rate_percent,
            self.uptime_secs,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_default() {
        let stats = CacheStats::default();

        assert_eq!(stats.element_hits, 0);
        assert_eq!(stats.element_misses, 0);
        assert_eq!(stats.fetches, 0);
        assert_eq!(stats.tiles_loaded, 0);
    }

    #[test]
    fn test_hit_rates() {
        let mut stats = CacheStats::new();
        assert_eq!(stats.element_hit_rate(), 0.0);

        stats.record_element_hits(3);
        stats.record_element_misses(1);
        assert_eq!(stats.element_hit_rate(), 0.75);

        stats.record_geometry_misses(2);
        stats.record_index_hit();
        assert_eq!(stats.overall_hit_rate(), 4.0 / 7.0);
    }

    #[test]
    fn test_record_load_and_evictions() {
        let mut stats = CacheStats::new();
        stats.record_load(4);
        stats.record_load(2);
        stats.record_tile_evictions(3);
        stats.record_trim();

        assert_eq!(stats.loader_calls, 2);
        assert_eq!(stats.tiles_loaded, 6);
        assert_eq!(stats.tiles_evicted, 3);
        assert_eq!(stats.trims, 1);
    }

    #[test]
    fn test_statistics_format() {
        let mut stats = CacheStats::new();
        stats.record_element_hits(1);
        let snapshot = CacheStatistics::from_stats(&stats, 2, 10, 5);

        assert_eq!(snapshot.element_hit_rate_percent, 100.0);
        let text = snapshot.format();
        assert!(text.contains("Cached:      2"));
        assert!(text.contains("Stored:      10"));
    }
}
