//! The fetch-through map data cache.
//!
//! [`MapDataCache`] keeps elements, geometries and reverse indices in memory
//! and falls back to caller supplied fetch closures for anything it cannot
//! answer with certainty. Completeness is tracked per tile: once a tile is
//! authoritative, a node missing there is known not to exist and reverse
//! index entries of its nodes answer without asking the backing store.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::{debug, trace, warn};

use crate::config::CacheConfig;
use crate::element::{
    Element, ElementGeometry, ElementGeometryEntry, ElementKey, ElementKind, ElementType,
    MapDataWithGeometry, Node, Relation, Way,
};
use crate::tiles::{
    enclosing_tile, enclosing_tiles_rect, tiles_rect_bounding_box, BoundingBox, LatLon, TilePos,
    TilesRect,
};

use super::error::CacheError;
use super::index::{RelationsByElementIndex, WaysByNodeIndex};
use super::loader::MapDataLoader;
use super::policy::CachePolicy;
use super::spatial::SpatialTileCache;
use super::stats::{CacheStatistics, CacheStats};
use super::store::{ElementStore, GeometryStore};
use super::update::UpdateBatch;

/// Tile-indexed in-memory cache of map elements and their geometries.
///
/// Nodes are only held for authoritative tiles. Ways and relations are kept
/// once seen, until a [`trim`](Self::trim) finds them unreachable from the
/// cached tiles.
pub struct MapDataCache<L> {
    config: CacheConfig,
    loader: L,
    spatial: SpatialTileCache,
    elements: ElementStore,
    geometries: GeometryStore,
    ways_by_node: WaysByNodeIndex,
    relations_by_element: RelationsByElementIndex,
    /// Stored node ids per authoritative tile
    nodes_by_tile: HashMap<TilePos, HashSet<i64>>,
    stats: CacheStats,
}

impl<L: MapDataLoader> MapDataCache<L> {
    /// Create an empty cache.
    ///
    /// `loader` is called by [`map_data_with_geometry`](Self::map_data_with_geometry)
    /// for areas whose tiles are not cached yet.
    pub fn new(config: CacheConfig, loader: L) -> Result<Self, CacheError> {
        config.validate()?;

        debug!(
            tile_zoom = config.tile_zoom,
            max_tiles = config.max_tiles,
            initial_capacity = config.initial_capacity,
            "Creating map data cache"
        );

        Ok(Self {
            spatial: SpatialTileCache::new(config.max_tiles),
            elements: ElementStore::with_capacity(config.initial_capacity),
            geometries: GeometryStore::with_capacity(config.initial_capacity),
            ways_by_node: WaysByNodeIndex::new(),
            relations_by_element: RelationsByElementIndex::new(),
            nodes_by_tile: HashMap::new(),
            stats: CacheStats::new(),
            config,
            loader,
        })
    }

    /// Create a cache configured from the `[map_cache]` section of an INI file.
    pub fn from_config_file(path: &Path, loader: L) -> Result<Self, CacheError> {
        let config = CacheConfig::load_from(path)?;
        Self::new(config, loader)
    }

    // =========================================================================
    // Updates
    // =========================================================================

    /// Applies a batch of upserts and deletions.
    ///
    /// If the batch carries a bounding box, its enclosing tiles become
    /// authoritative and the batch replaces the stored nodes of those tiles.
    pub fn update(&mut self, batch: UpdateBatch) {
        let rect = batch
            .bbox
            .as_ref()
            .map(|bbox| enclosing_tiles_rect(bbox, self.config.tile_zoom));
        self.apply_update(
            batch.updated_elements,
            batch.updated_geometries,
            batch.deleted_keys,
            rect,
        );
    }

    /// Upserts elements.
    pub fn update_elements(&mut self, elements: impl IntoIterator<Item = Element>) {
        self.update(UpdateBatch::new().with_elements(elements));
    }

    /// Upserts geometries.
    pub fn update_geometries(&mut self, geometries: impl IntoIterator<Item = ElementGeometryEntry>) {
        self.update(UpdateBatch::new().with_geometries(geometries));
    }

    /// Deletes elements together with their geometries.
    pub fn delete(&mut self, keys: impl IntoIterator<Item = ElementKey>) {
        self.update(UpdateBatch::new().with_deleted(keys));
    }

    fn apply_update(
        &mut self,
        elements: Vec<Element>,
        geometries: Vec<ElementGeometryEntry>,
        deleted: Vec<ElementKey>,
        rect: Option<TilesRect>,
    ) {
        let mut nodes = Vec::new();
        let mut ways = Vec::new();
        let mut relations = Vec::new();
        for element in elements {
            match element {
                Element::Node(n) => nodes.push(n),
                Element::Way(w) => ways.push(w),
                Element::Relation(r) => relations.push(r),
            }
        }

        if let Some(rect) = rect {
            self.mark_authoritative(&rect, &nodes);
        }

        // Index entries created by this batch, filled from the stored
        // elements before the batch's own ways and relations are applied.
        let mut new_way_entries = HashSet::new();
        let mut new_relation_entries = HashSet::new();

        let mut stored_nodes = 0usize;
        let node_count = nodes.len();
        for node in nodes {
            if self.upsert_node(node, &mut new_way_entries, &mut new_relation_entries) {
                stored_nodes += 1;
            }
        }
        for key in self.backfill_ways_entries(&new_way_entries) {
            if self.relations_by_element.ensure_entry(key) {
                new_relation_entries.insert(key);
            }
        }

        let way_count = ways.len();
        for way in ways {
            self.upsert_way(way, &mut new_relation_entries);
        }
        self.backfill_relations_entries(&new_relation_entries);

        let relation_count = relations.len();
        for relation in relations {
            self.upsert_relation(relation);
        }

        let geometry_count = geometries.len();
        for entry in geometries {
            // Node geometries are derived from the node position on demand
            if entry.element_type == ElementType::Node {
                continue;
            }
            self.geometries.put(entry.key(), entry.geometry);
        }

        let deleted_count = deleted.len();
        for key in deleted {
            self.remove_element(&key);
        }

        debug!(
            nodes = node_count,
            stored_nodes = stored_nodes,
            ways = way_count,
            relations = relation_count,
            geometries = geometry_count,
            deleted = deleted_count,
            tiles = rect.map(|r| r.size()).unwrap_or(0),
            "Applied map data update"
        );
    }

    /// Marks the tiles of `rect` as authoritative, dropping nodes of evicted
    /// tiles and stored nodes of `rect` missing from `batch_nodes`.
    fn mark_authoritative(&mut self, rect: &TilesRect, batch_nodes: &[Node]) {
        let evicted = self.spatial.mark_cached(rect);
        if !evicted.is_empty() {
            self.stats.record_tile_evictions(evicted.len() as u64);
            let mut dropped = 0usize;
            for tile in &evicted {
                dropped += self.drop_tile_nodes(tile);
            }
            debug!(
                evicted_tiles = evicted.len(),
                dropped_nodes = dropped,
                "Evicted tiles over capacity"
            );
        }

        let batch_ids: HashSet<i64> = batch_nodes.iter().map(|n| n.id).collect();
        let stale: Vec<i64> = self
            .nodes_by_tile
            .iter()
            .filter(|(tile, _)| rect.contains(tile))
            .flat_map(|(_, ids)| ids.iter().copied())
            .filter(|id| !batch_ids.contains(id))
            .collect();
        for id in stale {
            self.remove_node(id);
        }
    }

    /// Stores a node if its tile is authoritative. Returns whether it was stored.
    ///
    /// Index entries created for the node are recorded in `new_way_entries`
    /// and `new_relation_entries`; they start empty.
    fn upsert_node(
        &mut self,
        node: Node,
        new_way_entries: &mut HashSet<i64>,
        new_relation_entries: &mut HashSet<ElementKey>,
    ) -> bool {
        let zoom = self.config.tile_zoom;
        let id = node.id;
        let tile = enclosing_tile(&node.position, zoom);

        if !self.spatial.contains(&tile) {
            if self.remove_node(id).is_some() {
                trace!(node_id = id, "Node moved out of cached tiles");
            }
            return false;
        }

        if let Some(Element::Node(old)) = self.elements.put(Element::Node(node)) {
            let old_tile = enclosing_tile(&old.position, zoom);
            if old_tile != tile {
                self.unlink_node(id, &old_tile);
            }
        }
        self.nodes_by_tile.entry(tile).or_default().insert(id);
        if self.ways_by_node.ensure_entry(id) {
            new_way_entries.insert(id);
        }
        let key = ElementKey::node(id);
        if self.relations_by_element.ensure_entry(key) {
            new_relation_entries.insert(key);
        }
        true
    }

    /// Adds the stored ways to the new entries of `node_ids`.
    ///
    /// Returns the keys of the ways using any of those nodes.
    fn backfill_ways_entries(&mut self, node_ids: &HashSet<i64>) -> Vec<ElementKey> {
        if node_ids.is_empty() {
            return Vec::new();
        }
        let mut touched = Vec::new();
        for way in self.elements.ways() {
            if way.node_ids.iter().any(|id| node_ids.contains(id)) {
                // Entries already holding the way are unaffected
                self.ways_by_node.on_way_changed(way.id, None, Some(way));
                touched.push(way.key());
            }
        }
        touched
    }

    /// Adds the stored relations to the new entries of `keys`.
    fn backfill_relations_entries(&mut self, keys: &HashSet<ElementKey>) {
        if keys.is_empty() {
            return;
        }
        let mut filled = 0usize;
        for relation in self.elements.relations() {
            if relation.members.iter().any(|m| keys.contains(&m.key())) {
                self.relations_by_element
                    .on_relation_changed(relation.id, None, Some(relation));
                filled += 1;
            }
        }
        trace!(
            entries = keys.len(),
            relations = filled,
            "Filled new relation entries from stored relations"
        );
    }

    /// Stores a way. A way using a stored node gets a relations entry,
    /// recorded in `new_relation_entries` when created.
    fn upsert_way(&mut self, way: Way, new_relation_entries: &mut HashSet<ElementKey>) {
        let id = way.id;
        let key = way.key();
        let touches_cached_node = way
            .node_ids
            .iter()
            .any(|node_id| self.elements.contains(&ElementKey::node(*node_id)));

        let old = match self.elements.put(Element::Way(way)) {
            Some(Element::Way(w)) => Some(w),
            _ => None,
        };
        if let Some(Element::Way(new)) = self.elements.get(&key) {
            self.ways_by_node.on_way_changed(id, old.as_ref(), Some(new));
        }
        if touches_cached_node && self.relations_by_element.ensure_entry(key) {
            new_relation_entries.insert(key);
        }
    }

    /// Stores a single way outside of a batch update.
    fn store_way(&mut self, way: Way) {
        let mut new_relation_entries = HashSet::new();
        self.upsert_way(way, &mut new_relation_entries);
        self.backfill_relations_entries(&new_relation_entries);
    }

    fn upsert_relation(&mut self, relation: Relation) {
        let id = relation.id;
        let key = relation.key();

        let old = match self.elements.put(Element::Relation(relation)) {
            Some(Element::Relation(r)) => Some(r),
            _ => None,
        };
        if let Some(Element::Relation(new)) = self.elements.get(&key) {
            self.relations_by_element
                .on_relation_changed(id, old.as_ref(), Some(new));
        }
    }

    fn remove_element(&mut self, key: &ElementKey) {
        match key.element_type {
            ElementType::Node => {
                self.remove_node(key.id);
                self.ways_by_node.remove_entry(&key.id);
            }
            ElementType::Way => {
                if let Some(Element::Way(old)) = self.elements.remove(key) {
                    self.ways_by_node.on_way_changed(key.id, Some(&old), None);
                }
            }
            ElementType::Relation => {
                if let Some(Element::Relation(old)) = self.elements.remove(key) {
                    self.relations_by_element
                        .on_relation_changed(key.id, Some(&old), None);
                }
            }
        }
        self.geometries.remove(key);
        self.relations_by_element.remove_entry(key);
    }

    /// Removes a stored node. Its index entries are left in place.
    fn remove_node(&mut self, id: i64) -> Option<Node> {
        let key = ElementKey::node(id);
        match self.elements.remove(&key) {
            Some(Element::Node(node)) => {
                let tile = enclosing_tile(&node.position, self.config.tile_zoom);
                self.unlink_node(id, &tile);
                self.geometries.remove(&key);
                Some(node)
            }
            _ => None,
        }
    }

    fn unlink_node(&mut self, id: i64, tile: &TilePos) {
        if let Some(ids) = self.nodes_by_tile.get_mut(tile) {
            ids.remove(&id);
            if ids.is_empty() {
                self.nodes_by_tile.remove(tile);
            }
        }
    }

    fn drop_tile_nodes(&mut self, tile: &TilePos) -> usize {
        match self.nodes_by_tile.remove(tile) {
            Some(ids) => {
                for id in &ids {
                    self.elements.remove(&ElementKey::node(*id));
                }
                ids.len()
            }
            None => 0,
        }
    }

    // =========================================================================
    // Element lookups
    // =========================================================================

    /// Returns the element, calling `fetch` if it is not cached.
    ///
    /// Fetched ways and relations are stored; fetched nodes are not, since a
    /// node is only trusted as part of a complete tile.
    pub fn get_element<E>(
        &mut self,
        element_type: ElementType,
        id: i64,
        fetch: impl FnOnce(ElementType, i64) -> Result<Option<Element>, E>,
    ) -> Result<Option<Element>, E> {
        let key = ElementKey::new(element_type, id);
        if let Some(element) = self.cached_element(&key) {
            let element = element.clone();
            self.stats.record_element_hits(1);
            return Ok(Some(element));
        }

        self.stats.record_element_misses(1);
        self.stats.record_fetch();
        trace!(element = %key, "Element cache miss, fetching");

        let fetched = fetch(element_type, id)?;
        if let Some(element) = &fetched {
            self.store_fetched(element.clone());
        }
        Ok(fetched)
    }

    /// Returns the elements for `keys` in request order.
    ///
    /// Missing elements are requested with a single `bulk_fetch` call, which
    /// is skipped when everything is cached. Keys the backing store doesn't
    /// know are left out of the result.
    pub fn get_elements<E>(
        &mut self,
        keys: &[ElementKey],
        bulk_fetch: impl FnOnce(&[ElementKey]) -> Result<Vec<Element>, E>,
    ) -> Result<Vec<Element>, E> {
        self.get_many(keys, bulk_fetch)
    }

    /// Returns the nodes for `ids` in request order. Fetched nodes are not stored.
    pub fn get_nodes<E>(
        &mut self,
        ids: &[i64],
        bulk_fetch: impl FnOnce(&[i64]) -> Result<Vec<Node>, E>,
    ) -> Result<Vec<Node>, E> {
        let keys: Vec<ElementKey> = ids.iter().map(|id| ElementKey::node(*id)).collect();
        self.get_many(&keys, |missing| bulk_fetch(&key_ids(missing)))
    }

    /// Returns the ways for `ids` in request order, storing fetched ones.
    pub fn get_ways<E>(
        &mut self,
        ids: &[i64],
        bulk_fetch: impl FnOnce(&[i64]) -> Result<Vec<Way>, E>,
    ) -> Result<Vec<Way>, E> {
        let keys: Vec<ElementKey> = ids.iter().map(|id| ElementKey::way(*id)).collect();
        self.get_many(&keys, |missing| bulk_fetch(&key_ids(missing)))
    }

    /// Returns the relations for `ids` in request order, storing fetched ones.
    pub fn get_relations<E>(
        &mut self,
        ids: &[i64],
        bulk_fetch: impl FnOnce(&[i64]) -> Result<Vec<Relation>, E>,
    ) -> Result<Vec<Relation>, E> {
        let keys: Vec<ElementKey> = ids.iter().map(|id| ElementKey::relation(*id)).collect();
        self.get_many(&keys, |missing| bulk_fetch(&key_ids(missing)))
    }

    fn get_many<T: ElementKind, E>(
        &mut self,
        keys: &[ElementKey],
        bulk_fetch: impl FnOnce(&[ElementKey]) -> Result<Vec<T>, E>,
    ) -> Result<Vec<T>, E> {
        let mut found: HashMap<ElementKey, T> = HashMap::with_capacity(keys.len());
        let mut missing = Vec::new();
        let mut seen = HashSet::with_capacity(keys.len());

        for key in keys {
            if !seen.insert(*key) {
                continue;
            }
            match self.cached_element(key).and_then(T::from_element) {
                Some(element) => {
                    found.insert(*key, element.clone());
                }
                None => missing.push(*key),
            }
        }
        self.stats.record_element_hits(found.len() as u64);

        if !missing.is_empty() {
            self.stats.record_element_misses(missing.len() as u64);
            self.stats.record_fetch();
            trace!(missing = missing.len(), "Bulk element cache miss, fetching");

            let fetched = bulk_fetch(&missing)?;
            for element in fetched {
                self.store_fetched(element.clone().into_element());
                found.insert(element.element_key(), element);
            }
        }

        Ok(keys.iter().filter_map(|key| found.get(key).cloned()).collect())
    }

    /// A stored element; nodes only count while their tile is authoritative.
    fn cached_element(&self, key: &ElementKey) -> Option<&Element> {
        let element = self.elements.get(key)?;
        if let Element::Node(node) = element {
            let tile = enclosing_tile(&node.position, self.config.tile_zoom);
            if !self.spatial.contains(&tile) {
                return None;
            }
        }
        Some(element)
    }

    fn store_fetched(&mut self, element: Element) {
        if !CachePolicy::for_type(element.element_type()).persists() {
            return;
        }
        match element {
            Element::Way(w) => self.store_way(w),
            Element::Relation(r) => self.upsert_relation(r),
            Element::Node(_) => {}
        }
    }

    // =========================================================================
    // Geometry lookups
    // =========================================================================

    /// Returns the geometry of an element, calling `fetch` if not cached.
    ///
    /// The geometry of a stored node is its position and never fetched.
    pub fn get_geometry<E>(
        &mut self,
        element_type: ElementType,
        id: i64,
        fetch: impl FnOnce(ElementType, i64) -> Result<Option<ElementGeometry>, E>,
    ) -> Result<Option<ElementGeometry>, E> {
        let key = ElementKey::new(element_type, id);
        if let Some(geometry) = self.cached_geometry(&key) {
            self.stats.record_geometry_hits(1);
            return Ok(Some(geometry));
        }

        self.stats.record_geometry_misses(1);
        self.stats.record_fetch();
        trace!(element = %key, "Geometry cache miss, fetching");

        let fetched = fetch(element_type, id)?;
        if let Some(geometry) = &fetched {
            if CachePolicy::for_type(element_type).persists() {
                self.geometries.put(key, geometry.clone());
            }
        }
        Ok(fetched)
    }

    /// Returns the geometries for `keys` in request order.
    ///
    /// Missing geometries are requested with a single `bulk_fetch` call.
    pub fn get_geometries<E>(
        &mut self,
        keys: &[ElementKey],
        bulk_fetch: impl FnOnce(&[ElementKey]) -> Result<Vec<ElementGeometryEntry>, E>,
    ) -> Result<Vec<ElementGeometryEntry>, E> {
        let mut found: HashMap<ElementKey, ElementGeometry> = HashMap::with_capacity(keys.len());
        let mut missing = Vec::new();
        let mut seen = HashSet::with_capacity(keys.len());

        for key in keys {
            if !seen.insert(*key) {
                continue;
            }
            match self.cached_geometry(key) {
                Some(geometry) => {
                    found.insert(*key, geometry);
                }
                None => missing.push(*key),
            }
        }
        self.stats.record_geometry_hits(found.len() as u64);

        if !missing.is_empty() {
            self.stats.record_geometry_misses(missing.len() as u64);
            self.stats.record_fetch();
            trace!(missing = missing.len(), "Bulk geometry cache miss, fetching");

            let fetched = bulk_fetch(&missing)?;
            for entry in fetched {
                let key = entry.key();
                if CachePolicy::for_type(entry.element_type).persists() {
                    self.geometries.put(key, entry.geometry.clone());
                }
                found.insert(key, entry.geometry);
            }
        }

        Ok(keys
            .iter()
            .filter_map(|key| {
                found.get(key).map(|geometry| {
                    ElementGeometryEntry::new(key.element_type, key.id, geometry.clone())
                })
            })
            .collect())
    }

    fn cached_geometry(&self, key: &ElementKey) -> Option<ElementGeometry> {
        match key.element_type {
            ElementType::Node => match self.cached_element(key) {
                Some(Element::Node(node)) => Some(ElementGeometry::point(node.position)),
                _ => None,
            },
            _ => self.geometries.get(key).cloned(),
        }
    }

    // =========================================================================
    // Reverse lookups
    // =========================================================================

    /// Returns all ways having the node as vertex.
    ///
    /// Answered from the index when the node's entry exists, otherwise
    /// `fetch` is called and its result becomes the entry.
    pub fn ways_for_node<E>(
        &mut self,
        node_id: i64,
        fetch: impl FnOnce(i64) -> Result<Vec<Way>, E>,
    ) -> Result<Vec<Way>, E> {
        if let Some(way_ids) = self.ways_by_node.sorted(&node_id) {
            self.stats.record_index_hit();
            let ways: Vec<Way> = way_ids
                .into_iter()
                .filter_map(|way_id| {
                    let way = self.elements.way(way_id).cloned();
                    if way.is_none() {
                        indexed_element_missing(ElementKey::way(way_id));
                    }
                    way
                })
                .collect();
            return Ok(ways);
        }

        self.stats.record_index_miss();
        self.stats.record_fetch();
        trace!(node_id = node_id, "Ways-by-node index miss, fetching");

        let ways = fetch(node_id)?;
        for way in &ways {
            self.store_way(way.clone());
        }
        self.ways_by_node
            .insert_entry(node_id, ways.iter().map(|w| w.id));
        Ok(ways)
    }

    /// Returns all relations having the node as member.
    pub fn relations_for_node<E>(
        &mut self,
        node_id: i64,
        fetch: impl FnOnce(i64) -> Result<Vec<Relation>, E>,
    ) -> Result<Vec<Relation>, E> {
        self.relations_for(ElementKey::node(node_id), fetch)
    }

    /// Returns all relations having the way as member.
    pub fn relations_for_way<E>(
        &mut self,
        way_id: i64,
        fetch: impl FnOnce(i64) -> Result<Vec<Relation>, E>,
    ) -> Result<Vec<Relation>, E> {
        self.relations_for(ElementKey::way(way_id), fetch)
    }

    fn relations_for<E>(
        &mut self,
        key: ElementKey,
        fetch: impl FnOnce(i64) -> Result<Vec<Relation>, E>,
    ) -> Result<Vec<Relation>, E> {
        if let Some(relation_ids) = self.relations_by_element.sorted(&key) {
            self.stats.record_index_hit();
            let relations: Vec<Relation> = relation_ids
                .into_iter()
                .filter_map(|relation_id| {
                    let relation = self.elements.relation(relation_id).cloned();
                    if relation.is_none() {
                        indexed_element_missing(ElementKey::relation(relation_id));
                    }
                    relation
                })
                .collect();
            return Ok(relations);
        }

        self.stats.record_index_miss();
        self.stats.record_fetch();
        trace!(element = %key, "Relations-by-element index miss, fetching");

        let relations = fetch(key.id)?;
        for relation in &relations {
            self.upsert_relation(relation.clone());
        }
        self.relations_by_element
            .insert_entry(key, relations.iter().map(|r| r.id));
        Ok(relations)
    }

    // =========================================================================
    // Area queries
    // =========================================================================

    /// Returns all map data inside `bbox` with geometries.
    ///
    /// Tiles not cached yet are loaded with one loader call covering them and
    /// become authoritative. The result holds the nodes inside `bbox`, the
    /// ways using them and the relations with any of them as member. A loader
    /// error leaves the cache unchanged.
    pub fn map_data_with_geometry(
        &mut self,
        bbox: &BoundingBox,
    ) -> Result<MapDataWithGeometry, L::Error> {
        let zoom = self.config.tile_zoom;
        let rect = enclosing_tiles_rect(bbox, zoom);
        let capacity = self.spatial.capacity();

        // An area larger than the capacity can't be fully cached, so it is
        // loaded whole without listing its tiles.
        let oversized = rect.size() > capacity;
        let load_rect = if oversized {
            warn!(
                tiles = rect.size(),
                max_tiles = capacity,
                "Requested area exceeds tile capacity, result will be incomplete"
            );
            Some(rect)
        } else {
            TilesRect::minimal_enclosing(rect.tiles().filter(|tile| !self.spatial.contains(tile)))
        };

        if let Some(load_rect) = load_rect {
            let load_bbox = tiles_rect_bounding_box(&load_rect, zoom);
            self.stats.record_load(load_rect.size() as u64);
            let chunk = self.loader.load(&load_bbox)?;
            debug!(
                tiles = load_rect.size(),
                elements = chunk.elements.len(),
                geometries = chunk.geometries.len(),
                "Loaded map data for uncached tiles"
            );
            self.apply_update(chunk.elements, chunk.geometries, Vec::new(), Some(load_rect));
        }

        if !oversized {
            for tile in rect.tiles() {
                self.spatial.touch(&tile);
            }
        }

        Ok(self.collect_area(bbox, &rect))
    }

    fn collect_area(&self, bbox: &BoundingBox, rect: &TilesRect) -> MapDataWithGeometry {
        let mut data = MapDataWithGeometry::new(*bbox);

        let mut node_ids: Vec<i64> = self
            .nodes_by_tile
            .iter()
            .filter(|(tile, _)| rect.contains(tile))
            .flat_map(|(_, ids)| ids.iter().copied())
            .filter(|id| {
                self.elements
                    .node(*id)
                    .is_some_and(|node| bbox.contains(&node.position))
            })
            .collect();
        node_ids.sort_unstable();

        let mut way_ids = HashSet::new();
        let mut relation_ids = HashSet::new();

        for id in &node_ids {
            if let Some(node) = self.elements.node(*id) {
                data.put(
                    Element::Node(node.clone()),
                    Some(ElementGeometry::point(node.position)),
                );
            }
            if let Some(ids) = self.ways_by_node.get(id) {
                way_ids.extend(ids.iter().copied());
            }
            if let Some(ids) = self.relations_by_element.get(&ElementKey::node(*id)) {
                relation_ids.extend(ids.iter().copied());
            }
        }

        for id in &way_ids {
            let key = ElementKey::way(*id);
            match self.elements.way(*id) {
                Some(way) => data.put(Element::Way(way.clone()), self.geometries.get(&key).cloned()),
                None => indexed_element_missing(key),
            }
            if let Some(ids) = self.relations_by_element.get(&key) {
                relation_ids.extend(ids.iter().copied());
            }
        }

        for id in &relation_ids {
            let key = ElementKey::relation(*id);
            match self.elements.relation(*id) {
                Some(relation) => data.put(
                    Element::Relation(relation.clone()),
                    self.geometries.get(&key).cloned(),
                ),
                None => indexed_element_missing(key),
            }
        }

        data
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Shrinks the cache to at most `max_tiles` authoritative tiles.
    ///
    /// Least recently used tiles are evicted, then everything no longer
    /// reachable from the remaining tiles is purged: nodes outside them,
    /// ways without a remaining node, relations without a remaining member
    /// (directly or through other remaining relations), orphaned geometries
    /// and index entries of purged elements.
    pub fn trim(&mut self, max_tiles: usize) {
        let evicted = self.spatial.trim(max_tiles);
        self.stats.record_tile_evictions(evicted.len() as u64);
        self.stats.record_trim();
        for tile in &evicted {
            self.drop_tile_nodes(tile);
        }

        let elements_before = self.elements.len();
        self.purge_unreachable();

        debug!(
            max_tiles = max_tiles,
            evicted_tiles = evicted.len(),
            purged_elements = elements_before - self.elements.len(),
            remaining_elements = self.elements.len(),
            "Trimmed map data cache"
        );
    }

    fn purge_unreachable(&mut self) {
        let zoom = self.config.tile_zoom;
        let spatial = &self.spatial;

        let kept_nodes: HashSet<i64> = self
            .elements
            .nodes()
            .filter(|n| spatial.contains(&enclosing_tile(&n.position, zoom)))
            .map(|n| n.id)
            .collect();

        let kept_ways: HashSet<i64> = self
            .elements
            .ways()
            .filter(|w| w.node_ids.iter().any(|id| kept_nodes.contains(id)))
            .map(|w| w.id)
            .collect();

        let mut kept_relations: HashSet<i64> = self
            .elements
            .relations()
            .filter(|r| {
                r.members.iter().any(|m| match m.element_type {
                    ElementType::Node => kept_nodes.contains(&m.ref_id),
                    ElementType::Way => kept_ways.contains(&m.ref_id),
                    ElementType::Relation => false,
                })
            })
            .map(|r| r.id)
            .collect();

        loop {
            let parents: Vec<i64> = self
                .elements
                .relations()
                .filter(|r| !kept_relations.contains(&r.id))
                .filter(|r| {
                    r.members.iter().any(|m| {
                        m.element_type == ElementType::Relation
                            && kept_relations.contains(&m.ref_id)
                    })
                })
                .map(|r| r.id)
                .collect();
            if parents.is_empty() {
                break;
            }
            kept_relations.extend(parents);
        }

        let is_kept = |key: &ElementKey| match key.element_type {
            ElementType::Node => kept_nodes.contains(&key.id),
            ElementType::Way => kept_ways.contains(&key.id),
            ElementType::Relation => kept_relations.contains(&key.id),
        };

        self.elements.retain(|key, _| is_kept(key));
        self.geometries.retain(|key| is_kept(key));
        self.ways_by_node.retain_nodes(|id| kept_nodes.contains(id));
        self.relations_by_element.retain_keys(|key| is_kept(key));
        self.nodes_by_tile
            .retain(|tile, _| self.spatial.contains(tile));
    }

    /// Removes everything, as if newly created. Statistics are kept.
    pub fn clear(&mut self) {
        self.spatial.clear();
        self.elements.clear();
        self.geometries.clear();
        self.ways_by_node.clear();
        self.relations_by_element.clear();
        self.nodes_by_tile.clear();
        debug!("Cleared map data cache");
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Snapshot of the statistics together with current store sizes.
    pub fn statistics(&self) -> CacheStatistics {
        CacheStatistics::from_stats(
            &self.stats,
            self.spatial.len(),
            self.elements.len(),
            self.geometries.len(),
        )
    }

    /// Authoritative tiles, most recently used first.
    pub fn cached_tiles(&self) -> Vec<TilePos> {
        self.spatial.tiles().collect()
    }

    pub fn is_tile_cached(&self, tile: &TilePos) -> bool {
        self.spatial.contains(tile)
    }

    /// Whether `position` lies in an authoritative tile.
    pub fn is_position_cached(&self, position: &LatLon) -> bool {
        self.spatial
            .contains(&enclosing_tile(position, self.config.tile_zoom))
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }
}

fn key_ids(keys: &[ElementKey]) -> Vec<i64> {
    keys.iter().map(|key| key.id).collect()
}

fn indexed_element_missing(key: ElementKey) {
    debug_assert!(false, "index references {} which is not stored", key);
    warn!(element = %key, "Index references element missing from store, skipping");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::EmptyLoader;
    use crate::element::RelationMember;
    use std::convert::Infallible;

    const P1: LatLon = LatLon::new(0.00001, 0.00001);
    const P2: LatLon = LatLon::new(0.0001, 0.0001);

    fn cache() -> MapDataCache<EmptyLoader> {
        MapDataCache::new(CacheConfig::new(16, 4, 10), EmptyLoader).unwrap()
    }

    fn area() -> BoundingBox {
        BoundingBox::new(0.0, 0.0, 0.001, 0.001)
    }

    fn no_fetch<T>(_: ElementType, _: i64) -> Result<Option<T>, Infallible> {
        panic!("unexpected fetch");
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = MapDataCache::new(CacheConfig::new(16, 0, 10), EmptyLoader);
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_node_update_without_cached_tile_is_not_stored() {
        let mut cache = cache();
        cache.update_elements([Node::new(1, P1).into()]);
        assert_eq!(cache.element_count(), 0);
    }

    #[test]
    fn test_node_update_with_bbox_is_stored_and_indexed() {
        let mut cache = cache();
        cache.update(
            UpdateBatch::new()
                .with_elements([Node::new(1, P1).into()])
                .with_bbox(area()),
        );

        assert!(cache.is_position_cached(&P1));
        let node = cache
            .get_element(ElementType::Node, 1, no_fetch)
            .unwrap();
        assert_eq!(node, Some(Node::new(1, P1).into()));
        assert!(cache.ways_by_node.contains(&1));
        assert!(cache.relations_by_element.contains(&ElementKey::node(1)));
    }

    #[test]
    fn test_way_touching_cached_node_gets_relations_entry() {
        let mut cache = cache();
        cache.update(
            UpdateBatch::new()
                .with_elements([Node::new(1, P1).into(), Way::new(1, vec![1, 99]).into()])
                .with_bbox(area()),
        );
        cache.update_elements([Way::new(2, vec![98, 99]).into()]);

        assert!(cache.relations_by_element.contains(&ElementKey::way(1)));
        assert!(!cache.relations_by_element.contains(&ElementKey::way(2)));
    }

    #[test]
    fn test_bbox_update_replaces_nodes_of_area() {
        let mut cache = cache();
        cache.update(
            UpdateBatch::new()
                .with_elements([Node::new(1, P1).into(), Node::new(2, P2).into()])
                .with_bbox(area()),
        );
        cache.update(
            UpdateBatch::new()
                .with_elements([Node::new(2, P2).into()])
                .with_bbox(area()),
        );

        assert!(cache.elements.node(1).is_none());
        assert!(cache.elements.node(2).is_some());
    }

    #[test]
    fn test_delete_way_patches_index_and_removes_geometry() {
        let mut cache = cache();
        cache.update(
            UpdateBatch::new()
                .with_elements([Node::new(1, P1).into(), Way::new(1, vec![1]).into()])
                .with_geometries([ElementGeometryEntry::new(
                    ElementType::Way,
                    1,
                    ElementGeometry::point(P1),
                )])
                .with_bbox(area()),
        );
        assert_eq!(cache.ways_by_node.sorted(&1), Some(vec![1]));
        assert_eq!(cache.geometry_count(), 1);

        cache.delete([ElementKey::way(1)]);
        assert_eq!(cache.ways_by_node.sorted(&1), Some(vec![]));
        assert_eq!(cache.geometry_count(), 0);
        assert!(!cache.relations_by_element.contains(&ElementKey::way(1)));
    }

    #[test]
    fn test_node_geometry_is_not_stored() {
        let mut cache = cache();
        cache.update(
            UpdateBatch::new()
                .with_elements([Node::new(1, P1).into()])
                .with_geometries([ElementGeometryEntry::new(
                    ElementType::Node,
                    1,
                    ElementGeometry::point(P1),
                )])
                .with_bbox(area()),
        );
        assert_eq!(cache.geometry_count(), 0);
        let geometry = cache.get_geometry(ElementType::Node, 1, no_fetch).unwrap();
        assert_eq!(geometry, Some(ElementGeometry::point(P1)));
    }

    #[test]
    fn test_trim_keeps_relation_chains_consistent() {
        let mut cache = cache();
        let inner = Relation::new(1, vec![RelationMember::new(ElementType::Node, 1, "")]);
        let outer = Relation::new(2, vec![RelationMember::new(ElementType::Relation, 1, "")]);
        let outermost = Relation::new(3, vec![RelationMember::new(ElementType::Relation, 2, "")]);
        cache.update(
            UpdateBatch::new()
                .with_elements([
                    Node::new(1, P1).into(),
                    inner.into(),
                    outer.into(),
                    outermost.into(),
                ])
                .with_bbox(area()),
        );
        cache
            .relations_for_way(5, |_| Ok::<_, Infallible>(Vec::new()))
            .unwrap();
        cache.relations_by_element.insert_entry(ElementKey::relation(2), [3]);

        cache.trim(4);

        assert_eq!(cache.element_count(), 4);
        assert_eq!(
            cache.relations_by_element.sorted(&ElementKey::relation(2)),
            Some(vec![3])
        );
        assert!(!cache.relations_by_element.contains(&ElementKey::way(5)));
    }
}
