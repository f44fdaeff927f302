//! Result container for area queries.

use std::collections::HashMap;

use crate::tiles::BoundingBox;

use super::geometry::ElementGeometry;
use super::types::{Element, ElementKey, Node, Relation, Way};

/// Elements of an area together with their geometries.
///
/// Every contained element has a geometry slot; the slot holds `None` when
/// no geometry is known for that element.
#[derive(Debug, Clone, PartialEq)]
pub struct MapDataWithGeometry {
    /// Area this data was requested for
    pub bounding_box: BoundingBox,
    nodes: HashMap<i64, Node>,
    ways: HashMap<i64, Way>,
    relations: HashMap<i64, Relation>,
    geometries: HashMap<ElementKey, Option<ElementGeometry>>,
}

impl MapDataWithGeometry {
    pub fn new(bounding_box: BoundingBox) -> Self {
        Self {
            bounding_box,
            nodes: HashMap::new(),
            ways: HashMap::new(),
            relations: HashMap::new(),
            geometries: HashMap::new(),
        }
    }

    /// Adds (or replaces) an element together with its geometry slot.
    pub fn put(&mut self, element: Element, geometry: Option<ElementGeometry>) {
        let key = element.key();
        match element {
            Element::Node(n) => {
                self.nodes.insert(n.id, n);
            }
            Element::Way(w) => {
                self.ways.insert(w.id, w);
            }
            Element::Relation(r) => {
                self.relations.insert(r.id, r);
            }
        }
        self.geometries.insert(key, geometry);
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn ways(&self) -> impl Iterator<Item = &Way> {
        self.ways.values()
    }

    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.values()
    }

    pub fn node(&self, id: i64) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn way(&self, id: i64) -> Option<&Way> {
        self.ways.get(&id)
    }

    pub fn relation(&self, id: i64) -> Option<&Relation> {
        self.relations.get(&id)
    }

    /// Geometry of an element, `None` if absent or unknown.
    pub fn geometry(&self, key: &ElementKey) -> Option<&ElementGeometry> {
        self.geometries.get(key).and_then(Option::as_ref)
    }

    /// Whether the element is part of this data (with or without geometry).
    pub fn contains(&self, key: &ElementKey) -> bool {
        self.geometries.contains_key(key)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn way_count(&self) -> usize {
        self.ways.len()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.nodes.len() + self.ways.len() + self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
