//! Keyed element and geometry storage.
//!
//! Both stores are plain maps without policy; the orchestrator decides what
//! goes in and when it comes out.

use std::collections::HashMap;

use crate::element::{Element, ElementGeometry, ElementKey, Node, Relation, Way};

/// Elements by key.
#[derive(Debug, Default)]
pub struct ElementStore {
    elements: HashMap<ElementKey, Element>,
}

impl ElementStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            elements: HashMap::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn get(&self, key: &ElementKey) -> Option<&Element> {
        self.elements.get(key)
    }

    /// Inserts or replaces an element, returning the previous version.
    pub fn put(&mut self, element: Element) -> Option<Element> {
        self.elements.insert(element.key(), element)
    }

    pub fn remove(&mut self, key: &ElementKey) -> Option<Element> {
        self.elements.remove(key)
    }

    #[inline]
    pub fn contains(&self, key: &ElementKey) -> bool {
        self.elements.contains_key(key)
    }

    pub fn node(&self, id: i64) -> Option<&Node> {
        match self.elements.get(&ElementKey::node(id)) {
            Some(Element::Node(n)) => Some(n),
            _ => None,
        }
    }

    pub fn way(&self, id: i64) -> Option<&Way> {
        match self.elements.get(&ElementKey::way(id)) {
            Some(Element::Way(w)) => Some(w),
            _ => None,
        }
    }

    pub fn relation(&self, id: i64) -> Option<&Relation> {
        match self.elements.get(&ElementKey::relation(id)) {
            Some(Element::Relation(r)) => Some(r),
            _ => None,
        }
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&ElementKey, &Element) -> bool) {
        self.elements.retain(|key, element| keep(key, element));
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.elements.values().filter_map(|e| match e {
            Element::Node(n) => Some(n),
            _ => None,
        })
    }

    pub fn ways(&self) -> impl Iterator<Item = &Way> {
        self.elements.values().filter_map(|e| match e {
            Element::Way(w) => Some(w),
            _ => None,
        })
    }

    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.elements.values().filter_map(|e| match e {
            Element::Relation(r) => Some(r),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }
}

/// Geometries by element key.
#[derive(Debug, Default)]
pub struct GeometryStore {
    geometries: HashMap<ElementKey, ElementGeometry>,
}

impl GeometryStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            geometries: HashMap::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn get(&self, key: &ElementKey) -> Option<&ElementGeometry> {
        self.geometries.get(key)
    }

    pub fn put(&mut self, key: ElementKey, geometry: ElementGeometry) -> Option<ElementGeometry> {
        self.geometries.insert(key, geometry)
    }

    pub fn remove(&mut self, key: &ElementKey) -> Option<ElementGeometry> {
        self.geometries.remove(key)
    }

    #[inline]
    pub fn contains(&self, key: &ElementKey) -> bool {
        self.geometries.contains_key(key)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&ElementKey) -> bool) {
        self.geometries.retain(|key, _| keep(key));
    }

    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    pub fn clear(&mut self) {
        self.geometries.clear();
    }
}
