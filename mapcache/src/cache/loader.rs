//! Bulk area loading from the backing store.

use std::convert::Infallible;

use crate::element::{Element, ElementGeometryEntry};
use crate::tiles::BoundingBox;

/// Complete map data of an area as returned by a [`MapDataLoader`].
///
/// Must contain every node inside the requested box, every way using one of
/// those nodes and every relation with one of those nodes or ways as member.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapDataChunk {
    pub elements: Vec<Element>,
    pub geometries: Vec<ElementGeometryEntry>,
}

impl MapDataChunk {
    pub fn new(elements: Vec<Element>, geometries: Vec<ElementGeometryEntry>) -> Self {
        Self {
            elements,
            geometries,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.geometries.is_empty()
    }
}

/// Source of complete area data, called for tiles not yet cached.
pub trait MapDataLoader {
    type Error;

    fn load(&mut self, bbox: &BoundingBox) -> Result<MapDataChunk, Self::Error>;
}

impl<F, E> MapDataLoader for F
where
    F: FnMut(&BoundingBox) -> Result<MapDataChunk, E>,
{
    type Error = E;

    fn load(&mut self, bbox: &BoundingBox) -> Result<MapDataChunk, E> {
        self(bbox)
    }
}

/// Loader for caches fed only through updates; every area is empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyLoader;

impl MapDataLoader for EmptyLoader {
    type Error = Infallible;

    fn load(&mut self, _bbox: &BoundingBox) -> Result<MapDataChunk, Infallible> {
        Ok(MapDataChunk::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Node;
    use crate::tiles::LatLon;

    #[test]
    fn test_closure_loader() {
        let mut calls = 0;
        let mut loader = |_: &BoundingBox| -> Result<MapDataChunk, String> {
            calls += 1;
            Ok(MapDataChunk::new(
                vec![Node::new(1, LatLon::new(0.0, 0.0)).into()],
                Vec::new(),
            ))
        };

        let chunk = loader.load(&BoundingBox::new(0.0, 0.0, 1.0, 1.0)).unwrap();
        assert_eq!(chunk.elements.len(), 1);
        drop(loader);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_empty_loader() {
        let chunk = EmptyLoader
            .load(&BoundingBox::new(0.0, 0.0, 1.0, 1.0))
            .unwrap();
        assert!(chunk.is_empty());
    }
}
