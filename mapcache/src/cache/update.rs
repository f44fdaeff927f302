//! Batched changes applied through [`MapDataCache::update`](super::MapDataCache::update).

use crate::element::{Element, ElementGeometryEntry, ElementKey};
use crate::tiles::BoundingBox;

/// A set of upserts and deletions applied to the cache in one step.
///
/// When `bbox` is set the batch claims to be the complete node set of that
/// area: the enclosing tiles become authoritative and stored nodes there
/// that are not part of the batch are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateBatch {
    pub updated_elements: Vec<Element>,
    pub updated_geometries: Vec<ElementGeometryEntry>,
    pub deleted_keys: Vec<ElementKey>,
    pub bbox: Option<BoundingBox>,
}

impl UpdateBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_elements(mut self, elements: impl IntoIterator<Item = Element>) -> Self {
        self.updated_elements.extend(elements);
        self
    }

    pub fn with_geometries(
        mut self,
        geometries: impl IntoIterator<Item = ElementGeometryEntry>,
    ) -> Self {
        self.updated_geometries.extend(geometries);
        self
    }

    pub fn with_deleted(mut self, keys: impl IntoIterator<Item = ElementKey>) -> Self {
        self.deleted_keys.extend(keys);
        self
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.updated_elements.is_empty()
            && self.updated_geometries.is_empty()
            && self.deleted_keys.is_empty()
            && self.bbox.is_none()
    }
}
