//! Display geometries derived from map elements.

use crate::tiles::{BoundingBox, LatLon};

use super::types::{ElementKey, ElementType};

/// Geometry of an element as used for display.
///
/// Every variant carries a representative center, so an element whose full
/// shape cannot be computed (e.g. an incomplete relation) can still be placed
/// on the map.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementGeometry {
    /// A single coordinate
    Point { center: LatLon },
    /// One or more open lines
    Polylines {
        polylines: Vec<Vec<LatLon>>,
        center: LatLon,
    },
    /// One or more closed rings
    Polygons {
        polygons: Vec<Vec<LatLon>>,
        center: LatLon,
    },
}

impl ElementGeometry {
    #[inline]
    pub fn point(position: LatLon) -> Self {
        ElementGeometry::Point { center: position }
    }

    /// Representative center coordinate.
    pub fn center(&self) -> LatLon {
        match self {
            ElementGeometry::Point { center }
            | ElementGeometry::Polylines { center, .. }
            | ElementGeometry::Polygons { center, .. } => *center,
        }
    }

    /// Bounding box of every coordinate; the center for points or empty shapes.
    pub fn bounds(&self) -> BoundingBox {
        let center = self.center();
        let rings = match self {
            ElementGeometry::Point { .. } => None,
            ElementGeometry::Polylines { polylines, .. } => Some(polylines),
            ElementGeometry::Polygons { polygons, .. } => Some(polygons),
        };
        rings
            .and_then(|rings| BoundingBox::enclosing(rings.iter().flatten()))
            .unwrap_or(BoundingBox {
                min: center,
                max: center,
            })
    }
}

/// A geometry together with the key of the element it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementGeometryEntry {
    pub element_type: ElementType,
    pub element_id: i64,
    pub geometry: ElementGeometry,
}

impl ElementGeometryEntry {
    pub fn new(element_type: ElementType, element_id: i64, geometry: ElementGeometry) -> Self {
        Self {
            element_type,
            element_id,
            geometry,
        }
    }

    #[inline]
    pub fn key(&self) -> ElementKey {
        ElementKey::new(self.element_type, self.element_id)
    }
}
