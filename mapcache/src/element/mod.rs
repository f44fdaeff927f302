//! Map element data model
//!
//! Elements are identified by an [`ElementKey`] (type + id). Nodes carry a
//! position, ways reference nodes and relations reference any element with a
//! role. Geometries are the display shapes derived from elements.

mod geometry;
mod map_data;
mod types;

pub use geometry::{ElementGeometry, ElementGeometryEntry};
pub use map_data::MapDataWithGeometry;
pub use types::{
    Element, ElementKey, ElementKind, ElementType, Node, Relation, RelationMember, Tags, Way,
};
