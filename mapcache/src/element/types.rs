//! Map element data model: nodes, ways and relations.

use std::collections::HashMap;
use std::fmt;

use crate::tiles::LatLon;

/// Free-form `key=value` tags attached to an element.
pub type Tags = HashMap<String, String>;

/// Kind of map element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementType {
    /// Single coordinate
    Node,
    /// Ordered sequence of node references
    Way,
    /// Collection of typed member references with roles
    Relation,
}

impl ElementType {
    /// Lowercase name as used in `type/id` notation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Node => "node",
            ElementType::Way => "way",
            ElementType::Relation => "relation",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed element identifier; ids are unique per [`ElementType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementKey {
    pub element_type: ElementType,
    pub id: i64,
}

impl ElementKey {
    #[inline]
    pub const fn new(element_type: ElementType, id: i64) -> Self {
        Self { element_type, id }
    }

    #[inline]
    pub const fn node(id: i64) -> Self {
        Self::new(ElementType::Node, id)
    }

    #[inline]
    pub const fn way(id: i64) -> Self {
        Self::new(ElementType::Way, id)
    }

    #[inline]
    pub const fn relation(id: i64) -> Self {
        Self::new(ElementType::Relation, id)
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.element_type, self.id)
    }
}

/// A point on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: i64,
    pub position: LatLon,
    pub tags: Tags,
    pub version: i32,
}

impl Node {
    pub fn new(id: i64, position: LatLon) -> Self {
        Self {
            id,
            position,
            tags: Tags::new(),
            version: 1,
        }
    }

    #[inline]
    pub fn key(&self) -> ElementKey {
        ElementKey::node(self.id)
    }
}

/// An ordered list of nodes forming a line or, if closed, an area.
///
/// Node ids may repeat (closed ways, self-intersections).
#[derive(Debug, Clone, PartialEq)]
pub struct Way {
    pub id: i64,
    pub node_ids: Vec<i64>,
    pub tags: Tags,
    pub version: i32,
}

impl Way {
    pub fn new(id: i64, node_ids: Vec<i64>) -> Self {
        Self {
            id,
            node_ids,
            tags: Tags::new(),
            version: 1,
        }
    }

    #[inline]
    pub fn key(&self) -> ElementKey {
        ElementKey::way(self.id)
    }

    /// True if the first and last node are the same.
    pub fn is_closed(&self) -> bool {
        self.node_ids.len() >= 3 && self.node_ids.first() == self.node_ids.last()
    }
}

/// A reference from a relation to one of its members.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationMember {
    pub element_type: ElementType,
    pub ref_id: i64,
    pub role: String,
}

impl RelationMember {
    pub fn new(element_type: ElementType, ref_id: i64, role: impl Into<String>) -> Self {
        Self {
            element_type,
            ref_id,
            role: role.into(),
        }
    }

    #[inline]
    pub fn key(&self) -> ElementKey {
        ElementKey::new(self.element_type, self.ref_id)
    }
}

/// A named collection of members (nodes, ways or other relations).
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub id: i64,
    pub members: Vec<RelationMember>,
    pub tags: Tags,
    pub version: i32,
}

impl Relation {
    pub fn new(id: i64, members: Vec<RelationMember>) -> Self {
        Self {
            id,
            members,
            tags: Tags::new(),
            version: 1,
        }
    }

    #[inline]
    pub fn key(&self) -> ElementKey {
        ElementKey::relation(self.id)
    }
}

/// Any map element.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Node(Node),
    Way(Way),
    Relation(Relation),
}

impl Element {
    pub fn key(&self) -> ElementKey {
        match self {
            Element::Node(n) => n.key(),
            Element::Way(w) => w.key(),
            Element::Relation(r) => r.key(),
        }
    }

    #[inline]
    pub fn element_type(&self) -> ElementType {
        self.key().element_type
    }

    #[inline]
    pub fn id(&self) -> i64 {
        self.key().id
    }

    pub fn tags(&self) -> &Tags {
        match self {
            Element::Node(n) => &n.tags,
            Element::Way(w) => &w.tags,
            Element::Relation(r) => &r.tags,
        }
    }

    pub fn version(&self) -> i32 {
        match self {
            Element::Node(n) => n.version,
            Element::Way(w) => w.version,
            Element::Relation(r) => r.version,
        }
    }
}

impl From<Node> for Element {
    fn from(node: Node) -> Self {
        Element::Node(node)
    }
}

impl From<Way> for Element {
    fn from(way: Way) -> Self {
        Element::Way(way)
    }
}

impl From<Relation> for Element {
    fn from(relation: Relation) -> Self {
        Element::Relation(relation)
    }
}

/// Conversion between a concrete element shape and the [`Element`] enum.
///
/// Lets the cache run one fetch-through implementation for `Element`,
/// `Node`, `Way` and `Relation` results.
pub trait ElementKind: Clone {
    /// Key of this element.
    fn element_key(&self) -> ElementKey;

    /// Borrow this shape out of an element, if it is one.
    fn from_element(element: &Element) -> Option<&Self>;

    fn into_element(self) -> Element;
}

impl ElementKind for Element {
    fn element_key(&self) -> ElementKey {
        self.key()
    }

    fn from_element(element: &Element) -> Option<&Self> {
        Some(element)
    }

    fn into_element(self) -> Element {
        self
    }
}

impl ElementKind for Node {
    fn element_key(&self) -> ElementKey {
        self.key()
    }

    fn from_element(element: &Element) -> Option<&Self> {
        match element {
            Element::Node(n) => Some(n),
            _ => None,
        }
    }

    fn into_element(self) -> Element {
        Element::Node(self)
    }
}

impl ElementKind for Way {
    fn element_key(&self) -> ElementKey {
        self.key()
    }

    fn from_element(element: &Element) -> Option<&Self> {
        match element {
            Element::Way(w) => Some(w),
            _ => None,
        }
    }

    fn into_element(self) -> Element {
        Element::Way(self)
    }
}

impl ElementKind for Relation {
    fn element_key(&self) -> ElementKey {
        self.key()
    }

    fn from_element(element: &Element) -> Option<&Self> {
        match element {
            Element::Relation(r) => Some(r),
            _ => None,
        }
    }

    fn into_element(self) -> Element {
        Element::Relation(self)
    }
}
