//! Per-element-type caching policy.

use crate::element::ElementType;

/// How fetched elements of a type are treated by the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Only stored when the containing tile is authoritative; fetched
    /// results are returned without being kept.
    Ephemeral,
    /// Stored whenever seen; fetched once, then served from the store.
    Persistent,
}

impl CachePolicy {
    pub fn for_type(element_type: ElementType) -> Self {
        match element_type {
            ElementType::Node => CachePolicy::Ephemeral,
            ElementType::Way | ElementType::Relation => CachePolicy::Persistent,
        }
    }

    /// Whether fetched results are kept.
    #[inline]
    pub fn persists(self) -> bool {
        self == CachePolicy::Persistent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_per_type() {
        assert_eq!(
            CachePolicy::for_type(ElementType::Node),
            CachePolicy::Ephemeral
        );
        assert!(CachePolicy::for_type(ElementType::Way).persists());
        assert!(CachePolicy::for_type(ElementType::Relation).persists());
    }
}
