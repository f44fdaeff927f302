//! Reverse reference indices.
//!
//! [`WaysByNodeIndex`] maps a node id to the ids of the ways using it, and
//! [`RelationsByElementIndex`] maps any element key to the ids of the
//! relations listing it as member.
//!
//! An entry only exists once it is known to be complete, either because the
//! referenced element lies in an authoritative tile or because the full
//! answer was fetched. Existing entries are patched on every change of a way
//! or relation; keys without an entry are left alone, since a partial entry
//! would be indistinguishable from a complete one.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::element::{ElementKey, Relation, Way};

/// Map from a referenced key to the set of ids referencing it.
#[derive(Debug, Clone)]
pub struct ReverseIndex<K> {
    entries: HashMap<K, HashSet<i64>>,
}

/// Node id → ids of ways having that node as vertex.
pub type WaysByNodeIndex = ReverseIndex<i64>;

/// Member key → ids of relations having that member (role ignored).
pub type RelationsByElementIndex = ReverseIndex<ElementKey>;

impl<K: Hash + Eq + Copy> Default for ReverseIndex<K> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Hash + Eq + Copy> ReverseIndex<K> {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, key: &K) -> Option<&HashSet<i64>> {
        self.entries.get(key)
    }

    /// Referencing ids sorted ascending, `None` if there is no entry.
    pub fn sorted(&self, key: &K) -> Option<Vec<i64>> {
        self.entries.get(key).map(|ids| {
            let mut ids: Vec<i64> = ids.iter().copied().collect();
            ids.sort_unstable();
            ids
        })
    }

    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Sets the complete entry for `key`, replacing any existing one.
    pub fn insert_entry(&mut self, key: K, ids: impl IntoIterator<Item = i64>) {
        self.entries.insert(key, ids.into_iter().collect());
    }

    /// Creates an empty entry unless one exists. Returns true if created.
    pub fn ensure_entry(&mut self, key: K) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, HashSet::new());
        true
    }

    pub fn remove_entry(&mut self, key: &K) -> Option<HashSet<i64>> {
        self.entries.remove(key)
    }

    /// Patches existing entries after `owner` changed its references from
    /// `old` to `new`.
    ///
    /// Entries that become empty are kept: they still answer "no references".
    pub fn on_references_changed(&mut self, owner: i64, old: &HashSet<K>, new: &HashSet<K>) {
        for key in old.difference(new) {
            if let Some(ids) = self.entries.get_mut(key) {
                ids.remove(&owner);
            }
        }
        for key in new {
            if let Some(ids) = self.entries.get_mut(key) {
                ids.insert(owner);
            }
        }
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&K) -> bool) {
        self.entries.retain(|key, _| keep(key));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl ReverseIndex<i64> {
    /// Patches node entries after a way was inserted, changed or deleted.
    ///
    /// `old` is the previously stored version, `new` is `None` on delete.
    pub fn on_way_changed(&mut self, way_id: i64, old: Option<&Way>, new: Option<&Way>) {
        self.on_references_changed(way_id, &vertex_set(old), &vertex_set(new));
    }

    /// Keeps only entries of nodes accepted by `keep`.
    pub fn retain_nodes(&mut self, keep: impl FnMut(&i64) -> bool) {
        self.retain(keep);
    }
}

impl ReverseIndex<ElementKey> {
    /// Patches member entries after a relation was inserted, changed or deleted.
    pub fn on_relation_changed(
        &mut self,
        relation_id: i64,
        old: Option<&Relation>,
        new: Option<&Relation>,
    ) {
        self.on_references_changed(relation_id, &member_set(old), &member_set(new));
    }

    /// Keeps only entries of element keys accepted by `keep`.
    pub fn retain_keys(&mut self, keep: impl FnMut(&ElementKey) -> bool) {
        self.retain(keep);
    }
}

fn vertex_set(way: Option<&Way>) -> HashSet<i64> {
    way.map(|w| w.node_ids.iter().copied().collect())
        .unwrap_or_default()
}

fn member_set(relation: Option<&Relation>) -> HashSet<ElementKey> {
    relation
        .map(|r| r.members.iter().map(|m| m.key()).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementType, RelationMember};
    use proptest::prelude::*;

    // =========================================================================
    // Ways by node
    // =========================================================================

    #[test]
    fn test_way_added_only_to_existing_entries() {
        let mut index = WaysByNodeIndex::new();
        index.ensure_entry(1);

        let way = Way::new(10, vec![1, 2]);
        index.on_way_changed(10, None, Some(&way));

        assert_eq!(index.sorted(&1), Some(vec![10]));
        assert!(!index.contains(&2));
    }

    #[test]
    fn test_way_vertex_change_moves_reference() {
        let mut index = WaysByNodeIndex::new();
        index.ensure_entry(1);
        index.ensure_entry(3);

        let old = Way::new(10, vec![1, 2]);
        let new = Way::new(10, vec![2, 3]);
        index.on_way_changed(10, None, Some(&old));
        index.on_way_changed(10, Some(&old), Some(&new));

        assert_eq!(index.sorted(&1), Some(vec![]));
        assert_eq!(index.sorted(&3), Some(vec![10]));
    }

    #[test]
    fn test_way_delete_keeps_empty_entry() {
        let mut index = WaysByNodeIndex::new();
        index.insert_entry(1, [10, 11]);

        let way = Way::new(10, vec![1]);
        index.on_way_changed(10, Some(&way), None);

        assert_eq!(index.sorted(&1), Some(vec![11]));

        let other = Way::new(11, vec![1]);
        index.on_way_changed(11, Some(&other), None);
        assert_eq!(index.sorted(&1), Some(vec![]));
    }

    #[test]
    fn test_repeated_vertices_counted_once() {
        let mut index = WaysByNodeIndex::new();
        index.ensure_entry(1);
        let closed = Way::new(10, vec![1, 2, 3, 1]);
        index.on_way_changed(10, None, Some(&closed));

        let open = Way::new(10, vec![1, 2, 3]);
        index.on_way_changed(10, Some(&closed), Some(&open));
        assert_eq!(index.sorted(&1), Some(vec![10]));
    }

    #[test]
    fn test_ensure_entry_keeps_existing() {
        let mut index = WaysByNodeIndex::new();
        index.insert_entry(1, [5]);
        assert!(!index.ensure_entry(1));
        assert!(index.ensure_entry(2));
        assert_eq!(index.sorted(&1), Some(vec![5]));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_retain_and_remove_entry() {
        let mut index = WaysByNodeIndex::new();
        index.insert_entry(1, [5]);
        index.insert_entry(2, [6]);
        index.retain_nodes(|id| *id == 2);

        assert!(!index.contains(&1));
        assert_eq!(index.remove_entry(&2).map(|s| s.len()), Some(1));
        assert!(index.is_empty());
    }

    // =========================================================================
    // Relations by element
    // =========================================================================

    #[test]
    fn test_relation_role_is_ignored() {
        let mut index = RelationsByElementIndex::new();
        index.ensure_entry(ElementKey::way(1));

        let old = Relation::new(7, vec![RelationMember::new(ElementType::Way, 1, "outer")]);
        let new = Relation::new(7, vec![RelationMember::new(ElementType::Way, 1, "inner")]);
        index.on_relation_changed(7, None, Some(&old));
        index.on_relation_changed(7, Some(&old), Some(&new));

        assert_eq!(index.sorted(&ElementKey::way(1)), Some(vec![7]));
    }

    #[test]
    fn test_relation_member_types_are_distinct() {
        let mut index = RelationsByElementIndex::new();
        index.ensure_entry(ElementKey::node(1));
        index.ensure_entry(ElementKey::way(1));

        let relation = Relation::new(7, vec![RelationMember::new(ElementType::Way, 1, "")]);
        index.on_relation_changed(7, None, Some(&relation));

        assert_eq!(index.sorted(&ElementKey::node(1)), Some(vec![]));
        assert_eq!(index.sorted(&ElementKey::way(1)), Some(vec![7]));
    }

    #[test]
    fn test_relation_delete() {
        let mut index = RelationsByElementIndex::new();
        index.insert_entry(ElementKey::relation(2), [7]);
        let relation = Relation::new(7, vec![RelationMember::new(ElementType::Relation, 2, "")]);
        index.on_relation_changed(7, Some(&relation), None);

        assert_eq!(index.sorted(&ElementKey::relation(2)), Some(vec![]));
        index.retain_keys(|key| key.element_type != ElementType::Relation);
        assert!(index.is_empty());
    }

    // =========================================================================
    // Property tests
    // =========================================================================

    #[derive(Debug, Clone)]
    enum WayOp {
        Upsert(i64, Vec<i64>),
        Delete(i64),
    }

    fn way_op() -> impl Strategy<Value = WayOp> {
        prop_oneof![
            (0i64..6, prop::collection::vec(0i64..10, 0..6))
                .prop_map(|(id, nodes)| WayOp::Upsert(id, nodes)),
            (0i64..6).prop_map(WayOp::Delete),
        ]
    }

    proptest! {
        /// Incremental patching equals recomputing the index from the final ways.
        #[test]
        fn prop_ways_by_node_matches_recomputation(
            tracked in prop::collection::hash_set(0i64..10, 0..10),
            ops in prop::collection::vec(way_op(), 0..40),
        ) {
            let mut index = WaysByNodeIndex::new();
            for node in &tracked {
                index.ensure_entry(*node);
            }

            let mut ways: HashMap<i64, Way> = HashMap::new();
            for op in ops {
                match op {
                    WayOp::Upsert(id, nodes) => {
                        let way = Way::new(id, nodes);
                        let old = ways.insert(id, way.clone());
                        index.on_way_changed(id, old.as_ref(), Some(&way));
                    }
                    WayOp::Delete(id) => {
                        let old = ways.remove(&id);
                        index.on_way_changed(id, old.as_ref(), None);
                    }
                }
            }

            for node in &tracked {
                let mut expected: Vec<i64> = ways
                    .values()
                    .filter(|w| w.node_ids.contains(node))
                    .map(|w| w.id)
                    .collect();
                expected.sort_unstable();
                prop_assert_eq!(index.sorted(node), Some(expected));
            }
            prop_assert_eq!(index.len(), tracked.len());
        }
    }
}
