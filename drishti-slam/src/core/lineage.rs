//! Trajectory identities and lineage views.
//!
//! A [`Lineage`] is the capability a hypothesis uses to read the shared map:
//! the ordered chain of path ids from its leaf back to the oldest
//! uncommitted ancestor. The map resolves a cell by choosing, among the
//! entries written by members of the lineage, the one closest to the leaf.

use std::collections::HashMap;

use super::arena::Handle;

/// Identity of a path node in the trajectory tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathId(Handle);

impl PathId {
    /// Wrap an arena handle.
    #[inline]
    pub fn new(handle: Handle) -> Self {
        Self(handle)
    }

    /// Underlying arena handle.
    #[inline]
    pub fn handle(&self) -> Handle {
        self.0
    }
}

/// Ordered ancestry of one hypothesis, leaf first.
#[derive(Clone, Debug, Default)]
pub struct Lineage {
    ids: Vec<PathId>,
    rank: HashMap<PathId, usize>,
}

impl Lineage {
    /// Build from path ids ordered leaf first.
    pub fn new(ids: Vec<PathId>) -> Self {
        let rank = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        Self { ids, rank }
    }

    /// Lineage that sees only the committed layer.
    pub fn committed_only() -> Self {
        Self::default()
    }

    /// Distance from the leaf (0 = leaf), or `None` if `id` is not an ancestor.
    #[inline]
    pub fn rank(&self, id: PathId) -> Option<usize> {
        self.rank.get(&id).copied()
    }

    /// True if `id` is part of this lineage.
    #[inline]
    pub fn contains(&self, id: PathId) -> bool {
        self.rank.contains_key(&id)
    }

    /// Leaf path id.
    pub fn leaf(&self) -> Option<PathId> {
        self.ids.first().copied()
    }

    /// Path ids, leaf first.
    pub fn ids(&self) -> &[PathId] {
        &self.ids
    }

    /// Number of uncommitted path nodes in the lineage.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True for the committed-only view.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Same lineage with the leaf dropped (the parent's view of the map).
    pub fn without_leaf(&self) -> Lineage {
        match self.ids.split_first() {
            Some((_, rest)) => Lineage::new(rest.to_vec()),
            None => Lineage::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::arena::Arena;

    fn ids(n: usize) -> Vec<PathId> {
        let mut arena = Arena::new();
        (0..n).map(|i| PathId::new(arena.insert(i))).collect()
    }

    #[test]
    fn test_rank_order() {
        let ids = ids(3);
        let lineage = Lineage::new(ids.clone());
        assert_eq!(lineage.leaf(), Some(ids[0]));
        assert_eq!(lineage.rank(ids[0]), Some(0));
        assert_eq!(lineage.rank(ids[2]), Some(2));
        assert_eq!(lineage.len(), 3);
    }

    #[test]
    fn test_without_leaf() {
        let ids = ids(3);
        let parent = Lineage::new(ids.clone()).without_leaf();
        assert!(!parent.contains(ids[0]));
        assert_eq!(parent.rank(ids[1]), Some(0));
        assert!(Lineage::committed_only().without_leaf().is_empty());
    }
}
