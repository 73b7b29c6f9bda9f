//! Tree nodes and their entries.
//!
//! A [`Node`] is the structural unit at one tree level: a leaf holds user
//! records, an internal node holds handles to the children one level down.
//! Nodes at the same level form a doubly-linked sibling chain through
//! `prev`/`next`; the leaf-level chain is what makes ordered range scans
//! across node boundaries possible.

use crate::record::Record;
use crate::tree::arena::{Arena, NodeId};

/// One slot of a node's ordered child list.
#[derive(Debug, Clone)]
pub(crate) enum Entry<R: Record> {
    /// A user record (leaf nodes only).
    Record(R),
    /// A handle to a child node (internal nodes only).
    Child(NodeId),
}

impl<R: Record> Entry<R> {
    pub(crate) fn record(&self) -> Option<&R> {
        match self {
            Entry::Record(r) => Some(r),
            Entry::Child(_) => None,
        }
    }

    pub(crate) fn child_id(&self) -> Option<NodeId> {
        match self {
            Entry::Record(_) => None,
            Entry::Child(id) => Some(*id),
        }
    }

    /// The key this entry sorts under: a record's own key, or the derived
    /// minimal key of a child subtree.
    pub(crate) fn key_in(&self, arena: &Arena<R>) -> R::Key {
        match self {
            Entry::Record(r) => r.key(),
            Entry::Child(id) => arena.node_key(*id),
        }
    }
}

/// A tree node at one level.
pub(crate) struct Node<R: Record> {
    /// Ordered child list, strictly ascending by key (non-decreasing when
    /// duplicate keys are permitted).
    pub(crate) children: Vec<Entry<R>>,

    /// Left sibling at the same level.
    pub(crate) prev: Option<NodeId>,

    /// Right sibling at the same level.
    pub(crate) next: Option<NodeId>,

    /// Discriminates record entries (leaf) from child entries (internal).
    pub(crate) is_internal: bool,

    /// 0 for a leaf; parent = child level + 1.
    pub(crate) level_from_leaf: usize,

    /// Placeholder key retained when the child list has just become empty,
    /// so a node pending removal by its parent can still be located by key.
    pub(crate) spare_key: Option<R::Key>,
}

impl<R: Record> Node<R> {
    pub(crate) fn new_leaf() -> Self {
        Self {
            children: Vec::new(),
            prev: None,
            next: None,
            is_internal: false,
            level_from_leaf: 0,
            spare_key: None,
        }
    }

    pub(crate) fn new_internal(level_from_leaf: usize) -> Self {
        Self {
            children: Vec::new(),
            prev: None,
            next: None,
            is_internal: true,
            level_from_leaf,
            spare_key: None,
        }
    }
}

impl<R: Record> Arena<R> {
    /// The derived key of a node: the minimal key of its leftmost
    /// descendant leaf, recomputed on demand.
    ///
    /// An emptied node (pending removal by its parent) reports its cached
    /// placeholder key instead, so in-flight lookups that still reference
    /// it do not fail outright.
    ///
    /// # Panics
    /// Panics if an empty node carries no placeholder, or if an internal
    /// node holds a record entry; both are structural corruption.
    pub(crate) fn node_key(&self, id: NodeId) -> R::Key {
        let mut node = self.node(id);

        loop {
            if node.children.is_empty() {
                return node
                    .spare_key
                    .clone()
                    .expect("empty node must retain a placeholder key");
            }

            if !node.is_internal {
                break;
            }

            let child = node.children[0]
                .child_id()
                .expect("internal node must hold child entries");
            node = self.node(child);
        }

        match &node.children[0] {
            Entry::Record(r) => r.key(),
            Entry::Child(_) => panic!("leaf node must hold record entries"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_key_is_first_record_key() {
        let mut arena: Arena<i64> = Arena::new();
        let mut leaf = Node::new_leaf();
        leaf.children.push(Entry::Record(7));
        leaf.children.push(Entry::Record(9));
        let id = arena.alloc(leaf);

        assert_eq!(arena.node_key(id), 7);
    }

    #[test]
    fn test_internal_key_descends_to_leftmost_leaf() {
        let mut arena: Arena<i64> = Arena::new();

        let mut left = Node::new_leaf();
        left.children.push(Entry::Record(3));
        let left_id = arena.alloc(left);

        let mut right = Node::new_leaf();
        right.children.push(Entry::Record(8));
        let right_id = arena.alloc(right);

        let mut parent = Node::new_internal(1);
        parent.children.push(Entry::Child(left_id));
        parent.children.push(Entry::Child(right_id));
        let parent_id = arena.alloc(parent);

        assert_eq!(arena.node_key(parent_id), 3);
    }

    #[test]
    fn test_emptied_node_reports_placeholder_key() {
        let mut arena: Arena<i64> = Arena::new();
        let mut leaf = Node::new_leaf();
        leaf.spare_key = Some(5);
        let id = arena.alloc(leaf);

        assert_eq!(arena.node_key(id), 5);
    }

    #[test]
    #[should_panic(expected = "placeholder key")]
    fn test_empty_node_without_placeholder_panics() {
        let mut arena: Arena<i64> = Arena::new();
        let id = arena.alloc(Node::new_leaf());
        arena.node_key(id);
    }
}
