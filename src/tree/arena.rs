//! Node arena: stable handles for tree nodes.
//!
//! All nodes live in one slab owned by the tree core. Parent child lists
//! and sibling links store [`NodeId`] handles instead of references, so the
//! bidirectional leaf chain carries no ownership and freeing a node never
//! dangles: a stale handle simply resolves to `None`.

use std::fmt;

use crate::record::Record;
use crate::tree::node::Node;

/// Handle to a node slot in the [`Arena`].
///
/// Using `usize` because:
/// 1. Nodes are stored in `Vec<Option<Node>>`
/// 2. Direct indexing without casting: `slots[id.0]`
/// 3. Matches Rust idioms for array/vector indexing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(pub(crate) usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

/// Slab of nodes with a free list.
///
/// Freed slots are reused by later allocations. A cursor holding a
/// [`NodeId`] across a mutation may therefore observe a relocated node or
/// none at all; that is the documented cursor consistency hazard, and
/// callers on the read path must go through [`Arena::get`].
pub(crate) struct Arena<R: Record> {
    slots: Vec<Option<Node<R>>>,
    free: Vec<usize>,
}

impl<R: Record> Arena<R> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Place a node into a slot, reusing a freed one if available.
    pub(crate) fn alloc(&mut self, node: Node<R>) -> NodeId {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                NodeId(idx)
            }
            None => {
                self.slots.push(Some(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    /// Free a node slot for reuse.
    pub(crate) fn release(&mut self, id: NodeId) {
        debug_assert!(self.slots[id.0].is_some(), "double release of {id}");
        self.slots[id.0] = None;
        self.free.push(id.0);
    }

    /// Checked lookup; `None` for freed or never-allocated slots.
    pub(crate) fn get(&self, id: NodeId) -> Option<&Node<R>> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    /// Lookup on the mutation path, where the handle must be live.
    ///
    /// # Panics
    /// Panics on a stale handle: mutation code only holds handles it owns
    /// through the parent child lists, so a miss is structural corruption.
    pub(crate) fn node(&self, id: NodeId) -> &Node<R> {
        self.get(id)
            .unwrap_or_else(|| panic!("stale node handle {id} on mutation path"))
    }

    /// Mutable lookup on the mutation path.
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node<R> {
        self.slots
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .unwrap_or_else(|| panic!("stale node handle {id} on mutation path"))
    }

    /// Number of live nodes (test/diagnostic use).
    #[cfg(test)]
    pub(crate) fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}
