//! Ordered child container operations.
//!
//! Every node keeps its children sorted by key; these operations are the
//! only way child lists are searched and mutated. They live on [`Arena`]
//! because comparing an internal node's entries requires deriving child
//! keys through the arena. O(log n) comparisons, O(n) data movement, no
//! side effects beyond the touched node.

use crate::error::{Error, Result};
use crate::record::Record;
use crate::tree::arena::{Arena, NodeId};
use crate::tree::node::Entry;

impl<R: Record> Arena<R> {
    /// Binary search: the first index whose entry key compares greater than
    /// or equal to `key`, plus an exact-match flag.
    ///
    /// With duplicate keys the index lands on the first entry of the run.
    pub(crate) fn find(&self, entries: &[Entry<R>], key: &R::Key) -> (usize, bool) {
        let mut lo = 0;
        let mut hi = entries.len();

        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if entries[mid].key_in(self) < *key {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }

        let equal = lo < entries.len() && entries[lo].key_in(self) == *key;
        (lo, equal)
    }

    /// Insert an entry into a node's child list, preserving order.
    ///
    /// Rejects with [`Error::Overlapped`] when an exact match exists and
    /// duplicate keys are disallowed. An entry sorting past the end is
    /// appended without the overlap check, since nothing can match there.
    pub(crate) fn insert_entry(
        &mut self,
        id: NodeId,
        entry: Entry<R>,
        allow_overlap: bool,
    ) -> Result<()> {
        let key = entry.key_in(self);
        let (idx, equal) = {
            let node = self.node(id);
            self.find(&node.children, &key)
        };

        let node = self.node_mut(id);

        if idx >= node.children.len() {
            node.children.push(entry);
            return Ok(());
        }

        if equal && !allow_overlap {
            return Err(Error::Overlapped);
        }

        node.children.insert(idx, entry);
        Ok(())
    }

    /// Delete the entry matching `key` exactly; reports whether one existed.
    ///
    /// When the deletion empties the node, the deleted key is cached as the
    /// node's placeholder so the node remains locatable by its parent.
    pub(crate) fn delete_entry(&mut self, id: NodeId, key: &R::Key) -> bool {
        let (idx, equal) = {
            let node = self.node(id);
            self.find(&node.children, key)
        };

        if !equal {
            return false;
        }

        let node = self.node_mut(id);
        node.children.remove(idx);

        if node.children.is_empty() {
            node.spare_key = Some(key.clone());
        }

        true
    }

    /// Remove a child node's entry from its parent, located by identity.
    ///
    /// Identity lookup sidesteps the ambiguity of key lookup when duplicate
    /// keys span a node boundary (two siblings can derive the same minimal
    /// key). Placeholder semantics match [`Arena::delete_entry`].
    pub(crate) fn remove_child(&mut self, parent_id: NodeId, child_id: NodeId) -> bool {
        let pos = self
            .node(parent_id)
            .children
            .iter()
            .position(|entry| entry.child_id() == Some(child_id));

        let Some(pos) = pos else {
            return false;
        };

        let child_key = self.node_key(child_id);

        let parent = self.node_mut(parent_id);
        parent.children.remove(pos);

        if parent.children.is_empty() {
            parent.spare_key = Some(child_key);
        }

        true
    }
}
