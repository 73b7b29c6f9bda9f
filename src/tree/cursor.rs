//! Range cursors over the leaf sibling chain.
//!
//! A [`SearchResult`] anchors a position inside one leaf and extracts
//! ordered runs of records around it, walking the doubly-linked leaf chain
//! whenever a run crosses a node boundary. Every range call re-acquires
//! the tree guard in shared mode on its own: the cursor is a
//! snapshot-position handle, not a consistency boundary (see
//! [`Bptree`](crate::Bptree)).

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::record::Record;
use crate::tree::arena::{Arena, NodeId};
use crate::tree::node::{Entry, Node};
use crate::tree::TreeCore;

/// Scan direction along the ordered key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ToLeft,
    ToRight,
}

/// A cursor into a leaf position, produced by
/// [`Bptree::search`](crate::Bptree::search) and
/// [`Bptree::search_nearby`](crate::Bptree::search_nearby).
///
/// The cursor keeps its own reference to the tree guard and holds a clone
/// of the anchor record taken at lookup time. If the tree is mutated
/// before a range call, the call observes the tree's *current* state: a
/// node that was merged or freed in the meantime resolves to nothing and
/// the run simply ends (or contains only the cached anchor).
pub struct SearchResult<R: Record> {
    core: Arc<RwLock<TreeCore<R>>>,
    node: NodeId,
    index: usize,
    anchor: R,
}

impl<R: Record> SearchResult<R> {
    pub(crate) fn new(
        core: Arc<RwLock<TreeCore<R>>>,
        node: NodeId,
        index: usize,
        anchor: R,
    ) -> Self {
        Self {
            core,
            node,
            index,
            anchor,
        }
    }

    /// The record this cursor was anchored at, as of lookup time.
    pub fn elem(&self) -> &R {
        &self.anchor
    }

    /// The record `offset` positions to the right (positive) or left
    /// (negative) of the anchor; `0` returns the anchor itself.
    ///
    /// Returns `None` when the offset walks past either end of the leaf
    /// chain.
    pub fn elem_at(&self, offset: isize) -> Option<R> {
        if offset == 0 {
            return Some(self.anchor.clone());
        }

        let core = self.core.read();
        let arena = &core.arena;

        let to_right = offset > 0;
        let mut remaining = offset.unsigned_abs();

        let (mut node, mut window) = self.first_window(arena, to_right)?;

        while remaining > window.len() {
            remaining -= window.len();

            let hop = if to_right { node.next } else { node.prev };
            node = arena.get(hop?)?;
            window = &node.children;
        }

        let entry = if to_right {
            &window[remaining - 1]
        } else {
            &window[window.len() - remaining]
        };
        entry.record().cloned()
    }

    /// The inclusive contiguous run between the anchor and the record
    /// `offset` positions away; the sign picks the direction and the
    /// anchor is always included.
    ///
    /// Truncates silently where the leaf chain ends; the returned count is
    /// the number of records actually obtained.
    pub fn elem_range(&self, offset: isize) -> (Vec<R>, usize) {
        let core = self.core.read();
        let arena = &core.arena;

        let mut elems = vec![self.live_anchor(arena)];
        let mut n = 1usize;

        if offset == 0 {
            return (elems, n);
        }

        let to_right = offset > 0;
        let mut remaining = offset.unsigned_abs();

        let Some((mut node, mut window)) = self.first_window(arena, to_right) else {
            return (elems, n);
        };

        while remaining > window.len() {
            remaining -= window.len();

            let recs = records_of(window);
            n += recs.len();
            if to_right {
                elems.extend(recs);
            } else {
                elems.splice(0..0, recs);
            }

            let hop = if to_right { node.next } else { node.prev };
            let Some(hop) = hop else {
                return (elems, n);
            };
            let Some(next) = arena.get(hop) else {
                return (elems, n);
            };
            node = next;
            window = &node.children;
        }

        let seg = if to_right {
            &window[..remaining]
        } else {
            &window[window.len() - remaining..]
        };
        let recs = records_of(seg);
        n += recs.len();
        if to_right {
            elems.extend(recs);
        } else {
            elems.splice(0..0, recs);
        }

        (elems, n)
    }

    /// Accumulate records from the anchor toward `key` until one of:
    /// the boundary is crossed (an exact match on the boundary is included,
    /// then scanning stops), `max_n` records have been collected, or the
    /// leaf chain is exhausted. The anchor is always included.
    pub fn elem_range_to(&self, key: &R::Key, direction: Direction, max_n: usize) -> (Vec<R>, usize) {
        let core = self.core.read();
        let arena = &core.arena;

        let mut elems = vec![self.live_anchor(arena)];
        let mut n = 1usize;

        if n > max_n {
            return (elems, n);
        }

        let to_right = direction == Direction::ToRight;
        let Some((mut node, mut window)) = self.first_window(arena, to_right) else {
            return (elems, n);
        };

        loop {
            let (idx, equal) = arena.find(window, key);

            let mut exit = false;
            let mut copy_n = if to_right {
                if idx == window.len() {
                    window.len()
                } else {
                    exit = true;
                    if equal {
                        idx + 1
                    } else {
                        idx
                    }
                }
            } else if idx == 0 && !equal {
                window.len()
            } else {
                exit = true;
                window.len() - idx
            };

            if n + copy_n > max_n {
                copy_n = max_n - n;
                exit = true;
            }

            let seg = if to_right {
                &window[..copy_n]
            } else {
                &window[window.len() - copy_n..]
            };
            let recs = records_of(seg);
            n += recs.len();
            if to_right {
                elems.extend(recs);
            } else {
                elems.splice(0..0, recs);
            }

            if exit {
                return (elems, n);
            }

            let hop = if to_right { node.next } else { node.prev };
            let Some(hop) = hop else {
                return (elems, n);
            };
            let Some(next) = arena.get(hop) else {
                return (elems, n);
            };
            node = next;
            window = &node.children;
        }
    }

    /// The anchor as the current tree sees it, falling back to the cached
    /// copy when the anchored node has vanished underneath the cursor.
    fn live_anchor(&self, arena: &Arena<R>) -> R {
        arena
            .get(self.node)
            .and_then(|node| node.children.get(self.index))
            .and_then(Entry::record)
            .cloned()
            .unwrap_or_else(|| self.anchor.clone())
    }

    /// The first window of entries past the anchor in the given direction:
    /// the rest of the anchored leaf, or the whole adjacent leaf when the
    /// anchor sits at a boundary. `None` when the chain ends there or the
    /// anchored node no longer exists.
    fn first_window<'a>(
        &self,
        arena: &'a Arena<R>,
        to_right: bool,
    ) -> Option<(&'a Node<R>, &'a [Entry<R>])> {
        let anchor = arena.get(self.node)?;

        if to_right {
            if self.index + 1 >= anchor.children.len() {
                let node = arena.get(anchor.next?)?;
                Some((node, &node.children[..]))
            } else {
                Some((anchor, &anchor.children[self.index + 1..]))
            }
        } else if self.index == 0 {
            let node = arena.get(anchor.prev?)?;
            Some((node, &node.children[..]))
        } else {
            // index is clamped so a stale cursor cannot slice out of bounds
            let end = self.index.min(anchor.children.len());
            Some((anchor, &anchor.children[..end]))
        }
    }
}

impl<R: Record> fmt::Debug for SearchResult<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchResult")
            .field("node", &self.node)
            .field("index", &self.index)
            .field("anchor_key", &self.anchor.key())
            .finish()
    }
}

fn records_of<R: Record>(entries: &[Entry<R>]) -> Vec<R> {
    entries.iter().filter_map(|e| e.record().cloned()).collect()
}
