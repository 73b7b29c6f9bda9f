//! bpindex - An in-memory B+ tree index with range cursors.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           bpindex                               │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │        Watch Layer (watch.rs)  [optional wrapper]       │   │
//! │  │     WatchedBptree: last-modified stamp + notifications  │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                 Tree Engine (tree/)                     │   │
//! │  │   Bptree  →  descent path  →  split / redistribute /    │   │
//! │  │              merge, repaired bottom-up                  │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │            Cursor Layer (tree/cursor.rs)                │   │
//! │  │   SearchResult: offset / range / bounded-range scans    │   │
//! │  │        walking the doubly-linked leaf chain             │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │             Node Arena (tree/arena.rs)                  │   │
//! │  │     slab of Node slots addressed by NodeId handles      │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`record`] - The [`Record`] trait tying stored values to ordered keys
//! - [`tree`] - The B+ tree engine, its cursors and the leaf dump
//! - [`watch`] - Modification stamping and watcher notification
//! - [`error`] - The crate-wide [`Error`] type and [`Result`] alias
//!
//! # Quick Start
//! ```
//! use bpindex::{Bptree, Direction};
//!
//! // Fan-out 8, depth bound 4, duplicate keys rejected.
//! let tree: Bptree<i64> = Bptree::new(8, 4, false).unwrap();
//! for v in [10, 20, 30, 40, 50] {
//!     tree.insert(v).unwrap();
//! }
//!
//! // Exact lookup anchors a cursor; offsets walk the ordered data.
//! let cursor = tree.search(&30).unwrap().unwrap();
//! assert_eq!(cursor.elem_at(1), Some(40));
//!
//! // Nearest-neighbor lookup lands next to an absent key.
//! let (cursor, exact) = tree.search_nearby(&35, Direction::ToLeft).unwrap();
//! assert!(!exact);
//! assert_eq!(*cursor.elem(), 30);
//!
//! // Bounded range scan from the anchor toward a key.
//! let (elems, n) = cursor.elem_range_to(&50, Direction::ToRight, 100);
//! assert_eq!(elems, vec![30, 40, 50]);
//! assert_eq!(n, 3);
//! ```

pub mod error;
pub mod record;
pub mod tree;
pub mod watch;

pub use error::{Error, Result};
pub use record::Record;
pub use tree::{dump_tree, Bptree, Direction, SearchResult};
pub use watch::WatchedBptree;
