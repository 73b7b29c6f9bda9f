//! Modification tracking around a tree.
//!
//! [`WatchedBptree`] wraps a [`Bptree`] and stamps every *successful*
//! mutation with a wall-clock time, waking registered watchers. Failed
//! mutations leave both the stamp and the watchers untouched. Read
//! operations pass straight through via [`Deref`].

use std::ops::Deref;
use std::sync::mpsc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;
use parking_lot::{Mutex, RwLock};

use crate::error::Result;
use crate::record::Record;
use crate::tree::Bptree;

fn unix_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos() as i64)
}

/// A [`Bptree`] that remembers when it last changed and notifies watchers.
///
/// Notification is fire and forget: a watcher that has gone away is pruned
/// on the next mutation, and a slow watcher never blocks the mutating
/// caller (the channels are unbounded).
pub struct WatchedBptree<R: Record> {
    tree: Bptree<R>,
    /// Unix nanoseconds of the last successful mutation; `-1` before any.
    last_modified: RwLock<i64>,
    watchers: Mutex<Vec<mpsc::Sender<()>>>,
}

impl<R: Record> WatchedBptree<R> {
    /// Create an empty watched tree; parameters as in [`Bptree::new`].
    pub fn new(max_degree: usize, max_depth: usize, allow_overlap: bool) -> Result<Self> {
        Ok(Self {
            tree: Bptree::new(max_degree, max_depth, allow_overlap)?,
            last_modified: RwLock::new(-1),
            watchers: Mutex::new(Vec::new()),
        })
    }

    /// Register a watcher; the receiver gets one `()` per successful
    /// mutation from this point on.
    pub fn add_watch(&self) -> mpsc::Receiver<()> {
        let (tx, rx) = mpsc::channel();
        self.watchers.lock().push(tx);
        rx
    }

    /// Unix nanoseconds of the last successful mutation, `-1` if none yet.
    pub fn last_modified(&self) -> i64 {
        *self.last_modified.read()
    }

    /// Insert a record; stamps and notifies only on success.
    pub fn insert(&self, elem: R) -> Result<()> {
        self.tree.insert(elem)?;
        self.touch();
        Ok(())
    }

    /// Remove a record; stamps and notifies only on success.
    pub fn remove(&self, key: &R::Key) -> Result<()> {
        self.tree.remove(key)?;
        self.touch();
        Ok(())
    }

    fn touch(&self) {
        *self.last_modified.write() = unix_nanos();

        let mut watchers = self.watchers.lock();
        let before = watchers.len();
        watchers.retain(|tx| tx.send(()).is_ok());
        if watchers.len() < before {
            debug!("pruned {} disconnected watcher(s)", before - watchers.len());
        }
    }
}

impl<R: Record> Deref for WatchedBptree<R> {
    type Target = Bptree<R>;

    fn deref(&self) -> &Self::Target {
        &self.tree
    }
}
