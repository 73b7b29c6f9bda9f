//! Diagnostic dump of the leaf chain.

use std::io::Write;

use crate::error::{Error, Result};
use crate::record::Record;
use crate::tree::Bptree;

/// Write every leaf to `out`, left to right, one `leaf --- {i}` header per
/// leaf followed by its record keys, one per tab-indented line.
///
/// The output is a linearization of the bottom level only; it is meant for
/// eyeballing leaf occupancy and chain order after a test scenario, not
/// for persistence.
///
/// # Errors
/// - [`Error::Empty`] when the tree has no root
/// - [`Error::Io`] when `out` rejects a write
pub fn dump_tree<R, W>(tree: &Bptree<R>, out: &mut W) -> Result<()>
where
    R: Record,
    W: Write,
{
    let core = tree.core.read();

    let Some(mut id) = core.root else {
        return Err(Error::Empty);
    };

    loop {
        let node = core.arena.node(id);
        if !node.is_internal {
            break;
        }
        id = node.children[0]
            .child_id()
            .expect("internal node must hold child entries");
    }

    let mut i = 0usize;
    let mut cursor = Some(id);
    while let Some(id) = cursor {
        let node = core.arena.node(id);

        writeln!(out, "leaf --- {i}")?;
        for entry in &node.children {
            if let Some(record) = entry.record() {
                writeln!(out, "\t{:?}", record.key())?;
            }
        }

        cursor = node.next;
        i += 1;
    }

    Ok(())
}
