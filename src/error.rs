//! Error types for bpindex.

use thiserror::Error;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
/// This is a common Rust pattern (see `std::io::Result`).
pub type Result<T> = std::result::Result<T, Error>;

/// All expected, caller-recoverable failure conditions of the index.
///
/// Structural invariant violations (a merge that would exceed a node's
/// occupancy bound, a parent missing the entry for a child it supports)
/// are *not* represented here: they indicate a bug in the tree itself and
/// panic instead of returning, since continuing would corrupt the index.
#[derive(Debug, Error)]
pub enum Error {
    /// Operation invoked on a tree handle that was never constructed.
    ///
    /// Unreachable through [`Bptree::new`](crate::Bptree::new); retained so
    /// callers matching the full failure taxonomy stay exhaustive.
    #[error("tree is not initialized")]
    NotInitialized,

    /// `max_degree` passed to the constructor was below the minimum of 3.
    #[error("max degree must be at least 3, got {0}")]
    InvalidMaxDegree(usize),

    /// Operation requires an existing root and none exists.
    #[error("tree is empty")]
    Empty,

    /// Exact-match lookup or removal found no entry for the key.
    #[error("element not found")]
    NotFound,

    /// Insertion of a duplicate key while duplicates are disallowed.
    #[error("element overlapped")]
    Overlapped,

    /// Insertion would grow (or the tree has already grown) beyond the
    /// configured depth bound.
    #[error("tree exceeded its maximum depth")]
    ExceededMaxDepth,

    /// Nearest-neighbor search ran off the right end of the ordered data.
    #[error("search ran past the last element")]
    SearchOverflowed,

    /// Nearest-neighbor search ran off the left end of the ordered data.
    #[error("search ran past the first element")]
    SearchUnderflowed,

    /// I/O error from writing a diagnostic dump to a sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
