//! The record contract: what the tree requires of user payloads.

use std::fmt;

/// A user payload the tree can index.
///
/// The tree never inspects a record beyond its key. Keys are opaque,
/// totally-ordered values; every ordering decision inside the tree goes
/// through `Ord::cmp` on [`Record::Key`], whose `Ordering::{Less, Equal,
/// Greater}` result is the three-way comparison of the key contract.
///
/// Records are `Clone` because cursor range extraction returns owned runs
/// of records rather than borrows into the locked tree.
///
/// # Example
/// ```
/// use bpindex::Record;
///
/// #[derive(Clone)]
/// struct User {
///     id: u64,
///     name: String,
/// }
///
/// impl Record for User {
///     type Key = u64;
///
///     fn key(&self) -> u64 {
///         self.id
///     }
/// }
/// ```
pub trait Record: Clone {
    /// The totally-ordered key type this record exposes.
    type Key: Ord + Clone + fmt::Debug;

    /// The key under which this record is indexed.
    fn key(&self) -> Self::Key;
}

/// Primitive integers index themselves.
macro_rules! impl_record_for_int {
    ($($t:ty),*) => {
        $(
            impl Record for $t {
                type Key = $t;

                #[inline]
                fn key(&self) -> $t {
                    *self
                }
            }
        )*
    };
}

impl_record_for_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

/// A `(key, value)` pair is indexed by its first component.
impl<K, V> Record for (K, V)
where
    K: Ord + Clone + fmt::Debug,
    V: Clone,
{
    type Key = K;

    #[inline]
    fn key(&self) -> K {
        self.0.clone()
    }
}
