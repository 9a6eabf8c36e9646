//! Key projections: what a [`Comparator`](super::Comparator) gets to compare.
//!
//! The key is computed once, when the item is pulled from its source, and stored next to it
//! in the candidate. [`Identity`] stores nothing and lets the comparator see the item.

use core::convert::Infallible;

use crate::error::BoxError;

/// Maps an item to the value its ordering is decided by.
pub trait Projection<T> {
    /// Stored alongside every candidate
    type Key;
    /// What the comparator sees
    type Target: ?Sized;
    /// Error of the key function
    type Error: Into<BoxError>;

    /// `false` only for [`Identity`]. Checkpoints of projecting merges must carry keys,
    /// checkpoints of non-projecting ones must not.
    const PROJECTS: bool;

    /// Key of a candidate restored from a checkpoint that carries none.
    ///
    /// Only projections without `PROJECTS` can come up with one.
    fn implicit_key() -> Option<Self::Key> {
        None
    }

    /// Computes the key for a freshly pulled item
    fn project(&self, item: &T) -> Result<Self::Key, Self::Error>;

    /// Selects the compared value out of a candidate
    fn target<'a>(item: &'a T, key: &'a Self::Key) -> &'a Self::Target;
}

/// No key function: items are compared directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl<T> Projection<T> for Identity {
    type Key = ();
    type Target = T;
    type Error = Infallible;

    const PROJECTS: bool = false;

    #[inline]
    fn implicit_key() -> Option<()> {
        Some(())
    }

    #[inline]
    fn project(&self, _item: &T) -> Result<(), Infallible> {
        Ok(())
    }

    #[inline]
    fn target<'a>(item: &'a T, _key: &'a ()) -> &'a T {
        item
    }
}

/// Projection with an infallible key function
///
/// Construct via [`by_key`](crate::Merged::by_key)
#[derive(Debug, Clone)]
pub struct ByKey<F>(pub(crate) F);

impl<T, F, K> Projection<T> for ByKey<F>
where
    F: Fn(&T) -> K,
{
    type Key = K;
    type Target = K;
    type Error = Infallible;

    const PROJECTS: bool = true;

    fn project(&self, item: &T) -> Result<K, Infallible> {
        Ok(self.0(item))
    }

    #[inline]
    fn target<'a>(_item: &'a T, key: &'a K) -> &'a K {
        key
    }
}

/// Projection with a fallible key function
///
/// Construct via [`try_by_key`](crate::Merged::try_by_key)
#[derive(Debug, Clone)]
pub struct TryByKey<F>(pub(crate) F);

impl<T, F, K, E> Projection<T> for TryByKey<F>
where
    F: Fn(&T) -> Result<K, E>,
    E: Into<BoxError>,
{
    type Key = K;
    type Target = K;
    type Error = E;

    const PROJECTS: bool = true;

    fn project(&self, item: &T) -> Result<K, E> {
        self.0(item)
    }

    #[inline]
    fn target<'a>(_item: &'a T, key: &'a K) -> &'a K {
        key
    }
}
