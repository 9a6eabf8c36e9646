//! Sources: the input sequences of a merge.
//!
//! Every [`Iterator`] is a [`Source`] that never fails. Use [`TryIter`] for iterators
//! yielding [`Result`]s, and [`VecCursor`] when the merge has to be checkpointed:
//! checkpoints store the sources themselves, so they have to be `Clone` (for
//! [`MergeIter::checkpoint`](crate::MergeIter::checkpoint)) and usually serializable.

use core::convert::Infallible;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::BoxError;

/// A single-pass, pull-based input sequence.
///
/// `Ok(None)` means the source is exhausted. After that the source is dropped by the merge
/// and never pulled again.
pub trait Source {
    /// Items produced by this source
    type Item;
    /// Error produced by [`pull`](Source::pull)
    type Error: Into<BoxError>;

    /// Pulls the next item
    fn pull(&mut self) -> Result<Option<Self::Item>, Self::Error>;

    /// Estimates how many items are left
    fn remaining(&self) -> Result<usize, BoxError>;

    /// Number of items the source is certain to produce, `0` if unknown
    #[inline]
    fn min_remaining(&self) -> usize {
        0
    }
}

/// Source has no upper bound on its length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("length of the source is unbounded or unknown")]
pub struct UnknownLength;

/// Upper bound of the [`size_hint`](Iterator::size_hint), or [`UnknownLength`]
fn iter_remaining<I: Iterator>(iter: &I) -> Result<usize, BoxError> {
    iter.size_hint().1.ok_or_else(|| UnknownLength.into())
}

impl<I: Iterator> Source for I {
    type Item = I::Item;
    type Error = Infallible;

    #[inline]
    fn pull(&mut self) -> Result<Option<I::Item>, Infallible> {
        Ok(self.next())
    }

    #[inline]
    fn remaining(&self) -> Result<usize, BoxError> {
        iter_remaining(self)
    }

    #[inline]
    fn min_remaining(&self) -> usize {
        self.size_hint().0
    }
}

/// Turns an iterator over `Result<T, E>` into a fallible [`Source`]
///
/// # Example
/// ```
/// use resumable_merge::{Merged, MergeError, TryIter};
///
/// let good = TryIter::new(vec![Ok(1), Ok(4)].into_iter());
/// let bad = TryIter::new(vec![Ok(2), Err("disk on fire")].into_iter());
/// let mut merge = Merged::new([good, bad]).build();
/// assert_eq!(merge.next().unwrap().unwrap(), 1);
/// assert!(matches!(merge.next(), Some(Err(MergeError::Source { index: 1, .. }))));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TryIter<I>(I);

impl<I> TryIter<I> {
    /// Wraps `iter`
    #[inline]
    pub const fn new(iter: I) -> Self {
        Self(iter)
    }

    /// Returns the wrapped iterator
    #[inline]
    pub fn into_inner(self) -> I {
        self.0
    }
}

impl<I, T, E> Source for TryIter<I>
where
    I: Iterator<Item = Result<T, E>>,
    E: Into<BoxError>,
{
    type Item = T;
    type Error = E;

    #[inline]
    fn pull(&mut self) -> Result<Option<T>, E> {
        self.0.next().transpose()
    }

    #[inline]
    fn remaining(&self) -> Result<usize, BoxError> {
        iter_remaining(&self.0)
    }
}

/// Owned sequence with an index cursor.
///
/// Unlike [`vec::IntoIter`](std::vec::IntoIter) it is serializable, which makes it a
/// natural source for merges that get [checkpointed](crate::Checkpoint).
/// Already consumed items are released when the cursor is serialized.
///
/// ```
/// use resumable_merge::VecCursor;
///
/// let mut cursor = VecCursor::new(vec![1, 2, 3]);
/// assert_eq!(cursor.next(), Some(1));
/// assert_eq!(cursor.position(), 1);
/// assert!(cursor.rest().eq(&[2, 3]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CursorRepr<T>", into = "CursorRepr<T>")]
#[serde(bound(serialize = "T: Serialize + Clone", deserialize = "T: Deserialize<'de>"))]
pub struct VecCursor<T> {
    items: Vec<Option<T>>,
    position: usize,
}

/// Serialized form of [`VecCursor`]: only the items that are left, plus how many were taken.
#[derive(Serialize, Deserialize)]
struct CursorRepr<T> {
    position: usize,
    items: Vec<T>,
}

impl<T> VecCursor<T> {
    /// Cursor at the start of `items`
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: items.into_iter().map(Some).collect(),
            position: 0,
        }
    }

    /// Number of items already taken
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Items not taken yet
    pub fn rest(&self) -> impl Iterator<Item = &T> + '_ {
        self.items.iter().skip(self.position).flatten()
    }
}

impl<T> From<Vec<T>> for VecCursor<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

impl<T> FromIterator<T> for VecCursor<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<T> Iterator for VecCursor<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let item = self.items.get_mut(self.position)?.take();
        self.position += 1;
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.items.len() - self.position.min(self.items.len());
        (len, Some(len))
    }
}

impl<T> ExactSizeIterator for VecCursor<T> {}

impl<T> From<VecCursor<T>> for CursorRepr<T> {
    fn from(cursor: VecCursor<T>) -> Self {
        let position = cursor.position;
        Self {
            position,
            items: cursor.items.into_iter().skip(position).flatten().collect(),
        }
    }
}

impl<T> From<CursorRepr<T>> for VecCursor<T> {
    fn from(repr: CursorRepr<T>) -> Self {
        // consumed slots are kept as holes so `position` stays meaningful
        let mut items = Vec::with_capacity(repr.position + repr.items.len());
        items.resize_with(repr.position, || None);
        items.extend(repr.items.into_iter().map(Some));
        Self {
            items,
            position: repr.position,
        }
    }
}
