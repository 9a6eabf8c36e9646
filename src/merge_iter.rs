//! Implementation of [`MergeIter`]

use core::fmt;

use log::debug;

use crate::{
    comparators::{Comparator, key::Projection},
    error::{MergeError, SizeEstimateError},
    internal::MergeState,
    source::Source,
};

mod builder;
mod checkpoint;
pub use builder::{DefaultMergeIter, Merged};
pub use checkpoint::{CandidateState, Checkpoint, StashedItem};

/// Iterator over merged sources
///
/// Yields `Ok(item)` in merged order, `Err` when a source, the key function or
/// the comparator fails, and `None` once every source is exhausted.
///
/// An error never advances the merge: calling [`next`](Iterator::next) again retries
/// the failed operation.
#[repr(transparent)]
pub struct MergeIter<S, C, P>(pub(crate) MergeState<S, C, P>)
where
    S: Source,
    P: Projection<S::Item>;

/// What's left of a single source of a [`MergeIter`], see [`MergeIter::into_sources`].
#[derive(Debug, Clone)]
pub struct SourceRemainder<S: Source> {
    /// Index of the source within the merge
    pub index: usize,
    /// Items already pulled out of the source, but not yielded by the merge
    pub pulled: Vec<S::Item>,
    /// The source itself
    pub source: S,
}

impl<S, C, P> MergeIter<S, C, P>
where
    S: Source,
    P: Projection<S::Item>,
{
    /// `true` if the largest item is yielded first
    #[inline]
    pub const fn is_reverse(&self) -> bool {
        self.0.reverse
    }

    /// The key projection, `None` if items are compared directly
    #[inline]
    pub fn key(&self) -> Option<&P> {
        P::PROJECTS.then_some(&self.0.projection)
    }

    /// The comparator
    #[inline]
    pub const fn comparator(&self) -> &C {
        &self.0.comparator
    }

    /// `true` once the first item was requested and every source got primed
    #[inline]
    pub const fn is_started(&self) -> bool {
        self.0.started
    }

    /// Number of sources that weren't found exhausted yet
    #[inline]
    pub fn len_active(&self) -> usize {
        self.0.active()
    }

    /// Estimates how many items are left to be yielded.
    ///
    /// Before the merge starts this is the sum of the sources' own estimates. After that
    /// already pulled items are counted too.
    ///
    /// # Errors
    /// * [`SizeEstimateError::Source`] if any source can't estimate its length
    /// * [`SizeEstimateError::Overflow`] if the total doesn't fit into `usize`
    ///
    /// # Examples
    /// ```
    /// use resumable_merge::{merge, SizeEstimateError};
    ///
    /// let mut merged = merge([vec![1, 3], vec![2]]);
    /// assert_eq!(merged.remaining().unwrap(), 3);
    /// merged.next();
    /// assert_eq!(merged.remaining().unwrap(), 2);
    ///
    /// let huge = merge([0..usize::MAX, 0..1]);
    /// assert!(matches!(huge.remaining(), Err(SizeEstimateError::Overflow)));
    /// ```
    pub fn remaining(&self) -> Result<usize, SizeEstimateError> {
        let indexed_sources = self
            .0
            .heap
            .iter()
            .map(|it| (it.index, &it.source))
            .chain(self.0.pending.iter().map(|it| (it.index, &it.source)));
        let mut total = self.0.pulled();
        for (index, src) in indexed_sources {
            let left = src
                .remaining()
                .map_err(|source| SizeEstimateError::Source { index, source })?;
            total = total
                .checked_add(left)
                .ok_or(SizeEstimateError::Overflow)?;
        }
        Ok(total)
    }

    /// Adds a `source` after all existing ones, returning its index.
    ///
    /// Its items lose ties against items of every source added earlier.
    /// If the merge has already started, the new source is primed on the next request.
    ///
    /// # Examples
    /// ```
    /// use resumable_merge::merge;
    ///
    /// let mut merged = merge([vec![1, 4]]);
    /// assert_eq!(merged.next().unwrap().unwrap(), 1);
    /// assert_eq!(merged.add_source(vec![2, 3].into_iter()), 1);
    /// assert_eq!(merged.into_vec().unwrap(), vec![2, 3, 4]);
    /// ```
    pub fn add_source(&mut self, source: S) -> usize {
        let index = self.0.push_source(source);
        debug!("added source {index}");
        index
    }

    /// Adds `sources` after all existing ones, in order.
    pub fn add_sources(&mut self, sources: impl IntoIterator<Item = S>) {
        for source in sources {
            self.add_source(source);
        }
    }

    /// Breaks the merge up into its sources, in source order.
    ///
    /// Exhausted sources are gone. Items pulled from a source but not yielded
    /// are returned alongside it, so no item is lost.
    ///
    /// # Examples
    /// ```
    /// use resumable_merge::merge;
    ///
    /// let mut merged = merge([vec![1, 3], vec![2, 4]]);
    /// merged.next();
    /// let parts = merged.into_sources();
    /// assert_eq!(parts.len(), 2);
    /// assert_eq!(parts[0].pulled, vec![3]);
    /// assert_eq!(parts[1].index, 1);
    /// assert_eq!(parts[1].pulled, vec![2]);
    /// assert!(parts[1].source.clone().eq([4]));
    /// ```
    pub fn into_sources(self) -> Vec<SourceRemainder<S>> {
        let MergeState { heap, pending, .. } = self.0;
        let mut parts: Vec<_> = heap
            .into_iter()
            .map(|it| SourceRemainder {
                index: it.index,
                pulled: core::iter::once(it.item).chain(it.stash).collect(),
                source: it.source,
            })
            .chain(pending.into_iter().map(|it| SourceRemainder {
                index: it.index,
                pulled: it.stash.into_iter().collect(),
                source: it.source,
            }))
            .collect();
        parts.sort_unstable_by_key(|it| it.index);
        parts
    }
}

impl<S, C, P> MergeIter<S, C, P>
where
    S: Source,
    P: Projection<S::Item>,
    C: Comparator<P::Target>,
{
    /// Merges all remaining items into a [`Vec`]
    ///
    /// Space is reserved for the items the sources are certain to produce, the upper
    /// bound of the estimate may be far off.
    ///
    /// # Errors
    /// Stops at the first error, items merged before it are dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use resumable_merge::merge;
    /// let v = merge([vec![1, 3, 5], vec![2, 4, 6]]).into_vec().unwrap();
    /// assert_eq!(v, vec![1, 2, 3, 4, 5, 6]);
    /// ```
    pub fn into_vec(mut self) -> Result<Vec<S::Item>, MergeError> {
        let mut res = Vec::with_capacity(self.0.min_remaining());
        while let Some(item) = self.0.advance()? {
            res.push(item);
        }
        Ok(res)
    }

    /// Returns a reference to the next item that will be returned by `next()` without
    /// consuming it.
    ///
    /// Behaves like [`Peekable::peek`], except that getting to the next item may fail.
    /// A failed `peek` leaves the merge as it was.
    ///
    /// # Examples
    ///
    /// ```
    /// use resumable_merge::merge;
    ///
    /// let mut merged = merge([vec![1, 3, 5], vec![2, 4, 6]]);
    ///
    /// assert_eq!(merged.peek().unwrap(), Some(&1));
    /// assert_eq!(merged.next().unwrap().unwrap(), 1);
    /// assert_eq!(merged.peek().unwrap(), Some(&2));
    /// ```
    ///
    /// [`Peekable::peek`]: core::iter::Peekable::peek
    #[inline]
    pub fn peek(&mut self) -> Result<Option<&S::Item>, MergeError> {
        self.0.peek()
    }

    /// Returns the next item of the iterator if it satisfies a predicate.
    ///
    /// Behaves like [`Peekable::next_if`], but errors of getting to the next
    /// item are returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use resumable_merge::merge;
    ///
    /// let mut merged = merge([vec![1, 1, 2, 3], vec![1, 4, 5, 6]]);
    ///
    /// // Consume all 1s
    /// while let Some(item) = merged.next_if(|&x| x == 1).unwrap() {
    ///     assert_eq!(item, 1);
    /// }
    ///
    /// assert_eq!(merged.next().unwrap().unwrap(), 2);
    /// ```
    ///
    /// [`Peekable::next_if`]: core::iter::Peekable::next_if
    pub fn next_if(
        &mut self, func: impl FnOnce(&S::Item) -> bool,
    ) -> Result<Option<S::Item>, MergeError> {
        if self.0.peek()?.is_some_and(func) {
            self.0.advance()
        } else {
            Ok(None)
        }
    }

    /// Returns the next item of the iterator if it is equal to a given value.
    ///
    /// This is a convenience method that is equivalent to `next_if(|item| item == expected)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use resumable_merge::merge;
    ///
    /// let mut merged = merge([vec![1, 1, 2, 3], vec![1, 4, 5, 6]]);
    ///
    /// while let Some(item) = merged.next_if_eq(&1).unwrap() {
    ///     assert_eq!(item, 1);
    /// }
    ///
    /// assert_eq!(merged.next().unwrap().unwrap(), 2);
    /// ```
    pub fn next_if_eq<T>(&mut self, expected: &T) -> Result<Option<S::Item>, MergeError>
    where
        T: ?Sized,
        S::Item: PartialEq<T>,
    {
        self.next_if(|item| item == expected)
    }
}

impl<S, C, P> Iterator for MergeIter<S, C, P>
where
    S: Source,
    P: Projection<S::Item>,
    C: Comparator<P::Target>,
{
    type Item = Result<S::Item, MergeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.advance().transpose()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.0.min_remaining(), self.remaining().ok())
    }
}

impl<S, C, P> Clone for MergeIter<S, C, P>
where
    S: Source + Clone,
    S::Item: Clone,
    C: Clone,
    P: Projection<S::Item> + Clone,
    P::Key: Clone,
{
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<S, C, P> fmt::Debug for MergeIter<S, C, P>
where
    S: Source,
    S::Item: fmt::Debug,
    P: Projection<S::Item>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let candidates: Vec<_> = self
            .0
            .heap
            .iter()
            .map(|it| (it.index, &it.item))
            .collect();
        f.debug_struct("MergeIter")
            .field("reverse", &self.0.reverse)
            .field("started", &self.0.started)
            .field("candidates", &candidates)
            .field("pending", &self.0.pending.len())
            .finish_non_exhaustive()
    }
}
