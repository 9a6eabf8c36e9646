use core::cmp::Ordering;

use log::debug;

use super::{MergeIter, checkpoint::Checkpoint};
use crate::{
    comparators::{
        ByFunc, ByOrd, ByPartialOrd, Comparator, TryByFunc,
        key::{ByKey, Identity, Projection, TryByKey},
    },
    error::{BoxError, CheckpointError},
    internal::MergeState,
    source::Source,
};

/// [`MergeIter`] with default comparator
pub type DefaultMergeIter<S> = MergeIter<S, ByOrd, Identity>;

/// Builder for [`MergeIter`](crate::MergeIter)
///
/// Starts either from a list of sources ([`Merged::new`]) or from a
/// [`Checkpoint`] ([`Merged::resume`]) and allows to configure how the items are compared.
///
/// By default items are compared using [`Ord`], smallest item yielded first, and if the
/// items are equal - they are yielded in source order, earliest source first.
/// The same holds for [`reverse`](Self::reverse)d merges: largest item first, ties
/// still in source order.
///
/// # Examples
/// ```
/// use resumable_merge::Merged;
///
/// // Merge by descending absolute value
/// let res = Merged::new([vec![-3_i32, -1].into_iter(), vec![2, -2].into_iter()])
///     .by_key(|x: &i32| x.abs())
///     .reverse()
///     .build()
///     .into_vec()
///     .unwrap();
/// assert_eq!(res, vec![-3, 2, -2, -1]);
/// ```
#[derive(Debug, Clone)]
pub struct Merged<Init, C = ByOrd, P = Identity> {
    init: Init,
    comparator: C,
    projection: P,
    reverse: bool,
}

impl<S: Source> Merged<Vec<S>> {
    /// Starts a new merge of `sources`. The position of a source is its index.
    #[inline]
    pub fn new(sources: impl IntoIterator<Item = S>) -> Self {
        Self {
            init: sources.into_iter().collect(),
            comparator: ByOrd,
            projection: Identity,
            reverse: false,
        }
    }
}

impl<S, T, K> Merged<Checkpoint<S, T, K>> {
    /// Resumes a merge from the `checkpoint`.
    ///
    /// The comparator, the key function and the direction have to be configured
    /// the same way they were for the checkpointed merge. Key function and direction
    /// are validated by [`build`](Merged::build), the comparator can't be.
    #[inline]
    pub fn resume(checkpoint: Checkpoint<S, T, K>) -> Self {
        Self {
            init: checkpoint,
            comparator: ByOrd,
            projection: Identity,
            reverse: false,
        }
    }
}

impl<Init, C, P> Merged<Init, C, P> {
    /// Yield the largest item first
    #[inline]
    #[must_use]
    pub fn reverse(self) -> Self {
        self.with_reverse(true)
    }

    /// Yield the largest item first if `reverse` is set
    #[inline]
    #[must_use]
    pub fn with_reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// Compare candidates using comparator `cmp`
    #[inline]
    pub fn by<C2>(self, cmp: C2) -> Merged<Init, C2, P> {
        Merged {
            init: self.init,
            comparator: cmp,
            projection: self.projection,
            reverse: self.reverse,
        }
    }

    /// Compare candidates using `func`
    #[inline]
    pub fn by_func<F, T>(self, func: F) -> Merged<Init, ByFunc<F>, P>
    where
        T: ?Sized,
        F: Fn(&T, &T) -> Ordering,
    {
        self.by(ByFunc(func))
    }

    /// Compare candidates using fallible `func`
    #[inline]
    pub fn try_by_func<F, T, E>(self, func: F) -> Merged<Init, TryByFunc<F>, P>
    where
        T: ?Sized,
        F: Fn(&T, &T) -> Result<Ordering, E>,
        E: Into<BoxError>,
    {
        self.by(TryByFunc(func))
    }

    /// Compare candidates using [`PartialOrd`], failing on incomparable ones
    #[inline]
    pub fn by_partial_ord(self) -> Merged<Init, ByPartialOrd, P> {
        self.by(ByPartialOrd)
    }

    /// Compare keys produced by `func` instead of the items.
    ///
    /// The key is computed once per item, when it's pulled from the source.
    #[inline]
    pub fn by_key<F, T, K>(self, func: F) -> Merged<Init, C, ByKey<F>>
    where
        F: Fn(&T) -> K,
    {
        self.project(ByKey(func))
    }

    /// Compare keys produced by fallible `func` instead of the items.
    #[inline]
    pub fn try_by_key<F, T, K, E>(self, func: F) -> Merged<Init, C, TryByKey<F>>
    where
        F: Fn(&T) -> Result<K, E>,
        E: Into<BoxError>,
    {
        self.project(TryByKey(func))
    }

    /// Compare values selected by a custom [`Projection`]
    #[inline]
    pub fn project<P2>(self, projection: P2) -> Merged<Init, C, P2> {
        Merged {
            init: self.init,
            comparator: self.comparator,
            projection,
            reverse: self.reverse,
        }
    }
}

impl<S, C, P> Merged<Vec<S>, C, P>
where
    S: Source,
    P: Projection<S::Item>,
    C: Comparator<P::Target>,
{
    /// Builds the [`MergeIter`] using specified comparator and key function.
    ///
    /// No source is touched until the first item is requested.
    ///
    /// Getting a compiler error
    /// ```custom
    /// the method `build` exists for struct `Merged<...>`,
    /// but its trait bounds were not satisfied
    /// ```
    /// means that the item (or key) type does not implement [`Ord`].
    /// Either implement it for your type or specify another way to compare items by using
    /// builder methods documented above.
    #[inline]
    pub fn build(self) -> MergeIter<S, C, P> {
        debug!("merging {} sources", self.init.len());
        MergeIter(MergeState::new(
            self.init,
            self.comparator,
            self.projection,
            self.reverse,
        ))
    }
}

impl<S, C, P> Merged<Checkpoint<S, S::Item, P::Key>, C, P>
where
    S: Source,
    P: Projection<S::Item>,
    C: Comparator<P::Target>,
{
    /// Validates the checkpoint and builds the [`MergeIter`] continuing from it.
    ///
    /// # Errors
    /// Any [`CheckpointError`] describing why the checkpoint doesn't fit this merge.
    /// Nothing is pulled from the sources either way.
    pub fn build(self) -> Result<MergeIter<S, C, P>, CheckpointError> {
        self.init
            .restore(self.comparator, self.projection, self.reverse)
            .map(MergeIter)
    }
}
