//! Defines comparators for [`MergeIter`](crate::MergeIter)
//!
//! Users of this crate may implement [`Comparator`] trait to create a custom comparator
//! or use one of the provided ones via [`Merged`](crate::Merged) builder methods:
//! * [`ByOrd`] (the default) compares with [`Ord`] and never fails
//! * [`ByPartialOrd`] compares with [`PartialOrd`] and fails with [`Incomparable`] when
//!   [`PartialOrd::partial_cmp`] returns `None`
//! * [`ByFunc`] and [`TryByFunc`] wrap a comparison closure
//!
//! Comparators always see the smallest-first order. Descending merges are handled by the
//! merge itself, see [`Merged::reverse`](crate::Merged::reverse), so that
//! ties are still resolved in source order.
//!
//! Which value the comparator sees is decided by the [`key`] projection: the item itself,
//! or a key computed from it.

use core::{cmp::Ordering, convert::Infallible};

use thiserror::Error;

use crate::error::BoxError;

pub mod key;

/// Trait used to compare candidates of [`MergeIter`](crate::MergeIter)
///
/// Implementations should produce a consistent total ordering, see [`Ord`]
/// documentation for details.
///
/// Producing non-total or inconsistent ordering may result in incorrect behavior
/// (i.e. items are yielded in a wrong order), but never in lost items.
///
/// A returned error is propagated to the caller of [`next`](Iterator::next) and leaves
/// the merge untouched, so a retry compares the same candidates again.
pub trait Comparator<T: ?Sized> {
    /// Error returned when two values can't be ordered
    type Error: Into<BoxError>;

    /// Compares two values and returns an [`Ordering`]
    fn compare(&self, a: &T, b: &T) -> Result<Ordering, Self::Error>;
}

impl<T, C> Comparator<T> for &C
where
    T: ?Sized,
    C: Comparator<T>,
{
    type Error = C::Error;

    #[inline]
    fn compare(&self, a: &T, b: &T) -> Result<Ordering, Self::Error> {
        C::compare(self, a, b)
    }
}

/// Comparator that uses [`Ord`] to compare values, default for the [`MergeIter`](crate::MergeIter).
#[derive(Debug, Clone, Copy, Default)]
pub struct ByOrd;

impl<T: Ord + ?Sized> Comparator<T> for ByOrd {
    type Error = Infallible;

    #[inline]
    fn compare(&self, a: &T, b: &T) -> Result<Ordering, Infallible> {
        Ok(Ord::cmp(a, b))
    }
}

/// Two values have no defined order relative to each other (e.g. a `NaN`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("values are not comparable")]
pub struct Incomparable;

/// Comparator that uses [`PartialOrd`] to compare values.
///
/// # Example
/// ```
/// use resumable_merge::{Merged, MergeError};
///
/// let mut merge = Merged::new([vec![1.0, f64::NAN].into_iter(), vec![2.0].into_iter()])
///     .by_partial_ord()
///     .build();
/// assert_eq!(merge.next().unwrap().unwrap(), 1.0);
/// // NaN is now a candidate and can't be placed
/// assert!(matches!(merge.next(), Some(Err(MergeError::Compare { .. }))));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ByPartialOrd;

impl<T: PartialOrd + ?Sized> Comparator<T> for ByPartialOrd {
    type Error = Incomparable;

    #[inline]
    fn compare(&self, a: &T, b: &T) -> Result<Ordering, Incomparable> {
        a.partial_cmp(b).ok_or(Incomparable)
    }
}

/// Comparator that uses an infallible function to compare values
///
/// Construct via [`by_func`](crate::Merged::by_func)
#[derive(Debug, Clone)]
pub struct ByFunc<F>(pub(crate) F);

impl<T, F> Comparator<T> for ByFunc<F>
where
    T: ?Sized,
    F: Fn(&T, &T) -> Ordering,
{
    type Error = Infallible;

    // Leaving decision to inline this to the compiler because F can be long
    fn compare(&self, a: &T, b: &T) -> Result<Ordering, Infallible> {
        Ok(self.0(a, b))
    }
}

/// Comparator that uses a fallible function to compare values
///
/// Construct via [`try_by_func`](crate::Merged::try_by_func)
#[derive(Debug, Clone)]
pub struct TryByFunc<F>(pub(crate) F);

impl<T, F, E> Comparator<T> for TryByFunc<F>
where
    T: ?Sized,
    F: Fn(&T, &T) -> Result<Ordering, E>,
    E: Into<BoxError>,
{
    type Error = E;

    fn compare(&self, a: &T, b: &T) -> Result<Ordering, E> {
        self.0(a, b)
    }
}
