#![allow(clippy::type_complexity)]
use core::cmp::Ordering;

use crate::{
    MergeIter, Merged,
    comparators::{
        ByFunc, ByOrd,
        key::{ByKey, Identity},
    },
    merge_iter::DefaultMergeIter,
};

type Iter<IT> = <<IT as IntoIterator>::Item as IntoIterator>::IntoIter;
type Item<IT> = <<IT as IntoIterator>::Item as IntoIterator>::Item;

/// Constructs a new [`MergeIter`] with default parameters:
/// * Yields items according to their [`Ord`] implementation, smallest-first
/// * Equal items are yielded in order of their respective iterators
pub fn merge<IT>(iters: IT) -> DefaultMergeIter<Iter<IT>>
where
    IT: IntoIterator,
    IT::Item: IntoIterator,
    Item<IT>: Ord,
{
    Merged::new(iters.into_iter().map(IntoIterator::into_iter)).build()
}

/// Constructs a new [`MergeIter`] yielding the largest items first:
/// * Iterators are expected to be sorted in descending order
/// * Equal items are still yielded in order of their respective iterators
pub fn merge_reverse<IT>(iters: IT) -> DefaultMergeIter<Iter<IT>>
where
    IT: IntoIterator,
    IT::Item: IntoIterator,
    Item<IT>: Ord,
{
    Merged::new(iters.into_iter().map(IntoIterator::into_iter))
        .reverse()
        .build()
}

/// Constructs a new [`MergeIter`] with default parameters:
/// * Yields smallest items according to `func`
/// * Equal items are yielded in order of their respective iterators
pub fn merge_by<IT, F>(iters: IT, func: F) -> MergeIter<Iter<IT>, ByFunc<F>, Identity>
where
    IT: IntoIterator,
    IT::Item: IntoIterator,
    F: Fn(&Item<IT>, &Item<IT>) -> Ordering,
{
    Merged::new(iters.into_iter().map(IntoIterator::into_iter))
        .by(ByFunc(func))
        .build()
}

/// Constructs a new [`MergeIter`] with default parameters:
/// * Yields items with the smallest key according to `func`
/// * Equal items are yielded in order of their respective iterators
pub fn merge_by_key<IT, F, K>(
    iters: IT, func: F,
) -> MergeIter<Iter<IT>, ByOrd, ByKey<F>>
where
    IT: IntoIterator,
    IT::Item: IntoIterator,
    F: Fn(&Item<IT>) -> K,
    K: Ord,
{
    Merged::new(iters.into_iter().map(IntoIterator::into_iter))
        .project(ByKey(func))
        .build()
}
