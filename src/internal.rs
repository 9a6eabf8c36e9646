//! Internal implementation details of this library.
//!
//! [`PeekSource`] holds a source, the eagerly pulled candidate from it and the candidate's key.
//! The source with the smallest (according to the [`comparator`](crate::comparators))
//! candidate will be advanced.
//!
//! [`PeekSource`]s live directly in a binary min-heap, ordered by the candidate's
//! [`target`](crate::comparators::key::Projection::target) and then by the source index,
//! which makes the order strict and the merge stable.
//!
//! The heap is only ever reordered by [`MergeState::settle`], and every reordering first runs
//! all of its comparisons and only then moves entries. A failing comparator therefore leaves
//! the heap exactly as it was.
//!
//! Heap layout:
//! ```custom
//! [
//!     root (next to be yielded, unless `root_dirty`),
//!     ..settled (valid heap),
//!     settled.. (entries waiting to be sifted up),
//! ]
//! ```
mod heap;

use std::collections::VecDeque;

use log::{debug, trace};

use crate::{comparators::key::Projection, error::MergeError, source::Source};

/// Holds within itself one pulled item from the source, its key, and the source itself.
/// It's like [`iter::Peekable`](core::iter::Peekable), except eager.
#[derive(Debug, Clone)]
pub(crate) struct PeekSource<S: Source, K> {
    /// Position of the source among all sources of the merge, tie-breaker for equal keys
    pub(crate) index: usize,
    /// Item pulled from the source
    pub(crate) item: S::Item,
    /// Key of the `item`
    pub(crate) key: K,
    /// Source, containing the rest of the items
    pub(crate) source: S,
    /// Item pulled after `item` whose key computation failed
    pub(crate) stash: Option<S::Item>,
}

/// Source that hasn't produced its first candidate yet
#[derive(Debug, Clone)]
pub(crate) struct Pending<S: Source> {
    pub(crate) index: usize,
    pub(crate) source: S,
    pub(crate) stash: Option<S::Item>,
}

/// Total state of a merge.
pub(crate) struct MergeState<S: Source, C, P: Projection<S::Item>> {
    pub(crate) comparator: C,
    pub(crate) projection: P,
    pub(crate) reverse: bool,
    pub(crate) heap: Vec<PeekSource<S, P::Key>>,
    /// `heap[..settled]` is a valid heap, except for the root if `root_dirty`
    pub(crate) settled: usize,
    /// Root candidate was replaced and has to be sifted down
    pub(crate) root_dirty: bool,
    /// Sources waiting for priming, in source order
    pub(crate) pending: VecDeque<Pending<S>>,
    /// Set once the initial priming pass has completed
    pub(crate) started: bool,
    /// Index assigned to the next added source
    pub(crate) next_index: usize,
}

// Derived impl would miss the `S::Item: Clone` bound
impl<S, C, P> Clone for MergeState<S, C, P>
where
    S: Source + Clone,
    S::Item: Clone,
    C: Clone,
    P: Projection<S::Item> + Clone,
    P::Key: Clone,
{
    fn clone(&self) -> Self {
        Self {
            comparator: self.comparator.clone(),
            projection: self.projection.clone(),
            reverse: self.reverse,
            heap: self.heap.clone(),
            settled: self.settled,
            root_dirty: self.root_dirty,
            pending: self.pending.clone(),
            started: self.started,
            next_index: self.next_index,
        }
    }
}

impl<S, C, P> MergeState<S, C, P>
where
    S: Source,
    P: Projection<S::Item>,
{
    pub(crate) fn new(sources: Vec<S>, comparator: C, projection: P, reverse: bool) -> Self {
        let next_index = sources.len();
        let pending = sources
            .into_iter()
            .enumerate()
            .map(|(index, source)| Pending {
                index,
                source,
                stash: None,
            })
            .collect();
        Self {
            comparator,
            projection,
            reverse,
            heap: Vec::new(),
            settled: 0,
            root_dirty: false,
            pending,
            started: false,
            next_index,
        }
    }

    /// State of a started merge with every source already primed.
    ///
    /// `heap` has to be in source order, it's settled on the first request.
    pub(crate) fn resumed(
        heap: Vec<PeekSource<S, P::Key>>, comparator: C, projection: P, reverse: bool,
    ) -> Self {
        Self {
            comparator,
            projection,
            reverse,
            settled: 0,
            root_dirty: false,
            pending: VecDeque::new(),
            started: true,
            next_index: heap.len(),
            heap,
        }
    }

    /// Adds a source after all existing ones. It's primed on the next request.
    pub(crate) fn push_source(&mut self, source: S) -> usize {
        let index = self.next_index;
        self.next_index += 1;
        self.pending.push_back(Pending {
            index,
            source,
            stash: None,
        });
        index
    }

    /// Number of sources that may still produce items
    #[inline]
    pub(crate) fn active(&self) -> usize {
        self.heap.len() + self.pending.len()
    }

    /// Pulls the first item out of every pending source, in source order.
    ///
    /// Primed sources are appended to the heap unsettled; empty sources are dropped.
    /// On failure the failing source stays at the front of the queue.
    pub(crate) fn prime(&mut self) -> Result<(), MergeError> {
        if self.pending.is_empty() {
            self.started = true;
            return Ok(());
        }
        trace!("priming {} sources", self.pending.len());
        while let Some(mut pending) = self.pending.pop_front() {
            let item = match pending.stash.take() {
                Some(item) => item,
                None => match pending.source.pull() {
                    Ok(Some(item)) => item,
                    Ok(None) => {
                        debug!("source {} is empty", pending.index);
                        continue;
                    }
                    Err(err) => {
                        let index = pending.index;
                        self.pending.push_front(pending);
                        return Err(MergeError::source_failed(index, err));
                    }
                },
            };
            match self.projection.project(&item) {
                Ok(key) => self.heap.push(PeekSource {
                    index: pending.index,
                    item,
                    key,
                    source: pending.source,
                    stash: None,
                }),
                Err(err) => {
                    let index = pending.index;
                    pending.stash = Some(item);
                    self.pending.push_front(pending);
                    return Err(MergeError::key_failed(index, err));
                }
            }
        }
        self.started = true;
        Ok(())
    }

    /// Yields the root candidate and replaces it with the next item of its source.
    ///
    /// Expects the heap to be settled.
    fn pop_root(&mut self) -> Result<Option<S::Item>, MergeError> {
        debug_assert!(!self.root_dirty && self.settled == self.heap.len());
        let Some(root) = self.heap.first_mut() else {
            return Ok(None);
        };
        let next = match root.stash.take() {
            Some(item) => Some(item),
            None => root
                .source
                .pull()
                .map_err(|err| MergeError::source_failed(root.index, err))?,
        };
        let Some(next) = next else {
            let root = self.heap.swap_remove(0);
            debug!("source {} is exhausted", root.index);
            self.settled = self.heap.len();
            self.root_dirty = self.heap.len() > 1;
            return Ok(Some(root.item));
        };
        match self.projection.project(&next) {
            Ok(key) => {
                root.key = key;
                let item = core::mem::replace(&mut root.item, next);
                self.root_dirty = self.heap.len() > 1;
                Ok(Some(item))
            }
            Err(err) => {
                root.stash = Some(next);
                Err(MergeError::key_failed(root.index, err))
            }
        }
    }

    /// Total number of items pulled from sources but not yielded yet
    pub(crate) fn pulled(&self) -> usize {
        let stashed = self
            .heap
            .iter()
            .map(|it| &it.stash)
            .chain(self.pending.iter().map(|it| &it.stash))
            .filter(|stash| stash.is_some())
            .count();
        self.heap.len() + stashed
    }

    /// Number of items the merge is certain to yield, saturating at `usize::MAX`
    pub(crate) fn min_remaining(&self) -> usize {
        self.heap
            .iter()
            .map(|it| it.source.min_remaining())
            .chain(self.pending.iter().map(|it| it.source.min_remaining()))
            .fold(self.pulled(), usize::saturating_add)
    }
}

impl<S, C, P> MergeState<S, C, P>
where
    S: Source,
    P: Projection<S::Item>,
    C: crate::comparators::Comparator<P::Target>,
{
    /// Produces the next merged item, `Ok(None)` once every source is exhausted.
    pub(crate) fn advance(&mut self) -> Result<Option<S::Item>, MergeError> {
        self.prime()?;
        self.settle()?;
        self.pop_root()
    }

    /// Reference to the item [`advance`](Self::advance) would produce.
    pub(crate) fn peek(&mut self) -> Result<Option<&S::Item>, MergeError> {
        self.prime()?;
        self.settle()?;
        Ok(self.heap.first().map(|it| &it.item))
    }
}
