use core::cmp::Ordering;

use log::trace;

use super::MergeState;
use crate::{
    comparators::{Comparator, key::Projection},
    error::MergeError,
    source::Source,
};

/// Index of the parent of `pos`, `pos` must be > 0
#[inline]
const fn parent(pos: usize) -> usize {
    (pos - 1) / 2
}

impl<S, C, P> MergeState<S, C, P>
where
    S: Source,
    P: Projection<S::Item>,
    C: Comparator<P::Target>,
{
    /// Compares candidates at heap positions `a` and `b`.
    ///
    /// Ties are broken by the source index, so the result is never `Equal` for two
    /// different candidates.
    fn cmp(&self, a: usize, b: usize) -> Result<Ordering, MergeError> {
        debug_assert_ne!(a, b, "shouldn't ever compare the item to itself");
        let (a, b) = (&self.heap[a], &self.heap[b]);
        let a_target = P::target(&a.item, &a.key);
        let b_target = P::target(&b.item, &b.key);
        let ord = if self.reverse {
            self.comparator.compare(b_target, a_target)
        } else {
            self.comparator.compare(a_target, b_target)
        }
        .map_err(|err| MergeError::compare_failed(a.index, b.index, err))?;
        Ok(ord.then_with(|| a.index.cmp(&b.index)))
    }

    #[inline]
    fn less(&self, a: usize, b: usize) -> Result<bool, MergeError> {
        Ok(self.cmp(a, b)?.is_lt())
    }

    /// Restores the heap property over the whole heap.
    ///
    /// Each step either completes or leaves the heap untouched, a retry after an error
    /// continues where the failed one stopped.
    pub(crate) fn settle(&mut self) -> Result<(), MergeError> {
        if self.root_dirty {
            self.sift_down_root()?;
            self.root_dirty = false;
        }
        if self.settled < self.heap.len() {
            trace!("settling {} candidates", self.heap.len() - self.settled);
        }
        while self.settled < self.heap.len() {
            self.sift_up(self.settled)?;
            self.settled += 1;
        }
        Ok(())
    }

    /// Moves the root down `heap[..settled]` while its children are smaller.
    ///
    /// The destination is found first, without moving anything.
    fn sift_down_root(&mut self) -> Result<(), MergeError> {
        let len = self.settled;
        let mut pos = 0;
        loop {
            let left = 2 * pos + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let child = if right < len && self.less(right, left)? {
                right
            } else {
                left
            };
            // the root hasn't moved yet, it's still at 0
            if self.less(child, 0)? {
                pos = child;
            } else {
                break;
            }
        }
        self.rotate_down(pos);
        Ok(())
    }

    /// Moves the entry at `start` up while it's smaller than its parent.
    ///
    /// `heap[..start]` must be a valid heap.
    fn sift_up(&mut self, start: usize) -> Result<(), MergeError> {
        let mut pos = start;
        while pos > 0 {
            let up = parent(pos);
            if self.less(start, up)? {
                pos = up;
            } else {
                break;
            }
        }
        let mut hole = start;
        while hole > pos {
            let up = parent(hole);
            self.heap.swap(hole, up);
            hole = up;
        }
        Ok(())
    }

    /// Moves the root to `target`, shifting every entry on the path one level up.
    fn rotate_down(&mut self, target: usize) {
        if target == 0 {
            return;
        }
        // In 1-based numbering the ancestor of `n` that's `k` levels up is `n >> k`.
        let n = target + 1;
        let depth = (usize::BITS - 1 - n.leading_zeros()) as usize;
        for level in (1..=depth).rev() {
            let upper = (n >> level) - 1;
            let lower = (n >> (level - 1)) - 1;
            self.heap.swap(upper, lower);
        }
    }
}
