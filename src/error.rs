//! Error types of this crate.
//!
//! Three kinds are kept apart so callers can tell them from each other:
//! * [`MergeError`]: something failed while producing the next item
//! * [`CheckpointError`]: a [`Checkpoint`](crate::Checkpoint) can't be exported or restored
//! * [`SizeEstimateError`]: [`MergeIter::remaining`](crate::MergeIter::remaining) has no answer
//!
//! Exhaustion is not an error, it's `None` from the iterator.

use thiserror::Error;

/// Boxed error produced by user-supplied sources, key functions and comparators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure while producing the next merged item.
///
/// The merge state is never advanced past the point of failure: a failed comparison
/// moves nothing, and a failed key computation keeps the pulled item for the next attempt.
#[derive(Debug, Error)]
pub enum MergeError {
    /// The source at `index` failed to produce its next item.
    #[error("source {index} failed to produce an item")]
    Source {
        index: usize,
        #[source]
        source: BoxError,
    },

    /// The key function failed for an item pulled from the source at `index`.
    #[error("key function failed for an item of source {index}")]
    Key {
        index: usize,
        #[source]
        source: BoxError,
    },

    /// The comparator failed to order the candidates of sources `left` and `right`.
    #[error("failed to compare candidates of sources {left} and {right}")]
    Compare {
        left: usize,
        right: usize,
        #[source]
        source: BoxError,
    },
}

impl MergeError {
    pub(crate) fn source_failed(index: usize, err: impl Into<BoxError>) -> Self {
        Self::Source {
            index,
            source: err.into(),
        }
    }

    pub(crate) fn key_failed(index: usize, err: impl Into<BoxError>) -> Self {
        Self::Key {
            index,
            source: err.into(),
        }
    }

    pub(crate) fn compare_failed(left: usize, right: usize, err: impl Into<BoxError>) -> Self {
        Self::Compare {
            left,
            right,
            source: err.into(),
        }
    }

    /// Index of the source involved in the failure. For comparison failures that's
    /// the left-hand side.
    pub fn source_index(&self) -> usize {
        match self {
            Self::Source { index, .. } | Self::Key { index, .. } => *index,
            Self::Compare { left, .. } => *left,
        }
    }
}

/// Malformed or incompatible checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckpointError {
    #[error("checkpoint has {candidates} candidates for {sources} sources")]
    CandidateCountMismatch { candidates: usize, sources: usize },

    #[error("candidate of source {index} carries a key, but the merge has no key function")]
    UnexpectedKey { index: usize },

    #[error("candidate of source {index} has no key, but the merge has a key function")]
    MissingKey { index: usize },

    #[error("source index {index} is out of range for {sources} sources")]
    SourceIndexOutOfRange { index: usize, sources: usize },

    #[error("source index {index} is used more than once")]
    DuplicateSourceIndex { index: usize },

    #[error("checkpoint of a merge that hasn't started carries {count} candidates")]
    CandidatesBeforeStart { count: usize },

    #[error("checkpoint of a merge that hasn't started carries {count} stashed items")]
    StashBeforeStart { count: usize },

    #[error("stashed item of source {index}, but the merge has no key function")]
    UnexpectedStash { index: usize },

    #[error("checkpoint was taken with reverse={checkpoint}, merge is configured with reverse={configured}")]
    ReverseMismatch { checkpoint: bool, configured: bool },

    #[error("priming was interrupted after {primed} of {sources} sources")]
    PrimingInterrupted { primed: usize, sources: usize },
}

/// The remaining item count can't be reported.
#[derive(Debug, Error)]
pub enum SizeEstimateError {
    /// Source at `index` couldn't estimate its own length.
    #[error("source {index} can't estimate its remaining length")]
    Source {
        index: usize,
        #[source]
        source: BoxError,
    },

    /// The sum of the estimates doesn't fit into `usize`.
    #[error("remaining length overflows usize")]
    Overflow,
}
