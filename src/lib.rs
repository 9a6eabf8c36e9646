//! A stable k-way merge of sorted sources that can be checkpointed and resumed.
//!
//! This crate provides [`MergeIter`] and a builder API to merge items from many
//! [`Source`]s according to a comparator. By default, it performs a min-merge by [`Ord`],
//! breaking ties by source order. Sources, key functions and comparators are all allowed
//! to fail; a failure is reported as an `Err` item and never advances the merge.
//!
//! # Quick start
//!
//! ```
//! use resumable_merge::merge;
//!
//! let a = vec![1, 3, 5];
//! let b = vec![2, 4, 6];
//! let merged = merge([a, b]).into_vec().unwrap();
//! assert_eq!(merged, vec![1, 2, 3, 4, 5, 6]);
//! ```
//!
//! Note that only the next item in each source is considered.
//! If the sources are not sorted, the result won't be sorted either:
//!
//! ```
//! use resumable_merge::merge;
//!
//! let merged = merge([vec![2, 1, 5], vec![4, 3, 6]]).into_vec().unwrap();
//! assert_eq!(merged, vec![2, 1, 4, 3, 5, 6]);
//! ```
//!
//! # Custom ordering
//!
//! Use the [`Merged`] builder to specify a key function, a comparison function or the
//! direction. Implement a custom [`comparator`](crate::comparators::Comparator) for even
//! more control.
//! ```
//! use resumable_merge::Merged;
//!
//! let words = Merged::new([vec!["bb", "dddd"].into_iter(), vec!["a", "cc"].into_iter()])
//!     .by_key(|s: &&str| s.len())
//!     .build()
//!     .into_vec()
//!     .unwrap();
//! // "bb" and "cc" tie, the earlier source wins
//! assert_eq!(words, vec!["a", "bb", "cc", "dddd"]);
//! ```
//!
//! # Checkpoints
//!
//! A merge can be turned into a [`Checkpoint`] at any point between items, stored with
//! [`serde`] and resumed later. The resumed merge yields exactly the items the original
//! one would have.
//! ```
//! use resumable_merge::{Merged, VecCursor};
//!
//! let sources = [VecCursor::new(vec![1, 3]), VecCursor::new(vec![2, 4])];
//! let mut merged = Merged::new(sources).build();
//! assert_eq!(merged.next().unwrap().unwrap(), 1);
//!
//! let checkpoint = merged.checkpoint().unwrap();
//! let resumed = Merged::resume(checkpoint).build().unwrap();
//! assert_eq!(resumed.into_vec().unwrap(), vec![2, 3, 4]);
//! ```
//!
//! # Peeking and conditional consumption
//! [`MergeIter`] provides the same methods as [`iter::Peekable`](core::iter::Peekable):
//! ```
//! use resumable_merge::merge;
//!
//! let mut it = merge([vec![1, 1, 2], vec![1, 3]]);
//! assert_eq!(it.peek().unwrap(), Some(&1));
//! // consume all 1s
//! while let Some(1) = it.next_if_eq(&1).unwrap() {}
//! assert_eq!(it.next().unwrap().unwrap(), 2);
//! ```
//!
//! # Logging
//!
//! Priming, exhaustion of sources and checkpoints are reported through the [`log`] facade.

pub mod comparators;
pub mod error;
pub mod merge_iter;
pub mod source;

pub use comparators::key::Identity;
pub use error::{BoxError, CheckpointError, MergeError, SizeEstimateError};
pub use merge_iter::{Checkpoint, MergeIter, Merged, SourceRemainder};
pub use source::{Source, TryIter, VecCursor};

mod convenience;
pub use convenience::*;

mod internal;


#[doc(hidden)]
#[doc = include_str!("../README.md")]
struct _ReadmeTest;
