//! Export and restore of the [`MergeIter`] state

use std::collections::VecDeque;

use log::debug;
use serde::{Deserialize, Serialize};

use super::MergeIter;
use crate::{
    comparators::key::Projection,
    error::CheckpointError,
    internal::{MergeState, PeekSource, Pending},
    source::Source,
};

/// Serializable snapshot of a [`MergeIter`].
///
/// Holds the sources themselves, so the checkpoint is as serializable as they are.
/// See [`VecCursor`](crate::VecCursor) for a source that is.
///
/// Sources are listed in their original order, without the exhausted ones. Their position in
/// [`sources`](Self::sources) is their index in the resumed merge, so ties are still broken
/// the same way.
///
/// # Examples
/// ```
/// use resumable_merge::{Checkpoint, Merged, VecCursor};
///
/// let mut merged = Merged::new([VecCursor::new(vec![1, 4]), VecCursor::new(vec![2, 3])]).build();
/// assert_eq!(merged.next().unwrap().unwrap(), 1);
///
/// let saved = serde_json::to_string(&merged.into_checkpoint().unwrap()).unwrap();
/// let checkpoint: Checkpoint<VecCursor<i32>, i32> = serde_json::from_str(&saved).unwrap();
/// let resumed = Merged::resume(checkpoint).build().unwrap();
/// assert_eq!(resumed.into_vec().unwrap(), vec![2, 3, 4]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "S: Deserialize<'de>, T: Deserialize<'de>, K: Deserialize<'de>"))]
pub struct Checkpoint<S, T, K = ()> {
    /// The merge yields the largest item first
    pub reverse: bool,
    /// Every source was primed, the first item may have been yielded
    pub started: bool,
    /// Sources that may still produce items
    pub sources: Vec<S>,
    /// Pulled, not yet yielded item of every source; empty if not `started`
    #[serde(default)]
    pub candidates: Vec<CandidateState<T, K>>,
    /// Items pulled after the candidate whose key computation failed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stashed: Vec<StashedItem<T>>,
}

/// Candidate of a single source in a [`Checkpoint`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateState<T, K> {
    /// Index into [`Checkpoint::sources`]
    pub source: usize,
    pub item: T,
    /// Present only when the merge has a key function
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<K>,
}

/// Item pulled from a source of a [`Checkpoint`] and not placed yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StashedItem<T> {
    /// Index into [`Checkpoint::sources`]
    pub source: usize,
    pub item: T,
}

impl<S, C, P> MergeState<S, C, P>
where
    S: Source,
    P: Projection<S::Item>,
{
    /// Exported state would lose the progress of an unfinished priming pass
    fn check_exportable(&self) -> Result<(), CheckpointError> {
        let stashed = self.pending.iter().any(|it| it.stash.is_some());
        let interrupted = if self.started {
            !self.pending.is_empty()
        } else {
            !self.heap.is_empty() || stashed
        };
        if interrupted {
            return Err(CheckpointError::PrimingInterrupted {
                primed: self.heap.len(),
                sources: self.active(),
            });
        }
        Ok(())
    }
}

/// Puts the parts of an exportable state into a [`Checkpoint`]
fn assemble<S: Source, K>(
    reverse: bool, started: bool, mut heap: Vec<PeekSource<S, K>>, pending: VecDeque<Pending<S>>,
    projects: bool,
) -> Checkpoint<S, S::Item, K> {
    let mut checkpoint = Checkpoint {
        reverse,
        started,
        sources: Vec::with_capacity(heap.len() + pending.len()),
        candidates: Vec::with_capacity(heap.len()),
        stashed: Vec::new(),
    };
    if !started {
        checkpoint.sources.extend(pending.into_iter().map(|it| it.source));
        return checkpoint;
    }
    heap.sort_unstable_by_key(|it| it.index);
    for (source, entry) in heap.into_iter().enumerate() {
        checkpoint.sources.push(entry.source);
        checkpoint.candidates.push(CandidateState {
            source,
            item: entry.item,
            key: projects.then_some(entry.key),
        });
        if let Some(item) = entry.stash {
            checkpoint.stashed.push(StashedItem { source, item });
        }
    }
    checkpoint
}

impl<S, C, P> MergeIter<S, C, P>
where
    S: Source,
    P: Projection<S::Item>,
{
    /// Snapshot of the merge, leaving the merge itself untouched.
    ///
    /// # Errors
    /// [`CheckpointError::PrimingInterrupted`] if a request failed halfway through priming,
    /// or a source added by [`add_source`](Self::add_source) is yet to be primed.
    pub fn checkpoint(&self) -> Result<Checkpoint<S, S::Item, P::Key>, CheckpointError>
    where
        S: Clone,
        S::Item: Clone,
        P::Key: Clone,
    {
        self.0.check_exportable()?;
        debug!("checkpoint of {} sources", self.0.active());
        Ok(assemble(
            self.0.reverse,
            self.0.started,
            self.0.heap.clone(),
            self.0.pending.clone(),
            P::PROJECTS,
        ))
    }

    /// Turns the merge into its [`Checkpoint`].
    ///
    /// # Errors
    /// Same as [`checkpoint`](Self::checkpoint). The merge is handed back along with the error.
    pub fn into_checkpoint(self) -> Result<Checkpoint<S, S::Item, P::Key>, (Self, CheckpointError)> {
        if let Err(err) = self.0.check_exportable() {
            return Err((self, err));
        }
        debug!("checkpoint of {} sources", self.0.active());
        let MergeState {
            reverse,
            started,
            heap,
            pending,
            ..
        } = self.0;
        Ok(assemble(reverse, started, heap, pending, P::PROJECTS))
    }
}

impl<S, T, K> Checkpoint<S, T, K> {
    /// Validates the checkpoint against the merge configuration and rebuilds the state.
    pub(crate) fn restore<C, P>(
        self, comparator: C, projection: P, reverse: bool,
    ) -> Result<MergeState<S, C, P>, CheckpointError>
    where
        S: Source<Item = T>,
        P: Projection<T, Key = K>,
    {
        if self.reverse != reverse {
            return Err(CheckpointError::ReverseMismatch {
                checkpoint: self.reverse,
                configured: reverse,
            });
        }
        if !self.started {
            if !self.candidates.is_empty() {
                return Err(CheckpointError::CandidatesBeforeStart {
                    count: self.candidates.len(),
                });
            }
            if !self.stashed.is_empty() {
                return Err(CheckpointError::StashBeforeStart {
                    count: self.stashed.len(),
                });
            }
            debug!("resuming merge of {} sources before start", self.sources.len());
            return Ok(MergeState::new(self.sources, comparator, projection, reverse));
        }

        let sources = self.sources.len();
        if self.candidates.len() != sources {
            return Err(CheckpointError::CandidateCountMismatch {
                candidates: self.candidates.len(),
                sources,
            });
        }
        let mut heads: Vec<Option<(T, K)>> = (0..sources).map(|_| None).collect();
        for CandidateState { source, item, key } in self.candidates {
            let key = match (key, P::implicit_key()) {
                (Some(_), Some(_)) => return Err(CheckpointError::UnexpectedKey { index: source }),
                (Some(key), None) | (None, Some(key)) => key,
                (None, None) => return Err(CheckpointError::MissingKey { index: source }),
            };
            let head = heads
                .get_mut(source)
                .ok_or(CheckpointError::SourceIndexOutOfRange {
                    index: source,
                    sources,
                })?;
            if head.is_some() {
                return Err(CheckpointError::DuplicateSourceIndex { index: source });
            }
            *head = Some((item, key));
        }
        let mut stashes: Vec<Option<T>> = (0..sources).map(|_| None).collect();
        for StashedItem { source, item } in self.stashed {
            if !P::PROJECTS {
                return Err(CheckpointError::UnexpectedStash { index: source });
            }
            let stash = stashes
                .get_mut(source)
                .ok_or(CheckpointError::SourceIndexOutOfRange {
                    index: source,
                    sources,
                })?;
            if stash.is_some() {
                return Err(CheckpointError::DuplicateSourceIndex { index: source });
            }
            *stash = Some(item);
        }

        let heap = self
            .sources
            .into_iter()
            .zip(heads)
            .zip(stashes)
            .enumerate()
            .map(|(index, ((source, head), stash))| {
                // every slot is filled: as many unique in-range indices as there are sources
                let (item, key) = head.ok_or(CheckpointError::CandidateCountMismatch {
                    candidates: index,
                    sources,
                })?;
                Ok(PeekSource {
                    index,
                    item,
                    key,
                    source,
                    stash,
                })
            })
            .collect::<Result<Vec<_>, CheckpointError>>()?;
        debug!("resuming merge of {sources} sources");
        Ok(MergeState::resumed(heap, comparator, projection, reverse))
    }
}

#[cfg(test)]
mod tests {
    use super::{CandidateState, Checkpoint, StashedItem};
    use crate::{CheckpointError, MergeError, Merged, TryIter, VecCursor, merge};

    fn cursors(data: &[&[i32]]) -> Vec<VecCursor<i32>> {
        data.iter().map(|it| VecCursor::new(it.to_vec())).collect()
    }

    #[test]
    fn resume_at_every_position() {
        let data: &[&[i32]] = &[&[1, 3, 5, 7], &[], &[2, 3, 3, 8], &[0, 9]];
        let expected = merge(data.iter().map(|it| it.to_vec())).into_vec().unwrap();
        for split in 0..=expected.len() {
            let mut m = Merged::new(cursors(data)).build();
            let head: Vec<_> = m.by_ref().take(split).map(Result::unwrap).collect();
            let json = serde_json::to_string(&m.checkpoint().unwrap()).unwrap();
            let checkpoint: Checkpoint<VecCursor<i32>, i32> = serde_json::from_str(&json).unwrap();
            let tail = Merged::resume(checkpoint).build().unwrap().into_vec().unwrap();
            assert_eq!([head, tail].concat(), expected, "split at {split}");
        }
    }

    #[test]
    fn checkpoint_leaves_merge_untouched() {
        let mut m = Merged::new(cursors(&[&[1, 4], &[2, 3]])).build();
        m.next();
        let checkpoint = m.checkpoint().unwrap();
        assert_eq!(checkpoint.sources.len(), 2);
        assert_eq!(m.into_vec().unwrap(), vec![2, 3, 4]);
        let resumed = Merged::resume(checkpoint).build().unwrap();
        assert_eq!(resumed.into_vec().unwrap(), vec![2, 3, 4]);
    }

    #[test]
    fn not_started() {
        let m = Merged::new(cursors(&[&[1], &[0]])).build();
        let checkpoint = m.into_checkpoint().unwrap();
        assert!(!checkpoint.started);
        assert!(checkpoint.candidates.is_empty());
        let json = serde_json::to_value(&checkpoint).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "reverse": false,
                "started": false,
                "sources": [{"position": 0, "items": [1]}, {"position": 0, "items": [0]}],
                "candidates": []
            })
        );
        let resumed = Merged::resume(checkpoint).build().unwrap();
        assert!(!resumed.is_started());
        assert_eq!(resumed.into_vec().unwrap(), vec![0, 1]);
    }

    #[test]
    fn exhausted_sources_are_compacted() {
        let mut m = Merged::new(cursors(&[&[1], &[2, 5], &[], &[5]])).build();
        assert_eq!(m.by_ref().take(2).map(Result::unwrap).collect::<Vec<_>>(), [1, 2]);
        let checkpoint = m.into_checkpoint().unwrap();
        assert_eq!(checkpoint.sources.len(), 2);
        assert_eq!(
            checkpoint.candidates,
            [
                CandidateState {
                    source: 0,
                    item: 5,
                    key: None
                },
                CandidateState {
                    source: 1,
                    item: 5,
                    key: None
                },
            ]
        );
        let resumed = Merged::resume(checkpoint).build().unwrap();
        assert_eq!(resumed.into_vec().unwrap(), vec![5, 5]);
    }

    #[test]
    fn keyed_checkpoint_keeps_ties_in_source_order() {
        let data = [vec![(1, 'a'), (2, 'b')], vec![(2, 'c')], vec![(2, 'd')]];
        let key = |&(k, _): &(i32, char)| k;
        let mut m = Merged::new(data.clone().map(VecCursor::new)).by_key(key).build();
        assert_eq!(m.next().unwrap().unwrap(), (1, 'a'));
        let checkpoint = m.into_checkpoint().unwrap();
        assert!(checkpoint.candidates.iter().all(|it| it.key == Some(2)));
        let json = serde_json::to_string(&checkpoint).unwrap();
        let checkpoint: Checkpoint<VecCursor<(i32, char)>, (i32, char), i32> =
            serde_json::from_str(&json).unwrap();
        let rest = Merged::resume(checkpoint).by_key(key).build().unwrap().into_vec().unwrap();
        assert_eq!(rest, [(2, 'b'), (2, 'c'), (2, 'd')]);
    }

    #[test]
    fn reverse_round_trip() {
        let mut m = Merged::new(cursors(&[&[9, 3, 1], &[8, 3]])).reverse().build();
        assert_eq!(m.next().unwrap().unwrap(), 9);
        let checkpoint = m.into_checkpoint().unwrap();
        assert!(checkpoint.reverse);
        assert_eq!(
            Merged::resume(checkpoint.clone()).build().err(),
            Some(CheckpointError::ReverseMismatch {
                checkpoint: true,
                configured: false
            })
        );
        let rest = Merged::resume(checkpoint).reverse().build().unwrap();
        assert_eq!(rest.into_vec().unwrap(), vec![8, 3, 3, 1]);
    }

    #[test]
    fn stash_round_trip() {
        let key = |s: &String| s.parse::<i32>();
        let mut m = Merged::new(vec![
            VecCursor::new(vec!["1".to_owned(), "x".into(), "5".into()]),
            VecCursor::new(vec!["2".to_owned()]),
        ])
        .try_by_key(key)
        .build();
        // "1" isn't yielded until the item after it gets a key
        assert!(matches!(m.next(), Some(Err(MergeError::Key { index: 0, .. }))));
        assert_eq!(m.peek().unwrap().map(String::as_str), Some("1"));
        let checkpoint = m.into_checkpoint().unwrap();
        assert_eq!(
            checkpoint.stashed,
            [StashedItem {
                source: 0,
                item: "x".to_owned()
            }]
        );
        let mut resumed = Merged::resume(checkpoint).try_by_key(key).build().unwrap();
        assert!(matches!(resumed.next(), Some(Err(MergeError::Key { index: 0, .. }))));
    }

    #[test]
    fn priming_interrupted() {
        let src = |v: Vec<Result<i32, &'static str>>| TryIter::new(v.into_iter());
        let mut m = Merged::new([src(vec![Ok(1)]), src(vec![Err("broken"), Ok(2)])]).build();
        assert!(matches!(m.next(), Some(Err(MergeError::Source { index: 1, .. }))));
        let (mut m, err) = m.into_checkpoint().unwrap_err();
        assert_eq!(
            err,
            CheckpointError::PrimingInterrupted {
                primed: 1,
                sources: 2
            }
        );
        assert_eq!(m.next().unwrap().unwrap(), 1);
        assert!(m.checkpoint().is_ok());
    }

    #[test]
    fn added_source_blocks_checkpoint_until_primed() {
        let mut m = Merged::new(cursors(&[&[1, 2]])).build();
        m.next();
        m.add_source(VecCursor::new(vec![0]));
        assert!(matches!(
            m.checkpoint(),
            Err(CheckpointError::PrimingInterrupted {
                primed: 1,
                sources: 2
            })
        ));
        assert_eq!(m.peek().unwrap(), Some(&0));
        assert_eq!(m.checkpoint().unwrap().sources.len(), 2);
    }

    fn started(candidates: Vec<CandidateState<i32, ()>>) -> Checkpoint<VecCursor<i32>, i32> {
        Checkpoint {
            reverse: false,
            started: true,
            sources: cursors(&[&[3], &[4]]),
            candidates,
            stashed: Vec::new(),
        }
    }

    fn candidate(source: usize, item: i32) -> CandidateState<i32, ()> {
        CandidateState {
            source,
            item,
            key: None,
        }
    }

    #[test]
    fn invalid_checkpoints() {
        let err = |c: Checkpoint<VecCursor<i32>, i32>| Merged::resume(c).build().err();

        assert_eq!(
            err(started(vec![candidate(0, 1)])),
            Some(CheckpointError::CandidateCountMismatch {
                candidates: 1,
                sources: 2
            })
        );
        assert_eq!(
            err(started(vec![candidate(0, 1), candidate(2, 2)])),
            Some(CheckpointError::SourceIndexOutOfRange {
                index: 2,
                sources: 2
            })
        );
        assert_eq!(
            err(started(vec![candidate(1, 1), candidate(1, 2)])),
            Some(CheckpointError::DuplicateSourceIndex { index: 1 })
        );
        let mut keyed = started(vec![candidate(0, 1), candidate(1, 2)]);
        keyed.candidates[1].key = Some(());
        assert_eq!(err(keyed), Some(CheckpointError::UnexpectedKey { index: 1 }));

        let mut stashed = started(vec![candidate(0, 1), candidate(1, 2)]);
        stashed.stashed.push(StashedItem { source: 0, item: 2 });
        assert_eq!(err(stashed), Some(CheckpointError::UnexpectedStash { index: 0 }));

        let mut early = started(vec![candidate(0, 1), candidate(1, 2)]);
        early.started = false;
        assert_eq!(
            err(early.clone()),
            Some(CheckpointError::CandidatesBeforeStart { count: 2 })
        );
        early.candidates.clear();
        early.stashed.push(StashedItem { source: 0, item: 2 });
        assert_eq!(err(early), Some(CheckpointError::StashBeforeStart { count: 1 }));

        assert!(err(started(vec![candidate(1, 2), candidate(0, 1)])).is_none());
    }

    #[test]
    fn missing_key() {
        let checkpoint: Checkpoint<VecCursor<i32>, i32, i32> = Checkpoint {
            reverse: false,
            started: true,
            sources: cursors(&[&[5]]),
            candidates: vec![CandidateState {
                source: 0,
                item: 1,
                key: None,
            }],
            stashed: Vec::new(),
        };
        assert_eq!(
            Merged::resume(checkpoint).by_key(|x: &i32| *x).build().err(),
            Some(CheckpointError::MissingKey { index: 0 })
        );
    }

    #[test]
    fn stored_keys_are_trusted() {
        // the key of a restored candidate isn't recomputed
        let checkpoint: Checkpoint<VecCursor<i32>, i32, i32> = Checkpoint {
            reverse: false,
            started: true,
            sources: cursors(&[&[], &[]]),
            candidates: vec![
                CandidateState {
                    source: 0,
                    item: 1,
                    key: Some(10),
                },
                CandidateState {
                    source: 1,
                    item: 2,
                    key: Some(0),
                },
            ],
            stashed: Vec::new(),
        };
        let rest = Merged::resume(checkpoint).by_key(|x: &i32| *x).build().unwrap();
        assert_eq!(rest.into_vec().unwrap(), vec![2, 1]);
    }
}
