use std::cmp::Ordering;

use resumable_merge::{Checkpoint, Merged, VecCursor};
use serde::{Deserialize, Serialize};

/// Wrapper for an item and its iterator index
/// Has the same ordering as the item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledItem<T> {
    pub item: T,
    pub iter_idx: usize,
}

impl<T: Ord> Ord for LabeledItem<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.item.cmp(&other.item)
    }
}

impl<T: PartialOrd> PartialOrd for LabeledItem<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.item.partial_cmp(&other.item)
    }
}

impl<T: PartialEq> PartialEq for LabeledItem<T> {
    fn eq(&self, other: &Self) -> bool {
        self.item == other.item
    }
}

impl<T> Eq for LabeledItem<T> where T: Eq {}

struct MergeChecker<'a, T> {
    items: Vec<&'a [T]>,
    orig: &'a Vec<Vec<T>>,
}

impl<'a, T> MergeChecker<'a, T>
where
    T: core::fmt::Debug + Ord,
{
    fn new(items: &'a Vec<Vec<T>>) -> Self {
        Self {
            orig: items,
            items: Vec::new(),
        }
    }

    fn check_merge(&mut self, merge: impl IntoIterator<Item = LabeledItem<T>>, reverse: bool) {
        // reset:
        self.items.clear();
        self.items
            .extend(self.orig.iter().map(AsRef::<[T]>::as_ref));
        merge
            .into_iter()
            .for_each(|choice| self.check_choice(&choice, reverse));

        assert!(
            self.items.iter().all(|it| it.is_empty()),
            "Some items are not consumed"
        );
    }

    fn check_choice(&mut self, choice: &LabeledItem<T>, reverse: bool) {
        for (iter_idx, item) in self
            .items
            .iter()
            .enumerate()
            .filter_map(|(iter_idx, items)| items.first().map(|item| (iter_idx, item)))
        {
            let ord = if reverse {
                choice.item.cmp(item)
            } else {
                item.cmp(&choice.item)
            };
            match ord {
                Ordering::Less => {
                    panic!(
                        "item {item:?} from iterator {iter_idx} should've been chosen instead of {choice:?}",
                    )
                }
                Ordering::Equal => {
                    assert!(
                        iter_idx >= choice.iter_idx,
                        "item from earlier iterator {iter_idx} should've been chosen instead of {choice:?}"
                    );
                }
                Ordering::Greater => {}
            }
        }
        let Some((item, rest)) = self.items[choice.iter_idx].split_first() else {
            panic!("item was consumed from empty iterator {}", choice.iter_idx);
        };

        assert_eq!(item, &choice.item);
        self.items[choice.iter_idx] = rest;
    }
}

/// Merges `input` in every supported way and checks the order of every result
pub fn test_all_merges<T>(input: &Vec<Vec<T>>)
where
    T: Ord + core::fmt::Debug + Copy + Serialize + for<'de> Deserialize<'de>,
{
    let mkiter = || {
        input.iter().enumerate().map(|(iter_idx, items)| {
            items
                .iter()
                .copied()
                .map(move |item| LabeledItem { item, iter_idx })
        })
    };
    let mkcursors = || mkiter().map(|it| it.collect::<VecCursor<_>>()).collect::<Vec<_>>();

    let mut checker = MergeChecker::new(input);

    for reverse in [false, true] {
        checker.check_merge(
            Merged::new(mkiter())
                .with_reverse(reverse)
                .build()
                .map(Result::unwrap),
            reverse,
        );
        checker.check_merge(
            Merged::new(mkiter())
                .with_reverse(reverse)
                .build()
                .into_vec()
                .unwrap(),
            reverse,
        );
        checker.check_merge(
            Merged::new(mkiter())
                .by_key(|it: &LabeledItem<T>| it.item)
                .with_reverse(reverse)
                .build()
                .map(Result::unwrap),
            reverse,
        );

        // interrupted in the middle and resumed from a serialized checkpoint
        let total = input.iter().map(Vec::len).sum::<usize>();
        let mut merged = Merged::new(mkcursors()).with_reverse(reverse).build();
        let mut items: Vec<_> = merged.by_ref().take(total / 2).map(Result::unwrap).collect();
        let json = serde_json::to_string(&merged.checkpoint().unwrap()).unwrap();
        let checkpoint: Checkpoint<VecCursor<LabeledItem<T>>, LabeledItem<T>> =
            serde_json::from_str(&json).unwrap();
        items.extend(
            Merged::resume(checkpoint)
                .with_reverse(reverse)
                .build()
                .unwrap()
                .map(Result::unwrap),
        );
        checker.check_merge(items, reverse);
    }
}
