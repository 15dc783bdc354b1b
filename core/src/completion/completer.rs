use crate::{
    history,
    store::{self, Counts, Store},
    text,
};
use std::{cmp::Reverse, sync::Arc};

/// Something that can propose continuations of a typed prefix.
pub trait Completer {
    /// All continuations of `prefix`, best first.
    fn complete(&self, prefix: &str) -> Vec<String>;

    fn complete_one(&self, prefix: &str) -> Option<String> {
        self.complete(prefix).drain(..).next()
    }
}

/// Completes from the submitted-line history, ranked by usage count.
pub struct HistoryCompleter {
    store: Arc<dyn Store>,
    max_counts: usize,
}

impl HistoryCompleter {
    pub fn new(store: Arc<dyn Store>, max_counts: usize) -> Self {
        Self {
            store,
            max_counts,
        }
    }

    /// Load usage counts, pruning and writing them back if they have grown
    /// past the cap. A failed write is not an error here; the pruned map is
    /// still used for this search and the next search will try again.
    fn load_counts(&self) -> Counts {
        let mut counts = store::read_counts(&*self.store);

        if history::prune_counts(&mut counts, self.max_counts) {
            if let Err(e) = store::write_counts(&*self.store, &counts) {
                log::debug!("failed to persist pruned usage counts: {}", e);
            }
        }

        counts
    }
}

impl Completer for HistoryCompleter {
    fn complete(&self, prefix: &str) -> Vec<String> {
        let history = store::read_history(&*self.store);
        let counts = self.load_counts();

        if history.is_empty() {
            return Vec::new();
        }

        rank(history, &counts, prefix)
    }
}

/// Filter `history` down to the entries that continue `query` and order
/// them by usage count, most used first, then by length, shortest first.
///
/// An entry continues the query if it starts with it, ignoring case, and has
/// at least one more character. Entries tied on both keys keep their history
/// order.
pub fn rank(history: Vec<String>, counts: &Counts, query: &str) -> Vec<String> {
    let mut candidates = history
        .into_iter()
        .filter(|entry| {
            text::strip_prefix_ignore_case(entry, query).map_or(false, |rest| !rest.is_empty())
        })
        .collect::<Vec<_>>();

    candidates.sort_by_cached_key(|entry| {
        (
            Reverse(counts.get(entry).copied().unwrap_or(0)),
            text::char_len(entry),
        )
    });

    candidates
}
