//! Submitted-line history.
//!
//! The history list is written in chronological order, so the newest entry is
//! always last. A line that is submitted again is moved to the end rather than
//! duplicated, and its usage count goes up by one. Usage counts are the
//! completion engine's ranking signal, so both [`record`] and the engine's
//! read path keep the count map bounded with [`prune_counts`].

use crate::{
    store::{self, Counts, Store},
    Result,
};
use serde::{Deserialize, Serialize};

/// Limits applied when writing history.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HistoryOptions {
    /// Most lines kept in the history list.
    pub max_entries: usize,

    /// Most entries kept in the usage count map.
    pub max_counts: usize,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            max_entries: 200,
            max_counts: 100,
        }
    }
}

/// Record a submitted line. Blank lines are ignored.
pub fn record(store: &dyn Store, line: &str, options: &HistoryOptions) -> Result<()> {
    let line = line.trim();

    if line.is_empty() {
        return Ok(());
    }

    let mut history = store::read_history(store);
    history.retain(|entry| entry != line);
    history.push(line.to_owned());

    if history.len() > options.max_entries {
        let excess = history.len() - options.max_entries;
        history.drain(..excess);
    }

    let mut counts = store::read_counts(store);
    *counts.entry(line.to_owned()).or_insert(0) += 1;
    prune_counts(&mut counts, options.max_counts);

    store::write_history(store, &history)?;
    store::write_counts(store, &counts)?;

    log::trace!("recorded history entry ({} total)", history.len());

    Ok(())
}

/// Drop all but the `limit` most used entries. Returns true if anything was
/// removed.
pub fn prune_counts(counts: &mut Counts, limit: usize) -> bool {
    if counts.len() <= limit {
        return false;
    }

    let mut ranked = counts.drain().collect::<Vec<_>>();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(limit);
    counts.extend(ranked);

    true
}

/// Walks backwards through history in response to up and down keys.
///
/// The list is snapshotted when navigation starts, and the text the user was
/// typing is kept aside so that walking forward past the newest entry gives
/// it back.
#[derive(Debug, Default)]
pub struct HistoryNavigator {
    entries: Vec<String>,
    // Index into `entries` of the entry currently shown, if navigating.
    index: Option<usize>,
    draft: String,
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.index.is_some()
    }

    /// Whether there is an older entry to move to.
    pub fn has_older(&self, store: &dyn Store) -> bool {
        match self.index {
            Some(index) => index > 0,
            None => !store::read_history(store).is_empty(),
        }
    }

    /// Move to the next older entry. `draft` is the current input, saved if
    /// this starts navigation, in which case a fresh snapshot of the history
    /// is taken from `store`.
    pub fn older(&mut self, store: &dyn Store, draft: &str) -> Option<&str> {
        let index = match self.index {
            Some(0) => return None,
            Some(index) => index - 1,
            None => {
                self.entries = store::read_history(store);

                if self.entries.is_empty() {
                    return None;
                }

                self.draft = draft.to_owned();
                self.entries.len() - 1
            }
        };

        self.index = Some(index);
        self.entries.get(index).map(String::as_str)
    }

    /// Move to the next newer entry, or back to the saved draft past the
    /// newest. Returns `None` if not navigating.
    pub fn newer(&mut self) -> Option<String> {
        let index = self.index?;

        if index + 1 < self.entries.len() {
            self.index = Some(index + 1);
            return self.entries.get(index + 1).cloned();
        }

        let draft = std::mem::take(&mut self.draft);
        self.reset();

        Some(draft)
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        self.index = None;
        self.draft.clear();
    }
}
