//! Debounced ghost-text completion from input history.
//!
//! [`HistoryCompletion`] is fed the full input text on every change. Once the
//! input has been still for the debounce window, the history is searched for
//! the best continuation of what has been typed and the untyped remainder is
//! exposed as a [`Suggestion`] for the caller to render after the cursor.
//!
//! Only one search is ever pending: each update cancels the previous timer and
//! a generation counter discards any search that was overtaken while running.
//! The user's on/off toggle lives in the store and is tracked by a background
//! task that listens for change notifications from other contexts and polls
//! for changes made in this one.

use crate::{
    store::{self, Store, StoreChange, ENABLED_KEY},
    text, Result,
};
use serde::{Deserialize, Serialize};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};
use tokio::{
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

mod completer;

pub use completer::{rank, Completer, HistoryCompleter};

/// Tuning knobs for the completion engine.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CompletionOptions {
    /// Shortest cleaned query, in characters, that is searched for.
    pub min_length: usize,

    /// How long the input must be still before searching.
    pub debounce_ms: u64,

    /// How often the enabled flag is re-read from the store. Zero is treated
    /// as one millisecond.
    pub poll_interval_ms: u64,

    /// Most entries kept in the usage count map.
    pub max_counts: usize,
}

impl CompletionOptions {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            min_length: 2,
            debounce_ms: 100,
            poll_interval_ms: 1000,
            max_counts: 100,
        }
    }
}

/// A history entry that continues the current query.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Suggestion {
    full: String,
    suffix: String,
}

impl Suggestion {
    /// Returns `None` unless `full` continues `query` by at least one
    /// character.
    pub fn new(full: String, query: &str) -> Option<Self> {
        let suffix = text::strip_prefix_ignore_case(&full, query)?;

        if suffix.is_empty() {
            return None;
        }

        Some(Self {
            suffix: suffix.to_owned(),
            full,
        })
    }

    /// The complete history entry.
    pub fn full(&self) -> &str {
        &self.full
    }

    /// The part of the entry that has not been typed yet.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

#[derive(Default)]
struct State {
    // Bumped by every update, clear and accept.
    generation: u64,
    last_query: Option<String>,
    suggestion: Option<Suggestion>,
}

struct Shared {
    store: Arc<dyn Store>,
    completer: HistoryCompleter,
    options: CompletionOptions,
    enabled: AtomicBool,
    state: Mutex<State>,
    listeners: Mutex<Vec<flume::Sender<()>>>,
}

/// Ghost-text completion engine for one input box.
///
/// Must be created inside a Tokio runtime. Dropping the engine stops its
/// timers and its watch on the enabled flag.
pub struct HistoryCompletion {
    shared: Arc<Shared>,
    pending: Mutex<Option<JoinHandle<()>>>,
    watcher: JoinHandle<()>,
}

impl HistoryCompletion {
    pub fn new(store: Arc<dyn Store>, options: CompletionOptions) -> Self {
        let shared = Arc::new(Shared {
            completer: HistoryCompleter::new(store.clone(), options.max_counts),
            enabled: AtomicBool::new(store::read_enabled(&*store)),
            store,
            options,
            state: Mutex::new(State::default()),
            listeners: Mutex::new(Vec::new()),
        });

        Self {
            watcher: spawn_watcher(shared.clone()),
            shared,
            pending: Mutex::new(None),
        }
    }

    pub fn options(&self) -> &CompletionOptions {
        &self.shared.options
    }

    /// Feed the current input text. Call on every change.
    pub fn update_query(&self, text: &str) {
        let query = text::clean(text);

        if query.is_empty() || text::char_len(&query) < self.shared.options.min_length {
            self.cancel_pending();
            self.shared.reset();
            return;
        }

        let generation = self.shared.next_generation();
        let shared = self.shared.clone();
        let delay = self.shared.options.debounce();

        let task = tokio::spawn(async move {
            time::sleep(delay).await;
            shared.search(generation, query);
        });

        if let Some(previous) = self.pending().replace(task) {
            previous.abort();
        }
    }

    /// Drop any suggestion and pending search, e.g. after the input was
    /// submitted or reset.
    pub fn clear(&self) {
        self.cancel_pending();
        self.shared.reset();
    }

    /// Take the current suggestion, returning the full history entry.
    ///
    /// Accepting clears the suggestion, so a second call returns `None` until
    /// a new search produces one.
    pub fn apply_suggestion(&self) -> Option<String> {
        let accepted = {
            let mut state = self.shared.state();
            let suggestion = state.suggestion.take()?;

            state.generation += 1;
            state.last_query = None;

            suggestion.full
        };

        self.cancel_pending();
        self.shared.notify();

        Some(accepted)
    }

    pub fn suggestion(&self) -> Option<Suggestion> {
        self.shared.state().suggestion.clone()
    }

    /// The text to render after the cursor, or an empty string.
    pub fn suffix(&self) -> String {
        self.shared
            .state()
            .suggestion
            .as_ref()
            .map(|s| s.suffix.clone())
            .unwrap_or_default()
    }

    /// The part of the current suggestion that still extends `text`, if any.
    ///
    /// A suggestion outlives the keystrokes typed during its debounce window,
    /// so this is what a caller should draw or accept for the live input.
    pub fn suffix_for(&self, text: &str) -> Option<String> {
        let query = text::clean(text);
        let state = self.shared.state();
        let full = state.suggestion.as_ref()?.full();

        text::strip_prefix_ignore_case(full, &query)
            .filter(|rest| !rest.is_empty())
            .map(String::from)
    }

    pub fn has_suggestion(&self) -> bool {
        self.shared.state().suggestion.is_some()
    }

    /// The query the most recent search ran for.
    pub fn last_query(&self) -> Option<String> {
        self.shared.state().last_query.clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.enabled.load(Ordering::SeqCst)
    }

    /// Persist the completion toggle and apply it immediately.
    pub fn set_enabled(&self, enabled: bool) -> Result<()> {
        store::write_enabled(&*self.shared.store, enabled)?;
        self.shared.apply_enabled(enabled);

        if !enabled {
            self.cancel_pending();
        }

        Ok(())
    }

    /// Get a channel that receives a message whenever the suggestion changes.
    pub fn subscribe(&self) -> flume::Receiver<()> {
        let (sender, receiver) = flume::unbounded();
        self.shared.listeners().push(sender);
        receiver
    }

    fn cancel_pending(&self) {
        if let Some(task) = self.pending().take() {
            task.abort();
        }
    }

    fn pending(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for HistoryCompletion {
    fn drop(&mut self) {
        self.cancel_pending();
        self.watcher.abort();
    }
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn listeners(&self) -> MutexGuard<'_, Vec<flume::Sender<()>>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn next_generation(&self) -> u64 {
        let mut state = self.state();
        state.generation += 1;
        state.generation
    }

    /// Forget the last query and suggestion, and invalidate in-flight searches.
    fn reset(&self) {
        let changed = {
            let mut state = self.state();
            state.generation += 1;
            state.last_query = None;
            state.suggestion.take().is_some()
        };

        if changed {
            self.notify();
        }
    }

    fn search(&self, generation: u64, query: String) {
        let suggestion = if self.is_enabled() && text::char_len(&query) >= self.options.min_length {
            self.completer
                .complete_one(&query)
                .and_then(|full| Suggestion::new(full, &query))
        } else {
            None
        };

        let changed = {
            let mut state = self.state();

            if state.generation != generation {
                log::trace!("discarding superseded search for '{}'", query);
                return;
            }

            log::trace!(
                "search for '{}' found {:?}",
                query,
                suggestion.as_ref().map(Suggestion::full)
            );

            state.last_query = Some(query);
            let changed = state.suggestion != suggestion;
            state.suggestion = suggestion;
            changed
        };

        if changed {
            self.notify();
        }
    }

    fn apply_enabled(&self, enabled: bool) {
        if self.enabled.swap(enabled, Ordering::SeqCst) == enabled {
            return;
        }

        log::debug!("history completion {}", if enabled { "enabled" } else { "disabled" });

        if !enabled {
            self.reset();
        }
    }

    fn notify(&self) {
        self.listeners().retain(|sender| sender.send(()).is_ok());
    }
}

/// Track the enabled flag: immediately on notifications from other contexts,
/// and on a fixed interval for writes that do not produce one.
fn spawn_watcher(shared: Arc<Shared>) -> JoinHandle<()> {
    let mut changes = shared.store.subscribe();
    let period = shared.options.poll_interval();

    tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    shared.apply_enabled(store::read_enabled(&*shared.store));
                }
                change = next_change(&mut changes) => {
                    if change.key == ENABLED_KEY {
                        shared.apply_enabled(store::flag_enabled(change.value.as_deref()));
                    }
                }
            }
        }
    })
}

/// Wait for the next change notification. Never resolves if the store cannot
/// notify or has stopped doing so.
async fn next_change(changes: &mut Option<broadcast::Receiver<StoreChange>>) -> StoreChange {
    loop {
        let receiver = match changes.as_mut() {
            Some(receiver) => receiver,
            None => return std::future::pending().await,
        };

        match receiver.recv().await {
            Ok(change) => return change,
            Err(RecvError::Lagged(skipped)) => {
                log::debug!("missed {} store change notifications", skipped);
            }
            Err(RecvError::Closed) => *changes = None,
        }
    }
}
