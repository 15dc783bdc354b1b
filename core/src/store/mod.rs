//! Key-value persistence for history, usage counts and settings.
//!
//! Everything the completion engine knows is read through the [`Store`]
//! contract: a synchronous, string-keyed, string-valued map in the style of
//! browser local storage. Structured values are stored as JSON under a
//! handful of well-known keys:
//!
//! ## `ghostline.history`
//!
//! A JSON array of previously submitted lines, oldest first. The completion
//! engine only ever reads this key; it is written by [`crate::history::record`].
//!
//! ## `ghostline.history.counts`
//!
//! A JSON object mapping a submitted line to the number of times it has been
//! submitted. Used as a ranking signal only, so the map is pruned down to its
//! most used entries whenever it grows past its cap.
//!
//! ## `ghostline.completion.enabled`
//!
//! The user's completion toggle. Absent or any value other than the literal
//! string `"false"` means enabled.

use crate::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use tokio::sync::broadcast;

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

pub const HISTORY_KEY: &str = "ghostline.history";
pub const COUNTS_KEY: &str = "ghostline.history.counts";
pub const ENABLED_KEY: &str = "ghostline.completion.enabled";

/// Usage count per submitted line.
pub type Counts = HashMap<String, u64>;

/// Notification that another context changed a key.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StoreChange {
    pub key: String,

    /// New value, or `None` if the key was removed.
    pub value: Option<String>,
}

/// A synchronous key-value store.
pub trait Store: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// Subscribe to changes made by other contexts sharing this store.
    ///
    /// Writes made through `self` are not reported. Backends that cannot
    /// observe foreign writes return `None`, and callers fall back to polling.
    fn subscribe(&self) -> Option<broadcast::Receiver<StoreChange>> {
        None
    }
}

/// Read the submitted-line history, oldest first.
pub fn read_history(store: &dyn Store) -> Vec<String> {
    read_json(store, HISTORY_KEY)
}

pub fn write_history(store: &dyn Store, history: &[String]) -> Result<()> {
    write_json(store, HISTORY_KEY, &history)
}

pub fn read_counts(store: &dyn Store) -> Counts {
    read_json(store, COUNTS_KEY)
}

pub fn write_counts(store: &dyn Store, counts: &Counts) -> Result<()> {
    write_json(store, COUNTS_KEY, counts)
}

pub fn read_enabled(store: &dyn Store) -> bool {
    flag_enabled(store.get(ENABLED_KEY).as_deref())
}

pub fn write_enabled(store: &dyn Store, enabled: bool) -> Result<()> {
    store.set(ENABLED_KEY, if enabled { "true" } else { "false" })
}

/// Interpret a stored flag value. Only the literal `"false"` disables.
pub fn flag_enabled(value: Option<&str>) -> bool {
    value != Some("false")
}

fn read_json<T: DeserializeOwned + Default>(store: &dyn Store, key: &str) -> T {
    let raw = match store.get(key) {
        Some(raw) => raw,
        None => return T::default(),
    };

    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            log::debug!("ignoring malformed value for '{}': {}", key, e);
            T::default()
        }
    }
}

fn write_json<T: Serialize + ?Sized>(store: &dyn Store, key: &str, value: &T) -> Result<()> {
    store.set(key, &serde_json::to_string(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_is_enabled_unless_literal_false() {
        assert!(flag_enabled(None));
        assert!(flag_enabled(Some("true")));
        assert!(flag_enabled(Some("0")));
        assert!(flag_enabled(Some("FALSE")));
        assert!(!flag_enabled(Some("false")));
    }

    #[test]
    fn malformed_json_degrades_to_empty() {
        let store = MemoryStore::new();
        store.set(HISTORY_KEY, "not json").unwrap();
        store.set(COUNTS_KEY, "[1, 2]").unwrap();

        assert!(read_history(&store).is_empty());
        assert!(read_counts(&store).is_empty());
    }

    #[test]
    fn typed_values_round_trip() {
        let store = MemoryStore::new();
        write_history(&store, &["ls".to_owned(), "cargo test".to_owned()]).unwrap();

        let mut counts = Counts::new();
        counts.insert("ls".into(), 3);
        write_counts(&store, &counts).unwrap();

        assert_eq!(read_history(&store), vec!["ls", "cargo test"]);
        assert_eq!(read_counts(&store).get("ls"), Some(&3));

        write_enabled(&store, false).unwrap();
        assert!(!read_enabled(&store));
        store.remove(ENABLED_KEY).unwrap();
        assert!(read_enabled(&store));
    }
}
