use super::{Store, StoreChange};
use crate::{Error, Result};
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};
use tokio::sync::broadcast;

/// An in-process store, the equivalent of a single window's local storage.
///
/// Writes through [`Store::set`] are treated as coming from the owning
/// context and are not broadcast. Use [`MemoryStore::apply_external`] to
/// simulate a write made by another context, which is.
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
    changes: broadcast::Sender<StoreChange>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            quota: None,
            changes: broadcast::channel(16).0,
        }
    }

    /// Create a store that rejects writes once keys and values together would
    /// exceed `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::new()
        }
    }

    /// Apply a write from another context and notify subscribers.
    pub fn apply_external(&self, key: &str, value: Option<&str>) {
        {
            let mut entries = self.entries();

            match value {
                Some(value) => entries.insert(key.to_owned(), value.to_owned()),
                None => entries.remove(key),
            };
        }

        // No receivers is fine.
        let _ = self.changes.send(StoreChange {
            key: key.to_owned(),
            value: value.map(String::from),
        });
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries();

        if let Some(quota) = self.quota {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();

            if others + key.len() + value.len() > quota {
                return Err(Error::QuotaExceeded {
                    quota,
                });
            }
        }

        entries.insert(key.to_owned(), value.to_owned());

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<StoreChange>> {
        Some(self.changes.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_rejects_oversized_writes() {
        let store = MemoryStore::with_quota(16);

        store.set("a", "0123456789").unwrap();
        assert!(matches!(store.set("b", "0123456789"), Err(Error::QuotaExceeded { quota: 16 })));

        // Replacing an existing key only counts the new value.
        store.set("a", "0123456789abcde").unwrap();
        assert_eq!(store.get("a").as_deref(), Some("0123456789abcde"));
        assert_eq!(store.get("b"), None);
    }

    #[test]
    fn only_external_writes_are_broadcast() {
        let store = MemoryStore::new();
        let mut changes = store.subscribe().unwrap();

        store.set("key", "local").unwrap();
        assert!(changes.try_recv().is_err());

        store.apply_external("key", Some("remote"));
        assert_eq!(
            changes.try_recv().unwrap(),
            StoreChange {
                key: "key".into(),
                value: Some("remote".into()),
            }
        );
        assert_eq!(store.get("key").as_deref(), Some("remote"));

        store.apply_external("key", None);
        assert_eq!(changes.try_recv().unwrap().value, None);
        assert_eq!(store.get("key"), None);
    }
}
