use super::Store;
use crate::{Error, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::{
    path::Path,
    sync::{Mutex, MutexGuard, PoisonError},
};

/// A store backed by a SQLite database file.
///
/// Values live in a single `kv` table keyed by name. Several processes may
/// share one file; they do not notify each other, so settings written by one
/// are picked up by the others when they next poll.
pub struct SqliteStore {
    db: Mutex<Connection>,
}

impl SqliteStore {
    /// Open a store file, creating it if necessary.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Create a temporary in-memory store.
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(connection: Connection) -> Result<Self> {
        match get_version(&connection)? {
            0 => instrument(&connection)?,
            1 => {}
            version => return Err(Error::UnknownVersion(version)),
        }

        Ok(Self {
            db: Mutex::new(connection),
        })
    }

    fn db(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn get_version(db: &Connection) -> Result<i64> {
    Ok(db.query_row("PRAGMA user_version", params![], |row| row.get(0))?)
}

fn instrument(db: &Connection) -> Result<()> {
    // Another process may have created the schema since the version was read.
    db.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL,
            updated INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        PRAGMA user_version = 1;
    ",
    )?;

    Ok(())
}

impl Store for SqliteStore {
    fn get(&self, key: &str) -> Option<String> {
        let result = self
            .db()
            .query_row("SELECT value FROM kv WHERE key = ?", params![key], |row| row.get(0))
            .optional();

        match result {
            Ok(value) => value,
            Err(e) => {
                log::warn!("failed to read '{}' from store: {}", key, e);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.db().execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated = strftime('%s', 'now')",
            params![key, value],
        )?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.db().execute("DELETE FROM kv WHERE key = ?", params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let store = SqliteStore::in_memory().unwrap();

        assert_eq!(store.get("missing"), None);

        store.set("key", "one").unwrap();
        store.set("key", "two").unwrap();
        assert_eq!(store.get("key").as_deref(), Some("two"));

        store.remove("key").unwrap();
        assert_eq!(store.get("key"), None);
        assert!(store.subscribe().is_none());
    }

    #[test]
    fn reopening_a_file_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");

        SqliteStore::open(&path).unwrap().set("key", "value").unwrap();

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get("key").as_deref(), Some("value"));
    }

    #[test]
    fn concurrent_first_open_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");

        let first = Connection::open(&path).unwrap();
        let second = Connection::open(&path).unwrap();

        // Both saw version 0 before either created the schema.
        assert_eq!(get_version(&first).unwrap(), 0);
        assert_eq!(get_version(&second).unwrap(), 0);

        instrument(&first).unwrap();
        instrument(&second).unwrap();

        let first = SqliteStore::from_connection(first).unwrap();
        let second = SqliteStore::from_connection(second).unwrap();

        first.set("key", "value").unwrap();
        assert_eq!(second.get("key").as_deref(), Some("value"));
    }

    #[test]
    fn rejects_unknown_versions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");

        Connection::open(&path)
            .unwrap()
            .execute_batch("PRAGMA user_version = 7;")
            .unwrap();

        assert!(matches!(SqliteStore::open(&path), Err(Error::UnknownVersion(7))));
    }
}
