//! SQLite-backed persistence.
//!
//! The tracker document lives in a single row of a key-value table. Hosts may
//! keep their own small values (for example live timers) in the same table.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::debug;

use super::{data_dir, PersistenceStore};
use crate::error::{Result, StorageError};

/// Key under which the tracker document is stored.
pub const TRACKER_DATA_KEY: &str = "tracker_data";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open the store at `~/.config/lifelog/lifelog.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("lifelog.db");
        Self::open_at(&path)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "opened sqlite store");
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );",
            )
            .map_err(StorageError::from)?;
        Ok(())
    }

    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(StorageError::from)?;
        Ok(value)
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .map_err(StorageError::from)?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(StorageError::from)?;
        Ok(())
    }
}

impl PersistenceStore for SqliteStore {
    fn load(&self) -> Result<Option<String>> {
        self.kv_get(TRACKER_DATA_KEY)
    }

    fn save(&self, document: &str) -> Result<()> {
        self.kv_set(TRACKER_DATA_KEY, document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_store() {
        let store = SqliteStore::open_memory().unwrap();
        assert!(store.kv_get("test").unwrap().is_none());
        store.kv_set("test", "hello").unwrap();
        store.kv_set("test", "again").unwrap();
        assert_eq!(store.kv_get("test").unwrap().unwrap(), "again");
        store.kv_delete("test").unwrap();
        assert!(store.kv_get("test").unwrap().is_none());
    }

    #[test]
    fn document_lives_under_tracker_key() {
        let store = SqliteStore::open_memory().unwrap();
        assert!(store.load().unwrap().is_none());
        store.save(r#"{"gym_days":[2]}"#).unwrap();
        assert_eq!(
            store.kv_get(TRACKER_DATA_KEY).unwrap().as_deref(),
            Some(r#"{"gym_days":[2]}"#)
        );
    }
}
