/// Persistent key-value storage
///
/// Backs both the collection cache and the favorites sets.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};

use crate::error::{CatalogueError, Result};

/// A profile-scoped persistent key-value store.
///
/// Values are JSON text. Reads and writes complete before returning;
/// writes to different keys are independent (no transactions across keys).
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Returns true if it existed.
    fn remove(&self, key: &str) -> Result<bool>;
}

/// The SqliteStore keeps the catalogue's key-value data in a SQLite file.
/// It holds cached collections and favorites.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open the store inside `data_dir`, creating the directory and schema.
    ///
    /// The default data directory is:
    /// - Linux: ~/.local/share/art-catalogue/
    /// - macOS: ~/Library/Application Support/art-catalogue/
    /// - Windows: %APPDATA%\art-catalogue\
    pub fn open_in(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        Self::open(&data_dir.join("catalogue.db"))
    }

    /// Open (or create) the database file at `db_path`
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        tracing::debug!(path = %db_path.display(), "opened local store");

        let store = SqliteStore {
            conn: Mutex::new(conn),
            db_path: db_path.to_path_buf(),
        };
        store.init_schema()?;

        Ok(store)
    }

    /// Open a private in-memory database (nothing survives the process)
    pub fn open_in_memory() -> Result<Self> {
        let store = SqliteStore {
            conn: Mutex::new(Connection::open_in_memory()?),
            db_path: PathBuf::from(":memory:"),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create the key-value table if it doesn't exist
    fn init_schema(&self) -> Result<()> {
        self.conn()?.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key         TEXT PRIMARY KEY,
                value       TEXT NOT NULL,
                updated_at  INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CatalogueError::Poisoned)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// When `key` was last written (unix seconds)
    pub fn updated_at(&self, key: &str) -> Result<Option<i64>> {
        let ts = self
            .conn()?
            .query_row("SELECT updated_at FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(ts)
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn()?
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            rusqlite::params![key, value, Utc::now().timestamp()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let deleted = self.conn()?.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(deleted > 0)
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("db_path", &self.db_path)
            .finish()
    }
}

/// HashMap-backed store for tests and throwaway sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().map_err(|_| CatalogueError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| CatalogueError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let mut entries = self.entries.lock().map_err(|_| CatalogueError::Poisoned)?;
        Ok(entries.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_set_get_remove() {
        let store = SqliteStore::open_in_memory().unwrap();

        assert_eq!(store.get("galleries").unwrap(), None);

        store.set("galleries", "[]").unwrap();
        store.set("galleries", "[1]").unwrap();
        assert_eq!(store.get("galleries").unwrap().as_deref(), Some("[1]"));
        assert!(store.updated_at("galleries").unwrap().is_some());

        assert!(store.remove("galleries").unwrap());
        assert!(!store.remove("galleries").unwrap());
        assert_eq!(store.get("galleries").unwrap(), None);
    }

    #[test]
    fn test_sqlite_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = SqliteStore::open_in(dir.path()).unwrap();
            store.set("paintingFavorites", r#"[{"paintingId":5}]"#).unwrap();
        }

        let reopened = SqliteStore::open_in(dir.path()).unwrap();
        assert_eq!(
            reopened.get("paintingFavorites").unwrap().as_deref(),
            Some(r#"[{"paintingId":5}]"#)
        );
        assert_eq!(reopened.path(), dir.path().join("catalogue.db"));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        assert!(store.remove("a").unwrap());
        assert_eq!(store.get("a").unwrap(), None);
    }
}
