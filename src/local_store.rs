use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::StorageError;
use crate::model::RecordKind;

/// Synchronous key-value persistence, one JSON blob per record kind.
pub trait LocalStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_raw(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Reads and decodes a record. A missing, unreadable or corrupt record is
/// logged and reported as absent.
pub fn read_record<T: DeserializeOwned>(store: &dyn LocalStore, kind: RecordKind) -> Option<T> {
    match try_read_record(store, kind) {
        Ok(value) => value,
        Err(err) => {
            warn!(key = kind.storage_key(), error = %err, "local read failed, treating as miss");
            None
        }
    }
}

pub fn try_read_record<T: DeserializeOwned>(
    store: &dyn LocalStore,
    kind: RecordKind,
) -> Result<Option<T>, StorageError> {
    let key = kind.storage_key();
    let Some(raw) = store.get_raw(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StorageError::Corrupt { key, source })
}

/// Encodes and writes a record. Failures are logged and swallowed.
pub fn write_record<T: Serialize>(store: &dyn LocalStore, kind: RecordKind, value: &T) {
    if let Err(err) = try_write_record(store, kind, value) {
        warn!(key = kind.storage_key(), error = %err, "local write failed");
    }
}

pub fn try_write_record<T: Serialize>(
    store: &dyn LocalStore,
    kind: RecordKind,
    value: &T,
) -> Result<(), StorageError> {
    let key = kind.storage_key();
    let json =
        serde_json::to_string(value).map_err(|source| StorageError::Serialize { key, source })?;
    store.set_raw(key, &json)
}

pub fn clear_record(store: &dyn LocalStore, kind: RecordKind) {
    if let Err(err) = store.remove(kind.storage_key()) {
        warn!(key = kind.storage_key(), error = %err, "local remove failed");
    }
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn init_schema(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

impl LocalStore for SqliteStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            r#"
            INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coordinate, Formation};

    #[test]
    fn corrupt_record_reads_as_absent() {
        let store = MemoryStore::new();
        store
            .set_raw(RecordKind::Favorites.storage_key(), "{not json")
            .unwrap();
        let read: Option<Vec<crate::model::Player>> = read_record(&store, RecordKind::Favorites);
        assert!(read.is_none());
        assert!(matches!(
            try_read_record::<Vec<crate::model::Player>>(&store, RecordKind::Favorites),
            Err(StorageError::Corrupt { .. })
        ));
    }

    #[test]
    fn sqlite_upsert_overwrites() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut formation = Formation::default();
        formation
            .players
            .insert("1".to_string(), Coordinate::new(10.0, 20.0));
        write_record(&store, RecordKind::Formation, &formation);
        formation
            .players
            .insert("1".to_string(), Coordinate::new(30.0, 40.0));
        write_record(&store, RecordKind::Formation, &formation);

        let read: Formation = read_record(&store, RecordKind::Formation).unwrap();
        assert_eq!(read.players["1"], Coordinate::new(30.0, 40.0));

        clear_record(&store, RecordKind::Formation);
        assert!(read_record::<Formation>(&store, RecordKind::Formation).is_none());
    }
}
