use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{AppConfig, StoreBackend};
use crate::error::StoreError;

/// String-keyed persistence with opaque string values.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

pub fn open_store(config: &AppConfig) -> Result<Arc<dyn KeyValueStore>> {
    if config.store_backend == StoreBackend::Memory {
        return Ok(Arc::new(MemoryStore::new()));
    }
    let path = config
        .resolved_store_path()
        .context("unable to resolve store path")?;
    match config.store_backend {
        StoreBackend::Sqlite => {
            let store = SqliteStore::open(&path)
                .with_context(|| format!("open sqlite store {}", path.display()))?;
            Ok(Arc::new(store))
        }
        _ => {
            let store = JsonFileStore::open(path);
            debug!(path = %store.path().display(), "using json store");
            Ok(Arc::new(store))
        }
    }
}

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
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let guard = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut guard = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut guard = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        guard.remove(key);
        Ok(())
    }
}

const STORE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct StoreFile {
    version: u32,
    entries: BTreeMap<String, String>,
}

/// All keys in one JSON file, rewritten through a temp file and rename.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(&self) -> Result<StoreFile, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(StoreFile::default()),
            Err(err) => return Err(err.into()),
        };
        let file = serde_json::from_str::<StoreFile>(&raw)?;
        if file.version != STORE_VERSION {
            warn!(
                version = file.version,
                path = %self.path.display(),
                "ignoring store file with unknown version"
            );
            return Ok(StoreFile::default());
        }
        Ok(file)
    }

    pub fn corrupt_backup_path(&self) -> PathBuf {
        self.path.with_extension("json.corrupt")
    }

    // Unreadable files are moved aside rather than blocking every later write.
    // A failed move aborts the write so the original is never overwritten.
    fn read_file_for_update(&self) -> Result<StoreFile, StoreError> {
        match self.read_file() {
            Err(StoreError::Encode(err)) => {
                let backup = self.corrupt_backup_path();
                fs::rename(&self.path, &backup)?;
                warn!(
                    %err,
                    path = %self.path.display(),
                    backup = %backup.display(),
                    "moved unreadable store file aside"
                );
                Ok(StoreFile::default())
            }
            other => other,
        }
    }

    fn write_file(&self, file: &mut StoreFile) -> Result<(), StoreError> {
        file.version = STORE_VERSION;
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let json = serde_json::to_string(file)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let file = self.read_file()?;
        Ok(file.entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut file = self.read_file_for_update()?;
        file.entries.insert(key.to_string(), value.to_string());
        self.write_file(&mut file)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut file = self.read_file_for_update()?;
        if file.entries.remove(key).is_none() {
            return Ok(());
        }
        self.write_file(&mut file)
    }
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let value = conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        conn.execute(
            "INSERT INTO kv(key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::process;
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::{JsonFileStore, KeyValueStore, MemoryStore, SqliteStore};

    fn scratch_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        std::env::temp_dir()
            .join(format!("gegenpress-store-{}-{nanos}", process::id()))
            .join(name)
    }

    fn exercise(store: &dyn KeyValueStore) {
        assert_eq!(store.get("missing").unwrap(), None);
        store.set("a", "1").unwrap();
        store.set("b", "two").unwrap();
        store.set("a", "3").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("3"));
        assert_eq!(store.get("b").unwrap().as_deref(), Some("two"));
        store.remove("a").unwrap();
        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.get("b").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn memory_store_get_set_remove() {
        exercise(&MemoryStore::new());
    }

    #[test]
    fn sqlite_store_get_set_remove() {
        exercise(&SqliteStore::open_in_memory().expect("in-memory sqlite"));
    }

    #[test]
    fn json_store_get_set_remove_and_reopen() {
        let path = scratch_path("store.json");
        {
            let store = JsonFileStore::open(&path);
            exercise(&store);
        }
        let reopened = JsonFileStore::open(&path);
        assert_eq!(reopened.get("b").unwrap().as_deref(), Some("two"));
        if let Some(dir) = path.parent() {
            let _ = fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn json_store_recovers_from_corrupt_file_on_write() {
        let path = scratch_path("store.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{not json").unwrap();

        let store = JsonFileStore::open(&path);
        assert!(store.get("a").is_err());
        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        let backup = fs::read_to_string(store.corrupt_backup_path()).unwrap();
        assert_eq!(backup, "{not json");
        if let Some(dir) = path.parent() {
            let _ = fs::remove_dir_all(dir);
        }
    }
}
