//! Backends store raw JSON text; encoding lives in [`load_json`] / [`save_json`].

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};

const SCHEMA_SQL: &str = "CREATE TABLE IF NOT EXISTS kv_items (
   key TEXT PRIMARY KEY,
   value TEXT NOT NULL,
   updated_at TEXT NOT NULL
 );";

pub trait KeyValueStore: Send + Sync {
  /// Returns the raw JSON stored under `key`, or `None` when the key was never written.
  fn load_item(&self, key: &str) -> Result<Option<String>, String>;

  fn save_item(&self, key: &str, raw_json: &str) -> Result<(), String>;

  fn remove_item(&self, key: &str) -> Result<(), String>;
}

/// SQLite-backed store. One connection, guarded by a mutex.
pub struct SqliteKvStore {
  connection: Mutex<Connection>,
}

impl SqliteKvStore {
  pub fn open(db_path: &Path) -> Result<Self, String> {
    if let Some(parent) = db_path.parent() {
      if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent).map_err(|e| e.to_string())?;
      }
    }
    let connection = Connection::open(db_path).map_err(|e| e.to_string())?;
    Self::init(connection)
  }

  pub fn open_in_memory() -> Result<Self, String> {
    let connection = Connection::open_in_memory().map_err(|e| e.to_string())?;
    Self::init(connection)
  }

  fn init(connection: Connection) -> Result<Self, String> {
    connection
      .execute_batch(SCHEMA_SQL)
      .map_err(|e| e.to_string())?;
    Ok(Self {
      connection: Mutex::new(connection),
    })
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>, String> {
    self
      .connection
      .lock()
      .map_err(|_| "key-value store connection lock poisoned".to_string())
  }
}

impl KeyValueStore for SqliteKvStore {
  fn load_item(&self, key: &str) -> Result<Option<String>, String> {
    let connection = self.lock()?;
    connection
      .query_row(
        "SELECT value FROM kv_items WHERE key = ?1 LIMIT 1",
        params![key],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| e.to_string())
  }

  fn save_item(&self, key: &str, raw_json: &str) -> Result<(), String> {
    let connection = self.lock()?;
    connection
      .execute(
        "INSERT INTO kv_items (key, value, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET
           value = excluded.value,
           updated_at = excluded.updated_at",
        params![key, raw_json, Utc::now().to_rfc3339()],
      )
      .map_err(|e| e.to_string())?;
    Ok(())
  }

  fn remove_item(&self, key: &str) -> Result<(), String> {
    let connection = self.lock()?;
    connection
      .execute("DELETE FROM kv_items WHERE key = ?1", params![key])
      .map_err(|e| e.to_string())?;
    Ok(())
  }
}

#[derive(Debug, Default)]
pub struct MemoryKvStore {
  inner: Mutex<HashMap<String, String>>,
}

impl MemoryKvStore {
  fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, String> {
    self
      .inner
      .lock()
      .map_err(|_| "memory store lock poisoned".to_string())
  }
}

impl KeyValueStore for MemoryKvStore {
  fn load_item(&self, key: &str) -> Result<Option<String>, String> {
    Ok(self.lock()?.get(key).cloned())
  }

  fn save_item(&self, key: &str, raw_json: &str) -> Result<(), String> {
    self.lock()?.insert(key.to_string(), raw_json.to_string());
    Ok(())
  }

  fn remove_item(&self, key: &str) -> Result<(), String> {
    self.lock()?.remove(key);
    Ok(())
  }
}

/// Loads and deserializes a typed value through a [`KeyValueStore`].
///
/// # Errors
///
/// Returns an error when the store read or JSON deserialization fails.
pub fn load_json<S: KeyValueStore + ?Sized, T: DeserializeOwned>(
  store: &S,
  key: &str,
) -> Result<Option<T>, String> {
  let Some(raw) = store.load_item(key)? else {
    return Ok(None);
  };
  let value = serde_json::from_str(&raw).map_err(|e| format!("corrupt value for '{}': {}", key, e))?;
  Ok(Some(value))
}

/// Serializes and saves a typed value through a [`KeyValueStore`].
///
/// # Errors
///
/// Returns an error when serialization or the store write fails.
pub fn save_json<S: KeyValueStore + ?Sized, T: Serialize + ?Sized>(
  store: &S,
  key: &str,
  value: &T,
) -> Result<(), String> {
  let raw = serde_json::to_string(value).map_err(|e| e.to_string())?;
  store.save_item(key, &raw)
}
