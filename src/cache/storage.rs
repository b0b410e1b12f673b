//! Key-value store backends: SQLite and in-memory.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::warn;

use crate::error::{ProfileError, Result};

use super::traits::{KeyValueStore, StoredEntry};

/// Schema for the key-value table.
const STORE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    data TEXT NOT NULL,
    stored_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// SQLite-backed key-value store.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

impl SqliteStore {
  /// Open or create the store at the default location.
  pub fn open() -> Result<Self> {
    let path = Self::default_path()?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| ProfileError::Persistence(format!("failed to create store directory: {e}")))?;
    }

    let conn = Connection::open(&path).map_err(|e| {
      ProfileError::Persistence(format!("failed to open store at {}: {e}", path.display()))
    })?;

    Self::from_connection(conn)
  }

  /// Open an in-memory store. Every instance is independent and empty.
  pub fn in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| ProfileError::Persistence(format!("failed to open in-memory store: {e}")))?;
    Self::from_connection(conn)
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    conn
      .execute_batch(STORE_SCHEMA)
      .map_err(|e| ProfileError::Persistence(format!("failed to run store migrations: {e}")))?;

    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  /// Get the default database path.
  fn default_path() -> Result<std::path::PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| ProfileError::Persistence("could not determine data directory".into()))?;

    Ok(data_dir.join("vbank").join("store.db"))
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
    self
      .conn
      .lock()
      .map_err(|e| ProfileError::Persistence(format!("lock poisoned: {e}")))
  }
}

impl KeyValueStore for SqliteStore {
  fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<StoredEntry<T>>> {
    let conn = self.lock()?;

    let mut stmt = conn
      .prepare("SELECT data, stored_at FROM kv_store WHERE key = ?")
      .map_err(|e| ProfileError::Persistence(format!("failed to prepare read: {e}")))?;

    let row: Option<(String, String)> = stmt
      .query_row(params![key], |row| Ok((row.get(0)?, row.get(1)?)))
      .ok();

    let (data, stored_at_str) = match row {
      Some(row) => row,
      None => return Ok(None),
    };

    // Malformed stored data is treated as absent rather than fatal.
    let value: T = match serde_json::from_str(&data) {
      Ok(value) => value,
      Err(err) => {
        warn!(key, %err, "stored value is malformed, treating as absent");
        return Ok(None);
      }
    };

    let stored_at = parse_datetime(&stored_at_str)?;
    Ok(Some(StoredEntry { value, stored_at }))
  }

  fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
    let data = serde_json::to_string(value)
      .map_err(|e| ProfileError::Persistence(format!("failed to serialize value: {e}")))?;

    let conn = self.lock()?;
    conn
      .execute(
        "INSERT OR REPLACE INTO kv_store (key, data, stored_at)
         VALUES (?, ?, datetime('now'))",
        params![key, data],
      )
      .map_err(|e| ProfileError::Persistence(format!("failed to store value: {e}")))?;

    Ok(())
  }

  fn remove(&self, key: &str) -> Result<()> {
    let conn = self.lock()?;
    conn
      .execute("DELETE FROM kv_store WHERE key = ?", params![key])
      .map_err(|e| ProfileError::Persistence(format!("failed to remove value: {e}")))?;

    Ok(())
  }
}

/// In-memory key-value store.
///
/// Backs tests and the no-persistence mode; values still go through
/// JSON so the backends share serialization behavior.
#[derive(Default)]
pub struct MemoryStore {
  entries: Mutex<HashMap<String, (String, DateTime<Utc>)>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Store a raw string under `key`, bypassing serialization.
  /// Lets tests seed malformed data.
  pub fn insert_raw(&self, key: &str, raw: &str) {
    if let Ok(mut entries) = self.entries.lock() {
      entries.insert(key.to_string(), (raw.to_string(), Utc::now()));
    }
  }
}

impl KeyValueStore for MemoryStore {
  fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<StoredEntry<T>>> {
    let entries = self
      .entries
      .lock()
      .map_err(|e| ProfileError::Persistence(format!("lock poisoned: {e}")))?;

    let (data, stored_at) = match entries.get(key) {
      Some(entry) => entry.clone(),
      None => return Ok(None),
    };

    match serde_json::from_str(&data) {
      Ok(value) => Ok(Some(StoredEntry { value, stored_at })),
      Err(err) => {
        warn!(key, %err, "stored value is malformed, treating as absent");
        Ok(None)
      }
    }
  }

  fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
    let data = serde_json::to_string(value)
      .map_err(|e| ProfileError::Persistence(format!("failed to serialize value: {e}")))?;

    let mut entries = self
      .entries
      .lock()
      .map_err(|e| ProfileError::Persistence(format!("lock poisoned: {e}")))?;
    entries.insert(key.to_string(), (data, Utc::now()));

    Ok(())
  }

  fn remove(&self, key: &str) -> Result<()> {
    let mut entries = self
      .entries
      .lock()
      .map_err(|e| ProfileError::Persistence(format!("lock poisoned: {e}")))?;
    entries.remove(key);

    Ok(())
  }
}

/// Key under which the app version stamp is stored.
const VERSION_KEY: &str = "app_version";

/// Purge `keys` from the store when the stored app version differs from
/// `version`, then record the new version.
///
/// Stored data persists across releases; after a schema or logic change
/// the old values may no longer match what the app expects. Bumping the
/// version forces a fresh start for the listed keys.
pub fn purge_on_version_change<S: KeyValueStore>(
  store: &S,
  version: &str,
  keys: &[&str],
) -> Result<()> {
  let stored: Option<String> = store.get(VERSION_KEY)?.map(|entry| entry.value);

  if stored.as_deref() == Some(version) {
    return Ok(());
  }

  warn!(
    from = stored.as_deref().unwrap_or("none"),
    to = version,
    "app version changed, clearing stored keys"
  );

  for key in keys {
    store.remove(key)?;
  }
  store.set(VERSION_KEY, &version.to_string())?;

  Ok(())
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| ProfileError::Persistence(format!("failed to parse datetime '{s}': {e}")))
}
