//! Core trait and types for the local key-value store.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

/// A value read back from the store, together with when it was written.
#[derive(Debug, Clone)]
pub struct StoredEntry<T> {
  /// The deserialized value
  pub value: T,
  /// When the value was last written
  pub stored_at: DateTime<Utc>,
}

/// Trait for local key-value store backends.
///
/// Values are serialized as JSON text. A stored value that no longer
/// deserializes is reported as absent, not as an error, so a schema
/// change between releases never wedges the client.
pub trait KeyValueStore: Send + Sync {
  /// Read and deserialize the value stored under `key`.
  fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<StoredEntry<T>>>;

  /// Serialize `value` and store it under `key`, replacing any previous value.
  fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()>;

  /// Remove the value stored under `key`, if any.
  fn remove(&self, key: &str) -> Result<()>;
}
