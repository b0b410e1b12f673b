//! Local caching for the user profile.
//!
//! This module provides:
//! - A key-value store trait with SQLite and in-memory backends
//! - A profile cache that layers an in-memory copy over the store,
//!   with a caller-supplied remote fetch as the cold-start fallback
//! - A version gate that purges stored keys when the app version changes

mod layer;
mod storage;
mod traits;

pub use layer::{CacheState, ProfileCache, SaveOutcome};
pub use storage::{purge_on_version_change, MemoryStore, SqliteStore};
pub use traits::{KeyValueStore, StoredEntry};
