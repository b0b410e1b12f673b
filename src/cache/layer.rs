//! Profile cache that layers an in-memory copy over the local store,
//! with a caller-supplied remote fetch as the cold-start fallback.
//!
//! Read path: memory, then store, then fetch. A fetched profile is
//! written to both. The state lock is held across the fetch await, so
//! concurrent cold reads collapse into a single remote call.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use crate::error::{ProfileError, Result};
use crate::profile::{diff_profiles, ChangeSet, Profile};

use super::traits::KeyValueStore;

/// What the cache currently knows about the profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CacheState {
  /// Nothing loaded yet; the next read goes to the store or the server.
  #[default]
  Unset,
  /// Store and server were both checked and neither has a profile.
  Empty,
  /// The profile is held in memory.
  Loaded(Profile),
}

/// Outcome of submitting profile data to the cache.
#[derive(Debug, Clone)]
pub enum SaveOutcome {
  /// Fields changed; memory and the local store were updated.
  Updated(ChangeSet),
  /// The candidate matched the cached baseline; nothing was written.
  Unchanged,
  /// The candidate was unusable (empty submission). Logged, not fatal.
  Rejected,
}

/// Memoized store-backed cache for the current user's profile.
///
/// One instance per storage key; the key and the store backend are
/// fixed at construction.
pub struct ProfileCache<S: KeyValueStore> {
  key: String,
  store: Arc<S>,
  /// Guarded across the remote fetch so concurrent cold reads share
  /// one request.
  state: Mutex<CacheState>,
}

impl<S: KeyValueStore> ProfileCache<S> {
  /// Create a cache over `store`, keyed by `key`.
  ///
  /// The key names the slot in the store and must be non-blank.
  pub fn new(key: impl Into<String>, store: S) -> Result<Self> {
    let key = key.into();
    if key.trim().is_empty() {
      return Err(ProfileError::Configuration(
        "the storage key cannot be empty".into(),
      ));
    }

    Ok(Self {
      key,
      store: Arc::new(store),
      state: Mutex::new(CacheState::Unset),
    })
  }

  /// The storage key this cache reads and writes.
  pub fn storage_key(&self) -> &str {
    &self.key
  }

  /// Snapshot of the current cache state.
  pub async fn state(&self) -> CacheState {
    self.state.lock().await.clone()
  }

  /// Get the profile, loading it on first use.
  ///
  /// Returns the memoized value when present, otherwise reads the
  /// store, otherwise runs `fetch`. A fetch error leaves the cache
  /// unset so a later call can retry; `Ok(None)` from the fetch is
  /// memoized as "no profile yet".
  pub async fn get_profile_data<F, Fut>(&self, fetch: F) -> Result<Option<Profile>>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Option<Profile>>>,
  {
    let mut state = self.state.lock().await;
    self.load(&mut state, fetch).await
  }

  /// Submit profile data, diffing it against the current baseline.
  ///
  /// Loads the baseline through the same path as
  /// [`get_profile_data`](Self::get_profile_data), so a cold cache may
  /// run `fetch`. Equal data is a no-op; changed data replaces the
  /// memory and store copies. A store write failure downgrades to
  /// memory-only with a warning.
  pub async fn add_profile_data<F, Fut>(&self, candidate: &Profile, fetch: F) -> Result<SaveOutcome>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Option<Profile>>>,
  {
    if candidate.is_empty() {
      error!(key = %self.key, "rejecting profile submission with no fields");
      return Ok(SaveOutcome::Rejected);
    }

    let mut state = self.state.lock().await;
    let baseline = self.load(&mut state, fetch).await?.unwrap_or_default();

    let changes = diff_profiles(&baseline, candidate);
    if changes.are_equal() {
      debug!(key = %self.key, "profile unchanged, skipping write");
      return Ok(SaveOutcome::Unchanged);
    }

    if let Err(err) = self.store.set(&self.key, candidate) {
      warn!(key = %self.key, %err, "could not persist profile, keeping it in memory only");
    }
    *state = CacheState::Loaded(candidate.clone());

    Ok(SaveOutcome::Updated(changes))
  }

  /// Drop the in-memory copy.
  ///
  /// The stored copy is untouched: logout clears memory, and the caller
  /// decides separately whether to also call
  /// [`forget_stored`](Self::forget_stored).
  pub async fn clear_cache(&self) {
    *self.state.lock().await = CacheState::Unset;
  }

  /// Remove the stored copy under this cache's key.
  pub fn forget_stored(&self) -> Result<()> {
    self.store.remove(&self.key)
  }

  /// Load with the lock already held. Callers own `state` for the whole
  /// operation, including any fetch await.
  async fn load<F, Fut>(&self, state: &mut CacheState, fetch: F) -> Result<Option<Profile>>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Option<Profile>>>,
  {
    match state {
      CacheState::Loaded(profile) => Ok(Some(profile.clone())),
      CacheState::Empty => Ok(None),
      CacheState::Unset => {
        debug!(key = %self.key, "cache cold, checking the local store");

        match self.store.get::<Profile>(&self.key) {
          Ok(Some(entry)) if !entry.value.is_empty() => {
            *state = CacheState::Loaded(entry.value.clone());
            return Ok(Some(entry.value));
          }
          Ok(_) => {}
          Err(err) => {
            warn!(key = %self.key, %err, "local store read failed, falling through to fetch");
          }
        }

        debug!(key = %self.key, "local store miss, fetching from the server");
        match fetch().await? {
          Some(profile) => {
            if let Err(err) = self.store.set(&self.key, &profile) {
              warn!(key = %self.key, %err, "could not persist fetched profile, keeping it in memory only");
            }
            *state = CacheState::Loaded(profile.clone());
            Ok(Some(profile))
          }
          None => {
            *state = CacheState::Empty;
            Ok(None)
          }
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::MemoryStore;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::time::Duration;

  fn alice() -> Profile {
    let mut profile = Profile::new();
    profile.set("firstName", "Alice");
    profile.set("mobile", "123");
    profile
  }

  /// Fetcher that counts calls and returns `result`.
  fn counting_fetch(
    counter: Arc<AtomicUsize>,
    result: Option<Profile>,
  ) -> impl FnOnce() -> std::pin::Pin<Box<dyn Future<Output = Result<Option<Profile>>> + Send>> {
    move || {
      counter.fetch_add(1, Ordering::SeqCst);
      Box::pin(async move { Ok(result) })
    }
  }

  /// Store whose writes always fail.
  struct FailingStore;

  impl KeyValueStore for FailingStore {
    fn get<T: serde::de::DeserializeOwned>(
      &self,
      _key: &str,
    ) -> Result<Option<crate::cache::StoredEntry<T>>> {
      Ok(None)
    }

    fn set<T: serde::Serialize>(&self, _key: &str, _value: &T) -> Result<()> {
      Err(ProfileError::Persistence("store is full".into()))
    }

    fn remove(&self, _key: &str) -> Result<()> {
      Ok(())
    }
  }

  #[test]
  fn test_blank_key_is_rejected() {
    assert!(matches!(
      ProfileCache::new("", MemoryStore::new()),
      Err(ProfileError::Configuration(_))
    ));
    assert!(matches!(
      ProfileCache::new("   ", MemoryStore::new()),
      Err(ProfileError::Configuration(_))
    ));
  }

  #[tokio::test]
  async fn test_cold_fetch_populates_memory_and_store() {
    let cache = ProfileCache::new("profile", MemoryStore::new()).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    let profile = cache
      .get_profile_data(counting_fetch(calls.clone(), Some(alice())))
      .await
      .unwrap();

    assert_eq!(profile, Some(alice()));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Both caches were populated.
    assert_eq!(cache.state().await, CacheState::Loaded(alice()));
    let stored = cache.store.get::<Profile>("profile").unwrap().unwrap();
    assert_eq!(stored.value, alice());
  }

  #[tokio::test]
  async fn test_sequential_reads_fetch_once() {
    let cache = ProfileCache::new("profile", MemoryStore::new()).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    for _ in 0..3 {
      let profile = cache
        .get_profile_data(counting_fetch(calls.clone(), Some(alice())))
        .await
        .unwrap();
      assert_eq!(profile, Some(alice()));
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_concurrent_cold_reads_share_one_fetch() {
    let cache = Arc::new(ProfileCache::new("profile", MemoryStore::new()).unwrap());
    let calls = Arc::new(AtomicUsize::new(0));

    let slow_fetch = |calls: Arc<AtomicUsize>| {
      move || {
        calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
          tokio::time::sleep(Duration::from_millis(20)).await;
          Ok(Some(alice()))
        }) as std::pin::Pin<Box<dyn Future<Output = Result<Option<Profile>>> + Send>>
      }
    };

    let (a, b) = tokio::join!(
      cache.get_profile_data(slow_fetch(calls.clone())),
      cache.get_profile_data(slow_fetch(calls.clone())),
    );

    assert_eq!(a.unwrap(), Some(alice()));
    assert_eq!(b.unwrap(), Some(alice()));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_store_hit_skips_fetch() {
    let store = MemoryStore::new();
    store.set("profile", &alice()).unwrap();

    let cache = ProfileCache::new("profile", store).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    let profile = cache
      .get_profile_data(counting_fetch(calls.clone(), None))
      .await
      .unwrap();

    assert_eq!(profile, Some(alice()));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn test_fetch_error_leaves_cache_retryable() {
    let cache = ProfileCache::new("profile", MemoryStore::new()).unwrap();

    let result = cache
      .get_profile_data(|| async { Err(ProfileError::Transport("connection refused".into())) })
      .await;
    assert!(matches!(result, Err(ProfileError::Transport(_))));
    assert_eq!(cache.state().await, CacheState::Unset);

    // A later call may retry and succeed.
    let calls = Arc::new(AtomicUsize::new(0));
    let profile = cache
      .get_profile_data(counting_fetch(calls.clone(), Some(alice())))
      .await
      .unwrap();
    assert_eq!(profile, Some(alice()));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_no_remote_profile_is_memoized_as_empty() {
    let cache = ProfileCache::new("profile", MemoryStore::new()).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    let first = cache
      .get_profile_data(counting_fetch(calls.clone(), None))
      .await
      .unwrap();
    let second = cache
      .get_profile_data(counting_fetch(calls.clone(), None))
      .await
      .unwrap();

    assert_eq!(first, None);
    assert_eq!(second, None);
    assert_eq!(cache.state().await, CacheState::Empty);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_write_then_read_without_remote_call() {
    let cache = ProfileCache::new("profile", MemoryStore::new()).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    let outcome = cache
      .add_profile_data(&alice(), counting_fetch(calls.clone(), None))
      .await
      .unwrap();
    assert!(matches!(outcome, SaveOutcome::Updated(_)));

    let profile = cache
      .get_profile_data(counting_fetch(calls.clone(), None))
      .await
      .unwrap();
    assert_eq!(profile, Some(alice()));

    // Only the baseline load inside add_profile_data hit the fetcher.
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_save_reports_field_changes() {
    let store = MemoryStore::new();
    store.set("profile", &alice()).unwrap();
    let cache = ProfileCache::new("profile", store).unwrap();

    let mut updated = alice();
    updated.set("mobile", "456");

    let outcome = cache
      .add_profile_data(&updated, || async { Ok(None) })
      .await
      .unwrap();

    match outcome {
      SaveOutcome::Updated(changes) => {
        assert!(!changes.are_equal());
        assert_eq!(changes.len(), 1);
        let change = changes.get("mobile").unwrap();
        assert_eq!(change.previous.as_deref(), Some("123"));
        assert_eq!(change.current.as_deref(), Some("456"));
      }
      other => panic!("expected Updated, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn test_unchanged_save_is_a_noop() {
    let store = MemoryStore::new();
    store.set("profile", &alice()).unwrap();
    let cache = ProfileCache::new("profile", store).unwrap();

    let outcome = cache
      .add_profile_data(&alice(), || async { Ok(None) })
      .await
      .unwrap();

    assert!(matches!(outcome, SaveOutcome::Unchanged));
  }

  #[tokio::test]
  async fn test_empty_submission_is_rejected() {
    let cache = ProfileCache::new("profile", MemoryStore::new()).unwrap();

    let outcome = cache
      .add_profile_data(&Profile::new(), || async { Ok(None) })
      .await
      .unwrap();

    assert!(matches!(outcome, SaveOutcome::Rejected));
    assert_eq!(cache.state().await, CacheState::Unset);
  }

  #[tokio::test]
  async fn test_store_failure_degrades_to_memory_only() {
    let cache = ProfileCache::new("profile", FailingStore).unwrap();

    let outcome = cache
      .add_profile_data(&alice(), || async { Ok(None) })
      .await
      .unwrap();
    assert!(matches!(outcome, SaveOutcome::Updated(_)));

    // The profile is still served from memory.
    let profile = cache.get_profile_data(|| async { Ok(None) }).await.unwrap();
    assert_eq!(profile, Some(alice()));
  }

  #[tokio::test]
  async fn test_clear_cache_rereads_store_before_fetch() {
    let cache = ProfileCache::new("profile", MemoryStore::new()).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    cache
      .add_profile_data(&alice(), counting_fetch(calls.clone(), None))
      .await
      .unwrap();

    cache.clear_cache().await;
    assert_eq!(cache.state().await, CacheState::Unset);

    // The store still has the profile, so no fetch happens.
    let profile = cache
      .get_profile_data(counting_fetch(calls.clone(), Some(Profile::new())))
      .await
      .unwrap();
    assert_eq!(profile, Some(alice()));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_clear_cache_leaves_store_untouched() {
    let cache = ProfileCache::new("profile", MemoryStore::new()).unwrap();
    cache
      .add_profile_data(&alice(), || async { Ok(None) })
      .await
      .unwrap();

    cache.clear_cache().await;
    let stored = cache.store.get::<Profile>("profile").unwrap();
    assert!(stored.is_some());

    cache.forget_stored().unwrap();
    let stored = cache.store.get::<Profile>("profile").unwrap();
    assert!(stored.is_none());
  }

  #[tokio::test]
  async fn test_malformed_store_falls_through_to_fetch() {
    let store = MemoryStore::new();
    store.insert_raw("profile", "{broken");
    let cache = ProfileCache::new("profile", store).unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let profile = cache
      .get_profile_data(counting_fetch(calls.clone(), Some(alice())))
      .await
      .unwrap();

    assert_eq!(profile, Some(alice()));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }
}
