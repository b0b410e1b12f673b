//! Profile client with transparent caching.
//!
//! Wraps [`ProfileClient`] the way the dashboard uses it: reads go
//! through the cache, and saves diff against the cached baseline so
//! only changed fields travel to the update endpoint. The server's
//! reply is authoritative and is merged back into the cache.

use tracing::error;

use crate::cache::{KeyValueStore, ProfileCache, SaveOutcome};
use crate::config::Config;
use crate::error::{ProfileError, Result};

use super::client::ProfileClient;
use super::diff::{diff_profiles, ChangeSet};
use super::types::Profile;

/// What happened to a submitted profile.
#[derive(Debug, Clone)]
pub enum SaveReport {
  /// No profile existed; the full profile was posted to the save endpoint.
  Created(Profile),
  /// Changed fields were posted to the update endpoint.
  Updated(ChangeSet),
  /// The submission matched the baseline; nothing was sent.
  Unchanged,
  /// The submission was unusable (empty). Logged, not fatal.
  Rejected,
}

/// Profile client backed by a cache and a local store.
pub struct CachedProfileClient<S: KeyValueStore> {
  inner: ProfileClient,
  cache: ProfileCache<S>,
}

impl<S: KeyValueStore> CachedProfileClient<S> {
  /// Create a cached profile client over `store`.
  pub fn new(config: &Config, store: S) -> Result<Self> {
    let inner = ProfileClient::new(config)?;
    let cache = ProfileCache::new(config.storage.profile_key.clone(), store)?;

    Ok(Self { inner, cache })
  }

  /// The current profile: memory, then local store, then the server.
  pub async fn profile(&self) -> Result<Option<Profile>> {
    let inner = self.inner.clone();
    self
      .cache
      .get_profile_data(|| async move { inner.fetch_profile().await })
      .await
  }

  /// Submit an edited profile.
  ///
  /// With no baseline the whole profile goes to the save endpoint.
  /// With a baseline, the candidate is diffed first: equal data makes
  /// no network call at all, changed data sends only the changed
  /// fields to the update endpoint. Either way the server's `DATA` is
  /// merged back into the cache and the store.
  pub async fn save(&self, candidate: &Profile) -> Result<SaveReport> {
    if candidate.is_empty() {
      error!("rejecting profile submission with no fields");
      return Ok(SaveReport::Rejected);
    }

    match self.profile().await? {
      None => {
        let envelope = self.inner.save_profile(candidate).await?;
        if !envelope.success {
          return Err(ProfileError::Transport(
            envelope.error_message().to_string(),
          ));
        }

        let saved = envelope.data.unwrap_or_else(|| candidate.clone());
        match self.merge(&saved).await? {
          SaveOutcome::Rejected => Ok(SaveReport::Rejected),
          _ => Ok(SaveReport::Created(saved)),
        }
      }
      Some(baseline) => {
        let changes = diff_profiles(&baseline, candidate);
        if changes.are_equal() {
          return Ok(SaveReport::Unchanged);
        }

        let envelope = self.inner.update_profile(&changes).await?;
        if !envelope.success {
          return Err(ProfileError::Transport(
            envelope.error_message().to_string(),
          ));
        }

        let saved = envelope.data.unwrap_or_else(|| candidate.clone());
        match self.merge(&saved).await? {
          SaveOutcome::Updated(changes) => Ok(SaveReport::Updated(changes)),
          SaveOutcome::Unchanged => Ok(SaveReport::Unchanged),
          SaveOutcome::Rejected => Ok(SaveReport::Rejected),
        }
      }
    }
  }

  /// Drop the in-memory cache; the stored copy survives.
  pub async fn clear_cache(&self) {
    self.cache.clear_cache().await;
  }

  /// Remove the locally stored profile.
  pub fn forget_stored(&self) -> Result<()> {
    self.cache.forget_stored()
  }

  /// The storage key the underlying cache uses.
  pub fn storage_key(&self) -> &str {
    self.cache.storage_key()
  }

  async fn merge(&self, saved: &Profile) -> Result<SaveOutcome> {
    let inner = self.inner.clone();
    self
      .cache
      .add_profile_data(saved, || async move { inner.fetch_profile().await })
      .await
  }
}
