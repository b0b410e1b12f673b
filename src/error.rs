//! Error types for the profile cache and API client.
//!
//! Every failure falls into one of four buckets: configuration,
//! validation, transport, or persistence. Persistence problems are
//! usually logged and degraded rather than returned; the variant exists
//! for the store backends themselves.

use thiserror::Error;

/// Error type for profile operations.
#[derive(Error, Debug)]
pub enum ProfileError {
  /// The cache or client was built with unusable settings
  /// (empty storage key, bad base URL, missing config file).
  #[error("configuration error: {0}")]
  Configuration(String),

  /// Submitted data had the wrong shape (missing or empty required
  /// fields, unknown field names).
  #[error("invalid profile data: {0}")]
  Validation(String),

  /// The profile endpoint could not be reached or reported failure.
  #[error("profile request failed: {0}")]
  Transport(String),

  /// The local store could not be read or written.
  #[error("local store failure: {0}")]
  Persistence(String),
}

/// Result type alias for profile operations.
pub type Result<T> = std::result::Result<T, ProfileError>;
