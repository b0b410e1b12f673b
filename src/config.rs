use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{ProfileError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  #[serde(default)]
  pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL of the dashboard API, e.g. `https://bank.example.com/`.
  /// Endpoint paths are joined onto it, so it should end with a slash.
  pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
  /// Key the profile is stored under in the local store.
  pub profile_key: String,
  /// Version stamp; stored keys are purged when it changes.
  pub app_version: String,
}

impl Default for StorageConfig {
  fn default() -> Self {
    Self {
      profile_key: "profile".to_string(),
      app_version: env!("CARGO_PKG_VERSION").to_string(),
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./vbank.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/vbank/config.yaml
  /// 4. ~/.config/vbank/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(ProfileError::Configuration(format!(
          "config file not found: {}",
          p.display()
        )));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(ProfileError::Configuration(
        "no configuration file found. Create one at ~/.config/vbank/config.yaml\n\
         with an `api.base_url` entry."
          .into(),
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("vbank.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("vbank").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
      ProfileError::Configuration(format!("failed to read config file {}: {e}", path.display()))
    })?;

    let config: Config = serde_yaml::from_str(&contents).map_err(|e| {
      ProfileError::Configuration(format!("failed to parse config file {}: {e}", path.display()))
    })?;

    Ok(config)
  }

  /// CSRF token for POST requests, from the VBANK_CSRF_TOKEN
  /// environment variable. Absent means POSTs go out without the
  /// header and the backend decides whether to accept them.
  pub fn csrf_token() -> Option<String> {
    std::env::var("VBANK_CSRF_TOKEN").ok()
  }
}
