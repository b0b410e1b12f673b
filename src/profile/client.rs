//! HTTP client for the dashboard profile endpoints.

use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::error::{ProfileError, Result};

use super::diff::ChangeSet;
use super::types::Profile;

/// Header the backend checks on every POST.
const CSRF_HEADER: &str = "X-CSRFToken";

/// Response envelope used by every profile endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
  #[serde(rename = "SUCCESS")]
  pub success: bool,
  #[serde(rename = "DATA", default)]
  pub data: Option<Profile>,
  /// Set by the update endpoint when fields were written.
  #[serde(rename = "UPDATE", default)]
  pub update: Option<bool>,
  #[serde(rename = "ERROR", default)]
  pub error: Option<String>,
}

impl ApiResponse {
  /// The server's error message, or a generic fallback.
  pub fn error_message(&self) -> &str {
    self.error.as_deref().unwrap_or("Unknown Error")
  }
}

/// Client for the profile endpoints.
#[derive(Clone)]
pub struct ProfileClient {
  http: reqwest::Client,
  base_url: Url,
  csrf_token: Option<String>,
}

impl ProfileClient {
  pub fn new(config: &Config) -> Result<Self> {
    let base_url = Url::parse(&config.api.base_url)
      .map_err(|e| ProfileError::Configuration(format!("invalid API base URL: {e}")))?;

    let http = reqwest::Client::builder()
      .build()
      .map_err(|e| ProfileError::Transport(format!("failed to build HTTP client: {e}")))?;

    Ok(Self {
      http,
      base_url,
      csrf_token: Config::csrf_token(),
    })
  }

  /// Fetch the profile. `Ok(None)` means the server has none yet.
  pub async fn fetch_profile(&self) -> Result<Option<Profile>> {
    let url = self.endpoint("profile/get/")?;
    debug!(%url, "fetching profile");

    let response = self
      .http
      .get(url)
      .send()
      .await
      .map_err(|e| ProfileError::Transport(format!("failed to fetch profile: {e}")))?;

    let envelope = Self::read_envelope(response).await?;
    if !envelope.success {
      return Err(ProfileError::Transport(
        envelope.error_message().to_string(),
      ));
    }

    Ok(envelope.data.filter(|profile| !profile.is_empty()))
  }

  /// Create the profile by posting every field to the save endpoint.
  pub async fn save_profile(&self, profile: &Profile) -> Result<ApiResponse> {
    self.post("profile/save/", profile).await
  }

  /// Update the profile by posting only the changed fields' current values.
  ///
  /// Fields removed by the change set (no current value) are not sent;
  /// the endpoint only writes the fields it receives.
  pub async fn update_profile(&self, changes: &ChangeSet) -> Result<ApiResponse> {
    let body: BTreeMap<&str, &str> = changes
      .iter()
      .filter_map(|(field, change)| change.current.as_deref().map(|value| (field, value)))
      .collect();

    self.post("profile/update/", &body).await
  }

  async fn post<B: serde::Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<ApiResponse> {
    let url = self.endpoint(path)?;
    debug!(%url, "posting profile data");

    let mut request = self.http.post(url).json(body);
    if let Some(token) = &self.csrf_token {
      request = request.header(CSRF_HEADER, token);
    }

    let response = request
      .send()
      .await
      .map_err(|e| ProfileError::Transport(format!("failed to post profile data: {e}")))?;

    Self::read_envelope(response).await
  }

  /// Parse the envelope, turning a non-2xx status into a transport
  /// error that carries the server's message when one is present.
  async fn read_envelope(response: reqwest::Response) -> Result<ApiResponse> {
    let status = response.status();

    if !status.is_success() {
      let message = match response.json::<ApiResponse>().await {
        Ok(envelope) => envelope.error_message().to_string(),
        Err(_) => status_text(status),
      };
      return Err(ProfileError::Transport(message));
    }

    response
      .json::<ApiResponse>()
      .await
      .map_err(|e| ProfileError::Transport(format!("failed to parse response: {e}")))
  }

  fn endpoint(&self, path: &str) -> Result<Url> {
    self
      .base_url
      .join(path)
      .map_err(|e| ProfileError::Configuration(format!("invalid endpoint {path}: {e}")))
  }
}

fn status_text(status: StatusCode) -> String {
  format!(
    "HTTP error! Status: {}",
    status.canonical_reason().unwrap_or("unknown")
  )
}
