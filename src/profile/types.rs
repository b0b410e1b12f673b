//! The profile data model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A user's profile: a flat mapping of field name to scalar value.
///
/// Field names are the API's camelCase names (`firstName`,
/// `maritalStatus`). The snake_case names the form uses are translated
/// at the edge, see [`super::fields`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Profile(BTreeMap<String, String>);

impl Profile {
  pub fn new() -> Self {
    Self::default()
  }

  /// Value of `field`, if present.
  pub fn get(&self, field: &str) -> Option<&str> {
    self.0.get(field).map(String::as_str)
  }

  /// Set `field` to `value`, replacing any previous value.
  pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
    self.0.insert(field.into(), value.into());
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  /// Fields in name order.
  pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
    self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }
}

impl FromIterator<(String, String)> for Profile {
  fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}
