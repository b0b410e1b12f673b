//! Field-level diffing between two profile snapshots.

use serde::Serialize;
use std::collections::BTreeMap;

use super::types::Profile;

/// A single field change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
  /// Value before the change; `None` when the field was just added.
  pub previous: Option<String>,
  /// Value after the change; `None` when the field was removed.
  pub current: Option<String>,
}

/// The set of fields that differ between two profile snapshots.
///
/// Unchanged fields never appear, so the set is empty exactly when the
/// snapshots are equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChangeSet {
  changes: BTreeMap<String, FieldChange>,
}

impl ChangeSet {
  /// True when the compared snapshots had no differing fields.
  pub fn are_equal(&self) -> bool {
    self.changes.is_empty()
  }

  pub fn len(&self) -> usize {
    self.changes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.changes.is_empty()
  }

  /// The change recorded for `field`, if any.
  pub fn get(&self, field: &str) -> Option<&FieldChange> {
    self.changes.get(field)
  }

  /// Changed fields in name order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldChange)> {
    self.changes.iter().map(|(k, v)| (k.as_str(), v))
  }
}

/// Compare two profile snapshots field by field.
///
/// A field present on only one side counts as changed, with the absent
/// side reported as `None`. Pure: neither input is modified.
pub fn diff_profiles(previous: &Profile, current: &Profile) -> ChangeSet {
  let mut changes = BTreeMap::new();

  for (field, prev_value) in previous.fields() {
    match current.get(field) {
      Some(cur_value) if cur_value == prev_value => {}
      Some(cur_value) => {
        changes.insert(
          field.to_string(),
          FieldChange {
            previous: Some(prev_value.to_string()),
            current: Some(cur_value.to_string()),
          },
        );
      }
      None => {
        changes.insert(
          field.to_string(),
          FieldChange {
            previous: Some(prev_value.to_string()),
            current: None,
          },
        );
      }
    }
  }

  for (field, cur_value) in current.fields() {
    if previous.get(field).is_none() {
      changes.insert(
        field.to_string(),
        FieldChange {
          previous: None,
          current: Some(cur_value.to_string()),
        },
      );
    }
  }

  ChangeSet { changes }
}
