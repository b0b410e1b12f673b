//! Field-name mapping between the profile form and the API.
//!
//! The dashboard form posts snake_case names while the API speaks
//! camelCase. Both directions go through one table so the populate and
//! diff paths can never disagree about a name.

use crate::error::{ProfileError, Result};

use super::types::Profile;

/// Form name (snake_case) to API name (camelCase), one row per known field.
const FIELD_NAMES: &[(&str, &str)] = &[
  ("first_name", "firstName"),
  ("surname", "surname"),
  ("email", "email"),
  ("mobile", "mobile"),
  ("gender", "gender"),
  ("marital_status", "maritalStatus"),
  ("country", "country"),
  ("state", "state"),
  ("postcode", "postcode"),
  ("identification_documents", "identificationDocuments"),
  ("signature", "signature"),
];

/// Fields the profile form must always submit.
pub const REQUIRED_FIELDS: &[&str] = &[
  "first_name",
  "surname",
  "mobile",
  "gender",
  "marital_status",
  "country",
  "state",
  "postcode",
  "identification_documents",
  "signature",
];

/// API name for a form field, if the field is known.
pub fn to_api_name(form_name: &str) -> Option<&'static str> {
  FIELD_NAMES
    .iter()
    .find(|(form, _)| *form == form_name)
    .map(|(_, api)| *api)
}

/// Form name for an API field, if the field is known.
pub fn to_form_name(api_name: &str) -> Option<&'static str> {
  FIELD_NAMES
    .iter()
    .find(|(_, api)| *api == api_name)
    .map(|(form, _)| *form)
}

/// Build a profile from submitted form pairs.
///
/// Every name in `required` must be present with a non-empty value.
/// Names are translated to their API form through the table; a name
/// missing from the table is a validation error rather than being
/// mechanically converted.
pub fn parse_form_fields<'a, I>(pairs: I, required: &[&str]) -> Result<Profile>
where
  I: IntoIterator<Item = (&'a str, &'a str)>,
{
  if required.is_empty() {
    return Err(ProfileError::Validation(
      "the required field list is empty".into(),
    ));
  }

  let submitted: std::collections::BTreeMap<&str, &str> = pairs.into_iter().collect();

  for name in submitted.keys() {
    if to_api_name(name).is_none() {
      return Err(ProfileError::Validation(format!(
        "unknown form field: {name}"
      )));
    }
  }

  let mut profile = Profile::new();
  for field in required {
    let value = submitted.get(field).copied().unwrap_or("");
    if value.is_empty() {
      return Err(ProfileError::Validation(format!(
        "missing or empty required field: {field}"
      )));
    }

    // Required fields are validated against the table above, so the
    // lookup cannot miss here.
    if let Some(api_name) = to_api_name(field) {
      profile.set(api_name, value);
    }
  }

  // Optional known fields (e.g. email) ride along when submitted.
  for (form_name, value) in submitted {
    if required.contains(&form_name) || value.is_empty() {
      continue;
    }
    if let Some(api_name) = to_api_name(form_name) {
      profile.set(api_name, value);
    }
  }

  Ok(profile)
}

/// Render a profile as ordered form-name/value rows, the populate path.
///
/// Known fields come out in table order; a field the table does not
/// know keeps its API name and sorts after the known ones.
pub fn to_form_fields(profile: &Profile) -> Vec<(String, String)> {
  let mut rows = Vec::with_capacity(profile.len());

  for (form_name, api_name) in FIELD_NAMES {
    if let Some(value) = profile.get(api_name) {
      rows.push((form_name.to_string(), value.to_string()));
    }
  }

  for (field, value) in profile.fields() {
    if to_form_name(field).is_none() {
      rows.push((field.to_string(), value.to_string()));
    }
  }

  rows
}

#[cfg(test)]
mod tests {
  use super::*;

  const REQUIRED: &[&str] = &["first_name", "mobile"];

  #[test]
  fn test_name_lookups_are_bidirectional() {
    for (form, api) in FIELD_NAMES {
      assert_eq!(to_api_name(form), Some(*api));
      assert_eq!(to_form_name(api), Some(*form));
    }
  }

  #[test]
  fn test_required_fields_are_all_known() {
    for field in REQUIRED_FIELDS {
      assert!(to_api_name(field).is_some(), "unknown field {field}");
    }
  }

  #[test]
  fn test_parse_translates_names() {
    let profile = parse_form_fields(
      vec![("first_name", "Alice"), ("mobile", "1234567890")],
      REQUIRED,
    )
    .unwrap();

    assert_eq!(profile.get("firstName"), Some("Alice"));
    assert_eq!(profile.get("mobile"), Some("1234567890"));
    assert_eq!(profile.len(), 2);
  }

  #[test]
  fn test_parse_rejects_missing_required_field() {
    let result = parse_form_fields(vec![("first_name", "Alice")], REQUIRED);
    assert!(matches!(result, Err(ProfileError::Validation(_))));
  }

  #[test]
  fn test_parse_rejects_empty_required_value() {
    let result = parse_form_fields(vec![("first_name", "Alice"), ("mobile", "")], REQUIRED);
    assert!(matches!(result, Err(ProfileError::Validation(_))));
  }

  #[test]
  fn test_parse_rejects_unknown_field() {
    let result = parse_form_fields(
      vec![("first_name", "Alice"), ("mobile", "123"), ("shoe_size", "9")],
      REQUIRED,
    );
    assert!(matches!(result, Err(ProfileError::Validation(_))));
  }

  #[test]
  fn test_parse_rejects_empty_required_list() {
    let result = parse_form_fields(vec![("first_name", "Alice")], &[]);
    assert!(matches!(result, Err(ProfileError::Validation(_))));
  }

  #[test]
  fn test_parse_keeps_optional_known_fields() {
    let profile = parse_form_fields(
      vec![
        ("first_name", "Alice"),
        ("mobile", "123"),
        ("email", "alice@example.com"),
      ],
      REQUIRED,
    )
    .unwrap();

    assert_eq!(profile.get("email"), Some("alice@example.com"));
  }

  #[test]
  fn test_form_rows_use_form_names_in_table_order() {
    let mut profile = Profile::new();
    profile.set("maritalStatus", "single");
    profile.set("firstName", "Alice");

    let rows = to_form_fields(&profile);
    assert_eq!(
      rows,
      vec![
        ("first_name".to_string(), "Alice".to_string()),
        ("marital_status".to_string(), "single".to_string()),
      ]
    );
  }

  #[test]
  fn test_unknown_api_field_keeps_its_name() {
    let mut profile = Profile::new();
    profile.set("firstName", "Alice");
    profile.set("loyaltyTier", "gold");

    let rows = to_form_fields(&profile);
    assert_eq!(rows[0].0, "first_name");
    assert_eq!(rows[1], ("loyaltyTier".to_string(), "gold".to_string()));
  }
}
