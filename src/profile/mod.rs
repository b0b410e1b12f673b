//! Profile data model, field mapping, diffing, and the dashboard API client.

mod cached_client;
mod client;
mod diff;
mod fields;
mod types;

pub use cached_client::{CachedProfileClient, SaveReport};
pub use client::{ApiResponse, ProfileClient};
pub use diff::{diff_profiles, ChangeSet, FieldChange};
pub use fields::{parse_form_fields, to_api_name, to_form_fields, to_form_name, REQUIRED_FIELDS};
pub use types::Profile;
