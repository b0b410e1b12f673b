//! Notification accumulator for profile events.
//!
//! The dashboard surfaces a running list of messages with an unread
//! badge. Only the accumulator contract lives here; rendering it is
//! someone else's job.

use chrono::{DateTime, Utc};
use std::sync::Mutex;
use tracing::warn;

use crate::profile::ChangeSet;

/// Sink for user-facing notification messages.
pub trait Notifier {
  fn add(&self, message: &str);
}

/// A single accumulated notification.
#[derive(Debug, Clone)]
pub struct Notification {
  pub message: String,
  pub read: bool,
  pub created_at: DateTime<Utc>,
}

/// In-memory notification accumulator with an unread counter.
#[derive(Default)]
pub struct Notifications {
  messages: Mutex<Vec<Notification>>,
}

impl Notifications {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of messages not yet marked read.
  pub fn unread_count(&self) -> usize {
    match self.messages.lock() {
      Ok(messages) => messages.iter().filter(|n| !n.read).count(),
      Err(_) => 0,
    }
  }

  pub fn mark_all_read(&self) {
    if let Ok(mut messages) = self.messages.lock() {
      for notification in messages.iter_mut() {
        notification.read = true;
      }
    }
  }

  /// Snapshot of every accumulated notification, oldest first.
  pub fn messages(&self) -> Vec<Notification> {
    match self.messages.lock() {
      Ok(messages) => messages.clone(),
      Err(_) => Vec::new(),
    }
  }
}

impl Notifier for Notifications {
  fn add(&self, message: &str) {
    match self.messages.lock() {
      Ok(mut messages) => messages.push(Notification {
        message: message.to_string(),
        read: false,
        created_at: Utc::now(),
      }),
      Err(err) => warn!(%err, "dropping notification, accumulator lock poisoned"),
    }
  }
}

/// One line per changed field, the wording the dashboard shows.
///
/// Returns `None` for an empty change set so callers never post a
/// blank notification.
pub fn profile_edit_message(changes: &ChangeSet) -> Option<String> {
  if changes.are_equal() {
    return None;
  }

  let lines: Vec<String> = changes
    .iter()
    .map(|(field, change)| {
      format!(
        "Field <{}> changed from <{}> to <{}>.",
        field,
        change.previous.as_deref().unwrap_or("not set"),
        change.current.as_deref().unwrap_or("not set"),
      )
    })
    .collect();

  Some(lines.join("\n"))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::profile::{diff_profiles, Profile};

  #[test]
  fn test_added_messages_start_unread() {
    let notifications = Notifications::new();
    notifications.add("profile saved");
    notifications.add("card added");

    assert_eq!(notifications.unread_count(), 2);

    notifications.mark_all_read();
    assert_eq!(notifications.unread_count(), 0);
    assert_eq!(notifications.messages().len(), 2);
  }

  #[test]
  fn test_edit_message_lists_each_change() {
    let mut before = Profile::new();
    before.set("mobile", "123");
    let mut after = Profile::new();
    after.set("mobile", "456");
    after.set("state", "Kent");

    let message = profile_edit_message(&diff_profiles(&before, &after)).unwrap();

    assert!(message.contains("Field <mobile> changed from <123> to <456>."));
    assert!(message.contains("Field <state> changed from <not set> to <Kent>."));
  }

  #[test]
  fn test_no_message_for_equal_snapshots() {
    let profile = Profile::new();
    assert!(profile_edit_message(&diff_profiles(&profile, &profile)).is_none());
  }
}
