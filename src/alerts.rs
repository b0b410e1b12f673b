//! User-facing alert dialogs.
//!
//! The dashboard pops a modal with a title, body text, an icon, and a
//! confirm button. The CLI renders the same shape as plain lines.

use std::fmt;

/// Icon shown with an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertIcon {
  Success,
  Error,
  Warning,
}

impl fmt::Display for AlertIcon {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      AlertIcon::Success => "success",
      AlertIcon::Error => "error",
      AlertIcon::Warning => "warning",
    };
    write!(f, "{label}")
  }
}

/// An alert dialog.
#[derive(Debug, Clone)]
pub struct Alert {
  pub title: String,
  pub text: String,
  pub icon: AlertIcon,
  pub confirm_button_text: String,
}

impl Alert {
  pub fn success(title: impl Into<String>, text: impl Into<String>) -> Self {
    Self {
      title: title.into(),
      text: text.into(),
      icon: AlertIcon::Success,
      confirm_button_text: "Okay".into(),
    }
  }

  pub fn error(title: impl Into<String>, text: impl Into<String>) -> Self {
    Self {
      title: title.into(),
      text: text.into(),
      icon: AlertIcon::Error,
      confirm_button_text: "Okay".into(),
    }
  }
}

/// Surface that shows alerts to the user.
pub trait AlertSink {
  fn show(&self, alert: Alert);
}

/// Writes alerts to standard output.
pub struct ConsoleAlerts;

impl AlertSink for ConsoleAlerts {
  fn show(&self, alert: Alert) {
    println!("[{}] {}", alert.icon, alert.title);
    println!("  {}", alert.text);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_alert_constructors_set_icon_and_button() {
    let ok = Alert::success("Saved", "All good");
    assert_eq!(ok.icon, AlertIcon::Success);
    assert_eq!(ok.confirm_button_text, "Okay");

    let bad = Alert::error("Not saved", "Server said no");
    assert_eq!(bad.icon, AlertIcon::Error);
  }
}
