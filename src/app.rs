//! Wires the store, cache, API client, and collaborator surfaces
//! together and runs one dashboard action per invocation.

use clap::Subcommand;
use color_eyre::Result;

use crate::alerts::{Alert, AlertSink, ConsoleAlerts};
use crate::cache::{purge_on_version_change, SqliteStore};
use crate::config::Config;
use crate::error::ProfileError;
use crate::notify::{profile_edit_message, Notifications, Notifier};
use crate::profile::{
  parse_form_fields, to_form_fields, CachedProfileClient, Profile, SaveReport, REQUIRED_FIELDS,
};

/// Dashboard actions, one per invocation.
#[derive(Subcommand, Debug)]
pub enum Command {
  /// Show the current profile, from cache, local store, or the server
  Show,
  /// Submit the profile form as field=value pairs (e.g. first_name=Alice)
  Save {
    /// field=value pairs; every required profile field must be present
    fields: Vec<String>,
  },
  /// Drop the in-memory profile cache
  Clear {
    /// Also remove the profile from the local store
    #[arg(long)]
    store: bool,
  },
}

/// Main application state
pub struct App {
  client: CachedProfileClient<SqliteStore>,
  notifications: Notifications,
  alerts: ConsoleAlerts,
}

impl App {
  pub fn new(config: &Config) -> Result<Self> {
    let store = SqliteStore::open()?;

    // Stored data outlives releases; purge it when the version moves on.
    purge_on_version_change(
      &store,
      &config.storage.app_version,
      &[config.storage.profile_key.as_str()],
    )?;

    let client = CachedProfileClient::new(config, store)?;

    Ok(Self {
      client,
      notifications: Notifications::new(),
      alerts: ConsoleAlerts,
    })
  }

  pub async fn run(&self, command: Command) -> Result<()> {
    match command {
      Command::Show => self.show().await,
      Command::Save { fields } => self.save(&fields).await,
      Command::Clear { store } => self.clear(store).await,
    }
  }

  async fn show(&self) -> Result<()> {
    match self.client.profile().await? {
      Some(profile) => print_profile(&profile),
      None => println!("No profile yet. Add one with `vbank-profile save`."),
    }

    Ok(())
  }

  async fn save(&self, raw_pairs: &[String]) -> Result<()> {
    let pairs = match parse_pairs(raw_pairs) {
      Ok(pairs) => pairs,
      Err(err) => {
        self.alerts.show(Alert::error(
          "Profile Information was not saved",
          err.to_string(),
        ));
        return Ok(());
      }
    };

    let candidate = match parse_form_fields(pairs, REQUIRED_FIELDS) {
      Ok(candidate) => candidate,
      Err(err @ ProfileError::Validation(_)) => {
        self.alerts.show(Alert::error(
          "Profile Information was not saved",
          err.to_string(),
        ));
        return Ok(());
      }
      Err(err) => return Err(err.into()),
    };

    match self.client.save(&candidate).await {
      Ok(report) => self.report_save(report),
      Err(err @ ProfileError::Transport(_)) => {
        self.alerts.show(Alert::error(
          "Profile Information was not saved",
          err.to_string(),
        ));
        Ok(())
      }
      Err(err) => Err(err.into()),
    }
  }

  fn report_save(&self, report: SaveReport) -> Result<()> {
    match report {
      SaveReport::Created(profile) => {
        self.alerts.show(Alert::success(
          "Profile Information saved",
          "Your profile data was successfully saved",
        ));
        self
          .notifications
          .add("You have successfully added your profile data");
        print_profile(&profile);
      }
      SaveReport::Updated(changes) => {
        self.alerts.show(Alert::success(
          "Profile Information saved",
          "Your profile data was successfully saved",
        ));
        if let Some(message) = profile_edit_message(&changes) {
          self.notifications.add(&message);
        }
      }
      SaveReport::Unchanged => {
        println!("No changes to save.");
      }
      SaveReport::Rejected => {
        self.alerts.show(Alert::error(
          "Profile Information was not saved",
          "Error saving the profile data, please refresh or try again later",
        ));
      }
    }

    let unread = self.notifications.unread_count();
    if unread > 0 {
      println!("Unread notifications: {unread}");
      for notification in self.notifications.messages() {
        println!("  {}", notification.message);
      }
    }

    Ok(())
  }

  async fn clear(&self, clear_store: bool) -> Result<()> {
    self.client.clear_cache().await;
    println!("In-memory profile cache cleared.");

    if clear_store {
      self.client.forget_stored()?;
      println!(
        "Stored profile removed (key: {}).",
        self.client.storage_key()
      );
    }

    Ok(())
  }
}

/// Split raw `field=value` arguments into pairs.
fn parse_pairs(raw: &[String]) -> std::result::Result<Vec<(&str, &str)>, ProfileError> {
  raw
    .iter()
    .map(|entry| {
      entry
        .split_once('=')
        .ok_or_else(|| ProfileError::Validation(format!("expected field=value, got: {entry}")))
    })
    .collect()
}

fn print_profile(profile: &Profile) {
  if let Some(first_name) = profile.get("firstName") {
    let surname = profile.get("surname").unwrap_or("");
    println!("Welcome {} {}", first_name, surname);
    println!();
  }

  for (field, value) in to_form_fields(profile) {
    println!("{field}: {value}");
  }
}
