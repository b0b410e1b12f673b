//! Profile cache and sync client for the VirtualBank dashboard API.
//!
//! The dashboard keeps the signed-in user's profile close at hand:
//! memoized in memory, persisted in a local key-value store, and
//! fetched from the server only when both miss. Edits are diffed
//! against the cached baseline so only changed fields travel to the
//! update endpoint.

pub mod alerts;
pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod notify;
pub mod profile;
