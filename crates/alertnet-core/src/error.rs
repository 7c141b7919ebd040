//! Error types for `alertnet-core`.
//!
//! Each component has its own error enum so callers can tell a failed store
//! write apart from a failed advisory call. Store failures are carried as
//! boxed sources because the core does not know the backend's error type.

use thiserror::Error;

use crate::{store::Collection, user::UserKey};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A caller-supplied field failed its schema check. Never reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
  pub field:  &'static str,
  pub reason: String,
}

impl ValidationError {
  pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
    Self { field, reason: reason.into() }
  }
}

/// A stored document did not have the shape its collection requires.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("document {id}: {reason}")]
pub struct DecodeError {
  pub id:     String,
  pub reason: String,
}

// ─── Status writes ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum UpdateError {
  #[error("no signed-in user")]
  Unauthenticated,

  #[error("operation requires the admin role")]
  Forbidden,

  #[error("no user document for {0}")]
  UnknownUser(UserKey),

  #[error("user {key} was modified: expected version {expected}, found {actual}")]
  Conflict {
    key:      UserKey,
    expected: u64,
    actual:   u64,
  },

  #[error("store write failed: {0}")]
  WriteFailed(#[source] BoxError),
}

// ─── Alerts ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum BroadcastError {
  #[error("operation requires the admin role")]
  Forbidden,

  #[error("invalid alert: {0}")]
  Validation(#[from] ValidationError),

  #[error("store write failed: {0}")]
  WriteFailed(#[source] BoxError),
}

/// Failure of the external advisory-text generator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdvisoryError {
  /// The service errored, timed out, or answered with something unusable.
  #[error("advisory service unavailable: {0}")]
  Unavailable(String),

  /// Raised by the broadcaster's capability check before any call is made.
  #[error("operation requires the admin role")]
  Forbidden,
}

// ─── Reports ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ReportError {
  #[error("no signed-in user")]
  Unauthenticated,

  #[error("reports can only be submitted by citizens")]
  Forbidden,

  #[error("no user document for {0}")]
  UnknownUser(UserKey),

  #[error("invalid report: {0}")]
  Validation(#[from] ValidationError),

  #[error("store write failed: {0}")]
  WriteFailed(#[source] BoxError),
}

// ─── Live feeds ──────────────────────────────────────────────────────────────

/// Terminal failure of a projected view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
  #[error("subscription failed: {0}")]
  SubscriptionFailed(String),

  #[error("malformed {collection} document {id}: {reason}")]
  Decode {
    collection: Collection,
    id:         String,
    reason:     String,
  },
}
