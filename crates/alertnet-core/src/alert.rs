//! Alerts: immutable, admin-authored broadcasts.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  DecodeError,
  document::{Document, FromDocument, decode_fields},
  store::Collection,
};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub enum Severity {
  Info,
  Low,
  #[default]
  Moderate,
  High,
}

impl Severity {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Info => "Info",
      Self::Low => "Low",
      Self::Moderate => "Moderate",
      Self::High => "High",
    }
  }
}

impl fmt::Display for Severity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Store-generated identifier of an alert.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertId(pub String);

impl fmt::Display for AlertId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// A broadcast alert. No field is ever updated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
  pub id:         AlertId,
  pub title:      String,
  pub severity:   Severity,
  pub message:    String,
  /// Server-assigned; strictly increasing across alerts.
  pub created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct AlertFields {
  title:      String,
  severity:   Severity,
  message:    String,
  created_at: DateTime<Utc>,
}

impl FromDocument for Alert {
  const COLLECTION: Collection = Collection::Alerts;

  fn from_document(doc: Document) -> Result<Self, DecodeError> {
    let f: AlertFields = decode_fields(&doc.id, doc.fields)?;
    Ok(Self {
      id:         AlertId(doc.id),
      title:      f.title,
      severity:   f.severity,
      message:    f.message,
      created_at: f.created_at,
    })
  }
}
