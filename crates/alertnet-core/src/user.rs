//! Users: the documents whose `status` field is the single source of truth
//! for a person's safety state.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  DecodeError, ValidationError,
  document::{Document, FromDocument, decode_fields},
  store::{Collection, DocumentWrite},
};

/// Location recorded when a user is first registered.
pub const UNSPECIFIED_LOCATION: &str = "Not specified";
/// Location recorded on an SOS; true geolocation is not captured.
pub const SOS_LOCATION: &str = "Unknown (SOS Triggered)";
/// Location recorded when a user is marked safe.
pub const SAFE_LOCATION: &str = "Safe";

// ─── Identity ────────────────────────────────────────────────────────────────

/// A user's email address, used directly as the document key. Trimmed and
/// lowercased so lookups ignore case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserKey(String);

impl UserKey {
  pub fn new(email: impl AsRef<str>) -> Self {
    Self(email.as_ref().trim().to_lowercase())
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for UserKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub enum Status {
  #[default]
  Unknown,
  Safe,
  Emergency,
}

impl Status {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Unknown => "Unknown",
      Self::Safe => "Safe",
      Self::Emergency => "Emergency",
    }
  }
}

/// The statuses a write may set. `Unknown` is only ever assigned at signup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusTarget {
  Safe,
  Emergency,
}

impl StatusTarget {
  pub fn status(self) -> Status {
    match self {
      Self::Safe => Status::Safe,
      Self::Emergency => Status::Emergency,
    }
  }
}

// ─── User ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
  pub key:                 UserKey,
  pub name:                String,
  pub email:               String,
  pub status:              Status,
  pub last_known_location: String,
  pub phone:               String,
  pub address:             String,
  /// Set by the store on every transition into `Emergency`.
  pub sos_timestamp:       Option<DateTime<Utc>>,
  pub version:             u64,
}

#[derive(Deserialize)]
struct UserFields {
  #[serde(default)]
  name:                String,
  #[serde(default)]
  email:               String,
  status:              Option<Status>,
  #[serde(default)]
  last_known_location: String,
  #[serde(default)]
  phone:               String,
  #[serde(default)]
  address:             String,
  sos_timestamp:       Option<DateTime<Utc>>,
}

impl FromDocument for User {
  const COLLECTION: Collection = Collection::Users;

  fn from_document(doc: Document) -> Result<Self, DecodeError> {
    let f: UserFields = decode_fields(&doc.id, doc.fields)?;
    Ok(Self {
      key:                 UserKey(doc.id),
      name:                f.name,
      email:               f.email,
      status:              f.status.unwrap_or_default(),
      last_known_location: f.last_known_location,
      phone:               f.phone,
      address:             f.address,
      sos_timestamp:       f.sos_timestamp,
      version:             doc.version,
    })
  }
}

// ─── Signup ──────────────────────────────────────────────────────────────────

/// Input for registering a citizen account.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
  pub first_name: String,
  pub last_name:  String,
  pub email:      String,
  pub password:   String,
  #[serde(default)]
  pub phone:      Option<String>,
  #[serde(default)]
  pub address:    Option<String>,
}

impl NewAccount {
  pub const MIN_PASSWORD_LEN: usize = 6;

  pub fn validate(&self) -> Result<(), ValidationError> {
    if self.first_name.trim().is_empty() {
      return Err(ValidationError::new("first_name", "first name is required"));
    }
    if self.last_name.trim().is_empty() {
      return Err(ValidationError::new("last_name", "last name is required"));
    }
    if !is_plausible_email(self.email.trim()) {
      return Err(ValidationError::new("email", "invalid email address"));
    }
    if self.password.chars().count() < Self::MIN_PASSWORD_LEN {
      return Err(ValidationError::new(
        "password",
        format!("must be at least {} characters", Self::MIN_PASSWORD_LEN),
      ));
    }
    Ok(())
  }

  pub fn key(&self) -> UserKey { UserKey::new(&self.email) }

  pub fn display_name(&self) -> String {
    format!("{} {}", self.first_name.trim(), self.last_name.trim())
  }

  /// The initial user document: status `Unknown`, no location.
  pub fn user_write(&self) -> DocumentWrite {
    DocumentWrite::new()
      .set("name", self.display_name())
      .set("email", self.key().as_str())
      .set("status", Status::Unknown.as_str())
      .set("last_known_location", UNSPECIFIED_LOCATION)
      .set("phone", self.phone.clone().unwrap_or_default())
      .set("address", self.address.clone().unwrap_or_default())
  }
}

fn is_plausible_email(email: &str) -> bool {
  let Some((local, domain)) = email.split_once('@') else {
    return false;
  };
  !local.is_empty()
    && !domain.contains('@')
    && !email.chars().any(char::is_whitespace)
    && domain
      .split_once('.')
      .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
    && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn doc(fields: serde_json::Value) -> Document {
    Document {
      id:      "a@x.com".into(),
      version: 3,
      fields:  fields.as_object().cloned().unwrap(),
    }
  }

  fn account() -> NewAccount {
    NewAccount {
      first_name: "Ada".into(),
      last_name:  "Lovelace".into(),
      email:      " ada@example.com ".into(),
      password:   "hunter22".into(),
      phone:      None,
      address:    Some("1 Analytical Way".into()),
    }
  }

  #[test]
  fn missing_status_decodes_as_unknown() {
    let user = User::from_document(doc(json!({ "name": "A" }))).unwrap();
    assert_eq!(user.status, Status::Unknown);
    assert_eq!(user.key.as_str(), "a@x.com");
    assert_eq!(user.version, 3);
  }

  #[test]
  fn null_status_decodes_as_unknown() {
    let user = User::from_document(doc(json!({ "status": null }))).unwrap();
    assert_eq!(user.status, Status::Unknown);
  }

  #[test]
  fn unrecognised_status_is_a_decode_error() {
    let err = User::from_document(doc(json!({ "status": "Panicking" })))
      .unwrap_err();
    assert_eq!(err.id, "a@x.com");
  }

  #[test]
  fn sos_timestamp_decodes() {
    let user = User::from_document(doc(json!({
      "status": "Emergency",
      "sos_timestamp": "2026-01-02T03:04:05.000006Z",
    })))
    .unwrap();
    assert_eq!(user.status, Status::Emergency);
    assert!(user.sos_timestamp.is_some());
  }

  #[test]
  fn account_validation() {
    assert!(account().validate().is_ok());

    let mut short = account();
    short.password = "12345".into();
    assert_eq!(short.validate().unwrap_err().field, "password");

    let mut bad_email = account();
    bad_email.email = "not-an-email".into();
    assert_eq!(bad_email.validate().unwrap_err().field, "email");

    let mut no_name = account();
    no_name.first_name = "  ".into();
    assert_eq!(no_name.validate().unwrap_err().field, "first_name");
  }

  #[test]
  fn user_write_starts_unknown() {
    let write = account().user_write();
    assert_eq!(write.fields["status"], "Unknown");
    assert_eq!(write.fields["email"], "ada@example.com");
    assert_eq!(write.fields["name"], "Ada Lovelace");
    assert_eq!(write.fields["last_known_location"], UNSPECIFIED_LOCATION);
    assert_eq!(write.fields["phone"], "");
    assert!(write.server_timestamps.is_empty());
  }

  #[test]
  fn keys_ignore_case() {
    assert_eq!(UserKey::new(" Ann@X.com "), UserKey::new("ann@x.com"));
    assert_eq!(UserKey::new("Ann@X.com").as_str(), "ann@x.com");

    let mut shouty = account();
    shouty.email = "ADA@Example.COM".into();
    assert_eq!(shouty.key().as_str(), "ada@example.com");
    assert_eq!(shouty.user_write().fields["email"], "ada@example.com");
  }

  #[test]
  fn email_shapes() {
    assert!(is_plausible_email("a@x.com"));
    assert!(!is_plausible_email("a@x"));
    assert!(!is_plausible_email("@x.com"));
    assert!(!is_plausible_email("a b@x.com"));
    assert!(!is_plausible_email("a@@x.com"));
  }
}
