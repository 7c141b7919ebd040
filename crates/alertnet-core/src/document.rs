//! Raw documents and the decode step that turns them into typed records.
//!
//! The store hands out untyped JSON objects. Every snapshot is decoded through
//! [`FromDocument`] before it reaches a view, so a document with the wrong
//! shape surfaces as an error instead of a half-populated record.

use serde::de::DeserializeOwned;

use crate::{DecodeError, store::Collection};

/// Top-level fields of a document.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// A document as held by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
  pub id:      String,
  /// Incremented by the store on every successful write; starts at 1.
  pub version: u64,
  pub fields:  Fields,
}

/// A typed record that can be decoded from a [`Document`] of a known
/// collection.
pub trait FromDocument: Sized {
  const COLLECTION: Collection;

  fn from_document(doc: Document) -> Result<Self, DecodeError>;
}

/// Deserialize the fields of a document into `F`.
pub fn decode_fields<F: DeserializeOwned>(
  id: &str,
  fields: Fields,
) -> Result<F, DecodeError> {
  serde_json::from_value(serde_json::Value::Object(fields)).map_err(|e| {
    DecodeError {
      id:     id.to_owned(),
      reason: e.to_string(),
    }
  })
}
