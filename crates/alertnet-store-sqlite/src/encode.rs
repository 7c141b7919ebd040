//! Encoding and decoding helpers between core document types and the plain
//! text stored in SQLite columns.
//!
//! Bodies are compact JSON objects. Timestamps are RFC 3339 UTC strings with
//! exactly six fractional digits and a `Z` suffix, so comparing two of them as
//! text (including inside `json_extract`) orders them chronologically.

use alertnet_core::{
  document::{Document, Fields},
  store::{Collection, DocumentWrite},
};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Value as SqlValue;
use serde_json::Value;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Ids ─────────────────────────────────────────────────────────────────────

pub fn new_doc_id() -> String { Uuid::new_v4().hyphenated().to_string() }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Bodies ──────────────────────────────────────────────────────────────────

/// Merge `write` into `fields`, filling its server-timestamp fields with `now`.
pub fn apply_write(fields: &mut Fields, write: DocumentWrite, now: DateTime<Utc>) {
  fields.extend(write.fields);
  let stamp = encode_dt(now);
  for field in write.server_timestamps {
    fields.insert(field, Value::String(stamp.clone()));
  }
}

pub fn encode_body(fields: &Fields) -> serde_json::Result<String> {
  serde_json::to_string(fields)
}

pub fn decode_body(s: &str) -> serde_json::Result<Value> { serde_json::from_str(s) }

// ─── Query parameters ────────────────────────────────────────────────────────

/// A JSON path selecting one top-level field.
pub fn json_path(field: &str) -> String { format!("$.\"{field}\"") }

/// The SQL value `json_extract` yields for `value`.
pub fn sql_value(value: &Value) -> SqlValue {
  match value {
    Value::Null => SqlValue::Null,
    Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
    Value::Number(n) => n
      .as_i64()
      .map(SqlValue::Integer)
      .or_else(|| n.as_f64().map(SqlValue::Real))
      .unwrap_or(SqlValue::Null),
    Value::String(s) => SqlValue::Text(s.clone()),
    other => SqlValue::Text(other.to_string()),
  }
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// A `documents` row as read from SQLite, before JSON decoding.
pub struct RawDocument {
  pub doc_id:  String,
  pub version: i64,
  pub body:    String,
}

impl RawDocument {
  pub fn into_document(self, collection: Collection) -> Result<Document> {
    match decode_body(&self.body)? {
      Value::Object(fields) => Ok(Document {
        id: self.doc_id,
        version: u64::try_from(self.version).unwrap_or_default(),
        fields,
      }),
      _ => Err(Error::CorruptDocument { collection, id: self.doc_id }),
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use serde_json::json;

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let a = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 9).unwrap();
    let b = a + chrono::TimeDelta::microseconds(1);
    let c = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 10).unwrap();
    let (ea, eb, ec) = (encode_dt(a), encode_dt(b), encode_dt(c));
    assert_eq!(ea, "2026-01-01T00:00:09.000000Z");
    assert!(ea < eb && eb < ec);
    assert_eq!(decode_dt(&eb).unwrap(), b);
  }

  #[test]
  fn apply_write_merges_and_stamps() {
    let mut fields = json!({ "name": "A", "status": "Safe" })
      .as_object()
      .cloned()
      .unwrap();
    let now = Utc.with_ymd_and_hms(2026, 5, 4, 3, 2, 1).unwrap();
    let write = DocumentWrite::new()
      .set("status", "Emergency")
      .server_timestamp("sos_timestamp");
    apply_write(&mut fields, write, now);
    assert_eq!(fields["name"], "A");
    assert_eq!(fields["status"], "Emergency");
    assert_eq!(fields["sos_timestamp"], "2026-05-04T03:02:01.000000Z");
  }

  #[test]
  fn sql_values_match_json_extract() {
    assert_eq!(sql_value(&json!("Emergency")), SqlValue::Text("Emergency".into()));
    assert_eq!(sql_value(&json!(true)), SqlValue::Integer(1));
    assert_eq!(sql_value(&json!(3)), SqlValue::Integer(3));
    assert_eq!(sql_value(&json!(null)), SqlValue::Null);
  }

  #[test]
  fn non_object_body_is_corrupt() {
    let raw = RawDocument { doc_id: "x".into(), version: 1, body: "[1,2]".into() };
    assert!(matches!(
      raw.into_document(Collection::Users),
      Err(Error::CorruptDocument { .. })
    ));
  }
}
