//! Error type for `alertnet-store-sqlite`.

use alertnet_core::store::Collection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored body was valid JSON but not an object.
  #[error("document {collection}/{id} has a non-object body")]
  CorruptDocument { collection: Collection, id: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
