//! Report intake for citizen-submitted situation reports.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  DecodeError, ReportError, ValidationError,
  document::{Document, FromDocument, decode_fields},
  feed::{self, FeedSpec, ProjectedView},
  session::Session,
  store::{Collection, CreateOutcome, DocumentStore, DocumentWrite, Direction, Query},
  user::{User, UserKey},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
  pub id:          String,
  pub author_key:  UserKey,
  pub author_name: String,
  pub description: String,
  pub image_url:   Option<String>,
  pub image_hint:  Option<String>,
  pub location:    String,
  pub created_at:  DateTime<Utc>,
}

#[derive(Deserialize)]
struct ReportFields {
  author_key:  UserKey,
  #[serde(default)]
  author_name: String,
  description: String,
  image_url:   Option<String>,
  image_hint:  Option<String>,
  #[serde(default)]
  location:    String,
  created_at:  DateTime<Utc>,
}

impl FromDocument for Report {
  const COLLECTION: Collection = Collection::Reports;

  fn from_document(doc: Document) -> Result<Self, DecodeError> {
    let f: ReportFields = decode_fields(&doc.id, doc.fields)?;
    Ok(Self {
      id:          doc.id,
      author_key:  f.author_key,
      author_name: f.author_name,
      description: f.description,
      image_url:   f.image_url,
      image_hint:  f.image_hint,
      location:    f.location,
      created_at:  f.created_at,
    })
  }
}

/// What a citizen sends in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReportSubmission {
  pub description: String,
  #[serde(default)]
  pub image_url:   Option<String>,
  #[serde(default)]
  pub image_hint:  Option<String>,
  #[serde(default)]
  pub location:    String,
}

impl ReportSubmission {
  pub fn validate(&self) -> Result<(), ValidationError> {
    if self.description.trim().is_empty() {
      return Err(ValidationError::new("description", "description is required"));
    }
    Ok(())
  }

  fn into_write(self, author: &User) -> DocumentWrite {
    let optional = |v: Option<String>| {
      v.filter(|s| !s.trim().is_empty())
        .map_or(serde_json::Value::Null, serde_json::Value::String)
    };
    DocumentWrite::new()
      .set("author_key", author.key.as_str())
      .set("author_name", author.name.as_str())
      .set("description", self.description)
      .set("image_url", optional(self.image_url))
      .set("image_hint", optional(self.image_hint))
      .set("location", self.location)
      .server_timestamp("created_at")
  }
}

pub struct ReportIntake<S> {
  store: Arc<S>,
}

impl<S: DocumentStore + 'static> ReportIntake<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  pub async fn submit(
    &self,
    session: Option<&Session>,
    submission: ReportSubmission,
  ) -> Result<Report, ReportError> {
    let session = session.ok_or(ReportError::Unauthenticated)?;
    if session.is_admin() {
      return Err(ReportError::Forbidden);
    }
    submission.validate()?;

    let author = self
      .store
      .get(Collection::Users, session.user_key.as_str().to_owned())
      .await
      .map_err(|e| ReportError::WriteFailed(Box::new(e)))?
      .ok_or_else(|| ReportError::UnknownUser(session.user_key.clone()))?;
    let author =
      User::from_document(author).map_err(|e| ReportError::WriteFailed(Box::new(e)))?;

    let outcome = self
      .store
      .create(Collection::Reports, None, submission.into_write(&author))
      .await
      .map_err(|e| ReportError::WriteFailed(Box::new(e)))?;

    match outcome {
      CreateOutcome::Created(doc) => {
        let report =
          Report::from_document(doc).map_err(|e| ReportError::WriteFailed(Box::new(e)))?;
        tracing::info!(report = %report.id, author = %report.author_key, "report submitted");
        Ok(report)
      }
      CreateOutcome::AlreadyExists => Err(ReportError::WriteFailed(
        "generated report id collided with an existing document".into(),
      )),
    }
  }

  /// All reports, newest first.
  pub fn subscribe_reports(&self) -> ProjectedView<Report> {
    feed::project(self.store.clone(), reports_feed())
  }
}

pub fn reports_feed() -> FeedSpec<Report> {
  FeedSpec::new(
    Query::collection(Collection::Reports).order_by("created_at", Direction::Descending),
  )
}
