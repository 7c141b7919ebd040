//! Alert broadcaster. Lets an admin append immutable alerts, optionally
//! drafted by the advisory service.

use std::sync::Arc;

use serde::Deserialize;

use crate::{
  AdvisoryError, BroadcastError, ValidationError,
  advisory::{AdvisoryService, AlertSuggestion},
  alert::{Alert, AlertId, Severity},
  feed::{self, FeedSpec, ProjectedView},
  session::Session,
  store::{Collection, CreateOutcome, DocumentStore, DocumentWrite, Direction, Query},
};

/// An alert being composed. Nothing is stored until it is broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AlertDraft {
  pub title:    String,
  #[serde(default)]
  pub severity: Severity,
  pub message:  String,
}

impl AlertDraft {
  pub const MIN_TITLE_CHARS: usize = 5;
  pub const MIN_MESSAGE_CHARS: usize = 20;

  pub fn validate(&self) -> Result<(), ValidationError> {
    // Lengths count Unicode scalar values of the raw input; no trimming.
    if self.title.chars().count() < Self::MIN_TITLE_CHARS {
      return Err(ValidationError::new(
        "title",
        format!("must be at least {} characters", Self::MIN_TITLE_CHARS),
      ));
    }
    if self.message.chars().count() < Self::MIN_MESSAGE_CHARS {
      return Err(ValidationError::new(
        "message",
        format!("must be at least {} characters", Self::MIN_MESSAGE_CHARS),
      ));
    }
    Ok(())
  }

  fn into_write(self) -> DocumentWrite {
    DocumentWrite::new()
      .set("title", self.title)
      .set("severity", self.severity.as_str())
      .set("message", self.message)
      .server_timestamp("created_at")
  }
}

pub struct AlertBroadcaster<S, A> {
  store:    Arc<S>,
  advisory: Arc<A>,
}

impl<S, A> AlertBroadcaster<S, A>
where
  S: DocumentStore + 'static,
  A: AdvisoryService,
{
  pub fn new(store: Arc<S>, advisory: Arc<A>) -> Self { Self { store, advisory } }

  /// Validate and append `draft` as a new alert.
  pub async fn broadcast(
    &self,
    session: &Session,
    draft: AlertDraft,
  ) -> Result<AlertId, BroadcastError> {
    if !session.is_admin() {
      return Err(BroadcastError::Forbidden);
    }
    draft.validate()?;

    let severity = draft.severity;
    let outcome = self
      .store
      .create(Collection::Alerts, None, draft.into_write())
      .await
      .map_err(|e| BroadcastError::WriteFailed(Box::new(e)))?;

    match outcome {
      CreateOutcome::Created(doc) => {
        tracing::info!(alert = %doc.id, %severity, admin = %session.user_key, "alert broadcast");
        Ok(AlertId(doc.id))
      }
      CreateOutcome::AlreadyExists => Err(BroadcastError::WriteFailed(
        "generated alert id collided with an existing document".into(),
      )),
    }
  }

  /// Ask the advisory service for alert copy. Nothing is submitted.
  pub async fn suggest(
    &self,
    session: &Session,
    disaster_type: &str,
    severity: Severity,
  ) -> Result<AlertSuggestion, AdvisoryError> {
    if !session.is_admin() {
      return Err(AdvisoryError::Forbidden);
    }
    let suggestion = self
      .advisory
      .generate_suggestion(disaster_type.to_owned(), severity)
      .await;
    if let Err(e) = &suggestion {
      tracing::warn!(disaster_type, %severity, error = %e, "alert suggestion failed");
    }
    suggestion
  }

  /// Replace the draft's title and message with a suggestion for its
  /// severity. On failure the draft is left as it was.
  pub async fn suggest_into(
    &self,
    session: &Session,
    disaster_type: &str,
    draft: &mut AlertDraft,
  ) -> Result<(), AdvisoryError> {
    let AlertSuggestion { title, message } =
      self.suggest(session, disaster_type, draft.severity).await?;
    draft.title = title;
    draft.message = message;
    Ok(())
  }

  /// All alerts, newest first.
  pub fn subscribe_alerts(&self) -> ProjectedView<Alert> {
    feed::project(self.store.clone(), alerts_feed())
  }
}

pub fn alerts_feed() -> FeedSpec<Alert> {
  FeedSpec::new(
    Query::collection(Collection::Alerts).order_by("created_at", Direction::Descending),
  )
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use super::*;
  use crate::{
    test_support::{FakeAdvisory, PanicStore},
    user::UserKey,
  };

  fn admin() -> Session { Session::admin(UserKey::new("admin@x.com")) }

  fn broadcaster(advisory: FakeAdvisory) -> AlertBroadcaster<PanicStore, FakeAdvisory> {
    AlertBroadcaster::new(Arc::new(PanicStore), Arc::new(advisory))
  }

  fn draft(title: &str, message: &str) -> AlertDraft {
    AlertDraft {
      title:    title.into(),
      severity: Severity::High,
      message:  message.into(),
    }
  }

  #[test]
  fn default_severity_is_moderate() {
    assert_eq!(AlertDraft::default().severity, Severity::Moderate);
  }

  #[test]
  fn length_boundaries() {
    assert!(draft("Flood", "Water levels rising!").validate().is_ok());
    assert_eq!(draft("Fire", "Water levels rising!").validate().unwrap_err().field, "title");
    assert_eq!(draft("Flood", "Water levels rising").validate().unwrap_err().field, "message");
  }

  #[test]
  fn lengths_count_scalars_without_trimming() {
    // Five scalars, more than five bytes.
    assert!(draft("ñáéíó", &"ñáéíó".repeat(4)).validate().is_ok());
    assert!(draft("ñáéí", &"ñáéíó".repeat(4)).validate().is_err());
    // Whitespace counts.
    assert!(draft(&" ".repeat(5), &" ".repeat(20)).validate().is_ok());
  }

  #[tokio::test]
  async fn citizen_cannot_broadcast() {
    let b = broadcaster(FakeAdvisory::working());
    let citizen = Session::citizen(UserKey::new("a@x.com"));
    let err = b
      .broadcast(&citizen, draft("Flood warning", "Move to higher ground now."))
      .await
      .unwrap_err();
    assert!(matches!(err, BroadcastError::Forbidden));
  }

  #[tokio::test]
  async fn invalid_draft_never_reaches_the_store() {
    let b = broadcaster(FakeAdvisory::working());
    let err = b
      .broadcast(&admin(), draft("Fire", "Evacuate the building immediately."))
      .await
      .unwrap_err();
    assert!(matches!(err, BroadcastError::Validation(v) if v.field == "title"));
  }

  #[tokio::test]
  async fn suggest_into_fills_draft() {
    let b = broadcaster(FakeAdvisory::working());
    let mut d = AlertDraft { severity: Severity::High, ..Default::default() };
    b.suggest_into(&admin(), "Flood", &mut d).await.unwrap();
    assert_eq!(d.title, "High Flood warning");
    assert!(d.message.contains("Flood"));
    assert_eq!(d.severity, Severity::High);
  }

  #[tokio::test]
  async fn failed_suggestion_leaves_draft_untouched() {
    let b = broadcaster(FakeAdvisory::failing());
    let mut d = draft("My title", "My hand-written message.");
    let before = d.clone();
    let err = b.suggest_into(&admin(), "Flood", &mut d).await.unwrap_err();
    assert!(matches!(err, AdvisoryError::Unavailable(_)));
    assert_eq!(d, before);
  }

  #[tokio::test]
  async fn citizen_cannot_request_suggestions() {
    let b = broadcaster(FakeAdvisory::working());
    let citizen = Session::citizen(UserKey::new("a@x.com"));
    let err = b.suggest(&citizen, "Flood", Severity::Low).await.unwrap_err();
    assert_eq!(err, AdvisoryError::Forbidden);
  }
}
