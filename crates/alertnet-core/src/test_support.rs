//! Shared fakes for unit tests.

use std::convert::Infallible;

use crate::{
  AdvisoryError,
  advisory::{
    AdvisoryService, AlertSuggestion, RiskAssessment, RiskLevel,
    SafePathGuidance, SafePathRequest,
  },
  alert::Severity,
  document::Document,
  store::{
    Collection, CreateOutcome, DocumentStore, DocumentWrite, Query, Snapshot,
    Subscription, UpdateOutcome,
  },
};

/// A store that fails the test on any access. Used to prove that rejected
/// operations never reach the store.
pub struct PanicStore;

impl DocumentStore for PanicStore {
  type Error = Infallible;

  async fn create(
    &self,
    collection: Collection,
    _id: Option<String>,
    _write: DocumentWrite,
  ) -> Result<CreateOutcome, Infallible> {
    panic!("unexpected create in {collection}")
  }

  async fn update(
    &self,
    collection: Collection,
    _id: String,
    _write: DocumentWrite,
    _expected_version: Option<u64>,
  ) -> Result<UpdateOutcome, Infallible> {
    panic!("unexpected update in {collection}")
  }

  async fn get(
    &self,
    collection: Collection,
    _id: String,
  ) -> Result<Option<Document>, Infallible> {
    panic!("unexpected get in {collection}")
  }

  async fn query<'a>(&'a self, query: &'a Query) -> Result<Snapshot, Infallible> {
    panic!("unexpected query on {}", query.collection)
  }

  async fn subscribe(
    &self,
    query: Query,
  ) -> Result<Subscription<Infallible>, Infallible> {
    panic!("unexpected subscribe on {}", query.collection)
  }
}

/// An advisory service with canned answers, or a canned failure.
pub struct FakeAdvisory {
  pub fail: bool,
}

impl FakeAdvisory {
  pub fn working() -> Self { Self { fail: false } }

  pub fn failing() -> Self { Self { fail: true } }

  fn check(&self) -> Result<(), AdvisoryError> {
    if self.fail {
      Err(AdvisoryError::Unavailable("service down".into()))
    } else {
      Ok(())
    }
  }
}

impl AdvisoryService for FakeAdvisory {
  async fn generate_suggestion(
    &self,
    disaster_type: String,
    severity: Severity,
  ) -> Result<AlertSuggestion, AdvisoryError> {
    self.check()?;
    Ok(AlertSuggestion {
      title:   format!("{severity} {disaster_type} warning"),
      message: format!("A {disaster_type} is expected. Follow official guidance."),
    })
  }

  async fn safe_path(
    &self,
    request: SafePathRequest,
  ) -> Result<SafePathGuidance, AdvisoryError> {
    self.check()?;
    Ok(SafePathGuidance {
      destination:        "Community Hall".into(),
      safe_path:          format!("Head north away from the {}", request.disaster_type),
      estimated_time:     "15 minutes".into(),
      risk_level:         "Low".into(),
      destination_coords: None,
    })
  }

  async fn assess_risk(
    &self,
    _description: String,
  ) -> Result<RiskAssessment, AdvisoryError> {
    self.check()?;
    Ok(RiskAssessment {
      risk_level: RiskLevel::Moderate,
      summary:    "Localised flooding".into(),
      guidance:   vec!["Move to higher ground".into()],
    })
  }
}
