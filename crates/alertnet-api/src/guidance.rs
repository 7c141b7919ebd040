//! Advisory guidance for any signed-in user. Answers are never stored.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/guidance/safe-path` | Body: `{"current_location","disaster_type","severity"}` |
//! | `POST` | `/guidance/risk` | Body: `{"description"}` |

use alertnet_core::{
  ValidationError,
  advisory::{AdvisoryService, RiskAssessment, SafePathGuidance, SafePathRequest},
  alert::Severity,
  store::DocumentStore,
};
use axum::{Json, extract::State};
use serde::Deserialize;

use crate::{AppState, error::ApiError, session::CurrentSession};

#[derive(Debug, Deserialize)]
pub struct SafePathBody {
  #[serde(alias = "currentLocation")]
  pub current_location: String,
  #[serde(alias = "disasterType")]
  pub disaster_type:    String,
  #[serde(default)]
  pub severity:         Severity,
}

/// `POST /guidance/safe-path`
pub async fn safe_path<S, A>(
  State(state): State<AppState<S, A>>,
  _current: CurrentSession,
  Json(body): Json<SafePathBody>,
) -> Result<Json<SafePathGuidance>, ApiError>
where
  S: DocumentStore + 'static,
  A: AdvisoryService + 'static,
{
  let request = SafePathRequest::new(body.current_location, body.disaster_type, body.severity)?;
  Ok(Json(state.advisory.safe_path(request).await?))
}

#[derive(Debug, Deserialize)]
pub struct RiskBody {
  pub description: String,
}

/// `POST /guidance/risk`
pub async fn risk<S, A>(
  State(state): State<AppState<S, A>>,
  _current: CurrentSession,
  Json(body): Json<RiskBody>,
) -> Result<Json<RiskAssessment>, ApiError>
where
  S: DocumentStore + 'static,
  A: AdvisoryService + 'static,
{
  if body.description.trim().is_empty() {
    return Err(ValidationError::new("description", "description is required").into());
  }
  Ok(Json(state.advisory.assess_risk(body.description).await?))
}
