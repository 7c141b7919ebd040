//! Handlers for `/alerts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/alerts` | Any session; newest first |
//! | `GET`  | `/alerts/stream` | Any session; SSE |
//! | `POST` | `/alerts` | Admin; body: [`AlertDraft`]; 201 + `{"id":...}` |
//! | `POST` | `/alerts/suggest` | Admin; body: `{"disaster_type","severity"}` |

use alertnet_core::{
  advisory::{AdvisoryService, AlertSuggestion},
  alert::{Alert, Severity},
  broadcast::AlertDraft,
  store::DocumentStore,
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, error::ApiError, session::CurrentSession, stream};

/// `GET /alerts`
pub async fn list<S, A>(
  State(state): State<AppState<S, A>>,
  _current: CurrentSession,
) -> Result<Json<Vec<Alert>>, ApiError>
where
  S: DocumentStore + 'static,
  A: AdvisoryService + 'static,
{
  Ok(Json(stream::snapshot(state.alerts().subscribe_alerts()).await?))
}

/// `GET /alerts/stream`
pub async fn list_stream<S, A>(
  State(state): State<AppState<S, A>>,
  _current: CurrentSession,
) -> impl IntoResponse
where
  S: DocumentStore + 'static,
  A: AdvisoryService + 'static,
{
  stream::sse(state.alerts().subscribe_alerts())
}

/// `POST /alerts`
pub async fn create<S, A>(
  State(state): State<AppState<S, A>>,
  current: CurrentSession,
  Json(draft): Json<AlertDraft>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore + 'static,
  A: AdvisoryService + 'static,
{
  let id = state.alerts().broadcast(&current.session, draft).await?;
  Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

#[derive(Debug, Deserialize)]
pub struct SuggestBody {
  #[serde(alias = "disasterType")]
  pub disaster_type: String,
  #[serde(default)]
  pub severity:      Severity,
}

/// `POST /alerts/suggest`
pub async fn suggest<S, A>(
  State(state): State<AppState<S, A>>,
  current: CurrentSession,
  Json(body): Json<SuggestBody>,
) -> Result<Json<AlertSuggestion>, ApiError>
where
  S: DocumentStore + 'static,
  A: AdvisoryService + 'static,
{
  let suggestion = state
    .alerts()
    .suggest(&current.session, &body.disaster_type, body.severity)
    .await?;
  Ok(Json(suggestion))
}
