//! Handlers for `/reports` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/reports` | Admin; newest first |
//! | `GET`  | `/reports/stream` | Admin; SSE |
//! | `POST` | `/reports` | Citizen; body: [`ReportSubmission`]; 201 + report |

use alertnet_core::{
  advisory::AdvisoryService,
  report::{Report, ReportSubmission},
  store::DocumentStore,
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::{
  AppState,
  error::ApiError,
  session::{CurrentSession, MaybeSession},
  stream,
};

/// `GET /reports`
pub async fn list<S, A>(
  State(state): State<AppState<S, A>>,
  current: CurrentSession,
) -> Result<Json<Vec<Report>>, ApiError>
where
  S: DocumentStore + 'static,
  A: AdvisoryService + 'static,
{
  current.require_admin()?;
  Ok(Json(stream::snapshot(state.reports().subscribe_reports()).await?))
}

/// `GET /reports/stream`
pub async fn list_stream<S, A>(
  State(state): State<AppState<S, A>>,
  current: CurrentSession,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore + 'static,
  A: AdvisoryService + 'static,
{
  current.require_admin()?;
  Ok(stream::sse(state.reports().subscribe_reports()))
}

/// `POST /reports`
pub async fn create<S, A>(
  State(state): State<AppState<S, A>>,
  MaybeSession(session): MaybeSession,
  Json(submission): Json<ReportSubmission>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore + 'static,
  A: AdvisoryService + 'static,
{
  let report = state.reports().submit(session.as_ref(), submission).await?;
  Ok((StatusCode::CREATED, Json(report)))
}
