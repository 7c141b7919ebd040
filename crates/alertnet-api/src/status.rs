//! Handlers for status writes and the admin views over `users`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/status` | Body: `{"status":"Safe"\|"Emergency","expected_version":n?}` |
//! | `POST` | `/users/{key}/mark-safe` | Admin; optional body `{"expected_version":n}` |
//! | `GET`  | `/users` | Admin; roster sorted by name |
//! | `GET`  | `/users/stream` | Admin; roster as SSE |
//! | `GET`  | `/users/summary` | Admin; head count per status |
//! | `GET`  | `/sos` | Admin; users in `Emergency`, newest SOS first |
//! | `GET`  | `/sos/stream` | Admin; the same as SSE |

use alertnet_core::{
  advisory::AdvisoryService,
  status::StatusSummary,
  store::DocumentStore,
  user::{StatusTarget, User, UserKey},
};
use axum::{
  Json,
  body::Bytes,
  extract::{Path, State},
  response::IntoResponse,
};
use serde::Deserialize;

use crate::{
  AppState,
  error::ApiError,
  session::{CurrentSession, MaybeSession},
  stream,
};

// ─── Writes ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status:           StatusTarget,
  #[serde(default)]
  pub expected_version: Option<u64>,
}

/// `POST /status`
pub async fn set_own<S, A>(
  State(state): State<AppState<S, A>>,
  MaybeSession(session): MaybeSession,
  Json(body): Json<StatusBody>,
) -> Result<Json<User>, ApiError>
where
  S: DocumentStore + 'static,
  A: AdvisoryService + 'static,
{
  let user = state
    .status()
    .set_status(session.as_ref(), body.status, body.expected_version)
    .await?;
  Ok(Json(user))
}

#[derive(Debug, Default, Deserialize)]
pub struct MarkSafeBody {
  #[serde(default)]
  pub expected_version: Option<u64>,
}

/// `POST /users/{key}/mark-safe`
pub async fn mark_safe<S, A>(
  State(state): State<AppState<S, A>>,
  current: CurrentSession,
  Path(key): Path<String>,
  body: Bytes,
) -> Result<Json<User>, ApiError>
where
  S: DocumentStore + 'static,
  A: AdvisoryService + 'static,
{
  let body: MarkSafeBody = if body.iter().all(u8::is_ascii_whitespace) {
    MarkSafeBody::default()
  } else {
    serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?
  };
  let user = state
    .status()
    .mark_safe_by_admin(&current.session, &UserKey::new(key), body.expected_version)
    .await?;
  Ok(Json(user))
}

// ─── Admin views ─────────────────────────────────────────────────────────────

/// `GET /users`
pub async fn roster<S, A>(
  State(state): State<AppState<S, A>>,
  current: CurrentSession,
) -> Result<Json<Vec<User>>, ApiError>
where
  S: DocumentStore + 'static,
  A: AdvisoryService + 'static,
{
  current.require_admin()?;
  Ok(Json(stream::snapshot(state.status().subscribe_roster()).await?))
}

/// `GET /users/stream`
pub async fn roster_stream<S, A>(
  State(state): State<AppState<S, A>>,
  current: CurrentSession,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore + 'static,
  A: AdvisoryService + 'static,
{
  current.require_admin()?;
  Ok(stream::sse(state.status().subscribe_roster()))
}

/// `GET /users/summary`
pub async fn summary<S, A>(
  State(state): State<AppState<S, A>>,
  current: CurrentSession,
) -> Result<Json<StatusSummary>, ApiError>
where
  S: DocumentStore + 'static,
  A: AdvisoryService + 'static,
{
  current.require_admin()?;
  let users = stream::snapshot(state.status().subscribe_roster()).await?;
  Ok(Json(StatusSummary::from_users(&users)))
}

/// `GET /sos`
pub async fn emergencies<S, A>(
  State(state): State<AppState<S, A>>,
  current: CurrentSession,
) -> Result<Json<Vec<User>>, ApiError>
where
  S: DocumentStore + 'static,
  A: AdvisoryService + 'static,
{
  current.require_admin()?;
  Ok(Json(stream::snapshot(state.status().subscribe_emergency_users()).await?))
}

/// `GET /sos/stream`
pub async fn emergencies_stream<S, A>(
  State(state): State<AppState<S, A>>,
  current: CurrentSession,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore + 'static,
  A: AdvisoryService + 'static,
{
  current.require_admin()?;
  Ok(stream::sse(state.status().subscribe_emergency_users()))
}
