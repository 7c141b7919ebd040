//! Bearer-token sessions.
//!
//! Tokens are 32 random bytes, hex-encoded, handed to the client once. The
//! registry keeps only their SHA-256 digest. With a TTL configured, a session
//! stops resolving once it is older than the TTL and is dropped from the map.

use std::{
  collections::HashMap,
  sync::{PoisonError, RwLock},
  time::Duration,
};

use alertnet_core::session::Session;
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use chrono::{DateTime, TimeDelta, Utc};
use rand_core::{OsRng, RngCore as _};
use sha2::{Digest as _, Sha256};

use crate::{AppState, error::ApiError};

// ─── Registry ────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct SessionRegistry {
  sessions: RwLock<HashMap<String, Session>>,
  ttl:      Option<TimeDelta>,
}

impl SessionRegistry {
  /// A registry whose sessions live until logout.
  pub fn new() -> Self { Self::default() }

  /// A registry whose sessions expire `ttl` after they started.
  pub fn with_ttl(ttl: Duration) -> Self {
    Self {
      ttl: Some(TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX)),
      ..Self::default()
    }
  }

  fn is_expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
    self.ttl.is_some_and(|ttl| now - session.started_at >= ttl)
  }

  /// Register `session` and return the bearer token that resolves to it.
  pub fn issue(&self, session: Session) -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    let token = hex::encode(bytes);

    tracing::info!(user = %session.user_key, role = ?session.role, "session started");
    let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
    let now = Utc::now();
    sessions.retain(|_, live| !self.is_expired(live, now));
    sessions.insert(digest(&token), session);
    token
  }

  pub fn resolve(&self, token: &str) -> Option<Session> {
    let key = digest(token);
    let session = self
      .sessions
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .get(&key)
      .cloned()?;
    if !self.is_expired(&session, Utc::now()) {
      return Some(session);
    }

    self
      .sessions
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .remove(&key);
    tracing::info!(user = %session.user_key, "session expired");
    None
  }

  /// End the session behind `token`. Returns `false` if it was not live.
  pub fn revoke(&self, token: &str) -> bool {
    let removed = self
      .sessions
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .remove(&digest(token));
    if let Some(session) = &removed {
      tracing::info!(user = %session.user_key, "session ended");
    }
    removed.is_some()
  }

  pub fn len(&self) -> usize {
    self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

fn digest(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

// ─── Extractors ──────────────────────────────────────────────────────────────

/// A request carrying a live session token. Rejects with 401 otherwise.
pub struct CurrentSession {
  pub session: Session,
  pub token:   String,
}

impl CurrentSession {
  pub fn require_admin(&self) -> Result<(), ApiError> {
    if self.session.is_admin() { Ok(()) } else { Err(ApiError::Forbidden) }
  }
}

impl<S, A> FromRequestParts<AppState<S, A>> for CurrentSession
where
  S: Send + Sync,
  A: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, A>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers).ok_or(ApiError::Unauthenticated)?;
    let session = state
      .sessions
      .resolve(token)
      .ok_or(ApiError::Unauthenticated)?;
    Ok(Self { session, token: token.to_owned() })
  }
}

/// The session if a valid token was presented. Never rejects; the component
/// being called decides whether anonymity is acceptable.
pub struct MaybeSession(pub Option<Session>);

impl<S, A> FromRequestParts<AppState<S, A>> for MaybeSession
where
  S: Send + Sync,
  A: Send + Sync,
{
  type Rejection = std::convert::Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, A>,
  ) -> Result<Self, Self::Rejection> {
    Ok(Self(
      bearer_token(&parts.headers).and_then(|t| state.sessions.resolve(t)),
    ))
  }
}
