//! JSON + SSE API for AlertNet.
//!
//! Exposes an axum [`Router`] backed by any
//! [`alertnet_core::store::DocumentStore`] and
//! [`alertnet_core::advisory::AdvisoryService`]. Callers authenticate with a
//! bearer token obtained from `/signup` or `/login`. TLS and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", alertnet_api::api_router(state))
//! ```

pub mod alerts;
pub mod auth;
pub mod error;
pub mod guidance;
pub mod reports;
pub mod session;
pub mod status;
pub mod stream;

use std::sync::Arc;

use alertnet_core::{
  advisory::AdvisoryService, broadcast::AlertBroadcaster, report::ReportIntake,
  status::StatusSynchronizer, store::DocumentStore,
};
use axum::{
  Router,
  routing::{get, post},
};

pub use auth::{AdminAccount, AdminDirectory};
pub use error::ApiError;
pub use session::SessionRegistry;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S, A> {
  pub store:    Arc<S>,
  pub advisory: Arc<A>,
  pub sessions: Arc<SessionRegistry>,
  pub admins:   Arc<AdminDirectory>,
}

impl<S, A> Clone for AppState<S, A> {
  fn clone(&self) -> Self {
    Self {
      store:    self.store.clone(),
      advisory: self.advisory.clone(),
      sessions: self.sessions.clone(),
      admins:   self.admins.clone(),
    }
  }
}

impl<S, A> AppState<S, A>
where
  S: DocumentStore + 'static,
  A: AdvisoryService,
{
  pub fn new(store: Arc<S>, advisory: Arc<A>, admins: AdminDirectory) -> Self {
    Self {
      store,
      advisory,
      sessions: Arc::new(SessionRegistry::new()),
      admins: Arc::new(admins),
    }
  }

  /// Expire sessions `ttl` after login instead of only at logout.
  pub fn with_session_ttl(mut self, ttl: std::time::Duration) -> Self {
    self.sessions = Arc::new(SessionRegistry::with_ttl(ttl));
    self
  }

  fn status(&self) -> StatusSynchronizer<S> { StatusSynchronizer::new(self.store.clone()) }

  fn alerts(&self) -> AlertBroadcaster<S, A> {
    AlertBroadcaster::new(self.store.clone(), self.advisory.clone())
  }

  fn reports(&self) -> ReportIntake<S> { ReportIntake::new(self.store.clone()) }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, A>(state: AppState<S, A>) -> Router<()>
where
  S: DocumentStore + 'static,
  A: AdvisoryService + 'static,
{
  Router::new()
    // Accounts
    .route("/signup", post(auth::signup::<S, A>))
    .route("/login", post(auth::login::<S, A>))
    .route("/logout", post(auth::logout::<S, A>))
    .route("/me", get(auth::me::<S, A>))
    // Status
    .route("/status", post(status::set_own::<S, A>))
    .route("/users", get(status::roster::<S, A>))
    .route("/users/stream", get(status::roster_stream::<S, A>))
    .route("/users/summary", get(status::summary::<S, A>))
    .route("/users/{key}/mark-safe", post(status::mark_safe::<S, A>))
    .route("/sos", get(status::emergencies::<S, A>))
    .route("/sos/stream", get(status::emergencies_stream::<S, A>))
    // Alerts
    .route("/alerts", get(alerts::list::<S, A>).post(alerts::create::<S, A>))
    .route("/alerts/stream", get(alerts::list_stream::<S, A>))
    .route("/alerts/suggest", post(alerts::suggest::<S, A>))
    // Reports
    .route("/reports", get(reports::list::<S, A>).post(reports::create::<S, A>))
    .route("/reports/stream", get(reports::list_stream::<S, A>))
    // Guidance
    .route("/guidance/safe-path", post(guidance::safe_path::<S, A>))
    .route("/guidance/risk", post(guidance::risk::<S, A>))
    .with_state(state)
}
