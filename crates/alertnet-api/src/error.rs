//! API error type and [`axum::response::IntoResponse`] implementation.

use alertnet_core::{
  AdvisoryError, BroadcastError, FeedError, ReportError, UpdateError,
  ValidationError, error::BoxError,
};
use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("authentication required")]
  Unauthenticated,

  #[error("invalid email or password")]
  InvalidCredentials,

  #[error("operation not permitted for this account")]
  Forbidden,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("invalid {0}")]
  Validation(#[from] ValidationError),

  #[error("{0}")]
  AdvisoryUnavailable(String),

  #[error("live feed error: {0}")]
  Feed(#[from] FeedError),

  #[error("store error: {0}")]
  Store(#[source] BoxError),

  #[error("internal error: {0}")]
  Internal(String),
}

impl ApiError {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }

  fn status(&self) -> StatusCode {
    match self {
      Self::Unauthenticated | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
      Self::Forbidden => StatusCode::FORBIDDEN,
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::Conflict(_) => StatusCode::CONFLICT,
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
      Self::AdvisoryUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
      Self::Feed(_) | Self::Store(_) | Self::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = self.to_string();
    if status.is_server_error() {
      tracing::error!(%status, error = %message, "request failed");
    } else {
      tracing::debug!(%status, error = %message, "request rejected");
    }
    (status, Json(json!({ "error": message }))).into_response()
  }
}

// ─── Component errors ────────────────────────────────────────────────────────

impl From<UpdateError> for ApiError {
  fn from(e: UpdateError) -> Self {
    match e {
      UpdateError::Unauthenticated => Self::Unauthenticated,
      UpdateError::Forbidden => Self::Forbidden,
      UpdateError::UnknownUser(key) => Self::NotFound(format!("user {key}")),
      e @ UpdateError::Conflict { .. } => Self::Conflict(e.to_string()),
      UpdateError::WriteFailed(e) => Self::Store(e),
    }
  }
}

impl From<BroadcastError> for ApiError {
  fn from(e: BroadcastError) -> Self {
    match e {
      BroadcastError::Forbidden => Self::Forbidden,
      BroadcastError::Validation(v) => Self::Validation(v),
      BroadcastError::WriteFailed(e) => Self::Store(e),
    }
  }
}

impl From<ReportError> for ApiError {
  fn from(e: ReportError) -> Self {
    match e {
      ReportError::Unauthenticated => Self::Unauthenticated,
      ReportError::Forbidden => Self::Forbidden,
      ReportError::UnknownUser(key) => Self::NotFound(format!("user {key}")),
      ReportError::Validation(v) => Self::Validation(v),
      ReportError::WriteFailed(e) => Self::Store(e),
    }
  }
}

impl From<AdvisoryError> for ApiError {
  fn from(e: AdvisoryError) -> Self {
    match e {
      AdvisoryError::Forbidden => Self::Forbidden,
      e @ AdvisoryError::Unavailable(_) => Self::AdvisoryUnavailable(e.to_string()),
    }
  }
}
