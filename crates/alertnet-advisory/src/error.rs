use alertnet_core::AdvisoryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("no API key configured")]
  NotConfigured,

  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("service answered {status}: {body}")]
  Status { status: u16, body: String },

  #[error("response contained no text")]
  EmptyResponse,

  #[error("could not decode model output: {0}")]
  Malformed(#[from] serde_json::Error),

  #[error("unrecognised risk level {0:?}")]
  UnknownRiskLevel(String),
}

impl From<ClientError> for AdvisoryError {
  fn from(e: ClientError) -> Self { AdvisoryError::Unavailable(e.to_string()) }
}
