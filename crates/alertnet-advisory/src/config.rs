use std::time::Duration;

use serde::Deserialize;

fn default_endpoint() -> String {
  "https://generativelanguage.googleapis.com/v1beta".to_owned()
}

fn default_model() -> String { "gemini-1.5-flash".to_owned() }

fn default_timeout_secs() -> u64 { 20 }

/// Connection settings for the advisory service.
///
/// Without an `api_key` the client still constructs, but every call fails as
/// unavailable.
#[derive(Debug, Clone, Deserialize)]
pub struct AdvisoryConfig {
  #[serde(default = "default_endpoint")]
  pub endpoint:     String,
  #[serde(default)]
  pub api_key:      Option<String>,
  #[serde(default = "default_model")]
  pub model:        String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for AdvisoryConfig {
  fn default() -> Self {
    Self {
      endpoint:     default_endpoint(),
      api_key:      None,
      model:        default_model(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

impl AdvisoryConfig {
  pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }

  pub(crate) fn generate_url(&self) -> String {
    format!(
      "{}/models/{}:generateContent",
      self.endpoint.trim_end_matches('/'),
      self.model
    )
  }
}
