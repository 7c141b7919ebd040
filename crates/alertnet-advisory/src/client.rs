//! [`GeminiClient`], the reqwest-backed [`AdvisoryService`].

use alertnet_core::{
  AdvisoryError,
  advisory::{
    AdvisoryService, AlertSuggestion, RiskAssessment, SafePathGuidance,
    SafePathRequest,
  },
  alert::Severity,
};
use serde_json::{Value, json};

use crate::{AdvisoryConfig, ClientError, parse, prompt};

pub struct GeminiClient {
  http:   reqwest::Client,
  config: AdvisoryConfig,
}

impl GeminiClient {
  pub fn new(config: AdvisoryConfig) -> Result<Self, ClientError> {
    let http = reqwest::Client::builder().timeout(config.timeout()).build()?;
    if config.api_key.is_none() {
      tracing::warn!("no advisory API key configured; suggestions are disabled");
    }
    Ok(Self { http, config })
  }

  /// Send one prompt and return the model's text reply.
  async fn generate(&self, prompt: String) -> Result<String, ClientError> {
    let api_key = self.config.api_key.as_deref().ok_or(ClientError::NotConfigured)?;

    let body = json!({
      "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
      "generationConfig": { "responseMimeType": "application/json" },
    });

    let res = self
      .http
      .post(self.config.generate_url())
      .header("x-goog-api-key", api_key)
      .json(&body)
      .send()
      .await?;

    let status = res.status();
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      return Err(ClientError::Status { status: status.as_u16(), body });
    }

    let json: Value = res.json().await?;
    Ok(parse::response_text(&json)?.to_owned())
  }
}

fn unavailable(operation: &'static str) -> impl FnOnce(ClientError) -> AdvisoryError {
  move |e| {
    tracing::warn!(operation, error = %e, "advisory request failed");
    e.into()
  }
}

impl AdvisoryService for GeminiClient {
  async fn generate_suggestion(
    &self,
    disaster_type: String,
    severity: Severity,
  ) -> Result<AlertSuggestion, AdvisoryError> {
    let text = self
      .generate(prompt::alert_suggestion(&disaster_type, severity))
      .await
      .map_err(unavailable("suggestion"))?;
    parse::suggestion(&text).map_err(unavailable("suggestion"))
  }

  async fn safe_path(
    &self,
    request: SafePathRequest,
  ) -> Result<SafePathGuidance, AdvisoryError> {
    let text = self
      .generate(prompt::safe_path(&request))
      .await
      .map_err(unavailable("safe_path"))?;
    parse::safe_path(&text).map_err(unavailable("safe_path"))
  }

  async fn assess_risk(
    &self,
    description: String,
  ) -> Result<RiskAssessment, AdvisoryError> {
    let text = self
      .generate(prompt::risk_assessment(&description))
      .await
      .map_err(unavailable("risk"))?;
    parse::risk(&text).map_err(unavailable("risk"))
  }
}
