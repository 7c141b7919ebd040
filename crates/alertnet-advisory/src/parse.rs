//! Decoding of `generateContent` responses.

use alertnet_core::advisory::{
  AlertSuggestion, Coordinates, RiskAssessment, RiskLevel, SafePathGuidance,
};
use serde::Deserialize;
use serde_json::Value;

use crate::ClientError;

/// The first candidate's first text part.
pub fn response_text(response: &Value) -> Result<&str, ClientError> {
  response["candidates"][0]["content"]["parts"][0]["text"]
    .as_str()
    .filter(|t| !t.trim().is_empty())
    .ok_or(ClientError::EmptyResponse)
}

/// Remove a surrounding markdown code fence, with or without a language tag.
pub fn strip_fences(text: &str) -> &str {
  let text = text.trim();
  let Some(inner) = text.strip_prefix("```") else {
    return text;
  };
  let inner = inner.strip_prefix("json").unwrap_or(inner);
  inner.strip_suffix("```").unwrap_or(inner).trim()
}

// ─── Wire shapes ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct SuggestionWire {
  title:   String,
  message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SafePathWire {
  destination:        String,
  safe_path:          String,
  estimated_time:     String,
  risk_level:         String,
  #[serde(default)]
  destination_coords: Option<Coordinates>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RiskWire {
  risk_level: String,
  summary:    String,
  #[serde(default)]
  guidance:   Vec<String>,
}

pub fn suggestion(text: &str) -> Result<AlertSuggestion, ClientError> {
  let w: SuggestionWire = serde_json::from_str(strip_fences(text))?;
  Ok(AlertSuggestion { title: w.title.trim().to_owned(), message: w.message.trim().to_owned() })
}

pub fn safe_path(text: &str) -> Result<SafePathGuidance, ClientError> {
  let w: SafePathWire = serde_json::from_str(strip_fences(text))?;
  Ok(SafePathGuidance {
    destination:        w.destination,
    safe_path:          w.safe_path,
    estimated_time:     w.estimated_time,
    risk_level:         w.risk_level,
    destination_coords: w.destination_coords,
  })
}

pub fn risk(text: &str) -> Result<RiskAssessment, ClientError> {
  let w: RiskWire = serde_json::from_str(strip_fences(text))?;
  Ok(RiskAssessment {
    risk_level: risk_level(&w.risk_level)?,
    summary:    w.summary,
    guidance:   w.guidance,
  })
}

fn risk_level(s: &str) -> Result<RiskLevel, ClientError> {
  match s.trim().to_ascii_lowercase().as_str() {
    "low" => Ok(RiskLevel::Low),
    "moderate" | "medium" => Ok(RiskLevel::Moderate),
    "high" => Ok(RiskLevel::High),
    "critical" | "severe" | "extreme" => Ok(RiskLevel::Critical),
    _ => Err(ClientError::UnknownRiskLevel(s.to_owned())),
  }
}
