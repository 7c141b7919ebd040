//! Advisory-text generation.
//!
//! [`AdvisoryService`] is an opaque request/response collaborator: one call,
//! one answer, no retry and no caching. Whatever it returns is a suggestion
//! for a human to review; nothing here writes to the store.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{AdvisoryError, ValidationError, alert::Severity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSuggestion {
  pub title:   String,
  pub message: String,
}

// ─── Safe path ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
  pub lat: f64,
  pub lng: f64,
}

/// A validated request for evacuation guidance.
#[derive(Debug, Clone, PartialEq)]
pub struct SafePathRequest {
  /// The location as the caller wrote it.
  pub current_location: String,
  pub coordinates:      Coordinates,
  pub disaster_type:    String,
  pub severity:         Severity,
}

impl SafePathRequest {
  pub fn new(
    current_location: impl Into<String>,
    disaster_type: impl Into<String>,
    severity: Severity,
  ) -> Result<Self, ValidationError> {
    let current_location = current_location.into();
    let disaster_type = disaster_type.into();
    if disaster_type.trim().is_empty() {
      return Err(ValidationError::new(
        "disaster_type",
        "disaster type is required",
      ));
    }
    let coordinates = parse_coordinates(&current_location)?;
    Ok(Self { current_location, coordinates, disaster_type, severity })
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafePathGuidance {
  pub destination:        String,
  pub safe_path:          String,
  pub estimated_time:     String,
  pub risk_level:         String,
  pub destination_coords: Option<Coordinates>,
}

/// Parse `"12.9716° N, 77.5946° E"` style coordinates.
///
/// Hemisphere letters are optional; `S` and `W` negate. Plain signed decimals
/// (`"-33.86, 151.21"`) are accepted too.
pub fn parse_coordinates(input: &str) -> Result<Coordinates, ValidationError> {
  let invalid = || {
    ValidationError::new(
      "current_location",
      format!("expected coordinates like \"12.97° N, 77.59° E\", got {input:?}"),
    )
  };

  let (lat, lng) = input.split_once(',').ok_or_else(invalid)?;
  let lat = parse_axis(lat, 'N', 'S').ok_or_else(invalid)?;
  let lng = parse_axis(lng, 'E', 'W').ok_or_else(invalid)?;

  if !(-90.0..=90.0).contains(&lat) {
    return Err(ValidationError::new("current_location", "latitude out of range"));
  }
  if !(-180.0..=180.0).contains(&lng) {
    return Err(ValidationError::new(
      "current_location",
      "longitude out of range",
    ));
  }
  Ok(Coordinates { lat, lng })
}

fn parse_axis(part: &str, positive: char, negative: char) -> Option<f64> {
  let part = part.trim().replace('°', "");
  let part = part.trim();
  let (number, sign) = match part.chars().last()?.to_ascii_uppercase() {
    c if c == positive => (&part[..part.len() - 1], 1.0),
    c if c == negative => (&part[..part.len() - 1], -1.0),
    _ => (part, 1.0),
  };
  let value: f64 = number.trim().parse().ok()?;
  value.is_finite().then_some(value * sign)
}

// ─── Risk ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
  Low,
  Moderate,
  High,
  Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
  pub risk_level: RiskLevel,
  pub summary:    String,
  pub guidance:   Vec<String>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// A generative-text backend producing advisory copy.
pub trait AdvisoryService: Send + Sync {
  /// Draft an alert title and message for a disaster type and severity.
  fn generate_suggestion(
    &self,
    disaster_type: String,
    severity: Severity,
  ) -> impl Future<Output = Result<AlertSuggestion, AdvisoryError>> + Send + '_;

  /// Suggest a destination and route away from a disaster.
  fn safe_path(
    &self,
    request: SafePathRequest,
  ) -> impl Future<Output = Result<SafePathGuidance, AdvisoryError>> + Send + '_;

  /// Classify a free-text situation description.
  fn assess_risk(
    &self,
    description: String,
  ) -> impl Future<Output = Result<RiskAssessment, AdvisoryError>> + Send + '_;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_hemisphere_coordinates() {
    let c = parse_coordinates("12.9716° N, 77.5946° E").unwrap();
    assert!((c.lat - 12.9716).abs() < 1e-9);
    assert!((c.lng - 77.5946).abs() < 1e-9);

    let c = parse_coordinates("33.86° S, 70.1° W").unwrap();
    assert!(c.lat < 0.0 && c.lng < 0.0);
  }

  #[test]
  fn parses_signed_decimals() {
    let c = parse_coordinates("-33.86, 151.21").unwrap();
    assert!((c.lat + 33.86).abs() < 1e-9);
    assert!((c.lng - 151.21).abs() < 1e-9);
  }

  #[test]
  fn rejects_garbage_and_out_of_range() {
    assert!(parse_coordinates("downtown").is_err());
    assert!(parse_coordinates("12.9 N").is_err());
    assert!(parse_coordinates("91 N, 10 E").is_err());
    assert!(parse_coordinates("10 N, 181 E").is_err());
  }

  #[test]
  fn request_requires_disaster_type() {
    let err = SafePathRequest::new("1 N, 1 E", "  ", Severity::High).unwrap_err();
    assert_eq!(err.field, "disaster_type");
    let err = SafePathRequest::new("nowhere", "Flood", Severity::High).unwrap_err();
    assert_eq!(err.field, "current_location");
  }
}
