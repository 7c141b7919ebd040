//! Prompt text for each advisory request. Every prompt pins the exact JSON
//! shape that `parse` expects back.

use alertnet_core::{advisory::SafePathRequest, alert::Severity};

pub fn alert_suggestion(disaster_type: &str, severity: Severity) -> String {
  format!(
    "You write public emergency alerts for a disaster-response service.\n\
     Draft an alert for a {disaster_type} with {severity} severity.\n\
     The title must be short (under 60 characters) and at least 5 characters.\n\
     The message must be at least 20 characters, plain language, and tell\n\
     residents what to do right now.\n\
     Respond with only a JSON object: {{\"title\": string, \"message\": string}}"
  )
}

pub fn safe_path(request: &SafePathRequest) -> String {
  let c = request.coordinates;
  format!(
    "A person at latitude {lat:.4}, longitude {lng:.4} (reported as \
     \"{raw}\") needs to move away from a {disaster} of {severity} severity.\n\
     Suggest the nearest plausible safe destination and a route to it.\n\
     Respond with only a JSON object: {{\"destination\": string, \
     \"safePath\": string, \"estimatedTime\": string, \"riskLevel\": string, \
     \"destinationCoords\": {{\"lat\": number, \"lng\": number}} or null}}",
    lat = c.lat,
    lng = c.lng,
    raw = request.current_location,
    disaster = request.disaster_type,
    severity = request.severity,
  )
}

pub fn risk_assessment(description: &str) -> String {
  format!(
    "Assess the danger in this situation report from a member of the public:\n\
     \"\"\"\n{description}\n\"\"\"\n\
     Classify the risk as one of Low, Moderate, High, Critical, summarise the\n\
     situation in one sentence and give up to five short safety instructions.\n\
     Respond with only a JSON object: {{\"riskLevel\": string, \
     \"summary\": string, \"guidance\": [string]}}"
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn suggestion_prompt_names_inputs() {
    let p = alert_suggestion("Wildfire", Severity::High);
    assert!(p.contains("Wildfire"));
    assert!(p.contains("High severity"));
  }

  #[test]
  fn safe_path_prompt_uses_parsed_coordinates() {
    let req = SafePathRequest::new("12.97° N, 77.59° W", "Flood", Severity::Moderate)
      .unwrap();
    let p = safe_path(&req);
    assert!(p.contains("latitude 12.9700"));
    assert!(p.contains("longitude -77.5900"));
  }
}
