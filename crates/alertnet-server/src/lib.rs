//! Process wiring for the AlertNet server: configuration and the outer
//! router that mounts the API.

use std::{path::PathBuf, time::Duration};

use alertnet_advisory::AdvisoryConfig;
use alertnet_api::AdminAccount;
use axum::{Router, routing::get};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_session_ttl_hours() -> u64 { 72 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/alertnet/alertnet.db") }

/// Runtime server configuration, deserialised from `config.toml` and
/// `ALERTNET_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:              String,
  #[serde(default = "default_port")]
  pub port:              u16,
  #[serde(default = "default_store_path")]
  pub store_path:        PathBuf,
  /// Operator accounts. Citizens register themselves through `/api/signup`.
  #[serde(default)]
  pub admins:            Vec<AdminAccount>,
  #[serde(default)]
  pub advisory:          AdvisoryConfig,
  /// Hours a session stays valid after login; `0` keeps it until logout.
  #[serde(default = "default_session_ttl_hours")]
  pub session_ttl_hours: u64,
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn session_ttl(&self) -> Option<Duration> {
    (self.session_ttl_hours > 0).then(|| Duration::from_secs(self.session_ttl_hours * 3600))
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Mount `api` under `/api`, add `/healthz` and request tracing.
pub fn router(api: Router) -> Router {
  Router::new()
    .route("/healthz", get(healthz))
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str { "ok" }
