//! HTTP client for a Gemini-style `generateContent` endpoint, implementing
//! [`alertnet_core::advisory::AdvisoryService`].
//!
//! Every call is a single request with a bounded timeout. The model is asked
//! to answer in JSON; the reply is unwrapped from any markdown fence and
//! decoded into the core advisory types. Any failure along the way surfaces
//! as [`alertnet_core::AdvisoryError::Unavailable`].

mod client;
mod config;
mod error;
mod parse;
mod prompt;

pub use client::GeminiClient;
pub use config::AdvisoryConfig;
pub use error::ClientError;
