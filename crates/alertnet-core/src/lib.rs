//! Core types and the status/alert synchronization model for AlertNet.
//!
//! This crate is free of HTTP and database dependencies. The
//! document store and the advisory-text generator are expressed as traits;
//! concrete backends live in their own crates.

pub mod advisory;
pub mod alert;
pub mod broadcast;
pub mod document;
pub mod error;
pub mod feed;
pub mod report;
pub mod session;
pub mod status;
pub mod store;
pub mod user;

#[cfg(test)]
mod test_support;

pub use error::{
  AdvisoryError, BroadcastError, DecodeError, FeedError, ReportError,
  UpdateError, ValidationError,
};
