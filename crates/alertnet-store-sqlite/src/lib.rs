//! SQLite backend for the AlertNet document store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Live queries are driven by an
//! in-process change feed: every committed write announces its collection and
//! each subscription re-runs its query in response.

mod clock;
mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod sync_tests;
