//! The `DocumentStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `alertnet-store-sqlite`). The synchronization components depend on this
//! abstraction, not on any concrete backend.

use std::{fmt, future::Future};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{sync::mpsc, task::AbortHandle};

use crate::document::{Document, Fields};

// ─── Collections ─────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
  Users,
  Alerts,
  Reports,
  /// Password hashes keyed by email. Never subscribed to by clients.
  Credentials,
}

impl Collection {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Users => "users",
      Self::Alerts => "alerts",
      Self::Reports => "reports",
      Self::Credentials => "credentials",
    }
  }
}

impl fmt::Display for Collection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// A set of top-level field assignments applied by a create or update.
///
/// Fields named in `server_timestamps` are filled in by the store at the
/// moment the write is applied; callers never supply those values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentWrite {
  pub fields:            Fields,
  pub server_timestamps: Vec<String>,
}

impl DocumentWrite {
  pub fn new() -> Self { Self::default() }

  pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
    self.fields.insert(field.to_owned(), value.into());
    self
  }

  pub fn server_timestamp(mut self, field: &str) -> Self {
    self.server_timestamps.push(field.to_owned());
    self
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
  Created(Document),
  /// A document with the requested id already exists; nothing was written.
  AlreadyExists,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
  Applied(Document),
  /// No document with that id; updates never create.
  Missing,
  /// `expected_version` was supplied and did not match; nothing was written.
  VersionMismatch { current: u64 },
}

// ─── Queries ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  Ascending,
  Descending,
}

/// Equality filter on a single top-level field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
  pub field: String,
  pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
  pub field:     String,
  pub direction: Direction,
}

/// A query over one collection with an optional equality filter and an
/// optional server-side order.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
  pub collection: Collection,
  pub filter:     Option<FieldFilter>,
  pub order_by:   Option<OrderBy>,
}

impl Query {
  pub fn collection(collection: Collection) -> Self {
    Self { collection, filter: None, order_by: None }
  }

  pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
    self.filter = Some(FieldFilter {
      field: field.to_owned(),
      value: value.into(),
    });
    self
  }

  pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
    self.order_by = Some(OrderBy { field: field.to_owned(), direction });
    self
  }
}

// ─── Subscriptions ───────────────────────────────────────────────────────────

/// The full result set of a query at one point in time.
pub type Snapshot = Vec<Document>;

/// A live query. Each item is the complete, refreshed result set.
///
/// Dropping the subscription cancels the backend task that feeds it.
pub struct Subscription<E> {
  snapshots: mpsc::Receiver<Result<Snapshot, E>>,
  task:      AbortHandle,
}

impl<E> Subscription<E> {
  pub fn new(
    snapshots: mpsc::Receiver<Result<Snapshot, E>>,
    task: AbortHandle,
  ) -> Self {
    Self { snapshots, task }
  }

  /// Wait for the next snapshot. `None` once the backend has stopped.
  pub async fn next_snapshot(&mut self) -> Option<Result<Snapshot, E>> {
    self.snapshots.recv().await
  }

  pub fn is_active(&self) -> bool { !self.task.is_finished() }

  pub fn unsubscribe(self) {}
}

impl<E> Drop for Subscription<E> {
  fn drop(&mut self) { self.task.abort(); }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a real-time document store.
///
/// Every write touches exactly one document. There is no multi-document
/// transaction anywhere in the API.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait DocumentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Create a document. A generated UUID is used when `id` is `None`.
  fn create(
    &self,
    collection: Collection,
    id: Option<String>,
    write: DocumentWrite,
  ) -> impl Future<Output = Result<CreateOutcome, Self::Error>> + Send + '_;

  /// Merge `write` into an existing document.
  ///
  /// When `expected_version` is set the write only applies if the stored
  /// version matches; otherwise the update is last-write-wins.
  fn update(
    &self,
    collection: Collection,
    id: String,
    write: DocumentWrite,
    expected_version: Option<u64>,
  ) -> impl Future<Output = Result<UpdateOutcome, Self::Error>> + Send + '_;

  /// Fetch one document by id. Returns `None` if not found.
  fn get(
    &self,
    collection: Collection,
    id: String,
  ) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send + '_;

  /// Run a query once.
  fn query<'a>(
    &'a self,
    query: &'a Query,
  ) -> impl Future<Output = Result<Snapshot, Self::Error>> + Send + 'a;

  /// Start a live query. The first snapshot is delivered as soon as it is
  /// available; a fresh one follows every change to the collection.
  fn subscribe(
    &self,
    query: Query,
  ) -> impl Future<Output = Result<Subscription<Self::Error>, Self::Error>>
  + Send
  + '_;
}
