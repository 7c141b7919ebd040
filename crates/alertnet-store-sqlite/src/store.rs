//! [`SqliteStore`], the SQLite implementation of [`DocumentStore`].

use std::{path::Path, sync::Arc};

use alertnet_core::{
  document::{Document, Fields},
  store::{
    Collection, CreateOutcome, Direction, DocumentStore, DocumentWrite, Query,
    Snapshot, Subscription, UpdateOutcome,
  },
};
use rusqlite::OptionalExtension as _;
use tokio::sync::{broadcast, mpsc};

use crate::{
  Error, Result,
  clock::MonotonicClock,
  encode::{
    RawDocument, apply_write, decode_body, decode_dt, encode_body, encode_dt,
    json_path, new_doc_id, sql_value,
  },
  schema::SCHEMA,
};

/// Capacity of the in-process change feed. A subscriber that falls further
/// behind than this simply re-queries.
const CHANGE_FEED_CAPACITY: usize = 256;

/// Snapshots buffered per subscription before the feeding task waits.
const SNAPSHOT_BUFFER: usize = 4;

fn other(e: impl std::error::Error + Send + Sync + 'static) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(e))
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// An AlertNet document store backed by a single SQLite file.
///
/// Cloning is cheap; clones share the connection, the clock and the change
/// feed.
#[derive(Clone)]
pub struct SqliteStore {
  conn:    tokio_rusqlite::Connection,
  clock:   Arc<MonotonicClock>,
  changes: broadcast::Sender<Collection>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store, mainly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let latest: Option<String> = conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(conn.query_row("SELECT MAX(updated_at) FROM documents", [], |r| r.get(0))?)
      })
      .await?;
    let floor = latest.as_deref().map(decode_dt).transpose()?;

    let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
    Ok(Self {
      conn,
      clock: Arc::new(MonotonicClock::starting_after(floor)),
      changes,
    })
  }

  /// Number of live subscriptions currently attached to this store.
  pub fn live_subscriptions(&self) -> usize { self.changes.receiver_count() }

  fn announce(&self, collection: Collection) {
    // No receivers is not an error: nobody is watching.
    let _ = self.changes.send(collection);
  }
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteStore {
  type Error = Error;

  async fn create(
    &self,
    collection: Collection,
    id: Option<String>,
    write: DocumentWrite,
  ) -> Result<CreateOutcome> {
    let doc_id = id.unwrap_or_else(new_doc_id);
    let clock = self.clock.clone();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let exists = tx
          .query_row(
            "SELECT 1 FROM documents WHERE collection = ?1 AND doc_id = ?2",
            rusqlite::params![collection.as_str(), doc_id],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if exists {
          return Ok(CreateOutcome::AlreadyExists);
        }

        // Stamped inside the connection thread so stamp order is commit order.
        let now = clock.now();
        let mut fields = Fields::new();
        apply_write(&mut fields, write, now);
        let body = encode_body(&fields).map_err(other)?;
        let at = encode_dt(now);

        tx.execute(
          "INSERT INTO documents (collection, doc_id, version, body, created_at, updated_at)
           VALUES (?1, ?2, 1, ?3, ?4, ?4)",
          rusqlite::params![collection.as_str(), doc_id, body, at],
        )?;
        tx.commit()?;

        Ok(CreateOutcome::Created(Document { id: doc_id, version: 1, fields }))
      })
      .await?;

    if let CreateOutcome::Created(doc) = &outcome {
      tracing::debug!(%collection, id = %doc.id, "document created");
      self.announce(collection);
    }
    Ok(outcome)
  }

  async fn update(
    &self,
    collection: Collection,
    id: String,
    write: DocumentWrite,
    expected_version: Option<u64>,
  ) -> Result<UpdateOutcome> {
    let clock = self.clock.clone();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let current: Option<(i64, String)> = tx
          .query_row(
            "SELECT version, body FROM documents WHERE collection = ?1 AND doc_id = ?2",
            rusqlite::params![collection.as_str(), id],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?;

        let Some((version, body)) = current else {
          return Ok(UpdateOutcome::Missing);
        };
        let version = u64::try_from(version).unwrap_or_default();
        if expected_version.is_some_and(|expected| expected != version) {
          return Ok(UpdateOutcome::VersionMismatch { current: version });
        }

        let mut fields = match decode_body(&body).map_err(other)? {
          serde_json::Value::Object(fields) => fields,
          _ => {
            return Err(other(Error::CorruptDocument {
              collection,
              id: id.clone(),
            }));
          }
        };

        let now = clock.now();
        apply_write(&mut fields, write, now);
        let body = encode_body(&fields).map_err(other)?;
        let next = version + 1;

        tx.execute(
          "UPDATE documents SET version = ?3, body = ?4, updated_at = ?5
           WHERE collection = ?1 AND doc_id = ?2",
          rusqlite::params![collection.as_str(), id, next as i64, body, encode_dt(now)],
        )?;
        tx.commit()?;

        Ok(UpdateOutcome::Applied(Document { id, version: next, fields }))
      })
      .await?;

    if let UpdateOutcome::Applied(doc) = &outcome {
      tracing::debug!(%collection, id = %doc.id, version = doc.version, "document updated");
      self.announce(collection);
    }
    Ok(outcome)
  }

  async fn get(&self, collection: Collection, id: String) -> Result<Option<Document>> {
    let raw: Option<RawDocument> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT doc_id, version, body FROM documents
               WHERE collection = ?1 AND doc_id = ?2",
              rusqlite::params![collection.as_str(), id],
              |row| {
                Ok(RawDocument {
                  doc_id:  row.get(0)?,
                  version: row.get(1)?,
                  body:    row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(|r| r.into_document(collection)).transpose()
  }

  async fn query<'a>(&'a self, query: &'a Query) -> Result<Snapshot> {
    let collection = query.collection;
    let filter_path = query.filter.as_ref().map(|f| json_path(&f.field));
    let filter_value = query
      .filter
      .as_ref()
      .map_or(rusqlite::types::Value::Null, |f| sql_value(&f.value));
    let order_path = query.order_by.as_ref().map(|o| json_path(&o.field));
    let direction = match query.order_by.as_ref().map(|o| o.direction) {
      Some(Direction::Descending) => "DESC",
      _ => "ASC",
    };

    let raws: Vec<RawDocument> = self
      .conn
      .call(move |conn| {
        // Without a filter `?2` is NULL and the second condition is vacuous.
        // Without an order `?4` is NULL, every key ties and rowid decides.
        let sql = format!(
          "SELECT doc_id, version, body FROM documents
           WHERE collection = ?1
             AND (?2 IS NULL OR json_extract(body, ?2) IS ?3)
           ORDER BY json_extract(body, ?4) {direction}, rowid {direction}"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              collection.as_str(),
              filter_path.as_deref(),
              filter_value,
              order_path.as_deref(),
            ],
            |row| {
              Ok(RawDocument {
                doc_id:  row.get(0)?,
                version: row.get(1)?,
                body:    row.get(2)?,
              })
            },
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(|r| r.into_document(collection)).collect()
  }

  async fn subscribe(&self, query: Query) -> Result<Subscription<Error>> {
    let (tx, rx) = mpsc::channel(SNAPSHOT_BUFFER);
    // Attach to the change feed before the first read so no write between
    // that read and the first wait can be missed.
    let mut changes = self.changes.subscribe();
    let store = self.clone();
    let collection = query.collection;

    let task = tokio::spawn(async move {
      loop {
        let snapshot = store.query(&query).await;
        let failed = snapshot.is_err();
        if tx.send(snapshot).await.is_err() || failed {
          return;
        }
        if !wait_for_change(&mut changes, collection).await {
          tracing::debug!(%collection, "change feed closed");
          return;
        }
      }
    });

    tracing::debug!(%collection, "subscription started");
    Ok(Subscription::new(rx, task.abort_handle()))
  }
}

/// Block until `collection` changes. Pending notifications are drained so a
/// burst of writes costs one re-query. Returns `false` once the feed closes.
async fn wait_for_change(
  changes: &mut broadcast::Receiver<Collection>,
  collection: Collection,
) -> bool {
  use broadcast::error::{RecvError, TryRecvError};

  loop {
    match changes.recv().await {
      Ok(changed) if changed == collection => break,
      Ok(_) => continue,
      Err(RecvError::Lagged(missed)) => {
        tracing::debug!(%collection, missed, "change feed lagged; re-querying");
        break;
      }
      Err(RecvError::Closed) => return false,
    }
  }

  loop {
    match changes.try_recv() {
      Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
      Err(TryRecvError::Empty) => return true,
      Err(TryRecvError::Closed) => return false,
    }
  }
}
