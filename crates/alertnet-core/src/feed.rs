//! Live feed projector: a typed, self-refreshing read model over a query.
//!
//! A [`ProjectedView`] starts in [`FeedState::Loading`], moves to
//! [`FeedState::Ready`] on the first snapshot and replaces its items wholesale
//! on every later one. Any failure (subscription setup, a subscription error,
//! the store closing the feed, or a document that does not decode) moves it
//! to [`FeedState::Error`], which is terminal.
//!
//! Client-side ordering is an explicit post-processing step
//! ([`FeedSpec::arranged`]) run on every snapshot; the store's order is only
//! trusted when the query carries an `order_by`.

use std::sync::Arc;

use tokio::{sync::watch, task::JoinHandle};

use crate::{
  FeedError,
  document::{Document, FromDocument},
  store::{DocumentStore, Query},
};

/// Post-processing applied to every decoded snapshot.
pub type Arrange<T> = fn(&mut Vec<T>);

#[derive(Debug, Clone, PartialEq)]
pub enum FeedState<T> {
  Loading,
  Ready(Vec<T>),
  Error(FeedError),
}

impl<T> FeedState<T> {
  pub fn is_terminal(&self) -> bool { matches!(self, Self::Error(_)) }
}

/// What to project: the query plus optional client-side arrangement.
pub struct FeedSpec<T> {
  pub query:   Query,
  pub arrange: Option<Arrange<T>>,
}

impl<T: FromDocument> FeedSpec<T> {
  pub fn new(query: Query) -> Self {
    debug_assert_eq!(query.collection, T::COLLECTION);
    Self { query, arrange: None }
  }

  pub fn arranged(mut self, arrange: Arrange<T>) -> Self {
    self.arrange = Some(arrange);
    self
  }
}

/// A live, typed view of a query. Dropping it releases the subscription.
pub struct ProjectedView<T> {
  state: watch::Receiver<FeedState<T>>,
  task:  JoinHandle<()>,
}

impl<T: Clone> ProjectedView<T> {
  /// The most recent state, without marking it as seen.
  pub fn current(&self) -> FeedState<T> { self.state.borrow().clone() }

  /// Wait for a state not yet observed through this method. Returns `None`
  /// once the projection has finished and every state has been seen.
  pub async fn changed(&mut self) -> Option<FeedState<T>> {
    self.state.changed().await.ok()?;
    Some(self.state.borrow_and_update().clone())
  }

  /// Wait for the first `Ready` state and return its items.
  pub async fn ready(&mut self) -> Result<Vec<T>, FeedError> {
    loop {
      let current = self.state.borrow_and_update().clone();
      match current {
        FeedState::Ready(items) => return Ok(items),
        FeedState::Error(e) => return Err(e),
        FeedState::Loading => {
          if self.state.changed().await.is_err() {
            return Err(FeedError::SubscriptionFailed(
              "projection ended before the first snapshot".into(),
            ));
          }
        }
      }
    }
  }

  pub fn is_finished(&self) -> bool { self.task.is_finished() }

  pub fn close(self) {}
}

impl<T> Drop for ProjectedView<T> {
  fn drop(&mut self) { self.task.abort(); }
}

/// Subscribe to `spec.query` on `store` and keep a typed view of it.
///
/// Must be called from within a tokio runtime.
pub fn project<S, T>(store: Arc<S>, spec: FeedSpec<T>) -> ProjectedView<T>
where
  S: DocumentStore + 'static,
  T: FromDocument + Clone + Send + Sync + 'static,
{
  let (tx, rx) = watch::channel(FeedState::Loading);
  let task = tokio::spawn(run_projection(store, spec, tx));
  ProjectedView { state: rx, task }
}

async fn run_projection<S, T>(
  store: Arc<S>,
  spec: FeedSpec<T>,
  tx: watch::Sender<FeedState<T>>,
) where
  S: DocumentStore + 'static,
  T: FromDocument + Clone + Send + Sync + 'static,
{
  let FeedSpec { query, arrange } = spec;
  let collection = query.collection;

  let mut subscription = match store.subscribe(query).await {
    Ok(subscription) => subscription,
    Err(e) => {
      tracing::warn!(%collection, error = %e, "subscription setup failed");
      tx.send_replace(FeedState::Error(FeedError::SubscriptionFailed(
        e.to_string(),
      )));
      return;
    }
  };

  while let Some(snapshot) = subscription.next_snapshot().await {
    let next = match snapshot {
      Ok(docs) => match decode_snapshot::<T>(docs) {
        Ok(mut items) => {
          if let Some(arrange) = arrange {
            arrange(&mut items);
          }
          FeedState::Ready(items)
        }
        Err(e) => FeedState::Error(e),
      },
      Err(e) => FeedState::Error(FeedError::SubscriptionFailed(e.to_string())),
    };

    if let FeedState::Error(e) = &next {
      tracing::warn!(%collection, error = %e, "live feed failed");
    }
    let terminal = next.is_terminal();
    if tx.send(next).is_err() || terminal {
      return;
    }
  }

  tx.send_replace(FeedState::Error(FeedError::SubscriptionFailed(
    "subscription closed by the store".into(),
  )));
}

fn decode_snapshot<T: FromDocument>(
  docs: Vec<Document>,
) -> Result<Vec<T>, FeedError> {
  docs
    .into_iter()
    .map(|doc| {
      T::from_document(doc).map_err(|e| FeedError::Decode {
        collection: T::COLLECTION,
        id:         e.id,
        reason:     e.reason,
      })
    })
    .collect()
}
