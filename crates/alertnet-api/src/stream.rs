//! Server-sent event rendering of a [`ProjectedView`].
//!
//! Each `Ready` state becomes one `snapshot` event carrying the full JSON
//! array. An `Error` state becomes one `error` event and ends the stream.

use std::convert::Infallible;

use alertnet_core::feed::{FeedState, ProjectedView};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, stream};
use serde::Serialize;

use crate::error::ApiError;

/// Wait for the view's first `Ready` state and return its items. The view
/// (and its subscription) is released on return.
pub async fn snapshot<T: Clone>(mut view: ProjectedView<T>) -> Result<Vec<T>, ApiError> {
  Ok(view.ready().await?)
}

pub fn sse<T>(view: ProjectedView<T>) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
  T: Serialize + Clone + Send + Sync + 'static,
{
  let events = stream::unfold(Some(view), |view| async move {
    let mut view = view?;
    loop {
      match view.changed().await? {
        FeedState::Loading => continue,
        FeedState::Ready(items) => {
          return Some(match Event::default().event("snapshot").json_data(&items) {
            Ok(event) => (Ok(event), Some(view)),
            Err(e) => (Ok(error_event(&e.to_string())), None),
          });
        }
        FeedState::Error(e) => {
          tracing::warn!(error = %e, "closing event stream");
          return Some((Ok(error_event(&e.to_string())), None));
        }
      }
    }
  });
  Sse::new(events).keep_alive(KeepAlive::default())
}

fn error_event(message: &str) -> Event { Event::default().event("error").data(message) }
