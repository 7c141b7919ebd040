//! Status synchronizer. Mediates every write to a user's `status` field and
//! provides the admin-side read models over `users`.

use std::{cmp::Ordering, sync::Arc};

use serde::Serialize;

use crate::{
  UpdateError,
  document::FromDocument,
  feed::{self, FeedSpec, ProjectedView},
  session::Session,
  store::{Collection, DocumentStore, DocumentWrite, Query, UpdateOutcome},
  user::{SAFE_LOCATION, SOS_LOCATION, Status, StatusTarget, User, UserKey},
};

pub struct StatusSynchronizer<S> {
  store: Arc<S>,
}

impl<S: DocumentStore + 'static> StatusSynchronizer<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Set the caller's own status.
  ///
  /// Without `expected_version` concurrent writers (the user and an admin)
  /// are last-write-wins; with it, a stale version fails with
  /// [`UpdateError::Conflict`] and nothing is written.
  pub async fn set_status(
    &self,
    session: Option<&Session>,
    target: StatusTarget,
    expected_version: Option<u64>,
  ) -> Result<User, UpdateError> {
    let session = session.ok_or(UpdateError::Unauthenticated)?;
    let user = self
      .write_status(&session.user_key, target, expected_version)
      .await?;
    match target {
      StatusTarget::Emergency => {
        tracing::warn!(user = %user.key, at = ?user.sos_timestamp, "SOS raised")
      }
      StatusTarget::Safe => tracing::info!(user = %user.key, "marked safe"),
    }
    Ok(user)
  }

  /// Mark another user safe. Admins cannot raise an SOS on anyone's behalf.
  pub async fn mark_safe_by_admin(
    &self,
    session: &Session,
    key: &UserKey,
    expected_version: Option<u64>,
  ) -> Result<User, UpdateError> {
    if !session.is_admin() {
      return Err(UpdateError::Forbidden);
    }
    let user = self
      .write_status(key, StatusTarget::Safe, expected_version)
      .await?;
    tracing::info!(user = %user.key, admin = %session.user_key, "marked safe by admin");
    Ok(user)
  }

  async fn write_status(
    &self,
    key: &UserKey,
    target: StatusTarget,
    expected_version: Option<u64>,
  ) -> Result<User, UpdateError> {
    let outcome = self
      .store
      .update(
        Collection::Users,
        key.as_str().to_owned(),
        status_write(target),
        expected_version,
      )
      .await
      .map_err(|e| UpdateError::WriteFailed(Box::new(e)))?;

    match outcome {
      UpdateOutcome::Applied(doc) => {
        User::from_document(doc).map_err(|e| UpdateError::WriteFailed(Box::new(e)))
      }
      UpdateOutcome::Missing => Err(UpdateError::UnknownUser(key.clone())),
      UpdateOutcome::VersionMismatch { current } => Err(UpdateError::Conflict {
        key:      key.clone(),
        expected: expected_version.unwrap_or_default(),
        actual:   current,
      }),
    }
  }

  /// Users currently in `Emergency`, most recent SOS first.
  pub fn subscribe_emergency_users(&self) -> ProjectedView<User> {
    feed::project(self.store.clone(), emergency_feed())
  }

  /// Every registered user, sorted by display name.
  pub fn subscribe_roster(&self) -> ProjectedView<User> {
    feed::project(self.store.clone(), roster_feed())
  }
}

/// The single-document write for a status transition.
pub fn status_write(target: StatusTarget) -> DocumentWrite {
  let write = DocumentWrite::new().set("status", target.status().as_str());
  match target {
    StatusTarget::Emergency => write
      .set("last_known_location", SOS_LOCATION)
      .server_timestamp("sos_timestamp"),
    StatusTarget::Safe => write.set("last_known_location", SAFE_LOCATION),
  }
}

// ─── Feeds ───────────────────────────────────────────────────────────────────

/// Equality filter only: the store gives no ordering guarantee here, so the
/// order is recomputed on every snapshot.
pub fn emergency_feed() -> FeedSpec<User> {
  FeedSpec::new(
    Query::collection(Collection::Users)
      .where_eq("status", Status::Emergency.as_str()),
  )
  .arranged(arrange_emergency)
}

pub fn roster_feed() -> FeedSpec<User> {
  FeedSpec::new(Query::collection(Collection::Users)).arranged(arrange_roster)
}

/// Keep only `Emergency` users; newest SOS first, undated entries last.
pub fn arrange_emergency(users: &mut Vec<User>) {
  users.retain(|u| u.status == Status::Emergency);
  users.sort_by(|a, b| match (a.sos_timestamp, b.sos_timestamp) {
    (Some(x), Some(y)) => y.cmp(&x),
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    (None, None) => Ordering::Equal,
  });
}

fn arrange_roster(users: &mut Vec<User>) {
  users.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.key.as_str().cmp(b.key.as_str())));
}

// ─── Summary ─────────────────────────────────────────────────────────────────

/// Per-status head count for the admin overview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
  pub safe:      usize,
  pub emergency: usize,
  pub unknown:   usize,
  pub total:     usize,
}

impl StatusSummary {
  pub fn from_users(users: &[User]) -> Self {
    users.iter().fold(Self::default(), |mut acc, user| {
      match user.status {
        Status::Safe => acc.safe += 1,
        Status::Emergency => acc.emergency += 1,
        Status::Unknown => acc.unknown += 1,
      }
      acc.total += 1;
      acc
    })
  }
}
