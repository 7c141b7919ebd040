//! End-to-end tests of the synchronization components over a real store:
//! citizen writes on one side, admin feeds on the other.

use std::{sync::Arc, time::Duration};

use alertnet_core::{
  AdvisoryError, FeedError, UpdateError,
  advisory::{
    AdvisoryService, AlertSuggestion, RiskAssessment, SafePathGuidance,
    SafePathRequest,
  },
  alert::Severity,
  broadcast::{AlertBroadcaster, AlertDraft},
  feed::{FeedState, ProjectedView},
  report::{ReportIntake, ReportSubmission},
  session::Session,
  status::{StatusSummary, StatusSynchronizer},
  store::{Collection, DocumentStore, DocumentWrite},
  user::{NewAccount, SAFE_LOCATION, SOS_LOCATION, Status, StatusTarget, UserKey},
};
use chrono::{SubsecRound as _, Utc};

use crate::SqliteStore;

struct Offline;

impl AdvisoryService for Offline {
  async fn generate_suggestion(
    &self,
    _disaster_type: String,
    _severity: Severity,
  ) -> Result<AlertSuggestion, AdvisoryError> {
    Err(AdvisoryError::Unavailable("offline".into()))
  }

  async fn safe_path(
    &self,
    _request: SafePathRequest,
  ) -> Result<SafePathGuidance, AdvisoryError> {
    Err(AdvisoryError::Unavailable("offline".into()))
  }

  async fn assess_risk(
    &self,
    _description: String,
  ) -> Result<RiskAssessment, AdvisoryError> {
    Err(AdvisoryError::Unavailable("offline".into()))
  }
}

async fn store() -> Arc<SqliteStore> {
  Arc::new(SqliteStore::open_in_memory().await.expect("in-memory store"))
}

fn admin() -> Session { Session::admin(UserKey::new("admin@alertnet.test")) }

async fn sign_up(store: &SqliteStore, first: &str) -> Session {
  let account = NewAccount {
    first_name: first.into(),
    last_name:  "Tester".into(),
    email:      format!("{}@x.com", first.to_lowercase()),
    password:   "secret1".into(),
    phone:      None,
    address:    None,
  };
  store
    .create(
      Collection::Users,
      Some(account.key().as_str().to_owned()),
      account.user_write(),
    )
    .await
    .unwrap();
  Session::citizen(account.key())
}

/// Wait until the view is `Ready` with items satisfying `pred`.
async fn wait_until<T: Clone>(
  view: &mut ProjectedView<T>,
  pred: impl Fn(&[T]) -> bool,
) -> Vec<T> {
  tokio::time::timeout(Duration::from_secs(5), async {
    loop {
      if let FeedState::Ready(items) = view.current() {
        if pred(&items) {
          return items;
        }
      }
      match view.changed().await {
        Some(FeedState::Error(e)) => panic!("feed failed: {e}"),
        None => panic!("feed ended"),
        Some(_) => {}
      }
    }
  })
  .await
  .expect("timed out waiting for feed")
}

// ─── Status ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sos_reaches_admin_emergency_feed() {
  let s = store().await;
  let sync = StatusSynchronizer::new(s.clone());
  let alice = sign_up(&s, "Alice").await;

  let mut sos = sync.subscribe_emergency_users();
  assert!(sos.ready().await.unwrap().is_empty());

  // Stored stamps carry microseconds.
  let before = Utc::now().trunc_subsecs(6);
  let user = sync
    .set_status(Some(&alice), StatusTarget::Emergency, None)
    .await
    .unwrap();
  assert_eq!(user.status, Status::Emergency);
  assert_eq!(user.last_known_location, SOS_LOCATION);
  let stamped = user.sos_timestamp.unwrap();
  assert!(stamped >= before, "{stamped} < {before}");

  let items = wait_until(&mut sos, |items| items.len() == 1).await;
  assert_eq!(items[0].key, alice.user_key);
  assert_eq!(items[0].name, "Alice Tester");
  assert_eq!(items[0].sos_timestamp, Some(stamped));
}

#[tokio::test]
async fn sos_stamp_is_not_before_the_call() {
  let s = store().await;
  let sync = StatusSynchronizer::new(s.clone());
  let ann = sign_up(&s, "Ann").await;

  for _ in 0..3 {
    let before = Utc::now().trunc_subsecs(6);
    let user = sync
      .set_status(Some(&ann), StatusTarget::Emergency, None)
      .await
      .unwrap();
    assert!(user.sos_timestamp.is_some_and(|at| at >= before));
    tokio::time::sleep(Duration::from_millis(2)).await;
  }

  let mut sos = sync.subscribe_emergency_users();
  let before_read = Utc::now();
  let items = sos.ready().await.unwrap();
  assert!(items[0].sos_timestamp.is_some_and(|at| at <= before_read));
}

#[tokio::test]
async fn emergency_feed_is_most_recent_first() {
  let s = store().await;
  let sync = StatusSynchronizer::new(s.clone());
  let mut sessions = Vec::new();
  for name in ["Ann", "Bob", "Cat"] {
    let session = sign_up(&s, name).await;
    sync
      .set_status(Some(&session), StatusTarget::Emergency, None)
      .await
      .unwrap();
    sessions.push(session);
  }

  let mut sos = sync.subscribe_emergency_users();
  let items = sos.ready().await.unwrap();
  let keys: Vec<_> = items.iter().map(|u| u.key.as_str()).collect();
  assert_eq!(keys, ["cat@x.com", "bob@x.com", "ann@x.com"]);
  assert!(items.windows(2).all(|w| w[0].sos_timestamp > w[1].sos_timestamp));
}

#[tokio::test]
async fn admin_mark_safe_removes_user_from_feed() {
  let s = store().await;
  let sync = StatusSynchronizer::new(s.clone());
  let bob = sign_up(&s, "Bob").await;
  sync
    .set_status(Some(&bob), StatusTarget::Emergency, None)
    .await
    .unwrap();

  let mut sos = sync.subscribe_emergency_users();
  assert_eq!(sos.ready().await.unwrap().len(), 1);

  let user = sync
    .mark_safe_by_admin(&admin(), &bob.user_key, None)
    .await
    .unwrap();
  assert_eq!(user.status, Status::Safe);
  assert_eq!(user.last_known_location, SAFE_LOCATION);

  wait_until(&mut sos, |items| items.is_empty()).await;
}

#[tokio::test]
async fn repeated_safe_is_accepted() {
  let s = store().await;
  let sync = StatusSynchronizer::new(s.clone());
  let ann = sign_up(&s, "Ann").await;

  let first = sync.set_status(Some(&ann), StatusTarget::Safe, None).await.unwrap();
  let second = sync.set_status(Some(&ann), StatusTarget::Safe, None).await.unwrap();
  assert_eq!(first.status, Status::Safe);
  assert_eq!(second.status, Status::Safe);
  assert_eq!(second.version, first.version + 1);
}

#[tokio::test]
async fn repeated_sos_restamps() {
  let s = store().await;
  let sync = StatusSynchronizer::new(s.clone());
  let ann = sign_up(&s, "Ann").await;

  let first = sync
    .set_status(Some(&ann), StatusTarget::Emergency, None)
    .await
    .unwrap();
  let second = sync
    .set_status(Some(&ann), StatusTarget::Emergency, None)
    .await
    .unwrap();
  assert!(second.sos_timestamp > first.sos_timestamp);
}

#[tokio::test]
async fn unregistered_session_is_unknown_user() {
  let s = store().await;
  let sync = StatusSynchronizer::new(s.clone());
  let ghost = Session::citizen(UserKey::new("ghost@x.com"));
  let err = sync
    .set_status(Some(&ghost), StatusTarget::Emergency, None)
    .await
    .unwrap_err();
  assert!(matches!(err, UpdateError::UnknownUser(k) if k.as_str() == "ghost@x.com"));
  assert!(s.get(Collection::Users, "ghost@x.com".into()).await.unwrap().is_none());
}

#[tokio::test]
async fn stale_version_conflicts_without_writing() {
  let s = store().await;
  let sync = StatusSynchronizer::new(s.clone());
  let ann = sign_up(&s, "Ann").await;

  let sos = sync
    .set_status(Some(&ann), StatusTarget::Emergency, Some(1))
    .await
    .unwrap();
  assert_eq!(sos.version, 2);

  // Admin acts on the version they saw before the SOS.
  let err = sync
    .mark_safe_by_admin(&admin(), &ann.user_key, Some(1))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    UpdateError::Conflict { expected: 1, actual: 2, .. }
  ));

  let mut roster = sync.subscribe_roster();
  let users = roster.ready().await.unwrap();
  assert_eq!(users[0].status, Status::Emergency);
}

#[tokio::test]
async fn roster_and_summary() {
  let s = store().await;
  let sync = StatusSynchronizer::new(s.clone());
  let zed = sign_up(&s, "Zed").await;
  let amy = sign_up(&s, "Amy").await;
  sign_up(&s, "Moe").await;
  sync.set_status(Some(&zed), StatusTarget::Emergency, None).await.unwrap();
  sync.set_status(Some(&amy), StatusTarget::Safe, None).await.unwrap();

  let mut roster = sync.subscribe_roster();
  let users = roster.ready().await.unwrap();
  let names: Vec<_> = users.iter().map(|u| u.name.as_str()).collect();
  assert_eq!(names, ["Amy Tester", "Moe Tester", "Zed Tester"]);
  assert_eq!(
    StatusSummary::from_users(&users),
    StatusSummary { safe: 1, emergency: 1, unknown: 1, total: 3 }
  );
}

// ─── Feeds ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn malformed_status_drives_feed_to_decode_error() {
  let s = store().await;
  let sync = StatusSynchronizer::new(s.clone());
  sign_up(&s, "Ann").await;

  let mut roster = sync.subscribe_roster();
  roster.ready().await.unwrap();

  s.create(
    Collection::Users,
    Some("bad@x.com".into()),
    DocumentWrite::new().set("status", "Panicking"),
  )
  .await
  .unwrap();

  let state = tokio::time::timeout(Duration::from_secs(5), async {
    loop {
      match roster.changed().await {
        Some(FeedState::Error(e)) => return e,
        Some(_) => continue,
        None => panic!("feed ended without an error state"),
      }
    }
  })
  .await
  .unwrap();
  assert!(matches!(
    state,
    FeedError::Decode { collection: Collection::Users, ref id, .. } if id == "bad@x.com"
  ));

  // Error is terminal.
  assert!(roster.current().is_terminal());
}

#[tokio::test]
async fn dropping_view_releases_subscription() {
  let s = store().await;
  let sync = StatusSynchronizer::new(s.clone());
  let mut view = sync.subscribe_roster();
  view.ready().await.unwrap();
  assert_eq!(s.live_subscriptions(), 1);

  view.close();
  for _ in 0..50 {
    if s.live_subscriptions() == 0 {
      break;
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
  }
  assert_eq!(s.live_subscriptions(), 0);
}

// ─── Alerts ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn alerts_feed_is_newest_first() {
  let s = store().await;
  let broadcaster = AlertBroadcaster::new(s.clone(), Arc::new(Offline));

  let mut feed = broadcaster.subscribe_alerts();
  assert!(feed.ready().await.unwrap().is_empty());

  for (title, severity) in [
    ("Flood watch", Severity::Low),
    ("Flood warning", Severity::Moderate),
    ("Evacuate now", Severity::High),
  ] {
    broadcaster
      .broadcast(&admin(), AlertDraft {
        title: title.into(),
        severity,
        message: "Residents of the river district must act.".into(),
      })
      .await
      .unwrap();
  }

  let alerts = wait_until(&mut feed, |items| items.len() == 3).await;
  let titles: Vec<_> = alerts.iter().map(|a| a.title.as_str()).collect();
  assert_eq!(titles, ["Evacuate now", "Flood warning", "Flood watch"]);
  assert!(alerts.windows(2).all(|w| w[0].created_at > w[1].created_at));
  assert_eq!(alerts[0].severity, Severity::High);
}

#[tokio::test]
async fn advisory_outage_does_not_block_manual_broadcast() {
  let s = store().await;
  let broadcaster = AlertBroadcaster::new(s.clone(), Arc::new(Offline));

  let mut draft = AlertDraft {
    title:    "Storm surge".into(),
    severity: Severity::High,
    message:  "Move inland before the evening high tide.".into(),
  };
  let err = broadcaster
    .suggest_into(&admin(), "Cyclone", &mut draft)
    .await
    .unwrap_err();
  assert!(matches!(err, AdvisoryError::Unavailable(_)));

  let id = broadcaster.broadcast(&admin(), draft).await.unwrap();
  let doc = s.get(Collection::Alerts, id.0).await.unwrap().unwrap();
  assert_eq!(doc.fields["title"], "Storm surge");
}

// ─── Reports ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn citizen_report_reaches_admin_feed() {
  let s = store().await;
  let intake = ReportIntake::new(s.clone());
  let ann = sign_up(&s, "Ann").await;

  let mut feed = intake.subscribe_reports();
  assert!(feed.ready().await.unwrap().is_empty());

  let report = intake
    .submit(Some(&ann), ReportSubmission {
      description: "Bridge on 5th street collapsed".into(),
      image_url:   Some("https://img.example/bridge.jpg".into()),
      image_hint:  Some("collapsed bridge".into()),
      location:    "5th street".into(),
    })
    .await
    .unwrap();
  assert_eq!(report.author_name, "Ann Tester");

  let items = wait_until(&mut feed, |items| items.len() == 1).await;
  assert_eq!(items[0].id, report.id);
  assert_eq!(items[0].image_hint.as_deref(), Some("collapsed bridge"));
}
