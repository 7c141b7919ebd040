//! Caller identity, passed explicitly to every operation that needs it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::UserKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Citizen,
  Admin,
}

/// An authenticated caller. Issued at login or signup; lives until logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub user_key:   UserKey,
  pub role:       Role,
  pub started_at: DateTime<Utc>,
}

impl Session {
  pub fn new(user_key: UserKey, role: Role) -> Self {
    Self { user_key, role, started_at: Utc::now() }
  }

  pub fn citizen(user_key: UserKey) -> Self { Self::new(user_key, Role::Citizen) }

  pub fn admin(user_key: UserKey) -> Self { Self::new(user_key, Role::Admin) }

  pub fn is_admin(&self) -> bool { self.role == Role::Admin }
}
