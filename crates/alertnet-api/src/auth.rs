//! Account handlers: signup, login, logout and `/me`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/signup` | Body: [`NewAccount`]; 201 + token, session, user |
//! | `POST` | `/login`  | Body: `{"email","password"}`; admins are checked first |
//! | `POST` | `/logout` | Revokes the presented token; 204 |
//! | `GET`  | `/me`     | Current session and, for citizens, their user record |

use alertnet_core::{
  advisory::AdvisoryService,
  document::FromDocument,
  session::Session,
  store::{Collection, CreateOutcome, DocumentStore, DocumentWrite},
  user::{NewAccount, User, UserKey},
};
use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};

use crate::{
  AppState,
  error::ApiError,
  session::CurrentSession,
};

// ─── Admin directory ─────────────────────────────────────────────────────────

/// An operator account provisioned through configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminAccount {
  pub email:         String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

#[derive(Debug, Clone, Default)]
pub struct AdminDirectory {
  admins: Vec<AdminAccount>,
}

impl AdminDirectory {
  pub fn new(admins: Vec<AdminAccount>) -> Self { Self { admins } }

  fn find(&self, key: &UserKey) -> Option<&AdminAccount> {
    self.admins.iter().find(|a| UserKey::new(&a.email) == *key)
  }
}

// ─── Passwords ───────────────────────────────────────────────────────────────

pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::Internal(format!("argon2 error: {e}")))
}

fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc).is_ok_and(|parsed| {
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .is_ok()
  })
}

// ─── Responses ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AuthResponse {
  pub token:   String,
  pub session: Session,
  pub user:    Option<User>,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
  pub session: Session,
  pub user:    Option<User>,
}

async fn stored_hash<S: DocumentStore>(
  store: &S,
  key: &UserKey,
) -> Result<Option<String>, ApiError> {
  Ok(
    store
      .get(Collection::Credentials, key.as_str().to_owned())
      .await
      .map_err(ApiError::store)?
      .and_then(|doc| doc.fields.get("password_hash")?.as_str().map(str::to_owned)),
  )
}

async fn load_user<S: DocumentStore>(
  store: &S,
  key: &UserKey,
) -> Result<Option<User>, ApiError> {
  store
    .get(Collection::Users, key.as_str().to_owned())
    .await
    .map_err(ApiError::store)?
    .map(User::from_document)
    .transpose()
    .map_err(ApiError::store)
}

// ─── Signup ──────────────────────────────────────────────────────────────────

/// `POST /signup`
pub async fn signup<S, A>(
  State(state): State<AppState<S, A>>,
  Json(account): Json<NewAccount>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore + 'static,
  A: AdvisoryService + 'static,
{
  account.validate()?;
  let key = account.key();
  if state.admins.find(&key).is_some() {
    return Err(ApiError::Conflict(format!("{key} is already registered")));
  }

  let credential = DocumentWrite::new().set("password_hash", hash_password(&account.password)?);
  let created = state
    .store
    .create(Collection::Credentials, Some(key.as_str().to_owned()), credential)
    .await
    .map_err(ApiError::store)?;
  if matches!(created, CreateOutcome::AlreadyExists) {
    resume_signup(state.store.as_ref(), &key, &account.password).await?;
  }

  let created = state
    .store
    .create(Collection::Users, Some(key.as_str().to_owned()), account.user_write())
    .await
    .map_err(ApiError::store)?;
  let CreateOutcome::Created(doc) = created else {
    return Err(ApiError::Conflict(format!("{key} is already registered")));
  };
  let user = User::from_document(doc).map_err(ApiError::store)?;

  let session = Session::citizen(key);
  let token = state.sessions.issue(session.clone());
  tracing::info!(user = %user.key, "citizen registered");
  Ok((
    StatusCode::CREATED,
    Json(AuthResponse { token, session, user: Some(user) }),
  ))
}

/// A credential without a user document is left behind when the second
/// signup write fails. The same email and password may finish the signup;
/// anything else is a conflict.
async fn resume_signup<S: DocumentStore>(
  store: &S,
  key: &UserKey,
  password: &str,
) -> Result<(), ApiError> {
  let conflict = || ApiError::Conflict(format!("{key} is already registered"));
  if load_user(store, key).await?.is_some() {
    return Err(conflict());
  }
  let hash = stored_hash(store, key).await?;
  if !hash.is_some_and(|h| verify_password(password, &h)) {
    return Err(conflict());
  }
  tracing::info!(user = %key, "resuming interrupted signup");
  Ok(())
}

// ─── Login ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

/// `POST /login`
pub async fn login<S, A>(
  State(state): State<AppState<S, A>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<AuthResponse>, ApiError>
where
  S: DocumentStore + 'static,
  A: AdvisoryService + 'static,
{
  let key = UserKey::new(&body.email);

  if let Some(admin) = state.admins.find(&key) {
    if !verify_password(&body.password, &admin.password_hash) {
      tracing::warn!(user = %key, "admin login failed");
      return Err(ApiError::InvalidCredentials);
    }
    let session = Session::admin(key);
    let token = state.sessions.issue(session.clone());
    return Ok(Json(AuthResponse { token, session, user: None }));
  }

  let hash = stored_hash(state.store.as_ref(), &key).await?;
  if !hash.is_some_and(|h| verify_password(&body.password, &h)) {
    tracing::debug!(user = %key, "login failed");
    return Err(ApiError::InvalidCredentials);
  }

  let user = load_user(state.store.as_ref(), &key).await?;
  let session = Session::citizen(key);
  let token = state.sessions.issue(session.clone());
  Ok(Json(AuthResponse { token, session, user }))
}

// ─── Logout / me ─────────────────────────────────────────────────────────────

/// `POST /logout`
pub async fn logout<S, A>(
  State(state): State<AppState<S, A>>,
  current: CurrentSession,
) -> StatusCode
where
  S: DocumentStore + 'static,
  A: AdvisoryService + 'static,
{
  state.sessions.revoke(&current.token);
  StatusCode::NO_CONTENT
}

/// `GET /me`
pub async fn me<S, A>(
  State(state): State<AppState<S, A>>,
  current: CurrentSession,
) -> Result<Json<MeResponse>, ApiError>
where
  S: DocumentStore + 'static,
  A: AdvisoryService + 'static,
{
  let user = if current.session.is_admin() {
    None
  } else {
    load_user(state.store.as_ref(), &current.session.user_key).await?
  };
  Ok(Json(MeResponse { session: current.session, user }))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn password_round_trip() {
    let phc = hash_password("correct horse").unwrap();
    assert!(phc.starts_with("$argon2"));
    assert!(verify_password("correct horse", &phc));
    assert!(!verify_password("wrong horse", &phc));
    assert!(!verify_password("anything", "not-a-phc-string"));
  }

  #[test]
  fn admin_lookup_ignores_case() {
    let dir = AdminDirectory::new(vec![AdminAccount {
      email:         "Ops@AlertNet.test".into(),
      password_hash: String::new(),
    }]);
    assert!(dir.find(&UserKey::new("ops@alertnet.test")).is_some());
    assert!(dir.find(&UserKey::new("someone@alertnet.test")).is_none());
  }
}
