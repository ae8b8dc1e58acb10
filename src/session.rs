//! Session ownership and route protection
//!
//! The portal keeps one in-memory session mirrored to a single JSON file (the
//! persisted-storage equivalent of the browser's `user` key). `SessionStore`
//! is the only writer; views read immutable snapshots.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// ---------------------------------------------------------------------------
/// Roles and Sessions
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  User,
  Admin,
}

impl Role {
  /// Role name as stored in account records
  pub fn as_str(&self) -> &'static str {
    match self {
      Role::User => "user",
      Role::Admin => "admin",
    }
  }

  /// Parse a stored role; anything unrecognized yields None and the account
  /// is rejected at login
  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "user" => Some(Role::User),
      "admin" => Some(Role::Admin),
      _ => None,
    }
  }
}

/// An authenticated user's identity, held in memory and mirrored to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  /// Profile document ID
  pub id: String,
  /// Auth service UID
  pub uid: String,
  pub email: String,
  pub username: Option<String>,
  pub phone: Option<String>,
  pub image: Option<String>,
  pub role: Role,
}

/// ---------------------------------------------------------------------------
/// Session Store
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
  #[error("Session storage error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Session serialization error: {0}")]
  Serde(#[from] serde_json::Error),
}

impl Serialize for SessionError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// Single-writer session store with a persisted mirror
pub struct SessionStore {
  session: Option<Session>,
  storage_path: PathBuf,
}

impl SessionStore {
  pub fn new(storage_path: PathBuf) -> Self {
    Self { session: None, storage_path }
  }

  /// Immutable snapshot of the current session
  pub fn snapshot(&self) -> Option<Session> {
    self.session.clone()
  }

  /// Set the session and persist the mirror
  pub fn sign_in(&mut self, session: Session) -> Result<(), SessionError> {
    if let Some(parent) = self.storage_path.parent() {
      fs::create_dir_all(parent)?;
    }

    fs::write(&self.storage_path, serde_json::to_string(&session)?)?;
    self.session = Some(session);
    Ok(())
  }

  /// Clear the session and the mirror
  pub fn sign_out(&mut self) -> Result<(), SessionError> {
    self.session = None;
    if self.storage_path.exists() {
      fs::remove_file(&self.storage_path)?;
    }
    Ok(())
  }

  /// Restore the session from the mirror if none is held in memory.
  /// A missing or unreadable mirror leaves the store unauthenticated.
  pub fn hydrate(&mut self) {
    if self.session.is_some() {
      return;
    }

    let raw = match fs::read_to_string(&self.storage_path) {
      Ok(raw) => raw,
      Err(_) => return,
    };

    match serde_json::from_str(&raw) {
      Ok(session) => self.session = Some(session),
      Err(e) => {
        log::warn!("Discarding unreadable session mirror: {}", e);
      }
    }
  }
}

/// ---------------------------------------------------------------------------
/// Route Guard
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
  Loading,
  Unauthenticated,
  Unauthorized,
  Authorized,
}

/// What the caller should render after the guard resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
  RedirectToLogin,
  /// Authenticated but lacking the required role; send to the default
  /// authenticated landing page, not back to login
  RedirectToHome,
  Render,
}

/// One-shot guard for a protected route. Starts in `Loading`, hydrates the
/// session store, then resolves to exactly one outcome.
pub struct RouteGuard {
  required_role: Option<Role>,
  state: GuardState,
}

impl RouteGuard {
  pub fn new(required_role: Option<Role>) -> Self {
    Self { required_role, state: GuardState::Loading }
  }

  pub fn state(&self) -> GuardState {
    self.state
  }

  pub fn resolve(&mut self, store: &mut SessionStore) -> GuardOutcome {
    store.hydrate();

    let outcome = match store.snapshot() {
      None => {
        self.state = GuardState::Unauthenticated;
        GuardOutcome::RedirectToLogin
      }
      Some(session) => match self.required_role {
        Some(required) if session.role != required => {
          self.state = GuardState::Unauthorized;
          GuardOutcome::RedirectToHome
        }
        _ => {
          self.state = GuardState::Authorized;
          GuardOutcome::Render
        }
      },
    };

    outcome
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
