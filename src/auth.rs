//! Hosted auth service client and the portal login flow
//!
//! Sign-in goes through the auth service's password endpoint; the resulting
//! credential is then matched against the `users` collection to build a
//! `Session` and decide which dashboard the user lands on.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::PortalConfig;
use crate::firestore::{FirestoreClient, StructuredQuery, Value};
use crate::models::UserRecord;
use crate::session::{Role, Session};

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

const IDENTITY_API_BASE: &str = "https://identitytoolkit.googleapis.com";

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
  #[error("Missing email or password")]
  MissingFields,

  #[error("No account exists for this email")]
  UserNotFound,

  #[error("Invalid email or password")]
  InvalidCredential,

  #[error("Too many sign-in attempts")]
  TooManyRequests,

  #[error("Account role is not allowed to sign in")]
  RoleNotAllowed,

  #[error("No profile record found for this account")]
  ProfileNotFound,

  #[error("HTTP request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("Auth API error: {0}")]
  Api(String),

  #[error("Profile lookup failed: {0}")]
  Store(String),
}

impl AuthError {
  /// Localized message shown in the login modal
  pub fn user_message(&self) -> &'static str {
    match self {
      AuthError::MissingFields => "Por favor, complete todos los campos.",
      AuthError::UserNotFound => "No existe una cuenta asociada a este correo electrónico.",
      AuthError::InvalidCredential => "Correo electrónico o contraseña incorrecta.",
      AuthError::TooManyRequests => {
        "Se han realizado demasiados intentos. Por favor, intenta más tarde."
      }
      AuthError::RoleNotAllowed => "No puedes iniciar sesión con esta cuenta.",
      AuthError::ProfileNotFound => "No se encontró información del usuario.",
      _ => "Ocurrió un error al iniciar sesión. Por favor, intenta de nuevo más tarde.",
    }
  }
}

impl Serialize for AuthError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Auth Service Responses
/// ---------------------------------------------------------------------------

/// Credential returned by the password sign-in endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
  pub local_id: String,
  pub id_token: String,
  pub refresh_token: String,
  pub email: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
  error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
  message: String,
}

/// Map the service's error codes onto the portal's taxonomy. Rate limiting
/// arrives with a variable suffix, so it is matched by prefix.
fn map_api_error(message: &str) -> AuthError {
  if message.starts_with("TOO_MANY_ATTEMPTS_TRY_LATER") {
    return AuthError::TooManyRequests;
  }

  match message {
    "EMAIL_NOT_FOUND" => AuthError::UserNotFound,
    "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "INVALID_EMAIL" => {
      AuthError::InvalidCredential
    }
    other => AuthError::Api(other.to_string()),
  }
}

/// ---------------------------------------------------------------------------
/// Auth Client
/// ---------------------------------------------------------------------------

pub struct AuthClient {
  http: Client,
  base_url: String,
  api_key: String,
}

impl AuthClient {
  pub fn new(config: &PortalConfig) -> Self {
    Self {
      http: Client::new(),
      base_url: IDENTITY_API_BASE.to_string(),
      api_key: config.api_key.clone(),
    }
  }

  /// Point the client at a different host (used by tests)
  pub fn with_base_url(config: &PortalConfig, base_url: impl Into<String>) -> Self {
    Self {
      http: Client::new(),
      base_url: base_url.into(),
      api_key: config.api_key.clone(),
    }
  }

  fn endpoint(&self, action: &str) -> Result<Url, AuthError> {
    let mut url = Url::parse(&self.base_url)
      .and_then(|u| u.join(&format!("/v1/accounts:{}", action)))
      .map_err(|e| AuthError::Api(e.to_string()))?;
    url.query_pairs_mut().append_pair("key", &self.api_key);
    Ok(url)
  }

  /// Exchange email/password for an opaque credential
  pub async fn sign_in_with_password(
    &self,
    email: &str,
    password: &str,
  ) -> Result<SignInResponse, AuthError> {
    let url = self.endpoint("signInWithPassword")?;

    let response = self
      .http
      .post(url)
      .json(&serde_json::json!({
        "email": email,
        "password": password,
        "returnSecureToken": true,
      }))
      .send()
      .await?;

    if !response.status().is_success() {
      let error_text = response.text().await.unwrap_or_default();
      return Err(match serde_json::from_str::<ApiErrorBody>(&error_text) {
        Ok(body) => map_api_error(&body.error.message),
        Err(_) => AuthError::Api(error_text),
      });
    }

    Ok(response.json().await?)
  }
}

/// ---------------------------------------------------------------------------
/// Login Flow
/// ---------------------------------------------------------------------------

/// Which dashboard a successful login lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
  Home,
  AdminHome,
}

#[derive(Debug)]
pub struct LoginOutcome {
  pub session: Session,
  pub destination: Destination,
  /// Token the portal uses for all subsequent store queries
  pub id_token: String,
}

/// Full portal login: authenticate, look up the profile record by UID, and
/// build the session. Accounts whose role is neither `user` nor `admin` are
/// rejected without a session.
pub async fn login(
  auth: &AuthClient,
  store: &FirestoreClient,
  email: &str,
  password: &str,
) -> Result<LoginOutcome, AuthError> {
  if email.trim().is_empty() || password.is_empty() {
    return Err(AuthError::MissingFields);
  }

  let credential = auth.sign_in_with_password(email, password).await?;

  let query = StructuredQuery::collection("users")
    .where_eq("uid", Value::string(&credential.local_id));

  let docs = store
    .run_query(&credential.id_token, None, &query)
    .await
    .map_err(|e| AuthError::Store(e.to_string()))?;

  let profile = match docs.first() {
    Some(doc) => UserRecord::from_document(doc),
    None => return Err(AuthError::ProfileNotFound),
  };

  let role = Role::parse(&profile.role).ok_or(AuthError::RoleNotAllowed)?;
  let destination = match role {
    Role::User => Destination::Home,
    Role::Admin => Destination::AdminHome,
  };

  let session = Session {
    id: profile.id,
    uid: credential.local_id,
    email: credential.email,
    username: profile.username,
    phone: profile.phone,
    image: profile.image,
    role,
  };

  Ok(LoginOutcome {
    session,
    destination,
    id_token: credential.id_token,
  })
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
