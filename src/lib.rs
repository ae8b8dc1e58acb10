pub mod activity;
pub mod auth;
pub mod config;
pub mod firestore;
pub mod models;
pub mod progress;
pub mod queries;
pub mod session;
pub mod view;

#[cfg(test)]
mod test_utils;

pub use activity::{
  monthly_activity, weekly_activity, weekly_registrations, ActivityCounts, Classification,
  ReferenceWindow, UserActivity,
};
pub use auth::{login, AuthClient, AuthError, Destination, LoginOutcome};
pub use config::PortalConfig;
pub use firestore::{FirestoreClient, StoreError, StructuredQuery};
pub use session::{GuardOutcome, GuardState, Role, RouteGuard, Session, SessionStore};
pub use view::{LoadState, RequestToken, ViewState};
