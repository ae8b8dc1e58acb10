use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::firestore::Document;

/// An account record from the users collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
  /// Document ID within the users collection
  pub id: String,
  /// Auth service UID (stored as a field, distinct from the document ID)
  pub uid: String,
  pub email: String,
  pub username: Option<String>,
  pub phone: Option<String>,
  pub image: Option<String>,
  pub role: String,
  pub created_at: Option<DateTime<Utc>>,
}

impl UserRecord {
  pub fn from_document(doc: &Document) -> Self {
    Self {
      id: doc.id().to_string(),
      uid: doc.str_field("uid").unwrap_or_default().to_string(),
      email: doc.str_field("email").unwrap_or_default().to_string(),
      username: doc.str_field("username").map(String::from),
      phone: doc.str_field("phone").map(String::from),
      image: doc.str_field("image").map(String::from),
      role: doc.str_field("role").unwrap_or_default().to_string(),
      created_at: doc.timestamp_field("createdAt"),
    }
  }
}
