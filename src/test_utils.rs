//! Test utilities and helpers
//!
//! Mock data factories and time helpers shared by the module tests.

use chrono::{DateTime, Duration, Utc};

use crate::activity::UserActivity;
use crate::models::BodyMeasurement;
use crate::session::{Role, Session};

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

/// Create a mock session with the given role
pub fn mock_session(role: Role) -> Session {
  Session {
    id: "doc42".to_string(),
    uid: "uid-1".to_string(),
    email: "ana@example.com".to_string(),
    username: Some("ana".to_string()),
    phone: Some("600123456".to_string()),
    image: None,
    role,
  }
}

/// Create a mock body measurement N days old
pub fn mock_measurement(category: &str, days_ago: i64, value: String) -> BodyMeasurement {
  BodyMeasurement {
    date: datetime_days_ago(days_ago),
    value,
    category: category.to_string(),
  }
}

/// Create a mock user with the given training timestamps
pub fn mock_user_activity(user_id: &str, trainings: Vec<DateTime<Utc>>) -> UserActivity {
  UserActivity {
    user_id: user_id.to_string(),
    trainings,
  }
}

/// ---------------------------------------------------------------------------
/// Time Helpers
/// ---------------------------------------------------------------------------

/// Create a DateTime N days ago from now
pub fn datetime_days_ago(days: i64) -> DateTime<Utc> {
  Utc::now() - Duration::days(days)
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_mock_factories_create_valid_data() {
    let session = mock_session(Role::Admin);
    assert_eq!(session.role, Role::Admin);
    assert!(!session.uid.is_empty());

    let measurement = mock_measurement("Peso", 3, "72.5".to_string());
    assert_eq!(measurement.category, "Peso");
    assert_eq!(measurement.numeric_value(), Some(72.5));

    let activity = mock_user_activity("u1", vec![Utc::now()]);
    assert_eq!(activity.trainings.len(), 1);
  }

  #[test]
  fn test_datetime_helper_produces_past_dates() {
    let past = datetime_days_ago(7);
    let diff = Utc::now() - past;
    assert!(diff.num_days() >= 6 && diff.num_days() <= 8);
  }
}
