//! Query construction and fetch operations for the three data families
//!
//! Each dashboard view maps its selection (category, month/year, exercise)
//! onto one of these fetches. Results come back newest first, capped at
//! `RESULT_LIMIT`, matching what the charts and tables expect.

use std::collections::HashMap;

use crate::activity::{ReferenceWindow, UserActivity};
use crate::firestore::{FirestoreClient, StoreError, StructuredQuery, Value};
use crate::models::{BodyMeasurement, MeasurementCategory, TrainingSession, UserRecord};
use crate::progress::{ExerciseHistory, ExercisePoint};
use crate::session::Role;

/// Result cap applied to every history fetch
pub const RESULT_LIMIT: i32 = 30;

/// ---------------------------------------------------------------------------
/// Query Construction
/// ---------------------------------------------------------------------------

/// A user's measurement history for one category, newest first
pub fn measurement_query(category: MeasurementCategory) -> StructuredQuery {
  StructuredQuery::collection("measurements")
    .where_eq("category", Value::string(category.as_str()))
    .order_by_desc("date")
    .limit(RESULT_LIMIT)
}

/// A user's most recent training sessions, newest first
pub fn training_query() -> StructuredQuery {
  StructuredQuery::collection("training")
    .order_by_desc("endTime")
    .limit(RESULT_LIMIT)
}

/// Accounts registered within the window, newest first
pub fn registered_users_query(window: &ReferenceWindow) -> StructuredQuery {
  StructuredQuery::collection("users")
    .where_eq("role", Value::string(Role::User.as_str()))
    .where_between("createdAt", window.start(), window.end())
    .order_by_desc("createdAt")
}

/// All regular user accounts (activity aggregation walks their subcollections)
pub fn all_users_query() -> StructuredQuery {
  StructuredQuery::collection("users").where_eq("role", Value::string(Role::User.as_str()))
}

/// One user's sessions started within the window
pub fn user_training_in_window_query(window: &ReferenceWindow) -> StructuredQuery {
  StructuredQuery::collection("training").where_between("startTime", window.start(), window.end())
}

/// ---------------------------------------------------------------------------
/// Fetch Operations
/// ---------------------------------------------------------------------------

/// Body-measurement history for the progress chart
pub async fn fetch_body_measurements(
  store: &FirestoreClient,
  id_token: &str,
  user_id: &str,
  category: MeasurementCategory,
) -> Result<Vec<BodyMeasurement>, StoreError> {
  let parent = format!("users/{}", user_id);
  let docs = store
    .run_query(id_token, Some(&parent), &measurement_query(category))
    .await?;

  Ok(docs.iter().map(BodyMeasurement::from_document).collect())
}

/// Registered accounts within the window for the admin signups chart
pub async fn fetch_registered_users(
  store: &FirestoreClient,
  id_token: &str,
  window: &ReferenceWindow,
) -> Result<Vec<UserRecord>, StoreError> {
  let docs = store
    .run_query(id_token, None, &registered_users_query(window))
    .await?;

  Ok(docs.iter().map(UserRecord::from_document).collect())
}

/// Training timestamps per user for the admin activity chart: every regular
/// account, each with its sessions started inside the window
pub async fn fetch_user_activity(
  store: &FirestoreClient,
  id_token: &str,
  window: &ReferenceWindow,
) -> Result<Vec<UserActivity>, StoreError> {
  let users = store.run_query(id_token, None, &all_users_query()).await?;
  let query = user_training_in_window_query(window);

  let mut activity = Vec::with_capacity(users.len());
  for user in &users {
    let parent = format!("users/{}", user.id());
    let sessions = store.run_query(id_token, Some(&parent), &query).await?;

    let trainings = sessions
      .iter()
      .map(TrainingSession::from_document)
      .filter_map(|s| s.start_time)
      .collect();

    activity.push(UserActivity {
      user_id: user.id().to_string(),
      trainings,
    });
  }

  Ok(activity)
}

/// Recent sessions condensed into per-exercise progress points.
///
/// Sessions without an end time are skipped, as are entries with no completed
/// sets. Exercise names come from reference lookups; a dangling reference
/// drops the entry rather than the whole fetch.
pub async fn fetch_exercise_history(
  store: &FirestoreClient,
  id_token: &str,
  user_id: &str,
) -> Result<ExerciseHistory, StoreError> {
  let parent = format!("users/{}", user_id);
  let docs = store
    .run_query(id_token, Some(&parent), &training_query())
    .await?;

  let mut history = ExerciseHistory::default();
  let mut name_cache: HashMap<String, Option<String>> = HashMap::new();

  for doc in &docs {
    let session = TrainingSession::from_document(doc);
    let Some(date) = session.end_time else { continue };

    for entry in &session.exercises {
      if !entry.has_added_sets() {
        continue;
      }
      let Some(ref path) = entry.exercise_ref else { continue };

      let name = match name_cache.get(path) {
        Some(cached) => cached.clone(),
        None => {
          let resolved = store
            .get_document(id_token, path)
            .await?
            .and_then(|d| d.str_field("name").map(String::from));
          name_cache.insert(path.clone(), resolved.clone());
          resolved
        }
      };
      let Some(name) = name else {
        log::debug!("Skipping exercise entry with unresolvable reference {}", path);
        continue;
      };

      let Some(max_weight) = entry.max_added_weight() else { continue };
      history.push(
        &name,
        ExercisePoint {
          date,
          max_weight,
          reps: entry.reps,
          set_count: entry.added_set_count(),
        },
      );
    }
  }

  Ok(history)
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::PortalConfig;
  use chrono::{TimeZone, Utc};

  fn test_config() -> PortalConfig {
    PortalConfig {
      api_key: "test-key".into(),
      project_id: "test-project".into(),
    }
  }

  #[test]
  fn test_measurement_query_shape() {
    let json = serde_json::to_value(measurement_query(MeasurementCategory::Peso))
      .expect("should serialize");

    assert_eq!(json["from"][0]["collectionId"], "measurements");
    assert_eq!(json["where"]["fieldFilter"]["field"]["fieldPath"], "category");
    assert_eq!(json["where"]["fieldFilter"]["value"]["stringValue"], "Peso");
    assert_eq!(json["orderBy"][0]["field"]["fieldPath"], "date");
    assert_eq!(json["orderBy"][0]["direction"], "DESCENDING");
    assert_eq!(json["limit"], 30);
  }

  #[test]
  fn test_training_query_shape() {
    let json = serde_json::to_value(training_query()).expect("should serialize");

    assert_eq!(json["from"][0]["collectionId"], "training");
    assert!(json.get("where").is_none());
    assert_eq!(json["orderBy"][0]["field"]["fieldPath"], "endTime");
    assert_eq!(json["limit"], 30);
  }

  #[test]
  fn test_registered_users_query_combines_role_and_range() {
    let window = ReferenceWindow::new(2024, 2);
    let json =
      serde_json::to_value(registered_users_query(&window)).expect("should serialize");

    let filters = json["where"]["compositeFilter"]["filters"]
      .as_array()
      .expect("filters should be an array");
    assert_eq!(filters.len(), 3);
    assert_eq!(filters[0]["fieldFilter"]["field"]["fieldPath"], "role");
    assert_eq!(filters[1]["fieldFilter"]["op"], "GREATER_THAN_OR_EQUAL");
    assert_eq!(filters[2]["fieldFilter"]["op"], "LESS_THAN_OR_EQUAL");
    assert_eq!(json["orderBy"][0]["field"]["fieldPath"], "createdAt");
  }

  #[tokio::test]
  async fn test_fetch_body_measurements_targets_the_user_subcollection() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
      .mock(
        "POST",
        "/v1/projects/test-project/databases/(default)/documents/users/u1:runQuery",
      )
      .with_status(200)
      .with_body(
        r#"[{"document": {
              "name": "projects/test-project/databases/(default)/documents/users/u1/measurements/m1",
              "fields": {
                "date": {"timestampValue": "2024-03-05T10:00:00Z"},
                "info": {"stringValue": "72.5"},
                "category": {"stringValue": "Peso"}
              }}}]"#,
      )
      .create_async()
      .await;

    let store = FirestoreClient::with_base_url(&test_config(), server.url());
    let measurements =
      fetch_body_measurements(&store, "tok", "u1", MeasurementCategory::Peso)
        .await
        .expect("fetch should succeed");

    mock.assert_async().await;
    assert_eq!(measurements.len(), 1);
    assert_eq!(measurements[0].numeric_value(), Some(72.5));
  }

  #[tokio::test]
  async fn test_fetch_user_activity_walks_each_user() {
    let mut server = mockito::Server::new_async().await;

    let _users_mock = server
      .mock(
        "POST",
        "/v1/projects/test-project/databases/(default)/documents:runQuery",
      )
      .with_status(200)
      .with_body(
        r#"[{"document": {"name": "projects/test-project/databases/(default)/documents/users/u1", "fields": {}}},
            {"document": {"name": "projects/test-project/databases/(default)/documents/users/u2", "fields": {}}}]"#,
      )
      .create_async()
      .await;

    let _u1_mock = server
      .mock(
        "POST",
        "/v1/projects/test-project/databases/(default)/documents/users/u1:runQuery",
      )
      .with_status(200)
      .with_body(
        r#"[{"document": {
              "name": "projects/test-project/databases/(default)/documents/users/u1/training/t1",
              "fields": {"startTime": {"timestampValue": "2024-03-04T18:00:00Z"}}}}]"#,
      )
      .create_async()
      .await;

    let _u2_mock = server
      .mock(
        "POST",
        "/v1/projects/test-project/databases/(default)/documents/users/u2:runQuery",
      )
      .with_status(200)
      .with_body("[]")
      .create_async()
      .await;

    let store = FirestoreClient::with_base_url(&test_config(), server.url());
    let window = ReferenceWindow::new(2024, 2);

    let activity = fetch_user_activity(&store, "tok", &window)
      .await
      .expect("fetch should succeed");

    assert_eq!(activity.len(), 2);
    assert_eq!(activity[0].user_id, "u1");
    assert_eq!(
      activity[0].trainings,
      vec![Utc.with_ymd_and_hms(2024, 3, 4, 18, 0, 0).unwrap()]
    );
    assert!(activity[1].trainings.is_empty());
  }

  #[tokio::test]
  async fn test_fetch_exercise_history_resolves_and_filters() {
    let mut server = mockito::Server::new_async().await;

    // Two sessions: one finished with an added set, one with no endTime
    let _training_mock = server
      .mock(
        "POST",
        "/v1/projects/test-project/databases/(default)/documents/users/u1:runQuery",
      )
      .with_status(200)
      .with_body(
        r#"[{"document": {
              "name": "projects/test-project/databases/(default)/documents/users/u1/training/t1",
              "fields": {
                "endTime": {"timestampValue": "2024-03-04T19:00:00Z"},
                "exercises": {"arrayValue": {"values": [
                  {"mapValue": {"fields": {
                    "exercise": {"referenceValue": "projects/test-project/databases/(default)/documents/exercises/bench"},
                    "reps": {"integerValue": "10"},
                    "series": {"arrayValue": {"values": [
                      {"mapValue": {"fields": {"weight": {"doubleValue": 60.0}, "add": {"booleanValue": true}}}},
                      {"mapValue": {"fields": {"weight": {"doubleValue": 65.0}, "add": {"booleanValue": true}}}}
                    ]}}}}}
                ]}}}}},
            {"document": {
              "name": "projects/test-project/databases/(default)/documents/users/u1/training/t2",
              "fields": {
                "exercises": {"arrayValue": {"values": []}}}}}]"#,
      )
      .create_async()
      .await;

    let _exercise_mock = server
      .mock(
        "GET",
        "/v1/projects/test-project/databases/(default)/documents/exercises/bench",
      )
      .with_status(200)
      .with_body(
        r#"{"name": "projects/test-project/databases/(default)/documents/exercises/bench",
            "fields": {"name": {"stringValue": "Press banca"}}}"#,
      )
      .create_async()
      .await;

    let store = FirestoreClient::with_base_url(&test_config(), server.url());
    let history = fetch_exercise_history(&store, "tok", "u1")
      .await
      .expect("fetch should succeed");

    assert_eq!(history.exercise_list(), vec!["Press banca"]);
    let points = history.points("Press banca").expect("exercise should exist");
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].max_weight, 65.0);
    assert_eq!(points[0].reps, Some(10));
    assert_eq!(points[0].set_count, 2);
  }

  #[tokio::test]
  async fn test_fetch_exercise_history_skips_dangling_references() {
    let mut server = mockito::Server::new_async().await;

    let _training_mock = server
      .mock(
        "POST",
        "/v1/projects/test-project/databases/(default)/documents/users/u1:runQuery",
      )
      .with_status(200)
      .with_body(
        r#"[{"document": {
              "name": "projects/test-project/databases/(default)/documents/users/u1/training/t1",
              "fields": {
                "endTime": {"timestampValue": "2024-03-04T19:00:00Z"},
                "exercises": {"arrayValue": {"values": [
                  {"mapValue": {"fields": {
                    "exercise": {"referenceValue": "projects/test-project/databases/(default)/documents/exercises/gone"},
                    "series": {"arrayValue": {"values": [
                      {"mapValue": {"fields": {"weight": {"doubleValue": 40.0}, "add": {"booleanValue": true}}}}
                    ]}}}}}
                ]}}}}}]"#,
      )
      .create_async()
      .await;

    let _exercise_mock = server
      .mock(
        "GET",
        "/v1/projects/test-project/databases/(default)/documents/exercises/gone",
      )
      .with_status(404)
      .with_body("{}")
      .create_async()
      .await;

    let store = FirestoreClient::with_base_url(&test_config(), server.url());
    let history = fetch_exercise_history(&store, "tok", "u1")
      .await
      .expect("fetch should succeed");

    assert!(history.exercise_list().is_empty());
  }
}
