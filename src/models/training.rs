use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::firestore::{Document, Value};

/// One recorded set within an exercise entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetEntry {
  pub weight: f64,
  /// Whether the user marked the set as completed; only added sets count
  pub add: bool,
}

/// One exercise performed during a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseEntry {
  /// Reference path to the exercise document (resolved to a name at fetch time)
  pub exercise_ref: Option<String>,
  pub reps: Option<i64>,
  pub series: Vec<SetEntry>,
}

impl ExerciseEntry {
  /// Whether any set in this entry was actually completed
  pub fn has_added_sets(&self) -> bool {
    self.series.iter().any(|s| s.add)
  }

  /// Heaviest completed set, if any
  pub fn max_added_weight(&self) -> Option<f64> {
    self
      .series
      .iter()
      .filter(|s| s.add)
      .map(|s| s.weight)
      .fold(None, |acc, w| match acc {
        Some(m) if m >= w => Some(m),
        _ => Some(w),
      })
  }

  pub fn added_set_count(&self) -> usize {
    self.series.iter().filter(|s| s.add).count()
  }
}

/// One training session from a user's training subcollection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSession {
  pub start_time: Option<DateTime<Utc>>,
  pub end_time: Option<DateTime<Utc>>,
  pub exercises: Vec<ExerciseEntry>,
}

impl TrainingSession {
  pub fn from_document(doc: &Document) -> Self {
    let exercises = doc
      .field("exercises")
      .and_then(Value::as_array)
      .map(|entries| entries.iter().filter_map(decode_exercise).collect())
      .unwrap_or_default();

    Self {
      start_time: doc.timestamp_field("startTime"),
      end_time: doc.timestamp_field("endTime"),
      exercises,
    }
  }
}

fn decode_exercise(value: &Value) -> Option<ExerciseEntry> {
  let fields = value.as_map()?;

  let series = fields
    .get("series")
    .and_then(Value::as_array)
    .map(|sets| {
      sets
        .iter()
        .filter_map(|set| {
          let set_fields = set.as_map()?;
          Some(SetEntry {
            weight: set_fields.get("weight").and_then(Value::as_f64)?,
            add: set_fields.get("add").and_then(Value::as_bool).unwrap_or(false),
          })
        })
        .collect()
    })
    .unwrap_or_default();

  Some(ExerciseEntry {
    exercise_ref: fields
      .get("exercise")
      .and_then(Value::as_reference)
      .map(String::from),
    reps: fields.get("reps").and_then(Value::as_i64),
    series,
  })
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
