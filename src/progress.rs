//! Chart and table projections
//!
//! The store returns histories newest first; charts draw oldest first, left to
//! right. Everything here is derived data: label/value arrays for the chart
//! libraries and exact click-index resolution back to the source record.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::activity::{ActivityCounts, WEEKS_PER_MONTH};
use crate::models::{BodyMeasurement, MeasurementCategory};

/// X-axis labels for the weekly admin charts
pub const WEEK_LABELS: [&str; WEEKS_PER_MONTH] =
  ["Semana 1", "Semana 2", "Semana 3", "Semana 4", "Semana 5"];

/// Date label format used across the portal (es-ES, dd/mm/yyyy)
pub fn format_date(date: DateTime<Utc>) -> String {
  date.format("%d/%m/%Y").to_string()
}

/// ---------------------------------------------------------------------------
/// Measurement Chart
/// ---------------------------------------------------------------------------

/// Chart-ready series for one measurement category, oldest first
#[derive(Debug, Clone, Serialize)]
pub struct MeasurementSeries {
  pub labels: Vec<String>,
  /// Non-numeric readings chart as NaN, keeping label/value alignment
  pub values: Vec<f64>,
}

impl MeasurementSeries {
  /// Build from newest-first fetch results, reversing for display
  pub fn build(measurements: &[BodyMeasurement]) -> Self {
    Self {
      labels: measurements
        .iter()
        .rev()
        .map(|m| format_date(m.date))
        .collect(),
      values: measurements
        .iter()
        .rev()
        .map(|m| m.numeric_value().unwrap_or(f64::NAN))
        .collect(),
    }
  }
}

/// Detail card for a clicked chart point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedPoint {
  pub date: String,
  pub value: String,
  pub label: String,
  pub unit: &'static str,
}

/// Resolve a chart click back to the source record. The chart is drawn
/// reversed, so rendered index i maps to records[len - 1 - i].
pub fn select_measurement_point(
  measurements: &[BodyMeasurement],
  category: MeasurementCategory,
  chart_index: usize,
) -> Option<SelectedPoint> {
  let reversed_index = measurements.len().checked_sub(1 + chart_index)?;
  let measurement = measurements.get(reversed_index)?;

  Some(SelectedPoint {
    date: format_date(measurement.date),
    value: measurement.value.clone(),
    label: category.as_str().to_string(),
    unit: category.unit(),
  })
}

/// ---------------------------------------------------------------------------
/// Exercise Progress
/// ---------------------------------------------------------------------------

/// One charted point for an exercise: the heaviest completed set of a session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExercisePoint {
  pub date: DateTime<Utc>,
  pub max_weight: f64,
  pub reps: Option<i64>,
  pub set_count: usize,
}

/// Per-exercise progress points, newest first within each exercise
#[derive(Debug, Default)]
pub struct ExerciseHistory {
  data: BTreeMap<String, Vec<ExercisePoint>>,
}

impl ExerciseHistory {
  pub fn push(&mut self, exercise: &str, point: ExercisePoint) {
    self.data.entry(exercise.to_string()).or_default().push(point);
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  /// All exercise names, sorted
  pub fn exercise_list(&self) -> Vec<&str> {
    self.data.keys().map(String::as_str).collect()
  }

  /// Case-insensitive substring filter over the exercise list
  pub fn filtered_list(&self, search_term: &str) -> Vec<&str> {
    let term = search_term.to_lowercase();
    self
      .exercise_list()
      .into_iter()
      .filter(|name| name.to_lowercase().contains(&term))
      .collect()
  }

  pub fn points(&self, exercise: &str) -> Option<&[ExercisePoint]> {
    self.data.get(exercise).map(Vec::as_slice)
  }

  /// Chart series for one exercise, oldest first
  pub fn series(&self, exercise: &str) -> (Vec<String>, Vec<f64>) {
    match self.points(exercise) {
      Some(points) => (
        points.iter().rev().map(|p| format_date(p.date)).collect(),
        points.iter().rev().map(|p| p.max_weight).collect(),
      ),
      None => (Vec::new(), Vec::new()),
    }
  }

  /// Same reversal-exact click resolution as the measurement chart
  pub fn select_point(&self, exercise: &str, chart_index: usize) -> Option<&ExercisePoint> {
    let points = self.points(exercise)?;
    points.get(points.len().checked_sub(1 + chart_index)?)
  }
}

/// ---------------------------------------------------------------------------
/// Weekly Activity Chart
/// ---------------------------------------------------------------------------

/// Stacked-bar datasets for the admin activity chart, one value per week
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityDatasets {
  pub no_training: Vec<u32>,
  pub one_training: Vec<u32>,
  pub two_or_more: Vec<u32>,
}

pub fn activity_datasets(weeks: &[ActivityCounts; WEEKS_PER_MONTH]) -> ActivityDatasets {
  ActivityDatasets {
    no_training: weeks.iter().map(|w| w.no_training).collect(),
    one_training: weeks.iter().map(|w| w.one_training).collect(),
    two_or_more: weeks.iter().map(|w| w.two_or_more).collect(),
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
