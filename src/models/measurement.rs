use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::firestore::Document;

/// Measurement categories tracked by the mobile app, with their display units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeasurementCategory {
  Peso,
  Altura,
  Pecho,
  Cintura,
  Cadera,
  Muslo,
  Biceps,
  Pantorrilla,
}

impl MeasurementCategory {
  pub const ALL: [MeasurementCategory; 8] = [
    MeasurementCategory::Peso,
    MeasurementCategory::Altura,
    MeasurementCategory::Pecho,
    MeasurementCategory::Cintura,
    MeasurementCategory::Cadera,
    MeasurementCategory::Muslo,
    MeasurementCategory::Biceps,
    MeasurementCategory::Pantorrilla,
  ];

  /// Category name as stored in measurement documents
  pub fn as_str(&self) -> &'static str {
    match self {
      MeasurementCategory::Peso => "Peso",
      MeasurementCategory::Altura => "Altura",
      MeasurementCategory::Pecho => "Pecho",
      MeasurementCategory::Cintura => "Cintura",
      MeasurementCategory::Cadera => "Cadera",
      MeasurementCategory::Muslo => "Muslo",
      MeasurementCategory::Biceps => "Bíceps",
      MeasurementCategory::Pantorrilla => "Pantorrilla",
    }
  }

  /// Unit shown next to values; weight in kg, everything else in cm
  pub fn unit(&self) -> &'static str {
    match self {
      MeasurementCategory::Peso => "kg",
      _ => "cm",
    }
  }
}

/// One body-measurement reading, as fetched from a user's measurements collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyMeasurement {
  pub date: DateTime<Utc>,
  /// Raw reading; the app stores these as free text ("72.5")
  pub value: String,
  pub category: String,
}

impl BodyMeasurement {
  /// Decode from a store document. A missing or unreadable date falls back to
  /// the current time, matching how the portal has always displayed these.
  pub fn from_document(doc: &Document) -> Self {
    let date = doc.timestamp_field("date").unwrap_or_else(Utc::now);

    let value = doc
      .field("info")
      .and_then(|v| match v.as_str() {
        Some(s) => Some(s.to_string()),
        None => v.as_f64().map(|n| n.to_string()),
      })
      .unwrap_or_default();

    let category = doc.str_field("category").unwrap_or_default().to_string();

    Self { date, value, category }
  }

  /// Numeric reading for charting; None when the text is not a number
  pub fn numeric_value(&self) -> Option<f64> {
    self.value.trim().parse().ok()
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
