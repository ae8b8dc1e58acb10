//! Client for the hosted document store (Firestore REST API)
//!
//! The portal never runs queries locally. Views describe what they need as a
//! `StructuredQuery` value object and this module ships it to the store's
//! `runQuery` endpoint, decoding the returned documents into `Value` trees.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::PortalConfig;

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

const FIRESTORE_API_BASE: &str = "https://firestore.googleapis.com";

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  #[error("HTTP request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("Store API error: {0}")]
  Api(String),

  #[error("Failed to decode document: {0}")]
  Decode(String),

  #[error("Not authenticated with the document store")]
  NotAuthenticated,
}

impl Serialize for StoreError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Wire Values
/// ---------------------------------------------------------------------------

/// A single field value in the store's wire encoding.
///
/// Integers travel as strings and timestamps as RFC 3339 text; the accessors
/// below are tolerant of the encodings the mobile app actually writes (some
/// measurement dates are plain strings, some numeric fields are strings).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
  NullValue(Option<()>),
  BooleanValue(bool),
  IntegerValue(String),
  DoubleValue(f64),
  TimestampValue(DateTime<Utc>),
  StringValue(String),
  ReferenceValue(String),
  MapValue {
    #[serde(default)]
    fields: BTreeMap<String, Value>,
  },
  ArrayValue {
    #[serde(default)]
    values: Vec<Value>,
  },
}

impl Value {
  pub fn string(s: impl Into<String>) -> Self {
    Value::StringValue(s.into())
  }

  pub fn integer(i: i64) -> Self {
    Value::IntegerValue(i.to_string())
  }

  pub fn double(d: f64) -> Self {
    Value::DoubleValue(d)
  }

  pub fn boolean(b: bool) -> Self {
    Value::BooleanValue(b)
  }

  pub fn timestamp(ts: DateTime<Utc>) -> Self {
    Value::TimestampValue(ts)
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::StringValue(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      Value::BooleanValue(b) => Some(*b),
      _ => None,
    }
  }

  pub fn as_i64(&self) -> Option<i64> {
    match self {
      Value::IntegerValue(s) => s.parse().ok(),
      Value::DoubleValue(d) => Some(*d as i64),
      _ => None,
    }
  }

  pub fn as_f64(&self) -> Option<f64> {
    match self {
      Value::DoubleValue(d) => Some(*d),
      Value::IntegerValue(s) => s.parse().ok(),
      Value::StringValue(s) => s.parse().ok(),
      _ => None,
    }
  }

  /// Timestamp, also accepting RFC 3339 text (the app stores some dates as strings)
  pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
    match self {
      Value::TimestampValue(ts) => Some(*ts),
      Value::StringValue(s) => DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc)),
      _ => None,
    }
  }

  pub fn as_reference(&self) -> Option<&str> {
    match self {
      Value::ReferenceValue(path) => Some(path),
      _ => None,
    }
  }

  pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
    match self {
      Value::MapValue { fields } => Some(fields),
      _ => None,
    }
  }

  pub fn as_array(&self) -> Option<&[Value]> {
    match self {
      Value::ArrayValue { values } => Some(values),
      _ => None,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Documents
/// ---------------------------------------------------------------------------

/// A decoded document from the store
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
  /// Full resource name: projects/{p}/databases/(default)/documents/{path}
  pub name: String,
  #[serde(default)]
  pub fields: BTreeMap<String, Value>,
}

impl Document {
  /// Document ID: the last segment of the resource name
  pub fn id(&self) -> &str {
    self.name.rsplit('/').next().unwrap_or(&self.name)
  }

  pub fn field(&self, name: &str) -> Option<&Value> {
    self.fields.get(name)
  }

  pub fn str_field(&self, name: &str) -> Option<&str> {
    self.field(name).and_then(Value::as_str)
  }

  pub fn timestamp_field(&self, name: &str) -> Option<DateTime<Utc>> {
    self.field(name).and_then(Value::as_timestamp)
  }
}

/// ---------------------------------------------------------------------------
/// Structured Queries
/// ---------------------------------------------------------------------------

/// Declarative filter/sort/limit specification for one collection.
///
/// Mirrors the store's query API: equality predicates, closed-interval
/// timestamp ranges, descending order, and a result cap.
#[derive(Debug, Clone)]
pub struct StructuredQuery {
  collection_id: String,
  filters: Vec<FieldFilter>,
  order_by: Vec<Order>,
  limit: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldFilter {
  field: FieldReference,
  op: &'static str,
  value: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldReference {
  field_path: String,
}

#[derive(Debug, Clone, Serialize)]
struct Order {
  field: FieldReference,
  direction: &'static str,
}

impl StructuredQuery {
  pub fn collection(id: impl Into<String>) -> Self {
    Self {
      collection_id: id.into(),
      filters: Vec::new(),
      order_by: Vec::new(),
      limit: None,
    }
  }

  pub fn where_eq(mut self, field: &str, value: Value) -> Self {
    self.filters.push(FieldFilter {
      field: FieldReference { field_path: field.into() },
      op: "EQUAL",
      value,
    });
    self
  }

  pub fn where_at_least(mut self, field: &str, value: Value) -> Self {
    self.filters.push(FieldFilter {
      field: FieldReference { field_path: field.into() },
      op: "GREATER_THAN_OR_EQUAL",
      value,
    });
    self
  }

  pub fn where_at_most(mut self, field: &str, value: Value) -> Self {
    self.filters.push(FieldFilter {
      field: FieldReference { field_path: field.into() },
      op: "LESS_THAN_OR_EQUAL",
      value,
    });
    self
  }

  /// Closed-interval timestamp range: field >= start && field <= end
  pub fn where_between(self, field: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
    self
      .where_at_least(field, Value::timestamp(start))
      .where_at_most(field, Value::timestamp(end))
  }

  pub fn order_by_desc(mut self, field: &str) -> Self {
    self.order_by.push(Order {
      field: FieldReference { field_path: field.into() },
      direction: "DESCENDING",
    });
    self
  }

  pub fn limit(mut self, n: i32) -> Self {
    self.limit = Some(n);
    self
  }
}

impl Serialize for StructuredQuery {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    enum Filter<'a> {
      CompositeFilter(Composite<'a>),
      FieldFilter(&'a FieldFilter),
    }

    #[derive(Serialize)]
    struct Composite<'a> {
      op: &'static str,
      filters: Vec<Filter<'a>>,
    }

    #[derive(Serialize)]
    struct Selector<'a> {
      #[serde(rename = "collectionId")]
      collection_id: &'a str,
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Wire<'a> {
      from: [Selector<'a>; 1],
      #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
      filter: Option<Filter<'a>>,
      #[serde(skip_serializing_if = "<[Order]>::is_empty")]
      order_by: &'a [Order],
      #[serde(skip_serializing_if = "Option::is_none")]
      limit: Option<i32>,
    }

    // A single predicate goes on the wire bare; two or more get AND-composed
    let filter = match self.filters.len() {
      0 => None,
      1 => Some(Filter::FieldFilter(&self.filters[0])),
      _ => Some(Filter::CompositeFilter(Composite {
        op: "AND",
        filters: self.filters.iter().map(Filter::FieldFilter).collect(),
      })),
    };

    Wire {
      from: [Selector { collection_id: &self.collection_id }],
      filter,
      order_by: &self.order_by,
      limit: self.limit,
    }
    .serialize(serializer)
  }
}

/// ---------------------------------------------------------------------------
/// Store Client
/// ---------------------------------------------------------------------------

/// One element of a runQuery response; trailing elements carry only a readTime
#[derive(Debug, Deserialize)]
struct RunQueryResult {
  #[serde(default)]
  document: Option<Document>,
}

pub struct FirestoreClient {
  http: Client,
  base_url: String,
  project_id: String,
}

impl FirestoreClient {
  pub fn new(config: &PortalConfig) -> Self {
    Self {
      http: Client::new(),
      base_url: FIRESTORE_API_BASE.to_string(),
      project_id: config.project_id.clone(),
    }
  }

  /// Point the client at a different host (used by tests)
  pub fn with_base_url(config: &PortalConfig, base_url: impl Into<String>) -> Self {
    Self {
      http: Client::new(),
      base_url: base_url.into(),
      project_id: config.project_id.clone(),
    }
  }

  fn documents_root(&self) -> String {
    format!("projects/{}/databases/(default)/documents", self.project_id)
  }

  /// Run a structured query against a top-level collection (`parent` = None)
  /// or a subcollection of the given document path (e.g. "users/{id}")
  pub async fn run_query(
    &self,
    id_token: &str,
    parent: Option<&str>,
    query: &StructuredQuery,
  ) -> Result<Vec<Document>, StoreError> {
    let parent_path = match parent {
      Some(p) => format!("{}/{}", self.documents_root(), p),
      None => self.documents_root(),
    };
    let url = format!("{}/v1/{}:runQuery", self.base_url, parent_path);

    let response = self
      .http
      .post(&url)
      .bearer_auth(id_token)
      .json(&serde_json::json!({ "structuredQuery": query }))
      .send()
      .await?;

    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
      return Err(StoreError::NotAuthenticated);
    }

    if !status.is_success() {
      let error_text = response.text().await.unwrap_or_default();
      return Err(StoreError::Api(format!(
        "Query failed with {}: {}",
        status, error_text
      )));
    }

    let response_text = response.text().await?;
    let results: Vec<RunQueryResult> = serde_json::from_str(&response_text).map_err(|e| {
      log::warn!(
        "Failed to parse query response: {} (first 500 chars: {})",
        e,
        &response_text[..response_text.len().min(500)]
      );
      StoreError::Decode(e.to_string())
    })?;

    Ok(results.into_iter().filter_map(|r| r.document).collect())
  }

  /// Fetch a single document by path. Accepts either a full resource name
  /// (as found in reference values) or a path relative to the documents root.
  /// A missing document is not an error.
  pub async fn get_document(
    &self,
    id_token: &str,
    path: &str,
  ) -> Result<Option<Document>, StoreError> {
    let name = if path.starts_with("projects/") {
      path.to_string()
    } else {
      format!("{}/{}", self.documents_root(), path)
    };
    let url = format!("{}/v1/{}", self.base_url, name);

    let response = self.http.get(&url).bearer_auth(id_token).send().await?;

    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
      return Err(StoreError::NotAuthenticated);
    }

    if status == reqwest::StatusCode::NOT_FOUND {
      return Ok(None);
    }

    if !status.is_success() {
      let error_text = response.text().await.unwrap_or_default();
      return Err(StoreError::Api(format!(
        "Document fetch failed with {}: {}",
        status, error_text
      )));
    }

    Ok(Some(response.json().await?))
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
