//! Weekly activity aggregation
//!
//! Pure bucketing and classification over timestamped records fetched from the
//! store. The admin dashboard charts are projections of these results; nothing
//! here touches the network or holds state.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Fixed number of 7-day buckets per reference window
pub const WEEKS_PER_MONTH: usize = 5;

const SECONDS_PER_WEEK: i64 = 7 * 86_400;

/// ---------------------------------------------------------------------------
/// Reference Window
/// ---------------------------------------------------------------------------

/// The selected (year, month) pair defining a query's time range.
/// Months are zero-indexed (0 = January), as the UI selectors emit them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceWindow {
  pub year: i32,
  pub month: u32,
}

const MONTH_NAMES: [&str; 12] = [
  "enero",
  "febrero",
  "marzo",
  "abril",
  "mayo",
  "junio",
  "julio",
  "agosto",
  "septiembre",
  "octubre",
  "noviembre",
  "diciembre",
];

impl ReferenceWindow {
  pub fn new(year: i32, month: u32) -> Self {
    Self { year, month: month.min(11) }
  }

  /// Window for the current wall-clock month
  pub fn current() -> Self {
    let now = Utc::now();
    Self::new(now.year(), now.month0())
  }

  /// Day 1, 00:00:00 UTC
  pub fn start(&self) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)
      .unwrap_or_default()
      .and_hms_opt(0, 0, 0)
      .unwrap_or_default()
      .and_utc()
  }

  /// Last day of the month, 23:59:59 UTC
  pub fn end(&self) -> DateTime<Utc> {
    let (next_year, next_month) = if self.month == 11 {
      (self.year + 1, 1)
    } else {
      (self.year, self.month + 2)
    };

    let next_start = NaiveDate::from_ymd_opt(next_year, next_month, 1)
      .unwrap_or_default()
      .and_hms_opt(0, 0, 0)
      .unwrap_or_default()
      .and_utc();

    next_start - Duration::seconds(1)
  }

  /// Closed-interval membership: start <= ts <= end
  pub fn contains(&self, ts: DateTime<Utc>) -> bool {
    ts >= self.start() && ts <= self.end()
  }

  /// 7-day slot offset from the start of the window. Negative for timestamps
  /// before the window; callers keep only indices in 0..WEEKS_PER_MONTH.
  /// The maximum in-window offset is 30d 23:59:59, so no in-window timestamp
  /// ever lands past bucket 4.
  pub fn week_index(&self, ts: DateTime<Utc>) -> i64 {
    (ts - self.start()).num_seconds().div_euclid(SECONDS_PER_WEEK)
  }

  /// Display label for the window, e.g. "marzo de 2024"
  pub fn label(&self) -> String {
    format!("{} de {}", MONTH_NAMES[self.month as usize], self.year)
  }
}

/// Default week selection for the weekly summary table: the week containing
/// `today` when it falls inside the window, otherwise the first week
pub fn current_week(today: DateTime<Utc>, window: &ReferenceWindow) -> usize {
  if today.year() == window.year && today.month0() == window.month {
    window
      .week_index(today)
      .clamp(0, WEEKS_PER_MONTH as i64 - 1) as usize
  } else {
    0
  }
}

/// ---------------------------------------------------------------------------
/// Classification
/// ---------------------------------------------------------------------------

/// Three-way label applied to a user's weekly or monthly session count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
  NoTraining,
  OneTraining,
  TwoOrMore,
}

impl Classification {
  pub fn of(session_count: u32) -> Self {
    match session_count {
      0 => Classification::NoTraining,
      1 => Classification::OneTraining,
      _ => Classification::TwoOrMore,
    }
  }
}

/// Users per classification within one bucket (or one whole month)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityCounts {
  pub no_training: u32,
  pub one_training: u32,
  pub two_or_more: u32,
}

impl ActivityCounts {
  pub fn record(&mut self, class: Classification) {
    match class {
      Classification::NoTraining => self.no_training += 1,
      Classification::OneTraining => self.one_training += 1,
      Classification::TwoOrMore => self.two_or_more += 1,
    }
  }

  pub fn total(&self) -> u32 {
    self.no_training + self.one_training + self.two_or_more
  }
}

/// ---------------------------------------------------------------------------
/// Aggregation
/// ---------------------------------------------------------------------------

/// One user's training timestamps within the fetched window
#[derive(Debug, Clone)]
pub struct UserActivity {
  pub user_id: String,
  pub trainings: Vec<DateTime<Utc>>,
}

/// Bucket each user's sessions into the window's five weeks and classify every
/// user in every week. Sessions outside buckets 0..=4 are dropped by the
/// bucketing rule; each bucket's total always equals the number of users.
pub fn weekly_activity(
  users: &[UserActivity],
  window: &ReferenceWindow,
) -> [ActivityCounts; WEEKS_PER_MONTH] {
  let mut weeks = [ActivityCounts::default(); WEEKS_PER_MONTH];

  for user in users {
    let mut sessions_per_week = [0u32; WEEKS_PER_MONTH];

    for ts in &user.trainings {
      let index = window.week_index(*ts);
      if (0..WEEKS_PER_MONTH as i64).contains(&index) {
        sessions_per_week[index as usize] += 1;
      }
    }

    for (week, count) in sessions_per_week.iter().enumerate() {
      weeks[week].record(Classification::of(*count));
    }
  }

  weeks
}

/// Flat monthly rollup: classify each user once by their total session count,
/// ignoring week boundaries
pub fn monthly_activity(users: &[UserActivity]) -> ActivityCounts {
  let mut counts = ActivityCounts::default();

  for user in users {
    counts.record(Classification::of(user.trainings.len() as u32));
  }

  counts
}

/// Registration counts per week for the signups chart
pub fn weekly_registrations(
  timestamps: &[DateTime<Utc>],
  window: &ReferenceWindow,
) -> [u32; WEEKS_PER_MONTH] {
  let mut weeks = [0u32; WEEKS_PER_MONTH];

  for ts in timestamps {
    let index = window.week_index(*ts);
    if (0..WEEKS_PER_MONTH as i64).contains(&index) {
      weeks[index as usize] += 1;
    }
  }

  weeks
}

/// Whether any fetched user has at least one session (the dashboards render a
/// placeholder instead of empty charts when this is false)
pub fn has_any_activity(users: &[UserActivity]) -> bool {
  users.iter().any(|u| !u.trainings.is_empty())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
