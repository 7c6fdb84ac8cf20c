use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WorkoutRecord {
  pub id: i64,
  pub owner_id: String,
  pub workout_type: String,
  pub category: Option<String>,
  pub duration_minutes: Option<i64>,
  pub distance_km: Option<f64>,
  /// User-supplied date string; `created_at` wins when both are set
  pub date: Option<String>,
  pub notes: Option<String>,
  pub training_type: Option<String>,
  pub sets: Option<i64>,
  pub reps: Option<i64>,
  pub created_at: Option<DateTime<Utc>>,
  pub updated_at: Option<DateTime<Utc>>,
}

impl WorkoutRecord {
  /// Classification label: category when set, otherwise the type
  pub fn label(&self) -> &str {
    match self.category.as_deref() {
      Some(category) if !category.is_empty() => category,
      _ => &self.workout_type,
    }
  }

  /// Duration in minutes, 0 when missing or negative
  pub fn duration(&self) -> i64 {
    self.duration_minutes.unwrap_or(0).max(0)
  }

  pub fn distance(&self) -> f64 {
    self.distance_km.filter(|d| d.is_finite() && *d > 0.0).unwrap_or(0.0)
  }

  /// Local wall-clock time the workout happened, if it can be determined
  pub fn local_time(&self, clock: &dyn Clock) -> Option<NaiveDateTime> {
    if let Some(created_at) = self.created_at {
      return Some(clock.to_local(created_at));
    }
    parse_workout_date(self.date.as_deref()?, clock)
  }
}

/// Parse a user-supplied workout date.
///
/// RFC 3339 timestamps are converted to local time; naive date-times and
/// plain dates are taken as local wall-clock values (dates at midnight).
pub fn parse_workout_date(raw: &str, clock: &dyn Clock) -> Option<NaiveDateTime> {
  let raw = raw.trim();
  if raw.is_empty() {
    return None;
  }

  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return Some(clock.to_local(dt.with_timezone(&Utc)));
  }

  const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
  ];
  for fmt in NAIVE_FORMATS {
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
      return Some(dt);
    }
  }

  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .ok()
    .map(crate::calendar::midnight)
}

/// For inserting new workouts (without id, owner, timestamps)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewWorkout {
  pub workout_type: String,
  pub category: Option<String>,
  pub duration_minutes: Option<i64>,
  pub distance_km: Option<f64>,
  pub date: Option<String>,
  pub notes: Option<String>,
  pub training_type: Option<String>,
  pub sets: Option<i64>,
  pub reps: Option<i64>,
}

/// Partial update; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkoutUpdate {
  pub workout_type: Option<String>,
  pub category: Option<String>,
  pub duration_minutes: Option<i64>,
  pub distance_km: Option<f64>,
  pub date: Option<String>,
  pub notes: Option<String>,
}

impl WorkoutUpdate {
  pub fn apply(&self, record: &mut WorkoutRecord) {
    if let Some(workout_type) = &self.workout_type {
      record.workout_type = workout_type.clone();
    }
    if let Some(category) = &self.category {
      record.category = Some(category.clone());
    }
    if let Some(duration) = self.duration_minutes {
      record.duration_minutes = Some(duration);
    }
    if let Some(distance) = self.distance_km {
      record.distance_km = Some(distance);
    }
    if let Some(date) = &self.date {
      record.date = Some(date.clone());
    }
    if let Some(notes) = &self.notes {
      record.notes = Some(notes.clone());
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::clock::FixedClock;
  use chrono::{FixedOffset, TimeZone};

  fn record() -> WorkoutRecord {
    crate::test_utils::mock_workout("Run", 30, None)
  }

  #[test]
  fn test_label_prefers_non_empty_category() {
    let mut w = record();
    assert_eq!(w.label(), "Run");

    w.category = Some("cardio".to_string());
    assert_eq!(w.label(), "cardio");

    w.category = Some(String::new());
    assert_eq!(w.label(), "Run");
  }

  #[test]
  fn test_duration_defaults_to_zero() {
    let mut w = record();
    w.duration_minutes = None;
    assert_eq!(w.duration(), 0);
    w.duration_minutes = Some(-5);
    assert_eq!(w.duration(), 0);
  }

  #[test]
  fn test_created_at_wins_over_date_string() {
    let clock = FixedClock::utc(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
    let mut w = record();
    w.created_at = Some(Utc.with_ymd_and_hms(2024, 4, 20, 18, 0, 0).unwrap());
    w.date = Some("2024-01-01".to_string());

    let local = w.local_time(&clock).unwrap();
    assert_eq!(local.date(), NaiveDate::from_ymd_opt(2024, 4, 20).unwrap());
  }

  #[test]
  fn test_date_string_formats() {
    let clock = FixedClock::new(
      Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
      FixedOffset::east_opt(2 * 3600).unwrap(),
    );

    let plain = parse_workout_date("2024-04-03", &clock).unwrap();
    assert_eq!(plain.to_string(), "2024-04-03 00:00:00");

    let naive = parse_workout_date("2024-04-03T06:45", &clock).unwrap();
    assert_eq!(naive.to_string(), "2024-04-03 06:45:00");

    // RFC 3339 instants are shifted into local time
    let zoned = parse_workout_date("2024-04-03T23:30:00Z", &clock).unwrap();
    assert_eq!(zoned.to_string(), "2024-04-04 01:30:00");

    assert!(parse_workout_date("yesterday", &clock).is_none());
    assert!(parse_workout_date("  ", &clock).is_none());
  }

  #[test]
  fn test_update_only_touches_set_fields() {
    let mut w = record();
    WorkoutUpdate {
      duration_minutes: Some(45),
      notes: Some("felt good".to_string()),
      ..Default::default()
    }
    .apply(&mut w);

    assert_eq!(w.duration_minutes, Some(45));
    assert_eq!(w.notes.as_deref(), Some("felt good"));
    assert_eq!(w.workout_type, "Run");
  }
}
