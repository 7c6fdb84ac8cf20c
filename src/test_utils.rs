//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Seeders and mock data factories
//! - Mock stores
//! - Date helpers
//! - Helper assertions

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use sqlx::SqlitePool;

use async_trait::async_trait;

use crate::error::{Result, TrackerError};
use crate::models::{
  GoalKind, GoalRecord, GoalUpdate, GoalWindow, NewGoal, NewWorkout, ProfileData,
  ProfilePreferences, ProfileUpdate, Theme, UserProfile, WorkoutRecord, WorkoutUpdate,
};
use crate::store::{ChangeFeed, MemoryStore, RecordStore};

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// Seed workouts for `owner_id`, one per day going back from today.
/// Returns the IDs of created workouts, newest first
pub async fn seed_test_workouts(pool: &SqlitePool, owner_id: &str, count: usize) -> Vec<i64> {
  let mut workout_ids = Vec::new();
  let now = Utc::now();

  for i in 0..count {
    let workout_type = if i % 2 == 0 { "Run" } else { "Ride" };
    let created_at = now - Duration::days(i as i64);
    let distance = if workout_type == "Run" { Some(8.0) } else { None };

    let result = sqlx::query(
      r#"
      INSERT INTO workouts (
        owner_id, workout_type, duration_minutes, distance_km, date,
        created_at, updated_at
      )
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
      "#,
    )
    .bind(owner_id)
    .bind(workout_type)
    .bind(45 + i as i64)
    .bind(distance)
    .bind(created_at.date_naive().to_string())
    .bind(created_at)
    .execute(pool)
    .await
    .expect("Failed to insert test workout");

    workout_ids.push(result.last_insert_rowid());
  }

  workout_ids
}

/// Seed a small set of goals for `owner_id`
pub async fn seed_test_goals(pool: &SqlitePool, owner_id: &str) -> Vec<i64> {
  let goals = vec![
    ("Weekly minutes", "300 minutes this week", GoalKind::Duration, 300.0, Some(GoalWindow::CurrentWeek)),
    ("Monthly runs", "12 Läufe diesen Monat", GoalKind::Count, 12.0, None),
    ("Distance block", "50 km in 30 days", GoalKind::Distance, 50.0, Some(GoalWindow::Last30Days)),
  ];

  let mut ids = Vec::new();
  let now = Utc::now();

  for (offset, (title, description, kind, target, window)) in goals.into_iter().enumerate() {
    let result = sqlx::query(
      r#"
      INSERT INTO goals (
        owner_id, title, description, emoji, kind, target_value,
        current_value, active, completed, window_kind, created_at, updated_at
      )
      VALUES (?1, ?2, ?3, '🎯', ?4, ?5, 0, 1, 0, ?6, ?7, ?7)
      "#,
    )
    .bind(owner_id)
    .bind(title)
    .bind(description)
    .bind(kind.to_string())
    .bind(target)
    .bind(window.map(|w| w.to_string()))
    .bind(now - Duration::minutes(offset as i64))
    .execute(pool)
    .await
    .expect("Failed to seed goal");

    ids.push(result.last_insert_rowid());
  }

  ids
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

static NEXT_MOCK_ID: AtomicI64 = AtomicI64::new(1);

/// Create a mock workout record for testing
pub fn mock_workout(
  workout_type: &str,
  duration_minutes: i64,
  created_at: Option<DateTime<Utc>>,
) -> WorkoutRecord {
  WorkoutRecord {
    id: NEXT_MOCK_ID.fetch_add(1, Ordering::Relaxed),
    owner_id: "test-user".to_string(),
    workout_type: workout_type.to_string(),
    category: None,
    duration_minutes: Some(duration_minutes),
    distance_km: None,
    date: None,
    notes: None,
    training_type: None,
    sets: None,
    reps: None,
    created_at,
    updated_at: created_at,
  }
}

/// Mock workout stamped at a local wall-clock time.
/// Pair with a UTC-offset clock such as `FixedClock::at_local`
pub fn workout_at(workout_type: &str, duration_minutes: i64, local: NaiveDateTime) -> WorkoutRecord {
  mock_workout(workout_type, duration_minutes, Some(local.and_utc()))
}

/// Create a mock goal creation request for testing
pub fn mock_new_goal(kind: GoalKind, target_value: f64, description: &str) -> NewGoal {
  NewGoal {
    title: format!("{} goal", kind),
    description: description.to_string(),
    emoji: "🎯".to_string(),
    kind,
    target_value,
    current_value: 0.0,
    active: true,
    window: None,
    deadline: None,
    category: None,
  }
}

/// Create a mock stored goal for testing
pub fn mock_goal(id: i64, kind: GoalKind, target_value: f64, description: &str) -> GoalRecord {
  let new_goal = mock_new_goal(kind, target_value, description);
  GoalRecord {
    id,
    owner_id: "test-user".to_string(),
    title: new_goal.title,
    description: new_goal.description,
    emoji: new_goal.emoji,
    kind,
    target_value,
    current_value: 0.0,
    active: true,
    completed: false,
    window: None,
    deadline: None,
    category: None,
    created_at: Some(Utc::now()),
    updated_at: Some(Utc::now()),
  }
}

/// Create mock profile data for testing
pub fn mock_profile_data() -> ProfileData {
  ProfileData {
    name: "Alex Rivera".to_string(),
    email: "alex@example.com".to_string(),
    avatar: None,
    member_since: "2023".to_string(),
    preferences: ProfilePreferences {
      weekly_goal: Some(5),
      notifications: Some(true),
      theme: Some(Theme::Dark),
    },
  }
}

/// ---------------------------------------------------------------------------
/// Time Helpers
/// ---------------------------------------------------------------------------

/// Local wall-clock date-time
pub fn local_datetime(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
  NaiveDate::from_ymd_opt(year, month, day)
    .and_then(|d| d.and_hms_opt(hour, minute, 0))
    .expect("Invalid test date")
}

/// Create a DateTime N days ago from now
pub fn datetime_days_ago(days: i64) -> DateTime<Utc> {
  Utc::now() - Duration::days(days)
}

/// ---------------------------------------------------------------------------
/// Mock Stores
/// ---------------------------------------------------------------------------

/// In-memory store whose goal writes fail for one goal id, as if the backend
/// dropped that request
pub struct FlakyGoalStore {
  pub inner: MemoryStore,
  pub failing_goal_id: i64,
}

#[async_trait]
impl RecordStore for FlakyGoalStore {
  async fn fetch_workouts(&self, owner_id: &str) -> Result<Vec<WorkoutRecord>> {
    self.inner.fetch_workouts(owner_id).await
  }
  async fn create_workout(&self, owner_id: &str, workout: NewWorkout) -> Result<i64> {
    self.inner.create_workout(owner_id, workout).await
  }
  async fn update_workout(&self, id: i64, update: WorkoutUpdate) -> Result<()> {
    self.inner.update_workout(id, update).await
  }
  async fn delete_workout(&self, id: i64) -> Result<()> {
    self.inner.delete_workout(id).await
  }

  async fn fetch_goals(&self, owner_id: &str) -> Result<Vec<GoalRecord>> {
    self.inner.fetch_goals(owner_id).await
  }
  async fn create_goal(&self, owner_id: &str, goal: NewGoal) -> Result<i64> {
    self.inner.create_goal(owner_id, goal).await
  }
  async fn update_goal(&self, id: i64, update: GoalUpdate) -> Result<()> {
    if id == self.failing_goal_id {
      return Err(TrackerError::BackendUnavailable("connection reset".to_string()));
    }
    self.inner.update_goal(id, update).await
  }
  async fn delete_goal(&self, id: i64) -> Result<()> {
    self.inner.delete_goal(id).await
  }

  async fn fetch_weekly_goal(&self, owner_id: &str) -> Result<Option<i64>> {
    self.inner.fetch_weekly_goal(owner_id).await
  }
  async fn save_weekly_goal(&self, owner_id: &str, weekly_goal: i64) -> Result<()> {
    self.inner.save_weekly_goal(owner_id, weekly_goal).await
  }

  async fn fetch_profile(&self, owner_id: &str) -> Result<Option<UserProfile>> {
    self.inner.fetch_profile(owner_id).await
  }
  async fn save_profile(&self, owner_id: &str, data: ProfileData) -> Result<()> {
    self.inner.save_profile(owner_id, data).await
  }
  async fn update_profile(&self, owner_id: &str, update: ProfileUpdate) -> Result<()> {
    self.inner.update_profile(owner_id, update).await
  }

  fn changes(&self) -> &ChangeFeed {
    self.inner.changes()
  }
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = ($left - $right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('workouts', 'goals', 'user_settings', 'user_profiles')"
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 4, "Expected 4 tables, got {}", tables.len());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_seed_workouts_returns_correct_count() {
    let pool = setup_test_db().await;

    let ids = seed_test_workouts(&pool, "u1", 5).await;
    assert_eq!(ids.len(), 5);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workouts WHERE owner_id = 'u1'")
      .fetch_one(&pool)
      .await
      .expect("Failed to count workouts");

    assert_eq!(count, 5);

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_mock_factories_create_valid_data() {
    let workout = mock_workout("Run", 30, None);
    assert_eq!(workout.workout_type, "Run");
    assert_eq!(workout.duration(), 30);
    assert_ne!(workout.id, mock_workout("Run", 30, None).id);

    assert!(mock_new_goal(GoalKind::Count, 3.0, "3 runs").validate().is_ok());
    assert!(!mock_goal(1, GoalKind::Count, 3.0, "3 runs").completed);
  }

  #[test]
  fn test_datetime_helpers_produce_correct_dates() {
    let past = datetime_days_ago(7);
    let diff = Utc::now() - past;
    // Allow for slight timing differences (6-8 days is acceptable)
    assert!(diff.num_days() >= 6 && diff.num_days() <= 8,
            "Expected ~7 days difference, got {}", diff.num_days());

    assert_eq!(local_datetime(2024, 2, 29, 6, 30).to_string(), "2024-02-29 06:30:00");
  }
}
