use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, info};

use super::{require_owner, ChangeFeed, Collection, RecordStore};
use crate::db::DbPool;
use crate::error::{Result, TrackerError};
use crate::models::{
  GoalKind, GoalRecord, GoalUpdate, GoalWindow, NewGoal, NewWorkout, ProfileData,
  ProfilePreferences, ProfileUpdate, Theme, UserProfile, WorkoutRecord, WorkoutUpdate,
};

/// Record store backed by the SQLite pool
pub struct SqliteStore {
  pool: DbPool,
  feed: ChangeFeed,
}

impl SqliteStore {
  pub fn new(pool: DbPool) -> Self {
    Self {
      pool,
      feed: ChangeFeed::default(),
    }
  }

  pub fn pool(&self) -> &DbPool {
    &self.pool
  }

  async fn workout_owner(&self, id: i64) -> Result<String> {
    sqlx::query_scalar::<_, String>("SELECT owner_id FROM workouts WHERE id = ?1")
      .bind(id)
      .fetch_optional(&self.pool)
      .await?
      .ok_or_else(|| TrackerError::not_found("Workout", id))
  }

  async fn goal_owner(&self, id: i64) -> Result<String> {
    sqlx::query_scalar::<_, String>("SELECT owner_id FROM goals WHERE id = ?1")
      .bind(id)
      .fetch_optional(&self.pool)
      .await?
      .ok_or_else(|| TrackerError::not_found("Goal", id))
  }
}

fn goal_from_row(row: &SqliteRow) -> Result<GoalRecord> {
  let kind: String = row.try_get("kind")?;
  let window: Option<String> = row.try_get("window_kind")?;

  Ok(GoalRecord {
    id: row.try_get("id")?,
    owner_id: row.try_get("owner_id")?,
    title: row.try_get("title")?,
    description: row.try_get("description")?,
    emoji: row.try_get("emoji")?,
    kind: kind.parse::<GoalKind>()?,
    target_value: row.try_get("target_value")?,
    current_value: row.try_get("current_value")?,
    active: row.try_get("active")?,
    completed: row.try_get("completed")?,
    window: window.map(|w| w.parse::<GoalWindow>()).transpose()?,
    deadline: row.try_get::<Option<DateTime<Utc>>, _>("deadline")?,
    category: row.try_get("category")?,
    created_at: row.try_get::<Option<DateTime<Utc>>, _>("created_at")?,
    updated_at: row.try_get::<Option<DateTime<Utc>>, _>("updated_at")?,
  })
}

fn profile_from_row(row: &SqliteRow) -> Result<UserProfile> {
  let theme: Option<String> = row.try_get("theme")?;

  Ok(UserProfile {
    owner_id: row.try_get("owner_id")?,
    name: row.try_get("name")?,
    email: row.try_get("email")?,
    avatar: row.try_get("avatar")?,
    member_since: row.try_get("member_since")?,
    preferences: ProfilePreferences {
      weekly_goal: row.try_get("weekly_goal")?,
      notifications: row.try_get("notifications")?,
      theme: theme.map(|t| t.parse::<Theme>()).transpose()?,
    },
    created_at: row.try_get::<Option<DateTime<Utc>>, _>("created_at")?,
    updated_at: row.try_get::<Option<DateTime<Utc>>, _>("updated_at")?,
  })
}

#[async_trait]
impl RecordStore for SqliteStore {
  async fn fetch_workouts(&self, owner_id: &str) -> Result<Vec<WorkoutRecord>> {
    let owner_id = require_owner(owner_id)?;
    let workouts = sqlx::query_as::<_, WorkoutRecord>(
      r#"
      SELECT
        id, owner_id, workout_type, category, duration_minutes,
        CAST(distance_km AS REAL) AS distance_km, date, notes,
        training_type, sets, reps, created_at, updated_at
      FROM workouts
      WHERE owner_id = ?1
      ORDER BY created_at DESC, id DESC
      "#,
    )
    .bind(owner_id)
    .fetch_all(&self.pool)
    .await?;

    debug!(owner_id, count = workouts.len(), "Fetched workouts");
    Ok(workouts)
  }

  async fn create_workout(&self, owner_id: &str, workout: NewWorkout) -> Result<i64> {
    let owner_id = require_owner(owner_id)?;
    let now = Utc::now();

    let result = sqlx::query(
      r#"
      INSERT INTO workouts (
        owner_id, workout_type, category, duration_minutes, distance_km,
        date, notes, training_type, sets, reps, created_at, updated_at
      )
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
      "#,
    )
    .bind(owner_id)
    .bind(&workout.workout_type)
    .bind(&workout.category)
    .bind(workout.duration_minutes)
    .bind(workout.distance_km)
    .bind(&workout.date)
    .bind(&workout.notes)
    .bind(&workout.training_type)
    .bind(workout.sets)
    .bind(workout.reps)
    .bind(now)
    .execute(&self.pool)
    .await?;

    let id = result.last_insert_rowid();
    info!(owner_id, workout_id = id, "Workout added");
    self.feed.publish(owner_id, Collection::Workouts);
    Ok(id)
  }

  async fn update_workout(&self, id: i64, update: WorkoutUpdate) -> Result<()> {
    let owner_id = self.workout_owner(id).await?;

    sqlx::query(
      r#"
      UPDATE workouts SET
        workout_type = COALESCE(?1, workout_type),
        category = COALESCE(?2, category),
        duration_minutes = COALESCE(?3, duration_minutes),
        distance_km = COALESCE(?4, distance_km),
        date = COALESCE(?5, date),
        notes = COALESCE(?6, notes),
        updated_at = ?7
      WHERE id = ?8
      "#,
    )
    .bind(&update.workout_type)
    .bind(&update.category)
    .bind(update.duration_minutes)
    .bind(update.distance_km)
    .bind(&update.date)
    .bind(&update.notes)
    .bind(Utc::now())
    .bind(id)
    .execute(&self.pool)
    .await?;

    info!(workout_id = id, "Workout updated");
    self.feed.publish(&owner_id, Collection::Workouts);
    Ok(())
  }

  async fn delete_workout(&self, id: i64) -> Result<()> {
    let owner_id = self.workout_owner(id).await?;

    sqlx::query("DELETE FROM workouts WHERE id = ?1")
      .bind(id)
      .execute(&self.pool)
      .await?;

    info!(workout_id = id, "Workout deleted");
    self.feed.publish(&owner_id, Collection::Workouts);
    Ok(())
  }

  async fn fetch_goals(&self, owner_id: &str) -> Result<Vec<GoalRecord>> {
    let owner_id = require_owner(owner_id)?;
    let rows = sqlx::query(
      r#"
      SELECT
        id, owner_id, title, description, emoji, kind,
        CAST(target_value AS REAL) AS target_value,
        CAST(current_value AS REAL) AS current_value,
        active, completed, window_kind, deadline, category,
        created_at, updated_at
      FROM goals
      WHERE owner_id = ?1
      ORDER BY created_at DESC, id DESC
      "#,
    )
    .bind(owner_id)
    .fetch_all(&self.pool)
    .await?;

    let goals = rows.iter().map(goal_from_row).collect::<Result<Vec<_>>>()?;
    debug!(owner_id, count = goals.len(), "Fetched goals");
    Ok(goals)
  }

  async fn create_goal(&self, owner_id: &str, goal: NewGoal) -> Result<i64> {
    let owner_id = require_owner(owner_id)?;
    goal.validate()?;
    let now = Utc::now();
    let completed = crate::models::goal::is_completed(goal.current_value, goal.target_value);

    let result = sqlx::query(
      r#"
      INSERT INTO goals (
        owner_id, title, description, emoji, kind, target_value, current_value,
        active, completed, window_kind, deadline, category, created_at, updated_at
      )
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
      "#,
    )
    .bind(owner_id)
    .bind(&goal.title)
    .bind(&goal.description)
    .bind(&goal.emoji)
    .bind(goal.kind.to_string())
    .bind(goal.target_value)
    .bind(goal.current_value)
    .bind(goal.active)
    .bind(completed)
    .bind(goal.window.map(|w| w.to_string()))
    .bind(goal.deadline)
    .bind(&goal.category)
    .bind(now)
    .execute(&self.pool)
    .await?;

    let id = result.last_insert_rowid();
    info!(owner_id, goal_id = id, title = %goal.title, "Goal added");
    self.feed.publish(owner_id, Collection::Goals);
    Ok(id)
  }

  async fn update_goal(&self, id: i64, update: GoalUpdate) -> Result<()> {
    update.validate()?;
    let owner_id = self.goal_owner(id).await?;

    // Right-hand sides see the pre-update row, so `completed` is derived
    // from the values being written.
    sqlx::query(
      r#"
      UPDATE goals SET
        title = COALESCE(?1, title),
        description = COALESCE(?2, description),
        emoji = COALESCE(?3, emoji),
        target_value = COALESCE(?4, target_value),
        current_value = COALESCE(?5, current_value),
        active = COALESCE(?6, active),
        window_kind = COALESCE(?7, window_kind),
        deadline = COALESCE(?8, deadline),
        category = COALESCE(?9, category),
        completed = (COALESCE(?5, current_value) >= COALESCE(?4, target_value)),
        updated_at = ?10
      WHERE id = ?11
      "#,
    )
    .bind(&update.title)
    .bind(&update.description)
    .bind(&update.emoji)
    .bind(update.target_value)
    .bind(update.current_value)
    .bind(update.active)
    .bind(update.window.map(|w| w.to_string()))
    .bind(update.deadline)
    .bind(&update.category)
    .bind(Utc::now())
    .bind(id)
    .execute(&self.pool)
    .await?;

    debug!(goal_id = id, "Goal updated");
    self.feed.publish(&owner_id, Collection::Goals);
    Ok(())
  }

  async fn delete_goal(&self, id: i64) -> Result<()> {
    let owner_id = self.goal_owner(id).await?;

    sqlx::query("DELETE FROM goals WHERE id = ?1")
      .bind(id)
      .execute(&self.pool)
      .await?;

    info!(goal_id = id, "Goal deleted");
    self.feed.publish(&owner_id, Collection::Goals);
    Ok(())
  }

  async fn fetch_weekly_goal(&self, owner_id: &str) -> Result<Option<i64>> {
    let owner_id = require_owner(owner_id)?;
    let weekly_goal = sqlx::query_scalar::<_, i64>(
      "SELECT weekly_goal FROM user_settings WHERE owner_id = ?1",
    )
    .bind(owner_id)
    .fetch_optional(&self.pool)
    .await?;
    Ok(weekly_goal)
  }

  async fn save_weekly_goal(&self, owner_id: &str, weekly_goal: i64) -> Result<()> {
    let owner_id = require_owner(owner_id)?;
    sqlx::query(
      r#"
      INSERT INTO user_settings (owner_id, weekly_goal, updated_at)
      VALUES (?1, ?2, ?3)
      ON CONFLICT(owner_id) DO UPDATE SET
        weekly_goal = excluded.weekly_goal,
        updated_at = excluded.updated_at
      "#,
    )
    .bind(owner_id)
    .bind(weekly_goal)
    .bind(Utc::now())
    .execute(&self.pool)
    .await?;

    info!(owner_id, weekly_goal, "Weekly goal saved");
    Ok(())
  }

  async fn fetch_profile(&self, owner_id: &str) -> Result<Option<UserProfile>> {
    let owner_id = require_owner(owner_id)?;
    let row = sqlx::query("SELECT * FROM user_profiles WHERE owner_id = ?1")
      .bind(owner_id)
      .fetch_optional(&self.pool)
      .await?;
    row.as_ref().map(profile_from_row).transpose()
  }

  async fn save_profile(&self, owner_id: &str, data: ProfileData) -> Result<()> {
    let owner_id = require_owner(owner_id)?;
    let now = Utc::now();

    sqlx::query(
      r#"
      INSERT INTO user_profiles (
        owner_id, name, email, avatar, member_since,
        weekly_goal, notifications, theme, created_at, updated_at
      )
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
      ON CONFLICT(owner_id) DO UPDATE SET
        name = excluded.name,
        email = excluded.email,
        avatar = COALESCE(excluded.avatar, avatar),
        member_since = excluded.member_since,
        weekly_goal = excluded.weekly_goal,
        notifications = excluded.notifications,
        theme = excluded.theme,
        updated_at = excluded.updated_at
      "#,
    )
    .bind(owner_id)
    .bind(&data.name)
    .bind(&data.email)
    .bind(&data.avatar)
    .bind(&data.member_since)
    .bind(data.preferences.weekly_goal)
    .bind(data.preferences.notifications)
    .bind(data.preferences.theme.map(|t| t.to_string()))
    .bind(now)
    .execute(&self.pool)
    .await?;

    info!(owner_id, "Profile saved");
    self.feed.publish(owner_id, Collection::Profiles);
    Ok(())
  }

  async fn update_profile(&self, owner_id: &str, update: ProfileUpdate) -> Result<()> {
    let owner_id = require_owner(owner_id)?;
    let prefs = update.preferences.clone();

    let result = sqlx::query(
      r#"
      UPDATE user_profiles SET
        name = COALESCE(?1, name),
        email = COALESCE(?2, email),
        avatar = COALESCE(?3, avatar),
        weekly_goal = CASE WHEN ?4 THEN ?5 ELSE weekly_goal END,
        notifications = CASE WHEN ?4 THEN ?6 ELSE notifications END,
        theme = CASE WHEN ?4 THEN ?7 ELSE theme END,
        updated_at = ?8
      WHERE owner_id = ?9
      "#,
    )
    .bind(&update.name)
    .bind(&update.email)
    .bind(&update.avatar)
    .bind(prefs.is_some())
    .bind(prefs.as_ref().and_then(|p| p.weekly_goal))
    .bind(prefs.as_ref().and_then(|p| p.notifications))
    .bind(prefs.as_ref().and_then(|p| p.theme).map(|t| t.to_string()))
    .bind(Utc::now())
    .bind(owner_id)
    .execute(&self.pool)
    .await?;

    if result.rows_affected() == 0 {
      return Err(TrackerError::not_found("Profile", owner_id));
    }

    info!(owner_id, "Profile updated");
    self.feed.publish(owner_id, Collection::Profiles);
    Ok(())
  }

  fn changes(&self) -> &ChangeFeed {
    &self.feed
  }
}
