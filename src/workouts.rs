//! Workout log operations for a signed-in owner

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{Result, TrackerError};
use crate::models::{NewWorkout, WorkoutRecord, WorkoutUpdate};
use crate::store::{self, RecordStore, Subscription};

fn validate_duration(duration_minutes: Option<i64>) -> Result<()> {
  match duration_minutes {
    Some(minutes) if minutes < 0 => Err(TrackerError::InvalidInput(format!(
      "Workout duration cannot be negative, got {}",
      minutes
    ))),
    _ => Ok(()),
  }
}

/// Log a workout; returns its id
pub async fn add_workout(store: &dyn RecordStore, owner_id: &str, workout: NewWorkout) -> Result<i64> {
  if workout.workout_type.trim().is_empty() {
    return Err(TrackerError::InvalidInput("Workout type is required".to_string()));
  }
  validate_duration(workout.duration_minutes)?;

  let id = store.create_workout(owner_id, workout).await?;
  info!(owner_id, workout_id = id, "Workout logged");
  Ok(id)
}

/// All of the owner's workouts, newest first
pub async fn list_workouts(store: &dyn RecordStore, owner_id: &str) -> Result<Vec<WorkoutRecord>> {
  let workouts = store.fetch_workouts(owner_id).await?;
  debug!(owner_id, count = workouts.len(), "Loaded workouts");
  Ok(workouts)
}

/// Edit one of the owner's workouts
pub async fn update_workout(
  store: &dyn RecordStore,
  owner_id: &str,
  workout_id: i64,
  update: WorkoutUpdate,
) -> Result<()> {
  find_workout(store, owner_id, workout_id).await?;
  if update.workout_type.as_deref().is_some_and(|t| t.trim().is_empty()) {
    return Err(TrackerError::InvalidInput("Workout type cannot be blank".to_string()));
  }
  validate_duration(update.duration_minutes)?;
  store.update_workout(workout_id, update).await?;
  info!(owner_id, workout_id, "Workout updated");
  Ok(())
}

pub async fn delete_workout(store: &dyn RecordStore, owner_id: &str, workout_id: i64) -> Result<()> {
  find_workout(store, owner_id, workout_id).await?;
  store.delete_workout(workout_id).await?;
  info!(owner_id, workout_id, "Workout deleted");
  Ok(())
}

/// Someone else's workout reads as missing
async fn find_workout(store: &dyn RecordStore, owner_id: &str, workout_id: i64) -> Result<WorkoutRecord> {
  let owner_id = store::require_owner(owner_id)?;
  store
    .fetch_workouts(owner_id)
    .await?
    .into_iter()
    .find(|w| w.id == workout_id)
    .ok_or_else(|| TrackerError::not_found("Workout", workout_id))
}

/// Live workout list; `on_change` receives the full list after every change
pub fn subscribe_workouts<S, F>(store: Arc<S>, owner_id: &str, on_change: F) -> Result<Subscription>
where
  S: RecordStore + ?Sized + 'static,
  F: Fn(Vec<WorkoutRecord>) + Send + Sync + 'static,
{
  store::subscribe_workouts(store, owner_id, on_change)
}
