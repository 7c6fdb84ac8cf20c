//! Statistics commands over the owner's current workout snapshot

use super::AppState;
use crate::error::{Result, TrackerError};
use crate::statistics::{
  self, MonthlyStats, QuickSummary, TimeDistribution, WeekdayCounts, WeeklyStats, WorkoutStats,
  WorkoutTypeStats, MAX_MONTHS_BACK, MAX_WEEKS_BACK,
};

fn window_len(requested: Option<u32>, default: u32, max: u32, unit: &str) -> Result<u32> {
  let len = requested.unwrap_or(default);
  if (1..=max).contains(&len) {
    Ok(len)
  } else {
    Err(TrackerError::InvalidInput(format!(
      "{} must be between 1 and {}, got {}",
      unit, max, len
    )))
  }
}

pub async fn get_quick_summary(state: &AppState, owner_id: Option<&str>) -> Result<QuickSummary> {
  let workouts = state.workouts(state.owner(owner_id)?).await?;
  Ok(statistics::quick_summary(&workouts))
}

pub async fn get_workout_stats(state: &AppState, owner_id: Option<&str>) -> Result<WorkoutStats> {
  let workouts = state.workouts(state.owner(owner_id)?).await?;
  Ok(statistics::calculate_workout_stats(&workouts, state.clock.as_ref()))
}

/// Weekly rollup; `weeks` defaults to the configured window
pub async fn get_weekly_stats(
  state: &AppState,
  owner_id: Option<&str>,
  weeks: Option<u32>,
) -> Result<Vec<WeeklyStats>> {
  let weeks = window_len(weeks, state.config.weeks_back, MAX_WEEKS_BACK, "Weeks")?;
  let workouts = state.workouts(state.owner(owner_id)?).await?;
  Ok(statistics::get_weekly_stats(&workouts, weeks, state.clock.as_ref()))
}

/// Monthly rollup; `months` defaults to the configured window
pub async fn get_monthly_stats(
  state: &AppState,
  owner_id: Option<&str>,
  months: Option<u32>,
) -> Result<Vec<MonthlyStats>> {
  let months = window_len(months, state.config.months_back, MAX_MONTHS_BACK, "Months")?;
  let workouts = state.workouts(state.owner(owner_id)?).await?;
  Ok(statistics::get_monthly_stats(&workouts, months, state.clock.as_ref()))
}

pub async fn get_workout_type_stats(
  state: &AppState,
  owner_id: Option<&str>,
) -> Result<Vec<WorkoutTypeStats>> {
  let workouts = state.workouts(state.owner(owner_id)?).await?;
  Ok(statistics::get_workout_type_stats(&workouts, state.clock.as_ref()))
}

pub async fn get_frequency_by_day(state: &AppState, owner_id: Option<&str>) -> Result<WeekdayCounts> {
  let workouts = state.workouts(state.owner(owner_id)?).await?;
  Ok(statistics::get_workout_frequency_by_day(&workouts, state.clock.as_ref()))
}

pub async fn get_time_distribution(
  state: &AppState,
  owner_id: Option<&str>,
) -> Result<TimeDistribution> {
  let workouts = state.workouts(state.owner(owner_id)?).await?;
  Ok(statistics::get_workout_time_distribution(&workouts, state.clock.as_ref()))
}
