//! Goal commands

use serde::Serialize;

use super::AppState;
use crate::error::Result;
use crate::goals::{self, GoalProgress, GoalUpdateOutcome};
use crate::models::{GoalRecord, GoalTemplate, GoalUpdate, NewGoal};

/// A stored goal next to its progress against the current snapshot
#[derive(Debug, Serialize)]
pub struct GoalView {
  #[serde(flatten)]
  pub goal: GoalRecord,
  pub live: GoalProgress,
}

pub async fn list_goals(state: &AppState, owner_id: Option<&str>) -> Result<Vec<GoalView>> {
  let owner_id = state.owner(owner_id)?;
  let goals = goals::list_goals(state.store.as_ref(), owner_id).await?;
  let workouts = state.workouts(owner_id).await?;

  Ok(
    goals
      .into_iter()
      .map(|goal| {
        let live = goals::calculate_goal_progress(&goal, &workouts, state.clock.as_ref());
        GoalView { goal, live }
      })
      .collect(),
  )
}

/// Recompute and store progress for all of the owner's open goals
pub async fn refresh_goal_progress(
  state: &AppState,
  owner_id: Option<&str>,
) -> Result<Vec<GoalUpdateOutcome>> {
  let owner_id = state.owner(owner_id)?;
  let workouts = state.workouts(owner_id).await?;
  goals::update_all_goals_progress(state.store.as_ref(), owner_id, &workouts, state.clock.as_ref())
    .await
}

pub fn get_goal_templates() -> Vec<GoalTemplate> {
  goals::goal_templates()
}

pub async fn add_goal(state: &AppState, owner_id: Option<&str>, goal: NewGoal) -> Result<i64> {
  goals::add_goal(state.store.as_ref(), state.owner(owner_id)?, goal).await
}

pub async fn add_goal_from_template(
  state: &AppState,
  owner_id: Option<&str>,
  template_id: &str,
) -> Result<i64> {
  goals::create_goal_from_template(state.store.as_ref(), state.owner(owner_id)?, template_id).await
}

pub async fn toggle_goal(state: &AppState, owner_id: Option<&str>, goal_id: i64) -> Result<bool> {
  goals::toggle_goal_active(state.store.as_ref(), state.owner(owner_id)?, goal_id).await
}

pub async fn update_goal(
  state: &AppState,
  owner_id: Option<&str>,
  goal_id: i64,
  update: GoalUpdate,
) -> Result<()> {
  goals::update_goal(state.store.as_ref(), state.owner(owner_id)?, goal_id, update).await
}

pub async fn delete_goal(state: &AppState, owner_id: Option<&str>, goal_id: i64) -> Result<()> {
  goals::delete_goal(state.store.as_ref(), state.owner(owner_id)?, goal_id).await
}

/// Weekly target; the default when no owner is available
pub async fn get_weekly_goal(state: &AppState, owner_id: Option<&str>) -> i64 {
  goals::get_weekly_goal(state.store.as_ref(), state.owner(owner_id).ok()).await
}

pub async fn set_weekly_goal(state: &AppState, owner_id: Option<&str>, weekly_goal: i64) -> Result<()> {
  goals::set_weekly_goal(state.store.as_ref(), state.owner(owner_id)?, weekly_goal).await
}
