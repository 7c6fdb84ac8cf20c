//! Goal progress evaluation and goal management
//!
//! Progress is always recomputed from a workout snapshot; the stored
//! `current_value` is a cache the evaluator refreshes through the store.

use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::calendar::{midnight, start_of_month, start_of_week};
use crate::clock::Clock;
use crate::error::{Result, TrackerError};
use crate::models::goal::is_completed;
use crate::models::{
    GoalKind, GoalRecord, GoalTemplate, GoalUpdate, GoalWindow, NewGoal, WorkoutRecord,
};
use crate::store::{self, RecordStore, Subscription};

pub const DEFAULT_WEEKLY_GOAL: i64 = 4;
pub const MIN_WEEKLY_GOAL: i64 = 1;
pub const MAX_WEEKLY_GOAL: i64 = 14;

// ---------------------------------------------------------------------------
/// Progress Evaluation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub current_value: f64,
    /// Percent of target, capped at 100
    pub progress: i64,
    pub completed: bool,
}

/// Local time at which `window` starts, relative to the clock's now
pub fn window_start(window: GoalWindow, clock: &dyn Clock) -> NaiveDateTime {
    let now = clock.now_local();
    match window {
        GoalWindow::CurrentWeek => midnight(start_of_week(now.date())),
        GoalWindow::CurrentMonth => midnight(start_of_month(now.date())),
        GoalWindow::Last30Days => now - Duration::days(30),
        GoalWindow::Last7Days => now - Duration::days(7),
    }
}

/// `min(100, round(current / target * 100))`, 0 for a non-positive target
pub fn progress_percent(current_value: f64, target_value: f64) -> i64 {
    if target_value <= 0.0 || !target_value.is_finite() {
        return 0;
    }
    let percent = (current_value / target_value * 100.0 + 0.5).floor();
    percent.clamp(0.0, 100.0) as i64
}

pub fn calculate_goal_progress(
    goal: &GoalRecord,
    records: &[WorkoutRecord],
    clock: &dyn Clock,
) -> GoalProgress {
    let start = window_start(goal.effective_window(), clock);
    let in_window = records
        .iter()
        .filter(|w| w.local_time(clock).is_some_and(|at| at >= start));

    let current_value: f64 = match goal.kind {
        GoalKind::Duration => in_window.map(|w| w.duration() as f64).sum(),
        GoalKind::Count => in_window.count() as f64,
        GoalKind::Distance => in_window.map(WorkoutRecord::distance).sum(),
    };

    GoalProgress {
        current_value,
        progress: progress_percent(current_value, goal.target_value),
        completed: is_completed(current_value, goal.target_value),
    }
}

/// Persist a new current value for one of the owner's goals.
///
/// Returns the goal as stored afterwards; `completed` follows from the new
/// value and the goal's target.
pub async fn update_goal_progress(
    store: &dyn RecordStore,
    owner_id: &str,
    goal_id: i64,
    current_value: f64,
) -> Result<GoalRecord> {
    let mut goal = find_goal(store, owner_id, goal_id).await?;
    let update = GoalUpdate::progress(current_value);

    store.update_goal(goal_id, update.clone()).await?;
    update.apply(&mut goal);

    debug!(goal_id, current_value, completed = goal.completed, "Goal progress stored");
    Ok(goal)
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum GoalOutcome {
    Updated(GoalProgress),
    /// Inactive or already completed
    Skipped,
    Failed(TrackerError),
}

#[derive(Debug, Serialize)]
pub struct GoalUpdateOutcome {
    pub goal_id: i64,
    pub title: String,
    pub outcome: GoalOutcome,
}

impl GoalUpdateOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, GoalOutcome::Failed(_))
    }
}

/// Recompute and store progress for every active, incomplete goal.
///
/// Writes run concurrently and independently. A failed write is logged and
/// reported in its outcome; it never stops the others. Only failing to load
/// the goal list fails the whole call.
pub async fn update_all_goals_progress(
    store: &dyn RecordStore,
    owner_id: &str,
    records: &[WorkoutRecord],
    clock: &dyn Clock,
) -> Result<Vec<GoalUpdateOutcome>> {
    let goals = store.fetch_goals(owner_id).await?;

    let writes = goals.iter().map(|goal| async move {
        if !goal.needs_progress_update() {
            return GoalUpdateOutcome {
                goal_id: goal.id,
                title: goal.title.clone(),
                outcome: GoalOutcome::Skipped,
            };
        }

        let progress = calculate_goal_progress(goal, records, clock);
        let outcome = match store
            .update_goal(goal.id, GoalUpdate::progress(progress.current_value))
            .await
        {
            Ok(()) => GoalOutcome::Updated(progress),
            Err(e) => {
                warn!(goal_id = goal.id, title = %goal.title, error = %e, "Skipping goal progress update");
                GoalOutcome::Failed(e)
            }
        };

        GoalUpdateOutcome {
            goal_id: goal.id,
            title: goal.title.clone(),
            outcome,
        }
    });

    let outcomes = join_all(writes).await;
    let failed = outcomes.iter().filter(|o| o.is_failed()).count();
    info!(owner_id, goals = outcomes.len(), failed, "Goal progress refreshed");
    Ok(outcomes)
}

// ---------------------------------------------------------------------------
/// Goal Management
// ---------------------------------------------------------------------------

pub async fn list_goals(store: &dyn RecordStore, owner_id: &str) -> Result<Vec<GoalRecord>> {
    store.fetch_goals(owner_id).await
}

pub async fn add_goal(store: &dyn RecordStore, owner_id: &str, goal: NewGoal) -> Result<i64> {
    goal.validate()?;
    store.create_goal(owner_id, goal).await
}

/// Edit one of the owner's goals
pub async fn update_goal(
    store: &dyn RecordStore,
    owner_id: &str,
    goal_id: i64,
    update: GoalUpdate,
) -> Result<()> {
    find_goal(store, owner_id, goal_id).await?;
    update.validate()?;
    store.update_goal(goal_id, update).await?;
    info!(owner_id, goal_id, "Goal updated");
    Ok(())
}

pub async fn delete_goal(store: &dyn RecordStore, owner_id: &str, goal_id: i64) -> Result<()> {
    find_goal(store, owner_id, goal_id).await?;
    store.delete_goal(goal_id).await?;
    info!(owner_id, goal_id, "Goal deleted");
    Ok(())
}

/// Flip `active` on one of the owner's goals; returns the new state
pub async fn toggle_goal_active(
    store: &dyn RecordStore,
    owner_id: &str,
    goal_id: i64,
) -> Result<bool> {
    let goal = find_goal(store, owner_id, goal_id).await?;
    let active = !goal.active;

    store
        .update_goal(
            goal_id,
            GoalUpdate {
                active: Some(active),
                ..Default::default()
            },
        )
        .await?;

    info!(goal_id, active, "Goal toggled");
    Ok(active)
}

/// Live goal list; `on_change` receives the full list after every change
pub fn subscribe_goals<S, F>(store: Arc<S>, owner_id: &str, on_change: F) -> Result<Subscription>
where
    S: RecordStore + ?Sized + 'static,
    F: Fn(Vec<GoalRecord>) + Send + Sync + 'static,
{
    store::subscribe_goals(store, owner_id, on_change)
}

/// Someone else's goal reads as missing
async fn find_goal(store: &dyn RecordStore, owner_id: &str, goal_id: i64) -> Result<GoalRecord> {
    let owner_id = store::require_owner(owner_id)?;
    store
        .fetch_goals(owner_id)
        .await?
        .into_iter()
        .find(|g| g.id == goal_id)
        .ok_or_else(|| TrackerError::not_found("Goal", goal_id))
}

// ---------------------------------------------------------------------------
/// Templates
// ---------------------------------------------------------------------------

/// (title, description, emoji, kind, target, window, category)
const TEMPLATES: [(&str, &str, &str, GoalKind, f64, GoalWindow, &str); 8] = [
    ("5K Run Challenge", "5 runs of 5 km", "🏃‍♂️", GoalKind::Count, 5.0, GoalWindow::Last7Days, "cardio"),
    ("300 Minutes Cardio", "300 cardio minutes this week", "❤️", GoalKind::Duration, 300.0, GoalWindow::CurrentWeek, "cardio"),
    ("Strength Week", "5 strength sessions", "🏋️‍♀️", GoalKind::Count, 5.0, GoalWindow::CurrentWeek, "strength"),
    ("Yoga Month", "15 yoga sessions", "🧘‍♀️", GoalKind::Count, 15.0, GoalWindow::CurrentMonth, "flexibility"),
    ("500 Minutes of Sport", "This month", "🎯", GoalKind::Duration, 500.0, GoalWindow::CurrentMonth, "general"),
    ("Streak Master", "7 days in a row", "🔥", GoalKind::Count, 7.0, GoalWindow::Last7Days, "consistency"),
    ("Endurance Boost", "1000 cardio minutes in 30 days", "💨", GoalKind::Duration, 1000.0, GoalWindow::Last30Days, "cardio"),
    ("Flexibility Plus", "20 stretching sessions in 30 days", "🤸‍♀️", GoalKind::Count, 20.0, GoalWindow::Last30Days, "flexibility"),
];

pub fn goal_templates() -> Vec<GoalTemplate> {
    TEMPLATES
        .iter()
        .enumerate()
        .map(
            |(index, (title, description, emoji, kind, target, window, category))| GoalTemplate {
                id: format!("template_{}", index),
                title: title.to_string(),
                description: description.to_string(),
                emoji: emoji.to_string(),
                kind: *kind,
                target_value: *target,
                window: Some(*window),
                category: Some(category.to_string()),
            },
        )
        .collect()
}

/// Create an active, zero-progress goal from a catalogue template
pub async fn create_goal_from_template(
    store: &dyn RecordStore,
    owner_id: &str,
    template_id: &str,
) -> Result<i64> {
    let template = goal_templates()
        .into_iter()
        .find(|t| t.id == template_id)
        .ok_or_else(|| TrackerError::not_found("GoalTemplate", template_id))?;

    add_goal(store, owner_id, template.to_new_goal()).await
}

// ---------------------------------------------------------------------------
/// Weekly Workout Target
// ---------------------------------------------------------------------------

/// Weekly workout target, falling back to the default when nobody is signed
/// in, nothing is stored, or the store cannot be read
pub async fn get_weekly_goal(store: &dyn RecordStore, owner_id: Option<&str>) -> i64 {
    let Some(owner_id) = owner_id.filter(|o| !o.trim().is_empty()) else {
        return DEFAULT_WEEKLY_GOAL;
    };

    match store.fetch_weekly_goal(owner_id).await {
        Ok(stored) => stored.filter(|g| *g > 0).unwrap_or(DEFAULT_WEEKLY_GOAL),
        Err(e) => {
            warn!(owner_id, error = %e, "Failed to load weekly goal, using default");
            DEFAULT_WEEKLY_GOAL
        }
    }
}

pub async fn set_weekly_goal(store: &dyn RecordStore, owner_id: &str, weekly_goal: i64) -> Result<()> {
    if !(MIN_WEEKLY_GOAL..=MAX_WEEKLY_GOAL).contains(&weekly_goal) {
        return Err(TrackerError::InvalidInput(format!(
            "Weekly goal must be between {} and {}, got {}",
            MIN_WEEKLY_GOAL, MAX_WEEKLY_GOAL, weekly_goal
        )));
    }
    store.save_weekly_goal(owner_id, weekly_goal).await
}
