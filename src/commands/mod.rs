//! Application commands
//!
//! Each command resolves the owner, loads what it needs through the store
//! and hands back a serializable result. The CLI is a thin shell over these.

pub mod goals;
pub mod statistics;

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::db;
use crate::error::{Result, TrackerError};
use crate::models::{NewWorkout, UserProfile, WorkoutRecord, WorkoutUpdate};
use crate::store::{RecordStore, SqliteStore};
use crate::{profile, workouts};

/// Shared state every command runs against
pub struct AppState {
  pub store: Arc<dyn RecordStore>,
  pub clock: Arc<dyn Clock>,
  pub config: AppConfig,
}

impl AppState {
  pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>, config: AppConfig) -> Self {
    Self { store, clock, config }
  }

  /// SQLite-backed state on the system clock
  pub async fn connect(config: AppConfig) -> Result<Self> {
    let pool = db::initialize_db(&config).await?;
    Ok(Self::new(Arc::new(SqliteStore::new(pool)), Arc::new(SystemClock), config))
  }

  /// Explicit owner, else the configured one
  pub fn owner<'a>(&'a self, owner_id: Option<&'a str>) -> Result<&'a str> {
    owner_id
      .or(self.config.owner_id.as_deref())
      .map(str::trim)
      .filter(|o| !o.is_empty())
      .ok_or(TrackerError::NotAuthenticated)
  }

  pub(crate) async fn workouts(&self, owner_id: &str) -> Result<Vec<WorkoutRecord>> {
    workouts::list_workouts(self.store.as_ref(), owner_id).await
  }
}

pub async fn get_workouts(state: &AppState, owner_id: Option<&str>) -> Result<Vec<WorkoutRecord>> {
  let owner_id = state.owner(owner_id)?;
  state.workouts(owner_id).await
}

pub async fn add_workout(state: &AppState, owner_id: Option<&str>, workout: NewWorkout) -> Result<i64> {
  let owner_id = state.owner(owner_id)?;
  workouts::add_workout(state.store.as_ref(), owner_id, workout).await
}

pub async fn update_workout(
  state: &AppState,
  owner_id: Option<&str>,
  workout_id: i64,
  update: WorkoutUpdate,
) -> Result<()> {
  let owner_id = state.owner(owner_id)?;
  workouts::update_workout(state.store.as_ref(), owner_id, workout_id, update).await
}

pub async fn delete_workout(state: &AppState, owner_id: Option<&str>, workout_id: i64) -> Result<()> {
  let owner_id = state.owner(owner_id)?;
  workouts::delete_workout(state.store.as_ref(), owner_id, workout_id).await
}

pub async fn get_profile(state: &AppState, owner_id: Option<&str>) -> Result<Option<UserProfile>> {
  profile::get_profile(state.store.as_ref(), state.owner(owner_id)?).await
}

/// Create the starter profile unless one exists; returns the stored profile
pub async fn init_profile(
  state: &AppState,
  owner_id: Option<&str>,
  email: &str,
  display_name: &str,
) -> Result<Option<UserProfile>> {
  let owner_id = state.owner(owner_id)?;
  let store = state.store.as_ref();

  if profile::get_profile(store, owner_id).await?.is_none() {
    profile::create_default_profile(store, owner_id, email, display_name, state.clock.as_ref()).await?;
  }
  profile::get_profile(store, owner_id).await
}
