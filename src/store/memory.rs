//! In-memory record store, used as a test double and for offline runs

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{require_owner, ChangeFeed, Collection, RecordStore};
use crate::clock::{Clock, SystemClock};
use crate::error::{Result, TrackerError};
use crate::models::{
  GoalRecord, GoalUpdate, NewGoal, NewWorkout, ProfileData, ProfileUpdate, UserProfile,
  WorkoutRecord, WorkoutUpdate,
};

#[derive(Default)]
struct Tables {
  next_id: i64,
  workouts: BTreeMap<i64, WorkoutRecord>,
  goals: BTreeMap<i64, GoalRecord>,
  weekly_goals: HashMap<String, i64>,
  profiles: HashMap<String, UserProfile>,
}

impl Tables {
  fn allocate_id(&mut self) -> i64 {
    self.next_id += 1;
    self.next_id
  }
}

pub struct MemoryStore {
  tables: RwLock<Tables>,
  feed: ChangeFeed,
  clock: Arc<dyn Clock>,
}

impl Default for MemoryStore {
  fn default() -> Self {
    Self::new()
  }
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::with_clock(Arc::new(SystemClock))
  }

  /// Store that stamps `created_at`/`updated_at` from `clock`
  pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
    Self {
      tables: RwLock::new(Tables::default()),
      feed: ChangeFeed::default(),
      clock,
    }
  }

  /// Seed fully-formed workouts, keeping their ids and timestamps
  pub async fn insert_workouts(&self, records: Vec<WorkoutRecord>) {
    let mut owners = Vec::new();
    {
      let mut tables = self.tables.write().await;
      for record in records {
        tables.next_id = tables.next_id.max(record.id);
        owners.push(record.owner_id.clone());
        tables.workouts.insert(record.id, record);
      }
    }
    owners.dedup();
    for owner in owners {
      self.feed.publish(&owner, Collection::Workouts);
    }
  }

  fn now(&self) -> DateTime<Utc> {
    self.clock.now()
  }
}

/// Newest first by creation time, then by id
fn newest_first<T>(records: &mut [T], key: impl Fn(&T) -> (Option<DateTime<Utc>>, i64)) {
  records.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl RecordStore for MemoryStore {
  async fn fetch_workouts(&self, owner_id: &str) -> Result<Vec<WorkoutRecord>> {
    let owner_id = require_owner(owner_id)?;
    let tables = self.tables.read().await;
    let mut workouts: Vec<WorkoutRecord> = tables
      .workouts
      .values()
      .filter(|w| w.owner_id == owner_id)
      .cloned()
      .collect();
    newest_first(&mut workouts, |w| (w.created_at, w.id));
    Ok(workouts)
  }

  async fn create_workout(&self, owner_id: &str, workout: NewWorkout) -> Result<i64> {
    let owner_id = require_owner(owner_id)?;
    let now = self.now();
    let id = {
      let mut tables = self.tables.write().await;
      let id = tables.allocate_id();
      tables.workouts.insert(
        id,
        WorkoutRecord {
          id,
          owner_id: owner_id.to_string(),
          workout_type: workout.workout_type,
          category: workout.category,
          duration_minutes: workout.duration_minutes,
          distance_km: workout.distance_km,
          date: workout.date,
          notes: workout.notes,
          training_type: workout.training_type,
          sets: workout.sets,
          reps: workout.reps,
          created_at: Some(now),
          updated_at: Some(now),
        },
      );
      id
    };
    self.feed.publish(owner_id, Collection::Workouts);
    Ok(id)
  }

  async fn update_workout(&self, id: i64, update: WorkoutUpdate) -> Result<()> {
    let now = self.now();
    let owner_id = {
      let mut tables = self.tables.write().await;
      let record = tables
        .workouts
        .get_mut(&id)
        .ok_or_else(|| TrackerError::not_found("Workout", id))?;
      update.apply(record);
      record.updated_at = Some(now);
      record.owner_id.clone()
    };
    self.feed.publish(&owner_id, Collection::Workouts);
    Ok(())
  }

  async fn delete_workout(&self, id: i64) -> Result<()> {
    let removed = self.tables.write().await.workouts.remove(&id);
    let record = removed.ok_or_else(|| TrackerError::not_found("Workout", id))?;
    self.feed.publish(&record.owner_id, Collection::Workouts);
    Ok(())
  }

  async fn fetch_goals(&self, owner_id: &str) -> Result<Vec<GoalRecord>> {
    let owner_id = require_owner(owner_id)?;
    let tables = self.tables.read().await;
    let mut goals: Vec<GoalRecord> = tables
      .goals
      .values()
      .filter(|g| g.owner_id == owner_id)
      .cloned()
      .collect();
    newest_first(&mut goals, |g| (g.created_at, g.id));
    Ok(goals)
  }

  async fn create_goal(&self, owner_id: &str, goal: NewGoal) -> Result<i64> {
    let owner_id = require_owner(owner_id)?;
    goal.validate()?;
    let now = self.now();
    let id = {
      let mut tables = self.tables.write().await;
      let id = tables.allocate_id();
      let mut record = GoalRecord {
        id,
        owner_id: owner_id.to_string(),
        title: goal.title,
        description: goal.description,
        emoji: goal.emoji,
        kind: goal.kind,
        target_value: goal.target_value,
        current_value: goal.current_value,
        active: goal.active,
        completed: false,
        window: goal.window,
        deadline: goal.deadline,
        category: goal.category,
        created_at: Some(now),
        updated_at: Some(now),
      };
      record.refresh_completed();
      tables.goals.insert(id, record);
      id
    };
    self.feed.publish(owner_id, Collection::Goals);
    Ok(id)
  }

  async fn update_goal(&self, id: i64, update: GoalUpdate) -> Result<()> {
    update.validate()?;
    let now = self.now();
    let owner_id = {
      let mut tables = self.tables.write().await;
      let goal = tables
        .goals
        .get_mut(&id)
        .ok_or_else(|| TrackerError::not_found("Goal", id))?;
      update.apply(goal);
      goal.updated_at = Some(now);
      goal.owner_id.clone()
    };
    self.feed.publish(&owner_id, Collection::Goals);
    Ok(())
  }

  async fn delete_goal(&self, id: i64) -> Result<()> {
    let removed = self.tables.write().await.goals.remove(&id);
    let goal = removed.ok_or_else(|| TrackerError::not_found("Goal", id))?;
    self.feed.publish(&goal.owner_id, Collection::Goals);
    Ok(())
  }

  async fn fetch_weekly_goal(&self, owner_id: &str) -> Result<Option<i64>> {
    let owner_id = require_owner(owner_id)?;
    Ok(self.tables.read().await.weekly_goals.get(owner_id).copied())
  }

  async fn save_weekly_goal(&self, owner_id: &str, weekly_goal: i64) -> Result<()> {
    let owner_id = require_owner(owner_id)?;
    self
      .tables
      .write()
      .await
      .weekly_goals
      .insert(owner_id.to_string(), weekly_goal);
    Ok(())
  }

  async fn fetch_profile(&self, owner_id: &str) -> Result<Option<UserProfile>> {
    let owner_id = require_owner(owner_id)?;
    Ok(self.tables.read().await.profiles.get(owner_id).cloned())
  }

  async fn save_profile(&self, owner_id: &str, data: ProfileData) -> Result<()> {
    let owner_id = require_owner(owner_id)?;
    let now = self.now();
    {
      let mut tables = self.tables.write().await;
      match tables.profiles.get_mut(owner_id) {
        Some(profile) => {
          profile.member_since = data.member_since.clone();
          ProfileUpdate::from(data).apply(profile);
          profile.updated_at = Some(now);
        }
        None => {
          tables.profiles.insert(
            owner_id.to_string(),
            UserProfile {
              owner_id: owner_id.to_string(),
              name: data.name,
              email: data.email,
              avatar: data.avatar,
              member_since: data.member_since,
              preferences: data.preferences,
              created_at: Some(now),
              updated_at: Some(now),
            },
          );
        }
      }
    }
    self.feed.publish(owner_id, Collection::Profiles);
    Ok(())
  }

  async fn update_profile(&self, owner_id: &str, update: ProfileUpdate) -> Result<()> {
    let owner_id = require_owner(owner_id)?;
    let now = self.now();
    {
      let mut tables = self.tables.write().await;
      let profile = tables
        .profiles
        .get_mut(owner_id)
        .ok_or_else(|| TrackerError::not_found("Profile", owner_id))?;
      update.apply(profile);
      profile.updated_at = Some(now);
    }
    self.feed.publish(owner_id, Collection::Profiles);
    Ok(())
  }

  fn changes(&self) -> &ChangeFeed {
    &self.feed
  }
}
