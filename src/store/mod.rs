//! Record store contract
//!
//! The statistics and goal modules never talk to a backend directly. They
//! read snapshots through [`RecordStore`] and write goal progress back
//! through it. Every successful write is announced on the store's
//! [`ChangeFeed`], which drives the live subscriptions below.

pub mod memory;
pub mod sqlite;

use std::future::Future;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{Result, TrackerError};
use crate::models::{
  GoalRecord, GoalUpdate, NewGoal, NewWorkout, ProfileData, ProfileUpdate, UserProfile,
  WorkoutRecord, WorkoutUpdate,
};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

const CHANGE_FEED_CAPACITY: usize = 64;

#[async_trait]
pub trait RecordStore: Send + Sync {
  /// All workouts of `owner_id`, newest first
  async fn fetch_workouts(&self, owner_id: &str) -> Result<Vec<WorkoutRecord>>;
  async fn create_workout(&self, owner_id: &str, workout: NewWorkout) -> Result<i64>;
  async fn update_workout(&self, id: i64, update: WorkoutUpdate) -> Result<()>;
  async fn delete_workout(&self, id: i64) -> Result<()>;

  /// All goals of `owner_id`, newest first
  async fn fetch_goals(&self, owner_id: &str) -> Result<Vec<GoalRecord>>;
  async fn create_goal(&self, owner_id: &str, goal: NewGoal) -> Result<i64>;
  async fn update_goal(&self, id: i64, update: GoalUpdate) -> Result<()>;
  async fn delete_goal(&self, id: i64) -> Result<()>;

  /// Stored weekly workout target, if the owner ever set one
  async fn fetch_weekly_goal(&self, owner_id: &str) -> Result<Option<i64>>;
  async fn save_weekly_goal(&self, owner_id: &str, weekly_goal: i64) -> Result<()>;

  async fn fetch_profile(&self, owner_id: &str) -> Result<Option<UserProfile>>;
  /// Create the profile, or overwrite the caller-supplied fields of an existing one
  async fn save_profile(&self, owner_id: &str, data: ProfileData) -> Result<()>;
  async fn update_profile(&self, owner_id: &str, update: ProfileUpdate) -> Result<()>;

  fn changes(&self) -> &ChangeFeed;
}

/// Reject blank owner ids the same way a missing session would be rejected
pub fn require_owner(owner_id: &str) -> Result<&str> {
  let owner_id = owner_id.trim();
  if owner_id.is_empty() {
    Err(TrackerError::NotAuthenticated)
  } else {
    Ok(owner_id)
  }
}

// ---------------------------------------------------------------------------
// Change Feed
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
  Workouts,
  Goals,
  Profiles,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
  pub owner_id: String,
  pub collection: Collection,
}

#[derive(Debug)]
pub struct ChangeFeed {
  sender: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeFeed {
  fn default() -> Self {
    let (sender, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
    Self { sender }
  }
}

impl ChangeFeed {
  pub fn publish(&self, owner_id: &str, collection: Collection) {
    // No receivers is fine: nobody is subscribed yet
    let _ = self.sender.send(ChangeEvent {
      owner_id: owner_id.to_string(),
      collection,
    });
  }

  pub fn receiver(&self) -> broadcast::Receiver<ChangeEvent> {
    self.sender.subscribe()
  }
}

// ---------------------------------------------------------------------------
// Live Subscriptions
// ---------------------------------------------------------------------------

/// Handle for a live snapshot subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
  task: Mutex<Option<JoinHandle<()>>>,
}

impl Subscription {
  /// Stop delivery. Calling this more than once is harmless.
  pub fn unsubscribe(&self) {
    if let Ok(mut task) = self.task.lock() {
      if let Some(handle) = task.take() {
        handle.abort();
      }
    }
  }

  pub fn is_active(&self) -> bool {
    self
      .task
      .lock()
      .map(|task| task.as_ref().is_some_and(|h| !h.is_finished()))
      .unwrap_or(false)
  }
}

impl Drop for Subscription {
  fn drop(&mut self) {
    self.unsubscribe();
  }
}

/// Deliver the owner's full workout list now and after every change to it
pub fn subscribe_workouts<S, F>(store: Arc<S>, owner_id: &str, on_change: F) -> Result<Subscription>
where
  S: RecordStore + ?Sized + 'static,
  F: Fn(Vec<WorkoutRecord>) + Send + Sync + 'static,
{
  let owner_id = require_owner(owner_id)?.to_string();
  let receiver = store.changes().receiver();
  let fetch_owner = owner_id.clone();
  let fetch = move || {
    let store = Arc::clone(&store);
    let owner_id = fetch_owner.clone();
    async move { store.fetch_workouts(&owner_id).await }
  };
  Ok(spawn_feed(receiver, owner_id, Collection::Workouts, fetch, on_change))
}

/// Deliver the owner's full goal list now and after every change to it
pub fn subscribe_goals<S, F>(store: Arc<S>, owner_id: &str, on_change: F) -> Result<Subscription>
where
  S: RecordStore + ?Sized + 'static,
  F: Fn(Vec<GoalRecord>) + Send + Sync + 'static,
{
  let owner_id = require_owner(owner_id)?.to_string();
  let receiver = store.changes().receiver();
  let fetch_owner = owner_id.clone();
  let fetch = move || {
    let store = Arc::clone(&store);
    let owner_id = fetch_owner.clone();
    async move { store.fetch_goals(&owner_id).await }
  };
  Ok(spawn_feed(receiver, owner_id, Collection::Goals, fetch, on_change))
}

fn spawn_feed<T, Fetch, Fut, F>(
  mut receiver: broadcast::Receiver<ChangeEvent>,
  owner_id: String,
  collection: Collection,
  fetch: Fetch,
  on_change: F,
) -> Subscription
where
  T: Send + 'static,
  Fetch: Fn() -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<Vec<T>>> + Send,
  F: Fn(Vec<T>) + Send + Sync + 'static,
{
  let task = tokio::spawn(async move {
    deliver_snapshot(&fetch, &on_change, &owner_id, collection).await;

    loop {
      match receiver.recv().await {
        Ok(event) if event.owner_id == owner_id && event.collection == collection => {
          deliver_snapshot(&fetch, &on_change, &owner_id, collection).await;
        }
        Ok(_) => {}
        Err(broadcast::error::RecvError::Lagged(skipped)) => {
          debug!(owner_id = %owner_id, skipped, "Change feed lagged, resyncing");
          deliver_snapshot(&fetch, &on_change, &owner_id, collection).await;
        }
        Err(broadcast::error::RecvError::Closed) => break,
      }
    }
  });

  Subscription {
    task: Mutex::new(Some(task)),
  }
}

async fn deliver_snapshot<T, Fetch, Fut, F>(
  fetch: &Fetch,
  on_change: &F,
  owner_id: &str,
  collection: Collection,
) where
  Fetch: Fn() -> Fut,
  Fut: Future<Output = Result<Vec<T>>>,
  F: Fn(Vec<T>),
{
  match fetch().await {
    Ok(records) => on_change(records),
    Err(e) => warn!(
      owner_id = %owner_id,
      collection = ?collection,
      error = %e,
      "Failed to refresh snapshot, keeping previous one"
    ),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::NewWorkout;
  use std::time::Duration;
  use tokio::sync::mpsc;
  use tokio::time::timeout;

  fn new_run(minutes: i64) -> NewWorkout {
    NewWorkout {
      workout_type: "Run".to_string(),
      duration_minutes: Some(minutes),
      ..Default::default()
    }
  }

  #[test]
  fn test_require_owner_rejects_blank() {
    assert!(matches!(require_owner(""), Err(TrackerError::NotAuthenticated)));
    assert!(matches!(require_owner("   "), Err(TrackerError::NotAuthenticated)));
    assert_eq!(require_owner(" u1 ").unwrap(), "u1");
  }

  #[tokio::test]
  async fn test_subscription_delivers_full_snapshots() {
    let store = Arc::new(MemoryStore::new());
    let (tx, mut rx) = mpsc::unbounded_channel();

    let sub = subscribe_workouts(Arc::clone(&store), "u1", move |workouts| {
      let _ = tx.send(workouts.len());
    })
    .expect("Should subscribe");

    // Initial snapshot
    let first = timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
    assert_eq!(first, Some(0));

    store.create_workout("u1", new_run(30)).await.unwrap();
    let second = timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
    assert_eq!(second, Some(1));

    store.create_workout("u1", new_run(40)).await.unwrap();
    let third = timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
    assert_eq!(third, Some(2), "Each delivery replaces the previous set");

    sub.unsubscribe();
  }

  #[tokio::test]
  async fn test_subscription_ignores_other_owners_and_collections() {
    let store = Arc::new(MemoryStore::new());
    let (tx, mut rx) = mpsc::unbounded_channel();

    let _sub = subscribe_workouts(Arc::clone(&store), "u1", move |workouts| {
      let _ = tx.send(workouts.len());
    })
    .unwrap();
    assert_eq!(timeout(Duration::from_secs(1), rx.recv()).await.unwrap(), Some(0));

    store.create_workout("someone-else", new_run(30)).await.unwrap();
    store
      .create_goal("u1", crate::test_utils::mock_new_goal(crate::models::GoalKind::Count, 3.0, "3 runs"))
      .await
      .unwrap();

    let nothing = timeout(Duration::from_millis(150), rx.recv()).await;
    assert!(nothing.is_err(), "No delivery expected for unrelated changes");
  }

  #[tokio::test]
  async fn test_unsubscribe_is_idempotent_and_stops_delivery() {
    let store = Arc::new(MemoryStore::new());
    let (tx, mut rx) = mpsc::unbounded_channel();

    let sub = subscribe_workouts(Arc::clone(&store), "u1", move |workouts| {
      let _ = tx.send(workouts.len());
    })
    .unwrap();
    assert_eq!(timeout(Duration::from_secs(1), rx.recv()).await.unwrap(), Some(0));
    assert!(sub.is_active());

    sub.unsubscribe();
    sub.unsubscribe();
    assert!(!sub.is_active());

    store.create_workout("u1", new_run(30)).await.unwrap();
    // The aborted task drops its sender, so the channel closes or stays silent
    let after = timeout(Duration::from_millis(150), rx.recv()).await;
    assert!(matches!(after, Err(_) | Ok(None)));
  }

  #[tokio::test]
  async fn test_subscribe_requires_owner() {
    let store = Arc::new(MemoryStore::new());
    let result = subscribe_goals(store, "", |_| {});
    assert!(matches!(result, Err(TrackerError::NotAuthenticated)));
  }
}
