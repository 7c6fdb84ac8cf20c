//! User profile operations

use chrono::Datelike;
use tracing::info;

use crate::clock::Clock;
use crate::error::{Result, TrackerError};
use crate::goals::DEFAULT_WEEKLY_GOAL;
use crate::models::{ProfileData, ProfilePreferences, ProfileUpdate, Theme, UserProfile};
use crate::store::RecordStore;

pub const DEFAULT_PROFILE_NAME: &str = "Fitness Enthusiast";

/// Create the owner's profile, or overwrite an existing one
pub async fn save_profile(store: &dyn RecordStore, owner_id: &str, data: ProfileData) -> Result<()> {
  validate_weekly_goal(data.preferences.weekly_goal)?;
  store.save_profile(owner_id, data).await
}

/// The owner's profile, `None` when they never saved one
pub async fn get_profile(store: &dyn RecordStore, owner_id: &str) -> Result<Option<UserProfile>> {
  store.fetch_profile(owner_id).await
}

pub async fn update_profile(store: &dyn RecordStore, owner_id: &str, update: ProfileUpdate) -> Result<()> {
  if let Some(preferences) = &update.preferences {
    validate_weekly_goal(preferences.weekly_goal)?;
  }
  store.update_profile(owner_id, update).await
}

/// Starter profile for a freshly registered account
pub fn default_profile_data(email: &str, display_name: &str, clock: &dyn Clock) -> ProfileData {
  let name = match display_name.trim() {
    "" => DEFAULT_PROFILE_NAME.to_string(),
    name => name.to_string(),
  };

  ProfileData {
    name,
    email: email.to_string(),
    avatar: None,
    member_since: clock.today().year().to_string(),
    preferences: ProfilePreferences {
      weekly_goal: Some(DEFAULT_WEEKLY_GOAL),
      notifications: Some(true),
      theme: Some(Theme::Light),
    },
  }
}

pub async fn create_default_profile(
  store: &dyn RecordStore,
  owner_id: &str,
  email: &str,
  display_name: &str,
  clock: &dyn Clock,
) -> Result<()> {
  store
    .save_profile(owner_id, default_profile_data(email, display_name, clock))
    .await?;
  info!(owner_id, "Default profile created");
  Ok(())
}

fn validate_weekly_goal(weekly_goal: Option<i64>) -> Result<()> {
  use crate::goals::{MAX_WEEKLY_GOAL, MIN_WEEKLY_GOAL};

  match weekly_goal {
    Some(goal) if !(MIN_WEEKLY_GOAL..=MAX_WEEKLY_GOAL).contains(&goal) => Err(
      TrackerError::InvalidInput(format!(
        "Weekly goal must be between {} and {}, got {}",
        MIN_WEEKLY_GOAL, MAX_WEEKLY_GOAL, goal
      )),
    ),
    _ => Ok(()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::clock::FixedClock;
  use crate::store::MemoryStore;
  use crate::test_utils::{local_datetime, mock_profile_data};

  #[test]
  fn test_default_profile_fallbacks() {
    let clock = FixedClock::at_local(local_datetime(2025, 3, 1, 9, 0));

    let data = default_profile_data("sam@example.com", "  ", &clock);
    assert_eq!(data.name, DEFAULT_PROFILE_NAME);
    assert_eq!(data.member_since, "2025");
    assert_eq!(data.preferences.weekly_goal, Some(4));
    assert_eq!(data.preferences.notifications, Some(true));
    assert_eq!(data.preferences.theme, Some(Theme::Light));

    let named = default_profile_data("sam@example.com", "Sam", &clock);
    assert_eq!(named.name, "Sam");
  }

  #[tokio::test]
  async fn test_save_get_update_profile() {
    let store = MemoryStore::new();
    assert!(get_profile(&store, "u1").await.unwrap().is_none());

    save_profile(&store, "u1", mock_profile_data()).await.unwrap();
    update_profile(
      &store,
      "u1",
      ProfileUpdate {
        avatar: Some("https://cdn.example.com/a.png".to_string()),
        ..Default::default()
      },
    )
    .await
    .unwrap();

    let profile = get_profile(&store, "u1").await.unwrap().unwrap();
    assert_eq!(profile.name, "Alex Rivera");
    assert_eq!(profile.avatar.as_deref(), Some("https://cdn.example.com/a.png"));
    assert!(profile.created_at.is_some());
  }

  #[tokio::test]
  async fn test_update_rejects_out_of_range_weekly_goal() {
    let store = MemoryStore::new();
    save_profile(&store, "u1", mock_profile_data()).await.unwrap();

    let result = update_profile(
      &store,
      "u1",
      ProfileUpdate {
        preferences: Some(ProfilePreferences {
          weekly_goal: Some(20),
          ..Default::default()
        }),
        ..Default::default()
      },
    )
    .await;
    assert!(matches!(result, Err(TrackerError::InvalidInput(_))));
  }

  #[tokio::test]
  async fn test_create_default_profile_stores_it() {
    let store = MemoryStore::new();
    let clock = FixedClock::at_local(local_datetime(2024, 8, 1, 9, 0));
    create_default_profile(&store, "u1", "new@example.com", "", &clock)
      .await
      .unwrap();

    let profile = get_profile(&store, "u1").await.unwrap().unwrap();
    assert_eq!(profile.name, DEFAULT_PROFILE_NAME);
    assert_eq!(profile.email, "new@example.com");
    assert_eq!(profile.member_since, "2024");
  }
}
