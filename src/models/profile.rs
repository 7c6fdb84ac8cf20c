use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
  #[default]
  Light,
  Dark,
}

impl std::fmt::Display for Theme {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Light => write!(f, "light"),
      Self::Dark => write!(f, "dark"),
    }
  }
}

impl std::str::FromStr for Theme {
  type Err = TrackerError;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "light" => Ok(Self::Light),
      "dark" => Ok(Self::Dark),
      _ => Err(TrackerError::InvalidInput(format!("Unknown theme: {}", s))),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilePreferences {
  pub weekly_goal: Option<i64>,
  pub notifications: Option<bool>,
  pub theme: Option<Theme>,
}

/// Profile data kept alongside the auth account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
  pub owner_id: String,
  pub name: String,
  pub email: String,
  pub avatar: Option<String>,
  pub member_since: String,
  pub preferences: ProfilePreferences,
  pub created_at: Option<DateTime<Utc>>,
  pub updated_at: Option<DateTime<Utc>>,
}

/// Profile fields supplied by the caller on create
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileData {
  pub name: String,
  pub email: String,
  pub avatar: Option<String>,
  pub member_since: String,
  pub preferences: ProfilePreferences,
}

/// Partial profile update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
  pub name: Option<String>,
  pub email: Option<String>,
  pub avatar: Option<String>,
  pub preferences: Option<ProfilePreferences>,
}

impl ProfileUpdate {
  pub fn apply(&self, profile: &mut UserProfile) {
    if let Some(name) = &self.name {
      profile.name = name.clone();
    }
    if let Some(email) = &self.email {
      profile.email = email.clone();
    }
    if let Some(avatar) = &self.avatar {
      profile.avatar = Some(avatar.clone());
    }
    if let Some(preferences) = &self.preferences {
      profile.preferences = preferences.clone();
    }
  }
}

impl From<ProfileData> for ProfileUpdate {
  fn from(data: ProfileData) -> Self {
    Self {
      name: Some(data.name),
      email: Some(data.email),
      avatar: data.avatar,
      preferences: Some(data.preferences),
    }
  }
}
