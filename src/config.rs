//! Application configuration from the environment

use std::env;
use std::str::FromStr;

use crate::error::{Result, TrackerError};
use crate::statistics::{DEFAULT_MONTHS_BACK, DEFAULT_WEEKS_BACK, MAX_MONTHS_BACK, MAX_WEEKS_BACK};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://workout-tracker.db?mode=rwc";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
  pub database_url: String,
  /// Owner used when the CLI is not given one
  pub owner_id: Option<String>,
  pub weeks_back: u32,
  pub months_back: u32,
  pub max_connections: u32,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      database_url: DEFAULT_DATABASE_URL.to_string(),
      owner_id: None,
      weeks_back: DEFAULT_WEEKS_BACK,
      months_back: DEFAULT_MONTHS_BACK,
      max_connections: DEFAULT_MAX_CONNECTIONS,
    }
  }
}

impl AppConfig {
  /// Load `.env` if present, then read `WORKOUT_TRACKER_*` variables
  pub fn load() -> Result<Self> {
    dotenvy::dotenv().ok();
    Self::from_env()
  }

  pub fn from_env() -> Result<Self> {
    let defaults = Self::default();

    Ok(Self {
      database_url: non_empty_var("WORKOUT_TRACKER_DATABASE_URL").unwrap_or(defaults.database_url),
      owner_id: non_empty_var("WORKOUT_TRACKER_OWNER"),
      weeks_back: parse_bounded("WORKOUT_TRACKER_WEEKS_BACK", defaults.weeks_back, MAX_WEEKS_BACK)?,
      months_back: parse_bounded("WORKOUT_TRACKER_MONTHS_BACK", defaults.months_back, MAX_MONTHS_BACK)?,
      max_connections: parse_var("WORKOUT_TRACKER_MAX_CONNECTIONS", defaults.max_connections)?,
    })
  }
}

fn non_empty_var(key: &str) -> Option<String> {
  env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match non_empty_var(key) {
    None => Ok(default),
    Some(raw) => raw
      .parse()
      .map_err(|e| TrackerError::Config(format!("{} must be a number, got {:?}: {}", key, raw, e))),
  }
}

fn parse_bounded(key: &str, default: u32, max: u32) -> Result<u32> {
  let value = parse_var(key, default)?;
  if (1..=max).contains(&value) {
    Ok(value)
  } else {
    Err(TrackerError::Config(format!("{} must be between 1 and {}, got {}", key, max, value)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  const KEYS: [&str; 5] = [
    "WORKOUT_TRACKER_DATABASE_URL",
    "WORKOUT_TRACKER_OWNER",
    "WORKOUT_TRACKER_WEEKS_BACK",
    "WORKOUT_TRACKER_MONTHS_BACK",
    "WORKOUT_TRACKER_MAX_CONNECTIONS",
  ];

  #[test]
  #[serial]
  fn test_defaults_when_unset() {
    temp_env::with_vars_unset(KEYS, || {
      let config = AppConfig::from_env().unwrap();
      assert_eq!(config, AppConfig::default());
      assert_eq!(config.weeks_back, 12);
      assert_eq!(config.months_back, 12);
      assert_eq!(config.max_connections, 5);
      assert!(config.owner_id.is_none());
    });
  }

  #[test]
  #[serial]
  fn test_reads_overrides() {
    temp_env::with_vars(
      [
        ("WORKOUT_TRACKER_DATABASE_URL", Some("sqlite::memory:")),
        ("WORKOUT_TRACKER_OWNER", Some("user-42")),
        ("WORKOUT_TRACKER_WEEKS_BACK", Some("8")),
        ("WORKOUT_TRACKER_MONTHS_BACK", Some("6")),
        ("WORKOUT_TRACKER_MAX_CONNECTIONS", None),
      ],
      || {
        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.owner_id.as_deref(), Some("user-42"));
        assert_eq!(config.weeks_back, 8);
        assert_eq!(config.months_back, 6);
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
      },
    );
  }

  #[test]
  #[serial]
  fn test_blank_owner_is_none() {
    temp_env::with_var("WORKOUT_TRACKER_OWNER", Some("   "), || {
      assert!(AppConfig::from_env().unwrap().owner_id.is_none());
    });
  }

  #[test]
  #[serial]
  fn test_unparseable_number_is_config_error() {
    temp_env::with_var("WORKOUT_TRACKER_WEEKS_BACK", Some("twelve"), || {
      let err = AppConfig::from_env().unwrap_err();
      assert!(matches!(err, TrackerError::Config(_)));
      assert!(err.to_string().contains("WORKOUT_TRACKER_WEEKS_BACK"));
    });
  }

  #[test]
  #[serial]
  fn test_out_of_range_window_is_config_error() {
    temp_env::with_vars(
      [
        ("WORKOUT_TRACKER_WEEKS_BACK", Some("20000000")),
        ("WORKOUT_TRACKER_MONTHS_BACK", None),
      ],
      || {
        let err = AppConfig::from_env().unwrap_err();
        assert!(matches!(err, TrackerError::Config(_)));
        assert!(err.to_string().contains("between 1 and 520"));
      },
    );
    temp_env::with_var("WORKOUT_TRACKER_MONTHS_BACK", Some("0"), || {
      assert!(matches!(AppConfig::from_env(), Err(TrackerError::Config(_))));
    });
  }
}
