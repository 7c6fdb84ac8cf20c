use serde::Serialize;

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
  #[error("Not authenticated: no owner signed in")]
  NotAuthenticated,

  #[error("{kind} not found: {id}")]
  NotFound { kind: &'static str, id: String },

  #[error("Invalid input: {0}")]
  InvalidInput(String),

  #[error("Backend unavailable: {0}")]
  BackendUnavailable(String),

  #[error("Configuration error: {0}")]
  Config(String),
}

pub type Result<T> = std::result::Result<T, TrackerError>;

impl TrackerError {
  pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
    TrackerError::NotFound {
      kind,
      id: id.to_string(),
    }
  }
}

impl From<sqlx::Error> for TrackerError {
  fn from(e: sqlx::Error) -> Self {
    match e {
      sqlx::Error::RowNotFound => TrackerError::not_found("Record", "<unknown>"),
      other => TrackerError::BackendUnavailable(other.to_string()),
    }
  }
}

impl From<sqlx::migrate::MigrateError> for TrackerError {
  fn from(e: sqlx::migrate::MigrateError) -> Self {
    TrackerError::BackendUnavailable(format!("Migration failed: {}", e))
  }
}

impl Serialize for TrackerError {
  fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}
