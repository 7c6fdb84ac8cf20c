//! Tracing subscriber setup
//!
//! Logs go to stderr so command output on stdout stays machine readable.

use std::env;
use std::io;

use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{Result, TrackerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Json,
  Pretty,
  Compact,
}

impl LogFormat {
  fn parse(raw: Option<&str>) -> Self {
    match raw.map(str::trim) {
      Some("json") => LogFormat::Json,
      Some("compact") => LogFormat::Compact,
      _ => LogFormat::Pretty,
    }
  }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
  /// Filter directive, e.g. `info` or `workout_tracker_lib=debug`
  pub level: String,
  pub format: LogFormat,
  /// Include source file and line
  pub include_location: bool,
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
      format: LogFormat::Pretty,
      include_location: false,
    }
  }
}

impl LoggingConfig {
  /// Read `RUST_LOG`, `LOG_FORMAT` and `LOG_INCLUDE_LOCATION`
  pub fn from_env() -> Self {
    Self {
      level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
      format: LogFormat::parse(env::var("LOG_FORMAT").ok().as_deref()),
      include_location: env::var("LOG_INCLUDE_LOCATION").is_ok(),
    }
  }

  fn filter(&self) -> EnvFilter {
    EnvFilter::new(&self.level)
      // sqlx logs every statement at info
      .add_directive("sqlx=warn".parse().unwrap_or_else(|_| tracing::Level::WARN.into()))
  }

  /// Install the global subscriber
  pub fn init(&self) -> Result<()> {
    let registry = tracing_subscriber::registry().with(self.filter());

    let installed = match self.format {
      LogFormat::Json => registry
        .with(
          fmt::layer()
            .with_file(self.include_location)
            .with_line_number(self.include_location)
            .with_writer(io::stderr)
            .json(),
        )
        .try_init(),
      LogFormat::Pretty => registry
        .with(
          fmt::layer()
            .with_file(self.include_location)
            .with_line_number(self.include_location)
            .with_target(true)
            .with_writer(io::stderr),
        )
        .try_init(),
      LogFormat::Compact => registry
        .with(
          fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(io::stderr),
        )
        .try_init(),
    };

    installed.map_err(|e| TrackerError::Config(format!("Failed to install logger: {}", e)))?;
    debug!(level = %self.level, format = ?self.format, "Logging initialized");
    Ok(())
  }
}
