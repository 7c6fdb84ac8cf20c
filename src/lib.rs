pub mod calendar;
pub mod clock;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod goals;
pub mod logging;
pub mod models;
pub mod profile;
pub mod statistics;
pub mod store;
pub mod workouts;

#[cfg(test)]
mod test_utils;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Result, TrackerError};
pub use store::{MemoryStore, RecordStore, SqliteStore, Subscription};
