//! Injectable time source
//!
//! Streaks, goal windows and the weekly/monthly rollups all depend on "now"
//! and on the user's local calendar. Everything that needs either goes
//! through a [`Clock`] so tests can pin both.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Offset, Utc};

pub trait Clock: Send + Sync {
  /// Current instant
  fn now(&self) -> DateTime<Utc>;

  /// Wall-clock time of `at` in the user's local timezone
  fn to_local(&self, at: DateTime<Utc>) -> NaiveDateTime;

  fn now_local(&self) -> NaiveDateTime {
    self.to_local(self.now())
  }

  fn today(&self) -> NaiveDate {
    self.now_local().date()
  }
}

/// Real wall clock in the host's timezone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }

  fn to_local(&self, at: DateTime<Utc>) -> NaiveDateTime {
    at.with_timezone(&Local).naive_local()
  }
}

/// Frozen clock with a fixed UTC offset
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
  now: DateTime<Utc>,
  offset: FixedOffset,
}

impl FixedClock {
  pub fn new(now: DateTime<Utc>, offset: FixedOffset) -> Self {
    Self { now, offset }
  }

  /// Clock whose local time equals UTC
  pub fn utc(now: DateTime<Utc>) -> Self {
    Self::new(now, Utc.fix())
  }

  /// Clock frozen at the given local wall-clock time (UTC offset zero)
  pub fn at_local(local: NaiveDateTime) -> Self {
    Self::utc(local.and_utc())
  }
}

impl Clock for FixedClock {
  fn now(&self) -> DateTime<Utc> {
    self.now
  }

  fn to_local(&self, at: DateTime<Utc>) -> NaiveDateTime {
    at.with_timezone(&self.offset).naive_local()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn test_fixed_clock_applies_offset() {
    let now = Utc.with_ymd_and_hms(2024, 3, 10, 23, 30, 0).unwrap();
    let berlin = FixedClock::new(now, FixedOffset::east_opt(3600).unwrap());

    // 23:30 UTC is already the next local day at UTC+1
    assert_eq!(berlin.today(), NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
    assert_eq!(FixedClock::utc(now).today(), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
  }

  #[test]
  fn test_at_local_round_trips_wall_clock() {
    let local = NaiveDate::from_ymd_opt(2024, 6, 1)
      .unwrap()
      .and_hms_opt(7, 15, 0)
      .unwrap();
    let clock = FixedClock::at_local(local);
    assert_eq!(clock.now_local(), local);
  }
}
