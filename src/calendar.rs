//! Calendar helpers shared by the statistics and goal modules
//!
//! Weeks start on Monday and are numbered ISO-8601 style: a week belongs to
//! the year that contains its Thursday.

use chrono::{Datelike, Days, Duration, Months, NaiveDate, NaiveDateTime};

/// ISO week identity: (ISO year, week number)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WeekKey {
  pub year: i32,
  pub week: u32,
}

impl WeekKey {
  pub fn of(date: NaiveDate) -> Self {
    let iso = date.iso_week();
    Self {
      year: iso.year(),
      week: iso.week(),
    }
  }
}

impl std::fmt::Display for WeekKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}-W{:02}", self.year, self.week)
  }
}

/// Monday of the week containing `date`
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
  date
    .checked_sub_signed(Duration::days(date.weekday().num_days_from_monday() as i64))
    .unwrap_or(NaiveDate::MIN)
}

pub fn start_of_month(date: NaiveDate) -> NaiveDate {
  date.with_day(1).unwrap_or(date)
}

/// Monday `weeks` weeks before the week of `date`; None past the
/// representable calendar
pub fn weeks_before(date: NaiveDate, weeks: u32) -> Option<NaiveDate> {
  start_of_week(date).checked_sub_days(Days::new(u64::from(weeks) * 7))
}

/// First day of the month `months` months before the month of `date`; None
/// past the representable calendar
pub fn months_before(date: NaiveDate, months: u32) -> Option<NaiveDate> {
  start_of_month(date).checked_sub_months(Months::new(months))
}

/// First day of the month after the month of `date`
pub fn next_month_start(date: NaiveDate) -> NaiveDate {
  let total = date.year() * 12 + date.month0() as i32 + 1;
  NaiveDate::from_ymd_opt(total.div_euclid(12), total.rem_euclid(12) as u32 + 1, 1)
    .unwrap_or_else(|| start_of_month(date))
}

pub fn midnight(date: NaiveDate) -> NaiveDateTime {
  date.and_time(chrono::NaiveTime::MIN)
}

/// `round(numerator / denominator)` with halves rounded up; 0 when the
/// denominator is not positive.
pub fn round_ratio(numerator: i64, denominator: i64) -> i64 {
  if denominator <= 0 {
    return 0;
  }
  (2 * numerator + denominator).div_euclid(2 * denominator)
}

/// Percentage of `part` in `whole`, rounded half-up
pub fn round_percent(part: i64, whole: i64) -> i64 {
  round_ratio(part * 100, whole)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
  }

  #[test]
  fn test_iso_week_year_boundaries() {
    // Jan 1 2021 is a Friday: still week 53 of 2020
    assert_eq!(WeekKey::of(d(2021, 1, 1)), WeekKey { year: 2020, week: 53 });
    // Dec 31 2024 is a Tuesday: already week 1 of 2025
    assert_eq!(WeekKey::of(d(2024, 12, 31)), WeekKey { year: 2025, week: 1 });
    // Jan 4 is always in week 1
    assert_eq!(WeekKey::of(d(2024, 1, 4)), WeekKey { year: 2024, week: 1 });
    assert_eq!(WeekKey::of(d(2024, 1, 4)).to_string(), "2024-W01");
    assert_eq!(WeekKey::of(d(2024, 5, 15)).to_string(), "2024-W20");
  }

  #[test]
  fn test_start_of_week_is_monday() {
    assert_eq!(start_of_week(d(2024, 5, 15)), d(2024, 5, 13)); // Wednesday
    assert_eq!(start_of_week(d(2024, 5, 13)), d(2024, 5, 13)); // Monday
    assert_eq!(start_of_week(d(2024, 5, 19)), d(2024, 5, 13)); // Sunday
    assert_eq!(start_of_week(d(2024, 1, 2)), d(2024, 1, 1));
  }

  #[test]
  fn test_month_arithmetic_crosses_years() {
    assert_eq!(months_before(d(2024, 3, 17), 0), Some(d(2024, 3, 1)));
    assert_eq!(months_before(d(2024, 3, 17), 3), Some(d(2023, 12, 1)));
    assert_eq!(months_before(d(2024, 1, 31), 13), Some(d(2022, 12, 1)));
    assert_eq!(next_month_start(d(2023, 12, 5)), d(2024, 1, 1));
    assert_eq!(next_month_start(d(2024, 2, 29)), d(2024, 3, 1));
  }

  #[test]
  fn test_offsets_stop_at_calendar_limits() {
    assert_eq!(weeks_before(d(2024, 5, 15), 0), Some(d(2024, 5, 13)));
    assert_eq!(weeks_before(d(2024, 1, 3), 1), Some(d(2023, 12, 25)));
    assert_eq!(weeks_before(d(2024, 5, 15), u32::MAX), None);
    assert_eq!(months_before(d(2024, 5, 15), u32::MAX), None);
  }

  #[test]
  fn test_rounding_is_half_up_and_guarded() {
    assert_eq!(round_ratio(5, 2), 3);
    assert_eq!(round_ratio(7, 3), 2);
    assert_eq!(round_ratio(0, 4), 0);
    assert_eq!(round_ratio(10, 0), 0);
    assert_eq!(round_percent(1, 3), 33);
    assert_eq!(round_percent(2, 3), 67);
    assert_eq!(round_percent(1, 8), 13); // 12.5 rounds up
  }
}
