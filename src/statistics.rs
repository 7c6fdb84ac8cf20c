//! Workout statistics computed from a snapshot of records
//!
//! Every function here is a read-only pass over the records it is given.
//! Records whose timestamp cannot be determined still count toward totals,
//! but are left out of anything bucketed by day, week or month.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Weekday};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::calendar::{
  months_before, next_month_start, round_percent, round_ratio, weeks_before, WeekKey,
};
use crate::clock::Clock;
use crate::models::WorkoutRecord;

pub const DEFAULT_WEEKS_BACK: u32 = 12;
pub const DEFAULT_MONTHS_BACK: u32 = 12;
/// Upper bounds accepted from configuration and commands
pub const MAX_WEEKS_BACK: u32 = 520;
pub const MAX_MONTHS_BACK: u32 = 120;

/// ---------------------------------------------------------------------------
/// Summary Statistics
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutStats {
  pub total_workouts: i64,
  /// Minutes
  pub total_duration: i64,
  pub average_duration: i64,
  /// Distinct ISO weeks with at least one workout
  pub total_active_weeks: i64,
  pub longest_workout: i64,
  pub shortest_workout: i64,
  pub most_frequent_type: String,
  pub current_streak: i64,
  pub longest_streak: i64,
  /// Most workouts logged in a single ISO week
  pub best_week: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streaks {
  pub current_streak: i64,
  pub longest_streak: i64,
}

/// Head figures of [`WorkoutStats`], cheap enough for every snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickSummary {
  pub total_workouts: i64,
  pub total_duration: i64,
  pub average_duration: i64,
}

pub fn quick_summary(records: &[WorkoutRecord]) -> QuickSummary {
  let total_workouts = records.len() as i64;
  let total_duration: i64 = records.iter().map(WorkoutRecord::duration).sum();

  QuickSummary {
    total_workouts,
    total_duration,
    average_duration: round_ratio(total_duration, total_workouts),
  }
}

pub fn calculate_workout_stats(records: &[WorkoutRecord], clock: &dyn Clock) -> WorkoutStats {
  if records.is_empty() {
    return WorkoutStats::default();
  }

  let summary = quick_summary(records);
  let durations = records.iter().map(WorkoutRecord::duration);
  let longest_workout = durations.clone().max().unwrap_or(0);
  let shortest_workout = durations.min().unwrap_or(0);

  let active_weeks: HashSet<WeekKey> = local_times(records, clock)
    .map(|at| WeekKey::of(at.date()))
    .collect();

  let streaks = calculate_streaks(records, clock);

  WorkoutStats {
    total_workouts: summary.total_workouts,
    total_duration: summary.total_duration,
    average_duration: summary.average_duration,
    total_active_weeks: active_weeks.len() as i64,
    longest_workout,
    shortest_workout,
    most_frequent_type: most_frequent_label(records.iter()).unwrap_or_default(),
    current_streak: streaks.current_streak,
    longest_streak: streaks.longest_streak,
    best_week: calculate_best_week(records, clock),
  }
}

/// Day streaks over distinct local calendar days.
///
/// The current streak counts back from the latest workout day up to today,
/// and only when that day is today or yesterday.
pub fn calculate_streaks(records: &[WorkoutRecord], clock: &dyn Clock) -> Streaks {
  let days: Vec<NaiveDate> = local_times(records, clock)
    .map(|at| at.date())
    .collect::<BTreeSet<_>>()
    .into_iter()
    .collect();

  if days.is_empty() {
    return Streaks::default();
  }

  let mut longest_streak = 1;
  let mut run = 1;
  for pair in days.windows(2) {
    if pair[1] - pair[0] == Duration::days(1) {
      run += 1;
      longest_streak = longest_streak.max(run);
    } else {
      run = 1;
    }
  }

  let today = clock.today();
  // Days logged in the future never extend the current streak
  let past: Vec<NaiveDate> = days.into_iter().filter(|day| *day <= today).collect();

  let current_streak = match past.last() {
    Some(last) if (today - *last).num_days() <= 1 => {
      let mut streak = 1;
      for pair in past.windows(2).rev() {
        if pair[1] - pair[0] != Duration::days(1) {
          break;
        }
        streak += 1;
      }
      streak
    }
    _ => 0,
  };

  Streaks {
    current_streak,
    longest_streak,
  }
}

/// Highest workout count of any single ISO week
pub fn calculate_best_week(records: &[WorkoutRecord], clock: &dyn Clock) -> i64 {
  let mut per_week: HashMap<WeekKey, i64> = HashMap::new();
  for at in local_times(records, clock) {
    *per_week.entry(WeekKey::of(at.date())).or_insert(0) += 1;
  }
  per_week.into_values().max().unwrap_or(0)
}

/// ---------------------------------------------------------------------------
/// Weekly and Monthly Rollups
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyStats {
  /// ISO week label, e.g. `2024-W19`
  pub week: String,
  /// Monday
  pub week_start: NaiveDate,
  /// Sunday
  pub week_end: NaiveDate,
  pub workouts: i64,
  pub total_duration: i64,
}

/// One entry per calendar week, oldest first, ending with the current week
pub fn get_weekly_stats(
  records: &[WorkoutRecord],
  weeks_back: u32,
  clock: &dyn Clock,
) -> Vec<WeeklyStats> {
  let today = clock.today();
  let dated: Vec<(NaiveDate, i64)> = dated_durations(records, clock);

  // Newest first so the walk stops at the calendar's lower limit
  let mut weeks: Vec<WeeklyStats> = (0..weeks_back)
    .map_while(|offset| weeks_before(today, offset))
    .map(|week_start| {
      let week_end = week_start + Duration::days(6);
      let in_week = dated
        .iter()
        .filter(|(day, _)| *day >= week_start && *day <= week_end);

      let (workouts, total_duration) =
        in_week.fold((0, 0), |(count, total), (_, minutes)| (count + 1, total + minutes));

      WeeklyStats {
        week: WeekKey::of(week_start).to_string(),
        week_start,
        week_end,
        workouts,
        total_duration,
      }
    })
    .collect();

  weeks.reverse();
  weeks
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyStats {
  pub year: i32,
  /// 1-based
  pub month: u32,
  pub month_start: NaiveDate,
  pub workouts: i64,
  pub total_duration: i64,
  pub average_duration: i64,
  /// Distinct days with at least one workout
  pub active_days: i64,
  /// Empty when the month has no workouts
  pub top_type: String,
}

/// One entry per calendar month, oldest first, ending with the current month
pub fn get_monthly_stats(
  records: &[WorkoutRecord],
  months_back: u32,
  clock: &dyn Clock,
) -> Vec<MonthlyStats> {
  let today = clock.today();
  let dated: Vec<(NaiveDate, &WorkoutRecord)> = records
    .iter()
    .filter_map(|record| record.local_time(clock).map(|at| (at.date(), record)))
    .collect();

  let mut months: Vec<MonthlyStats> = (0..months_back)
    .map_while(|offset| months_before(today, offset))
    .map(|month_start| {
      let month_end = next_month_start(month_start);
      let in_month: Vec<(NaiveDate, &WorkoutRecord)> = dated
        .iter()
        .filter(|(day, _)| *day >= month_start && *day < month_end)
        .copied()
        .collect();

      let workouts = in_month.len() as i64;
      let total_duration: i64 = in_month.iter().map(|(_, r)| r.duration()).sum();
      let active_days = in_month
        .iter()
        .map(|(day, _)| *day)
        .collect::<HashSet<_>>()
        .len() as i64;

      MonthlyStats {
        year: month_start.year(),
        month: month_start.month(),
        month_start,
        workouts,
        total_duration,
        average_duration: round_ratio(total_duration, workouts),
        active_days,
        top_type: most_frequent_label(in_month.iter().map(|(_, r)| *r)).unwrap_or_default(),
      }
    })
    .collect();

  months.reverse();
  months
}

/// ---------------------------------------------------------------------------
/// Breakdown by Type
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutTypeStats {
  /// Category, or the workout type when no category is set
  pub label: String,
  pub count: i64,
  pub total_duration: i64,
  pub average_duration: i64,
  /// Share of all workouts, rounded
  pub percentage: i64,
  /// Local time of the most recent workout with this label
  pub last_performed: Option<NaiveDateTime>,
}

/// Per-label breakdown, most frequent first
pub fn get_workout_type_stats(records: &[WorkoutRecord], clock: &dyn Clock) -> Vec<WorkoutTypeStats> {
  let total = records.len() as i64;
  let mut order: Vec<&str> = Vec::new();
  let mut by_label: HashMap<&str, WorkoutTypeStats> = HashMap::new();

  for record in records {
    let label = record.label();
    let entry = by_label.entry(label).or_insert_with(|| {
      order.push(label);
      WorkoutTypeStats {
        label: label.to_string(),
        count: 0,
        total_duration: 0,
        average_duration: 0,
        percentage: 0,
        last_performed: None,
      }
    });

    entry.count += 1;
    entry.total_duration += record.duration();
    if let Some(at) = record.local_time(clock) {
      entry.last_performed = Some(entry.last_performed.map_or(at, |prev| prev.max(at)));
    }
  }

  let mut stats: Vec<WorkoutTypeStats> = order
    .into_iter()
    .filter_map(|label| by_label.remove(label))
    .map(|mut s| {
      s.average_duration = round_ratio(s.total_duration, s.count);
      s.percentage = round_percent(s.count, total);
      s
    })
    .collect();

  // Stable: equal counts keep first-seen order
  stats.sort_by(|a, b| b.count.cmp(&a.count));
  stats
}

/// ---------------------------------------------------------------------------
/// Day-of-Week and Time-of-Day Histograms
/// ---------------------------------------------------------------------------

const WEEKDAYS: [Weekday; 7] = [
  Weekday::Mon,
  Weekday::Tue,
  Weekday::Wed,
  Weekday::Thu,
  Weekday::Fri,
  Weekday::Sat,
  Weekday::Sun,
];

fn weekday_name(day: Weekday) -> &'static str {
  match day {
    Weekday::Mon => "Monday",
    Weekday::Tue => "Tuesday",
    Weekday::Wed => "Wednesday",
    Weekday::Thu => "Thursday",
    Weekday::Fri => "Friday",
    Weekday::Sat => "Saturday",
    Weekday::Sun => "Sunday",
  }
}

/// Workout counts for all seven weekdays, Monday first
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeekdayCounts([i64; 7]);

impl WeekdayCounts {
  pub fn get(&self, day: Weekday) -> i64 {
    self.0[day.num_days_from_monday() as usize]
  }

  pub fn total(&self) -> i64 {
    self.0.iter().sum()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&'static str, i64)> + '_ {
    WEEKDAYS.iter().map(move |day| (weekday_name(*day), self.get(*day)))
  }
}

impl Serialize for WeekdayCounts {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(7))?;
    for (name, count) in self.iter() {
      map.serialize_entry(name, &count)?;
    }
    map.end()
  }
}

pub fn get_workout_frequency_by_day(records: &[WorkoutRecord], clock: &dyn Clock) -> WeekdayCounts {
  let mut counts = [0; 7];
  for at in local_times(records, clock) {
    counts[at.weekday().num_days_from_monday() as usize] += 1;
  }
  WeekdayCounts(counts)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeBand {
  /// 05:00 - 09:00
  Early,
  /// 09:00 - 12:00
  Morning,
  /// 12:00 - 15:00
  Midday,
  /// 15:00 - 18:00
  Afternoon,
  /// 18:00 - 21:00
  Evening,
  /// 21:00 - 05:00
  Night,
}

impl TimeBand {
  pub const ALL: [TimeBand; 6] = [
    TimeBand::Early,
    TimeBand::Morning,
    TimeBand::Midday,
    TimeBand::Afternoon,
    TimeBand::Evening,
    TimeBand::Night,
  ];

  pub fn of_hour(hour: u32) -> Self {
    match hour {
      5..=8 => TimeBand::Early,
      9..=11 => TimeBand::Morning,
      12..=14 => TimeBand::Midday,
      15..=17 => TimeBand::Afternoon,
      18..=20 => TimeBand::Evening,
      _ => TimeBand::Night,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      TimeBand::Early => "Early",
      TimeBand::Morning => "Morning",
      TimeBand::Midday => "Midday",
      TimeBand::Afternoon => "Afternoon",
      TimeBand::Evening => "Evening",
      TimeBand::Night => "Night",
    }
  }

  fn index(&self) -> usize {
    *self as usize
  }
}

/// Workout counts for all six time-of-day bands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeDistribution([i64; 6]);

impl TimeDistribution {
  pub fn get(&self, band: TimeBand) -> i64 {
    self.0[band.index()]
  }

  pub fn total(&self) -> i64 {
    self.0.iter().sum()
  }

  pub fn iter(&self) -> impl Iterator<Item = (TimeBand, i64)> + '_ {
    TimeBand::ALL.iter().map(move |band| (*band, self.get(*band)))
  }
}

impl Serialize for TimeDistribution {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(6))?;
    for (band, count) in self.iter() {
      map.serialize_entry(band.as_str(), &count)?;
    }
    map.end()
  }
}

pub fn get_workout_time_distribution(
  records: &[WorkoutRecord],
  clock: &dyn Clock,
) -> TimeDistribution {
  let mut counts = [0; 6];
  for at in local_times(records, clock) {
    counts[TimeBand::of_hour(at.hour()).index()] += 1;
  }
  TimeDistribution(counts)
}

/// ---------------------------------------------------------------------------
/// Helpers
/// ---------------------------------------------------------------------------

fn local_times<'a>(
  records: &'a [WorkoutRecord],
  clock: &'a dyn Clock,
) -> impl Iterator<Item = NaiveDateTime> + 'a {
  records.iter().filter_map(move |record| record.local_time(clock))
}

fn dated_durations(records: &[WorkoutRecord], clock: &dyn Clock) -> Vec<(NaiveDate, i64)> {
  records
    .iter()
    .filter_map(|record| record.local_time(clock).map(|at| (at.date(), record.duration())))
    .collect()
}

/// Most common label; ties go to the label seen first
fn most_frequent_label<'a>(records: impl Iterator<Item = &'a WorkoutRecord>) -> Option<String> {
  let mut order: Vec<&str> = Vec::new();
  let mut counts: HashMap<&str, i64> = HashMap::new();

  for record in records {
    let label = record.label();
    *counts.entry(label).or_insert_with(|| {
      order.push(label);
      0
    }) += 1;
  }

  let mut best: Option<(&str, i64)> = None;
  for label in order {
    let count = counts.get(label).copied().unwrap_or(0);
    if best.map_or(true, |(_, top)| count > top) {
      best = Some((label, count));
    }
  }
  best.map(|(label, _)| label.to_string())
}
