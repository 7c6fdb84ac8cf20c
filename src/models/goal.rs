use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};

// ---------------------------------------------------------------------------
/// Goal Kind: what a goal measures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalKind {
    /// Sum of workout minutes
    Duration,
    /// Number of workouts
    Count,
    /// Sum of workout kilometres
    Distance,
}

impl std::fmt::Display for GoalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Duration => write!(f, "duration"),
            Self::Count => write!(f, "count"),
            Self::Distance => write!(f, "distance"),
        }
    }
}

impl std::str::FromStr for GoalKind {
    type Err = TrackerError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "duration" => Ok(Self::Duration),
            "count" => Ok(Self::Count),
            "distance" => Ok(Self::Distance),
            _ => Err(TrackerError::InvalidInput(format!("Unknown goal kind: {}", s))),
        }
    }
}

// ---------------------------------------------------------------------------
/// Goal Window: the date range a goal is evaluated over
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum GoalWindow {
    /// Since Monday 00:00 of the current week
    CurrentWeek,
    /// Since the 1st of the current month
    CurrentMonth,
    /// Rolling 30 days
    Last30Days,
    /// Rolling 7 days
    #[default]
    Last7Days,
}

impl GoalWindow {
    /// Infer a window from a legacy free-text description.
    ///
    /// Checked in priority order: week, month, "30", otherwise seven days.
    pub fn infer_from_description(description: &str) -> Self {
        let text = description.to_lowercase();
        if text.contains("week") || text.contains("woche") {
            Self::CurrentWeek
        } else if text.contains("month") || text.contains("monat") {
            Self::CurrentMonth
        } else if text.contains("30") {
            Self::Last30Days
        } else {
            Self::Last7Days
        }
    }
}

impl std::fmt::Display for GoalWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CurrentWeek => write!(f, "current_week"),
            Self::CurrentMonth => write!(f, "current_month"),
            Self::Last30Days => write!(f, "last_30_days"),
            Self::Last7Days => write!(f, "last_7_days"),
        }
    }
}

impl std::str::FromStr for GoalWindow {
    type Err = TrackerError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "current_week" => Ok(Self::CurrentWeek),
            "current_month" => Ok(Self::CurrentMonth),
            "last_30_days" => Ok(Self::Last30Days),
            "last_7_days" => Ok(Self::Last7Days),
            _ => Err(TrackerError::InvalidInput(format!("Unknown goal window: {}", s))),
        }
    }
}

// ---------------------------------------------------------------------------
/// Goal Record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalRecord {
    pub id: i64,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub emoji: String,
    pub kind: GoalKind,
    pub target_value: f64,
    pub current_value: f64,
    pub active: bool,
    /// Always `current_value >= target_value`
    pub completed: bool,
    /// Explicit evaluation window; legacy goals leave this unset
    pub window: Option<GoalWindow>,
    pub deadline: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl GoalRecord {
    /// Explicit window, or the one implied by the description
    pub fn effective_window(&self) -> GoalWindow {
        self.window
            .unwrap_or_else(|| GoalWindow::infer_from_description(&self.description))
    }

    /// Whether the progress evaluator should touch this goal
    pub fn needs_progress_update(&self) -> bool {
        self.active && !self.completed
    }

    pub(crate) fn refresh_completed(&mut self) {
        self.completed = is_completed(self.current_value, self.target_value);
    }
}

pub fn is_completed(current_value: f64, target_value: f64) -> bool {
    current_value >= target_value
}

/// For inserting new goals (without id, owner, timestamps)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGoal {
    pub title: String,
    pub description: String,
    pub emoji: String,
    pub kind: GoalKind,
    pub target_value: f64,
    pub current_value: f64,
    pub active: bool,
    pub window: Option<GoalWindow>,
    pub deadline: Option<DateTime<Utc>>,
    pub category: Option<String>,
}

impl NewGoal {
    /// Reject goals missing display fields or with a non-positive target
    pub fn validate(&self) -> Result<()> {
        let missing = [
            ("title", &self.title),
            ("description", &self.description),
            ("emoji", &self.emoji),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty());

        if let Some((field, _)) = missing {
            return Err(TrackerError::InvalidInput(format!("Goal {} is required", field)));
        }
        if !self.target_value.is_finite() || self.target_value <= 0.0 {
            return Err(TrackerError::InvalidInput(format!(
                "Goal target must be positive, got {}",
                self.target_value
            )));
        }
        if !self.current_value.is_finite() || self.current_value < 0.0 {
            return Err(TrackerError::InvalidInput(format!(
                "Goal progress must be non-negative, got {}",
                self.current_value
            )));
        }
        Ok(())
    }
}

/// Partial goal update. `completed` is not settable; it follows from the
/// resulting current and target values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoalUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub emoji: Option<String>,
    pub target_value: Option<f64>,
    pub current_value: Option<f64>,
    pub active: Option<bool>,
    pub window: Option<GoalWindow>,
    pub deadline: Option<DateTime<Utc>>,
    pub category: Option<String>,
}

impl GoalUpdate {
    pub fn progress(current_value: f64) -> Self {
        Self {
            current_value: Some(current_value),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(target) = self.target_value {
            if !target.is_finite() || target <= 0.0 {
                return Err(TrackerError::InvalidInput(format!(
                    "Goal target must be positive, got {}",
                    target
                )));
            }
        }
        if let Some(current) = self.current_value {
            if !current.is_finite() || current < 0.0 {
                return Err(TrackerError::InvalidInput(format!(
                    "Goal progress must be non-negative, got {}",
                    current
                )));
            }
        }
        Ok(())
    }

    pub fn apply(&self, goal: &mut GoalRecord) {
        if let Some(title) = &self.title {
            goal.title = title.clone();
        }
        if let Some(description) = &self.description {
            goal.description = description.clone();
        }
        if let Some(emoji) = &self.emoji {
            goal.emoji = emoji.clone();
        }
        if let Some(target) = self.target_value {
            goal.target_value = target;
        }
        if let Some(current) = self.current_value {
            goal.current_value = current;
        }
        if let Some(active) = self.active {
            goal.active = active;
        }
        if let Some(window) = self.window {
            goal.window = Some(window);
        }
        if let Some(deadline) = self.deadline {
            goal.deadline = Some(deadline);
        }
        if let Some(category) = &self.category {
            goal.category = Some(category.clone());
        }
        goal.refresh_completed();
    }
}

/// Predefined goal a user can adopt with one click
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalTemplate {
    pub id: String,
    pub title: String,
    pub description: String,
    pub emoji: String,
    pub kind: GoalKind,
    pub target_value: f64,
    pub window: Option<GoalWindow>,
    pub category: Option<String>,
}

impl GoalTemplate {
    pub fn to_new_goal(&self) -> NewGoal {
        NewGoal {
            title: self.title.clone(),
            description: self.description.clone(),
            emoji: self.emoji.clone(),
            kind: self.kind,
            target_value: self.target_value,
            current_value: 0.0,
            active: true,
            window: self.window,
            deadline: None,
            category: self.category.clone(),
        }
    }
}
