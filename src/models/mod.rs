pub mod goal;
pub mod profile;
pub mod workout;

pub use goal::{GoalKind, GoalRecord, GoalTemplate, GoalUpdate, GoalWindow, NewGoal};
pub use profile::{ProfileData, ProfilePreferences, ProfileUpdate, Theme, UserProfile};
pub use workout::{NewWorkout, WorkoutRecord, WorkoutUpdate};
