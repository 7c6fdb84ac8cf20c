//! `workout-tracker` command line
//!
//! Prints every result as pretty JSON on stdout; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use workout_tracker_lib::commands::{self, goals, statistics, AppState};
use workout_tracker_lib::config::AppConfig;
use workout_tracker_lib::logging::LoggingConfig;
use workout_tracker_lib::models::NewWorkout;
use workout_tracker_lib::statistics::{MAX_MONTHS_BACK, MAX_WEEKS_BACK};

#[derive(Parser)]
#[command(
  name = "workout-tracker",
  about = "Workout log, goals and training statistics",
  version
)]
struct Cli {
  #[command(subcommand)]
  command: Command,

  /// Owner id; defaults to WORKOUT_TRACKER_OWNER
  #[arg(long, global = true)]
  owner: Option<String>,

  /// Database URL override
  #[arg(long, global = true)]
  database_url: Option<String>,
}

#[derive(Subcommand)]
enum Command {
  /// Summary statistics over all workouts
  Summary {
    /// Only count, total and average duration
    #[arg(long)]
    quick: bool,
  },

  /// Per-week rollup ending with the current week
  Weekly {
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_WEEKS_BACK as i64))]
    weeks: Option<u32>,
  },

  /// Per-month rollup ending with the current month
  Monthly {
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_MONTHS_BACK as i64))]
    months: Option<u32>,
  },

  /// Breakdown by workout type or category
  Types,

  /// Workouts per weekday
  Days,

  /// Workouts per time-of-day band
  Times,

  Goals {
    #[command(subcommand)]
    action: GoalCommand,
  },

  Workout {
    #[command(subcommand)]
    action: WorkoutCommand,
  },

  Profile {
    #[command(subcommand)]
    action: ProfileCommand,
  },
}

#[derive(Subcommand)]
enum GoalCommand {
  /// Goals with their live progress
  List,
  /// Recompute and store progress of all open goals
  Refresh,
  /// Available goal templates
  Templates,
  /// Create a goal from a template id such as `template_0`
  Adopt { template_id: String },
  /// Pause or resume a goal
  Toggle { goal_id: i64 },
  Delete { goal_id: i64 },
  /// Show or set the weekly workout target
  Weekly {
    #[arg(long)]
    set: Option<i64>,
  },
}

#[derive(Subcommand)]
enum WorkoutCommand {
  Add {
    /// Workout type, e.g. Run
    #[arg(long = "type")]
    workout_type: String,
    #[arg(long)]
    category: Option<String>,
    /// Minutes
    #[arg(long)]
    duration: Option<i64>,
    /// Kilometres
    #[arg(long)]
    distance: Option<f64>,
    /// Date shown with the workout, e.g. 2024-05-14. Display only:
    /// statistics and goals count the workout at the time it is logged
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    notes: Option<String>,
  },
  List,
  Delete { workout_id: i64 },
}

#[derive(Subcommand)]
enum ProfileCommand {
  Show,
  /// Create the starter profile if none exists
  Init {
    #[arg(long)]
    email: String,
    #[arg(long, default_value = "")]
    name: String,
  },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  let mut config = AppConfig::load()?;
  LoggingConfig::from_env().init()?;
  if let Some(url) = cli.database_url {
    config.database_url = url;
  }

  let state = AppState::connect(config)
    .await
    .context("Failed to open workout database")?;
  let owner = cli.owner.as_deref();

  match cli.command {
    Command::Summary { quick: true } => print_json(&statistics::get_quick_summary(&state, owner).await?),
    Command::Summary { quick: false } => print_json(&statistics::get_workout_stats(&state, owner).await?),
    Command::Weekly { weeks } => print_json(&statistics::get_weekly_stats(&state, owner, weeks).await?),
    Command::Monthly { months } => {
      print_json(&statistics::get_monthly_stats(&state, owner, months).await?)
    }
    Command::Types => print_json(&statistics::get_workout_type_stats(&state, owner).await?),
    Command::Days => print_json(&statistics::get_frequency_by_day(&state, owner).await?),
    Command::Times => print_json(&statistics::get_time_distribution(&state, owner).await?),

    Command::Goals { action } => match action {
      GoalCommand::List => print_json(&goals::list_goals(&state, owner).await?),
      GoalCommand::Refresh => print_json(&goals::refresh_goal_progress(&state, owner).await?),
      GoalCommand::Templates => print_json(&goals::get_goal_templates()),
      GoalCommand::Adopt { template_id } => {
        let id = goals::add_goal_from_template(&state, owner, &template_id).await?;
        print_json(&serde_json::json!({ "goal_id": id }))
      }
      GoalCommand::Toggle { goal_id } => {
        let active = goals::toggle_goal(&state, owner, goal_id).await?;
        print_json(&serde_json::json!({ "goal_id": goal_id, "active": active }))
      }
      GoalCommand::Delete { goal_id } => {
        goals::delete_goal(&state, owner, goal_id).await?;
        print_json(&serde_json::json!({ "deleted": goal_id }))
      }
      GoalCommand::Weekly { set } => {
        if let Some(weekly_goal) = set {
          goals::set_weekly_goal(&state, owner, weekly_goal).await?;
        }
        let weekly_goal = goals::get_weekly_goal(&state, owner).await;
        print_json(&serde_json::json!({ "weekly_goal": weekly_goal }))
      }
    },

    Command::Workout { action } => match action {
      WorkoutCommand::Add {
        workout_type,
        category,
        duration,
        distance,
        date,
        notes,
      } => {
        let workout = NewWorkout {
          workout_type,
          category,
          duration_minutes: duration,
          distance_km: distance,
          date,
          notes,
          ..Default::default()
        };
        let id = commands::add_workout(&state, owner, workout).await?;
        print_json(&serde_json::json!({ "workout_id": id }))
      }
      WorkoutCommand::List => print_json(&commands::get_workouts(&state, owner).await?),
      WorkoutCommand::Delete { workout_id } => {
        commands::delete_workout(&state, owner, workout_id).await?;
        print_json(&serde_json::json!({ "deleted": workout_id }))
      }
    },

    Command::Profile { action } => match action {
      ProfileCommand::Show => print_json(&commands::get_profile(&state, owner).await?),
      ProfileCommand::Init { email, name } => {
        print_json(&commands::init_profile(&state, owner, &email, &name).await?)
      }
    },
  }
}
