use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};

use treadlog::aggregate;
use treadlog::config::AppConfig;
use treadlog::database::Database;
use treadlog::display;
use treadlog::export::{self, DateRange, ExportFormat};
use treadlog::logging::{self, LogLevel};
use treadlog::models::{Gender, ProfileUpdate, UserProfile, WorkoutInput};
use treadlog::steps::{FixedStepProvider, StepCountProvider, UnavailableStepProvider};
use treadlog::{Tracker, TrackerError};

/// treadlog - Treadmill workout and body-weight tracker
///
/// Logs treadmill sessions split into running and walking segments and
/// estimates distance and calories burned from a personal profile.
#[derive(Parser)]
#[command(name = "treadlog")]
#[command(version)]
#[command(about = "Treadmill workout tracker", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Use this database file instead of the configured one
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log, list and edit treadmill workouts
    Workout {
        #[command(subcommand)]
        action: WorkoutCommand,
    },

    /// Track body weight
    Weight {
        #[command(subcommand)]
        action: WeightCommand,
    },

    /// Manage the personal profile used for estimates
    Profile {
        #[command(subcommand)]
        action: ProfileCommand,
    },

    /// Show today's workouts and step activity
    Today {
        /// Today's step count from your health app
        #[arg(short, long)]
        steps: Option<u32>,
    },

    /// Export workout history with derived metrics
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Export format (csv, json)
        #[arg(short = 'f', long, default_value = "csv")]
        format: String,

        /// First day to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day to include (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
enum WorkoutCommand {
    /// Log a new workout
    Add {
        #[command(flatten)]
        values: WorkoutValues,

        /// When the workout took place (default: now)
        #[arg(long)]
        date: Option<String>,
    },

    /// List workouts, newest first
    List {
        /// Number of workouts to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show the full breakdown of one workout
    Show {
        /// Workout id or unique id prefix
        id: String,
    },

    /// Change a workout's values; unspecified values are kept
    Edit {
        /// Workout id or unique id prefix
        id: String,

        #[command(flatten)]
        values: WorkoutEdit,
    },

    /// Delete a workout
    Delete {
        /// Workout id or unique id prefix
        id: String,
    },
}

#[derive(Args)]
struct WorkoutValues {
    /// Total duration in minutes
    #[arg(short, long)]
    total: f64,

    /// Minutes spent running
    #[arg(short, long, default_value_t = 0.0)]
    running: f64,

    /// Running speed in km/h
    #[arg(long, default_value_t = 0.0)]
    running_speed: f64,

    /// Walking speed in km/h
    #[arg(short, long)]
    walking_speed: f64,
}

#[derive(Args)]
struct WorkoutEdit {
    #[arg(short, long)]
    total: Option<f64>,

    #[arg(short, long)]
    running: Option<f64>,

    #[arg(long)]
    running_speed: Option<f64>,

    #[arg(short, long)]
    walking_speed: Option<f64>,
}

#[derive(Subcommand)]
enum WeightCommand {
    /// Record a weight reading
    Add {
        /// Weight in kg
        kg: f64,

        /// When it was measured (default: now)
        #[arg(long)]
        date: Option<String>,
    },

    /// List weight readings, newest first
    List,

    /// Correct a weight reading
    Edit {
        /// Reading id or unique id prefix
        id: String,

        /// Weight in kg
        kg: f64,

        #[arg(long)]
        date: Option<String>,
    },

    /// Delete a weight reading
    Delete {
        /// Reading id or unique id prefix
        id: String,
    },
}

#[derive(Subcommand)]
enum ProfileCommand {
    /// Show the active profile
    Show,

    /// List stored profiles
    List,

    /// Create a profile
    Create {
        #[command(flatten)]
        values: ProfileValues,

        /// Do not make the new profile active
        #[arg(long)]
        inactive: bool,
    },

    /// Update the active profile
    Set {
        #[command(flatten)]
        values: ProfileValues,
    },

    /// Make a stored profile the active one
    Use {
        /// Profile id or unique id prefix
        id: String,
    },
}

#[derive(Args)]
struct ProfileValues {
    /// Weight in kg
    #[arg(long)]
    weight: Option<f64>,

    /// Height in cm
    #[arg(long)]
    height: Option<f64>,

    /// male, female or other
    #[arg(long)]
    gender: Option<Gender>,

    /// Daily step goal
    #[arg(long)]
    goal: Option<u32>,
}

impl ProfileValues {
    fn into_update(self) -> ProfileUpdate {
        ProfileUpdate {
            weight_kg: self.weight,
            height_cm: self.height,
            gender: self.gender,
            daily_steps_goal: self.goal,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        match err.downcast_ref::<TrackerError>() {
            Some(tracker_err) => {
                let level = tracker_err.severity().to_tracing_level();
                if level == tracing::Level::ERROR {
                    tracing::error!(error = %tracker_err, "Command failed");
                } else {
                    tracing::warn!(error = %tracker_err, "Command rejected");
                }
                eprintln!("{} {}", "✗".red().bold(), tracker_err.user_message());
            }
            None => eprintln!("{} {:#}", "✗".red().bold(), err),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // An explicitly named config file must load; the default one is optional
    let (mut config, config_path) = match &cli.config {
        Some(path) => {
            let config = AppConfig::load_from_file(path)
                .map_err(|e| TrackerError::Configuration(format!("{:#}", e)))?;
            (config, path.clone())
        }
        None => (AppConfig::load_or_default(None), AppConfig::default_config_path()),
    };

    let mut log_config = config.logging.clone();
    log_config.level = LogLevel::from_verbosity(cli.verbose, log_config.level);
    logging::init_logging(&log_config)?;

    let db_path = cli.db.clone().unwrap_or_else(|| config.database_file());
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory: {}", parent.display()))?;
    }
    let db = Database::new(&db_path)
        .map_err(TrackerError::from)
        .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
    tracing::debug!(path = %db_path.display(), "Database opened");

    let mut tracker = Tracker::new(db).with_profile_override(config.active_profile_id.clone());
    let precision = config.settings.display_precision;

    match cli.command {
        Commands::Workout { action } => run_workout(&mut tracker, action, precision)?,
        Commands::Weight { action } => run_weight(&mut tracker, action)?,
        Commands::Profile { action } => {
            run_profile(&mut tracker, action, &mut config, &config_path)?
        }
        Commands::Today { steps } => {
            let provider: Box<dyn StepCountProvider> = match steps.or(config.steps.manual_steps) {
                Some(count) => Box::new(FixedStepProvider::new(count)),
                None => Box::new(UnavailableStepProvider),
            };

            let summary = tracker
                .daily_summary(provider.as_ref(), aggregate::today_start())
                .await?;

            println!("{}", "Today".cyan().bold());
            println!("{}", display::daily_summary_lines(&summary, precision));
        }
        Commands::Export {
            output,
            format,
            from,
            to,
        } => {
            let format: ExportFormat = format.parse().map_err(TrackerError::from)?;
            let workouts = tracker.database().list_workouts().map_err(TrackerError::from)?;
            let selected = DateRange::new(from, to).filter_workouts(&workouts);
            let profile = tracker.active_profile()?;

            let count = export::export_workouts(&selected, &profile, format, &output)
                .map_err(TrackerError::from)?;
            println!(
                "{} Exported {} workouts to {}",
                "✓".green(),
                count,
                output.display()
            );
        }
    }

    Ok(())
}

fn run_workout(tracker: &mut Tracker, action: WorkoutCommand, precision: usize) -> Result<()> {
    match action {
        WorkoutCommand::Add { values, date } => {
            let input = WorkoutInput {
                total_duration_minutes: values.total,
                running_duration_minutes: values.running,
                running_speed_kmh: values.running_speed,
                walking_speed_kmh: values.walking_speed,
            };
            let record = match date {
                Some(date) => tracker.add_workout_at(input, parse_date(&date)?)?,
                None => tracker.add_workout(input)?,
            };

            let profile = tracker.active_profile()?;
            println!("{}", "✓ Workout logged".green().bold());
            println!("{}", display::workout_details(&record, &profile, precision));
        }
        WorkoutCommand::List { limit } => {
            let mut workouts = tracker.workouts_newest_first()?;
            if let Some(limit) = limit {
                workouts.truncate(limit);
            }

            if workouts.is_empty() {
                println!("{}", "No workouts logged yet".dimmed());
            } else {
                let profile = tracker.active_profile()?;
                println!("{}", display::workout_table(&workouts, &profile, precision));
            }
        }
        WorkoutCommand::Show { id } => {
            let id = resolve_workout_id(tracker, &id)?;
            let record = tracker.workout(&id)?;
            let profile = tracker.active_profile()?;
            println!("{}", display::workout_details(&record, &profile, precision));
        }
        WorkoutCommand::Edit { id, values } => {
            let id = resolve_workout_id(tracker, &id)?;
            let current = tracker.workout(&id)?.input();
            let input = WorkoutInput {
                total_duration_minutes: values.total.unwrap_or(current.total_duration_minutes),
                running_duration_minutes: values.running.unwrap_or(current.running_duration_minutes),
                running_speed_kmh: values.running_speed.unwrap_or(current.running_speed_kmh),
                walking_speed_kmh: values.walking_speed.unwrap_or(current.walking_speed_kmh),
            };

            let record = tracker.edit_workout(&id, input)?;
            let profile = tracker.active_profile()?;
            println!("{}", "✓ Workout updated".green().bold());
            println!("{}", display::workout_details(&record, &profile, precision));
        }
        WorkoutCommand::Delete { id } => {
            let id = resolve_workout_id(tracker, &id)?;
            tracker.delete_workout(&id)?;
            println!("{}", "✓ Workout deleted".green());
        }
    }
    Ok(())
}

fn run_weight(tracker: &mut Tracker, action: WeightCommand) -> Result<()> {
    match action {
        WeightCommand::Add { kg, date } => {
            let date = match date {
                Some(date) => parse_date(&date)?,
                None => Utc::now(),
            };
            tracker.add_weight(kg, date)?;
            println!("{} Recorded {:.1} kg", "✓".green(), kg);
        }
        WeightCommand::List => {
            let weights = tracker.weights_newest_first()?;
            if weights.is_empty() {
                println!("{}", "No weight readings yet".dimmed());
            } else {
                println!("{}", display::weight_table(&weights));
            }
        }
        WeightCommand::Edit { id, kg, date } => {
            let id = resolve_weight_id(tracker, &id)?;
            let date = date.as_deref().map(parse_date).transpose()?;
            tracker.edit_weight(&id, kg, date)?;
            println!("{} Weight updated", "✓".green());
        }
        WeightCommand::Delete { id } => {
            let id = resolve_weight_id(tracker, &id)?;
            tracker.delete_weight(&id)?;
            println!("{} Weight deleted", "✓".green());
        }
    }
    Ok(())
}

fn run_profile(
    tracker: &mut Tracker,
    action: ProfileCommand,
    config: &mut AppConfig,
    config_path: &Path,
) -> Result<()> {
    match action {
        ProfileCommand::Show => {
            let stored = tracker.stored_active_profile()?;
            if stored.is_none() {
                println!("{}", "No profile stored, showing defaults".dimmed());
            }
            print_profile(&stored.unwrap_or_default());
        }
        ProfileCommand::List => {
            let active = tracker.active_profile()?.id;
            for profile in tracker.profiles()? {
                let marker = if profile.id == active { "*" } else { " " };
                println!(
                    "{} {}  {:.1} kg  {:.0} cm  {}  {} steps",
                    marker,
                    profile.id,
                    profile.weight_kg,
                    profile.height_cm,
                    profile.gender,
                    profile.daily_steps_goal
                );
            }
        }
        ProfileCommand::Create { values, inactive } => {
            let mut profile = UserProfile::default();
            values.into_update().apply_to(&mut profile);
            let pinned = tracker.pinned_profile().map(str::to_string);
            let profile = tracker.create_profile(profile, !inactive && pinned.is_none())?;
            println!("{}", "✓ Profile created".green().bold());
            print_profile(&profile);

            if let (Some(pinned), false) = (pinned, inactive) {
                println!(
                    "{} Config pins profile {}; run `treadlog profile use {}` to switch",
                    "!".yellow(),
                    pinned,
                    &profile.id[..8]
                );
            }
        }
        ProfileCommand::Set { values } => {
            let profile = tracker.update_active_profile(&values.into_update())?;
            println!("{}", "✓ Profile updated".green().bold());
            print_profile(&profile);
        }
        ProfileCommand::Use { id } => {
            let profiles = tracker.profiles()?;
            let id = resolve_prefix(profiles.iter().map(|p| p.id.as_str()), &id, "profile")?;
            if tracker.pinned_profile().is_some() {
                config.set_active_profile(id.as_str());
                config.save_to_file(config_path)?;
                println!(
                    "{} Active profile pinned in {}",
                    "✓".green(),
                    config_path.display()
                );
            } else {
                tracker.use_profile(&id)?;
                println!("{} Active profile set", "✓".green());
            }
        }
    }
    Ok(())
}

fn print_profile(profile: &UserProfile) {
    println!("Profile   {}", profile.id);
    println!("Weight    {:.1} kg", profile.weight_kg);
    println!("Height    {:.0} cm", profile.height_cm);
    println!("Gender    {}", profile.gender);
    println!("Step goal {}", profile.daily_steps_goal);
}

fn resolve_workout_id(tracker: &Tracker, prefix: &str) -> Result<String> {
    let workouts = tracker.database().list_workouts().map_err(TrackerError::from)?;
    resolve_prefix(workouts.iter().map(|w| w.id.as_str()), prefix, "workout")
}

fn resolve_weight_id(tracker: &Tracker, prefix: &str) -> Result<String> {
    let weights = tracker.database().list_weights().map_err(TrackerError::from)?;
    resolve_prefix(weights.iter().map(|w| w.id.as_str()), prefix, "weight reading")
}

/// Expand a unique id prefix into the full id
fn resolve_prefix<'a>(ids: impl Iterator<Item = &'a str>, prefix: &str, kind: &str) -> Result<String> {
    let matches: Vec<&str> = ids.filter(|id| id.starts_with(prefix)).collect();
    match matches.as_slice() {
        [id] => Ok(id.to_string()),
        [] => bail!("No {} matches '{}'", kind, prefix),
        _ => bail!("'{}' matches {} {}s, use a longer prefix", prefix, matches.len(), kind),
    }
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM` or `YYYY-MM-DD` (local time)
fn parse_date(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Ok(date.with_timezone(&Utc));
    }

    let naive = match NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M") {
        Ok(naive) => naive,
        Err(_) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .with_context(|| format!("Unrecognised date '{}'", value))?
            .and_hms_opt(0, 0, 0)
            .context("Midnight out of range")?,
    };

    match Local.from_local_datetime(&naive).earliest() {
        Some(local) => Ok(local.with_timezone(&Utc)),
        None => bail!("'{}' does not exist in the local time zone", value),
    }
}
