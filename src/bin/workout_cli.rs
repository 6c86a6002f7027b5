// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Command-line client for exercising the core against a live backend.

use anyhow::Result;
use clap::{Parser, Subcommand};

use workout_companion_core::bootstrap::bootstrap;
use workout_companion_core::config::AppConfig;
use workout_companion_core::logging::{self, LoggingConfig};
use workout_companion_core::models::Workout;
use workout_companion_core::state::today;

#[derive(Parser, Debug)]
#[command(author, version, about = "Workout Companion data core CLI", long_about = None)]
struct Args {
    /// Path to a config file; defaults to the user config dir, then env vars
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all workouts
    List,
    /// Show a single workout
    Show { id: String },
    /// List workouts scheduled on a date (YYYY-MM-DD)
    ForDate { date: String },
    /// Mark a workout completed
    Complete {
        id: String,
        /// Completion date; defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// Delete a workout
    Delete { id: String },
    /// Weekly completion summary starting at a date (YYYY-MM-DD)
    Week { start: String },
    /// Current weather for a location
    Weather { location: String },
    /// Five-day forecast for a location
    Forecast { location: String },
}

fn print_workout(workout: &Workout) {
    let id = workout.id.as_deref().unwrap_or("-");
    let status = if workout.completed { "done" } else { "planned" };
    println!(
        "[{id}] {} | {} {:?} @ {:?} ({status}, {} exercises)",
        workout.name,
        workout.date,
        workout.workout_type,
        workout.location,
        workout.exercises.len()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init(&LoggingConfig::from_env())?;

    let args = Args::parse();
    let config = AppConfig::load(args.config)?;
    let app = bootstrap(config)?;

    match args.command {
        Command::List => {
            let workouts = app.workouts.get_all_workouts().await?;
            println!("{} workouts", workouts.len());
            for workout in &workouts {
                print_workout(workout);
            }
        }
        Command::Show { id } => match app.workouts.get_workout_by_id(&id).await? {
            Some(workout) => print_workout(&workout),
            None => println!("workout {id} not found"),
        },
        Command::ForDate { date } => {
            let workouts = app.workouts.get_workouts_for_date(&date).await?;
            println!("{} workouts on {date}", workouts.len());
            for workout in &workouts {
                print_workout(workout);
            }
        }
        Command::Complete { id, date } => {
            let date = date.unwrap_or_else(today);
            let workout = app.workouts.complete_workout(&id, &date).await?;
            app.state.mark_completed(&id);
            print_workout(&workout);
        }
        Command::Delete { id } => {
            app.workouts.delete_workout(&id).await?;
            app.state.mark_not_completed(&id);
            println!("deleted workout {id}");
        }
        Command::Week { start } => {
            let summary = app.workouts.weekly_summary(&start).await?;
            println!(
                "{} – {}: {}/{} completed, {} min, {} kcal",
                summary.start_date,
                summary.end_date,
                summary.completed_workouts,
                summary.total_workouts,
                summary.total_duration,
                summary.total_calories
            );
            for day in &summary.daily_summary {
                println!(
                    "  {}: {} workouts ({} completed)",
                    day.date, day.workouts, day.completed
                );
            }
        }
        Command::Weather { location } => {
            let weather = app.weather.current(&location).await?;
            println!(
                "{}: {:.1}°C, {} (humidity {:.0}%, wind {:.1} km/h)",
                weather.location,
                weather.temperature,
                weather.condition,
                weather.humidity,
                weather.wind_speed
            );
        }
        Command::Forecast { location } => {
            let weather = app.weather.forecast(&location).await?;
            println!("{}: {:.1}°C, {}", weather.location, weather.temperature, weather.condition);
            for day in &weather.forecast {
                println!("  {}: {:.1}°C, {}", day.date, day.temperature, day.condition);
            }
        }
    }

    Ok(())
}
