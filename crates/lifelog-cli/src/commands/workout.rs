use chrono::Duration;
use clap::Subcommand;
use lifelog_core::{ExerciseId, SetId, Tracker, WorkoutId};

use super::session::{fmt_secs, print_json, resolve, ActiveWorkoutMarker, CliResult, Session};

#[derive(Subcommand)]
pub enum WorkoutAction {
    /// Add a workout plan
    Add { name: String },
    /// List workouts with their planned sets
    List {
        #[arg(long)]
        json: bool,
    },
    /// Delete a workout and its history
    Delete { workout: String },
    /// Add an exercise to the catalogue
    ExerciseAdd {
        name: String,
        #[arg(long)]
        muscle_group: Option<String>,
    },
    /// List the exercise catalogue
    Exercises,
    /// Remove an exercise from the catalogue
    ExerciseDelete { exercise: String },
    /// Append a planned set to a workout
    AddSet {
        workout: String,
        exercise: String,
        #[arg(long, default_value = "3")]
        sets: u32,
        #[arg(long, default_value = "10")]
        reps: u32,
        #[arg(long, default_value = "0")]
        weight: f64,
    },
    /// Remove a planned set by id
    RemoveSet { workout: String, set: SetId },
    /// Begin executing a workout now
    Start { workout: String },
    /// Commit the workout begun with `start`
    Finish,
    /// Drop the workout begun with `start` without recording it
    Abandon,
    /// Record a session of the plan that ended now
    Log {
        workout: String,
        #[arg(long)]
        minutes: u32,
    },
    /// Duration aggregates and completion dates
    Stats { workout: Option<String> },
}

fn find_workout(tracker: &Tracker, query: &str) -> Result<WorkoutId, lifelog_core::CoreError> {
    resolve(
        "workout",
        query,
        tracker.workouts().iter().map(|w| (w.id, w.name.clone())),
    )
}

fn find_exercise(tracker: &Tracker, query: &str) -> Result<ExerciseId, lifelog_core::CoreError> {
    resolve(
        "exercise",
        query,
        tracker.workouts().exercises().map(|e| (e.id, e.name.clone())),
    )
}

pub fn run(action: WorkoutAction) -> CliResult {
    let mut session = Session::open()?;

    match action {
        WorkoutAction::Add { name } => {
            print_json(&session.tracker.add_workout(&name)?)?;
        }
        WorkoutAction::List { json } => {
            let workouts: Vec<_> = session.tracker.workouts().iter().collect();
            if json {
                print_json(&workouts)?;
            } else if workouts.is_empty() {
                println!("No workouts.");
            } else {
                for w in workouts {
                    println!("{}  ({} sessions)", w.name, w.completed_sessions.len());
                    for set in &w.sets {
                        println!(
                            "  {}  {} x {} @ {}kg  [{}]",
                            set.exercise_name, set.sets, set.reps, set.weight_kg, set.id
                        );
                    }
                }
            }
        }
        WorkoutAction::Delete { workout } => {
            let id = find_workout(&session.tracker, &workout)?;
            print_json(&session.tracker.delete_workout(id)?)?;
        }
        WorkoutAction::ExerciseAdd { name, muscle_group } => {
            print_json(&session.tracker.add_exercise(&name, muscle_group.as_deref())?)?;
        }
        WorkoutAction::Exercises => {
            for e in session.tracker.workouts().exercises() {
                match &e.muscle_group {
                    Some(group) => println!("{} ({group})", e.name),
                    None => println!("{}", e.name),
                }
            }
        }
        WorkoutAction::ExerciseDelete { exercise } => {
            let id = find_exercise(&session.tracker, &exercise)?;
            print_json(&session.tracker.delete_exercise(id)?)?;
        }
        WorkoutAction::AddSet {
            workout,
            exercise,
            sets,
            reps,
            weight,
        } => {
            let workout_id = find_workout(&session.tracker, &workout)?;
            let exercise_id = find_exercise(&session.tracker, &exercise)?;
            print_json(
                &session
                    .tracker
                    .add_planned_set(workout_id, exercise_id, sets, reps, weight)?,
            )?;
        }
        WorkoutAction::RemoveSet { workout, set } => {
            let id = find_workout(&session.tracker, &workout)?;
            print_json(&session.tracker.remove_planned_set(id, set)?)?;
        }
        WorkoutAction::Start { workout } => {
            if session.active_workout()?.is_some() {
                return Err("a workout is already in progress; finish or abandon it first".into());
            }
            let id = find_workout(&session.tracker, &workout)?;
            let active = session.tracker.start_workout(id)?;
            session.set_active_workout(Some(&ActiveWorkoutMarker {
                workout_id: id,
                started_at: active.started_at(),
            }))?;
            println!("Started at {}", active.started_at().format("%H:%M"));
        }
        WorkoutAction::Finish => {
            let marker = session
                .active_workout()?
                .ok_or("no workout in progress")?;
            let active = session
                .tracker
                .workouts()
                .start(marker.workout_id, marker.started_at)?;
            print_json(&session.tracker.finish_workout(active)?)?;
            session.set_active_workout(None)?;
        }
        WorkoutAction::Abandon => {
            session.set_active_workout(None)?;
            println!("ok");
        }
        WorkoutAction::Log { workout, minutes } => {
            let id = find_workout(&session.tracker, &workout)?;
            let started_at = session.tracker.now() - Duration::minutes(i64::from(minutes));
            let active = session.tracker.workouts().start(id, started_at)?;
            print_json(&session.tracker.finish_workout(active)?)?;
        }
        WorkoutAction::Stats { workout } => {
            let tracker = &session.tracker;
            let id = workout
                .map(|w| find_workout(tracker, &w))
                .transpose()?;
            if let Some(id) = id {
                println!("Average: {}", fmt_secs(tracker.workouts().average_duration(id)?));
                println!("Total:   {}", fmt_secs(tracker.workouts().total_duration(id)?));
            }
            println!(
                "Sessions in the last 7 days: {}",
                tracker.workouts().sessions_in_last_week(tracker.today())
            );
            for date in tracker.workouts().completion_dates(id)? {
                println!("{date}");
            }
        }
    }

    session.close()
}
