use clap::Subcommand;
use lifelog_core::{DayKey, HabitId, HabitKind, Tracker};

use super::session::{parse_time, print_json, resolve, CliResult, Session};

#[derive(Subcommand)]
pub enum HabitAction {
    /// Add a habit
    Add {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// good (to do) or bad (to avoid)
        #[arg(long, default_value = "good")]
        kind: HabitKind,
    },
    /// List habits with streaks
    List {
        #[arg(long)]
        json: bool,
    },
    /// Flip completion for today or --date
    Toggle {
        habit: String,
        /// YYYY-MM-DD, not after today
        #[arg(long)]
        date: Option<DayKey>,
    },
    /// Delete a habit and its history
    Delete { habit: String },
    /// Enable or disable the daily reminder
    Reminder {
        habit: String,
        #[arg(long, conflicts_with = "off")]
        on: bool,
        #[arg(long)]
        off: bool,
        /// Local HH:MM
        #[arg(long)]
        time: Option<String>,
    },
}

fn find(tracker: &Tracker, query: &str) -> Result<HabitId, lifelog_core::CoreError> {
    resolve(
        "habit",
        query,
        tracker.habits().iter().map(|h| (h.id, h.name.clone())),
    )
}

pub fn run(action: HabitAction) -> CliResult {
    let mut session = Session::open()?;
    let tracker = &mut session.tracker;

    match action {
        HabitAction::Add {
            name,
            description,
            kind,
        } => {
            print_json(&tracker.add_habit(&name, &description, kind)?)?;
        }
        HabitAction::List { json } => {
            let habits: Vec<_> = tracker.habits().iter().collect();
            if json {
                print_json(&habits)?;
            } else if habits.is_empty() {
                println!("No habits.");
            } else {
                let today = tracker.today();
                println!("{:<20} {:>4} {:>7} {:>8} {:>6}", "NAME", "DONE", "STREAK", "LONGEST", "RATE");
                for h in habits {
                    let done = if tracker.habits().is_completed(h.id, today) { "x" } else { "" };
                    println!(
                        "{:<20} {:>4} {:>7} {:>8} {:>5.0}%",
                        h.name, done, h.current_streak, h.longest_streak, h.completion_rate
                    );
                }
            }
        }
        HabitAction::Toggle { habit, date } => {
            let id = find(tracker, &habit)?;
            print_json(&tracker.toggle_habit(id, date)?)?;
        }
        HabitAction::Delete { habit } => {
            let id = find(tracker, &habit)?;
            print_json(&tracker.delete_habit(id)?)?;
        }
        HabitAction::Reminder { habit, on, off, time } => {
            let id = find(tracker, &habit)?;
            let time = time.as_deref().map(parse_time).transpose()?;
            // A bare --time implies enabling.
            let enabled = on || (!off && time.is_some());
            print_json(&tracker.set_habit_reminder(id, enabled, time)?)?;
        }
    }

    session.close()
}
