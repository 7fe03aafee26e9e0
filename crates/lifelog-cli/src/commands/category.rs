use clap::Subcommand;
use lifelog_core::{CategoryId, CategoryKind, Tracker};
use serde::Serialize;

use super::session::{fmt_minutes, print_json, resolve, CliResult, Session};

#[derive(Subcommand)]
pub enum CategoryAction {
    /// Add a category
    Add {
        name: String,
        /// work or sports
        #[arg(long, default_value = "work")]
        kind: CategoryKind,
    },
    /// List categories with their current times
    List {
        #[arg(long)]
        kind: Option<CategoryKind>,
        #[arg(long)]
        json: bool,
    },
    /// Delete a category (a running timer is credited first)
    Delete { category: String },
    /// Start the timer, stopping any other
    Start { category: String },
    /// Stop the timer
    Stop { category: String },
    /// Start or stop the timer
    Toggle { category: String },
    /// Current times of one category, or the running timer
    Status { category: Option<String> },
    /// Minutes per day for the last seven days
    Week { category: String },
}

#[derive(Serialize)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    kind: CategoryKind,
    running: bool,
    today_minutes: f64,
    week_minutes: f64,
    total_minutes: f64,
}

fn find(tracker: &Tracker, query: &str) -> Result<CategoryId, lifelog_core::CoreError> {
    resolve(
        "category",
        query,
        tracker.categories().iter().map(|c| (c.id, c.name.clone())),
    )
}

pub fn run(action: CategoryAction) -> CliResult {
    let mut session = Session::open()?;
    let tracker = &mut session.tracker;

    match action {
        CategoryAction::Add { name, kind } => {
            print_json(&tracker.add_category(&name, kind)?)?;
        }
        CategoryAction::List { kind, json } => {
            let now = tracker.now();
            let zone = tracker.settings().zone;
            let rows: Vec<CategoryRow> = tracker
                .categories()
                .iter()
                .filter(|c| kind.map_or(true, |k| c.kind == k))
                .map(|c| {
                    let times = c.current_time(now, zone);
                    CategoryRow {
                        id: c.id,
                        name: c.name.clone(),
                        kind: c.kind,
                        running: c.is_running(),
                        today_minutes: times.today,
                        week_minutes: times.week,
                        total_minutes: times.total,
                    }
                })
                .collect();
            if json {
                print_json(&rows)?;
            } else if rows.is_empty() {
                println!("No categories.");
            } else {
                println!("{:<20} {:<7} {:>9} {:>9} {:>10}", "NAME", "KIND", "TODAY", "WEEK", "TOTAL");
                for row in rows {
                    let marker = if row.running { " *" } else { "" };
                    println!(
                        "{:<20} {:<7} {:>9} {:>9} {:>10}{marker}",
                        row.name,
                        row.kind.as_str(),
                        fmt_minutes(row.today_minutes),
                        fmt_minutes(row.week_minutes),
                        fmt_minutes(row.total_minutes),
                    );
                }
            }
        }
        CategoryAction::Delete { category } => {
            let id = find(tracker, &category)?;
            print_json(&tracker.delete_category(id)?)?;
        }
        CategoryAction::Start { category } => {
            let id = find(tracker, &category)?;
            print_json(&tracker.start_timer(id)?)?;
        }
        CategoryAction::Stop { category } => {
            let id = find(tracker, &category)?;
            print_json(&tracker.stop_timer(id)?)?;
        }
        CategoryAction::Toggle { category } => {
            let id = find(tracker, &category)?;
            print_json(&tracker.toggle_timer(id)?)?;
        }
        CategoryAction::Status { category } => match category {
            Some(category) => {
                let id = find(tracker, &category)?;
                print_json(&tracker.category_time(id)?)?;
            }
            None => match tracker.categories().running() {
                Some(c) => println!(
                    "{} ({}) running for {}",
                    c.name,
                    c.kind,
                    fmt_minutes(c.live_minutes(tracker.now()))
                ),
                None => println!("No timer running."),
            },
        },
        CategoryAction::Week { category } => {
            let id = find(tracker, &category)?;
            let series = tracker.weekly_series(id)?;
            let today = tracker.today();
            for (offset, minutes) in series.iter().enumerate() {
                let day = today.days_before(6 - offset as i64);
                println!("{day}  {}", fmt_minutes(*minutes));
            }
        }
    }

    session.close()
}
