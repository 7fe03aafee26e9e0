use clap::Args;

use super::session::{fmt_minutes, print_json, CliResult, Session};

#[derive(Args)]
pub struct SummaryArgs {
    #[arg(long)]
    json: bool,
}

pub fn run(args: SummaryArgs) -> CliResult {
    let session = Session::open()?;
    let summary = session.tracker.summary();

    if args.json {
        print_json(&summary)?;
    } else {
        println!("{}", summary.day);
        println!(
            "Work:    {} today, {} this week",
            fmt_minutes(summary.work.today),
            fmt_minutes(summary.work.week)
        );
        println!(
            "Sports:  {} today, {} this week",
            fmt_minutes(summary.sports.today),
            fmt_minutes(summary.sports.week)
        );
        if let Some(running) = &summary.running {
            println!("Running: {} ({})", running.name, fmt_minutes(running.minutes));
        }
        println!(
            "Sleep:   {} today, {:.1}h average, consistency {:.0}{}",
            fmt_minutes(summary.sleep_minutes_today),
            summary.sleep.avg_duration_hours,
            summary.sleep_consistency,
            if summary.sleeping { " (asleep)" } else { "" }
        );
        println!(
            "Habits:  {}/{} done today",
            summary.habits_completed_today, summary.habits_total
        );
        println!("Workouts in the last 7 days: {}", summary.workouts_last_week);
        if summary.contacts_due > 0 {
            println!("Contacts due: {}", summary.contacts_due);
        }
    }

    session.close()
}
