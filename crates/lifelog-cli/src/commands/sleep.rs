use clap::Subcommand;

use super::session::{fmt_minutes, next_time, print_json, CliResult, Session};

#[derive(Subcommand)]
pub enum SleepAction {
    /// Go to sleep
    Start {
        /// Alarm at local HH:MM (next occurrence)
        #[arg(long)]
        alarm: Option<String>,
    },
    /// Wake up and record the session
    Wake,
    /// Current sleep state
    Status,
    /// Averages and consistency over the retained sessions
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Retained sessions, oldest first
    History,
}

pub fn run(action: SleepAction) -> CliResult {
    let mut session = Session::open()?;
    let tracker = &mut session.tracker;

    match action {
        SleepAction::Start { alarm } => {
            let alarm_at = alarm.map(|a| next_time(tracker, &a)).transpose()?;
            print_json(&tracker.go_to_sleep(alarm_at)?)?;
        }
        SleepAction::Wake => {
            print_json(&tracker.wake_up()?)?;
        }
        SleepAction::Status => {
            let now = tracker.now();
            let sleep = tracker.sleep();
            if sleep.is_sleeping() {
                println!(
                    "Asleep for {}",
                    fmt_minutes(sleep.current_sleep_hours(now) * 60.0)
                );
                if let Some(alarm) = sleep.state().alarm_time {
                    let local = tracker.settings().zone.local(alarm);
                    println!("Alarm: {}", local.format("%H:%M"));
                }
            } else {
                println!("Awake");
            }
            println!("Slept today: {}", fmt_minutes(sleep.sleep_minutes_today(now)));
        }
        SleepAction::Stats { json } => {
            let stats = tracker.sleep().statistics();
            let consistency = tracker.sleep().consistency();
            if json {
                print_json(&serde_json::json!({
                    "statistics": stats,
                    "consistency": consistency,
                }))?;
            } else {
                println!("Sessions:        {}", stats.session_count);
                println!("Avg duration:    {:.2}h", stats.avg_duration_hours);
                println!("Avg bedtime:     {:.2}", stats.avg_bedtime_hour);
                println!("Avg wake time:   {:.2}", stats.avg_wake_hour);
                println!("Bedtime std dev: {:.0}m", stats.bedtime_std_dev_minutes);
                println!("Wake std dev:    {:.0}m", stats.wake_std_dev_minutes);
                println!("Consistency:     {consistency:.0}/100");
            }
        }
        SleepAction::History => {
            for s in tracker.sleep().sessions() {
                println!(
                    "{} -> {}  {:.2}h",
                    s.start_time.format("%Y-%m-%d %H:%M"),
                    s.end_time.format("%Y-%m-%d %H:%M"),
                    s.duration_hours()
                );
            }
        }
    }

    session.close()
}
