use clap::Args;

use super::session::{print_json, CliResult, Session};

const NAMES: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

#[derive(Args)]
pub struct GymDaysArgs {
    /// Weekdays as 1-7 (Monday = 1) or mon..sun. Omit to show the current days.
    days: Vec<String>,
    /// Clear every gym day
    #[arg(long, conflicts_with = "days")]
    clear: bool,
}

fn parse_day(value: &str) -> Result<u8, String> {
    let lower = value.trim().to_ascii_lowercase();
    if let Some(index) = NAMES.iter().position(|n| lower.starts_with(n)) {
        return Ok(index as u8 + 1);
    }
    match lower.parse::<u8>() {
        Ok(day) if (1..=7).contains(&day) => Ok(day),
        _ => Err(format!("'{value}' is not a weekday")),
    }
}

pub fn run(args: GymDaysArgs) -> CliResult {
    let mut session = Session::open()?;

    if args.days.is_empty() && !args.clear {
        let days: Vec<&str> = session
            .tracker
            .workouts()
            .gym_days()
            .map(|d| NAMES[usize::from(d - 1)])
            .collect();
        if days.is_empty() {
            println!("No gym days.");
        } else {
            println!("{}", days.join(" "));
        }
    } else {
        let days = args
            .days
            .iter()
            .map(|d| parse_day(d))
            .collect::<Result<Vec<u8>, String>>()?;
        print_json(&session.tracker.set_gym_days(&days)?)?;
    }

    session.close()
}
