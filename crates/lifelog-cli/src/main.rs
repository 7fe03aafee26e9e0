use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "lifelog", version, about = "Lifelog CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Work and sports category timers
    Category {
        #[command(subcommand)]
        action: commands::category::CategoryAction,
    },
    /// Sleep tracking
    Sleep {
        #[command(subcommand)]
        action: commands::sleep::SleepAction,
    },
    /// Habit tracking
    Habit {
        #[command(subcommand)]
        action: commands::habit::HabitAction,
    },
    /// Workout plans and sessions
    Workout {
        #[command(subcommand)]
        action: commands::workout::WorkoutAction,
    },
    /// Show or set weekly gym days
    GymDays(commands::gym_days::GymDaysArgs),
    /// Relationship follow-ups
    Contact {
        #[command(subcommand)]
        action: commands::contact::ContactAction,
    },
    /// Today at a glance
    Summary(commands::summary::SummaryArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Logs go to stderr so stdout stays machine-readable.
/// Filter with LIFELOG_LOG (e.g. `LIFELOG_LOG=info` to see reminders).
fn init_logging() {
    let filter = EnvFilter::try_from_env("LIFELOG_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Category { action } => commands::category::run(action),
        Commands::Sleep { action } => commands::sleep::run(action),
        Commands::Habit { action } => commands::habit::run(action),
        Commands::Workout { action } => commands::workout::run(action),
        Commands::GymDays(args) => commands::gym_days::run(args),
        Commands::Contact { action } => commands::contact::run(action),
        Commands::Summary(args) => commands::summary::run(args),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
