//! # Lifelog Core Library
//!
//! This library provides the core logic for Lifelog, a personal time and
//! habit tracker. Like its CLI it follows a core-first layout: every
//! operation lives here and the binary is a thin shell over [`Tracker`].
//!
//! ## Architecture
//!
//! - **Category timers**: wall-clock accumulators for work and sports
//!   categories, bucketed by local day and ISO week. At most one timer runs.
//! - **Sleep**: an awake/asleep toggle producing a bounded session history
//!   with consistency statistics
//! - **Habits**: per-day completion entries with derived streaks
//! - **Workouts**: plans, commit-on-finish execution and duration aggregates
//! - **Storage**: the whole aggregate as one JSON document in SQLite, plus
//!   TOML configuration
//!
//! Nothing in the core owns a thread or a timer. "Now" comes from a
//! [`Clock`], and reminders are requests to a [`NotificationScheduler`].
//!
//! ## Key Components
//!
//! - [`Tracker`]: the service façade over every engine
//! - [`CategoryBook`], [`SleepLog`], [`HabitBook`], [`WorkoutBook`]: the engines
//! - [`SqliteStore`]: durable [`PersistenceStore`]
//! - [`Config`]: application configuration management

pub mod calendar;
pub mod category;
pub mod clock;
pub mod contacts;
pub mod data;
pub mod error;
pub mod events;
pub mod habit;
pub mod ids;
pub mod notify;
pub mod reminders;
pub mod sleep;
pub mod stats;
pub mod storage;
pub mod tracker;
pub mod workout;

pub use calendar::{day_key, week_key, DayKey, WeekKey, Zone};
pub use category::{Category, CategoryBook, CategoryKind, CategoryTimes, StartOutcome, ToggleOutcome};
pub use clock::{Clock, ManualClock, SystemClock};
pub use contacts::{ContactBook, ContactProfile, ScheduledCall};
pub use data::TrackerData;
pub use error::{ConfigError, CoreError, Result, StorageError, ValidationError};
pub use events::Event;
pub use habit::{Habit, HabitBook, HabitEntry, HabitKind};
pub use ids::{
    CallId, CategoryId, ContactId, ExerciseId, HabitId, SetId, SleepSessionId, WorkoutId,
    WorkoutSessionId,
};
pub use notify::{MemoryScheduler, NoopScheduler, Notification, NotificationScheduler, Repeat};
pub use sleep::{SleepData, SleepLog, SleepSession, SleepState, SleepStatistics};
pub use stats::{RunningTimer, TrackerSummary};
pub use storage::{Config, MemoryStore, PersistenceStore, SqliteStore};
pub use tracker::{SharedTracker, Tracker, TrackerSettings};
pub use workout::{ActiveWorkout, CompletedWorkoutSession, Exercise, Workout, WorkoutBook, WorkoutSet};
