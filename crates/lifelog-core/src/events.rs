use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::DayKey;
use crate::category::CategoryKind;
use crate::ids::{
    CallId, CategoryId, ContactId, ExerciseId, HabitId, SetId, SleepSessionId, WorkoutId,
    WorkoutSessionId,
};

/// Every state change the tracker commits produces an Event.
/// Hosts render them; tests assert on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    CategoryAdded {
        id: CategoryId,
        name: String,
        kind: CategoryKind,
        at: DateTime<Utc>,
    },
    CategoryDeleted {
        id: CategoryId,
        /// Minutes credited from a segment that was still running.
        flushed_minutes: f64,
        at: DateTime<Utc>,
    },
    TimerStarted {
        id: CategoryId,
        at: DateTime<Utc>,
    },
    TimerStopped {
        id: CategoryId,
        elapsed_minutes: f64,
        at: DateTime<Utc>,
    },
    FellAsleep {
        alarm_at: Option<DateTime<Utc>>,
        early_bedtime: bool,
        at: DateTime<Utc>,
    },
    WokeUp {
        /// `None` when no session was recorded.
        session_id: Option<SleepSessionId>,
        duration_hours: f64,
        at: DateTime<Utc>,
    },
    HabitAdded {
        id: HabitId,
        name: String,
        at: DateTime<Utc>,
    },
    HabitDeleted {
        id: HabitId,
        at: DateTime<Utc>,
    },
    HabitToggled {
        id: HabitId,
        day: DayKey,
        completed: bool,
        current_streak: i32,
        at: DateTime<Utc>,
    },
    HabitReminderSet {
        id: HabitId,
        enabled: bool,
        at: DateTime<Utc>,
    },
    WorkoutAdded {
        id: WorkoutId,
        name: String,
        at: DateTime<Utc>,
    },
    WorkoutDeleted {
        id: WorkoutId,
        at: DateTime<Utc>,
    },
    WorkoutFinished {
        id: WorkoutId,
        session_id: WorkoutSessionId,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    ExerciseAdded {
        id: ExerciseId,
        name: String,
        at: DateTime<Utc>,
    },
    ExerciseDeleted {
        id: ExerciseId,
        at: DateTime<Utc>,
    },
    PlannedSetAdded {
        workout_id: WorkoutId,
        set_id: SetId,
        at: DateTime<Utc>,
    },
    PlannedSetRemoved {
        workout_id: WorkoutId,
        set_id: SetId,
        at: DateTime<Utc>,
    },
    GymDaysSet {
        days: Vec<u8>,
        at: DateTime<Utc>,
    },
    ContactAdded {
        id: ContactId,
        name: String,
        at: DateTime<Utc>,
    },
    ContactDeleted {
        id: ContactId,
        at: DateTime<Utc>,
    },
    CallScheduled {
        contact_id: ContactId,
        call_id: CallId,
        scheduled_for: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    CallCompleted {
        contact_id: ContactId,
        call_id: CallId,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::CategoryAdded { at, .. }
            | Event::CategoryDeleted { at, .. }
            | Event::TimerStarted { at, .. }
            | Event::TimerStopped { at, .. }
            | Event::FellAsleep { at, .. }
            | Event::WokeUp { at, .. }
            | Event::HabitAdded { at, .. }
            | Event::HabitDeleted { at, .. }
            | Event::HabitToggled { at, .. }
            | Event::HabitReminderSet { at, .. }
            | Event::WorkoutAdded { at, .. }
            | Event::WorkoutDeleted { at, .. }
            | Event::WorkoutFinished { at, .. }
            | Event::ExerciseAdded { at, .. }
            | Event::ExerciseDeleted { at, .. }
            | Event::PlannedSetAdded { at, .. }
            | Event::PlannedSetRemoved { at, .. }
            | Event::GymDaysSet { at, .. }
            | Event::ContactAdded { at, .. }
            | Event::ContactDeleted { at, .. }
            | Event::CallScheduled { at, .. }
            | Event::CallCompleted { at, .. } => *at,
        }
    }
}
