//! Cross-domain dashboard snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::{day_key, DayKey, Zone};
use crate::category::{CategoryBook, CategoryKind, CategoryTimes};
use crate::contacts::ContactBook;
use crate::habit::HabitBook;
use crate::ids::CategoryId;
use crate::sleep::{SleepLog, SleepStatistics};
use crate::workout::WorkoutBook;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningTimer {
    pub id: CategoryId,
    pub name: String,
    pub kind: CategoryKind,
    pub started_at: DateTime<Utc>,
    pub minutes: f64,
}

/// Everything a dashboard shows, computed at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerSummary {
    pub at: DateTime<Utc>,
    pub day: DayKey,
    pub work: CategoryTimes,
    pub sports: CategoryTimes,
    pub running: Option<RunningTimer>,
    pub sleeping: bool,
    pub sleep_minutes_today: f64,
    pub sleep: SleepStatistics,
    pub sleep_consistency: f64,
    pub habits_completed_today: usize,
    pub habits_total: usize,
    pub workouts_last_week: usize,
    pub contacts_due: usize,
}

impl TrackerSummary {
    pub(crate) fn collect(
        now: DateTime<Utc>,
        zone: Zone,
        categories: &CategoryBook,
        sleep: &SleepLog,
        habits: &HabitBook,
        workouts: &WorkoutBook,
        contacts: &ContactBook,
    ) -> Self {
        let today = day_key(now, zone);
        let running = categories.running().and_then(|c| {
            c.started_at().map(|started_at| RunningTimer {
                id: c.id,
                name: c.name.clone(),
                kind: c.kind,
                started_at,
                minutes: c.live_minutes(now),
            })
        });
        Self {
            at: now,
            day: today,
            work: categories.totals(CategoryKind::Work, now),
            sports: categories.totals(CategoryKind::Sports, now),
            running,
            sleeping: sleep.is_sleeping(),
            sleep_minutes_today: sleep.sleep_minutes_today(now),
            sleep: sleep.statistics(),
            sleep_consistency: sleep.consistency(),
            habits_completed_today: habits.completed_on(today),
            habits_total: habits.len(),
            workouts_last_week: workouts.sessions_in_last_week(today),
            contacts_due: contacts.due(now).len(),
        }
    }
}
