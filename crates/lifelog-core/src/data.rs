//! The aggregate persisted as one JSON document.

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::contacts::ContactProfile;
use crate::habit::{Habit, HabitEntry};
use crate::sleep::SleepData;
use crate::workout::{Exercise, Workout};

/// Everything the tracker persists. Missing fields load as empty, so older
/// documents keep working as fields are added.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerData {
    pub work_categories: Vec<Category>,
    pub sports_categories: Vec<Category>,
    pub workouts: Vec<Workout>,
    pub exercises: Vec<Exercise>,
    pub gym_days: Vec<u8>,
    pub sleep_data: SleepData,
    pub habits: Vec<Habit>,
    pub habit_entries: Vec<HabitEntry>,
    pub contacts: Vec<ContactProfile>,
}

impl TrackerData {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
