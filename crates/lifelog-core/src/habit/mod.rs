//! Habit tracking with derived streaks.
//!
//! Each habit keeps at most one entry per local calendar day. Toggling a day
//! flips that entry (a first toggle marks it completed), and every toggle
//! recomputes `current_streak`, `longest_streak` and `completion_rate` from the
//! full entry set. Those derived fields are never edited directly.

mod streak;

pub use streak::{completion_rate, current_streak, longest_streak};

use chrono::{DateTime, NaiveTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::calendar::{day_key, DayKey, Zone};
use crate::error::{CoreError, Result, ValidationError};
use crate::ids::HabitId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HabitKind {
    /// Something to do (completed = done).
    Good,
    /// Something to avoid (completed = resisted).
    Bad,
}

impl std::str::FromStr for HabitKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "good" => Ok(HabitKind::Good),
            "bad" => Ok(HabitKind::Bad),
            other => Err(format!("unknown habit kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub kind: HabitKind,
    pub current_streak: i32,
    pub longest_streak: i32,
    /// 0..=100
    pub completion_rate: f64,
    #[serde(default)]
    pub reminder_enabled: bool,
    /// Local time of day of the daily reminder.
    #[serde(default)]
    pub reminder_time: Option<NaiveTime>,
    pub created_at: DateTime<Utc>,
}

/// Persisted per-day entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitEntry {
    pub habit_id: HabitId,
    pub day: DayKey,
    pub completed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct HabitBook {
    zone: Zone,
    habits: IndexMap<HabitId, Habit>,
    entries: HashMap<HabitId, BTreeMap<DayKey, bool>>,
}

impl HabitBook {
    pub fn new(zone: Zone) -> Self {
        Self {
            zone,
            habits: IndexMap::new(),
            entries: HashMap::new(),
        }
    }

    /// Rebuild from persisted habits and entries. Entries for unknown habits
    /// are dropped; derived fields are recomputed as of `now`.
    pub fn from_parts(
        zone: Zone,
        habits: impl IntoIterator<Item = Habit>,
        entries: impl IntoIterator<Item = HabitEntry>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut book = Self::new(zone);
        book.habits = habits.into_iter().map(|h| (h.id, h)).collect();
        for entry in entries {
            if book.habits.contains_key(&entry.habit_id) {
                book.entries
                    .entry(entry.habit_id)
                    .or_default()
                    .insert(entry.day, entry.completed);
            }
        }
        let ids: Vec<HabitId> = book.habits.keys().copied().collect();
        for id in ids {
            book.recompute(id, now);
        }
        book
    }

    /// Flatten entries for persistence, ordered by habit then day.
    pub fn entries(&self) -> Vec<HabitEntry> {
        self.habits
            .keys()
            .filter_map(|id| self.entries.get(id).map(|days| (id, days)))
            .flat_map(|(id, days)| {
                days.iter().map(move |(day, completed)| HabitEntry {
                    habit_id: *id,
                    day: *day,
                    completed: *completed,
                })
            })
            .collect()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn get(&self, id: HabitId) -> Option<&Habit> {
        self.habits.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Habit> {
        self.habits.values()
    }

    pub fn len(&self) -> usize {
        self.habits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.habits.is_empty()
    }

    pub fn is_completed(&self, id: HabitId, day: DayKey) -> bool {
        self.entries
            .get(&id)
            .and_then(|days| days.get(&day))
            .copied()
            .unwrap_or(false)
    }

    /// Number of habits completed on `day`.
    pub fn completed_on(&self, day: DayKey) -> usize {
        self.habits
            .keys()
            .filter(|id| self.is_completed(**id, day))
            .count()
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn add(
        &mut self,
        name: &str,
        description: &str,
        kind: HabitKind,
        now: DateTime<Utc>,
    ) -> Result<HabitId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName { field: "name" }.into());
        }
        let habit = Habit {
            id: HabitId::new(),
            name: name.to_string(),
            description: description.trim().to_string(),
            kind,
            current_streak: 0,
            longest_streak: 0,
            completion_rate: 0.0,
            reminder_enabled: false,
            reminder_time: None,
            created_at: now,
        };
        let id = habit.id;
        self.habits.insert(id, habit);
        debug!(habit = %id, "habit added");
        Ok(id)
    }

    /// Remove a habit together with its entries.
    pub fn delete(&mut self, id: HabitId) -> Result<Habit> {
        let habit = self
            .habits
            .shift_remove(&id)
            .ok_or_else(|| CoreError::not_found("habit", id))?;
        self.entries.remove(&id);
        Ok(habit)
    }

    /// Flip completion for `day` and recompute derived stats.
    ///
    /// Returns the new completion flag. Days after today are rejected.
    pub fn toggle(&mut self, id: HabitId, day: DayKey, now: DateTime<Utc>) -> Result<bool> {
        self.require(id)?;
        let today = day_key(now, self.zone);
        if day > today {
            return Err(ValidationError::InvalidValue {
                field: "day".into(),
                message: format!("{day} is after today ({today})"),
            }
            .into());
        }
        let days = self.entries.entry(id).or_default();
        let completed = match days.get(&day) {
            Some(done) => !done,
            None => true,
        };
        days.insert(day, completed);
        self.recompute(id, now);
        debug!(habit = %id, %day, completed, "habit entry toggled");
        Ok(completed)
    }

    pub fn set_reminder(
        &mut self,
        id: HabitId,
        enabled: bool,
        time: Option<NaiveTime>,
    ) -> Result<&Habit> {
        let habit = self
            .habits
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("habit", id))?;
        if enabled && time.is_none() && habit.reminder_time.is_none() {
            return Err(ValidationError::InvalidValue {
                field: "reminder_time".into(),
                message: "an enabled reminder needs a time".into(),
            }
            .into());
        }
        habit.reminder_enabled = enabled;
        if time.is_some() {
            habit.reminder_time = time;
        }
        Ok(habit)
    }

    /// Recompute derived stats for every habit, e.g. after a day boundary.
    pub fn refresh(&mut self, now: DateTime<Utc>) {
        let ids: Vec<HabitId> = self.habits.keys().copied().collect();
        for id in ids {
            self.recompute(id, now);
        }
    }

    /// Re-derive streaks and completion rate of one habit as of `now`.
    pub fn recompute(&mut self, id: HabitId, now: DateTime<Utc>) {
        let today = day_key(now, self.zone);
        let zone = self.zone;
        let empty = BTreeMap::new();
        let days = self.entries.get(&id).unwrap_or(&empty);
        if let Some(habit) = self.habits.get_mut(&id) {
            let since = day_key(habit.created_at, zone);
            habit.current_streak = current_streak(days, today);
            habit.longest_streak = longest_streak(days);
            habit.completion_rate = completion_rate(days, since, today);
        }
    }

    fn require(&self, id: HabitId) -> Result<&Habit> {
        self.habits
            .get(&id)
            .ok_or_else(|| CoreError::not_found("habit", id))
    }
}
