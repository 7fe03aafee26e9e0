//! Workout plans, execution sessions and their aggregates.
//!
//! A [`Workout`] is a plan (ordered [`WorkoutSet`]s) plus a log of
//! [`CompletedWorkoutSession`]s. Executing a workout happens on an
//! [`ActiveWorkout`] working copy; nothing is recorded until
//! [`WorkoutBook::finish`] commits the session in one step. Past sessions keep
//! their own copy of the sets performed, so editing a plan never rewrites
//! history.

mod active;

pub use active::ActiveWorkout;

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use crate::calendar::{day_key, DayKey, Zone};
use crate::error::{CoreError, Result, ValidationError};
use crate::ids::{ExerciseId, SetId, WorkoutId, WorkoutSessionId};

/// Catalogue entry referenced by planned sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: ExerciseId,
    pub name: String,
    #[serde(default)]
    pub muscle_group: Option<String>,
}

/// One exercise line of a plan or of a performed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSet {
    pub id: SetId,
    pub exercise_id: ExerciseId,
    /// Copied from the catalogue so history survives exercise deletion.
    pub exercise_name: String,
    pub sets: u32,
    pub reps: u32,
    pub weight_kg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedWorkoutSession {
    pub id: WorkoutSessionId,
    pub started_at: DateTime<Utc>,
    pub day: DayKey,
    pub duration_secs: u64,
    pub completed_exercises: Vec<WorkoutSet>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    pub id: WorkoutId,
    pub name: String,
    #[serde(default)]
    pub sets: Vec<WorkoutSet>,
    #[serde(default)]
    pub completed_sessions: Vec<CompletedWorkoutSession>,
    pub created_at: DateTime<Utc>,
}

impl Workout {
    /// Integer-truncated mean session duration in seconds, 0 with no sessions.
    pub fn average_duration_secs(&self) -> u64 {
        let count = self.completed_sessions.len() as u64;
        if count == 0 {
            return 0;
        }
        self.total_duration_secs() / count
    }

    pub fn total_duration_secs(&self) -> u64 {
        self.completed_sessions.iter().map(|s| s.duration_secs).sum()
    }
}

/// Workouts, the exercise catalogue and the weekly gym days.
#[derive(Debug, Clone, Default)]
pub struct WorkoutBook {
    zone: Zone,
    workouts: IndexMap<WorkoutId, Workout>,
    exercises: IndexMap<ExerciseId, Exercise>,
    /// ISO weekdays, 1 = Monday .. 7 = Sunday.
    gym_days: BTreeSet<u8>,
}

impl WorkoutBook {
    pub fn new(zone: Zone) -> Self {
        Self {
            zone,
            ..Self::default()
        }
    }

    pub fn from_parts(
        zone: Zone,
        workouts: impl IntoIterator<Item = Workout>,
        exercises: impl IntoIterator<Item = Exercise>,
        gym_days: impl IntoIterator<Item = u8>,
    ) -> Self {
        Self {
            zone,
            workouts: workouts.into_iter().map(|w| (w.id, w)).collect(),
            exercises: exercises.into_iter().map(|e| (e.id, e)).collect(),
            gym_days: gym_days.into_iter().filter(|d| (1..=7).contains(d)).collect(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn get(&self, id: WorkoutId) -> Option<&Workout> {
        self.workouts.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Workout> {
        self.workouts.values()
    }

    pub fn exercise(&self, id: ExerciseId) -> Option<&Exercise> {
        self.exercises.get(&id)
    }

    pub fn exercises(&self) -> impl Iterator<Item = &Exercise> {
        self.exercises.values()
    }

    pub fn gym_days(&self) -> impl Iterator<Item = u8> + '_ {
        self.gym_days.iter().copied()
    }

    pub fn average_duration(&self, id: WorkoutId) -> Result<u64> {
        Ok(self.require(id)?.average_duration_secs())
    }

    pub fn total_duration(&self, id: WorkoutId) -> Result<u64> {
        Ok(self.require(id)?.total_duration_secs())
    }

    /// Dates of every completed session, for one workout or all of them,
    /// sorted ascending. A date appears once per session on that day.
    pub fn completion_dates(&self, id: Option<WorkoutId>) -> Result<Vec<NaiveDate>> {
        let mut dates: Vec<NaiveDate> = match id {
            Some(id) => self
                .require(id)?
                .completed_sessions
                .iter()
                .map(|s| s.day.date())
                .collect(),
            None => self
                .workouts
                .values()
                .flat_map(|w| w.completed_sessions.iter().map(|s| s.day.date()))
                .collect(),
        };
        dates.sort();
        Ok(dates)
    }

    /// Sessions completed within the seven days ending on `today`.
    pub fn sessions_in_last_week(&self, today: DayKey) -> usize {
        let from = today.days_before(6);
        self.workouts
            .values()
            .flat_map(|w| w.completed_sessions.iter())
            .filter(|s| s.day >= from && s.day <= today)
            .count()
    }

    // ── Catalogue ────────────────────────────────────────────────────

    pub fn add_exercise(&mut self, name: &str, muscle_group: Option<&str>) -> Result<ExerciseId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName { field: "name" }.into());
        }
        let exercise = Exercise {
            id: ExerciseId::new(),
            name: name.to_string(),
            muscle_group: muscle_group.map(str::trim).filter(|g| !g.is_empty()).map(String::from),
        };
        let id = exercise.id;
        self.exercises.insert(id, exercise);
        Ok(id)
    }

    /// Remove a catalogue entry. Plans and history keep the copied name.
    pub fn delete_exercise(&mut self, id: ExerciseId) -> Result<Exercise> {
        self.exercises
            .shift_remove(&id)
            .ok_or_else(|| CoreError::not_found("exercise", id))
    }

    // ── Plans ────────────────────────────────────────────────────────

    pub fn add_workout(&mut self, name: &str, now: DateTime<Utc>) -> Result<WorkoutId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName { field: "name" }.into());
        }
        let workout = Workout {
            id: WorkoutId::new(),
            name: name.to_string(),
            sets: Vec::new(),
            completed_sessions: Vec::new(),
            created_at: now,
        };
        let id = workout.id;
        self.workouts.insert(id, workout);
        debug!(workout = %id, "workout added");
        Ok(id)
    }

    pub fn delete_workout(&mut self, id: WorkoutId) -> Result<Workout> {
        self.workouts
            .shift_remove(&id)
            .ok_or_else(|| CoreError::not_found("workout", id))
    }

    pub fn add_planned_set(
        &mut self,
        workout_id: WorkoutId,
        exercise_id: ExerciseId,
        sets: u32,
        reps: u32,
        weight_kg: f64,
    ) -> Result<SetId> {
        validate_set(sets, reps, weight_kg)?;
        let exercise_name = self
            .exercises
            .get(&exercise_id)
            .ok_or_else(|| CoreError::not_found("exercise", exercise_id))?
            .name
            .clone();
        let workout = self.require_mut(workout_id)?;
        let set = WorkoutSet {
            id: SetId::new(),
            exercise_id,
            exercise_name,
            sets,
            reps,
            weight_kg,
        };
        let id = set.id;
        workout.sets.push(set);
        Ok(id)
    }

    pub fn remove_planned_set(&mut self, workout_id: WorkoutId, set_id: SetId) -> Result<WorkoutSet> {
        let workout = self.require_mut(workout_id)?;
        let index = workout
            .sets
            .iter()
            .position(|s| s.id == set_id)
            .ok_or_else(|| CoreError::not_found("planned set", set_id))?;
        Ok(workout.sets.remove(index))
    }

    /// Replace the gym days. Every day must be an ISO weekday (1..=7).
    pub fn set_gym_days(&mut self, days: &[u8]) -> Result<()> {
        if let Some(bad) = days.iter().find(|d| !(1..=7).contains(*d)) {
            return Err(ValidationError::InvalidValue {
                field: "gym_days".into(),
                message: format!("{bad} is not a weekday (1 = Monday .. 7 = Sunday)"),
            }
            .into());
        }
        self.gym_days = days.iter().copied().collect();
        Ok(())
    }

    // ── Execution ────────────────────────────────────────────────────

    /// Begin executing a workout. The returned working copy is not stored.
    pub fn start(&self, id: WorkoutId, now: DateTime<Utc>) -> Result<ActiveWorkout> {
        let workout = self.require(id)?;
        Ok(ActiveWorkout::new(workout.id, workout.sets.clone(), now))
    }

    /// Commit a finished working copy as one completed session.
    pub fn finish(
        &mut self,
        active: ActiveWorkout,
        now: DateTime<Utc>,
    ) -> Result<&CompletedWorkoutSession> {
        let zone = self.zone;
        let workout = self.require_mut(active.workout_id())?;
        let duration_secs = (now - active.started_at()).num_seconds().max(0) as u64;
        let session = CompletedWorkoutSession {
            id: active.session_id(),
            started_at: active.started_at(),
            day: day_key(active.started_at(), zone),
            duration_secs,
            completed_exercises: active.into_exercises(),
        };
        debug!(workout = %workout.id, duration_secs, "workout session committed");
        workout.completed_sessions.push(session);
        workout
            .completed_sessions
            .last()
            .ok_or_else(|| CoreError::invalid_state("session was not recorded"))
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn require(&self, id: WorkoutId) -> Result<&Workout> {
        self.workouts
            .get(&id)
            .ok_or_else(|| CoreError::not_found("workout", id))
    }

    fn require_mut(&mut self, id: WorkoutId) -> Result<&mut Workout> {
        self.workouts
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("workout", id))
    }

    pub(crate) fn to_parts(&self) -> (Vec<Workout>, Vec<Exercise>, Vec<u8>) {
        (
            self.workouts.values().cloned().collect(),
            self.exercises.values().cloned().collect(),
            self.gym_days.iter().copied().collect(),
        )
    }
}

pub(crate) fn validate_set(sets: u32, reps: u32, weight_kg: f64) -> Result<()> {
    if sets == 0 || reps == 0 {
        return Err(ValidationError::InvalidValue {
            field: "sets/reps".into(),
            message: "must be at least 1".into(),
        }
        .into());
    }
    if !weight_kg.is_finite() || weight_kg < 0.0 {
        return Err(ValidationError::InvalidValue {
            field: "weight_kg".into(),
            message: format!("{weight_kg} is not a valid weight"),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn push_day() -> (WorkoutBook, WorkoutId, ExerciseId) {
        let mut book = WorkoutBook::new(Zone::utc());
        let bench = book.add_exercise("Bench press", Some("chest")).unwrap();
        let id = book.add_workout("Push day", at("2024-01-01T08:00:00Z")).unwrap();
        book.add_planned_set(id, bench, 3, 8, 60.0).unwrap();
        (book, id, bench)
    }

    fn run(book: &mut WorkoutBook, id: WorkoutId, start: DateTime<Utc>, secs: i64) {
        let active = book.start(id, start).unwrap();
        book.finish(active, start + Duration::seconds(secs)).unwrap();
    }

    #[test]
    fn average_duration_truncates() {
        let (mut book, id, _) = push_day();
        assert_eq!(book.average_duration(id).unwrap(), 0);
        run(&mut book, id, at("2024-01-02T08:00:00Z"), 100);
        run(&mut book, id, at("2024-01-03T08:00:00Z"), 101);
        assert_eq!(book.average_duration(id).unwrap(), 100);
        assert_eq!(book.total_duration(id).unwrap(), 201);
    }

    #[test]
    fn completion_dates_across_workouts() {
        let (mut book, push, _) = push_day();
        let pull = book.add_workout("Pull day", at("2024-01-01T08:00:00Z")).unwrap();
        run(&mut book, push, at("2024-01-05T08:00:00Z"), 60);
        run(&mut book, pull, at("2024-01-02T08:00:00Z"), 60);
        run(&mut book, push, at("2024-01-02T18:00:00Z"), 60);

        let all = book.completion_dates(None).unwrap();
        let expected: Vec<NaiveDate> = ["2024-01-02", "2024-01-02", "2024-01-05"]
            .iter()
            .map(|d| d.parse().unwrap())
            .collect();
        assert_eq!(all, expected);
        assert_eq!(book.completion_dates(Some(pull)).unwrap().len(), 1);
        assert!(book
            .completion_dates(Some(WorkoutId::new()))
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn nothing_is_recorded_until_finish() {
        let (mut book, id, _) = push_day();
        let mut active = book.start(id, at("2024-01-02T08:00:00Z")).unwrap();
        let set = active.exercises()[0].id;
        active.adjust_reps(set, 12).unwrap();
        assert!(book.get(id).unwrap().completed_sessions.is_empty());
        assert_eq!(book.get(id).unwrap().sets[0].reps, 8);

        let session = book.finish(active, at("2024-01-02T09:00:00Z")).unwrap();
        assert_eq!(session.completed_exercises[0].reps, 12);
        assert_eq!(session.duration_secs, 3600);
        assert_eq!(book.get(id).unwrap().sets[0].reps, 8);
    }

    #[test]
    fn editing_plan_keeps_history() {
        let (mut book, id, _) = push_day();
        run(&mut book, id, at("2024-01-02T08:00:00Z"), 60);
        let planned = book.get(id).unwrap().sets[0].id;
        book.remove_planned_set(id, planned).unwrap();
        assert!(book.get(id).unwrap().sets.is_empty());
        assert_eq!(book.get(id).unwrap().completed_sessions[0].completed_exercises.len(), 1);
    }

    #[test]
    fn planned_sets_are_validated() {
        let (mut book, id, bench) = push_day();
        assert!(book.add_planned_set(id, bench, 0, 8, 60.0).is_err());
        assert!(book.add_planned_set(id, bench, 3, 8, -1.0).is_err());
        assert!(book
            .add_planned_set(id, ExerciseId::new(), 3, 8, 60.0)
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn gym_days_must_be_weekdays() {
        let mut book = WorkoutBook::new(Zone::utc());
        assert!(book.set_gym_days(&[1, 8]).is_err());
        book.set_gym_days(&[4, 1, 4]).unwrap();
        assert_eq!(book.gym_days().collect::<Vec<_>>(), vec![1, 4]);
    }

    #[test]
    fn sessions_in_last_week_counts_window() {
        let (mut book, id, _) = push_day();
        run(&mut book, id, at("2024-01-01T08:00:00Z"), 60);
        run(&mut book, id, at("2024-01-05T08:00:00Z"), 60);
        run(&mut book, id, at("2024-01-08T08:00:00Z"), 60);
        let today: DayKey = "2024-01-08".parse().unwrap();
        assert_eq!(book.sessions_in_last_week(today), 2);
    }
}
