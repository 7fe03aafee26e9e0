//! In-memory working copy of a workout being executed.

use chrono::{DateTime, Utc};

use super::{validate_set, WorkoutSet};
use crate::error::{CoreError, Result};
use crate::ids::{ExerciseId, SetId, WorkoutId, WorkoutSessionId};

/// Edits made here are not persisted. Hand the value to
/// [`super::WorkoutBook::finish`] to commit it, or drop it to abandon the run.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveWorkout {
    workout_id: WorkoutId,
    session_id: WorkoutSessionId,
    started_at: DateTime<Utc>,
    exercises: Vec<WorkoutSet>,
}

impl ActiveWorkout {
    pub(crate) fn new(workout_id: WorkoutId, plan: Vec<WorkoutSet>, started_at: DateTime<Utc>) -> Self {
        Self {
            workout_id,
            session_id: WorkoutSessionId::new(),
            started_at,
            exercises: plan,
        }
    }

    pub fn workout_id(&self) -> WorkoutId {
        self.workout_id
    }

    pub fn session_id(&self) -> WorkoutSessionId {
        self.session_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn exercises(&self) -> &[WorkoutSet] {
        &self.exercises
    }

    pub fn adjust_reps(&mut self, set: SetId, reps: u32) -> Result<()> {
        let line = self.line_mut(set)?;
        validate_set(line.sets, reps, line.weight_kg)?;
        line.reps = reps;
        Ok(())
    }

    pub fn adjust_weight(&mut self, set: SetId, weight_kg: f64) -> Result<()> {
        let line = self.line_mut(set)?;
        validate_set(line.sets, line.reps, weight_kg)?;
        line.weight_kg = weight_kg;
        Ok(())
    }

    pub fn adjust_sets(&mut self, set: SetId, sets: u32) -> Result<()> {
        let line = self.line_mut(set)?;
        validate_set(sets, line.reps, line.weight_kg)?;
        line.sets = sets;
        Ok(())
    }

    /// Append an exercise line not in the plan.
    pub fn add_exercise(
        &mut self,
        exercise_id: ExerciseId,
        exercise_name: &str,
        sets: u32,
        reps: u32,
        weight_kg: f64,
    ) -> Result<SetId> {
        validate_set(sets, reps, weight_kg)?;
        let line = WorkoutSet {
            id: SetId::new(),
            exercise_id,
            exercise_name: exercise_name.to_string(),
            sets,
            reps,
            weight_kg,
        };
        let id = line.id;
        self.exercises.push(line);
        Ok(id)
    }

    pub fn remove_exercise(&mut self, set: SetId) -> Result<WorkoutSet> {
        let index = self
            .exercises
            .iter()
            .position(|s| s.id == set)
            .ok_or_else(|| CoreError::not_found("active set", set))?;
        Ok(self.exercises.remove(index))
    }

    pub(crate) fn into_exercises(self) -> Vec<WorkoutSet> {
        self.exercises
    }

    fn line_mut(&mut self, set: SetId) -> Result<&mut WorkoutSet> {
        self.exercises
            .iter_mut()
            .find(|s| s.id == set)
            .ok_or_else(|| CoreError::not_found("active set", set))
    }
}
