//! The tracker service: one aggregate over every engine.
//!
//! `Tracker` owns the category, sleep, habit, workout and contact books and
//! wires them to three collaborators: a [`Clock`] for "now", a
//! [`PersistenceStore`] for the JSON document and a [`NotificationScheduler`]
//! for reminders. Every committed command persists the whole aggregate and
//! returns the [`Event`]s it produced.
//!
//! Collaborator failures never undo a command. A failed save or a refused
//! notification is logged at warn level and the in-memory state stands.

use chrono::{DateTime, NaiveTime, Utc};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::calendar::{day_key, DayKey, Zone};
use crate::category::{Category, CategoryBook, CategoryKind, CategoryTimes, ToggleOutcome};
use crate::clock::Clock;
use crate::contacts::{ContactBook, ContactProfile};
use crate::data::TrackerData;
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::habit::{HabitBook, HabitKind};
use crate::ids::{CallId, CategoryId, ContactId, ExerciseId, HabitId, SetId, WorkoutId};
use crate::notify::{Notification, NotificationScheduler};
use crate::reminders;
use crate::sleep::{SleepLog, DEFAULT_RETENTION};
use crate::stats::TrackerSummary;
use crate::storage::PersistenceStore;
use crate::workout::{ActiveWorkout, WorkoutBook};

/// A tracker shared between threads of a host.
pub type SharedTracker = Arc<Mutex<Tracker>>;

/// Behaviour knobs, normally derived from [`crate::Config::tracker_settings`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerSettings {
    pub zone: Zone,
    pub sleep_retention: usize,
    pub early_bedtime_hour: u32,
    /// Governs automatic reminders (inactivity, gym days, habits). An alarm
    /// requested explicitly when going to sleep is always scheduled.
    pub reminders_enabled: bool,
    pub inactivity_nudge_minutes: u32,
    pub gym_reminder_hour: u32,
    pub habit_reminder_default: NaiveTime,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            zone: Zone::Local,
            sleep_retention: DEFAULT_RETENTION,
            early_bedtime_hour: 22,
            reminders_enabled: true,
            inactivity_nudge_minutes: 60,
            gym_reminder_hour: 18,
            habit_reminder_default: NaiveTime::from_hms_opt(20, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

pub struct Tracker {
    clock: Box<dyn Clock>,
    store: Box<dyn PersistenceStore>,
    notifier: Box<dyn NotificationScheduler>,
    settings: TrackerSettings,
    categories: CategoryBook,
    sleep: SleepLog,
    habits: HabitBook,
    workouts: WorkoutBook,
    contacts: ContactBook,
}

impl Tracker {
    /// Build a tracker from whatever `store` holds.
    ///
    /// A missing, unreadable or corrupt document yields an empty tracker; the
    /// problem is logged and the bad document is left in place until the next
    /// successful save overwrites it.
    pub fn load(
        settings: TrackerSettings,
        clock: Box<dyn Clock>,
        store: Box<dyn PersistenceStore>,
        notifier: Box<dyn NotificationScheduler>,
    ) -> Self {
        let data = match store.load() {
            Ok(Some(json)) => TrackerData::from_json(&json).unwrap_or_else(|e| {
                warn!(error = %e, "stored tracker data is corrupt, starting empty");
                TrackerData::default()
            }),
            Ok(None) => {
                debug!("no stored tracker data, starting empty");
                TrackerData::default()
            }
            Err(e) => {
                warn!(error = %e, "failed to read tracker data, starting empty");
                TrackerData::default()
            }
        };
        let now = clock.now();
        Self::from_data(data, settings, now, clock, store, notifier)
    }

    fn from_data(
        data: TrackerData,
        settings: TrackerSettings,
        now: DateTime<Utc>,
        clock: Box<dyn Clock>,
        store: Box<dyn PersistenceStore>,
        notifier: Box<dyn NotificationScheduler>,
    ) -> Self {
        let zone = settings.zone;
        let work = data.work_categories.into_iter().map(|mut c| {
            c.kind = CategoryKind::Work;
            c
        });
        let sports = data.sports_categories.into_iter().map(|mut c| {
            c.kind = CategoryKind::Sports;
            c
        });
        let categories = CategoryBook::from_categories(zone, work.chain(sports));
        let sleep = SleepLog::from_data(
            data.sleep_data,
            zone,
            settings.sleep_retention,
            settings.early_bedtime_hour,
        );
        let habits = HabitBook::from_parts(zone, data.habits, data.habit_entries, now);
        let workouts = WorkoutBook::from_parts(zone, data.workouts, data.exercises, data.gym_days);
        let contacts = ContactBook::from_contacts(data.contacts);
        debug!(
            categories = categories.len(),
            habits = habits.len(),
            sleep_sessions = sleep.session_count(),
            "tracker loaded"
        );
        Self {
            clock,
            store,
            notifier,
            settings,
            categories,
            sleep,
            habits,
            workouts,
            contacts,
        }
    }

    pub fn into_shared(self) -> SharedTracker {
        Arc::new(Mutex::new(self))
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn today(&self) -> DayKey {
        day_key(self.now(), self.settings.zone)
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    pub fn categories(&self) -> &CategoryBook {
        &self.categories
    }

    pub fn sleep(&self) -> &SleepLog {
        &self.sleep
    }

    pub fn habits(&self) -> &HabitBook {
        &self.habits
    }

    pub fn workouts(&self) -> &WorkoutBook {
        &self.workouts
    }

    pub fn contacts(&self) -> &ContactBook {
        &self.contacts
    }

    pub fn category_time(&self, id: CategoryId) -> Result<CategoryTimes> {
        self.categories.current_time(id, self.now())
    }

    pub fn weekly_series(&self, id: CategoryId) -> Result<[f64; 7]> {
        self.categories.weekly_series(id, self.now())
    }

    pub fn totals(&self, kind: CategoryKind) -> CategoryTimes {
        self.categories.totals(kind, self.now())
    }

    pub fn contacts_due(&self) -> Vec<&ContactProfile> {
        self.contacts.due(self.now())
    }

    pub fn summary(&self) -> TrackerSummary {
        TrackerSummary::collect(
            self.now(),
            self.settings.zone,
            &self.categories,
            &self.sleep,
            &self.habits,
            &self.workouts,
            &self.contacts,
        )
    }

    /// The persisted form of the current state.
    pub fn snapshot(&self) -> TrackerData {
        let (work_categories, sports_categories): (Vec<Category>, Vec<Category>) = self
            .categories
            .iter()
            .cloned()
            .partition(|c| c.kind == CategoryKind::Work);
        let (workouts, exercises, gym_days) = self.workouts.to_parts();
        TrackerData {
            work_categories,
            sports_categories,
            workouts,
            exercises,
            gym_days,
            sleep_data: self.sleep.to_data(),
            habits: self.habits.iter().cloned().collect(),
            habit_entries: self.habits.entries(),
            contacts: self.contacts.iter().cloned().collect(),
        }
    }

    /// Write the current state to the store, surfacing any failure.
    pub fn save(&self) -> Result<()> {
        let json = self.snapshot().to_json()?;
        self.store.save(&json)
    }

    // ── Categories ───────────────────────────────────────────────────

    pub fn add_category(&mut self, name: &str, kind: CategoryKind) -> Result<Event> {
        let now = self.now();
        let id = self.categories.add(name, kind, now)?;
        let name = self
            .categories
            .get(id)
            .map(|c| c.name.clone())
            .unwrap_or_default();
        self.persist();
        Ok(Event::CategoryAdded { id, name, kind, at: now })
    }

    /// Delete a category, crediting a running segment first.
    pub fn delete_category(&mut self, id: CategoryId) -> Result<Event> {
        let now = self.now();
        let work_was_running = self.categories.any_running(CategoryKind::Work);
        let flushed_minutes = self
            .categories
            .get(id)
            .map(|c| c.live_minutes(now))
            .ok_or_else(|| CoreError::not_found("category", id))?;
        self.categories.delete(id, now)?;
        self.after_timer_change(work_was_running, now);
        self.persist();
        Ok(Event::CategoryDeleted {
            id,
            flushed_minutes,
            at: now,
        })
    }

    /// Start a timer. Any other running timer is stopped first and reported
    /// before the start event.
    pub fn start_timer(&mut self, id: CategoryId) -> Result<Vec<Event>> {
        let now = self.now();
        let work_was_running = self.categories.any_running(CategoryKind::Work);
        let outcome = self.categories.start(id, now)?;
        let mut events: Vec<Event> = outcome
            .stopped
            .into_iter()
            .map(|(stopped, elapsed_minutes)| Event::TimerStopped {
                id: stopped,
                elapsed_minutes,
                at: now,
            })
            .collect();
        events.push(Event::TimerStarted { id, at: now });
        self.after_timer_change(work_was_running, now);
        self.persist();
        Ok(events)
    }

    pub fn stop_timer(&mut self, id: CategoryId) -> Result<Event> {
        let now = self.now();
        let work_was_running = self.categories.any_running(CategoryKind::Work);
        let elapsed_minutes = self.categories.stop(id, now)?;
        self.after_timer_change(work_was_running, now);
        self.persist();
        Ok(Event::TimerStopped {
            id,
            elapsed_minutes,
            at: now,
        })
    }

    pub fn toggle_timer(&mut self, id: CategoryId) -> Result<Vec<Event>> {
        let now = self.now();
        let work_was_running = self.categories.any_running(CategoryKind::Work);
        let events = match self.categories.toggle(id, now)? {
            ToggleOutcome::Stopped { id, elapsed_minutes } => vec![Event::TimerStopped {
                id,
                elapsed_minutes,
                at: now,
            }],
            ToggleOutcome::Started(outcome) => {
                let mut events: Vec<Event> = outcome
                    .stopped
                    .into_iter()
                    .map(|(stopped, elapsed_minutes)| Event::TimerStopped {
                        id: stopped,
                        elapsed_minutes,
                        at: now,
                    })
                    .collect();
                events.push(Event::TimerStarted { id, at: now });
                events
            }
        };
        self.after_timer_change(work_was_running, now);
        self.persist();
        Ok(events)
    }

    /// Re-attach a timer a host remembered as running when it last exited.
    ///
    /// Running state is never part of the persisted document, so hosts that
    /// live across process restarts keep `(id, started_at)` themselves.
    pub fn restore_running_timer(&mut self, id: CategoryId, started_at: DateTime<Utc>) -> Result<()> {
        let now = self.now();
        self.categories.restore_running(id, started_at, now)?;
        debug!(category = %id, %started_at, "running timer restored");
        Ok(())
    }

    /// `(id, started_at)` of the running timer, for hosts that restore it.
    pub fn running_timer(&self) -> Option<(CategoryId, DateTime<Utc>)> {
        self.categories
            .running()
            .and_then(|c| c.started_at().map(|at| (c.id, at)))
    }

    // ── Sleep ────────────────────────────────────────────────────────

    pub fn go_to_sleep(&mut self, alarm_time: Option<DateTime<Utc>>) -> Result<Event> {
        let now = self.now();
        let bedtime = self.sleep.go_to_sleep(now, alarm_time)?;
        if let Some(alarm) = alarm_time {
            let notification = reminders::sleep_alarm(alarm, now, self.settings.zone);
            if self.notify(&notification) {
                self.sleep.set_pending_alarm(Some(notification.id));
            }
        }
        if bedtime.early {
            info!("early bedtime");
        }
        self.persist();
        Ok(Event::FellAsleep {
            alarm_at: alarm_time,
            early_bedtime: bedtime.early,
            at: now,
        })
    }

    pub fn wake_up(&mut self) -> Result<Event> {
        let now = self.now();
        let wakeup = self.sleep.wake_up(now)?;
        if let Some(alarm) = wakeup.cancelled_alarm {
            self.notifier.cancel(&[alarm]);
        }
        if let Some(evicted) = &wakeup.evicted {
            debug!(session = %evicted.id, "oldest sleep session evicted");
        }
        self.persist();
        Ok(Event::WokeUp {
            session_id: wakeup.session.as_ref().map(|s| s.id),
            duration_hours: wakeup.session.as_ref().map_or(0.0, |s| s.duration_hours()),
            at: now,
        })
    }

    // ── Habits ───────────────────────────────────────────────────────

    pub fn add_habit(&mut self, name: &str, description: &str, kind: HabitKind) -> Result<Event> {
        let now = self.now();
        let id = self.habits.add(name, description, kind, now)?;
        let name = self.habits.get(id).map(|h| h.name.clone()).unwrap_or_default();
        self.persist();
        Ok(Event::HabitAdded { id, name, at: now })
    }

    pub fn delete_habit(&mut self, id: HabitId) -> Result<Event> {
        let now = self.now();
        let habit = self.habits.delete(id)?;
        self.notifier.cancel(&[reminders::habit_reminder_id(&habit)]);
        self.persist();
        Ok(Event::HabitDeleted { id, at: now })
    }

    /// Flip completion for `day` (today when `None`).
    pub fn toggle_habit(&mut self, id: HabitId, day: Option<DayKey>) -> Result<Event> {
        let now = self.now();
        let day = day.unwrap_or_else(|| day_key(now, self.settings.zone));
        let completed = self.habits.toggle(id, day, now)?;
        let current_streak = self.habits.get(id).map_or(0, |h| h.current_streak);
        self.persist();
        Ok(Event::HabitToggled {
            id,
            day,
            completed,
            current_streak,
            at: now,
        })
    }

    /// Enable or disable the daily reminder. Enabling without a time falls
    /// back to the habit's previous time, then to the configured default.
    pub fn set_habit_reminder(
        &mut self,
        id: HabitId,
        enabled: bool,
        time: Option<NaiveTime>,
    ) -> Result<Event> {
        let now = self.now();
        let fallback = self
            .habits
            .get(id)
            .ok_or_else(|| CoreError::not_found("habit", id))?
            .reminder_time
            .or(Some(self.settings.habit_reminder_default));
        let time = if enabled { time.or(fallback) } else { time };
        let habit = self.habits.set_reminder(id, enabled, time)?.clone();
        let reminder = self
            .settings
            .reminders_enabled
            .then(|| reminders::habit_reminder(&habit, now, self.settings.zone))
            .flatten();
        match reminder {
            Some(notification) => {
                self.notify(&notification);
            }
            None => self.notifier.cancel(&[reminders::habit_reminder_id(&habit)]),
        }
        self.persist();
        Ok(Event::HabitReminderSet {
            id,
            enabled,
            at: now,
        })
    }

    /// Recompute habit streaks as of now, e.g. after midnight in a long-lived host.
    pub fn refresh(&mut self) {
        let now = self.now();
        self.habits.refresh(now);
        self.persist();
    }

    // ── Workouts ─────────────────────────────────────────────────────

    pub fn add_exercise(&mut self, name: &str, muscle_group: Option<&str>) -> Result<Event> {
        let now = self.now();
        let id = self.workouts.add_exercise(name, muscle_group)?;
        let name = self
            .workouts
            .exercise(id)
            .map(|e| e.name.clone())
            .unwrap_or_default();
        self.persist();
        Ok(Event::ExerciseAdded { id, name, at: now })
    }

    pub fn delete_exercise(&mut self, id: ExerciseId) -> Result<Event> {
        let now = self.now();
        self.workouts.delete_exercise(id)?;
        self.persist();
        Ok(Event::ExerciseDeleted { id, at: now })
    }

    pub fn add_workout(&mut self, name: &str) -> Result<Event> {
        let now = self.now();
        let id = self.workouts.add_workout(name, now)?;
        let name = self.workouts.get(id).map(|w| w.name.clone()).unwrap_or_default();
        self.persist();
        Ok(Event::WorkoutAdded { id, name, at: now })
    }

    pub fn delete_workout(&mut self, id: WorkoutId) -> Result<Event> {
        let now = self.now();
        self.workouts.delete_workout(id)?;
        self.persist();
        Ok(Event::WorkoutDeleted { id, at: now })
    }

    pub fn add_planned_set(
        &mut self,
        workout_id: WorkoutId,
        exercise_id: ExerciseId,
        sets: u32,
        reps: u32,
        weight_kg: f64,
    ) -> Result<Event> {
        let now = self.now();
        let set_id = self
            .workouts
            .add_planned_set(workout_id, exercise_id, sets, reps, weight_kg)?;
        self.persist();
        Ok(Event::PlannedSetAdded {
            workout_id,
            set_id,
            at: now,
        })
    }

    pub fn remove_planned_set(&mut self, workout_id: WorkoutId, set_id: SetId) -> Result<Event> {
        let now = self.now();
        self.workouts.remove_planned_set(workout_id, set_id)?;
        self.persist();
        Ok(Event::PlannedSetRemoved {
            workout_id,
            set_id,
            at: now,
        })
    }

    /// Replace the gym days and reschedule their weekly reminders.
    pub fn set_gym_days(&mut self, days: &[u8]) -> Result<Event> {
        let now = self.now();
        self.workouts.set_gym_days(days)?;
        self.schedule_gym_reminders(now);
        self.persist();
        Ok(Event::GymDaysSet {
            days: self.workouts.gym_days().collect(),
            at: now,
        })
    }

    /// Begin a workout. Nothing is stored until [`Tracker::finish_workout`].
    pub fn start_workout(&self, id: WorkoutId) -> Result<ActiveWorkout> {
        self.workouts.start(id, self.now())
    }

    pub fn finish_workout(&mut self, active: ActiveWorkout) -> Result<Event> {
        let now = self.now();
        let id = active.workout_id();
        let session = self.workouts.finish(active, now)?;
        let event = Event::WorkoutFinished {
            id,
            session_id: session.id,
            duration_secs: session.duration_secs,
            at: now,
        };
        self.persist();
        Ok(event)
    }

    // ── Contacts ─────────────────────────────────────────────────────

    pub fn add_contact(&mut self, name: &str, follow_up_days: u32) -> Result<Event> {
        let now = self.now();
        let id = self.contacts.add(name, follow_up_days, now)?;
        let name = self.contacts.get(id).map(|c| c.name.clone()).unwrap_or_default();
        self.persist();
        Ok(Event::ContactAdded { id, name, at: now })
    }

    pub fn delete_contact(&mut self, id: ContactId) -> Result<Event> {
        let now = self.now();
        self.contacts.delete(id)?;
        self.persist();
        Ok(Event::ContactDeleted { id, at: now })
    }

    pub fn schedule_call(
        &mut self,
        contact_id: ContactId,
        scheduled_for: DateTime<Utc>,
        note: &str,
    ) -> Result<Event> {
        let now = self.now();
        let call_id = self.contacts.schedule_call(contact_id, scheduled_for, note)?;
        self.persist();
        Ok(Event::CallScheduled {
            contact_id,
            call_id,
            scheduled_for,
            at: now,
        })
    }

    pub fn complete_call(&mut self, contact_id: ContactId, call_id: CallId) -> Result<Event> {
        let now = self.now();
        self.contacts.complete_call(contact_id, call_id, now)?;
        self.persist();
        Ok(Event::CallCompleted {
            contact_id,
            call_id,
            at: now,
        })
    }

    // ── Reminders ────────────────────────────────────────────────────

    /// Schedule every standing reminder (gym days, habits) from scratch.
    ///
    /// Hosts call this at startup; commands keep reminders current after that.
    pub fn sync_reminders(&self) {
        let now = self.now();
        self.schedule_gym_reminders(now);
        for habit in self.habits.iter() {
            let reminder = self
                .settings
                .reminders_enabled
                .then(|| reminders::habit_reminder(habit, now, self.settings.zone))
                .flatten();
            match reminder {
                Some(notification) => {
                    self.notify(&notification);
                }
                None => self.notifier.cancel(&[reminders::habit_reminder_id(habit)]),
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn schedule_gym_reminders(&self, now: DateTime<Utc>) {
        self.notifier.cancel(&reminders::all_gym_reminder_ids());
        if !self.settings.reminders_enabled {
            return;
        }
        let time = NaiveTime::from_hms_opt(self.settings.gym_reminder_hour.min(23), 0, 0)
            .unwrap_or(NaiveTime::MIN);
        for notification in
            reminders::gym_reminders(self.workouts.gym_days(), time, now, self.settings.zone)
        {
            self.notify(&notification);
        }
    }

    /// Keep the inactivity nudge in step with work timers: cancelled while a
    /// work timer runs, scheduled when the last one stops.
    fn after_timer_change(&self, work_was_running: bool, now: DateTime<Utc>) {
        let work_running = self.categories.any_running(CategoryKind::Work);
        if work_running {
            self.notifier
                .cancel(&[reminders::INACTIVITY_NUDGE_ID.to_string()]);
        } else if work_was_running && self.settings.reminders_enabled {
            let nudge = reminders::inactivity_nudge(now, self.settings.inactivity_nudge_minutes);
            self.notify(&nudge);
        }
    }

    /// Returns whether the scheduler accepted the notification.
    fn notify(&self, notification: &Notification) -> bool {
        match self.notifier.schedule(notification) {
            Ok(()) => true,
            Err(e) => {
                warn!(id = %notification.id, error = %e, "failed to schedule notification");
                false
            }
        }
    }

    fn persist(&self) {
        if let Err(e) = self.save() {
            warn!(error = %e, "failed to persist tracker data");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::notify::MemoryScheduler;
    use crate::storage::MemoryStore;
    use chrono::Duration;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn settings() -> TrackerSettings {
        TrackerSettings {
            zone: Zone::utc(),
            ..TrackerSettings::default()
        }
    }

    fn tracker(clock: &ManualClock, store: &MemoryStore, notes: &MemoryScheduler) -> Tracker {
        Tracker::load(
            settings(),
            Box::new(clock.clone()),
            Box::new(store.clone()),
            Box::new(notes.clone()),
        )
    }

    #[test]
    fn start_reports_stopped_timers_first() {
        let clock = ManualClock::new(at("2024-01-01T09:00:00Z"));
        let (store, notes) = (MemoryStore::new(), MemoryScheduler::new());
        let mut t = tracker(&clock, &store, &notes);
        let a = match t.add_category("Deep work", CategoryKind::Work).unwrap() {
            Event::CategoryAdded { id, .. } => id,
            other => panic!("unexpected {other:?}"),
        };
        let b = match t.add_category("Run", CategoryKind::Sports).unwrap() {
            Event::CategoryAdded { id, .. } => id,
            other => panic!("unexpected {other:?}"),
        };
        t.start_timer(a).unwrap();
        clock.advance(Duration::minutes(30));
        let events = t.start_timer(b).unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            Event::TimerStopped { id, elapsed_minutes, .. } if id == a && elapsed_minutes == 30.0
        ));
        assert!(matches!(events[1], Event::TimerStarted { id, .. } if id == b));
    }

    #[test]
    fn every_command_persists() {
        let clock = ManualClock::new(at("2024-01-01T09:00:00Z"));
        let (store, notes) = (MemoryStore::new(), MemoryScheduler::new());
        let mut t = tracker(&clock, &store, &notes);
        t.add_habit("Floss", "", HabitKind::Good).unwrap();
        let saved = TrackerData::from_json(&store.document().unwrap()).unwrap();
        assert_eq!(saved.habits.len(), 1);
    }

    #[test]
    fn nudge_follows_work_timers() {
        let clock = ManualClock::new(at("2024-01-01T09:00:00Z"));
        let (store, notes) = (MemoryStore::new(), MemoryScheduler::new());
        let mut t = tracker(&clock, &store, &notes);
        let id = match t.add_category("Code", CategoryKind::Work).unwrap() {
            Event::CategoryAdded { id, .. } => id,
            other => panic!("unexpected {other:?}"),
        };
        t.start_timer(id).unwrap();
        assert!(notes.get(reminders::INACTIVITY_NUDGE_ID).is_none());
        clock.advance(Duration::minutes(10));
        t.stop_timer(id).unwrap();
        let nudge = notes.get(reminders::INACTIVITY_NUDGE_ID).unwrap();
        assert_eq!(nudge.fire_at, at("2024-01-01T10:10:00Z"));
        t.start_timer(id).unwrap();
        assert!(notes.get(reminders::INACTIVITY_NUDGE_ID).is_none());
    }

    #[test]
    fn enabling_habit_reminder_uses_default_time() {
        let clock = ManualClock::new(at("2024-01-01T09:00:00Z"));
        let (store, notes) = (MemoryStore::new(), MemoryScheduler::new());
        let mut t = tracker(&clock, &store, &notes);
        let id = match t.add_habit("Journal", "", HabitKind::Good).unwrap() {
            Event::HabitAdded { id, .. } => id,
            other => panic!("unexpected {other:?}"),
        };
        t.set_habit_reminder(id, true, None).unwrap();
        let habit = t.habits().get(id).unwrap();
        assert_eq!(habit.reminder_time, NaiveTime::from_hms_opt(20, 0, 0));
        let pending = notes.get(&reminders::habit_reminder_id(habit)).unwrap();
        assert_eq!(pending.fire_at, at("2024-01-01T20:00:00Z"));

        t.set_habit_reminder(id, false, None).unwrap();
        assert!(notes.pending().is_empty());
    }

    #[test]
    fn shared_tracker_serialises_commands_across_threads() {
        let clock = ManualClock::new(at("2024-01-01T09:00:00Z"));
        let (store, notes) = (MemoryStore::new(), MemoryScheduler::new());
        let shared = tracker(&clock, &store, &notes).into_shared();

        let handles: Vec<_> = ["Code", "Swim"]
            .into_iter()
            .map(|name| {
                let shared = Arc::clone(&shared);
                std::thread::spawn(move || {
                    let mut t = shared.lock().unwrap();
                    let id = match t.add_category(name, CategoryKind::Work).unwrap() {
                        Event::CategoryAdded { id, .. } => id,
                        other => panic!("unexpected {other:?}"),
                    };
                    t.start_timer(id).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let t = shared.lock().unwrap();
        assert_eq!(t.categories().len(), 2);
        assert_eq!(t.categories().iter().filter(|c| c.is_running()).count(), 1);
        let saved = TrackerData::from_json(&store.document().unwrap()).unwrap();
        assert_eq!(saved.work_categories.len(), 2);
    }
}
