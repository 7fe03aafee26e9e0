//! End-to-end behaviour of the tracker service.
//!
//! Every test drives a `Tracker` through a `ManualClock`, an in-memory store
//! and an in-memory scheduler, so timing is exact and collaborators can be
//! inspected afterwards.

use chrono::{DateTime, Duration, Utc};
use lifelog_core::reminders::{gym_reminder_id, INACTIVITY_NUDGE_ID, SLEEP_ALARM_ID};
use lifelog_core::{
    CategoryId, CategoryKind, Event, HabitId, HabitKind, ManualClock, MemoryScheduler,
    MemoryStore, Tracker, TrackerData, TrackerSettings, Zone,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

struct Harness {
    clock: ManualClock,
    store: MemoryStore,
    notes: MemoryScheduler,
    tracker: Tracker,
}

impl Harness {
    fn new(start: &str) -> Self {
        Self::with_scheduler(start, MemoryScheduler::new())
    }

    fn with_scheduler(start: &str, notes: MemoryScheduler) -> Self {
        let clock = ManualClock::new(at(start));
        let store = MemoryStore::new();
        let tracker = Tracker::load(
            settings(),
            Box::new(clock.clone()),
            Box::new(store.clone()),
            Box::new(notes.clone()),
        );
        Self {
            clock,
            store,
            notes,
            tracker,
        }
    }

    /// A fresh tracker over the same store, as after a process restart.
    fn reload(&self) -> Tracker {
        Tracker::load(
            settings(),
            Box::new(self.clock.clone()),
            Box::new(self.store.clone()),
            Box::new(self.notes.clone()),
        )
    }

    fn category(&mut self, name: &str, kind: CategoryKind) -> CategoryId {
        match self.tracker.add_category(name, kind).unwrap() {
            Event::CategoryAdded { id, .. } => id,
            other => panic!("unexpected event {other:?}"),
        }
    }

    fn habit(&mut self, name: &str) -> HabitId {
        match self.tracker.add_habit(name, "", HabitKind::Good).unwrap() {
            Event::HabitAdded { id, .. } => id,
            other => panic!("unexpected event {other:?}"),
        }
    }

    fn advance_minutes(&self, minutes: i64) {
        self.clock.advance(Duration::minutes(minutes));
    }
}

fn settings() -> TrackerSettings {
    TrackerSettings {
        zone: Zone::utc(),
        sleep_retention: 3,
        ..TrackerSettings::default()
    }
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ============================================================================
// Category timers
// ============================================================================

#[test]
fn reads_while_running_do_not_double_count() {
    let mut h = Harness::new("2024-01-01T09:00:00Z");
    let id = h.category("Writing", CategoryKind::Work);
    h.tracker.start_timer(id).unwrap();

    for _ in 0..5 {
        h.advance_minutes(6);
        let live = h.tracker.category_time(id).unwrap();
        assert!(live.total > 0.0);
    }
    h.tracker.stop_timer(id).unwrap();

    let times = h.tracker.category_time(id).unwrap();
    assert!(approx(times.total, 30.0));
    assert!(approx(times.today, 30.0));
    assert!(approx(times.week, 30.0));
}

#[test]
fn starting_b_stops_a_at_that_instant() {
    let mut h = Harness::new("2024-01-01T09:00:00Z");
    let a = h.category("Code", CategoryKind::Work);
    let b = h.category("Run", CategoryKind::Sports);

    h.tracker.start_timer(a).unwrap();
    h.advance_minutes(25);
    h.tracker.start_timer(b).unwrap();
    h.advance_minutes(40);

    let running: Vec<_> = h.tracker.categories().iter().filter(|c| c.is_running()).collect();
    assert_eq!(running.len(), 1);
    assert_eq!(running[0].id, b);
    assert!(approx(h.tracker.category_time(a).unwrap().total, 25.0));
    assert!(approx(h.tracker.category_time(b).unwrap().total, 40.0));
}

#[test]
fn day_boundary_resets_today_but_not_week() {
    // 2024-01-01 is a Monday; Jan 2 falls in the same ISO week.
    let mut h = Harness::new("2024-01-01T10:00:00Z");
    let id = h.category("Study", CategoryKind::Work);
    h.tracker.start_timer(id).unwrap();
    h.advance_minutes(50);
    h.tracker.stop_timer(id).unwrap();

    h.clock.set(at("2024-01-02T09:00:00Z"));
    h.tracker.start_timer(id).unwrap();
    h.advance_minutes(10);
    h.tracker.stop_timer(id).unwrap();

    let c = h.tracker.categories().get(id).unwrap();
    assert!(approx(c.today_minutes, 10.0));
    assert!(approx(c.week_minutes, 60.0));
    assert!(approx(c.total_minutes, 60.0));
    assert_eq!(c.last_day_key.to_string(), "2024-01-02");
}

#[test]
fn stale_day_reads_as_zero_without_a_start() {
    let mut h = Harness::new("2024-01-01T10:00:00Z");
    let id = h.category("Study", CategoryKind::Work);
    h.tracker.start_timer(id).unwrap();
    h.advance_minutes(50);
    h.tracker.stop_timer(id).unwrap();

    h.clock.set(at("2024-01-09T09:00:00Z"));
    let times = h.tracker.category_time(id).unwrap();
    assert_eq!(times.today, 0.0);
    assert_eq!(times.week, 0.0);
    assert!(approx(times.total, 50.0));
    // The read did not touch stored values.
    assert!(approx(h.tracker.categories().get(id).unwrap().today_minutes, 50.0));
}

#[test]
fn clock_skew_adds_zero() {
    let mut h = Harness::new("2024-01-01T10:00:00Z");
    let id = h.category("Code", CategoryKind::Work);
    h.tracker.start_timer(id).unwrap();
    h.clock.set(at("2024-01-01T09:00:00Z"));
    match h.tracker.stop_timer(id).unwrap() {
        Event::TimerStopped { elapsed_minutes, .. } => assert_eq!(elapsed_minutes, 0.0),
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(h.tracker.category_time(id).unwrap().total, 0.0);
}

#[test]
fn deleting_a_running_category_flushes_its_segment() {
    let mut h = Harness::new("2024-01-01T10:00:00Z");
    let id = h.category("Code", CategoryKind::Work);
    h.tracker.start_timer(id).unwrap();
    h.advance_minutes(20);
    h.tracker.stop_timer(id).unwrap();
    h.tracker.start_timer(id).unwrap();
    h.advance_minutes(15);

    let before = h.tracker.category_time(id).unwrap().total;
    let stored = h.tracker.categories().get(id).unwrap().total_minutes;
    match h.tracker.delete_category(id).unwrap() {
        Event::CategoryDeleted { flushed_minutes, .. } => {
            assert!(approx(flushed_minutes, 15.0));
            assert!(approx(stored + flushed_minutes, before));
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert!(h.tracker.categories().get(id).is_none());
    assert!(h.tracker.categories().running().is_none());
}

#[test]
fn wrong_state_and_unknown_ids_leave_state_untouched() {
    let mut h = Harness::new("2024-01-01T10:00:00Z");
    let id = h.category("Code", CategoryKind::Work);
    let before = h.store.document();

    assert!(h.tracker.stop_timer(id).unwrap_err().is_invalid_state());
    assert!(h.tracker.start_timer(CategoryId::new()).unwrap_err().is_not_found());
    assert!(h.tracker.wake_up().unwrap_err().is_invalid_state());
    assert_eq!(h.store.document(), before);
}

#[test]
fn running_timer_is_not_persisted_and_can_be_restored() {
    let mut h = Harness::new("2024-01-01T10:00:00Z");
    let id = h.category("Code", CategoryKind::Work);
    h.tracker.start_timer(id).unwrap();
    let (running, started_at) = h.tracker.running_timer().unwrap();
    assert_eq!(running, id);

    h.advance_minutes(30);
    let mut reloaded = h.reload();
    assert!(reloaded.categories().running().is_none());
    assert_eq!(reloaded.category_time(id).unwrap().total, 0.0);

    reloaded.restore_running_timer(id, started_at).unwrap();
    reloaded.stop_timer(id).unwrap();
    assert!(approx(reloaded.category_time(id).unwrap().total, 30.0));
}

// ============================================================================
// Sleep
// ============================================================================

#[test]
fn eight_hour_night_is_one_session() {
    let mut h = Harness::new("2024-01-01T23:00:00Z");
    h.tracker.go_to_sleep(None).unwrap();
    h.clock.advance(Duration::hours(8));
    match h.tracker.wake_up().unwrap() {
        Event::WokeUp { duration_hours, session_id, .. } => {
            assert_eq!(duration_hours, 8.0);
            assert!(session_id.is_some());
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(h.tracker.sleep().session_count(), 1);
    assert_eq!(h.tracker.sleep().statistics().avg_duration_hours, 8.0);
}

#[test]
fn session_history_is_capped() {
    let mut h = Harness::new("2024-01-01T23:00:00Z");
    for night in 0..5 {
        h.clock.set(at("2024-01-01T23:00:00Z") + Duration::days(night));
        h.tracker.go_to_sleep(None).unwrap();
        h.clock.advance(Duration::hours(7));
        h.tracker.wake_up().unwrap();
        assert!(h.tracker.sleep().session_count() <= 3);
    }
    let first = h.tracker.sleep().sessions().next().unwrap();
    assert_eq!(first.start_time, at("2024-01-03T23:00:00Z"));
}

#[test]
fn alarm_is_scheduled_and_cancelled_on_wake() {
    let mut h = Harness::new("2024-01-01T23:00:00Z");
    h.tracker.go_to_sleep(Some(at("2024-01-02T07:00:00Z"))).unwrap();
    assert_eq!(
        h.notes.get(SLEEP_ALARM_ID).unwrap().fire_at,
        at("2024-01-02T07:00:00Z")
    );
    h.clock.set(at("2024-01-02T06:45:00Z"));
    h.tracker.wake_up().unwrap();
    assert!(h.notes.get(SLEEP_ALARM_ID).is_none());
}

#[test]
fn refused_notifications_never_block_commands() {
    let mut h = Harness::with_scheduler("2024-01-01T23:00:00Z", MemoryScheduler::refusing());
    let event = h.tracker.go_to_sleep(Some(at("2024-01-02T07:00:00Z"))).unwrap();
    assert!(matches!(event, Event::FellAsleep { .. }));
    assert!(h.tracker.sleep().is_sleeping());
    assert!(h.tracker.sleep().state().pending_alarm_id.is_none());

    h.clock.advance(Duration::hours(8));
    h.tracker.wake_up().unwrap();
    assert_eq!(h.tracker.sleep().session_count(), 1);

    h.tracker.set_gym_days(&[2, 5]).unwrap();
    assert_eq!(h.tracker.workouts().gym_days().collect::<Vec<_>>(), vec![2, 5]);
    assert!(h.notes.all().is_empty());
}

// ============================================================================
// Habits
// ============================================================================

#[test]
fn habit_streak_convention() {
    let mut h = Harness::new("2024-01-10T12:00:00Z");
    let id = h.habit("Meditate");
    let today = h.tracker.today();

    for offset in 0..3 {
        h.tracker.toggle_habit(id, Some(today.days_before(offset))).unwrap();
    }
    assert_eq!(h.tracker.habits().get(id).unwrap().current_streak, 3);

    h.tracker.toggle_habit(id, Some(today.days_before(1))).unwrap();
    assert_eq!(h.tracker.habits().get(id).unwrap().current_streak, 1);

    match h.tracker.toggle_habit(id, None).unwrap() {
        Event::HabitToggled { completed, current_streak, .. } => {
            assert!(!completed);
            assert_eq!(current_streak, 0);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn deleting_a_habit_cancels_its_reminder() {
    let mut h = Harness::new("2024-01-10T12:00:00Z");
    let id = h.habit("Stretch");
    h.tracker.set_habit_reminder(id, true, None).unwrap();
    assert_eq!(h.notes.all().len(), 1);
    h.tracker.delete_habit(id).unwrap();
    assert!(h.notes.all().is_empty());
}

// ============================================================================
// Workouts, gym days, contacts
// ============================================================================

#[test]
fn workout_session_is_committed_on_finish() {
    let mut h = Harness::new("2024-01-01T08:00:00Z");
    let squat = match h.tracker.add_exercise("Squat", Some("legs")).unwrap() {
        Event::ExerciseAdded { id, .. } => id,
        other => panic!("unexpected event {other:?}"),
    };
    let legs = match h.tracker.add_workout("Legs").unwrap() {
        Event::WorkoutAdded { id, .. } => id,
        other => panic!("unexpected event {other:?}"),
    };
    h.tracker.add_planned_set(legs, squat, 5, 5, 100.0).unwrap();

    let mut active = h.tracker.start_workout(legs).unwrap();
    let line = active.exercises()[0].id;
    active.adjust_weight(line, 105.0).unwrap();
    h.advance_minutes(50);
    assert!(h.tracker.workouts().get(legs).unwrap().completed_sessions.is_empty());

    h.tracker.finish_workout(active).unwrap();
    let workout = h.tracker.workouts().get(legs).unwrap();
    assert_eq!(workout.completed_sessions.len(), 1);
    assert_eq!(workout.average_duration_secs(), 3000);
    assert_eq!(workout.completed_sessions[0].completed_exercises[0].weight_kg, 105.0);
    assert_eq!(workout.sets[0].weight_kg, 100.0);
}

#[test]
fn gym_days_schedule_weekly_reminders() {
    let mut h = Harness::new("2024-01-01T08:00:00Z");
    h.tracker.set_gym_days(&[1, 4]).unwrap();
    assert_eq!(
        h.notes.get(&gym_reminder_id(1)).unwrap().fire_at,
        at("2024-01-01T18:00:00Z")
    );
    assert!(h.notes.get(&gym_reminder_id(4)).is_some());

    h.tracker.set_gym_days(&[6]).unwrap();
    assert!(h.notes.get(&gym_reminder_id(1)).is_none());
    assert!(h.notes.get(&gym_reminder_id(6)).is_some());
    assert!(h.tracker.set_gym_days(&[0]).is_err());
}

#[test]
fn inactivity_nudge_after_last_work_timer_stops() {
    let mut h = Harness::new("2024-01-01T08:00:00Z");
    let code = h.category("Code", CategoryKind::Work);
    let swim = h.category("Swim", CategoryKind::Sports);
    h.tracker.start_timer(code).unwrap();
    h.advance_minutes(5);
    // Switching to a sports timer stops the last work timer.
    h.tracker.start_timer(swim).unwrap();
    assert!(h.notes.get(INACTIVITY_NUDGE_ID).is_some());
}

#[test]
fn contacts_come_due_and_calls_reset_them() {
    let mut h = Harness::new("2024-01-01T08:00:00Z");
    let id = match h.tracker.add_contact("Mum", 7).unwrap() {
        Event::ContactAdded { id, .. } => id,
        other => panic!("unexpected event {other:?}"),
    };
    h.clock.advance(Duration::days(8));
    assert_eq!(h.tracker.contacts_due().len(), 1);

    let call = match h
        .tracker
        .schedule_call(id, at("2024-01-09T19:00:00Z"), "weekly")
        .unwrap()
    {
        Event::CallScheduled { call_id, .. } => call_id,
        other => panic!("unexpected event {other:?}"),
    };
    h.tracker.complete_call(id, call).unwrap();
    assert!(h.tracker.contacts_due().is_empty());
    assert_eq!(h.tracker.summary().contacts_due, 0);
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn reload_restores_everything_but_running_state() {
    let mut h = Harness::new("2024-01-01T10:00:00Z");
    let code = h.category("Code", CategoryKind::Work);
    let swim = h.category("Swim", CategoryKind::Sports);
    h.tracker.start_timer(code).unwrap();
    h.advance_minutes(45);
    h.tracker.start_timer(swim).unwrap();
    let habit = h.habit("Read");
    h.tracker.toggle_habit(habit, None).unwrap();
    h.tracker.go_to_sleep(None).unwrap();

    let reloaded = h.reload();
    assert_eq!(reloaded.categories().len(), 2);
    assert!(reloaded.categories().iter().all(|c| !c.is_running()));
    assert!(approx(reloaded.category_time(code).unwrap().total, 45.0));
    assert_eq!(reloaded.categories().get(swim).unwrap().kind, CategoryKind::Sports);
    assert_eq!(reloaded.habits().get(habit).unwrap().current_streak, 1);
    assert!(reloaded.sleep().is_sleeping());

    let saved = TrackerData::from_json(&h.store.document().unwrap()).unwrap();
    assert_eq!(saved.work_categories.len(), 1);
    assert_eq!(saved.sports_categories.len(), 1);
}

#[test]
fn corrupt_document_starts_empty() {
    let clock = ManualClock::new(at("2024-01-01T10:00:00Z"));
    let store = MemoryStore::with_document("{ not json");
    let mut tracker = Tracker::load(
        settings(),
        Box::new(clock),
        Box::new(store.clone()),
        Box::new(MemoryScheduler::new()),
    );
    assert!(tracker.categories().is_empty());
    assert_eq!(store.document().as_deref(), Some("{ not json"));

    tracker.add_category("Fresh", CategoryKind::Work).unwrap();
    assert!(TrackerData::from_json(&store.document().unwrap()).is_ok());
}
