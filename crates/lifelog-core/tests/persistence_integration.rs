//! Tracker state round-trips through an on-disk SQLite store.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use lifelog_core::{
    CategoryKind, Event, HabitKind, ManualClock, NoopScheduler, PersistenceStore, SqliteStore,
    Tracker, TrackerSettings, Zone,
};
use std::path::Path;

fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn open(path: &Path, clock: &ManualClock) -> Tracker {
    let settings = TrackerSettings {
        zone: Zone::utc(),
        ..TrackerSettings::default()
    };
    Tracker::load(
        settings,
        Box::new(clock.clone()),
        Box::new(SqliteStore::open_at(path).unwrap()),
        Box::new(NoopScheduler),
    )
}

#[test]
fn tracker_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lifelog.db");
    let clock = ManualClock::new(at("2024-03-04T08:00:00Z"));

    let (category, habit, workout) = {
        let mut tracker = open(&path, &clock);
        let category = match tracker.add_category("Reading", CategoryKind::Work).unwrap() {
            Event::CategoryAdded { id, .. } => id,
            other => panic!("unexpected event {other:?}"),
        };
        tracker.start_timer(category).unwrap();
        clock.advance(Duration::minutes(90));
        tracker.stop_timer(category).unwrap();

        let habit = match tracker.add_habit("Floss", "", HabitKind::Good).unwrap() {
            Event::HabitAdded { id, .. } => id,
            other => panic!("unexpected event {other:?}"),
        };
        tracker.toggle_habit(habit, None).unwrap();
        tracker
            .set_habit_reminder(habit, true, NaiveTime::from_hms_opt(21, 30, 0))
            .unwrap();

        let workout = match tracker.add_workout("Push").unwrap() {
            Event::WorkoutAdded { id, .. } => id,
            other => panic!("unexpected event {other:?}"),
        };
        let active = tracker.start_workout(workout).unwrap();
        clock.advance(Duration::minutes(40));
        tracker.finish_workout(active).unwrap();
        tracker.set_gym_days(&[1, 3, 5]).unwrap();

        tracker.go_to_sleep(None).unwrap();
        (category, habit, workout)
    };

    let tracker = open(&path, &clock);
    let times = tracker.category_time(category).unwrap();
    assert!((times.total - 90.0).abs() < 1e-9);

    let floss = tracker.habits().get(habit).unwrap();
    assert_eq!(floss.current_streak, 1);
    assert!(floss.reminder_enabled);
    assert_eq!(floss.reminder_time, NaiveTime::from_hms_opt(21, 30, 0));

    let push = tracker.workouts().get(workout).unwrap();
    assert_eq!(push.completed_sessions.len(), 1);
    assert_eq!(push.completed_sessions[0].duration_secs, 2400);
    assert_eq!(tracker.workouts().gym_days().collect::<Vec<_>>(), vec![1, 3, 5]);

    assert!(tracker.sleep().is_sleeping());
}

#[test]
fn empty_database_loads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open_at(&dir.path().join("fresh.db")).unwrap();
    assert_eq!(store.load().unwrap(), None);
}

#[test]
fn document_written_by_one_handle_is_read_by_another() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");
    let writer = SqliteStore::open_at(&path).unwrap();
    writer.save(r#"{"gym_days":[2]}"#).unwrap();

    let reader = SqliteStore::open_at(&path).unwrap();
    assert_eq!(reader.load().unwrap().as_deref(), Some(r#"{"gym_days":[2]}"#));
}
