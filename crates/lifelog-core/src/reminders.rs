//! Builders for the reminders the tracker schedules.
//!
//! All fire times use next-occurrence semantics in the tracker's zone.

use chrono::{DateTime, Duration, NaiveTime, Timelike, Utc};

use crate::calendar::{next_occurrence, next_weekday_occurrence, Zone};
use crate::habit::Habit;
use crate::notify::{Notification, Repeat};

pub const SLEEP_ALARM_ID: &str = "sleep-alarm";
pub const INACTIVITY_NUDGE_ID: &str = "inactivity-nudge";

pub fn gym_reminder_id(weekday: u8) -> String {
    format!("gym-day-{weekday}")
}

pub fn habit_reminder_id(habit: &Habit) -> String {
    format!("habit-{}", habit.id)
}

/// All gym reminder ids, whether scheduled or not.
pub fn all_gym_reminder_ids() -> Vec<String> {
    (1..=7).map(gym_reminder_id).collect()
}

/// One-shot alarm. An alarm time already in the past is moved to its next
/// occurrence (the same time of day, tomorrow).
pub fn sleep_alarm(alarm_at: DateTime<Utc>, now: DateTime<Utc>, zone: Zone) -> Notification {
    let fire_at = if alarm_at > now {
        alarm_at
    } else {
        let local = zone.local(alarm_at);
        let time = NaiveTime::from_hms_opt(local.hour(), local.minute(), 0).unwrap_or(local.time());
        next_occurrence(time, now, zone)
    };
    Notification {
        id: SLEEP_ALARM_ID.to_string(),
        fire_at,
        title: "Wake up".to_string(),
        body: "Good morning! Time to get up.".to_string(),
        repeat: Repeat::Once,
    }
}

/// Nudge fired after `interval_minutes` without a running work timer.
pub fn inactivity_nudge(now: DateTime<Utc>, interval_minutes: u32) -> Notification {
    Notification {
        id: INACTIVITY_NUDGE_ID.to_string(),
        fire_at: now + Duration::minutes(i64::from(interval_minutes)),
        title: "Still there?".to_string(),
        body: "No work timer is running. Start one to keep tracking.".to_string(),
        repeat: Repeat::Every {
            minutes: interval_minutes,
        },
    }
}

/// Weekly reminders, one per gym day, at `time`.
pub fn gym_reminders(
    days: impl IntoIterator<Item = u8>,
    time: NaiveTime,
    now: DateTime<Utc>,
    zone: Zone,
) -> Vec<Notification> {
    days.into_iter()
        .map(|day| Notification {
            id: gym_reminder_id(day),
            fire_at: next_weekday_occurrence(day, time, now, zone),
            title: "Gym day".to_string(),
            body: "Today is a training day.".to_string(),
            repeat: Repeat::Weekly,
        })
        .collect()
}

/// Daily habit reminder, or `None` when the habit has no enabled reminder.
pub fn habit_reminder(habit: &Habit, now: DateTime<Utc>, zone: Zone) -> Option<Notification> {
    if !habit.reminder_enabled {
        return None;
    }
    let time = habit.reminder_time?;
    Some(Notification {
        id: habit_reminder_id(habit),
        fire_at: next_occurrence(time, now, zone),
        title: habit.name.clone(),
        body: format!("Don't forget: {}", habit.name),
        repeat: Repeat::Daily,
    })
}
