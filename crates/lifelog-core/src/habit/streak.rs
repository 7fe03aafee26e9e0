//! Streak and completion-rate derivation from a habit's day entries.
//!
//! Entries map a local calendar day to whether the habit was completed.
//! A missing day and an incomplete day both break a run.

use std::collections::BTreeMap;

use crate::calendar::DayKey;

/// Consecutive completed days walking backward from `today`.
///
/// Today itself must be completed for the streak to be non-zero.
pub fn current_streak(entries: &BTreeMap<DayKey, bool>, today: DayKey) -> i32 {
    let mut streak = 0;
    let mut day = today;
    while entries.get(&day).copied().unwrap_or(false) {
        streak += 1;
        day = day.days_before(1);
    }
    streak
}

/// Longest run of consecutive completed days anywhere in the history.
pub fn longest_streak(entries: &BTreeMap<DayKey, bool>) -> i32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<DayKey> = None;
    for (day, _) in entries.iter().filter(|(_, done)| **done) {
        run = match previous {
            Some(prev) if prev.succ() == *day => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(*day);
    }
    longest
}

/// Percentage of days in `since..=today` that were completed.
///
/// `since` is clamped to the first entry when that is earlier.
pub fn completion_rate(entries: &BTreeMap<DayKey, bool>, since: DayKey, today: DayKey) -> f64 {
    let start = entries
        .keys()
        .next()
        .map_or(since, |first| (*first).min(since));
    let tracked_days = (today.date() - start.date()).num_days() + 1;
    if tracked_days <= 0 {
        return 0.0;
    }
    let completed = entries
        .range(start..=today)
        .filter(|(_, done)| **done)
        .count();
    (completed as f64 / tracked_days as f64 * 100.0).min(100.0)
}
