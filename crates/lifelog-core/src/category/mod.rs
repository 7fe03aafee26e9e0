//! Category timers.
//!
//! A [`Category`] is a work or sports bucket carrying today/week/total
//! accumulators. The [`CategoryBook`] owns every category and enforces the
//! single-active-timer policy: starting one timer stops whichever other timer
//! was running, regardless of kind.

mod engine;

pub use engine::{CategoryBook, StartOutcome, ToggleOutcome};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::calendar::{day_key, week_key, DayKey, WeekKey, Zone};
use crate::ids::CategoryId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Work,
    Sports,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Work => "work",
            CategoryKind::Sports => "sports",
        }
    }
}

impl std::fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CategoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "work" => Ok(CategoryKind::Work),
            "sports" | "sport" => Ok(CategoryKind::Sports),
            other => Err(format!("unknown category kind: {other}")),
        }
    }
}

/// Today/week/total minutes as seen at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CategoryTimes {
    pub today: f64,
    pub week: f64,
    pub total: f64,
}

impl std::ops::AddAssign for CategoryTimes {
    fn add_assign(&mut self, rhs: Self) {
        self.today += rhs.today;
        self.week += rhs.week;
        self.total += rhs.total;
    }
}

/// One trackable activity bucket.
///
/// The running flag is represented by `started_at` alone, so a running
/// category always knows when it started. It is never written to disk: a
/// reloaded category is always stopped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub kind: CategoryKind,
    pub total_minutes: f64,
    pub today_minutes: f64,
    pub week_minutes: f64,
    pub last_day_key: DayKey,
    pub last_week_key: WeekKey,
    #[serde(skip)]
    started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub daily_minutes: BTreeMap<DayKey, f64>,
}

impl Category {
    pub fn new(name: impl Into<String>, kind: CategoryKind, now: DateTime<Utc>, zone: Zone) -> Self {
        Self {
            id: CategoryId::new(),
            name: name.into(),
            kind,
            total_minutes: 0.0,
            today_minutes: 0.0,
            week_minutes: 0.0,
            last_day_key: day_key(now, zone),
            last_week_key: week_key(now, zone),
            started_at: None,
            daily_minutes: BTreeMap::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Minutes elapsed in the in-flight segment, zero when stopped.
    ///
    /// A start time in the future (clock skew) reads as zero.
    pub fn live_minutes(&self, now: DateTime<Utc>) -> f64 {
        match self.started_at {
            Some(started) => elapsed_minutes(started, now),
            None => 0.0,
        }
    }

    /// Zero today/week accumulators whose bucket is no longer current.
    ///
    /// Keys only move forward; an instant before the stored buckets changes
    /// nothing.
    pub fn roll_over(&mut self, now: DateTime<Utc>, zone: Zone) {
        let week = week_key(now, zone);
        if week > self.last_week_key {
            self.week_minutes = 0.0;
            self.last_week_key = week;
        }
        let day = day_key(now, zone);
        if day > self.last_day_key {
            self.today_minutes = 0.0;
            self.last_day_key = day;
        }
    }

    /// Start the timer. Returns `false` if it was already running.
    pub fn start(&mut self, now: DateTime<Utc>, zone: Zone) -> bool {
        if self.is_running() {
            return false;
        }
        self.roll_over(now, zone);
        self.started_at = Some(now);
        true
    }

    /// Stop the timer and fold the elapsed segment into every accumulator.
    ///
    /// Returns the minutes applied, or `None` if the timer was not running.
    pub fn stop(&mut self, now: DateTime<Utc>, zone: Zone) -> Option<f64> {
        let started = self.started_at.take()?;
        if now < started {
            warn!(
                category = %self.id,
                %started,
                %now,
                "stop time precedes start time, applying zero elapsed"
            );
            return Some(0.0);
        }
        let elapsed = elapsed_minutes(started, now);
        self.roll_over(now, zone);
        self.today_minutes += elapsed;
        self.week_minutes += elapsed;
        self.total_minutes += elapsed;
        *self.daily_minutes.entry(day_key(now, zone)).or_insert(0.0) += elapsed;
        Some(elapsed)
    }

    /// Read-only view of the accumulators at `now`.
    ///
    /// Includes the live segment of a running timer and reads a stale
    /// day/week bucket as zero. Stored totals are never touched, so any number
    /// of reads followed by one `stop` counts the segment exactly once.
    pub fn current_time(&self, now: DateTime<Utc>, zone: Zone) -> CategoryTimes {
        let live = self.live_minutes(now);
        let today = if self.last_day_key == day_key(now, zone) {
            self.today_minutes
        } else {
            0.0
        };
        let week = if self.last_week_key == week_key(now, zone) {
            self.week_minutes
        } else {
            0.0
        };
        CategoryTimes {
            today: today + live,
            week: week + live,
            total: self.total_minutes + live,
        }
    }

    /// Minutes per day for the seven days ending today, oldest first.
    pub fn weekly_series(&self, now: DateTime<Utc>, zone: Zone) -> [f64; 7] {
        let today = day_key(now, zone);
        let mut series = [0.0; 7];
        for (slot, value) in series.iter_mut().enumerate() {
            let day = today.days_before(6 - slot as i64);
            *value = self.daily_minutes.get(&day).copied().unwrap_or(0.0);
        }
        series[6] += self.live_minutes(now);
        series
    }

    /// Mark the timer as running since `started_at` without touching totals.
    pub(crate) fn resume_from(&mut self, started_at: DateTime<Utc>) {
        self.started_at = Some(started_at);
    }
}

fn elapsed_minutes(started: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let ms = (now - started).num_milliseconds();
    (ms.max(0) as f64) / 60_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn stop_applies_elapsed_everywhere() {
        let zone = Zone::utc();
        let t0 = at("2024-01-03T09:00:00Z");
        let mut cat = Category::new("Deep work", CategoryKind::Work, t0, zone);
        assert!(cat.start(t0, zone));
        let elapsed = cat.stop(t0 + Duration::seconds(90), zone).unwrap();
        assert_eq!(elapsed, 1.5);
        assert_eq!(cat.today_minutes, 1.5);
        assert_eq!(cat.week_minutes, 1.5);
        assert_eq!(cat.total_minutes, 1.5);
        assert_eq!(cat.daily_minutes.get(&day_key(t0, zone)), Some(&1.5));
        assert!(!cat.is_running());
    }

    #[test]
    fn stop_when_stopped_is_none() {
        let zone = Zone::utc();
        let t0 = at("2024-01-03T09:00:00Z");
        let mut cat = Category::new("Run", CategoryKind::Sports, t0, zone);
        assert!(cat.stop(t0, zone).is_none());
        assert_eq!(cat.total_minutes, 0.0);
    }

    #[test]
    fn start_twice_is_rejected() {
        let zone = Zone::utc();
        let t0 = at("2024-01-03T09:00:00Z");
        let mut cat = Category::new("Run", CategoryKind::Sports, t0, zone);
        assert!(cat.start(t0, zone));
        assert!(!cat.start(t0 + Duration::minutes(5), zone));
        assert_eq!(cat.started_at(), Some(t0));
    }

    #[test]
    fn clock_skew_applies_zero() {
        let zone = Zone::utc();
        let t0 = at("2024-01-03T09:00:00Z");
        let mut cat = Category::new("Deep work", CategoryKind::Work, t0, zone);
        cat.start(t0, zone);
        assert_eq!(cat.current_time(t0 - Duration::minutes(3), zone).total, 0.0);
        assert_eq!(cat.stop(t0 - Duration::minutes(3), zone), Some(0.0));
        assert_eq!(cat.total_minutes, 0.0);
        assert!(cat.today_minutes >= 0.0);
    }

    #[test]
    fn skewed_stop_across_midnight_keeps_today() {
        let zone = Zone::utc();
        let t0 = at("2024-01-02T08:00:00Z");
        let mut cat = Category::new("Deep work", CategoryKind::Work, t0, zone);
        cat.start(t0, zone);
        cat.stop(t0 + Duration::minutes(40), zone);

        let restart = at("2024-01-02T00:55:00Z");
        cat.resume_from(restart);
        assert_eq!(cat.stop(at("2024-01-01T23:55:00Z"), zone), Some(0.0));

        assert_eq!(cat.today_minutes, 40.0);
        assert_eq!(cat.last_day_key.to_string(), "2024-01-02");
        assert!(!cat.daily_minutes.contains_key(&"2024-01-01".parse().unwrap()));
        let times = cat.current_time(at("2024-01-02T12:00:00Z"), zone);
        assert_eq!(times.today, 40.0);
        assert_eq!(times.total, 40.0);
    }

    #[test]
    fn roll_over_never_moves_back() {
        let zone = Zone::utc();
        let t0 = at("2024-01-08T10:00:00Z");
        let mut cat = Category::new("Run", CategoryKind::Sports, t0, zone);
        cat.today_minutes = 15.0;
        cat.week_minutes = 30.0;
        cat.roll_over(at("2024-01-07T10:00:00Z"), zone);
        assert_eq!(cat.today_minutes, 15.0);
        assert_eq!(cat.week_minutes, 30.0);
        assert_eq!(cat.last_day_key.to_string(), "2024-01-08");
    }

    #[test]
    fn stale_day_reads_as_zero_without_mutation() {
        let zone = Zone::utc();
        let t0 = at("2024-01-01T10:00:00Z");
        let mut cat = Category::new("Deep work", CategoryKind::Work, t0, zone);
        cat.today_minutes = 50.0;
        cat.week_minutes = 80.0;
        cat.total_minutes = 200.0;

        let next_day = at("2024-01-02T10:00:00Z");
        let times = cat.current_time(next_day, zone);
        assert_eq!(times.today, 0.0);
        assert_eq!(times.week, 80.0);
        assert_eq!(times.total, 200.0);
        assert_eq!(cat.today_minutes, 50.0);
    }

    #[test]
    fn weekly_series_is_oldest_first_with_live_segment() {
        let zone = Zone::utc();
        let now = at("2024-01-10T12:00:00Z");
        let mut cat = Category::new("Deep work", CategoryKind::Work, now, zone);
        cat.daily_minutes
            .insert("2024-01-04".parse().unwrap(), 10.0);
        cat.daily_minutes
            .insert("2024-01-03".parse().unwrap(), 99.0);
        cat.daily_minutes
            .insert("2024-01-09".parse().unwrap(), 20.0);
        cat.start(now - Duration::minutes(30), zone);

        let series = cat.weekly_series(now, zone);
        assert_eq!(series, [10.0, 0.0, 0.0, 0.0, 0.0, 20.0, 30.0]);
    }
}
