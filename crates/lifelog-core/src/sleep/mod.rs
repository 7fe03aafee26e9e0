//! Sleep tracking.
//!
//! Two states, awake and asleep. Going to sleep records the start instant and
//! an optional alarm; waking up turns the interval into a [`SleepSession`]
//! appended to a bounded history (oldest evicted first).
//!
//! ```text
//! Awake --go_to_sleep--> Asleep --wake_up--> Awake
//! ```

mod statistics;

pub use statistics::{
    consistency_score, SleepStatistics, BASELINE_CONSISTENCY, MIN_SESSIONS_FOR_CONSISTENCY,
};

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, warn};

use crate::calendar::{day_key, time_of_day_hours, DayKey, Zone};
use crate::error::{CoreError, Result};
use crate::ids::SleepSessionId;

/// Default number of sessions kept.
pub const DEFAULT_RETENTION: usize = 30;

/// A completed sleep interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepSession {
    pub id: SleepSessionId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl SleepSession {
    pub fn duration_hours(&self) -> f64 {
        (self.end_time - self.start_time).num_seconds() as f64 / 3600.0
    }
}

/// Live sleep/wake toggle.
///
/// `sleep_start_time` is set exactly when `is_sleeping` is true.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SleepState {
    pub is_sleeping: bool,
    pub sleep_start_time: Option<DateTime<Utc>>,
    pub alarm_time: Option<DateTime<Utc>>,
    pub total_sleep_minutes_today: f64,
    pub last_day_key: Option<DayKey>,
    pub pending_alarm_id: Option<String>,
}

/// Persisted form of the sleep engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SleepData {
    pub state: SleepState,
    pub sessions: Vec<SleepSession>,
}

/// What `go_to_sleep` observed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bedtime {
    pub at: DateTime<Utc>,
    /// Local hour is before the configured early-bedtime threshold.
    pub early: bool,
}

/// What `wake_up` produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Wakeup {
    /// `None` when the interval was not positive (clock skew).
    pub session: Option<SleepSession>,
    pub evicted: Option<SleepSession>,
    /// Alarm notification that should now be cancelled.
    pub cancelled_alarm: Option<String>,
}

/// Sleep state machine plus bounded session history.
#[derive(Debug, Clone)]
pub struct SleepLog {
    zone: Zone,
    retention: usize,
    early_bedtime_hour: u32,
    state: SleepState,
    sessions: VecDeque<SleepSession>,
}

impl SleepLog {
    pub fn new(zone: Zone, retention: usize, early_bedtime_hour: u32) -> Self {
        Self::from_data(SleepData::default(), zone, retention, early_bedtime_hour)
    }

    /// Rebuild from persisted data, trimming history to `retention`.
    pub fn from_data(data: SleepData, zone: Zone, retention: usize, early_bedtime_hour: u32) -> Self {
        let retention = retention.max(1);
        let mut state = data.state;
        if state.is_sleeping != state.sleep_start_time.is_some() {
            warn!("inconsistent persisted sleep state, resetting to awake");
            state.is_sleeping = false;
            state.sleep_start_time = None;
            state.alarm_time = None;
        }
        let mut sessions: VecDeque<SleepSession> = data.sessions.into();
        while sessions.len() > retention {
            sessions.pop_front();
        }
        Self {
            zone,
            retention,
            early_bedtime_hour,
            state,
            sessions,
        }
    }

    pub fn to_data(&self) -> SleepData {
        SleepData {
            state: self.state.clone(),
            sessions: self.sessions.iter().cloned().collect(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &SleepState {
        &self.state
    }

    pub fn is_sleeping(&self) -> bool {
        self.state.is_sleeping
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    /// Retained sessions, oldest first.
    pub fn sessions(&self) -> impl Iterator<Item = &SleepSession> {
        self.sessions.iter()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Hours slept so far in the current, unfinished night.
    pub fn current_sleep_hours(&self, now: DateTime<Utc>) -> f64 {
        match self.state.sleep_start_time {
            Some(start) => ((now - start).num_seconds().max(0)) as f64 / 3600.0,
            None => 0.0,
        }
    }

    /// Minutes slept today as seen at `now`; a stale day reads as zero.
    pub fn sleep_minutes_today(&self, now: DateTime<Utc>) -> f64 {
        if self.state.last_day_key == Some(day_key(now, self.zone)) {
            self.state.total_sleep_minutes_today
        } else {
            0.0
        }
    }

    pub fn statistics(&self) -> SleepStatistics {
        let (durations, bedtimes, wakes) = self.series();
        SleepStatistics::from_series(&durations, &bedtimes, &wakes)
    }

    /// Consistency score over the retained sessions.
    pub fn consistency(&self) -> f64 {
        let (durations, bedtimes, wakes) = self.series();
        consistency_score(&durations, &bedtimes, &wakes)
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn go_to_sleep(
        &mut self,
        now: DateTime<Utc>,
        alarm_time: Option<DateTime<Utc>>,
    ) -> Result<Bedtime> {
        if self.state.is_sleeping {
            return Err(CoreError::invalid_state("already asleep"));
        }
        self.state.is_sleeping = true;
        self.state.sleep_start_time = Some(now);
        self.state.alarm_time = alarm_time;
        let early = self.zone.local(now).hour() < self.early_bedtime_hour;
        debug!(%now, ?alarm_time, early, "went to sleep");
        Ok(Bedtime { at: now, early })
    }

    /// Remember which notification carries the alarm so waking can cancel it.
    pub fn set_pending_alarm(&mut self, id: Option<String>) {
        self.state.pending_alarm_id = id;
    }

    pub fn wake_up(&mut self, now: DateTime<Utc>) -> Result<Wakeup> {
        let start = match (self.state.is_sleeping, self.state.sleep_start_time) {
            (true, Some(start)) => start,
            _ => return Err(CoreError::invalid_state("not asleep")),
        };

        let today = day_key(now, self.zone);
        if self.state.last_day_key != Some(today) {
            self.state.total_sleep_minutes_today = 0.0;
            self.state.last_day_key = Some(today);
        }

        let mut evicted = None;
        let session = if now > start {
            let session = SleepSession {
                id: SleepSessionId::new(),
                start_time: start,
                end_time: now,
            };
            self.state.total_sleep_minutes_today += session.duration_hours() * 60.0;
            self.sessions.push_back(session.clone());
            if self.sessions.len() > self.retention {
                evicted = self.sessions.pop_front();
            }
            Some(session)
        } else {
            warn!(%start, %now, "wake time does not follow sleep start, no session recorded");
            None
        };

        self.state.is_sleeping = false;
        self.state.sleep_start_time = None;
        self.state.alarm_time = None;
        let cancelled_alarm = self.state.pending_alarm_id.take();
        debug!(%now, recorded = session.is_some(), "woke up");

        Ok(Wakeup {
            session,
            evicted,
            cancelled_alarm,
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn series(&self) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let durations = self.sessions.iter().map(SleepSession::duration_hours).collect();
        let bedtimes = self
            .sessions
            .iter()
            .map(|s| time_of_day_hours(s.start_time, self.zone))
            .collect();
        let wakes = self
            .sessions
            .iter()
            .map(|s| time_of_day_hours(s.end_time, self.zone))
            .collect();
        (durations, bedtimes, wakes)
    }
}
