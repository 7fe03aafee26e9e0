//! Aggregate sleep statistics.

use serde::{Deserialize, Serialize};

use crate::stats::{mean, std_dev};

/// Score returned while there is too little history to judge consistency.
pub const BASELINE_CONSISTENCY: f64 = 50.0;

/// Minimum number of sessions before consistency is scored.
pub const MIN_SESSIONS_FOR_CONSISTENCY: usize = 3;

/// Standard deviation (hours) of sleep duration at which its penalty is 50.
const DURATION_REFERENCE_HOURS: f64 = 3.0;
/// Standard deviation (hours) of bed/wake time at which its penalty is 25.
const CLOCK_TIME_REFERENCE_HOURS: f64 = 4.0;

const DURATION_WEIGHT: f64 = 50.0;
const CLOCK_TIME_WEIGHT: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SleepStatistics {
    pub session_count: usize,
    pub avg_duration_hours: f64,
    /// Mean local bedtime as `hour + minute / 60`, not unwrapped across midnight.
    pub avg_bedtime_hour: f64,
    pub avg_wake_hour: f64,
    pub bedtime_std_dev_minutes: f64,
    pub wake_std_dev_minutes: f64,
}

impl SleepStatistics {
    /// Statistics over parallel per-session series (all in hours).
    pub fn from_series(durations: &[f64], bedtimes: &[f64], wake_times: &[f64]) -> Self {
        if durations.is_empty() {
            return Self::default();
        }
        Self {
            session_count: durations.len(),
            avg_duration_hours: mean(durations),
            avg_bedtime_hour: mean(bedtimes),
            avg_wake_hour: mean(wake_times),
            bedtime_std_dev_minutes: std_dev(bedtimes) * 60.0,
            wake_std_dev_minutes: std_dev(wake_times) * 60.0,
        }
    }
}

/// 0-100 score rewarding low variance in duration, bedtime and wake time.
///
/// Each series is in hours. Duration variance is judged against a 3 hour
/// reference, bed and wake times against 4 hours; each component is floored
/// at zero and the result is their plain mean.
pub fn consistency_score(durations: &[f64], bedtimes: &[f64], wake_times: &[f64]) -> f64 {
    if durations.len() < MIN_SESSIONS_FOR_CONSISTENCY {
        return BASELINE_CONSISTENCY;
    }
    let duration_score =
        (100.0 - std_dev(durations) / DURATION_REFERENCE_HOURS * DURATION_WEIGHT).max(0.0);
    let bedtime_score =
        (100.0 - std_dev(bedtimes) / CLOCK_TIME_REFERENCE_HOURS * CLOCK_TIME_WEIGHT).max(0.0);
    let wake_score =
        (100.0 - std_dev(wake_times) / CLOCK_TIME_REFERENCE_HOURS * CLOCK_TIME_WEIGHT).max(0.0);
    ((duration_score + bedtime_score + wake_score) / 3.0).clamp(0.0, 100.0)
}
