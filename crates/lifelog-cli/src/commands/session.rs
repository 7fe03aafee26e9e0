//! Per-invocation tracker session.
//!
//! Each CLI call loads the tracker from SQLite, runs one command and exits.
//! Running state is not part of the tracker document, so the CLI keeps the
//! running timer and an in-progress workout in its own kv rows and restores
//! them on the next call.

use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};
use lifelog_core::calendar::next_occurrence;
use lifelog_core::{
    CategoryId, Config, CoreError, MemoryScheduler, SqliteStore, SystemClock, Tracker,
    ValidationError, WorkoutId,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

const LIVE_TIMER_KEY: &str = "live_timer";
const ACTIVE_WORKOUT_KEY: &str = "active_workout";

#[derive(Debug, Serialize, Deserialize)]
struct LiveTimer {
    id: CategoryId,
    started_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActiveWorkoutMarker {
    pub workout_id: WorkoutId,
    pub started_at: DateTime<Utc>,
}

pub struct Session {
    pub tracker: Tracker,
    kv: SqliteStore,
}

impl Session {
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load()?;
        let store = SqliteStore::open()?;
        let kv = SqliteStore::open()?;
        let mut tracker = Tracker::load(
            config.tracker_settings(),
            Box::new(SystemClock),
            Box::new(store),
            Box::new(MemoryScheduler::logging()),
        );

        if let Some(json) = kv.kv_get(LIVE_TIMER_KEY)? {
            match serde_json::from_str::<LiveTimer>(&json) {
                Ok(live) => {
                    if let Err(e) = tracker.restore_running_timer(live.id, live.started_at) {
                        warn!(error = %e, "dropping stale live timer");
                    }
                }
                Err(e) => warn!(error = %e, "ignoring unreadable live timer"),
            }
        }

        Ok(Self { tracker, kv })
    }

    pub fn active_workout(&self) -> Result<Option<ActiveWorkoutMarker>, Box<dyn std::error::Error>> {
        Ok(match self.kv.kv_get(ACTIVE_WORKOUT_KEY)? {
            Some(json) => Some(serde_json::from_str(&json)?),
            None => None,
        })
    }

    pub fn set_active_workout(
        &self,
        marker: Option<&ActiveWorkoutMarker>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match marker {
            Some(marker) => self.kv.kv_set(ACTIVE_WORKOUT_KEY, &serde_json::to_string(marker)?)?,
            None => self.kv.kv_delete(ACTIVE_WORKOUT_KEY)?,
        }
        Ok(())
    }

    /// Remember the running timer for the next invocation.
    pub fn close(self) -> CliResult {
        match self.tracker.running_timer() {
            Some((id, started_at)) => {
                let json = serde_json::to_string(&LiveTimer { id, started_at })?;
                self.kv.kv_set(LIVE_TIMER_KEY, &json)?;
            }
            None => self.kv.kv_delete(LIVE_TIMER_KEY)?,
        }
        debug!("session closed");
        Ok(())
    }
}

/// Find an entity by full id, case-insensitive name or unique id prefix.
pub fn resolve<I: Copy + ToString>(
    kind: &'static str,
    query: &str,
    candidates: impl IntoIterator<Item = (I, String)>,
) -> Result<I, CoreError> {
    let candidates: Vec<(I, String)> = candidates.into_iter().collect();
    let query = query.trim();

    if let Some((id, _)) = candidates
        .iter()
        .find(|(id, name)| id.to_string() == query || name.eq_ignore_ascii_case(query))
    {
        return Ok(*id);
    }

    let prefixed: Vec<I> = candidates
        .iter()
        .filter(|(id, _)| query.len() >= 4 && id.to_string().starts_with(query))
        .map(|(id, _)| *id)
        .collect();
    match prefixed.as_slice() {
        [id] => Ok(*id),
        [] => Err(CoreError::not_found(kind, query)),
        _ => Err(ValidationError::InvalidValue {
            field: kind.to_string(),
            message: format!("'{query}' matches more than one {kind}"),
        }
        .into()),
    }
}

pub fn parse_time(value: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|e| ValidationError::InvalidValue {
        field: "time".into(),
        message: format!("'{value}' is not HH:MM ({e})"),
    })
}

/// Next instant at local `HH:MM`.
pub fn next_time(tracker: &Tracker, value: &str) -> Result<DateTime<Utc>, ValidationError> {
    let time = parse_time(value)?;
    Ok(next_occurrence(time, tracker.now(), tracker.settings().zone))
}

/// Local `YYYY-MM-DD HH:MM` in the tracker's zone.
pub fn parse_local_datetime(
    tracker: &Tracker,
    value: &str,
) -> Result<DateTime<Utc>, ValidationError> {
    let local = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M").map_err(|e| {
        ValidationError::InvalidValue {
            field: "at".into(),
            message: format!("'{value}' is not 'YYYY-MM-DD HH:MM' ({e})"),
        }
    })?;
    Ok(tracker.settings().zone.resolve(local))
}

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `90.5` minutes as `1h 30m`.
pub fn fmt_minutes(minutes: f64) -> String {
    let total = minutes.max(0.0).round() as u64;
    if total >= 60 {
        format!("{}h {:02}m", total / 60, total % 60)
    } else {
        format!("{total}m")
    }
}

pub fn fmt_secs(secs: u64) -> String {
    fmt_minutes(secs as f64 / 60.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifelog_core::HabitId;

    #[test]
    fn resolve_by_name_id_and_prefix() {
        let a = HabitId::new();
        let b = HabitId::new();
        let candidates = || vec![(a, "Read".to_string()), (b, "Run".to_string())];
        assert_eq!(resolve("habit", "read", candidates()).unwrap(), a);
        assert_eq!(resolve("habit", &b.to_string(), candidates()).unwrap(), b);
        assert_eq!(resolve("habit", &a.to_string()[..8], candidates()).unwrap(), a);
        assert!(resolve("habit", "swim", candidates()).unwrap_err().is_not_found());
    }

    #[test]
    fn minutes_format() {
        assert_eq!(fmt_minutes(5.4), "5m");
        assert_eq!(fmt_minutes(90.5), "1h 31m");
        assert_eq!(fmt_minutes(-3.0), "0m");
        assert_eq!(fmt_secs(3600), "1h 00m");
    }

    #[test]
    fn time_parsing() {
        assert_eq!(parse_time("07:15").unwrap(), NaiveTime::from_hms_opt(7, 15, 0).unwrap());
        assert!(parse_time("7pm").is_err());
    }
}
