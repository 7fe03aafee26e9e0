//! Calendar bucketing keys.
//!
//! Every accumulator in the tracker is bucketed by a [`DayKey`] or a
//! [`WeekKey`]. Both are pure functions of a UTC timestamp and a [`Zone`]:
//! two instants on the same local calendar day always map to the same day key,
//! and distinct days never collide. Week keys follow ISO-8601 (weeks start on
//! Monday, the week-year may differ from the calendar year around New Year).

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime,
    Offset, TimeZone, Timelike, Utc,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The time zone used to derive local calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Zone {
    /// The host's local time zone, DST rules included.
    #[default]
    Local,
    /// A fixed offset from UTC.
    Fixed(FixedOffset),
}

impl Zone {
    pub fn utc() -> Self {
        Zone::Fixed(Utc.fix())
    }

    /// Fixed zone from an offset in minutes east of UTC.
    ///
    /// Returns `None` when the offset is out of range (beyond ±24h).
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(Zone::Fixed)
    }

    /// Wall-clock reading of `at` in this zone.
    pub fn local(&self, at: DateTime<Utc>) -> NaiveDateTime {
        match self {
            Zone::Local => at.with_timezone(&Local).naive_local(),
            Zone::Fixed(offset) => at.with_timezone(offset).naive_local(),
        }
    }

    pub fn date(&self, at: DateTime<Utc>) -> NaiveDate {
        self.local(at).date()
    }

    /// Resolve a local wall-clock time back to an instant.
    ///
    /// Ambiguous local times (DST fall-back) resolve to the earlier instant.
    /// Non-existent ones (DST spring-forward gap) move forward past the gap,
    /// so 02:30 on a night that skips 02:00-03:00 becomes 03:30.
    pub fn resolve(&self, local: NaiveDateTime) -> DateTime<Utc> {
        match self {
            Zone::Local => resolve_forward(local, |l| {
                Local
                    .from_local_datetime(l)
                    .earliest()
                    .map(|dt| dt.with_timezone(&Utc))
            }),
            Zone::Fixed(offset) => resolve_forward(local, |l| {
                offset
                    .from_local_datetime(l)
                    .earliest()
                    .map(|dt| dt.with_timezone(&Utc))
            }),
        }
    }
}

/// First of `local`, `local + 1h`, ... that `lookup` can place on the timeline.
fn resolve_forward(
    local: NaiveDateTime,
    lookup: impl Fn(&NaiveDateTime) -> Option<DateTime<Utc>>,
) -> DateTime<Utc> {
    (0..=MAX_GAP_HOURS)
        .find_map(|hours| lookup(&(local + Duration::hours(hours))))
        .unwrap_or_else(|| Utc.from_utc_datetime(&local))
}

const MAX_GAP_HOURS: i64 = 3;

/// Calendar-day bucket key, rendered as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayKey(NaiveDate);

impl DayKey {
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// The key `days` calendar days earlier.
    pub fn days_before(&self, days: i64) -> Self {
        Self(self.0 - Duration::days(days))
    }

    pub fn succ(&self) -> Self {
        Self(self.0 + Duration::days(1))
    }
}

impl From<NaiveDate> for DayKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DayKey {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").map(Self)
    }
}

/// ISO-week bucket key, rendered as `YYYY-Www`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct WeekKey {
    year: i32,
    week: u32,
}

impl WeekKey {
    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn week(&self) -> u32 {
        self.week
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-W{:02}", self.year, self.week)
    }
}

impl From<WeekKey> for String {
    fn from(key: WeekKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for WeekKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for WeekKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, week) = s
            .split_once("-W")
            .ok_or_else(|| format!("malformed week key: {s}"))?;
        let year = year
            .parse::<i32>()
            .map_err(|e| format!("malformed week key {s}: {e}"))?;
        let week = week
            .parse::<u32>()
            .map_err(|e| format!("malformed week key {s}: {e}"))?;
        if !(1..=53).contains(&week) {
            return Err(format!("week out of range in {s}"));
        }
        Ok(Self { year, week })
    }
}

/// Day bucket of `at` in `zone`.
pub fn day_key(at: DateTime<Utc>, zone: Zone) -> DayKey {
    DayKey(zone.date(at))
}

/// ISO week bucket of `at` in `zone`.
pub fn week_key(at: DateTime<Utc>, zone: Zone) -> WeekKey {
    let iso = zone.date(at).iso_week();
    WeekKey {
        year: iso.year(),
        week: iso.week(),
    }
}

/// Local time of day as fractional hours (`hour + minute / 60`).
///
/// 23:30 reads as 23.5 and 00:30 as 0.5; there is no wrap-around handling.
pub fn time_of_day_hours(at: DateTime<Utc>, zone: Zone) -> f64 {
    let local = zone.local(at);
    f64::from(local.hour()) + f64::from(local.minute()) / 60.0
}

/// Next instant strictly after `now` whose local time of day is `time`.
pub fn next_occurrence(time: NaiveTime, now: DateTime<Utc>, zone: Zone) -> DateTime<Utc> {
    let today = zone.date(now);
    let candidate = zone.resolve(today.and_time(time));
    if candidate > now {
        candidate
    } else {
        zone.resolve((today + Duration::days(1)).and_time(time))
    }
}

/// Next instant strictly after `now` falling on ISO weekday `weekday`
/// (1 = Monday .. 7 = Sunday) at local `time`.
pub fn next_weekday_occurrence(
    weekday: u8,
    time: NaiveTime,
    now: DateTime<Utc>,
    zone: Zone,
) -> DateTime<Utc> {
    let today = zone.date(now);
    let current = today.weekday().number_from_monday() as i64;
    let ahead = (i64::from(weekday) - current).rem_euclid(7);
    let candidate = zone.resolve((today + Duration::days(ahead)).and_time(time));
    if candidate > now {
        candidate
    } else {
        zone.resolve((today + Duration::days(ahead + 7)).and_time(time))
    }
}
