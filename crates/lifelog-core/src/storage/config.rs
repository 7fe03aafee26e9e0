//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Sleep history retention and the early-bedtime threshold
//! - Reminder switches and times
//! - The calendar zone used for day and week keys
//!
//! Configuration is stored at `~/.config/lifelog/config.toml`.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::calendar::Zone;
use crate::error::{ConfigError, Result};
use crate::sleep::DEFAULT_RETENTION;
use crate::tracker::TrackerSettings;

/// Sleep configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepConfig {
    #[serde(default = "default_session_retention")]
    pub session_retention: usize,
    /// Going to bed before this local hour counts as an early bedtime.
    #[serde(default = "default_early_bedtime_hour")]
    pub early_bedtime_hour: u32,
}

/// Reminder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemindersConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_inactivity_nudge_minutes")]
    pub inactivity_nudge_minutes: u32,
    #[serde(default = "default_gym_reminder_hour")]
    pub gym_reminder_hour: u32,
    /// "HH:MM", used when a habit reminder is enabled without a time.
    #[serde(default = "default_habit_reminder")]
    pub habit_reminder_default: String,
}

/// Calendar configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Fixed offset from UTC in minutes. Unset means the system local zone.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/lifelog/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sleep: SleepConfig,
    #[serde(default)]
    pub reminders: RemindersConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
}

fn default_session_retention() -> usize {
    DEFAULT_RETENTION
}
fn default_early_bedtime_hour() -> u32 {
    22
}
fn default_true() -> bool {
    true
}
fn default_inactivity_nudge_minutes() -> u32 {
    60
}
fn default_gym_reminder_hour() -> u32 {
    18
}
fn default_habit_reminder() -> String {
    "20:00".into()
}

impl Default for SleepConfig {
    fn default() -> Self {
        Self {
            session_retention: default_session_retention(),
            early_bedtime_hour: default_early_bedtime_hour(),
        }
    }
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            inactivity_nudge_minutes: default_inactivity_nudge_minutes(),
            gym_reminder_hour: default_gym_reminder_hour(),
            habit_reminder_default: default_habit_reminder(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
        optional: bool,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let clears = value.eq_ignore_ascii_case("none") || value.is_empty();
                let new_value = match existing {
                    _ if optional && clears => serde_json::Value::Null,
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => parse_number(value).ok_or_else(|| {
                        invalid(format!("cannot parse '{value}' as number"))
                    })?,
                    // Unset optional fields only hold numbers.
                    serde_json::Value::Null => parse_number(value).ok_or_else(|| {
                        invalid(format!("cannot parse '{value}' as number"))
                    })?,
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Like [`Config::load`] but at an explicit path. A missing file is
    /// created with defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(err) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: err.to_string(),
            }
            .into()),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving. The whole config is
    /// revalidated; on error `self` is unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is invalid.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        let optional = Self::is_optional(key);
        Self::set_json_value_by_path(&mut json, key, value, optional)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save. Returns error if key is unknown.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.apply(key, value)?;
        self.save()
    }

    /// Every leaf key with its current value, in schema order.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            flatten("", &json, &mut out);
        }
        out
    }

    /// Keys whose default is unset accept "none" to clear them again.
    fn is_optional(key: &str) -> bool {
        serde_json::to_value(Config::default())
            .ok()
            .as_ref()
            .and_then(|json| Self::get_json_value_by_path(json, key))
            .is_some_and(serde_json::Value::is_null)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sleep.session_retention == 0 {
            return Err(ConfigError::InvalidValue {
                key: "sleep.session_retention".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.sleep.early_bedtime_hour > 23 {
            return Err(ConfigError::InvalidValue {
                key: "sleep.early_bedtime_hour".into(),
                message: "must be an hour between 0 and 23".into(),
            });
        }
        if self.reminders.gym_reminder_hour > 23 {
            return Err(ConfigError::InvalidValue {
                key: "reminders.gym_reminder_hour".into(),
                message: "must be an hour between 0 and 23".into(),
            });
        }
        if self.reminders.inactivity_nudge_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "reminders.inactivity_nudge_minutes".into(),
                message: "must be at least 1".into(),
            });
        }
        self.habit_reminder_default()?;
        if let Some(minutes) = self.calendar.utc_offset_minutes {
            if Zone::from_offset_minutes(minutes).is_none() {
                return Err(ConfigError::InvalidValue {
                    key: "calendar.utc_offset_minutes".into(),
                    message: format!("{minutes} is out of range"),
                });
            }
        }
        Ok(())
    }

    pub fn habit_reminder_default(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(&self.reminders.habit_reminder_default, "%H:%M").map_err(|e| {
            ConfigError::InvalidValue {
                key: "reminders.habit_reminder_default".into(),
                message: e.to_string(),
            }
        })
    }

    pub fn zone(&self) -> Zone {
        self.calendar
            .utc_offset_minutes
            .and_then(Zone::from_offset_minutes)
            .unwrap_or(Zone::Local)
    }

    /// Settings the tracker is built with.
    pub fn tracker_settings(&self) -> TrackerSettings {
        TrackerSettings {
            zone: self.zone(),
            sleep_retention: self.sleep.session_retention,
            early_bedtime_hour: self.sleep.early_bedtime_hour,
            reminders_enabled: self.reminders.enabled,
            inactivity_nudge_minutes: self.reminders.inactivity_nudge_minutes,
            gym_reminder_hour: self.reminders.gym_reminder_hour,
            habit_reminder_default: self
                .habit_reminder_default()
                .unwrap_or_else(|_| TrackerSettings::default().habit_reminder_default),
        }
    }
}

fn parse_number(value: &str) -> Option<serde_json::Value> {
    if let Ok(n) = value.parse::<i64>() {
        Some(serde_json::Value::Number(n.into()))
    } else {
        value
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(serde_json::Value::Number)
    }
}

fn flatten(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&path, child, out);
            }
        }
        serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
        other => out.push((prefix.to_string(), other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.sleep.session_retention, 30);
        assert_eq!(parsed.reminders.habit_reminder_default, "20:00");
        assert!(parsed.calendar.utc_offset_minutes.is_none());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("reminders.enabled").as_deref(), Some("true"));
        assert_eq!(cfg.get("sleep.early_bedtime_hour").as_deref(), Some("22"));
        assert_eq!(cfg.get("calendar.utc_offset_minutes").as_deref(), Some("null"));
        assert!(cfg.get("sleep.missing_key").is_none());
    }

    #[test]
    fn apply_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.apply("reminders.enabled", "false").unwrap();
        cfg.apply("sleep.session_retention", "14").unwrap();
        cfg.apply("reminders.habit_reminder_default", "07:30").unwrap();
        assert!(!cfg.reminders.enabled);
        assert_eq!(cfg.sleep.session_retention, 14);
        assert_eq!(
            cfg.habit_reminder_default().unwrap(),
            NaiveTime::from_hms_opt(7, 30, 0).unwrap()
        );
    }

    #[test]
    fn optional_offset_can_be_set_and_cleared() {
        let mut cfg = Config::default();
        cfg.apply("calendar.utc_offset_minutes", "-300").unwrap();
        assert_eq!(cfg.calendar.utc_offset_minutes, Some(-300));
        assert_eq!(cfg.zone(), Zone::from_offset_minutes(-300).unwrap());
        cfg.apply("calendar.utc_offset_minutes", "none").unwrap();
        assert_eq!(cfg.calendar.utc_offset_minutes, None);
        assert_eq!(cfg.zone(), Zone::Local);
    }

    #[test]
    fn set_offset_clears_after_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::load_from(&path).unwrap();
        cfg.apply("calendar.utc_offset_minutes", "120").unwrap();
        cfg.save_to(&path).unwrap();

        let mut reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.calendar.utc_offset_minutes, Some(120));
        reloaded.apply("calendar.utc_offset_minutes", "").unwrap();
        assert_eq!(reloaded.calendar.utc_offset_minutes, None);
        // Required numbers do not accept "none".
        assert!(reloaded.apply("sleep.session_retention", "none").is_err());
    }

    #[test]
    fn apply_rejects_unknown_key_and_bad_values() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.apply("sleep.nonexistent", "1"),
            Err(crate::CoreError::Config(ConfigError::UnknownKey(_)))
        ));
        assert!(cfg.apply("reminders.enabled", "not_a_bool").is_err());
        assert!(cfg.apply("sleep.session_retention", "0").is_err());
        assert!(cfg.apply("reminders.habit_reminder_default", "25:99").is_err());
        assert_eq!(cfg.sleep.session_retention, 30);
        assert!(cfg.reminders.enabled);
    }

    #[test]
    fn entries_lists_every_leaf() {
        let keys: Vec<String> = Config::default().entries().into_iter().map(|(k, _)| k).collect();
        assert!(keys.contains(&"sleep.session_retention".to_string()));
        assert!(keys.contains(&"reminders.gym_reminder_hour".to_string()));
        assert!(keys.contains(&"calendar.utc_offset_minutes".to_string()));
    }

    #[test]
    fn load_from_creates_defaults_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.reminders.gym_reminder_hour, 18);

        std::fs::write(&path, "[sleep]\nsession_retention = 7\n").unwrap();
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.sleep.session_retention, 7);
        assert_eq!(cfg.sleep.early_bedtime_hour, 22);
    }

    #[test]
    fn tracker_settings_follow_config() {
        let mut cfg = Config::default();
        cfg.apply("calendar.utc_offset_minutes", "60").unwrap();
        cfg.apply("reminders.inactivity_nudge_minutes", "15").unwrap();
        let settings = cfg.tracker_settings();
        assert_eq!(settings.zone, Zone::from_offset_minutes(60).unwrap());
        assert_eq!(settings.inactivity_nudge_minutes, 15);
        assert_eq!(settings.sleep_retention, 30);
    }
}
