//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Duration clamp and default session lengths
//! - Reminder notification text
//! - Profile defaults
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use super::profile::DEFAULT_DAILY_GOAL_MIN;
use crate::error::{ConfigError, Result};
use crate::timer::{SessionConfig, DEFAULT_MAX_PHASE_SECS};

/// Timer-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Cap applied to each phase of a session, in seconds.
    #[serde(default = "default_max_phase_secs")]
    pub max_phase_secs: u64,
    #[serde(default = "default_meditation_secs")]
    pub default_meditation_secs: u64,
    #[serde(default = "default_rest_secs")]
    pub default_rest_secs: u64,
}

/// Reminder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemindersConfig {
    #[serde(default = "default_reminder_title")]
    pub title: String,
    #[serde(default = "default_reminder_body")]
    pub body: String,
}

/// Profile defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default = "default_daily_goal_min")]
    pub default_daily_goal_min: u32,
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub reminders: RemindersConfig,
    #[serde(default)]
    pub profile: ProfileConfig,
}

fn default_max_phase_secs() -> u64 {
    DEFAULT_MAX_PHASE_SECS
}
fn default_meditation_secs() -> u64 {
    600
}
fn default_rest_secs() -> u64 {
    60
}
fn default_reminder_title() -> String {
    "Time for Meditation!".into()
}
fn default_reminder_body() -> String {
    "Start your daily meditation now!".into()
}
fn default_daily_goal_min() -> u32 {
    DEFAULT_DAILY_GOAL_MIN
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            max_phase_secs: default_max_phase_secs(),
            default_meditation_secs: default_meditation_secs(),
            default_rest_secs: default_rest_secs(),
        }
    }
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            title: default_reminder_title(),
            body: default_reminder_body(),
        }
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            default_daily_goal_min: default_daily_goal_min(),
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
    ) -> std::result::Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let (parent_path, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        if let Some(parent_path) = parent_path {
            for part in parent_path.split('.') {
                current = current.get_mut(part).ok_or_else(unknown)?;
            }
        }

        let obj = current.as_object_mut().ok_or_else(unknown)?;
        let existing = obj.get(leaf).ok_or_else(unknown)?;
        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
            ),
            serde_json::Value::Number(_) => value
                .parse::<u64>()
                .map(|n| serde_json::Value::Number(n.into()))
                .map_err(|_| invalid(format!("cannot parse '{value}' as a non-negative integer")))?,
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                return Err(invalid("cannot replace a whole section".into()));
            }
            _ => serde_json::Value::String(value.into()),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing defaults if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Persist to disk.
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
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key in memory. Returns error if key is unknown
    /// or the value doesn't fit the existing type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json)?;
        Ok(())
    }

    /// Clamp and coerce raw duration text using this config's limits.
    ///
    /// Missing input falls back to the configured default for that phase.
    pub fn session_from_input(&self, meditation: Option<&str>, rest: Option<&str>) -> SessionConfig {
        let or_default = |text: Option<&str>, default: u64| match text {
            Some(text) => crate::timer::parse_duration(text),
            None => default,
        };
        SessionConfig::clamped(
            or_default(meditation, self.timer.default_meditation_secs),
            or_default(rest, self.timer.default_rest_secs),
            self.timer.max_phase_secs,
        )
    }
}
