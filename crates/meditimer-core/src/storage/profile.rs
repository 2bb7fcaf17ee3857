//! Profile fields, each stored under its own key.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::database::Database;
use crate::error::{Result, ValidationError};

const NAME_KEY: &str = "profile.name";
const GOAL_KEY: &str = "profile.daily_goal_min";

/// Daily goal used when nothing (or garbage) is stored.
pub const DEFAULT_DAILY_GOAL_MIN: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub daily_goal_min: u32,
}

pub struct ProfileStore<'a> {
    db: &'a Database,
    default_goal_min: u32,
}

impl<'a> ProfileStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            default_goal_min: DEFAULT_DAILY_GOAL_MIN,
        }
    }

    pub fn with_default_goal(mut self, minutes: u32) -> Self {
        self.default_goal_min = minutes;
        self
    }

    pub fn name(&self) -> Result<String> {
        Ok(self.db.kv_get(NAME_KEY)?.unwrap_or_default())
    }

    /// Store a display name. Surrounding whitespace is trimmed.
    pub fn set_name(&self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.chars().count() > 64 {
            return Err(ValidationError::InvalidValue {
                field: "name".into(),
                message: "must be at most 64 characters".into(),
            }
            .into());
        }
        self.db.kv_set(NAME_KEY, name)?;
        Ok(())
    }

    pub fn daily_goal_min(&self) -> Result<u32> {
        match self.db.kv_get(GOAL_KEY)? {
            Some(raw) => Ok(raw.trim().parse().unwrap_or_else(|_| {
                warn!(value = %raw, "stored daily goal is not a number, using default");
                self.default_goal_min
            })),
            None => Ok(self.default_goal_min),
        }
    }

    pub fn set_daily_goal_min(&self, minutes: u32) -> Result<()> {
        if minutes > 24 * 60 {
            return Err(ValidationError::InvalidValue {
                field: "daily_goal_min".into(),
                message: "cannot exceed a day".into(),
            }
            .into());
        }
        self.db.kv_set(GOAL_KEY, &minutes.to_string())?;
        Ok(())
    }

    pub fn load(&self) -> Result<Profile> {
        Ok(Profile {
            name: self.name()?,
            daily_goal_min: self.daily_goal_min()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_empty() {
        let db = Database::open_memory().unwrap();
        let profile = ProfileStore::new(&db).load().unwrap();
        assert_eq!(profile.name, "");
        assert_eq!(profile.daily_goal_min, DEFAULT_DAILY_GOAL_MIN);
    }

    #[test]
    fn fields_are_independent() {
        let db = Database::open_memory().unwrap();
        let store = ProfileStore::new(&db);
        store.set_name("  Ada ").unwrap();
        assert_eq!(store.name().unwrap(), "Ada");
        assert_eq!(store.daily_goal_min().unwrap(), DEFAULT_DAILY_GOAL_MIN);

        store.set_daily_goal_min(25).unwrap();
        assert_eq!(store.load().unwrap().daily_goal_min, 25);
        assert_eq!(store.name().unwrap(), "Ada");
    }

    #[test]
    fn garbage_goal_reads_as_default() {
        let db = Database::open_memory().unwrap();
        db.kv_set(GOAL_KEY, "lots").unwrap();
        let store = ProfileStore::new(&db).with_default_goal(15);
        assert_eq!(store.daily_goal_min().unwrap(), 15);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let db = Database::open_memory().unwrap();
        let store = ProfileStore::new(&db);
        assert!(store.set_daily_goal_min(24 * 60 + 1).is_err());
        assert!(store.set_name(&"x".repeat(65)).is_err());
    }
}
