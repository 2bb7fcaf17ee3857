//! Weekly meditation reminders.
//!
//! Scheduling a time of day for a set of weekdays registers one reminder per
//! weekday, each with its own [`ReminderId`]. Cancellation goes through that
//! id; nothing is re-derived from the original time and weekday.

use chrono::{DateTime, Datelike, Duration, NaiveDateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{ReminderError, Result};
use crate::storage::Database;

const REMINDERS_KEY: &str = "reminders";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderId(Uuid);

impl ReminderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ReminderId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReminderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ReminderId {
    type Err = ReminderError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| ReminderError::NotFound(s.to_string()))
    }
}

/// A weekly recurring reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: ReminderId,
    pub weekday: Weekday,
    pub time: NaiveTime,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Reminder {
    /// First occurrence at or after `now`.
    ///
    /// A reminder for today whose time has already passed fires next week.
    pub fn next_fire(&self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date().weekday();
        let offset = (7 + self.weekday.num_days_from_sunday() - today.num_days_from_sunday()) % 7;
        let candidate = (now.date() + Duration::days(i64::from(offset))).and_time(self.time);
        if candidate < now {
            candidate + Duration::days(7)
        } else {
            candidate
        }
    }
}

/// Registers and cancels recurring reminders.
pub trait ReminderScheduler {
    /// Register one reminder per distinct weekday.
    fn schedule(
        &mut self,
        time: NaiveTime,
        weekdays: &[Weekday],
        title: &str,
        body: &str,
    ) -> Result<Vec<ReminderId>>;

    /// Remove exactly the reminder registered under `id`.
    fn cancel(&mut self, id: ReminderId) -> Result<Reminder>;

    fn list(&self) -> Result<Vec<Reminder>>;

    /// Every reminder paired with its next firing time, soonest first.
    fn upcoming(&self, now: NaiveDateTime) -> Result<Vec<(Reminder, NaiveDateTime)>> {
        let mut upcoming: Vec<_> = self
            .list()?
            .into_iter()
            .map(|r| {
                let at = r.next_fire(now);
                (r, at)
            })
            .collect();
        upcoming.sort_by_key(|(_, at)| *at);
        Ok(upcoming)
    }
}

/// Reminder registry persisted as a JSON list in the key-value store.
pub struct LocalReminderScheduler<'a> {
    db: &'a Database,
}

impl<'a> LocalReminderScheduler<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn save(&self, reminders: &[Reminder]) -> Result<()> {
        self.db
            .kv_set(REMINDERS_KEY, &serde_json::to_string(reminders)?)?;
        Ok(())
    }
}

impl ReminderScheduler for LocalReminderScheduler<'_> {
    fn schedule(
        &mut self,
        time: NaiveTime,
        weekdays: &[Weekday],
        title: &str,
        body: &str,
    ) -> Result<Vec<ReminderId>> {
        let mut days: Vec<Weekday> = Vec::new();
        for day in weekdays {
            if !days.contains(day) {
                days.push(*day);
            }
        }
        if days.is_empty() {
            return Err(ReminderError::NoWeekdays.into());
        }

        let mut reminders = self.list()?;
        let now = Utc::now();
        let ids: Vec<ReminderId> = days
            .into_iter()
            .map(|weekday| {
                let reminder = Reminder {
                    id: ReminderId::new(),
                    weekday,
                    time,
                    title: title.to_string(),
                    body: body.to_string(),
                    created_at: now,
                };
                let id = reminder.id;
                reminders.push(reminder);
                id
            })
            .collect();
        self.save(&reminders)?;
        debug!(count = ids.len(), %time, "reminders scheduled");
        Ok(ids)
    }

    fn cancel(&mut self, id: ReminderId) -> Result<Reminder> {
        let mut reminders = self.list()?;
        let index = reminders
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| ReminderError::NotFound(id.to_string()))?;
        let removed = reminders.remove(index);
        self.save(&reminders)?;
        debug!(%id, "reminder cancelled");
        Ok(removed)
    }

    fn list(&self) -> Result<Vec<Reminder>> {
        match self.db.kv_get(REMINDERS_KEY)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }
}

/// Parse `HH:MM` (24-hour).
pub fn parse_time_of_day(text: &str) -> std::result::Result<NaiveTime, ReminderError> {
    NaiveTime::parse_from_str(text.trim(), "%H:%M")
        .map_err(|_| ReminderError::InvalidTime(text.to_string()))
}

/// Parse a weekday name, three-letter abbreviation, or index (0 = Sunday).
pub fn parse_weekday(text: &str) -> std::result::Result<Weekday, ReminderError> {
    let trimmed = text.trim();
    if let Ok(index) = trimmed.parse::<u8>() {
        return match index {
            0 => Ok(Weekday::Sun),
            1 => Ok(Weekday::Mon),
            2 => Ok(Weekday::Tue),
            3 => Ok(Weekday::Wed),
            4 => Ok(Weekday::Thu),
            5 => Ok(Weekday::Fri),
            6 => Ok(Weekday::Sat),
            _ => Err(ReminderError::InvalidWeekday(text.to_string())),
        };
    }
    trimmed
        .parse::<Weekday>()
        .map_err(|_| ReminderError::InvalidWeekday(text.to_string()))
}

/// Parse a comma-separated weekday list. `daily`, `weekdays` and
/// `weekends` expand to the obvious sets.
pub fn parse_weekdays(text: &str) -> std::result::Result<Vec<Weekday>, ReminderError> {
    use Weekday::*;
    match text.trim().to_ascii_lowercase().as_str() {
        "daily" => return Ok(vec![Sun, Mon, Tue, Wed, Thu, Fri, Sat]),
        "weekdays" => return Ok(vec![Mon, Tue, Wed, Thu, Fri]),
        "weekends" => return Ok(vec![Sat, Sun]),
        _ => {}
    }
    text.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(parse_weekday)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    // 2024-05-08 is a Wednesday.
    fn wednesday_at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 8)
            .unwrap()
            .and_time(time(h, m))
    }

    #[test]
    fn schedule_registers_one_per_distinct_day() {
        let db = Database::open_memory().unwrap();
        let mut scheduler = LocalReminderScheduler::new(&db);
        let ids = scheduler
            .schedule(
                time(7, 30),
                &[Weekday::Mon, Weekday::Wed, Weekday::Mon],
                "t",
                "b",
            )
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
        assert_eq!(scheduler.list().unwrap().len(), 2);
    }

    #[test]
    fn schedule_rejects_empty_day_set() {
        let db = Database::open_memory().unwrap();
        let mut scheduler = LocalReminderScheduler::new(&db);
        assert!(scheduler.schedule(time(7, 30), &[], "t", "b").is_err());
    }

    #[test]
    fn cancel_removes_only_that_reminder() {
        let db = Database::open_memory().unwrap();
        let mut scheduler = LocalReminderScheduler::new(&db);
        let ids = scheduler
            .schedule(time(7, 30), &[Weekday::Mon, Weekday::Tue], "t", "b")
            .unwrap();

        let removed = scheduler.cancel(ids[0]).unwrap();
        assert_eq!(removed.weekday, Weekday::Mon);
        let left = scheduler.list().unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, ids[1]);

        assert!(scheduler.cancel(ids[0]).is_err());
    }

    #[test]
    fn next_fire_same_day_later() {
        let reminder = Reminder {
            id: ReminderId::new(),
            weekday: Weekday::Wed,
            time: time(18, 0),
            title: String::new(),
            body: String::new(),
            created_at: Utc::now(),
        };
        assert_eq!(reminder.next_fire(wednesday_at(9, 0)), wednesday_at(18, 0));
        assert_eq!(
            reminder.next_fire(wednesday_at(18, 1)),
            wednesday_at(18, 0) + Duration::days(7)
        );
    }

    #[test]
    fn next_fire_wraps_the_week() {
        let reminder = Reminder {
            id: ReminderId::new(),
            weekday: Weekday::Mon,
            time: time(6, 0),
            title: String::new(),
            body: String::new(),
            created_at: Utc::now(),
        };
        let expected = NaiveDate::from_ymd_opt(2024, 5, 13)
            .unwrap()
            .and_time(time(6, 0));
        assert_eq!(reminder.next_fire(wednesday_at(9, 0)), expected);
    }

    #[test]
    fn upcoming_is_sorted() {
        let db = Database::open_memory().unwrap();
        let mut scheduler = LocalReminderScheduler::new(&db);
        scheduler
            .schedule(time(6, 0), &[Weekday::Mon, Weekday::Thu], "t", "b")
            .unwrap();
        let upcoming = scheduler.upcoming(wednesday_at(9, 0)).unwrap();
        assert_eq!(upcoming[0].0.weekday, Weekday::Thu);
        assert_eq!(upcoming[1].0.weekday, Weekday::Mon);
    }

    #[test]
    fn weekday_parsing() {
        assert_eq!(parse_weekday("0").unwrap(), Weekday::Sun);
        assert_eq!(parse_weekday("mon").unwrap(), Weekday::Mon);
        assert_eq!(parse_weekday("Friday").unwrap(), Weekday::Fri);
        assert!(parse_weekday("7").is_err());
        assert!(parse_weekday("someday").is_err());

        assert_eq!(parse_weekdays("weekdays").unwrap().len(), 5);
        assert_eq!(
            parse_weekdays("sat, sun").unwrap(),
            vec![Weekday::Sat, Weekday::Sun]
        );
    }

    #[test]
    fn time_parsing() {
        assert_eq!(parse_time_of_day("07:30").unwrap(), time(7, 30));
        assert!(parse_time_of_day("25:00").is_err());
        assert!(parse_time_of_day("noon").is_err());
    }
}
