//! Meditation history: an append-only list stored as one JSON blob.
//!
//! The whole list lives under [`HISTORY_KEY`] and is read and written
//! wholesale. Entries are never edited or removed here.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use super::database::Database;
use crate::error::Result;
use crate::timer::{format_duration, parse_duration, HistorySink};

/// Fixed key the history blob is stored under.
pub const HISTORY_KEY: &str = "meditationHistory";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionReason {
    /// The countdown reached zero.
    #[default]
    Finished,
    /// The user ended the session early.
    Stopped,
}

impl std::fmt::Display for CompletionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompletionReason::Finished => f.pad("finished"),
            CompletionReason::Stopped => f.pad("stopped"),
        }
    }
}

/// One completed or stopped session, stamped with local wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    /// Older blobs stored `duration` as an `"M:SS"` string.
    #[serde(alias = "duration", deserialize_with = "duration_secs_or_text")]
    pub duration_secs: u64,
    #[serde(default)]
    pub reason: CompletionReason,
}

impl HistoryEntry {
    pub fn new(at: NaiveDateTime, duration_secs: u64, reason: CompletionReason) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
            day: at.day(),
            hour: at.hour(),
            minute: at.minute(),
            duration_secs,
            reason,
        }
    }

    /// Calendar date, if the stored components form a valid one.
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }

    /// `YYYY-MM-DD HH:MM  M:SS  finished`
    pub fn display_line(&self) -> String {
        format!(
            "{:04}-{:02}-{:02} {:02}:{:02}  {:>6}  {}",
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            format_duration(self.duration_secs),
            self.reason
        )
    }
}

fn duration_secs_or_text<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Secs(u64),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Secs(secs) => secs,
        Raw::Text(text) => parse_duration(&text),
    })
}

/// Aggregates shown on the profile screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HistorySummary {
    pub total_sessions: u64,
    pub total_secs: u64,
    pub today_sessions: u64,
    pub today_secs: u64,
    pub daily_goal_secs: u64,
    pub goal_met: bool,
    /// Consecutive days, ending today or yesterday, with at least one session.
    pub streak_days: u32,
}

pub struct HistoryStore<'a> {
    db: &'a Database,
}

impl<'a> HistoryStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Read the full history. A missing blob is an empty history.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read or the blob is corrupt.
    pub fn load(&self) -> Result<Vec<HistoryEntry>> {
        match self.db.kv_get(HISTORY_KEY)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    /// Append one entry, rewriting the whole blob.
    pub fn append(&self, entry: &HistoryEntry) -> Result<()> {
        let mut entries = self.load()?;
        entries.push(entry.clone());
        self.db.kv_set(HISTORY_KEY, &serde_json::to_string(&entries)?)?;
        debug!(count = entries.len(), "history entry appended");
        Ok(())
    }

    pub fn summary(&self, today: NaiveDate, daily_goal_min: u32) -> Result<HistorySummary> {
        Ok(summarize(&self.load()?, today, daily_goal_min))
    }
}

impl HistorySink for HistoryStore<'_> {
    fn append(&mut self, entry: &HistoryEntry) -> Result<()> {
        HistoryStore::append(self, entry)
    }
}

pub fn summarize(entries: &[HistoryEntry], today: NaiveDate, daily_goal_min: u32) -> HistorySummary {
    let daily_goal_secs = u64::from(daily_goal_min) * 60;
    let mut summary = HistorySummary {
        daily_goal_secs,
        ..HistorySummary::default()
    };

    let mut days: Vec<NaiveDate> = Vec::new();
    for entry in entries {
        summary.total_sessions += 1;
        summary.total_secs += entry.duration_secs;
        let Some(date) = entry.date() else {
            continue;
        };
        if date == today {
            summary.today_sessions += 1;
            summary.today_secs += entry.duration_secs;
        }
        days.push(date);
    }
    summary.goal_met = daily_goal_secs > 0 && summary.today_secs >= daily_goal_secs;

    days.sort_unstable();
    days.dedup();
    let mut cursor = if days.binary_search(&today).is_ok() {
        today
    } else {
        today - Duration::days(1)
    };
    while days.binary_search(&cursor).is_ok() {
        summary.streak_days += 1;
        cursor -= Duration::days(1);
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn entry_serializes_components() {
        let entry = HistoryEntry::new(at(2024, 3, 5, 7), 300, CompletionReason::Finished);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["year"], 2024);
        assert_eq!(json["month"], 3);
        assert_eq!(json["duration_secs"], 300);
        assert_eq!(json["reason"], "finished");
    }

    #[test]
    fn legacy_text_duration_is_accepted() {
        let json = r#"[{"year":2023,"month":11,"day":2,"hour":21,"minute":4,"duration":"5:07"}]"#;
        let entries: Vec<HistoryEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries[0].duration_secs, 307);
        assert_eq!(entries[0].reason, CompletionReason::Finished);
    }

    #[test]
    fn display_line_is_human_readable() {
        let entry = HistoryEntry::new(at(2024, 3, 5, 7), 65, CompletionReason::Stopped);
        assert_eq!(entry.display_line(), "2024-03-05 07:00    1:05  stopped");
    }

    #[test]
    fn append_preserves_order() {
        let db = Database::open_memory().unwrap();
        let store = HistoryStore::new(&db);
        assert!(store.load().unwrap().is_empty());

        store
            .append(&HistoryEntry::new(at(2024, 1, 1, 8), 60, CompletionReason::Finished))
            .unwrap();
        store
            .append(&HistoryEntry::new(at(2024, 1, 2, 8), 90, CompletionReason::Stopped))
            .unwrap();

        let entries = store.load().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].day, 1);
        assert_eq!(entries[1].duration_secs, 90);
    }

    #[test]
    fn corrupt_blob_is_an_error() {
        let db = Database::open_memory().unwrap();
        db.kv_set(HISTORY_KEY, "not json").unwrap();
        assert!(HistoryStore::new(&db).load().is_err());
    }

    #[test]
    fn summary_counts_today_and_streak() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let entries = vec![
            HistoryEntry::new(at(2024, 5, 7, 8), 600, CompletionReason::Finished),
            HistoryEntry::new(at(2024, 5, 8, 8), 600, CompletionReason::Finished),
            HistoryEntry::new(at(2024, 5, 9, 8), 600, CompletionReason::Finished),
            HistoryEntry::new(at(2024, 5, 10, 8), 300, CompletionReason::Finished),
            HistoryEntry::new(at(2024, 5, 10, 20), 300, CompletionReason::Stopped),
        ];
        let summary = summarize(&entries, today, 10);
        assert_eq!(summary.total_sessions, 5);
        assert_eq!(summary.total_secs, 2400);
        assert_eq!(summary.today_sessions, 2);
        assert_eq!(summary.today_secs, 600);
        assert!(summary.goal_met);
        assert_eq!(summary.streak_days, 4);
    }

    #[test]
    fn streak_survives_until_today_is_done() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let entries = vec![HistoryEntry::new(at(2024, 5, 9, 8), 60, CompletionReason::Finished)];
        let summary = summarize(&entries, today, 0);
        assert_eq!(summary.streak_days, 1);
        assert!(!summary.goal_met);
    }
}
