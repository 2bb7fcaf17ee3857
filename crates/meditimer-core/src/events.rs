use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::HistoryEntry;
use crate::timer::{Phase, SessionConfig, SessionState, TickSourceId};

/// Every state change of a session produces an Event.
/// The presentation layer renders them; persistence consumes completions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        config: SessionConfig,
        phase: Phase,
        total_secs: u64,
        source: TickSourceId,
        at: DateTime<Utc>,
    },
    Tick {
        phase: Phase,
        remaining_secs: u64,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    PhaseChanged {
        from: Phase,
        to: Phase,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    SessionPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        remaining_secs: u64,
        source: TickSourceId,
        at: DateTime<Utc>,
    },
    /// Emitted exactly once per session, whether it ran out or was stopped.
    /// `entry.reason` tells the two apart.
    SessionCompleted {
        entry: HistoryEntry,
        total_secs: u64,
        at: DateTime<Utc>,
    },
    /// Appending the completed entry failed. Session state is unaffected.
    HistoryWriteFailed {
        error: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: SessionState,
        phase: Phase,
        remaining_secs: u64,
        total_secs: u64,
        progress_pct: f64,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn is_tick(&self) -> bool {
        matches!(self, Event::Tick { .. })
    }

    /// The history entry carried by a completion event.
    pub fn completed_entry(&self) -> Option<&HistoryEntry> {
        match self {
            Event::SessionCompleted { entry, .. } => Some(entry),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::CompletionReason;

    #[test]
    fn completion_reason_lives_on_the_entry() {
        let entry = HistoryEntry::new(
            chrono::Local::now().naive_local(),
            42,
            CompletionReason::Stopped,
        );
        let event = Event::SessionCompleted {
            entry,
            total_secs: 60,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "SessionCompleted");
        assert!(json.get("reason").is_none());
        assert_eq!(json["entry"]["reason"], "stopped");
        assert_eq!(
            event.completed_entry().map(|e| e.reason),
            Some(CompletionReason::Stopped)
        );
    }
}
