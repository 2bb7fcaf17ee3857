pub mod config;
pub mod history;
pub mod profile;
pub mod reminder;
pub mod session;
pub mod timer;

use meditimer_core::timer::format_duration;
use meditimer_core::Event;

/// One-line rendering of a session event for the terminal.
pub fn describe(event: &Event) -> Option<String> {
    match event {
        Event::SessionStarted { phase, total_secs, .. } => Some(format!(
            "Session started ({} total, {phase} first)",
            format_duration(*total_secs)
        )),
        Event::PhaseChanged { to, .. } => Some(format!("Phase changed: {to}")),
        Event::SessionPaused { remaining_secs, .. } => {
            Some(format!("Paused at {}", format_duration(*remaining_secs)))
        }
        Event::SessionResumed { remaining_secs, .. } => {
            Some(format!("Resumed at {}", format_duration(*remaining_secs)))
        }
        Event::SessionCompleted { entry, .. } => Some(format!(
            "Session {} after {}",
            entry.reason,
            format_duration(entry.duration_secs)
        )),
        Event::HistoryWriteFailed { error, .. } => {
            Some(format!("Warning: session not saved to history: {error}"))
        }
        Event::Tick { .. } | Event::StateSnapshot { .. } => None,
    }
}
