//! Session timer state machine.
//!
//! The engine has no internal thread. Something outside (the async
//! [`SessionRunner`](super::SessionRunner), a wall-clock catch-up, or a test)
//! delivers one `tick()` per second while a tick source is live.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//! Running -> (Completed) -> Idle      countdown reached zero
//! Running | Paused -> (Completed) -> Idle   stop()
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = SessionTimer::new();
//! timer.start(SessionConfig::new(300, 60));
//! // once per second:
//! for event in timer.tick() { /* render, persist */ }
//! ```

use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::config::{Phase, SessionConfig};
use crate::events::Event;
use crate::storage::{CompletionReason, HistoryEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Running,
    Paused,
    /// Transient: held only while the completion event is built.
    Completed,
}

/// Identifies one registration of the periodic tick.
///
/// A fresh id is issued on every `start()` and `resume()`, so ticks from a
/// source that has since been replaced can be told apart and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TickSourceId(u64);

impl TickSourceId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Core session timer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTimer {
    config: SessionConfig,
    state: SessionState,
    phase: Phase,
    remaining_secs: u64,
    /// The single tick source currently allowed to advance the countdown.
    live_source: Option<TickSourceId>,
    #[serde(default)]
    next_source: u64,
}

impl Default for SessionTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionTimer {
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
            state: SessionState::Idle,
            phase: Phase::Meditation,
            remaining_secs: 0,
            live_source: None,
            next_source: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn total_secs(&self) -> u64 {
        self.config.total_secs()
    }

    pub fn elapsed_secs(&self) -> u64 {
        if self.state == SessionState::Idle {
            return 0;
        }
        self.total_secs().saturating_sub(self.remaining_secs)
    }

    /// Running or Paused.
    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Running | SessionState::Paused)
    }

    pub fn live_source(&self) -> Option<TickSourceId> {
        self.live_source
    }

    /// 0.0 .. 100.0 progress through the session.
    pub fn progress_pct(&self) -> f64 {
        let total = self.total_secs();
        if total == 0 || self.state == SessionState::Idle {
            return 0.0;
        }
        (self.elapsed_secs() as f64 / total as f64 * 100.0).min(100.0)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state,
            phase: self.phase,
            remaining_secs: self.remaining_secs,
            total_secs: if self.state == SessionState::Idle {
                0
            } else {
                self.total_secs()
            },
            progress_pct: self.progress_pct(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a fresh session.
    ///
    /// An empty config is ignored. If a session is already active it is
    /// stopped first, so its completion event precedes the new start.
    pub fn start(&mut self, config: SessionConfig) -> Vec<Event> {
        if config.is_empty() {
            warn!("ignoring start with zero-length session");
            return Vec::new();
        }

        let mut events = Vec::new();
        if self.is_active() {
            events.extend(self.stop());
        }

        self.config = config;
        self.state = SessionState::Running;
        self.phase = config.initial_phase();
        self.remaining_secs = config.total_secs();
        let source = self.arm();
        debug!(
            meditation_secs = config.meditation_secs,
            rest_secs = config.rest_secs,
            source = source.get(),
            "session started"
        );

        events.push(Event::SessionStarted {
            config,
            phase: self.phase,
            total_secs: config.total_secs(),
            source,
            at: Utc::now(),
        });
        events
    }

    pub fn pause(&mut self) -> Option<Event> {
        match self.state {
            SessionState::Running => {
                self.disarm();
                self.state = SessionState::Paused;
                debug!(remaining_secs = self.remaining_secs, "session paused");
                Some(Event::SessionPaused {
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }

    pub fn resume(&mut self) -> Option<Event> {
        match self.state {
            SessionState::Paused => {
                self.state = SessionState::Running;
                let source = self.arm();
                debug!(remaining_secs = self.remaining_secs, "session resumed");
                Some(Event::SessionResumed {
                    remaining_secs: self.remaining_secs,
                    source,
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }

    /// End the session early. No-op while Idle.
    pub fn stop(&mut self) -> Option<Event> {
        if !self.is_active() {
            return None;
        }
        Some(self.complete(CompletionReason::Stopped))
    }

    /// Advance by one second on the live source.
    pub fn tick(&mut self) -> Vec<Event> {
        if self.state != SessionState::Running || self.live_source.is_none() {
            return Vec::new();
        }
        self.advance()
    }

    /// Advance by one second if `source` is still the live one.
    pub fn tick_from(&mut self, source: TickSourceId) -> Vec<Event> {
        if self.live_source != Some(source) {
            debug!(source = source.get(), "dropping tick from stale source");
            return Vec::new();
        }
        self.tick()
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Replace whatever source is live with a fresh one.
    fn arm(&mut self) -> TickSourceId {
        self.disarm();
        let id = TickSourceId(self.next_source);
        self.next_source = self.next_source.wrapping_add(1);
        self.live_source = Some(id);
        id
    }

    fn disarm(&mut self) {
        self.live_source = None;
    }

    fn advance(&mut self) -> Vec<Event> {
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        let elapsed = self.elapsed_secs();

        let mut phase_change = None;
        if self.remaining_secs > 0
            && self.phase == Phase::Meditation
            && elapsed == self.config.meditation_secs
        {
            self.phase = Phase::Rest;
            debug!(elapsed_secs = elapsed, "phase changed to rest");
            phase_change = Some(Event::PhaseChanged {
                from: Phase::Meditation,
                to: Phase::Rest,
                elapsed_secs: elapsed,
                at: Utc::now(),
            });
        }

        // The final tick still belongs to the phase that just ran out.
        let mut events = vec![Event::Tick {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
            elapsed_secs: elapsed,
            at: Utc::now(),
        }];
        events.extend(phase_change);
        if self.remaining_secs == 0 {
            events.push(self.complete(CompletionReason::Finished));
        }
        events
    }

    /// Disarm, emit the completion event, and return to Idle.
    fn complete(&mut self, reason: CompletionReason) -> Event {
        self.disarm();
        let elapsed = self.elapsed_secs();
        let total_secs = self.total_secs();
        self.state = SessionState::Completed;

        let entry = HistoryEntry::new(Local::now().naive_local(), elapsed, reason);
        debug!(duration_secs = elapsed, ?reason, "session completed");

        self.state = SessionState::Idle;
        self.phase = Phase::Meditation;
        self.remaining_secs = 0;

        Event::SessionCompleted {
            entry,
            total_secs,
            at: Utc::now(),
        }
    }
}
