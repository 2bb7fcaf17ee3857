//! A session timer that survives between process invocations.
//!
//! The CLI `timer` commands each run for a moment and exit, so nothing can
//! deliver ticks in between. Instead the wall-clock time at which the live
//! tick source was armed is stored next to the timer, and every command
//! first replays the whole seconds that have passed since then.

use serde::{Deserialize, Serialize};

use super::config::SessionConfig;
use super::engine::{SessionState, SessionTimer};
use crate::events::Event;

const TICK_MS: u64 = 1000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetachedSession {
    timer: SessionTimer,
    /// Epoch milliseconds of the last tick delivered (or of arming).
    #[serde(default)]
    anchor_epoch_ms: Option<u64>,
}

impl DetachedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    /// Replay ticks owed since the anchor. Returns every event produced.
    pub fn catch_up(&mut self, now_ms: u64) -> Vec<Event> {
        let Some(anchor) = self.anchor_epoch_ms else {
            return Vec::new();
        };
        let owed = now_ms.saturating_sub(anchor) / TICK_MS;
        let mut events = Vec::new();
        for _ in 0..owed {
            events.extend(self.timer.tick());
            if self.timer.state() != SessionState::Running {
                break;
            }
        }
        self.anchor_epoch_ms = if self.timer.state() == SessionState::Running {
            Some(anchor + owed * TICK_MS)
        } else {
            None
        };
        events
    }

    pub fn start(&mut self, config: SessionConfig, now_ms: u64) -> Vec<Event> {
        let mut events = self.catch_up(now_ms);
        let started = self.timer.start(config);
        if !started.is_empty() {
            // Fresh tick source, fresh anchor.
            self.anchor_epoch_ms = None;
        }
        events.extend(started);
        self.sync_anchor(now_ms);
        events
    }

    pub fn pause(&mut self, now_ms: u64) -> Vec<Event> {
        let mut events = self.catch_up(now_ms);
        events.extend(self.timer.pause());
        self.sync_anchor(now_ms);
        events
    }

    pub fn resume(&mut self, now_ms: u64) -> Vec<Event> {
        let mut events = self.catch_up(now_ms);
        events.extend(self.timer.resume());
        self.sync_anchor(now_ms);
        events
    }

    pub fn stop(&mut self, now_ms: u64) -> Vec<Event> {
        let mut events = self.catch_up(now_ms);
        events.extend(self.timer.stop());
        self.sync_anchor(now_ms);
        events
    }

    /// A running timer always has an anchor; anything else never does.
    fn sync_anchor(&mut self, now_ms: u64) {
        match (self.timer.state(), self.anchor_epoch_ms) {
            (SessionState::Running, None) => self.anchor_epoch_ms = Some(now_ms),
            (SessionState::Running, Some(_)) => {}
            _ => self.anchor_epoch_ms = None,
        }
    }
}

pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::Phase;

    #[test]
    fn catch_up_replays_whole_seconds() {
        let mut session = DetachedSession::new();
        session.start(SessionConfig::new(10, 5), 1_000);

        let events = session.catch_up(4_500);
        assert_eq!(events.iter().filter(|e| e.is_tick()).count(), 3);
        assert_eq!(session.timer().remaining_secs(), 12);

        // The leftover half second is carried to the next catch-up.
        session.catch_up(5_000);
        assert_eq!(session.timer().remaining_secs(), 11);
    }

    #[test]
    fn catch_up_stops_at_completion() {
        let mut session = DetachedSession::new();
        session.start(SessionConfig::new(2, 1), 0);
        let events = session.catch_up(60_000);
        assert_eq!(events.iter().filter(|e| e.is_tick()).count(), 3);
        assert_eq!(events.iter().filter_map(Event::completed_entry).count(), 1);
        assert_eq!(session.timer().state(), SessionState::Idle);
        assert!(session.catch_up(120_000).is_empty());
    }

    #[test]
    fn paused_time_is_not_counted() {
        let mut session = DetachedSession::new();
        session.start(SessionConfig::new(5, 5), 0);
        session.pause(2_000);
        assert_eq!(session.timer().remaining_secs(), 8);

        session.resume(50_000);
        session.catch_up(53_000);
        assert_eq!(session.timer().remaining_secs(), 5);
        assert_eq!(session.timer().phase(), Phase::Rest);
    }

    #[test]
    fn stop_includes_owed_ticks() {
        let mut session = DetachedSession::new();
        session.start(SessionConfig::new(30, 0), 0);
        let events = session.stop(7_200);
        let entry = events.iter().find_map(Event::completed_entry).unwrap();
        assert_eq!(entry.duration_secs, 7);
    }
}
