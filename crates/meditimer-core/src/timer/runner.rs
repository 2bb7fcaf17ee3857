//! Async tick driver for a [`SessionTimer`].
//!
//! The runner owns at most one [`Ticker`], a spawned interval task that
//! sends its [`TickSourceId`] once per period. After every command the
//! runner reconciles the ticker with the timer's live source: the old task
//! is aborted before a replacement is spawned, and anything it already
//! queued is dropped by [`SessionTimer::tick_from`].

use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error};

use super::config::SessionConfig;
use super::engine::{SessionState, SessionTimer, TickSourceId};
use crate::events::Event;
use crate::storage::HistoryEntry;

/// Where completed sessions are handed off.
pub trait HistorySink {
    fn append(&mut self, entry: &HistoryEntry) -> crate::error::Result<()>;
}

impl HistorySink for Vec<HistoryEntry> {
    fn append(&mut self, entry: &HistoryEntry) -> crate::error::Result<()> {
        self.push(entry.clone());
        Ok(())
    }
}

/// User commands accepted while a session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Pause,
    Resume,
    Stop,
}

struct Ticker {
    id: TickSourceId,
    handle: JoinHandle<()>,
}

impl Ticker {
    fn spawn(id: TickSourceId, period: Duration, tx: mpsc::UnboundedSender<TickSourceId>) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(id).is_err() {
                    break;
                }
            }
        });
        Self { id, handle }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub struct SessionRunner<S> {
    timer: SessionTimer,
    ticker: Option<Ticker>,
    period: Duration,
    tick_tx: mpsc::UnboundedSender<TickSourceId>,
    tick_rx: mpsc::UnboundedReceiver<TickSourceId>,
    events: mpsc::UnboundedSender<Event>,
    sink: S,
}

impl<S: HistorySink> SessionRunner<S> {
    pub fn new(sink: S, events: mpsc::UnboundedSender<Event>) -> Self {
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        Self {
            timer: SessionTimer::new(),
            ticker: None,
            period: Duration::from_secs(1),
            tick_tx,
            tick_rx,
            events,
            sink,
        }
    }

    /// Override the tick period (tests use a paused clock instead).
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn has_live_ticker(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn start(&mut self, config: SessionConfig) {
        let events = self.timer.start(config);
        self.sync_ticker();
        self.dispatch(events);
    }

    pub fn pause(&mut self) {
        let event = self.timer.pause();
        self.sync_ticker();
        self.dispatch(event);
    }

    pub fn resume(&mut self) {
        let event = self.timer.resume();
        self.sync_ticker();
        self.dispatch(event);
    }

    pub fn stop(&mut self) {
        let event = self.timer.stop();
        self.sync_ticker();
        self.dispatch(event);
    }

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Pause => self.pause(),
            Command::Resume => self.resume(),
            Command::Stop => self.stop(),
        }
    }

    /// Wait for the next tick from the live source and apply it.
    ///
    /// Returns immediately with nothing when the timer is not running.
    pub async fn next_tick(&mut self) -> Vec<Event> {
        while self.timer.state() == SessionState::Running {
            let Some(id) = self.tick_rx.recv().await else {
                break;
            };
            let events = self.apply_tick(id);
            if !events.is_empty() {
                return events;
            }
        }
        Vec::new()
    }

    /// Drive the active session until it completes or is stopped.
    ///
    /// A closed command channel stops the session.
    pub async fn run(&mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        while self.timer.is_active() {
            tokio::select! {
                Some(id) = self.tick_rx.recv() => {
                    self.apply_tick(id);
                }
                command = commands.recv() => match command {
                    Some(command) => self.apply(command),
                    None => self.stop(),
                },
            }
        }
    }

    fn apply_tick(&mut self, id: TickSourceId) -> Vec<Event> {
        let events = self.timer.tick_from(id);
        self.sync_ticker();
        self.dispatch(events.clone());
        events
    }

    /// Keep exactly one ticker for the live source, or none.
    fn sync_ticker(&mut self) {
        let live = self.timer.live_source();
        if self.ticker.as_ref().map(|t| t.id) == live {
            return;
        }
        // Dropping aborts the previous task before a new one exists.
        self.ticker = None;
        if let Some(id) = live {
            debug!(source = id.get(), "arming tick source");
            self.ticker = Some(Ticker::spawn(id, self.period, self.tick_tx.clone()));
        }
    }

    fn dispatch(&mut self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            let failure = event.completed_entry().and_then(|entry| {
                self.sink.append(entry).err().map(|e| {
                    error!(error = %e, "failed to append history entry");
                    Event::HistoryWriteFailed {
                        error: e.to_string(),
                        at: Utc::now(),
                    }
                })
            });
            let _ = self.events.send(event);
            if let Some(failure) = failure {
                let _ = self.events.send(failure);
            }
        }
    }
}
