//! # Meditimer Core Library
//!
//! Core logic for the Meditimer meditation timer: a countdown with a
//! meditation phase followed by a rest phase, a local history of finished
//! sessions, profile fields, and weekly reminders. The `meditimer` CLI is a
//! thin presentation layer over this crate.
//!
//! ## Architecture
//!
//! - **Session Timer**: a tick-driven state machine; something outside it
//!   delivers one tick per second while a tick source is live
//! - **Runner**: a tokio driver that owns the single live tick source
//! - **Storage**: SQLite key-value store holding the history blob, profile
//!   fields and reminders, plus TOML configuration
//! - **Reminders**: weekly reminders with explicit handles
//!
//! ## Key Components
//!
//! - [`SessionTimer`]: core timer state machine
//! - [`SessionRunner`]: async tick driver
//! - [`HistoryStore`]: append-only session history
//! - [`Config`]: application configuration management

pub mod error;
pub mod events;
pub mod export;
pub mod reminders;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, ReminderError, StorageError, ValidationError};
pub use events::Event;
pub use reminders::{LocalReminderScheduler, Reminder, ReminderId, ReminderScheduler};
pub use storage::{
    CompletionReason, Config, Database, HistoryEntry, HistoryStore, HistorySummary, Profile,
    ProfileStore,
};
pub use timer::{
    DetachedSession, HistorySink, Phase, SessionConfig, SessionRunner, SessionState, SessionTimer,
    TickSourceId,
};
