mod config;
mod detached;
mod engine;
mod runner;

pub use config::{
    format_duration, parse_component, parse_duration, Phase, SessionConfig,
    DEFAULT_MAX_PHASE_SECS, MAX_COMPONENT,
};
pub use detached::{now_ms, DetachedSession};
pub use engine::{SessionState, SessionTimer, TickSourceId};
pub use runner::{Command, HistorySink, SessionRunner};
