//! Session configuration and duration input sanitising.
//!
//! Durations arrive as free text (`"90"`, `"5:30"`). Malformed or negative
//! components coerce to zero; they are never reported as errors.

use serde::{Deserialize, Serialize};

/// Upper bound for a single minute or second input component.
pub const MAX_COMPONENT: u64 = 60;

/// Default per-phase cap: 60 minutes plus 60 seconds.
pub const DEFAULT_MAX_PHASE_SECS: u64 = MAX_COMPONENT * 60 + MAX_COMPONENT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Meditation,
    Rest,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Meditation => f.pad("meditation"),
            Phase::Rest => f.pad("rest"),
        }
    }
}

/// Durations of one session, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    pub meditation_secs: u64,
    pub rest_secs: u64,
}

impl SessionConfig {
    /// Build a config, clamping each phase to [`DEFAULT_MAX_PHASE_SECS`].
    pub fn new(meditation_secs: u64, rest_secs: u64) -> Self {
        Self::clamped(meditation_secs, rest_secs, DEFAULT_MAX_PHASE_SECS)
    }

    /// Build a config, clamping each phase to `max_phase_secs`.
    pub fn clamped(meditation_secs: u64, rest_secs: u64, max_phase_secs: u64) -> Self {
        Self {
            meditation_secs: meditation_secs.min(max_phase_secs),
            rest_secs: rest_secs.min(max_phase_secs),
        }
    }

    /// Parse both phases from text input, coercing malformed input to zero.
    pub fn from_input(meditation: &str, rest: &str, max_phase_secs: u64) -> Self {
        Self::clamped(parse_duration(meditation), parse_duration(rest), max_phase_secs)
    }

    pub fn total_secs(&self) -> u64 {
        self.meditation_secs.saturating_add(self.rest_secs)
    }

    /// A session with nothing to count down cannot be started.
    pub fn is_empty(&self) -> bool {
        self.total_secs() == 0
    }

    /// Phase a fresh session begins in.
    pub fn initial_phase(&self) -> Phase {
        if self.meditation_secs == 0 {
            Phase::Rest
        } else {
            Phase::Meditation
        }
    }
}

/// Parse a single numeric component. Anything that is not a non-negative
/// integer reads as zero.
pub fn parse_component(text: &str) -> u64 {
    text.trim().parse::<u64>().unwrap_or(0)
}

/// Parse `SS`, `M:SS` or `MM:SS` into seconds.
///
/// Minute and second components are each capped at [`MAX_COMPONENT`].
/// A bare number is taken as seconds and is not capped here; phase-level
/// clamping happens in [`SessionConfig::clamped`].
pub fn parse_duration(text: &str) -> u64 {
    match text.trim().split_once(':') {
        Some((min, sec)) => {
            let min = parse_component(min).min(MAX_COMPONENT);
            let sec = parse_component(sec).min(MAX_COMPONENT);
            min * 60 + sec
        }
        None => parse_component(text),
    }
}

/// Render seconds as `M:SS`.
pub fn format_duration(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_seconds() {
        assert_eq!(parse_duration("90"), 90);
        assert_eq!(parse_duration("  7 "), 7);
    }

    #[test]
    fn parse_minutes_and_seconds() {
        assert_eq!(parse_duration("5:30"), 330);
        assert_eq!(parse_duration("0:05"), 5);
        assert_eq!(parse_duration("10:"), 600);
    }

    #[test]
    fn malformed_components_coerce_to_zero() {
        assert_eq!(parse_duration("abc"), 0);
        assert_eq!(parse_duration("-5"), 0);
        assert_eq!(parse_duration("x:30"), 30);
        assert_eq!(parse_duration("2:-1"), 120);
        assert_eq!(parse_duration(""), 0);
    }

    #[test]
    fn components_capped_at_sixty() {
        assert_eq!(parse_duration("75:90"), 60 * 60 + 60);
    }

    #[test]
    fn config_clamps_each_phase() {
        let cfg = SessionConfig::clamped(500, 20, 60);
        assert_eq!(cfg.meditation_secs, 60);
        assert_eq!(cfg.rest_secs, 20);
        assert_eq!(cfg.total_secs(), 80);
    }

    #[test]
    fn from_input_applies_both_policies() {
        let cfg = SessionConfig::from_input("1:00", "oops", DEFAULT_MAX_PHASE_SECS);
        assert_eq!(cfg, SessionConfig::new(60, 0));
    }

    #[test]
    fn initial_phase_skips_empty_meditation() {
        assert_eq!(SessionConfig::new(0, 5).initial_phase(), Phase::Rest);
        assert_eq!(SessionConfig::new(3, 5).initial_phase(), Phase::Meditation);
        assert!(SessionConfig::new(0, 0).is_empty());
    }

    #[test]
    fn format_pads_seconds() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(65), "1:05");
        assert_eq!(format_duration(3660), "61:00");
    }
}
