//! Runtime durations in the scheduler's `MM` / `HH:MM` notation

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Largest value accepted in the bare-minutes form
pub const MAX_MINUTES: u32 = 59_999;

/// Largest hour count accepted in the `HH:MM` form
pub const MAX_HOURS: u32 = 999;

/// Why a runtime string was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeParseError {
    /// Neither `MM` nor `HH:MM`
    #[error("Time must be in format MM or HH:MM")]
    Format,
    /// Hours above the scheduler ceiling
    #[error("Hours cannot exceed {MAX_HOURS}")]
    HoursOutOfRange,
    /// Minutes above the scheduler ceiling
    #[error("Minutes cannot exceed {MAX_MINUTES}")]
    MinutesOutOfRange,
}

fn hhmm_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([0-9]{1,3}):([0-5][0-9])$").expect("valid regex"))
}

fn minutes_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([0-9]{1,5})$").expect("valid regex"))
}

/// A wall-clock limit as written for `bsub -W` / `-We`.
///
/// The form is kept, so minutes render as minutes and `H:MM` as `H:MM`.
/// Leading zeros are not: `01:00` renders as `1:00` and `090` as `90`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Runtime {
    /// Bare minutes (`90`)
    Minutes(u32),
    /// Hours and minutes (`1:30`)
    HoursMinutes {
        /// Whole hours
        hours: u32,
        /// Minutes past the hour, 0-59
        minutes: u32,
    },
}

impl Runtime {
    /// Fractional hours, used by the cost estimate
    pub fn as_hours(&self) -> f64 {
        match *self {
            Runtime::Minutes(m) => m as f64 / 60.0,
            Runtime::HoursMinutes { hours, minutes } => hours as f64 + minutes as f64 / 60.0,
        }
    }

    /// Total minutes
    pub fn total_minutes(&self) -> u64 {
        match *self {
            Runtime::Minutes(m) => m as u64,
            Runtime::HoursMinutes { hours, minutes } => hours as u64 * 60 + minutes as u64,
        }
    }

    /// As a std Duration
    pub fn to_duration(&self) -> Duration {
        Duration::from_secs(self.total_minutes() * 60)
    }

    /// Human-readable form: "48 hours", "1h 30m", "45 minutes"
    pub fn display_human(&self) -> String {
        let total = self.total_minutes();
        if total < 60 {
            return format!("{} minutes", total);
        }
        if total % 60 == 0 {
            return format!("{} hours", total / 60);
        }
        humantime::format_duration(self.to_duration()).to_string()
    }
}

impl FromStr for Runtime {
    type Err = RuntimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(caps) = hhmm_pattern().captures(s) {
            let hours: u32 = caps[1].parse().map_err(|_| RuntimeParseError::Format)?;
            let minutes: u32 = caps[2].parse().map_err(|_| RuntimeParseError::Format)?;
            if hours > MAX_HOURS {
                return Err(RuntimeParseError::HoursOutOfRange);
            }
            return Ok(Runtime::HoursMinutes { hours, minutes });
        }

        if let Some(caps) = minutes_pattern().captures(s) {
            let minutes: u32 = caps[1].parse().map_err(|_| RuntimeParseError::Format)?;
            if minutes > MAX_MINUTES {
                return Err(RuntimeParseError::MinutesOutOfRange);
            }
            return Ok(Runtime::Minutes(minutes));
        }

        Err(RuntimeParseError::Format)
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Runtime::Minutes(m) => write!(f, "{}", m),
            Runtime::HoursMinutes { hours, minutes } => write!(f, "{}:{:02}", hours, minutes),
        }
    }
}

impl TryFrom<String> for Runtime {
    type Error = RuntimeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Runtime> for String {
    fn from(value: Runtime) -> Self {
        value.to_string()
    }
}
