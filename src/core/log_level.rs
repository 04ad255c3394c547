//! Log level definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a message, and threshold of a log.
///
/// The discriminant is the priority: `Off` is the most restrictive threshold,
/// `All` the most permissive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum LogLevel {
    All = 0,
    Trace = 1,
    Info = 5,
    Warn = 7,
    Error = 8,
    Off = 10,
}

impl LogLevel {
    #[inline]
    pub const fn priority(self) -> u8 {
        self as u8
    }

    /// Whether a message at this level is shown under `threshold`.
    ///
    /// An absent threshold and an `Off` threshold suppress everything.
    #[inline]
    pub fn displays_with(self, threshold: Option<LogLevel>) -> bool {
        match threshold {
            None | Some(LogLevel::Off) => false,
            Some(threshold) => self.priority() >= threshold.priority(),
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::All => "ALL",
            LogLevel::Trace => "TRACE",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Off => "OFF",
        }
    }

    /// Single-character marker used by the default line format
    pub fn glyph(&self) -> char {
        match self {
            LogLevel::Error => '#',
            LogLevel::Warn => '*',
            LogLevel::Info => '>',
            LogLevel::Trace => '.',
            LogLevel::All | LogLevel::Off => ' ',
        }
    }

    /// Levels a message can be logged at, most severe first
    pub const fn message_levels() -> [LogLevel; 4] {
        [LogLevel::Error, LogLevel::Warn, LogLevel::Info, LogLevel::Trace]
    }

    pub const fn all() -> [LogLevel; 6] {
        [
            LogLevel::Off,
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Trace,
            LogLevel::All,
        ]
    }

    pub(crate) fn from_priority(priority: u8) -> Option<Self> {
        match priority {
            0 => Some(LogLevel::All),
            1 => Some(LogLevel::Trace),
            5 => Some(LogLevel::Info),
            7 => Some(LogLevel::Warn),
            8 => Some(LogLevel::Error),
            10 => Some(LogLevel::Off),
            _ => None,
        }
    }

    #[cfg(feature = "console")]
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            LogLevel::All | LogLevel::Trace => BrightBlack,
            LogLevel::Info => Green,
            LogLevel::Warn => Yellow,
            LogLevel::Error => Red,
            LogLevel::Off => BrightRed,
        }
    }
}

/// Free-function form of [`LogLevel::displays_with`].
#[inline]
pub fn is_displayed(candidate: LogLevel, threshold: Option<LogLevel>) -> bool {
    candidate.displays_with(threshold)
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ALL" => Ok(LogLevel::All),
            "TRACE" | "FINE" => Ok(LogLevel::Trace),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "OFF" | "NONE" => Ok(LogLevel::Off),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}
