//! Severity levels carried by remote log entries.
//!
//! Servers report levels using log4net-style names, so parsing accepts the
//! common aliases (`WARNING`, `FATAL`) alongside the canonical spellings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Critical,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        };
        f.write_str(s)
    }
}

/// Returned when a level name is not recognised.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level: {0}")]
pub struct UnknownLevel(pub String);

impl FromStr for Level {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRACE" | "VERBOSE" | "FINEST" => Ok(Self::Trace),
            "DEBUG" | "FINE" => Ok(Self::Debug),
            "INFO" | "NOTICE" => Ok(Self::Info),
            "WARN" | "WARNING" => Ok(Self::Warn),
            "ERROR" | "SEVERE" => Ok(Self::Error),
            "CRITICAL" | "FATAL" | "EMERGENCY" => Ok(Self::Critical),
            _ => Err(UnknownLevel(s.to_owned())),
        }
    }
}

impl Level {
    /// Parse `s`, falling back to [`Level::Info`] for unknown names.
    pub fn parse_or_info(s: &str) -> Self {
        s.parse().unwrap_or(Self::Info)
    }

    /// Map onto the `log` facade. `Critical` collapses into `Error`.
    pub fn to_log_level(self) -> log::Level {
        match self {
            Level::Trace => log::Level::Trace,
            Level::Debug => log::Level::Debug,
            Level::Info => log::Level::Info,
            Level::Warn => log::Level::Warn,
            Level::Error | Level::Critical => log::Level::Error,
        }
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// Servers occasionally invent their own level names; keep the entry rather
// than failing the whole payload.
impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Level::parse_or_info(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("warning", Level::Warn)]
    #[case("FATAL", Level::Critical)]
    #[case(" debug ", Level::Debug)]
    #[case("Error", Level::Error)]
    fn parses_aliases(#[case] input: &str, #[case] expected: Level) {
        assert_eq!(input.parse::<Level>(), Ok(expected));
    }

    #[rstest]
    fn unknown_level_is_reported() {
        let err = "LOUD".parse::<Level>().expect_err("LOUD is not a level");
        assert_eq!(err, UnknownLevel("LOUD".into()));
        assert_eq!(Level::parse_or_info("LOUD"), Level::Info);
    }

    #[rstest]
    fn critical_maps_to_log_error() {
        assert_eq!(Level::Critical.to_log_level(), log::Level::Error);
        assert_eq!(Level::Trace.to_log_level(), log::Level::Trace);
    }
}
