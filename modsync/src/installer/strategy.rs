//! Transfer scheduling strategies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How pending files are scheduled during an install.
///
/// Both strategies share the same transfer machinery; they differ only in how
/// many transfers may be in flight at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// One file at a time, in manifest order.
    Queue,
    /// Every pending file at once.
    #[default]
    Parallel,
}

impl Strategy {
    /// Maximum number of transfers in flight.
    pub fn max_in_flight(self) -> usize {
        match self {
            Self::Queue => 1,
            Self::Parallel => usize::MAX,
        }
    }

    /// Lowercase name used in configuration files and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queue => "queue",
            Self::Parallel => "parallel",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown strategy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown strategy '{0}' (expected 'queue' or 'parallel')")]
pub struct ParseStrategyError(String);

impl FromStr for Strategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "queue" | "sequential" => Ok(Self::Queue),
            "parallel" => Ok(Self::Parallel),
            other => Err(ParseStrategyError(other.to_string())),
        }
    }
}
