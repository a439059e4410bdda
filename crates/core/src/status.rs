//! Run status shared by the treatment and dialysis-pump sub-machines.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Wire value for a running treatment or pump.
pub const STATUS_RUNNING: &str = "running";
/// Wire value for a stopped treatment or pump.
pub const STATUS_STOPPED: &str = "stopped";

/// All valid status values.
pub const VALID_STATUSES: &[&str] = &[STATUS_RUNNING, STATUS_STOPPED];

/// Two-state status of a session sub-machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Stopped,
    Running,
}

impl RunStatus {
    /// Return the wire string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => STATUS_STOPPED,
            Self::Running => STATUS_RUNNING,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl FromStr for RunStatus {
    type Err = CoreError;

    /// Parse from the wire string, rejecting anything that is not an exact
    /// match for one of [`VALID_STATUSES`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            STATUS_RUNNING => Ok(Self::Running),
            STATUS_STOPPED => Ok(Self::Stopped),
            other => Err(CoreError::InvalidArgument(format!(
                "Unknown status: '{other}'. Valid statuses: {}",
                VALID_STATUSES.join(", ")
            ))),
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parses_known_statuses() {
        assert_eq!("running".parse::<RunStatus>().unwrap(), RunStatus::Running);
        assert_eq!("stopped".parse::<RunStatus>().unwrap(), RunStatus::Stopped);
    }

    #[test]
    fn rejects_unknown_status() {
        assert_matches!(
            "paused".parse::<RunStatus>(),
            Err(CoreError::InvalidArgument(msg)) if msg.contains("paused")
        );
    }

    #[test]
    fn parsing_is_case_sensitive() {
        assert!("Running".parse::<RunStatus>().is_err());
    }

    #[test]
    fn default_is_stopped() {
        assert_eq!(RunStatus::default(), RunStatus::Stopped);
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&RunStatus::Running).unwrap();
        assert_eq!(json, "\"running\"");
    }
}
