//! Bounded log of recent device faults.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Number of fault records retained per machine; older records are evicted.
pub const ERROR_HISTORY_CAPACITY: usize = 50;

/// Fault code as reported by the device firmware.
///
/// Older firmware sends integers, newer firmware sends vendor strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Numeric(i64),
    Text(String),
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(code) => write!(f, "{code}"),
            Self::Text(code) => f.write_str(code),
        }
    }
}

/// A fault report before it is stamped and stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub error_code: ErrorCode,
    pub error_type: Option<String>,
    /// Device-side occurrence time; defaults to the receive time.
    pub occurred_at: Option<Timestamp>,
}

impl ErrorReport {
    pub fn new(error_code: ErrorCode) -> Self {
        Self {
            error_code,
            error_type: None,
            occurred_at: None,
        }
    }

    pub fn with_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = Some(error_type.into());
        self
    }

    pub fn with_occurred_at(mut self, occurred_at: Timestamp) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    /// Reject blank text codes.
    pub fn validate(&self) -> Result<(), CoreError> {
        if let ErrorCode::Text(code) = &self.error_code {
            if code.trim().is_empty() {
                return Err(CoreError::InvalidArgument(
                    "error_code must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Stamp the report with its receive time.
    pub fn into_record(self, received_at: Timestamp) -> ErrorRecord {
        ErrorRecord {
            error_code: self.error_code,
            error_type: self.error_type,
            occurred_at: self.occurred_at.unwrap_or(received_at),
            received_at,
        }
    }
}

/// A stored fault record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub error_code: ErrorCode,
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    pub occurred_at: Timestamp,
    pub received_at: Timestamp,
}

/// Append-only ring of the most recent [`ERROR_HISTORY_CAPACITY`] fault
/// records, oldest first.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    records: VecDeque<ErrorRecord>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self {
            records: VecDeque::with_capacity(ERROR_HISTORY_CAPACITY),
        }
    }

    /// Append a record, returning the evicted oldest record when full.
    pub fn push(&mut self, record: ErrorRecord) -> Option<ErrorRecord> {
        let evicted = if self.records.len() == ERROR_HISTORY_CAPACITY {
            self.records.pop_front()
        } else {
            None
        };
        self.records.push_back(record);
        evicted
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in arrival order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ErrorRecord> {
        self.records.iter()
    }

    pub fn to_vec(&self) -> Vec<ErrorRecord> {
        self.records.iter().cloned().collect()
    }
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::new()
    }
}
