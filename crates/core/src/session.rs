//! Session tracking for the treatment and dialysis-pump sub-machines.
//!
//! Both sub-machines share one shape: a Stopped/Running status, the start
//! of the open session, an accumulated active time, and a counter of
//! completed sessions. A session only counts as completed when its closing
//! duration reaches the minimum-duration gate; shorter sessions still add
//! to the accumulated time. The gate filters out flapping heartbeats and
//! transient restarts.

use std::time::Duration;

use crate::error::CoreError;
use crate::status::RunStatus;
use crate::types::Timestamp;

/// Minimum treatment session length (seconds) for it to count as completed.
pub const MIN_TREATMENT_DURATION_SECS: u64 = 60;

/// Minimum dialysis-pump session length (seconds) for it to count as completed.
pub const MIN_DIALYSIS_DURATION_SECS: u64 = 60;

/// Result of closing a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosedSession {
    /// Length of the session that was closed.
    pub duration: Duration,
    /// Whether the session met the minimum duration and was counted.
    pub counted: bool,
}

/// What a status report did to a sub-machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Stopped -> Running: a new session opened.
    Started,
    /// Running -> Running: session still open; `elapsed` is report-only.
    Continued { elapsed: Duration },
    /// Running -> Stopped: the session was closed and accounted.
    Closed(ClosedSession),
    /// Stopped -> Stopped.
    Unchanged,
}

/// One Stopped/Running sub-machine with its accumulators.
///
/// `started_at` is `Some` exactly when `status` is `Running`; the fields are
/// private so only the transitions below can change them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionTracker {
    status: RunStatus,
    started_at: Option<Timestamp>,
    total_time: Duration,
    completed: u64,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status.is_running()
    }

    /// Start of the currently open session, if any.
    pub fn started_at(&self) -> Option<Timestamp> {
        self.started_at
    }

    /// Accumulated length of every closed session.
    pub fn total_time(&self) -> Duration {
        self.total_time
    }

    /// Number of closed sessions that met the minimum duration.
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Apply an incoming status report.
    ///
    /// Returns an `Internal` error (leaving `self` untouched) if `now` lies
    /// before the start of the open session.
    pub fn apply(
        &mut self,
        status: RunStatus,
        now: Timestamp,
        min_duration: Duration,
    ) -> Result<Transition, CoreError> {
        match (status, self.started_at) {
            (RunStatus::Running, None) => {
                self.status = RunStatus::Running;
                self.started_at = Some(now);
                Ok(Transition::Started)
            }
            (RunStatus::Running, Some(start)) => Ok(Transition::Continued {
                elapsed: elapsed_between(start, now)?,
            }),
            (RunStatus::Stopped, Some(_)) => {
                let closed = self.close(now, min_duration)?;
                Ok(closed.map_or(Transition::Unchanged, Transition::Closed))
            }
            (RunStatus::Stopped, None) => Ok(Transition::Unchanged),
        }
    }

    /// Close the open session, if there is one.
    ///
    /// Adds the session length to the accumulated time and bumps the
    /// completed counter when `duration >= min_duration`. Returns `None`
    /// when the sub-machine was already stopped.
    pub fn close(
        &mut self,
        now: Timestamp,
        min_duration: Duration,
    ) -> Result<Option<ClosedSession>, CoreError> {
        let Some(start) = self.started_at else {
            return Ok(None);
        };
        let duration = elapsed_between(start, now)?;
        let counted = duration >= min_duration;

        self.total_time += duration;
        if counted {
            self.completed += 1;
        }
        self.started_at = None;
        self.status = RunStatus::Stopped;

        Ok(Some(ClosedSession { duration, counted }))
    }

    /// Length of the open session at `now`, or zero when stopped.
    ///
    /// Read-only; a clock that moved backwards reports zero rather than
    /// failing the read.
    pub fn live_duration(&self, now: Timestamp) -> Duration {
        self.started_at
            .and_then(|start| (now - start).to_std().ok())
            .unwrap_or_default()
    }
}

/// Elapsed time from `start` to `now`.
fn elapsed_between(start: Timestamp, now: Timestamp) -> Result<Duration, CoreError> {
    (now - start).to_std().map_err(|_| {
        CoreError::Internal(format!(
            "Clock moved backwards: session started at {start}, current time {now}"
        ))
    })
}
