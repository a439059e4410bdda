//! Heartbeat liveness rules.
//!
//! A running machine that has not reported for longer than the heartbeat
//! timeout is presumed stopped. Stopped machines are never considered
//! stale, whatever the age of their last heartbeat.

use std::time::Duration;

use crate::status::RunStatus;
use crate::types::{MachineId, Timestamp};

/// If a running machine has not sent a heartbeat within this many seconds,
/// it is forced into the stopped state.
pub const HEARTBEAT_TIMEOUT_SECS: u64 = 90;

/// How often the heartbeat monitor sweeps for stale machines.
pub const HEARTBEAT_CHECK_INTERVAL_SECS: u64 = 5;

/// Whether a machine in `status` with the given last heartbeat is stale.
///
/// The comparison is strict: a heartbeat exactly `timeout` old is still live.
pub fn is_heartbeat_stale(
    status: RunStatus,
    last_heartbeat: Timestamp,
    now: Timestamp,
    timeout: Duration,
) -> bool {
    if !status.is_running() {
        return false;
    }
    (now - last_heartbeat)
        .to_std()
        .is_ok_and(|age| age > timeout)
}

/// Outcome of one heartbeat sweep pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// Machines forced to stopped during this pass.
    pub stopped: Vec<MachineId>,
    /// Machines whose forced stop failed; their state is unchanged.
    pub failed: Vec<MachineId>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.stopped.is_empty() && self.failed.is_empty()
    }
}
