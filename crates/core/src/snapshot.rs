//! Flattened, transport-ready view of one machine.

use std::time::Duration;

use serde::Serialize;

use crate::maintenance::MaintenanceRequirement;
use crate::status::RunStatus;
use crate::types::{MachineId, Timestamp};

/// Point-in-time state of a machine as handed to notification and the API.
///
/// Durations are in fractional seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineSnapshot {
    pub machine_id: MachineId,
    pub status: RunStatus,
    pub last_update: Timestamp,
    pub last_heartbeat: Timestamp,
    /// When the machine first ever started a treatment.
    pub first_started_at: Option<Timestamp>,
    pub total_active_time: f64,
    pub current_session_duration: f64,
    pub completed_treatments: u64,
    pub error_count: usize,
    pub maintenance_required: Vec<MaintenanceRequirement>,
    pub maintenance_count: usize,
    pub pump_status: RunStatus,
    pub total_dialysis_time: f64,
    pub current_dialysis_duration: f64,
    pub completed_dialysis: u64,
}

pub(crate) fn secs(duration: Duration) -> f64 {
    duration.as_secs_f64()
}
