//! Engine tunables.
//!
//! The core never reads the environment; the API crate builds an
//! [`EngineConfig`] from env vars and hands it to the registry.

use std::time::Duration;

use crate::heartbeat::{HEARTBEAT_CHECK_INTERVAL_SECS, HEARTBEAT_TIMEOUT_SECS};
use crate::maintenance::MaintenanceSchedule;
use crate::session::{MIN_DIALYSIS_DURATION_SECS, MIN_TREATMENT_DURATION_SECS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Treatment sessions shorter than this are not counted as completed.
    pub min_treatment_duration: Duration,
    /// Dialysis sessions shorter than this are not counted as completed.
    pub min_dialysis_duration: Duration,
    /// Running machines silent for longer than this are forced to stopped.
    pub heartbeat_timeout: Duration,
    /// Period of the heartbeat sweep.
    pub sweep_interval: Duration,
    pub maintenance_schedule: MaintenanceSchedule,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_treatment_duration: Duration::from_secs(MIN_TREATMENT_DURATION_SECS),
            min_dialysis_duration: Duration::from_secs(MIN_DIALYSIS_DURATION_SECS),
            heartbeat_timeout: Duration::from_secs(HEARTBEAT_TIMEOUT_SECS),
            sweep_interval: Duration::from_secs(HEARTBEAT_CHECK_INTERVAL_SECS),
            maintenance_schedule: MaintenanceSchedule::default(),
        }
    }
}
