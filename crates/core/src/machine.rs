//! Per-machine state and its transitions.
//!
//! [`MachineState`] methods may leave the state half-updated when they
//! return an error; [`crate::registry::MachineRegistry`] therefore applies
//! them to a working copy and commits only on success.

use crate::config::EngineConfig;
use crate::error::CoreError;
use crate::error_log::{ErrorLog, ErrorRecord, ErrorReport};
use crate::heartbeat::is_heartbeat_stale;
use crate::maintenance::{
    required_maintenance, MaintenanceItem, MaintenanceRecord, MaintenanceRequirement,
    MaintenanceSchedule,
};
use crate::session::{ClosedSession, SessionTracker, Transition};
use crate::snapshot::{secs, MachineSnapshot};
use crate::status::RunStatus;
use crate::types::{MachineId, Timestamp};

/// Reject a missing (empty or whitespace-only) machine identifier. Any other
/// string is used verbatim as the key.
pub fn validate_machine_id(machine_id: &str) -> Result<&str, CoreError> {
    if machine_id.trim().is_empty() {
        return Err(CoreError::InvalidArgument("machine_id is required".to_string()));
    }
    Ok(machine_id)
}

/// Everything tracked for one device.
#[derive(Debug, Clone)]
pub struct MachineState {
    id: MachineId,
    treatment: SessionTracker,
    dialysis: SessionTracker,
    first_started_at: Option<Timestamp>,
    last_heartbeat: Timestamp,
    last_update: Timestamp,
    errors: ErrorLog,
    maintenance_history: Vec<MaintenanceRecord>,
}

impl MachineState {
    /// A freshly seen machine: both sub-machines stopped, all counters zero.
    pub fn new(id: impl Into<MachineId>, now: Timestamp) -> Self {
        Self {
            id: id.into(),
            treatment: SessionTracker::new(),
            dialysis: SessionTracker::new(),
            first_started_at: None,
            last_heartbeat: now,
            last_update: now,
            errors: ErrorLog::new(),
            maintenance_history: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn treatment(&self) -> &SessionTracker {
        &self.treatment
    }

    pub fn dialysis(&self) -> &SessionTracker {
        &self.dialysis
    }

    pub fn first_started_at(&self) -> Option<Timestamp> {
        self.first_started_at
    }

    pub fn last_heartbeat(&self) -> Timestamp {
        self.last_heartbeat
    }

    pub fn last_update(&self) -> Timestamp {
        self.last_update
    }

    pub fn errors(&self) -> &ErrorLog {
        &self.errors
    }

    pub fn maintenance_history(&self) -> &[MaintenanceRecord] {
        &self.maintenance_history
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Apply a treatment status report (the device heartbeat).
    ///
    /// A `stopped` report also closes a running pump session. A `stopped`
    /// report with nothing running only refreshes `last_update`.
    pub fn report_status(
        &mut self,
        status: RunStatus,
        now: Timestamp,
        config: &EngineConfig,
    ) -> Result<(), CoreError> {
        if status == RunStatus::Stopped
            && !self.treatment.is_running()
            && !self.dialysis.is_running()
        {
            self.last_update = now;
            return Ok(());
        }

        let transition = self
            .treatment
            .apply(status, now, config.min_treatment_duration)?;
        self.last_heartbeat = now;
        self.last_update = now;

        match transition {
            Transition::Started => {
                if self.first_started_at.is_none() {
                    self.first_started_at = Some(now);
                }
                tracing::info!(machine_id = %self.id, "Treatment session started");
            }
            Transition::Continued { elapsed } => {
                tracing::trace!(
                    machine_id = %self.id,
                    elapsed_secs = elapsed.as_secs(),
                    "Treatment heartbeat"
                );
            }
            Transition::Closed(closed) => self.log_treatment_closed(closed),
            Transition::Unchanged => {}
        }

        if status == RunStatus::Stopped {
            self.close_dialysis(now, config)?;
        }
        Ok(())
    }

    /// Apply a dialysis-pump status report.
    pub fn report_pump_status(
        &mut self,
        status: RunStatus,
        now: Timestamp,
        config: &EngineConfig,
    ) -> Result<(), CoreError> {
        let transition = self
            .dialysis
            .apply(status, now, config.min_dialysis_duration)?;
        self.last_update = now;

        match transition {
            Transition::Started => {
                tracing::info!(machine_id = %self.id, "Dialysis pump session started");
            }
            Transition::Closed(closed) => self.log_dialysis_closed(closed),
            Transition::Continued { .. } | Transition::Unchanged => {}
        }
        Ok(())
    }

    /// Close the dialysis-pump session if one is open.
    ///
    /// Shared by explicit pump stops, treatment stops and the heartbeat sweep.
    pub fn close_dialysis(
        &mut self,
        now: Timestamp,
        config: &EngineConfig,
    ) -> Result<Option<ClosedSession>, CoreError> {
        let closed = self.dialysis.close(now, config.min_dialysis_duration)?;
        if let Some(closed) = closed {
            self.log_dialysis_closed(closed);
        }
        Ok(closed)
    }

    /// Force the machine to stopped after a missed heartbeat.
    ///
    /// Performs the same accounting as an explicit `stopped` report but
    /// leaves `last_heartbeat` and `last_update` as they were, since no
    /// report actually arrived.
    pub fn force_stop(&mut self, now: Timestamp, config: &EngineConfig) -> Result<(), CoreError> {
        if let Some(closed) = self.treatment.close(now, config.min_treatment_duration)? {
            self.log_treatment_closed(closed);
        }
        self.close_dialysis(now, config)?;
        tracing::warn!(
            machine_id = %self.id,
            last_heartbeat = %self.last_heartbeat,
            "Machine marked as stopped due to heartbeat timeout"
        );
        Ok(())
    }

    /// Append a fault record, evicting the oldest beyond capacity.
    pub fn log_error(&mut self, report: ErrorReport, now: Timestamp) {
        let record = report.into_record(now);
        tracing::info!(
            machine_id = %self.id,
            error_code = %record.error_code,
            error_type = record.error_type.as_deref().unwrap_or("-"),
            "Device error logged"
        );
        if let Some(evicted) = self.errors.push(record) {
            tracing::debug!(
                machine_id = %self.id,
                error_code = %evicted.error_code,
                "Oldest error record evicted"
            );
        }
        self.last_update = now;
    }

    /// Record that `item` was serviced at the current treatment count.
    pub fn acknowledge_maintenance(&mut self, item: MaintenanceItem, now: Timestamp) {
        let record = MaintenanceRecord {
            item,
            treatment_count_at_service: self.treatment.completed(),
            performed_at: now,
        };
        tracing::info!(
            machine_id = %self.id,
            item = %record.item,
            treatment_count = record.treatment_count_at_service,
            "Maintenance marked as done"
        );
        self.maintenance_history.push(record);
    }

    // -----------------------------------------------------------------------
    // Derived views
    // -----------------------------------------------------------------------

    pub fn is_heartbeat_stale(&self, now: Timestamp, config: &EngineConfig) -> bool {
        is_heartbeat_stale(
            self.treatment.status(),
            self.last_heartbeat,
            now,
            config.heartbeat_timeout,
        )
    }

    pub fn required_maintenance(
        &self,
        schedule: &MaintenanceSchedule,
    ) -> Vec<MaintenanceRequirement> {
        required_maintenance(
            self.treatment.completed(),
            &self.maintenance_history,
            schedule,
        )
    }

    pub fn error_history(&self) -> Vec<ErrorRecord> {
        self.errors.to_vec()
    }

    /// Build the transport view, with live durations measured at `now` and
    /// maintenance recomputed from the current counters.
    pub fn snapshot(&self, now: Timestamp, schedule: &MaintenanceSchedule) -> MachineSnapshot {
        let maintenance_required = self.required_maintenance(schedule);
        MachineSnapshot {
            machine_id: self.id.clone(),
            status: self.treatment.status(),
            last_update: self.last_update,
            last_heartbeat: self.last_heartbeat,
            first_started_at: self.first_started_at,
            total_active_time: secs(self.treatment.total_time()),
            current_session_duration: secs(self.treatment.live_duration(now)),
            completed_treatments: self.treatment.completed(),
            error_count: self.errors.len(),
            maintenance_count: maintenance_required.len(),
            maintenance_required,
            pump_status: self.dialysis.status(),
            total_dialysis_time: secs(self.dialysis.total_time()),
            current_dialysis_duration: secs(self.dialysis.live_duration(now)),
            completed_dialysis: self.dialysis.completed(),
        }
    }

    fn log_treatment_closed(&self, closed: ClosedSession) {
        if closed.counted {
            tracing::info!(
                machine_id = %self.id,
                completed = self.treatment.completed(),
                duration_secs = closed.duration.as_secs(),
                "Treatment completed"
            );
        } else {
            tracing::info!(
                machine_id = %self.id,
                duration_secs = closed.duration.as_secs(),
                "Treatment stopped below minimum duration"
            );
        }
    }

    fn log_dialysis_closed(&self, closed: ClosedSession) {
        if closed.counted {
            tracing::info!(
                machine_id = %self.id,
                completed = self.dialysis.completed(),
                duration_secs = closed.duration.as_secs(),
                "Dialysis completed"
            );
        } else {
            tracing::info!(
                machine_id = %self.id,
                duration_secs = closed.duration.as_secs(),
                "Dialysis pump stopped below minimum duration"
            );
        }
    }
}
