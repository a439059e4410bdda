//! The machine registry: sole owner of every [`MachineState`].
//!
//! All reads and writes go through one [`tokio::sync::Mutex`]. Each mutation
//! clones the target machine, applies the transition to the copy, and
//! commits the copy only if the whole transition succeeded, so no caller
//! ever observes a half-applied update.
//!
//! Events are handed to the [`SnapshotNotifier`] after the lock is
//! released. Two concurrent mutations of the same machine may therefore
//! reach subscribers in the opposite order to their commits; each event
//! still carries the authoritative state as of its own commit.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::CoreError;
use crate::error_log::{ErrorRecord, ErrorReport};
use crate::heartbeat::SweepReport;
use crate::machine::{validate_machine_id, MachineState};
use crate::maintenance::{MaintenanceItem, MaintenanceRecord};
use crate::notifier::{MachineEvent, SnapshotNotifier};
use crate::snapshot::MachineSnapshot;
use crate::status::RunStatus;
use crate::types::{MachineId, Timestamp};

const ENTITY: &str = "Machine";

/// Thread-safe registry of machines; designed to be wrapped in `Arc` and
/// shared between request handlers and the heartbeat monitor.
pub struct MachineRegistry {
    machines: Mutex<BTreeMap<MachineId, MachineState>>,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn SnapshotNotifier>,
}

impl MachineRegistry {
    pub fn new(
        config: EngineConfig,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn SnapshotNotifier>,
    ) -> Self {
        Self {
            machines: Mutex::new(BTreeMap::new()),
            config,
            clock,
            notifier,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Apply a treatment status report, creating the machine if unknown.
    pub async fn report_status(
        &self,
        machine_id: &str,
        status: RunStatus,
    ) -> Result<MachineSnapshot, CoreError> {
        let machine_id = validate_machine_id(machine_id)?;
        self.upsert(machine_id, |machine, now, config| {
            machine.report_status(status, now, config)
        })
        .await
    }

    /// Apply a dialysis-pump status report, creating the machine if unknown.
    pub async fn report_pump_status(
        &self,
        machine_id: &str,
        status: RunStatus,
    ) -> Result<MachineSnapshot, CoreError> {
        let machine_id = validate_machine_id(machine_id)?;
        self.upsert(machine_id, |machine, now, config| {
            machine.report_pump_status(status, now, config)
        })
        .await
    }

    /// Append a device fault, creating the machine if unknown.
    pub async fn report_error(
        &self,
        machine_id: &str,
        report: ErrorReport,
    ) -> Result<MachineSnapshot, CoreError> {
        let machine_id = validate_machine_id(machine_id)?;
        report.validate()?;
        self.upsert(machine_id, move |machine, now, _| {
            machine.log_error(report, now);
            Ok(())
        })
        .await
    }

    /// Record a completed service action on a known machine.
    pub async fn acknowledge_maintenance(
        &self,
        machine_id: &str,
        item: MaintenanceItem,
    ) -> Result<MachineSnapshot, CoreError> {
        let machine_id = validate_machine_id(machine_id)?;
        let snapshot = {
            let mut machines = self.machines.lock().await;
            let now = self.clock.now();
            let machine = machines
                .get_mut(machine_id)
                .ok_or_else(|| not_found(machine_id))?;
            machine.acknowledge_maintenance(item, now);
            machine.snapshot(now, &self.config.maintenance_schedule)
        };
        self.notifier.notify(MachineEvent::Updated(snapshot.clone()));
        Ok(snapshot)
    }

    /// Remove a machine unconditionally.
    ///
    /// A machine deleted mid-session loses its open session time; the
    /// discarded amount is logged.
    pub async fn delete_machine(&self, machine_id: &str) -> Result<(), CoreError> {
        let machine_id = validate_machine_id(machine_id)?;
        {
            let mut machines = self.machines.lock().await;
            let now = self.clock.now();
            let removed = machines
                .remove(machine_id)
                .ok_or_else(|| not_found(machine_id))?;

            if removed.treatment().is_running() || removed.dialysis().is_running() {
                let session_secs = removed.treatment().live_duration(now).as_secs();
                let dialysis_secs = removed.dialysis().live_duration(now).as_secs();
                tracing::warn!(
                    machine_id,
                    discarded_session_secs = session_secs,
                    discarded_dialysis_secs = dialysis_secs,
                    "Deleted machine with an open session; partial time discarded"
                );
            }
        }
        tracing::info!(machine_id, "Machine deleted");
        self.notifier.notify(MachineEvent::Removed {
            machine_id: machine_id.to_string(),
        });
        Ok(())
    }

    /// Force every running machine with a stale heartbeat to stopped.
    ///
    /// A failure on one machine is logged and leaves that machine untouched;
    /// the rest of the pass still runs.
    pub async fn sweep_stale_heartbeats(&self) -> SweepReport {
        let mut report = SweepReport::default();
        let mut snapshots = Vec::new();
        {
            let mut machines = self.machines.lock().await;
            let now = self.clock.now();

            for (machine_id, machine) in machines.iter_mut() {
                if !machine.is_heartbeat_stale(now, &self.config) {
                    continue;
                }
                let mut working = machine.clone();
                match working.force_stop(now, &self.config) {
                    Ok(()) => {
                        let snapshot = working.snapshot(now, &self.config.maintenance_schedule);
                        snapshots.push(snapshot);
                        *machine = working;
                        report.stopped.push(machine_id.clone());
                    }
                    Err(e) => {
                        tracing::error!(
                            machine_id = %machine_id,
                            error = %e,
                            "Heartbeat sweep failed for machine"
                        );
                        report.failed.push(machine_id.clone());
                    }
                }
            }
        }
        for snapshot in snapshots {
            self.notifier.notify(MachineEvent::Updated(snapshot));
        }
        report
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Snapshot every machine, ordered by id, with live durations and
    /// freshly computed maintenance.
    pub async fn list_snapshots(&self) -> Vec<MachineSnapshot> {
        let machines = self.machines.lock().await;
        let now = self.clock.now();
        machines
            .values()
            .map(|machine| machine.snapshot(now, &self.config.maintenance_schedule))
            .collect()
    }

    pub async fn snapshot(&self, machine_id: &str) -> Result<MachineSnapshot, CoreError> {
        let machine_id = validate_machine_id(machine_id)?;
        let machines = self.machines.lock().await;
        let now = self.clock.now();
        machines
            .get(machine_id)
            .map(|machine| machine.snapshot(now, &self.config.maintenance_schedule))
            .ok_or_else(|| not_found(machine_id))
    }

    /// Recent fault records for a machine, oldest first.
    pub async fn error_history(&self, machine_id: &str) -> Result<Vec<ErrorRecord>, CoreError> {
        let machine_id = validate_machine_id(machine_id)?;
        let machines = self.machines.lock().await;
        machines
            .get(machine_id)
            .map(MachineState::error_history)
            .ok_or_else(|| not_found(machine_id))
    }

    pub async fn maintenance_history(
        &self,
        machine_id: &str,
    ) -> Result<Vec<MaintenanceRecord>, CoreError> {
        let machine_id = validate_machine_id(machine_id)?;
        let machines = self.machines.lock().await;
        machines
            .get(machine_id)
            .map(|machine| machine.maintenance_history().to_vec())
            .ok_or_else(|| not_found(machine_id))
    }

    pub async fn machine_count(&self) -> usize {
        self.machines.lock().await.len()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Apply `op` to a copy of the machine (a fresh one if unknown), commit
    /// on success, then notify.
    async fn upsert<F>(&self, machine_id: &str, op: F) -> Result<MachineSnapshot, CoreError>
    where
        F: FnOnce(&mut MachineState, Timestamp, &EngineConfig) -> Result<(), CoreError>,
    {
        let snapshot = {
            let mut machines = self.machines.lock().await;
            let now = self.clock.now();

            let existing = machines.get(machine_id);
            let created = existing.is_none();
            let mut working = existing
                .cloned()
                .unwrap_or_else(|| MachineState::new(machine_id, now));

            if let Err(e) = op(&mut working, now, &self.config) {
                tracing::error!(machine_id, error = %e, "Machine update aborted");
                return Err(e);
            }

            let snapshot = working.snapshot(now, &self.config.maintenance_schedule);
            machines.insert(machine_id.to_string(), working);
            if created {
                tracing::info!(machine_id, "Registered new machine");
            }
            snapshot
        };
        self.notifier.notify(MachineEvent::Updated(snapshot.clone()));
        Ok(snapshot)
    }
}

fn not_found(machine_id: &str) -> CoreError {
    CoreError::NotFound {
        entity: ENTITY,
        id: machine_id.to_string(),
    }
}
