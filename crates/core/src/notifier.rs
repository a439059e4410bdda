//! Outbound notification seam.
//!
//! The registry hands every post-mutation state to a [`SnapshotNotifier`]
//! after releasing its lock. Delivery (broadcast channel, WebSocket push)
//! lives outside the core.

use serde::Serialize;

use crate::snapshot::MachineSnapshot;
use crate::types::MachineId;

/// A change to the set of tracked machines.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum MachineEvent {
    /// A machine was created or mutated; carries its new state.
    #[serde(rename = "machine_update")]
    Updated(MachineSnapshot),
    /// A machine was deleted.
    #[serde(rename = "machine_removed")]
    Removed { machine_id: MachineId },
}

impl MachineEvent {
    pub fn machine_id(&self) -> &str {
        match self {
            Self::Updated(snapshot) => &snapshot.machine_id,
            Self::Removed { machine_id } => machine_id,
        }
    }
}

/// Receiver of machine events. Must not block.
pub trait SnapshotNotifier: Send + Sync {
    fn notify(&self, event: MachineEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl SnapshotNotifier for NoopNotifier {
    fn notify(&self, _event: MachineEvent) {}
}
