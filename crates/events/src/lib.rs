//! Hemowatch machine event bus.
//!
//! - [`MachineEventBus`] is the in-process publish/subscribe hub for
//!   [`MachineEvent`]s, backed by `tokio::sync::broadcast`. It implements the
//!   core's [`SnapshotNotifier`](hemowatch_core::notifier::SnapshotNotifier)
//!   seam so the registry can publish without knowing about subscribers.

pub mod bus;

pub use bus::{MachineEventBus, DEFAULT_CAPACITY};
pub use hemowatch_core::notifier::MachineEvent;
