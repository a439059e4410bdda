//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`MachineEventBus`] is shared via `Arc<MachineEventBus>`: the registry
//! publishes into it and any number of consumers (the WebSocket forwarder,
//! tests) subscribe.

use hemowatch_core::notifier::{MachineEvent, SnapshotNotifier};
use tokio::sync::broadcast;

/// Default buffer capacity for the broadcast channel.
pub const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out bus for machine events.
///
/// # Usage
///
/// ```rust
/// use hemowatch_events::{MachineEvent, MachineEventBus};
///
/// let bus = MachineEventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(MachineEvent::Removed { machine_id: "HD_001".into() });
/// ```
pub struct MachineEventBus {
    sender: broadcast::Sender<MachineEvent>,
}

impl MachineEventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest unread events are dropped and slow
    /// receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With no subscribers the event is dropped.
    pub fn publish(&self, event: MachineEvent) {
        match self.sender.send(event) {
            Ok(receivers) => {
                tracing::trace!(receivers, "Machine event published");
            }
            Err(broadcast::error::SendError(event)) => {
                tracing::trace!(
                    machine_id = event.machine_id(),
                    "Machine event dropped, no subscribers"
                );
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MachineEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for MachineEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl SnapshotNotifier for MachineEventBus {
    fn notify(&self, event: MachineEvent) {
        self.publish(event);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
