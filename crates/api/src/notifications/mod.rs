//! Delivery of machine events to dashboard clients.
//!
//! The [`LiveUpdateForwarder`] subscribes to the machine event bus and
//! pushes every event to all connected WebSocket clients.

pub mod forwarder;

pub use forwarder::LiveUpdateForwarder;
