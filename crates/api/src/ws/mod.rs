//! WebSocket infrastructure for live dashboard updates.
//!
//! Provides connection management, keep-alive pings, and the HTTP upgrade
//! handler. Machine events reach clients through
//! [`LiveUpdateForwarder`](crate::notifications::LiveUpdateForwarder).

mod handler;
mod heartbeat;
pub mod manager;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
