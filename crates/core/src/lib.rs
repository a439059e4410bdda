//! Hemowatch domain core.
//!
//! Session and maintenance state engine for networked dialysis machines.
//! Everything in this crate is transport-agnostic: callers hand in parsed
//! status reports and receive [`snapshot::MachineSnapshot`] values back.
//!
//! - [`session`]: the Stopped/Running sub-machine shared by the treatment
//!   and dialysis-pump sessions.
//! - [`maintenance`]: threshold-based maintenance-due calculation.
//! - [`error_log`]: bounded ring of recent device faults.
//! - [`heartbeat`]: liveness predicate used by the periodic sweep.
//! - [`machine`]: per-device state and its transitions.
//! - [`registry`]: the locked owner of every machine; the only mutation
//!   surface exposed to the outside world.

pub mod clock;
pub mod config;
pub mod error;
pub mod error_log;
pub mod heartbeat;
pub mod machine;
pub mod maintenance;
pub mod notifier;
pub mod registry;
pub mod session;
pub mod snapshot;
pub mod status;
pub mod types;
