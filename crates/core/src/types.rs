/// Machine identifiers are opaque strings assigned by the device firmware
/// (e.g. `HD_999`).
pub type MachineId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
