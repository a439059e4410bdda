use std::time::Duration;

use hemowatch_core::config::EngineConfig;
use hemowatch_core::heartbeat::{HEARTBEAT_CHECK_INTERVAL_SECS, HEARTBEAT_TIMEOUT_SECS};
use hemowatch_core::maintenance::MaintenanceSchedule;
use hemowatch_core::session::{MIN_DIALYSIS_DURATION_SECS, MIN_TREATMENT_DURATION_SECS};

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Tunables handed to the machine registry and heartbeat monitor.
    pub engine: EngineConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default                        |
    /// |---------------------------------|--------------------------------|
    /// | `HOST`                          | `0.0.0.0`                      |
    /// | `PORT`                          | `5000`                         |
    /// | `CORS_ORIGINS`                  | `http://localhost:5173`        |
    /// | `REQUEST_TIMEOUT_SECS`          | `30`                           |
    /// | `HEARTBEAT_TIMEOUT_SECS`        | `90`                           |
    /// | `HEARTBEAT_SWEEP_INTERVAL_SECS` | `5`                            |
    /// | `MIN_TREATMENT_DURATION_SECS`   | `60`                           |
    /// | `MIN_DIALYSIS_DURATION_SECS`    | `60`                           |
    /// | `MAINTENANCE_THRESHOLDS`        | `filter_inlet=5,seal_ring=10`  |
    ///
    /// Panics on malformed values so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());

        let port: u16 = lookup("PORT")
            .unwrap_or_else(|| "5000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = secs_var(&lookup, "REQUEST_TIMEOUT_SECS", 30);

        let heartbeat_timeout = secs_var(&lookup, "HEARTBEAT_TIMEOUT_SECS", HEARTBEAT_TIMEOUT_SECS);
        let sweep_interval = secs_var(
            &lookup,
            "HEARTBEAT_SWEEP_INTERVAL_SECS",
            HEARTBEAT_CHECK_INTERVAL_SECS,
        );
        assert!(
            sweep_interval > 0,
            "HEARTBEAT_SWEEP_INTERVAL_SECS must be greater than zero"
        );
        let min_treatment = secs_var(
            &lookup,
            "MIN_TREATMENT_DURATION_SECS",
            MIN_TREATMENT_DURATION_SECS,
        );
        let min_dialysis = secs_var(
            &lookup,
            "MIN_DIALYSIS_DURATION_SECS",
            MIN_DIALYSIS_DURATION_SECS,
        );

        let maintenance_schedule = match lookup("MAINTENANCE_THRESHOLDS") {
            Some(list) => MaintenanceSchedule::parse(&list)
                .unwrap_or_else(|e| panic!("MAINTENANCE_THRESHOLDS is invalid: {e}")),
            None => MaintenanceSchedule::default(),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            engine: EngineConfig {
                min_treatment_duration: Duration::from_secs(min_treatment),
                min_dialysis_duration: Duration::from_secs(min_dialysis),
                heartbeat_timeout: Duration::from_secs(heartbeat_timeout),
                sweep_interval: Duration::from_secs(sweep_interval),
                maintenance_schedule,
            },
        }
    }
}

fn secs_var(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> u64 {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a valid u64")),
        None => default,
    }
}
