//! Settings types.
//!
//! Every struct uses `#[serde(rename_all = "camelCase", default)]` so a settings file only
//! needs to name the keys it changes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Upper bound for `server.queueCapacity`.
pub const MAX_QUEUE_CAPACITY: usize = 10_000;
/// Lower bound for `publisher.intervalMs`.
pub const MIN_INTERVAL_MS: u64 = 100;
/// Upper bound for `publisher.intervalMs`.
pub const MAX_INTERVAL_MS: u64 = 3_600_000;

/// Root settings object.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SysfeedSettings {
    /// Listener and subscriber settings.
    pub server: ServerSettings,
    /// Publication cadence.
    pub publisher: PublisherSettings,
    /// Log output.
    pub logging: LoggingSettings,
    /// Host sampling.
    pub hardware: HardwareSettings,
}

impl SysfeedSettings {
    /// Check cross-field ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.server.queue_capacity == 0 || self.server.queue_capacity > MAX_QUEUE_CAPACITY {
            return Err(SettingsError::InvalidValue(format!(
                "server.queueCapacity must be between 1 and {MAX_QUEUE_CAPACITY}, got {}",
                self.server.queue_capacity
            )));
        }
        if !(MIN_INTERVAL_MS..=MAX_INTERVAL_MS).contains(&self.publisher.interval_ms) {
            return Err(SettingsError::InvalidValue(format!(
                "publisher.intervalMs must be between {MIN_INTERVAL_MS} and {MAX_INTERVAL_MS}, got {}",
                self.publisher.interval_ms
            )));
        }
        if self.server.host.trim().is_empty() {
            return Err(SettingsError::InvalidValue(
                "server.host must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Server network settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Listen port. `0` picks an ephemeral port.
    pub port: u16,
    /// Directory served at `/`. `None` disables static files.
    pub static_dir: Option<String>,
    /// Per-subscriber outbound queue bound.
    pub queue_capacity: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            static_dir: Some("./htmx".to_string()),
            queue_capacity: 10,
        }
    }
}

/// Publication driver settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PublisherSettings {
    /// Tick interval in milliseconds.
    pub interval_ms: u64,
}

impl Default for PublisherSettings {
    fn default() -> Self {
        Self { interval_ms: 5_000 }
    }
}

/// Logging settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default level (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
    /// Per-target level overrides, e.g. `{"tower_http": "debug"}`.
    pub module_levels: HashMap<String, String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            module_levels: HashMap::new(),
        }
    }
}

/// Host sampling settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HardwareSettings {
    /// Mount point reported in the disk section.
    pub disk_mount_point: String,
}

impl Default for HardwareSettings {
    fn default() -> Self {
        Self {
            disk_mount_point: "/".to_string(),
        }
    }
}
