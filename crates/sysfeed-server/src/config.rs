//! Server configuration.

use std::path::PathBuf;
use std::time::Duration;

use sysfeed_settings::SysfeedSettings;

/// Configuration for the sysfeed server.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Directory served for every path not claimed by another route.
    pub static_dir: Option<PathBuf>,
    /// Bound of each subscriber's outbound queue.
    pub queue_capacity: usize,
    /// Period of the publication driver.
    pub publish_interval: Duration,
}

impl ServerConfig {
    /// Derive the server configuration from loaded settings.
    pub fn from_settings(settings: &SysfeedSettings) -> Self {
        Self {
            host: settings.server.host.clone(),
            port: settings.server.port,
            static_dir: settings
                .server
                .static_dir
                .as_deref()
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
            queue_capacity: settings.server.queue_capacity,
            publish_interval: Duration::from_millis(settings.publisher.interval_ms),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            static_dir: None,
            queue_capacity: 10,
            publish_interval: Duration::from_secs(5),
        }
    }
}
