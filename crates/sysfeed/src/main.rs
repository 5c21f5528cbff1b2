//! # sysfeed
//!
//! Server binary: loads settings, starts the HTTP/WebSocket server and the publication
//! driver, and shuts both down on Ctrl-C.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sysfeed_core::SnapshotSource;
use sysfeed_hardware::HardwareService;
use sysfeed_server::config::ServerConfig;
use sysfeed_server::server::SysfeedServer;
use sysfeed_settings::SysfeedSettings;

/// Live host metrics pushed to browsers over WebSocket.
#[derive(Parser, Debug)]
#[command(name = "sysfeed", about = "Live host metrics over WebSocket")]
struct Cli {
    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, 0 for auto-assign (overrides settings).
    #[arg(long)]
    port: Option<u16>,

    /// Settings file (default `~/.sysfeed/settings.json`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory served at `/` (overrides settings).
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Seconds between snapshots (overrides settings).
    #[arg(long)]
    interval_secs: Option<u64>,

    /// Per-subscriber queue bound (overrides settings).
    #[arg(long)]
    queue_capacity: Option<usize>,

    /// Log level (overrides settings; `RUST_LOG` still wins).
    #[arg(long)]
    log_level: Option<String>,

    /// Emit JSON log lines.
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    /// Apply command-line overrides on top of loaded settings.
    fn apply(&self, settings: &mut SysfeedSettings) {
        if let Some(host) = &self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(dir) = &self.static_dir {
            settings.server.static_dir = Some(dir.to_string_lossy().into_owned());
        }
        if let Some(secs) = self.interval_secs {
            settings.publisher.interval_ms = secs.saturating_mul(1000);
        }
        if let Some(capacity) = self.queue_capacity {
            settings.server.queue_capacity = capacity;
        }
        if let Some(level) = &self.log_level {
            settings.logging.level.clone_from(level);
        }
        if self.log_json {
            settings.logging.json = true;
        }
    }

    fn settings_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(sysfeed_settings::settings_path)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let settings_path = args.settings_path();
    let mut settings = sysfeed_settings::load_settings_from_path(&settings_path)
        .with_context(|| format!("Failed to load settings from {}", settings_path.display()))?;
    args.apply(&mut settings);
    settings.validate().context("Invalid command-line override")?;

    sysfeed_logging::init_logging(&settings.logging).context("Failed to initialize logging")?;
    let metrics_handle =
        sysfeed_server::metrics::install_recorder().context("Failed to install metrics recorder")?;

    let source: Arc<dyn SnapshotSource> =
        Arc::new(HardwareService::new(&settings.hardware.disk_mount_point));
    let server = SysfeedServer::new(ServerConfig::from_settings(&settings), metrics_handle);

    let (addr, server_handle) = server.listen().await.context("Failed to bind server")?;
    let publisher_handle = server.spawn_publisher(source);

    tracing::info!(
        queue_capacity = settings.server.queue_capacity,
        interval_ms = settings.publisher.interval_ms,
        "sysfeed listening on http://{addr}"
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down...");
    server
        .shutdown()
        .graceful_shutdown(vec![server_handle, publisher_handle], None)
        .await;

    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_leave_settings_untouched() {
        let cli = Cli::parse_from(["sysfeed"]);
        let mut settings = SysfeedSettings::default();
        cli.apply(&mut settings);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.publisher.interval_ms, 5_000);
        assert!(!settings.logging.json);
    }

    #[test]
    fn cli_overrides_settings() {
        let cli = Cli::parse_from([
            "sysfeed",
            "--host",
            "127.0.0.1",
            "--port",
            "9000",
            "--static-dir",
            "/srv/htmx",
            "--interval-secs",
            "2",
            "--queue-capacity",
            "32",
            "--log-level",
            "debug",
            "--log-json",
        ]);
        let mut settings = SysfeedSettings::default();
        cli.apply(&mut settings);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.static_dir.as_deref(), Some("/srv/htmx"));
        assert_eq!(settings.publisher.interval_ms, 2_000);
        assert_eq!(settings.server.queue_capacity, 32);
        assert_eq!(settings.logging.level, "debug");
        assert!(settings.logging.json);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn zero_interval_fails_validation() {
        let cli = Cli::parse_from(["sysfeed", "--interval-secs", "0"]);
        let mut settings = SysfeedSettings::default();
        cli.apply(&mut settings);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn explicit_config_path() {
        let cli = Cli::parse_from(["sysfeed", "--config", "/etc/sysfeed.json"]);
        assert_eq!(cli.settings_path(), PathBuf::from("/etc/sysfeed.json"));
        let cli = Cli::parse_from(["sysfeed"]);
        assert!(cli.settings_path().ends_with(".sysfeed/settings.json"));
    }
}
