//! # sysfeed-settings
//!
//! Configuration management with layered sources.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`SysfeedSettings::default()`]
//! 2. **User file**: `~/.sysfeed/settings.json` or an explicit path (deep-merged over defaults)
//! 3. **Environment variables**: `SYSFEED_*` overrides (highest priority)
//!
//! Command-line flags are applied on top by the binary.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_exports_work() {
        let _settings = SysfeedSettings::default();
        let _path = settings_path();
    }

    #[test]
    fn default_settings_are_valid() {
        let settings = SysfeedSettings::default();
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.static_dir.as_deref(), Some("./htmx"));
        assert_eq!(settings.server.queue_capacity, 10);
        assert_eq!(settings.publisher.interval_ms, 5_000);
        assert_eq!(settings.logging.level, "info");
        assert!(!settings.logging.json);
        assert_eq!(settings.hardware.disk_mount_point, "/");
        assert!(settings.validate().is_ok());
    }
}
