//! # sysfeed-logging
//!
//! Structured logging with `tracing`.
//!
//! [`init_logging`] installs the global subscriber once at startup: an `EnvFilter` built
//! from `RUST_LOG` when set, otherwise from the configured level plus per-module
//! overrides, and a stderr fmt layer that is either compact text or JSON lines.
//!
//! ## Crate Position
//!
//! Depends on: sysfeed-settings.
//! Depended on by: the `sysfeed` binary.

#![deny(unsafe_code)]

use sysfeed_settings::LoggingSettings;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Errors raised while building the subscriber.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// The level or a module override is not a valid filter directive.
    #[error("invalid log filter '{directive}': {reason}")]
    InvalidFilter {
        /// Full directive string that failed to parse.
        directive: String,
        /// Parser message.
        reason: String,
    },
}

impl LoggingError {
    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::InvalidFilter { .. } => "invalid_filter",
        }
    }
}

/// Build the filter directive string from settings.
///
/// The base level comes first, followed by `target=level` overrides sorted by target so
/// the output is stable.
pub fn filter_directive(settings: &LoggingSettings) -> String {
    let mut overrides: Vec<_> = settings.module_levels.iter().collect();
    overrides.sort();

    let mut directive = settings.level.trim().to_lowercase();
    for (target, level) in overrides {
        directive.push(',');
        directive.push_str(target);
        directive.push('=');
        directive.push_str(&level.trim().to_lowercase());
    }
    directive
}

/// Build the `EnvFilter`. `RUST_LOG` takes precedence over settings.
pub fn build_filter(settings: &LoggingSettings) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directive = filter_directive(settings);
    EnvFilter::try_new(&directive).map_err(|e| LoggingError::InvalidFilter {
        directive,
        reason: e.to_string(),
    })
}

/// Initialize the global tracing subscriber.
///
/// Call once at application startup. Subsequent calls leave the first subscriber in
/// place.
pub fn init_logging(settings: &LoggingSettings) -> Result<(), LoggingError> {
    let filter = build_filter(settings)?;

    if settings.json {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_writer(std::io::stderr);
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr);
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init();
    }
    Ok(())
}
