//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`SysfeedSettings::default()`]
//! 2. If the settings file exists, deep-merge user values over defaults
//! 3. Apply `SYSFEED_*` environment variable overrides
//! 4. Validate ranges
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)
//!
//! Because nulls are skipped, static file serving is disabled from a file or the
//! environment with an empty string rather than `null`.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::{MAX_INTERVAL_MS, MAX_QUEUE_CAPACITY, MIN_INTERVAL_MS, SysfeedSettings};

/// Resolve the path to the settings file (`~/.sysfeed/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".sysfeed").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<SysfeedSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. Invalid JSON or out-of-range values
/// are errors.
pub fn load_settings_from_path(path: &Path) -> Result<SysfeedSettings> {
    let mut settings = merge_file(path)?;
    apply_env_overrides(&mut settings);
    normalize(&mut settings);
    settings.validate()?;
    Ok(settings)
}

fn merge_file(path: &Path) -> Result<SysfeedSettings> {
    let defaults = serde_json::to_value(SysfeedSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

fn normalize(settings: &mut SysfeedSettings) {
    if settings
        .server
        .static_dir
        .as_deref()
        .is_some_and(|d| d.trim().is_empty())
    {
        settings.server.static_dir = None;
    }
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = match target_map.remove(&key) {
                    Some(target_val) => deep_merge(target_val, source_val),
                    None => source_val,
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Invalid or out-of-range values are logged and ignored, leaving the file/default value.
pub fn apply_env_overrides(settings: &mut SysfeedSettings) {
    if let Some(v) = read_env_string("SYSFEED_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read_env_u16("SYSFEED_PORT", 1, 65535) {
        settings.server.port = v;
    }
    if let Ok(v) = std::env::var("SYSFEED_STATIC_DIR") {
        settings.server.static_dir = Some(v);
    }
    if let Some(v) = read_env_usize("SYSFEED_QUEUE_CAPACITY", 1, MAX_QUEUE_CAPACITY) {
        settings.server.queue_capacity = v;
    }
    if let Some(v) = read_env_u64("SYSFEED_PUBLISH_INTERVAL_MS", MIN_INTERVAL_MS, MAX_INTERVAL_MS) {
        settings.publisher.interval_ms = v;
    }
    if let Some(v) = read_env_string("SYSFEED_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = read_env_bool("SYSFEED_LOG_JSON") {
        settings.logging.json = v;
    }
    if let Some(v) = read_env_string("SYSFEED_DISK_MOUNT") {
        settings.hardware.disk_mount_point = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

// ── Env var readers ─────────────────────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_bool(name: &str) -> Option<bool> {
    let val = std::env::var(name).ok()?;
    let result = parse_bool(&val);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
    }
    result
}

fn read_env_u16(name: &str, min: u16, max: u16) -> Option<u16> {
    let val = std::env::var(name).ok()?;
    let result = parse_u16_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, min, max, "invalid u16 env var, ignoring");
    }
    result
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    let val = std::env::var(name).ok()?;
    let result = parse_u64_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, min, max, "invalid u64 env var, ignoring");
    }
    result
}

fn read_env_usize(name: &str, min: usize, max: usize) -> Option<usize> {
    let val = std::env::var(name).ok()?;
    let result = parse_usize_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, min, max, "invalid usize env var, ignoring");
    }
    result
}
