//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`EsaSettings::default()`]
//! 2. If `~/.esa/settings.json` exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//! 4. [`EsaSettings::validate`] clamps out-of-range values
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::{EsaSettings, MIN_REQUEST_TIMEOUT_MS};

/// Resolve the path to the settings file (`~/.esa/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".esa").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<EsaSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<EsaSettings> {
    let mut settings = load_file_layers(path)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

/// Defaults merged with the settings file, without env overrides.
fn load_file_layers(path: &Path) -> Result<EsaSettings> {
    let defaults = serde_json::to_value(EsaSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let user: Value = serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
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
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
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
/// Invalid values are ignored with a warning (fall back to file/default).
pub fn apply_env_overrides(settings: &mut EsaSettings) {
    apply_overrides_from(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup`, so tests need not touch the
/// process environment.
fn apply_overrides_from(settings: &mut EsaSettings, lookup: impl Fn(&str) -> Option<String>) {
    let string = |name: &str| lookup(name).filter(|v| !v.is_empty());

    // ── Server settings ─────────────────────────────────────────────
    if let Some(v) = string("ESA_HOST") {
        settings.server.host = v;
    }
    if let Some(v) =
        string("ESA_PORT").and_then(|v| checked("ESA_PORT", &v, parse_u16_range(&v, 1, 65535)))
    {
        settings.server.port = v;
    }
    if let Some(v) = string("ESA_REQUEST_TIMEOUT_MS").and_then(|v| {
        checked(
            "ESA_REQUEST_TIMEOUT_MS",
            &v,
            parse_u64_range(&v, MIN_REQUEST_TIMEOUT_MS, 3_600_000),
        )
    }) {
        settings.server.request_timeout_ms = v;
    }

    // ── Engine settings ─────────────────────────────────────────────
    if let Some(v) = string("ESA_ENGINE_BASE_URL") {
        settings.engine.base_url = v;
    }
    if let Some(v) = string("ESA_ENGINE_MODEL") {
        settings.engine.model = v;
    }
    if let Some(v) = string("ESA_ENGINE_API_KEY").or_else(|| string("EMERGENT_LLM_KEY")) {
        settings.engine.api_key = Some(v);
    }

    // ── Orchestrator settings ───────────────────────────────────────
    if let Some(v) = string("ESA_PERFORMANCE_WINDOW").and_then(|v| {
        checked(
            "ESA_PERFORMANCE_WINDOW",
            &v,
            parse_usize_range(&v, 1, 10_000),
        )
    }) {
        settings.orchestrator.performance_window = v;
    }

    // ── Logging settings ────────────────────────────────────────────
    if let Some(v) = string("ESA_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) =
        string("ESA_LOG_JSON").and_then(|v| checked("ESA_LOG_JSON", &v, parse_bool(&v)))
    {
        settings.logging.json = v;
    }
}

fn checked<T>(key: &str, raw: &str, parsed: Option<T>) -> Option<T> {
    if parsed.is_none() {
        tracing::warn!(key, value = %raw, "invalid env var, ignoring");
    }
    parsed
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
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
