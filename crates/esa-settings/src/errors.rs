//! Settings error types.
//!
//! File-level failures carry the path that was being loaded so the binary can
//! report which settings file to fix. Value failures name the dotted key as it
//! appears in the JSON file (`server.host`, `engine.baseUrl`).

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when loading or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file exists but could not be read.
    #[error("failed to read settings file {}: {source}", path.display())]
    Read {
        /// File being loaded.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not JSON.
    #[error("settings file {} is not valid JSON: {source}", path.display())]
    Parse {
        /// File being loaded.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Merged settings do not fit the settings types (e.g. `"port": "abc"`).
    #[error("settings do not match the expected shape: {0}")]
    Schema(#[from] serde_json::Error),

    /// A value that cannot be clamped into range.
    #[error("invalid settings value {key}: {reason}")]
    InvalidValue {
        /// Dotted JSON key.
        key: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl SettingsError {
    /// Shorthand for [`SettingsError::InvalidValue`].
    pub fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key,
            reason: reason.into(),
        }
    }

    /// The settings file involved, for file-level failures.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } => Some(path),
            Self::Schema(_) | Self::InvalidValue { .. } => None,
        }
    }
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
