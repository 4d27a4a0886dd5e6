//! # esa-settings
//!
//! Configuration management with layered sources for the ESA agent framework.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`EsaSettings::default()`]
//! 2. **User file**: `~/.esa/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `ESA_*` overrides (highest priority)
//!
//! The binary loads settings once at startup and passes the sections down to
//! the crates that need them; there is no process-wide settings singleton.
//!
//! ## Crate Position
//!
//! Leaf crate. Depended on by esa-agent.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;
