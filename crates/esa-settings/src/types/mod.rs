//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]` so a settings
//! file may be partial. Each type implements [`Default`] with production
//! values.

mod engine;
mod server;

pub use engine::*;
pub use server::*;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type.
///
/// ```json
/// {
///   "engine": { "model": "gpt-4o" },
///   "server": { "port": 9000 },
///   "roster": { "layers": ["reasoning", "orchestration"] }
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EsaSettings {
    /// Settings schema version.
    pub version: String,
    /// Application name.
    pub name: String,
    /// Generation-engine connection.
    pub engine: EngineSettings,
    /// HTTP request surface.
    pub server: ServerSettings,
    /// Orchestrator bookkeeping.
    pub orchestrator: OrchestratorSettings,
    /// Which agents to instantiate at startup.
    pub roster: RosterSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl Default for EsaSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            name: "esa".to_string(),
            engine: EngineSettings::default(),
            server: ServerSettings::default(),
            orchestrator: OrchestratorSettings::default(),
            roster: RosterSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl EsaSettings {
    /// Clamp out-of-range values and reject settings that cannot be served.
    pub fn validate(&mut self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(SettingsError::invalid("server.host", "must not be empty"));
        }
        if self.engine.base_url.trim().is_empty() {
            return Err(SettingsError::invalid("engine.baseUrl", "must not be empty"));
        }
        self.server.request_timeout_ms = self.server.request_timeout_ms.max(MIN_REQUEST_TIMEOUT_MS);
        self.server.max_body_bytes = self.server.max_body_bytes.max(1024);
        self.orchestrator.performance_window = self.orchestrator.performance_window.max(1);
        self.engine.max_history_messages = self.engine.max_history_messages.max(2);
        if let Some(t) = self.engine.temperature {
            self.engine.temperature = Some(t.clamp(0.0, 2.0));
        }
        Ok(())
    }
}

/// Orchestrator bookkeeping settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrchestratorSettings {
    /// Number of recent outcomes kept per agent for rolling metrics.
    pub performance_window: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            performance_window: 20,
        }
    }
}

/// Startup roster.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RosterSettings {
    /// Specialization labels to instantiate (e.g. `"reasoning"`). Empty means
    /// every built-in specialization.
    pub layers: Vec<String>,
}

/// Logging settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Minimum level or `EnvFilter` directive.
    pub level: String,
    /// Emit JSON lines instead of compact text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn defaults_round_trip_through_json() {
        let json = serde_json::to_value(EsaSettings::default()).unwrap();
        assert_eq!(json["server"]["port"], 8061);
        assert_eq!(json["orchestrator"]["performanceWindow"], 20);
        let back: EsaSettings = serde_json::from_value(json).unwrap();
        assert_eq!(back.name, "esa");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: EsaSettings =
            serde_json::from_str(r#"{"server": {"port": 9000}}"#).unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.engine.model, "gpt-4o-mini");
    }

    #[test]
    fn validate_clamps_values() {
        let mut settings = EsaSettings::default();
        settings.orchestrator.performance_window = 0;
        settings.server.request_timeout_ms = 5;
        settings.engine.temperature = Some(9.0);
        settings.validate().unwrap();
        assert_eq!(settings.orchestrator.performance_window, 1);
        assert_eq!(settings.server.request_timeout_ms, MIN_REQUEST_TIMEOUT_MS);
        assert_eq!(settings.engine.temperature, Some(2.0));
    }

    #[test]
    fn validate_rejects_empty_host() {
        let mut settings = EsaSettings::default();
        settings.server.host = "  ".into();
        assert_matches!(
            settings.validate(),
            Err(SettingsError::InvalidValue { key: "server.host", .. })
        );
    }
}
