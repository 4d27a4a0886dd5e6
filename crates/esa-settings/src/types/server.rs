use serde::{Deserialize, Serialize};

/// Lower bound for the host-applied request timeout.
pub const MIN_REQUEST_TIMEOUT_MS: u64 = 1000;

/// HTTP server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Timeout applied around every generation-backed request.
    pub request_timeout_ms: u64,
    /// Maximum accepted request body size.
    pub max_body_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8061,
            request_timeout_ms: 120_000,
            max_body_bytes: 1_048_576,
        }
    }
}
