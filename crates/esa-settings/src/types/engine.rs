use serde::{Deserialize, Serialize};

/// Generation-engine connection settings.
///
/// The engine speaks the chat-completions wire format; any compatible
/// endpoint works.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineSettings {
    /// Endpoint base URL (without `/v1/chat/completions`).
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// API key. When absent the engine is unavailable and every
    /// generation-backed call fails with a structured result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Conversation messages kept per session (system prompt excluded).
    pub max_history_messages: usize,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            max_history_messages: 40,
            temperature: None,
        }
    }
}
