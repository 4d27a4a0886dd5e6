//! Wire types for the chat-completions API.

use serde::{Deserialize, Serialize};

/// Default base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Path appended to the base URL.
pub const COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Message role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompt.
    System,
    /// Caller prompt.
    User,
    /// Engine reply.
    Assistant,
}

/// One conversation message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author role.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// System message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// User message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Request body.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    /// Model identifier.
    pub model: &'a str,
    /// System prompt, history, then the new prompt.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Response body (only the fields we read).
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    /// Completion choices; the first one is used.
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

/// One completion choice.
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    /// Generated message.
    pub message: ChoiceMessage,
}

/// Message inside a choice. `content` may be null.
#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    /// Generated text.
    #[serde(default)]
    pub content: Option<String>,
}

/// Error envelope returned on non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    /// Error details.
    pub error: ErrorDetail,
}

/// Error details.
#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    /// Human-readable message.
    pub message: String,
}
