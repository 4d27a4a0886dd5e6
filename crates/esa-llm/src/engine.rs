//! # Generation Engine Trait
//!
//! Core abstraction for the external text-generation collaborator. Every
//! backend implements [`GenerationEngine`]: given a persistent session and a
//! prompt it returns free text, or fails with an [`EngineError`].
//!
//! The engine makes no structural guarantee about the response and imposes no
//! latency bound. Callers that need a timeout apply their own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur during a generation call.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Rate limited by the engine.
    #[error("Rate limited: retry after {retry_after_ms}ms")]
    RateLimited {
        /// Suggested retry delay in milliseconds.
        retry_after_ms: u64,
        /// Error description.
        message: String,
    },

    /// Engine returned an API error.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error description.
        message: String,
        /// Whether this error can be retried.
        retryable: bool,
    },

    /// The engine answered without any text.
    #[error("Engine returned an empty response")]
    EmptyResponse,

    /// No engine is configured for this deployment.
    #[error("Generation engine unavailable: {message}")]
    Unavailable {
        /// Error description.
        message: String,
    },

    /// Engine-specific error.
    #[error("{message}")]
    Other {
        /// Error description.
        message: String,
    },
}

impl EngineError {
    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| {
                        s == reqwest::StatusCode::TOO_MANY_REQUESTS || s.is_server_error()
                    })
            }
            Self::RateLimited { .. } => true,
            Self::Api { retryable, .. } => *retryable,
            Self::Json(_) | Self::EmptyResponse | Self::Unavailable { .. } | Self::Other { .. } => {
                false
            }
        }
    }

    /// Error category string for logs and metrics labels.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Http(_) => "network",
            Self::Json(_) | Self::EmptyResponse => "parse",
            Self::RateLimited { .. } => "rate_limit",
            Self::Api { .. } => "api",
            Self::Unavailable { .. } => "unavailable",
            Self::Other { .. } => "unknown",
        }
    }
}

/// A persistent conversational channel with the engine.
///
/// Each agent owns exactly one session. Engines that keep conversation
/// memory key it by [`ChatSession::id`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Stable session identity (e.g. `layer-45-reasoning-engine`).
    pub id: String,
    /// System prompt sent at the start of every request.
    pub system_prompt: String,
}

impl ChatSession {
    /// Create a session.
    pub fn new(id: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            system_prompt: system_prompt.into(),
        }
    }
}

/// Core generation-engine trait.
///
/// Implementors must be `Send + Sync` for use across async tasks. Calls on
/// the same session must not be interleaved; agents serialize their own
/// calls, so engines need no per-session locking of their own.
#[async_trait]
pub trait GenerationEngine: Send + Sync {
    /// Model identifier, used as a metrics label.
    fn model(&self) -> &str;

    /// Send one prompt within `session` and return the response text.
    async fn send_message(&self, session: &ChatSession, prompt: &str) -> EngineResult<String>;

    /// Forget any conversation memory held for `session_id`.
    fn reset_session(&self, _session_id: &str) {}
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_retryable_flag() {
        let err = EngineError::Api {
            status: 503,
            message: "overloaded".into(),
            retryable: true,
        };
        assert!(err.is_retryable());
        assert_eq!(err.category(), "api");
        assert_eq!(err.to_string(), "API error (503): overloaded");
    }

    #[test]
    fn unavailable_is_not_retryable() {
        let err = EngineError::Unavailable {
            message: "no api key".into(),
        };
        assert!(!err.is_retryable());
        assert_eq!(err.category(), "unavailable");
    }

    #[test]
    fn rate_limited_is_retryable() {
        let err = EngineError::RateLimited {
            retry_after_ms: 1500,
            message: "slow down".into(),
        };
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "Rate limited: retry after 1500ms");
    }

    #[test]
    fn empty_response_category() {
        assert_eq!(EngineError::EmptyResponse.category(), "parse");
    }

    #[test]
    fn session_constructor() {
        let session = ChatSession::new("layer-1-db", "You are a DBA");
        assert_eq!(session.id, "layer-1-db");
        assert_eq!(session.system_prompt, "You are a DBA");
    }
}
