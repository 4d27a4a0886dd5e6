//! Engine used when no generation backend is configured.

use async_trait::async_trait;

use crate::engine::{ChatSession, EngineError, EngineResult, GenerationEngine};

/// Fails every call with [`EngineError::Unavailable`].
///
/// Lets the server start without credentials; every generation-backed
/// operation then returns a structured failure result instead of an error.
#[derive(Clone, Debug)]
pub struct UnavailableEngine {
    reason: String,
}

impl UnavailableEngine {
    /// Create an engine that reports `reason` on every call.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl GenerationEngine for UnavailableEngine {
    fn model(&self) -> &str {
        "unavailable"
    }

    async fn send_message(&self, _session: &ChatSession, _prompt: &str) -> EngineResult<String> {
        Err(EngineError::Unavailable {
            message: self.reason.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn every_call_fails() {
        let engine = UnavailableEngine::new("no API key configured");
        let session = ChatSession::new("s", "sys");
        let err = engine.send_message(&session, "hi").await.unwrap_err();
        assert_matches!(
            err,
            EngineError::Unavailable { ref message } if message == "no API key configured"
        );
        assert_eq!(engine.model(), "unavailable");
    }
}
