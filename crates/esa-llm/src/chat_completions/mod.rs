//! Chat-completions engine implementing [`GenerationEngine`].
//!
//! Sends non-streaming requests to any chat-completions compatible endpoint.
//! Conversation memory is kept per session: each request carries the
//! session's system prompt, the retained history, then the new prompt. History
//! is only extended after a successful response, so a failed or cancelled call
//! leaves the conversation untouched.

pub mod types;

use std::time::Instant;

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::StatusCode;
use tracing::{debug, instrument, warn};

use crate::engine::{ChatSession, EngineError, EngineResult, GenerationEngine};

use self::types::{
    COMPLETIONS_PATH, ChatMessage, ChatRequest, ChatResponse, DEFAULT_BASE_URL, ErrorEnvelope,
};

/// Retry delay reported when a 429 carries no `retry-after` header.
const DEFAULT_RETRY_AFTER_MS: u64 = 1000;

/// Engine configuration.
#[derive(Clone, Debug)]
pub struct ChatCompletionsConfig {
    /// Endpoint base URL.
    pub base_url: String,
    /// Bearer token.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Messages retained per session (system prompt excluded).
    pub max_history_messages: usize,
    /// Sampling temperature.
    pub temperature: Option<f64>,
}

impl ChatCompletionsConfig {
    /// Config with the default base URL and history bound.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            max_history_messages: 40,
            temperature: None,
        }
    }

    /// Override the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the history bound.
    #[must_use]
    pub fn with_max_history(mut self, max: usize) -> Self {
        self.max_history_messages = max;
        self
    }
}

/// HTTP generation engine with per-session conversation memory.
pub struct ChatCompletionsEngine {
    client: reqwest::Client,
    config: ChatCompletionsConfig,
    histories: DashMap<String, Vec<ChatMessage>>,
}

impl ChatCompletionsEngine {
    /// Create an engine with a fresh HTTP client.
    pub fn new(config: ChatCompletionsConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Create an engine sharing an existing HTTP client.
    pub fn with_client(config: ChatCompletionsConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            config,
            histories: DashMap::new(),
        }
    }

    /// Number of retained history messages for a session.
    pub fn history_len(&self, session_id: &str) -> usize {
        self.histories.get(session_id).map_or(0, |h| h.len())
    }

    fn endpoint(&self) -> String {
        format!("{}{COMPLETIONS_PATH}", self.config.base_url.trim_end_matches('/'))
    }

    fn build_messages(&self, session: &ChatSession, prompt: &str) -> Vec<ChatMessage> {
        let history = self
            .histories
            .get(&session.id)
            .map(|h| h.clone())
            .unwrap_or_default();
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(&session.system_prompt));
        messages.extend(history);
        messages.push(ChatMessage::user(prompt));
        messages
    }

    fn remember(&self, session_id: &str, prompt: &str, reply: &str) {
        let mut history = self.histories.entry(session_id.to_string()).or_default();
        history.push(ChatMessage::user(prompt));
        history.push(ChatMessage::assistant(reply));
        let excess = history.len().saturating_sub(self.config.max_history_messages);
        if excess > 0 {
            // Drop whole user/assistant pairs from the front.
            let remove = (excess + excess % 2).min(history.len());
            let _ = history.drain(..remove);
        }
    }
}

/// Map a non-2xx response to an [`EngineError`].
fn api_error(status: StatusCode, retry_after: Option<u64>, body: &str) -> EngineError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string());

    if status == StatusCode::TOO_MANY_REQUESTS {
        return EngineError::RateLimited {
            retry_after_ms: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_MS),
            message,
        };
    }
    EngineError::Api {
        status: status.as_u16(),
        message,
        retryable: status.is_server_error(),
    }
}

#[async_trait]
impl GenerationEngine for ChatCompletionsEngine {
    fn model(&self) -> &str {
        &self.config.model
    }

    #[instrument(skip_all, fields(session_id = %session.id, model = %self.config.model))]
    async fn send_message(&self, session: &ChatSession, prompt: &str) -> EngineResult<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: self.build_messages(session, prompt),
            temperature: self.config.temperature,
        };
        debug!(messages = request.messages.len(), "sending chat completion");

        metrics::counter!("engine_requests_total", "model" => self.config.model.clone())
            .increment(1);
        let started = Instant::now();

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs.saturating_mul(1000));
            let body = response.text().await.unwrap_or_default();
            let err = api_error(status, retry_after, &body);
            metrics::counter!(
                "engine_errors_total",
                "model" => self.config.model.clone(),
                "category" => err.category()
            )
            .increment(1);
            warn!(status = status.as_u16(), error = %err, "chat completion failed");
            return Err(err);
        }

        let parsed: ChatResponse = response.json().await?;
        metrics::histogram!("engine_request_duration_seconds", "model" => self.config.model.clone())
            .record(started.elapsed().as_secs_f64());

        let reply = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(EngineError::EmptyResponse)?;

        self.remember(&session.id, prompt, &reply);
        Ok(reply)
    }

    fn reset_session(&self, session_id: &str) {
        let _ = self.histories.remove(session_id);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::{Value, json};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn reply(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": text}}]
        }))
    }

    fn engine_for(server: &MockServer) -> ChatCompletionsEngine {
        ChatCompletionsEngine::new(
            ChatCompletionsConfig::new("test-key", "test-model").with_base_url(server.uri()),
        )
    }

    async fn request_bodies(server: &MockServer) -> Vec<Value> {
        server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn sends_system_prompt_and_returns_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(reply("index the foreign keys"))
            .expect(1)
            .mount(&server)
            .await;

        let engine = engine_for(&server);
        let session = ChatSession::new("layer-1-db", "You are a DBA");
        let text = engine.send_message(&session, "tune it").await.unwrap();
        assert_eq!(text, "index the foreign keys");

        let bodies = request_bodies(&server).await;
        assert_eq!(bodies[0]["model"], "test-model");
        assert_eq!(bodies[0]["messages"][0]["role"], "system");
        assert_eq!(bodies[0]["messages"][0]["content"], "You are a DBA");
        assert_eq!(bodies[0]["messages"][1]["content"], "tune it");
    }

    #[tokio::test]
    async fn history_carries_across_calls_in_one_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(reply("ack"))
            .mount(&server)
            .await;

        let engine = engine_for(&server);
        let session = ChatSession::new("s1", "sys");
        let _ = engine.send_message(&session, "first").await.unwrap();
        let _ = engine.send_message(&session, "second").await.unwrap();

        let bodies = request_bodies(&server).await;
        let second = bodies[1]["messages"].as_array().unwrap();
        assert_eq!(second.len(), 4);
        assert_eq!(second[1]["content"], "first");
        assert_eq!(second[2]["role"], "assistant");
        assert_eq!(second[3]["content"], "second");
        assert_eq!(engine.history_len("s1"), 4);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(reply("ack"))
            .mount(&server)
            .await;

        let engine = engine_for(&server);
        let _ = engine
            .send_message(&ChatSession::new("a", "sys"), "for a")
            .await
            .unwrap();
        let _ = engine
            .send_message(&ChatSession::new("b", "sys"), "for b")
            .await
            .unwrap();

        let bodies = request_bodies(&server).await;
        assert_eq!(bodies[1]["messages"].as_array().unwrap().len(), 2);
        assert_eq!(engine.history_len("a"), 2);
        assert_eq!(engine.history_len("b"), 2);
    }

    #[tokio::test]
    async fn history_is_bounded_in_pairs() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(reply("ack"))
            .mount(&server)
            .await;

        let engine = ChatCompletionsEngine::new(
            ChatCompletionsConfig::new("k", "m")
                .with_base_url(server.uri())
                .with_max_history(4),
        );
        let session = ChatSession::new("s", "sys");
        for i in 0..5 {
            let _ = engine.send_message(&session, &format!("p{i}")).await.unwrap();
        }
        assert_eq!(engine.history_len("s"), 4);
    }

    #[tokio::test]
    async fn server_error_is_retryable_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(503)
                    .set_body_json(json!({"error": {"message": "overloaded"}})),
            )
            .mount(&server)
            .await;

        let engine = engine_for(&server);
        let session = ChatSession::new("s", "sys");
        let err = engine.send_message(&session, "hi").await.unwrap_err();
        assert_matches!(
            err,
            EngineError::Api { status: 503, ref message, retryable: true } if message == "overloaded"
        );
        assert_eq!(engine.history_len("s"), 0);
    }

    #[tokio::test]
    async fn rate_limit_reads_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "3")
                    .set_body_string("too many"),
            )
            .mount(&server)
            .await;

        let engine = engine_for(&server);
        let err = engine
            .send_message(&ChatSession::new("s", "sys"), "hi")
            .await
            .unwrap_err();
        assert_matches!(err, EngineError::RateLimited { retry_after_ms: 3000, .. });
    }

    #[tokio::test]
    async fn oversized_retry_after_saturates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "99999999999999999")
                    .set_body_string("slow down"),
            )
            .mount(&server)
            .await;

        let engine = engine_for(&server);
        let err = engine
            .send_message(&ChatSession::new("s", "sys"), "hi")
            .await
            .unwrap_err();
        assert_matches!(err, EngineError::RateLimited { retry_after_ms: u64::MAX, .. });
    }

    #[tokio::test]
    async fn client_error_is_not_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let engine = engine_for(&server);
        let err = engine
            .send_message(&ChatSession::new("s", "sys"), "hi")
            .await
            .unwrap_err();
        assert!(!err.is_retryable());
        assert_matches!(
            err,
            EngineError::Api { status: 401, ref message, .. } if message == "bad key"
        );
    }

    #[tokio::test]
    async fn empty_choices_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let engine = engine_for(&server);
        let err = engine
            .send_message(&ChatSession::new("s", "sys"), "hi")
            .await
            .unwrap_err();
        assert_matches!(err, EngineError::EmptyResponse);
    }

    #[tokio::test]
    async fn reset_session_clears_history() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(reply("ack"))
            .mount(&server)
            .await;

        let engine = engine_for(&server);
        let session = ChatSession::new("s", "sys");
        let _ = engine.send_message(&session, "hi").await.unwrap();
        engine.reset_session("s");
        assert_eq!(engine.history_len("s"), 0);
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let engine = ChatCompletionsEngine::new(
            ChatCompletionsConfig::new("k", "m").with_base_url("http://localhost:9/"),
        );
        assert_eq!(engine.endpoint(), "http://localhost:9/v1/chat/completions");
    }
}
