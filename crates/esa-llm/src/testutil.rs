//! Deterministic engine for tests.
//!
//! [`ScriptedEngine`] replays queued replies/failures, then falls back to a
//! default step. It records every call and tracks how many calls were in flight
//! per session, so callers can assert that per-agent calls never interleave.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::engine::{ChatSession, EngineError, EngineResult, GenerationEngine};

/// One scripted outcome.
#[derive(Clone, Debug)]
pub enum Step {
    /// Return this text.
    Reply(String),
    /// Fail with [`EngineError::Other`] carrying this message.
    Fail(String),
}

type Responder = Arc<dyn Fn(&ChatSession, &str) -> Step + Send + Sync>;

/// A recorded call.
#[derive(Clone, Debug)]
pub struct RecordedCall {
    /// Session the call was made on.
    pub session_id: String,
    /// Prompt text.
    pub prompt: String,
}

#[derive(Default)]
struct Concurrency {
    current: HashMap<String, usize>,
    max_per_session: usize,
    total_current: usize,
    max_total: usize,
}

/// Scripted [`GenerationEngine`].
pub struct ScriptedEngine {
    queue: Mutex<VecDeque<Step>>,
    fallback: Responder,
    delay: Option<Duration>,
    calls: Mutex<Vec<RecordedCall>>,
    concurrency: Mutex<Concurrency>,
}

impl ScriptedEngine {
    /// Always reply with `text` once the queue is empty.
    pub fn replying(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::from_fn(move |_, _| Step::Reply(text.clone()))
    }

    /// Always fail with `message` once the queue is empty.
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::from_fn(move |_, _| Step::Fail(message.clone()))
    }

    /// Compute each outcome from the session and prompt.
    pub fn from_fn(f: impl Fn(&ChatSession, &str) -> Step + Send + Sync + 'static) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback: Arc::new(f),
            delay: None,
            calls: Mutex::new(Vec::new()),
            concurrency: Mutex::new(Concurrency::default()),
        }
    }

    /// Queue a reply ahead of the fallback.
    #[must_use]
    pub fn then_reply(self, text: impl Into<String>) -> Self {
        self.queue.lock().push_back(Step::Reply(text.into()));
        self
    }

    /// Queue a failure ahead of the fallback.
    #[must_use]
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.queue.lock().push_back(Step::Fail(message.into()));
        self
    }

    /// Sleep for `delay` inside every call.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Number of calls made.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Prompt of the most recent call.
    pub fn last_prompt(&self) -> Option<String> {
        self.calls.lock().last().map(|c| c.prompt.clone())
    }

    /// Highest number of simultaneous calls seen on any single session.
    pub fn max_session_concurrency(&self) -> usize {
        self.concurrency.lock().max_per_session
    }

    /// Highest number of simultaneous calls seen across all sessions.
    pub fn max_total_concurrency(&self) -> usize {
        self.concurrency.lock().max_total
    }

    fn enter(&self, session_id: &str) {
        let mut c = self.concurrency.lock();
        let current = c.current.entry(session_id.to_string()).or_default();
        *current += 1;
        let now = *current;
        c.max_per_session = c.max_per_session.max(now);
        c.total_current += 1;
        c.max_total = c.max_total.max(c.total_current);
    }

    fn exit(&self, session_id: &str) {
        let mut c = self.concurrency.lock();
        if let Some(current) = c.current.get_mut(session_id) {
            *current = current.saturating_sub(1);
        }
        c.total_current = c.total_current.saturating_sub(1);
    }
}

struct InFlight<'a> {
    engine: &'a ScriptedEngine,
    session_id: &'a str,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.engine.exit(self.session_id);
    }
}

#[async_trait]
impl GenerationEngine for ScriptedEngine {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn send_message(&self, session: &ChatSession, prompt: &str) -> EngineResult<String> {
        self.calls.lock().push(RecordedCall {
            session_id: session.id.clone(),
            prompt: prompt.to_string(),
        });
        self.enter(&session.id);
        let _in_flight = InFlight {
            engine: self,
            session_id: &session.id,
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let queued = self.queue.lock().pop_front();
        let step = queued.unwrap_or_else(|| (self.fallback)(session, prompt));
        match step {
            Step::Reply(text) => Ok(text),
            Step::Fail(message) => Err(EngineError::Other { message }),
        }
    }
}
