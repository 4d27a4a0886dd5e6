//! Task, work-result, and decision records.
//!
//! These are plain value types passed between the registry, agents, and the
//! request surface. None of them are persisted beyond the history entry an
//! agent appends for them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::{LayerId, TaskId};

/// Ordered key/value context attached to a task.
pub type TaskContext = Map<String, Value>;

/// Clamp a confidence score into `[0.0, 1.0]`, mapping NaN to `0.0`.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

/// A unit of work submitted to an agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentTask {
    /// Generator-assigned identity. Never read from input.
    #[serde(skip_deserializing, default)]
    pub id: TaskId,
    /// Free-form category (e.g. `root_cause_analysis`).
    pub task_type: String,
    /// What the agent should do.
    pub description: String,
    /// Ordered context mapping rendered into the prompt.
    #[serde(default)]
    pub context: TaskContext,
    /// Hint describing the desired output.
    #[serde(default)]
    pub expected_output: String,
    /// Creation time. Never read from input.
    #[serde(skip_deserializing, default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl AgentTask {
    /// Create a task with an empty context and no output hint.
    pub fn new(task_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: TaskId::new(),
            task_type: task_type.into(),
            description: description.into(),
            context: TaskContext::new(),
            expected_output: String::new(),
            created_at: Utc::now(),
        }
    }

    /// Replace the context mapping.
    #[must_use]
    pub fn with_context(mut self, context: TaskContext) -> Self {
        self.context = context;
        self
    }

    /// Append one context entry, keeping insertion order.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: Value) -> Self {
        let _ = self.context.insert(key.into(), value);
        self
    }

    /// Set the expected-output hint.
    #[must_use]
    pub fn with_expected_output(mut self, expected: impl Into<String>) -> Self {
        self.expected_output = expected.into();
        self
    }
}

/// Outcome of [`AgentTask`] execution.
///
/// `confidence` is always within `[0.0, 1.0]`; failures carry `0.0` and the
/// error text in `result`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkResult {
    /// Whether the generation call succeeded.
    pub success: bool,
    /// Response text, or error text on failure.
    pub result: String,
    /// Confidence score.
    pub confidence: f64,
    /// Agent that produced the result.
    pub agent_id: LayerId,
    /// Wall-clock duration of the generation call.
    pub duration_ms: u64,
    /// Completion time.
    pub completed_at: DateTime<Utc>,
}

impl WorkResult {
    /// Successful result.
    pub fn succeeded(
        agent_id: LayerId,
        result: impl Into<String>,
        confidence: f64,
        duration_ms: u64,
    ) -> Self {
        Self {
            success: true,
            result: result.into(),
            confidence: clamp_confidence(confidence),
            agent_id,
            duration_ms,
            completed_at: Utc::now(),
        }
    }

    /// Failed result with zero confidence.
    pub fn failed(agent_id: LayerId, error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            success: false,
            result: error.into(),
            confidence: 0.0,
            agent_id,
            duration_ms,
            completed_at: Utc::now(),
        }
    }
}

/// A decision rendered by an agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    /// The chosen value: plain text or a structured value.
    pub decision: Value,
    /// Justification.
    pub reasoning: String,
    /// Confidence score, `0.0` on failure.
    pub confidence: f64,
    /// Alternatives that were considered, in order.
    pub alternatives: Vec<Value>,
    /// When the decision was made.
    pub made_at: DateTime<Utc>,
}

impl Decision {
    /// Build a decision, clamping confidence into range.
    pub fn new(
        decision: Value,
        reasoning: impl Into<String>,
        confidence: f64,
        alternatives: Vec<Value>,
    ) -> Self {
        Self {
            decision,
            reasoning: reasoning.into(),
            confidence: clamp_confidence(confidence),
            alternatives,
            made_at: Utc::now(),
        }
    }

    /// Decision describing a failed generation call.
    pub fn failed(error: &str) -> Self {
        Self::new(
            Value::String(format!("Decision failed: {error}")),
            "Agent encountered an error during decision making",
            0.0,
            Vec::new(),
        )
    }

    /// Whether the decision came from a failed call.
    pub fn is_failure(&self) -> bool {
        self.confidence <= 0.0
            && self
                .decision
                .as_str()
                .is_some_and(|d| d.starts_with("Decision failed:"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
