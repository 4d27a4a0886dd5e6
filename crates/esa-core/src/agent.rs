//! Agent identity, status, and append-only log entry types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{LayerId, TaskId};

/// Catalogue entry describing an agent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentProfile {
    /// Stable identity.
    pub id: LayerId,
    /// Display name (e.g. `Reasoning Engine`).
    pub name: String,
    /// Specialization description.
    pub specialization: String,
}

/// One entry in an agent's work-history log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkHistoryEntry {
    /// Task that produced this entry.
    pub task_id: TaskId,
    /// Task category.
    pub task_type: String,
    /// Task description.
    pub description: String,
    /// Response text on success, error text on failure.
    pub outcome: String,
    /// Confidence assigned to the result.
    pub confidence: f64,
    /// Duration of the generation call.
    pub duration_ms: u64,
    /// Whether the call succeeded.
    pub success: bool,
    /// When the entry was appended.
    pub timestamp: DateTime<Utc>,
}

/// One entry in an agent's learning log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningEntry {
    /// Experience payload that was submitted.
    pub experience: Value,
    /// Raw engine response, or error text.
    pub response: String,
    /// Whether the generation call succeeded.
    pub success: bool,
    /// When the entry was appended.
    pub timestamp: DateTime<Utc>,
}

/// One entry in an agent's collaboration log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaborationEntry {
    /// Shared workflow description.
    pub workflow: Value,
    /// Peers named in the collaboration request.
    pub collaborating_agents: Vec<LayerId>,
    /// Raw engine response, or error text.
    pub response: String,
    /// Whether the generation call succeeded.
    pub success: bool,
    /// When the entry was appended.
    pub timestamp: DateTime<Utc>,
}

/// Result of a learning call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningOutcome {
    /// Whether the generation call succeeded.
    pub success: bool,
    /// Raw response text, or error text.
    pub learning: String,
    /// Learning-log length after the append.
    pub total_learnings: usize,
    /// Agent that learned.
    pub agent_id: LayerId,
}

/// Result of a collaboration call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaborationPlan {
    /// Whether the generation call succeeded.
    pub success: bool,
    /// Raw plan text (contribution, dependencies, deliverables, timeline,
    /// success criteria), or error text.
    pub collaboration_plan: String,
    /// Agent that produced the plan.
    pub agent_id: LayerId,
}

/// Whether an agent is currently inside a generation call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentState {
    /// No call in flight.
    Idle,
    /// A call holds the agent's conversation channel.
    Busy,
}

/// Lifetime counters for an agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPerformance {
    /// Work-history length.
    pub total_tasks: usize,
    /// Successful work-history entries.
    pub successful_tasks: usize,
    /// `successful / total × 100`, `0` for an empty history.
    pub success_rate: f64,
    /// Learning-log length.
    pub total_learnings: usize,
    /// Collaboration-log length.
    pub collaborations: usize,
}

impl AgentPerformance {
    /// Build counters, deriving the success rate.
    pub fn from_counts(
        total_tasks: usize,
        successful_tasks: usize,
        total_learnings: usize,
        collaborations: usize,
    ) -> Self {
        Self {
            total_tasks,
            successful_tasks,
            success_rate: success_rate(successful_tasks, total_tasks),
            total_learnings,
            collaborations,
        }
    }
}

/// Percentage of successful entries; `0.0` when `total` is zero.
pub fn success_rate(successful: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    successful as f64 / total as f64 * 100.0
}

/// Status snapshot returned by `get_status`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStatus {
    /// Identity.
    pub agent_id: LayerId,
    /// Display name.
    pub agent_name: String,
    /// Specialization description.
    pub specialization: String,
    /// Idle or busy.
    pub state: AgentState,
    /// Lifetime counters.
    pub performance: AgentPerformance,
    /// Timestamp of the most recent work-history entry.
    pub last_activity: Option<DateTime<Utc>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
