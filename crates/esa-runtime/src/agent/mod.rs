//! Agent capability contract and the leaf agent implementation.
//!
//! Every worker implements [`Agent`]. Generation failures never escape an
//! agent: they come back as failure results with zero confidence.

pub mod confidence;
pub mod decision;
pub mod functional;
pub mod prompts;
pub mod specialization;

use std::sync::Arc;

use async_trait::async_trait;
use esa_core::agent::{AgentProfile, AgentStatus, CollaborationPlan, LearningOutcome};
use esa_core::ids::LayerId;
use esa_core::task::{AgentTask, Decision, WorkResult};
use serde_json::Value;

use crate::orchestrator::OrchestratorAgent;

pub use functional::FunctionalAgent;
pub use specialization::{DecisionPreset, Specialization, TaskTemplate};

/// Capability contract every specialized worker satisfies.
///
/// The four generation-backed operations on one agent are mutually
/// exclusive; calls into different agents run independently.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Catalogue entry.
    fn profile(&self) -> &AgentProfile;

    /// Specialization variant.
    fn specialization(&self) -> Specialization;

    /// Stable identity.
    fn id(&self) -> LayerId {
        self.profile().id
    }

    /// Run one task. Always appends exactly one work-history entry.
    async fn execute_work(&self, task: &AgentTask) -> WorkResult;

    /// Render a decision, optionally constrained to `options`.
    async fn make_decision(&self, context: &Value, options: Option<&[Value]>) -> Decision;

    /// Reflect on an experience. Always appends one learning entry.
    async fn learn_from_experience(&self, experience: &Value) -> LearningOutcome;

    /// Describe this agent's part in a shared workflow. Always appends one
    /// collaboration entry.
    async fn collaborate_with(&self, peers: &[AgentProfile], workflow: &Value) -> CollaborationPlan;

    /// Lifetime counters and current state.
    fn get_status(&self) -> AgentStatus;

    /// Response-richness score for `response`. See [`confidence`].
    fn calculate_confidence(&self, task: &AgentTask, response: &str) -> f64 {
        confidence::calculate_confidence(task, response)
    }

    /// The orchestrator behind this agent, if it is one.
    fn into_orchestrator(self: Arc<Self>) -> Option<Arc<OrchestratorAgent>> {
        None
    }
}
