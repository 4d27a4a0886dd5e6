//! Registry error types.
//!
//! Generation failures never reach this type: agents fold them into failure
//! results. Everything here is surfaced to the caller.

use esa_core::ids::{LayerId, WorkflowId};

use crate::orchestrator::workflow::WorkflowStatus;

/// Errors returned by [`crate::registry::AgentRegistry`] operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No agent is registered under this identity.
    #[error("Agent {0} not found")]
    AgentNotFound(LayerId),

    /// Orchestration was requested before the orchestrator was registered.
    #[error("Master Orchestrator (Layer 35) not available")]
    NoOrchestrator,

    /// A non-orchestrator agent tried to take the orchestrator identity.
    #[error("Layer {0} is reserved for the orchestrator")]
    ReservedIdentity(LayerId),

    /// Workflow identity unknown to the orchestrator.
    #[error("Workflow {0} not found")]
    WorkflowNotFound(WorkflowId),

    /// The workflow is not in a state that allows the requested move.
    #[error("Workflow {id} cannot move from {from} to {to}")]
    InvalidWorkflowTransition {
        /// Workflow identity.
        id: WorkflowId,
        /// Current status.
        from: WorkflowStatus,
        /// Requested status.
        to: WorkflowStatus,
    },

    /// The agent's specialization has no template with this name.
    #[error("Agent {agent_id} has no task template named '{name}'")]
    UnknownTemplate {
        /// Agent identity.
        agent_id: LayerId,
        /// Requested template name.
        name: String,
    },

    /// Roster entry does not name a built-in specialization.
    #[error("Unknown specialization: {0}")]
    UnknownSpecialization(String),
}

impl RegistryError {
    /// Error category string for logs and responses.
    pub fn category(&self) -> &'static str {
        match self {
            Self::AgentNotFound(_) => "agent_not_found",
            Self::NoOrchestrator => "no_orchestrator",
            Self::ReservedIdentity(_) => "reserved_identity",
            Self::WorkflowNotFound(_) => "workflow_not_found",
            Self::InvalidWorkflowTransition { .. } => "invalid_transition",
            Self::UnknownTemplate { .. } => "unknown_template",
            Self::UnknownSpecialization(_) => "unknown_specialization",
        }
    }

    /// Whether the error names something that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::AgentNotFound(_) | Self::WorkflowNotFound(_) | Self::UnknownTemplate { .. }
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
