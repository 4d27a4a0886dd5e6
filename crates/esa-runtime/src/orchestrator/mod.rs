//! Orchestrator: workflow planning, distribution, arbitration, optimization.

pub mod agent;
pub mod conflict;
pub mod extraction;
pub mod improvements;
pub mod workflow;
pub mod workload;

pub use agent::{
    DistributionPlan, OptimizationPlan, OrchestrationOutcome, OrchestratorAgent, WorkflowPlan,
};
pub use conflict::ConflictOption;
pub use improvements::{AgentMetrics, ImprovementTarget};
pub use workflow::{Complexity, WorkflowRecord, WorkflowRequest, WorkflowStatus};
