//! The master orchestrator.
//!
//! Wraps a [`FunctionalAgent`] bound to [`Specialization::Orchestration`] and
//! adds workflow planning, work distribution, conflict arbitration, and
//! performance optimization on top of the same serialized engine channel.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use esa_core::agent::{AgentProfile, AgentStatus, CollaborationPlan, LearningOutcome};
use esa_core::ids::{LayerId, WorkflowId};
use esa_core::task::{AgentTask, Decision, TaskContext, WorkResult};
use esa_llm::GenerationEngine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{info, instrument, warn};

use super::conflict::{ConflictOption, conflict_context};
use super::extraction::{estimate_workflow_duration, extract_required_agents};
use super::improvements::{AgentMetrics, ImprovementTarget, calculate_target_improvements};
use super::workflow::{NewWorkflow, WorkflowRequest, WorkflowTable};
use super::workload::WorkloadTracker;
use crate::agent::{Agent, FunctionalAgent, Specialization};

/// A stored, planned workflow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPlan {
    /// Generated identity.
    pub workflow_id: WorkflowId,
    /// Goal from the request.
    pub goal: String,
    /// Raw plan text.
    pub orchestration_plan: String,
    /// Confidence of the planning call.
    pub confidence: f64,
    /// Estimated minutes.
    pub estimated_duration_minutes: u32,
    /// Agents named in the plan.
    pub required_agents: Vec<LayerId>,
    /// Wall time of the planning call.
    pub duration_ms: u64,
}

/// Result of a planning call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OrchestrationOutcome {
    /// The plan was produced and stored.
    Planned(WorkflowPlan),
    /// The planning call failed; nothing was stored.
    Failed {
        /// Error text from the failed call.
        error: String,
        /// Wall time of the planning call.
        duration_ms: u64,
    },
}

impl OrchestrationOutcome {
    /// The stored plan, if planning succeeded.
    pub fn plan(&self) -> Option<&WorkflowPlan> {
        match self {
            Self::Planned(plan) => Some(plan),
            Self::Failed { .. } => None,
        }
    }

    /// Wall time of the planning call.
    pub fn duration_ms(&self) -> u64 {
        match self {
            Self::Planned(plan) => plan.duration_ms,
            Self::Failed { duration_ms, .. } => *duration_ms,
        }
    }
}

/// Result of a distribution call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionPlan {
    /// Whether the call succeeded.
    pub success: bool,
    /// Raw plan text, or error text.
    pub distribution_plan: String,
    /// Confidence of the call.
    pub confidence: f64,
    /// Wall time of the call.
    pub duration_ms: u64,
}

/// Result of an optimization call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationPlan {
    /// Whether the call succeeded.
    pub success: bool,
    /// Raw plan text, or error text.
    pub optimization_plan: String,
    /// Confidence of the call.
    pub confidence: f64,
    /// Wall time of the call.
    pub duration_ms: u64,
    /// Deterministic targets, present even when the call failed.
    pub target_improvements: Vec<ImprovementTarget>,
}

/// Master orchestrator agent (Layer 35).
pub struct OrchestratorAgent {
    base: FunctionalAgent,
    workflows: WorkflowTable,
    workload: WorkloadTracker,
}

impl OrchestratorAgent {
    /// Create the orchestrator on `engine`.
    pub fn new(engine: Arc<dyn GenerationEngine>) -> Self {
        Self {
            base: FunctionalAgent::new(Specialization::Orchestration, engine),
            workflows: WorkflowTable::new(),
            workload: WorkloadTracker::new(),
        }
    }

    /// The underlying leaf agent.
    pub fn base(&self) -> &FunctionalAgent {
        &self.base
    }

    /// Workflow table.
    pub fn workflows(&self) -> &WorkflowTable {
        &self.workflows
    }

    /// In-flight task counts.
    pub fn workload(&self) -> &WorkloadTracker {
        &self.workload
    }

    fn workload_value(&self) -> Value {
        let map: Map<String, Value> = self
            .workload
            .snapshot()
            .into_iter()
            .map(|(id, n)| (id.to_string(), json!(n)))
            .collect();
        Value::Object(map)
    }

    /// Plan a workflow against `available_agents` and store it.
    ///
    /// Only a successful planning call creates a record.
    #[instrument(skip_all, fields(goal = %request.goal, complexity = %request.complexity))]
    pub async fn orchestrate_multi_agent_workflow(
        &self,
        request: &WorkflowRequest,
        available_agents: &[AgentProfile],
    ) -> OrchestrationOutcome {
        let catalogue: Map<String, Value> = available_agents
            .iter()
            .map(|a| {
                (
                    a.id.to_string(),
                    json!({"name": a.name, "specialization": a.specialization}),
                )
            })
            .collect();
        let mut context = TaskContext::new();
        let _ = context.insert(
            "workflow".into(),
            json!({
                "goal": request.goal,
                "complexity": request.complexity.as_str(),
                "urgency": request.urgency,
                "context": request.context,
            }),
        );
        let _ = context.insert("available_agents".into(), Value::Object(catalogue));
        let _ = context.insert("agent_workloads".into(), self.workload_value());

        let task = AgentTask::new(
            "workflow_orchestration",
            format!("Orchestrate multi-agent workflow: {}", request.goal),
        )
        .with_context(context)
        .with_expected_output(
            "Detailed orchestration plan with agent assignments and coordination timeline",
        );

        let result = self.base.execute_work(&task).await;
        if !result.success {
            warn!(error = %result.result, "workflow planning failed");
            return OrchestrationOutcome::Failed {
                error: result.result,
                duration_ms: result.duration_ms,
            };
        }

        let required_agents = extract_required_agents(&result.result);
        if required_agents.is_empty() {
            warn!("plan names no agents");
        }
        let count = request.required_agents.unwrap_or(required_agents.len());
        let estimated = estimate_workflow_duration(request.complexity, count);

        let record = self.workflows.insert(NewWorkflow {
            goal: request.goal.clone(),
            complexity: request.complexity,
            plan: result.result.clone(),
            required_agents: required_agents.clone(),
            estimated_duration_minutes: estimated,
        });
        info!(
            workflow_id = %record.id,
            required = required_agents.len(),
            estimated_minutes = estimated,
            "workflow planned"
        );

        OrchestrationOutcome::Planned(WorkflowPlan {
            workflow_id: record.id,
            goal: record.goal,
            orchestration_plan: result.result,
            confidence: result.confidence,
            estimated_duration_minutes: estimated,
            required_agents,
            duration_ms: result.duration_ms,
        })
    }

    /// Ask for a distribution of `tasks` over `available_agents`.
    ///
    /// Does not touch workload bookkeeping.
    #[instrument(skip_all, fields(tasks = tasks.len()))]
    pub async fn distribute_work_intelligently(
        &self,
        tasks: &[AgentTask],
        available_agents: &[AgentProfile],
    ) -> DistributionPlan {
        let task_summaries: Vec<Value> = tasks
            .iter()
            .map(|t| json!({"type": t.task_type, "description": t.description}))
            .collect();
        let specializations: Map<String, Value> = available_agents
            .iter()
            .map(|a| (a.id.to_string(), json!(a.specialization)))
            .collect();

        let task = AgentTask::new(
            "intelligent_work_distribution",
            "Analyze tasks and optimally distribute across available agents",
        )
        .with_context_entry("tasks", Value::Array(task_summaries))
        .with_context_entry("agent_workloads", self.workload_value())
        .with_context_entry("agent_specializations", Value::Object(specializations))
        .with_expected_output("Optimal task distribution plan with agent assignments and scheduling");

        let result = self.base.execute_work(&task).await;
        DistributionPlan {
            success: result.success,
            distribution_plan: result.result,
            confidence: result.confidence,
            duration_ms: result.duration_ms,
        }
    }

    /// Arbitrate a disagreement, choosing among [`ConflictOption::ALL`].
    #[instrument(skip_all)]
    pub async fn resolve_agent_conflicts(&self, conflict: &Value) -> Decision {
        let options = ConflictOption::option_values();
        let decision = self
            .base
            .make_decision(&conflict_context(conflict), Some(&options))
            .await;
        if !decision.is_failure() && ConflictOption::classify(&decision.decision).is_none() {
            warn!("conflict decision names none of the offered options");
        }
        decision
    }

    /// Ask for an optimization plan and compute deterministic targets.
    #[instrument(skip_all, fields(agents = metrics.len()))]
    pub async fn optimize_agent_performance(
        &self,
        metrics: &BTreeMap<LayerId, AgentMetrics>,
    ) -> OptimizationPlan {
        let metrics_value: Map<String, Value> = metrics
            .iter()
            .map(|(id, m)| {
                (
                    id.to_string(),
                    json!({
                        "success_rate": m.success_rate,
                        "avg_response_time": m.avg_response_time_ms,
                    }),
                )
            })
            .collect();

        let task = AgentTask::new(
            "agent_performance_optimization",
            "Analyze agent performance metrics and create optimization strategies",
        )
        .with_context_entry("agent_metrics", Value::Object(metrics_value))
        .with_context_entry(
            "performance_targets",
            json!({"success_rate": 95, "response_time": 2000, "learning_rate": 0.1}),
        )
        .with_expected_output("Detailed optimization plan for underperforming agents");

        let result = self.base.execute_work(&task).await;
        OptimizationPlan {
            success: result.success,
            optimization_plan: result.result,
            confidence: result.confidence,
            duration_ms: result.duration_ms,
            target_improvements: calculate_target_improvements(metrics),
        }
    }
}

#[async_trait]
impl Agent for OrchestratorAgent {
    fn profile(&self) -> &AgentProfile {
        self.base.profile()
    }

    fn specialization(&self) -> Specialization {
        Specialization::Orchestration
    }

    async fn execute_work(&self, task: &AgentTask) -> WorkResult {
        self.base.execute_work(task).await
    }

    async fn make_decision(&self, context: &Value, options: Option<&[Value]>) -> Decision {
        self.base.make_decision(context, options).await
    }

    async fn learn_from_experience(&self, experience: &Value) -> LearningOutcome {
        self.base.learn_from_experience(experience).await
    }

    async fn collaborate_with(
        &self,
        peers: &[AgentProfile],
        workflow: &Value,
    ) -> CollaborationPlan {
        self.base.collaborate_with(peers, workflow).await
    }

    fn get_status(&self) -> AgentStatus {
        self.base.get_status()
    }

    fn into_orchestrator(self: Arc<Self>) -> Option<Arc<OrchestratorAgent>> {
        Some(self)
    }
}

impl std::fmt::Debug for OrchestratorAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestratorAgent")
            .field("base", &self.base)
            .field("workflows", &self.workflows)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
