//! Agent registry.
//!
//! An explicitly constructed directory of agents keyed by identity, with a
//! non-owning back-reference to the orchestrator. Built once at startup and
//! shared by reference with the request surface. Reads vastly outnumber
//! writes; no lock is held across an engine call.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use esa_core::agent::{AgentProfile, AgentStatus, CollaborationPlan, LearningOutcome};
use esa_core::ids::{LayerId, WorkflowId};
use esa_core::task::{AgentTask, Decision, TaskContext, WorkResult};
use futures::future::join_all;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use crate::agent::Agent;
use crate::errors::RegistryError;
use crate::orchestrator::improvements::calculate_target_improvements;
use crate::orchestrator::workflow::WorkflowRecord;
use crate::orchestrator::{
    AgentMetrics, DistributionPlan, ImprovementTarget, OptimizationPlan, OrchestrationOutcome,
    OrchestratorAgent, WorkflowRequest, WorkflowStatus,
};
use crate::performance::{PerformanceTracker, RollingMetrics};

/// Framework name reported by [`AgentRegistry::framework_status`].
pub const FRAMEWORK_NAME: &str = "ESA 61x21";

/// Framework-wide status.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameworkStatus {
    /// Framework name.
    pub framework: String,
    /// Registered agents.
    pub total_agents: usize,
    /// Whether the orchestrator is registered.
    pub orchestrator_available: bool,
    /// Stored workflows.
    pub workflows: usize,
    /// Workflows planned or executing.
    pub active_workflows: usize,
    /// Per-agent status, in identity order.
    pub agents: Vec<AgentStatus>,
}

/// One agent's entry in the performance report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPerformanceReport {
    /// Lifetime status.
    pub status: AgentStatus,
    /// Rolling-window metrics.
    pub rolling: RollingMetrics,
}

/// Performance report across all agents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    /// Rolling window size.
    pub window: usize,
    /// Per-agent entries, in identity order.
    pub agents: Vec<AgentPerformanceReport>,
    /// Deterministic improvement targets from the rolling metrics.
    pub target_improvements: Vec<ImprovementTarget>,
    /// When the report was built.
    pub generated_at: DateTime<Utc>,
}

/// Outcome of driving a workflow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRun {
    /// Workflow identity.
    pub workflow_id: WorkflowId,
    /// Final status.
    pub status: WorkflowStatus,
    /// One result per dispatched agent, in plan order.
    pub steps: Vec<WorkResult>,
    /// Agents named in the plan that are not registered.
    pub skipped_agents: Vec<LayerId>,
}

/// Directory of agents.
pub struct AgentRegistry {
    agents: RwLock<BTreeMap<LayerId, Arc<dyn Agent>>>,
    orchestrator: RwLock<Option<Weak<OrchestratorAgent>>>,
    performance: PerformanceTracker,
}

impl AgentRegistry {
    /// Empty registry with the default performance window.
    pub fn new() -> Self {
        Self::with_performance_window(crate::performance::DEFAULT_WINDOW)
    }

    /// Empty registry keeping `window` outcomes per agent.
    pub fn with_performance_window(window: usize) -> Self {
        Self {
            agents: RwLock::new(BTreeMap::new()),
            orchestrator: RwLock::new(None),
            performance: PerformanceTracker::with_window(window),
        }
    }

    // ── Directory ────────────────────────────────────────────────────────

    /// Register `agent` under its identity.
    ///
    /// Re-registering the same object is a no-op; a different object with
    /// the same identity replaces the old one. The orchestrator identity is
    /// accepted only from an [`OrchestratorAgent`].
    #[instrument(skip_all, fields(agent_id = %agent.id()))]
    pub fn register_agent(&self, agent: Arc<dyn Agent>) -> Result<(), RegistryError> {
        let id = agent.id();
        if id.is_orchestrator() {
            let Some(orchestrator) = Arc::clone(&agent).into_orchestrator() else {
                warn!("rejected non-orchestrator agent on reserved identity");
                return Err(RegistryError::ReservedIdentity(id));
            };
            *self.orchestrator.write() = Some(Arc::downgrade(&orchestrator));
        }

        let previous = self.agents.write().insert(id, Arc::clone(&agent));
        match previous {
            Some(prev) if Arc::ptr_eq(&prev, &agent) => debug!("agent already registered"),
            Some(_) => info!(name = %agent.profile().name, "agent replaced"),
            None => info!(name = %agent.profile().name, "agent registered"),
        }
        Ok(())
    }

    /// Remove an agent. Removing the orchestrator clears the back-reference.
    pub fn deregister_agent(&self, id: LayerId) -> Option<Arc<dyn Agent>> {
        let removed = self.agents.write().remove(&id);
        if removed.is_some() {
            if id.is_orchestrator() {
                *self.orchestrator.write() = None;
            }
            self.performance.forget(id);
            info!(agent_id = %id, "agent deregistered");
        }
        removed
    }

    /// Look up an agent.
    pub fn get_agent(&self, id: LayerId) -> Option<Arc<dyn Agent>> {
        self.agents.read().get(&id).cloned()
    }

    /// Look up an agent, failing with [`RegistryError::AgentNotFound`].
    pub fn require_agent(&self, id: LayerId) -> Result<Arc<dyn Agent>, RegistryError> {
        self.get_agent(id).ok_or(RegistryError::AgentNotFound(id))
    }

    /// All agents, in identity order.
    pub fn get_all_agents(&self) -> Vec<Arc<dyn Agent>> {
        self.agents.read().values().cloned().collect()
    }

    /// Catalogue entries, in identity order.
    pub fn catalogue(&self) -> Vec<AgentProfile> {
        self.agents
            .read()
            .values()
            .map(|a| a.profile().clone())
            .collect()
    }

    /// Number of registered agents.
    pub fn len(&self) -> usize {
        self.agents.read().len()
    }

    /// Whether no agent is registered.
    pub fn is_empty(&self) -> bool {
        self.agents.read().is_empty()
    }

    /// The registered orchestrator.
    pub fn orchestrator(&self) -> Option<Arc<OrchestratorAgent>> {
        self.orchestrator.read().as_ref().and_then(Weak::upgrade)
    }

    /// Whether an orchestrator is registered.
    pub fn has_orchestrator(&self) -> bool {
        self.orchestrator().is_some()
    }

    fn require_orchestrator(&self) -> Result<Arc<OrchestratorAgent>, RegistryError> {
        self.orchestrator().ok_or(RegistryError::NoOrchestrator)
    }

    // ── Single-agent operations ──────────────────────────────────────────

    /// Run one task on agent `id`.
    ///
    /// Counts the task in the orchestrator's workload while it runs and
    /// records the outcome in the rolling window.
    #[instrument(skip_all, fields(agent_id = %id, task_id = %task.id))]
    pub async fn execute_task(
        &self,
        id: LayerId,
        task: &AgentTask,
    ) -> Result<WorkResult, RegistryError> {
        let agent = self.require_agent(id)?;
        let orchestrator = self.orchestrator();
        let _load = orchestrator.as_deref().map(|o| o.workload().begin(id));

        let result = agent.execute_work(task).await;
        self.performance.record(id, result.success, result.duration_ms);
        Ok(result)
    }

    /// Run a named task template of agent `id`'s specialization.
    pub async fn run_template(
        &self,
        id: LayerId,
        name: &str,
        context: TaskContext,
    ) -> Result<WorkResult, RegistryError> {
        let agent = self.require_agent(id)?;
        let template = agent.specialization().template(name).ok_or_else(|| {
            RegistryError::UnknownTemplate {
                agent_id: id,
                name: name.to_string(),
            }
        })?;
        self.execute_task(id, &template.to_task(context)).await
    }

    /// Ask agent `id` for a decision.
    pub async fn make_decision(
        &self,
        id: LayerId,
        context: &Value,
        options: Option<&[Value]>,
    ) -> Result<Decision, RegistryError> {
        let agent = self.require_agent(id)?;
        Ok(agent.make_decision(context, options).await)
    }

    /// Ask agent `id` for a decision from one of its fixed-option presets.
    pub async fn decide_with_preset(
        &self,
        id: LayerId,
        name: &str,
        context: &Value,
    ) -> Result<Decision, RegistryError> {
        let agent = self.require_agent(id)?;
        let preset = agent.specialization().decision_preset(name).ok_or_else(|| {
            RegistryError::UnknownTemplate {
                agent_id: id,
                name: name.to_string(),
            }
        })?;
        let options = preset.resolve_options(context);
        Ok(agent.make_decision(context, Some(&options)).await)
    }

    /// Submit an experience to agent `id`.
    pub async fn learn(
        &self,
        id: LayerId,
        experience: &Value,
    ) -> Result<LearningOutcome, RegistryError> {
        let agent = self.require_agent(id)?;
        Ok(agent.learn_from_experience(experience).await)
    }

    /// Ask agent `id` to plan its part of `workflow` alongside `peers`.
    pub async fn collaborate(
        &self,
        id: LayerId,
        peers: &[LayerId],
        workflow: &Value,
    ) -> Result<CollaborationPlan, RegistryError> {
        let agent = self.require_agent(id)?;
        let profiles = peers
            .iter()
            .map(|&peer| self.require_agent(peer).map(|a| a.profile().clone()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(agent.collaborate_with(&profiles, workflow).await)
    }

    /// Status of agent `id`.
    pub fn agent_status(&self, id: LayerId) -> Result<AgentStatus, RegistryError> {
        Ok(self.require_agent(id)?.get_status())
    }

    // ── Orchestration ────────────────────────────────────────────────────

    /// Plan a workflow with the orchestrator against the full catalogue.
    #[instrument(skip_all, fields(goal = %request.goal))]
    pub async fn orchestrate_workflow(
        &self,
        request: &WorkflowRequest,
    ) -> Result<OrchestrationOutcome, RegistryError> {
        let orchestrator = self.require_orchestrator()?;
        let catalogue = self.catalogue();
        let outcome = orchestrator
            .orchestrate_multi_agent_workflow(request, &catalogue)
            .await;
        self.record_orchestrator_call(
            &orchestrator,
            outcome.plan().is_some(),
            outcome.duration_ms(),
        );
        Ok(outcome)
    }

    /// Ask the orchestrator to distribute `tasks`.
    pub async fn distribute_work(
        &self,
        tasks: &[AgentTask],
    ) -> Result<DistributionPlan, RegistryError> {
        let orchestrator = self.require_orchestrator()?;
        let catalogue = self.catalogue();
        let plan = orchestrator
            .distribute_work_intelligently(tasks, &catalogue)
            .await;
        self.record_orchestrator_call(&orchestrator, plan.success, plan.duration_ms);
        Ok(plan)
    }

    /// Ask the orchestrator to arbitrate a conflict.
    pub async fn resolve_conflict(&self, conflict: &Value) -> Result<Decision, RegistryError> {
        let orchestrator = self.require_orchestrator()?;
        Ok(orchestrator.resolve_agent_conflicts(conflict).await)
    }

    /// Optimize using the rolling metrics of every registered agent.
    pub async fn optimize_performance(&self) -> Result<OptimizationPlan, RegistryError> {
        let metrics = self.rolling_agent_metrics();
        self.optimize_with_metrics(&metrics).await
    }

    /// Optimize using caller-supplied metrics.
    pub async fn optimize_with_metrics(
        &self,
        metrics: &BTreeMap<LayerId, AgentMetrics>,
    ) -> Result<OptimizationPlan, RegistryError> {
        let orchestrator = self.require_orchestrator()?;
        let plan = orchestrator.optimize_agent_performance(metrics).await;
        self.record_orchestrator_call(&orchestrator, plan.success, plan.duration_ms);
        Ok(plan)
    }

    /// Planning, distribution, and optimization are orchestrator tasks and
    /// count toward its rolling window like any other task.
    fn record_orchestrator_call(
        &self,
        orchestrator: &OrchestratorAgent,
        success: bool,
        duration_ms: u64,
    ) {
        self.performance.record(orchestrator.id(), success, duration_ms);
    }

    fn rolling_agent_metrics(&self) -> BTreeMap<LayerId, AgentMetrics> {
        self.agents
            .read()
            .keys()
            .map(|&id| (id, self.performance.metrics_for(id).to_agent_metrics()))
            .collect()
    }

    // ── Workflows ────────────────────────────────────────────────────────

    /// All stored workflows, oldest first.
    pub fn workflows(&self) -> Result<Vec<WorkflowRecord>, RegistryError> {
        Ok(self.require_orchestrator()?.workflows().list())
    }

    /// One stored workflow.
    pub fn workflow(&self, id: WorkflowId) -> Result<WorkflowRecord, RegistryError> {
        self.require_orchestrator()?
            .workflows()
            .get(id)
            .ok_or(RegistryError::WorkflowNotFound(id))
    }

    /// Drive a planned workflow to completion.
    ///
    /// Dispatches one step per registered, non-orchestrator agent named in
    /// the plan, concurrently across agents. The workflow completes only if
    /// at least one step ran and every step succeeded. Dropping the returned
    /// future mid-run marks the workflow failed.
    #[instrument(skip_all, fields(workflow_id = %id))]
    pub async fn run_workflow(&self, id: WorkflowId) -> Result<WorkflowRun, RegistryError> {
        let orchestrator = self.require_orchestrator()?;
        let (record, run) = orchestrator.workflows().begin_run(id)?;

        let (participants, skipped_agents): (Vec<LayerId>, Vec<LayerId>) = record
            .required_agents
            .iter()
            .filter(|agent| !agent.is_orchestrator())
            .partition(|&&agent| self.get_agent(agent).is_some());
        if !skipped_agents.is_empty() {
            warn!(skipped = ?skipped_agents, "plan names unregistered agents");
        }

        let steps: Vec<(LayerId, AgentTask)> = participants
            .iter()
            .map(|&agent| (agent, step_task(&record, &participants)))
            .collect();
        let outcomes = join_all(
            steps
                .iter()
                .map(|(agent, task)| self.execute_task(*agent, task)),
        )
        .await;
        let results: Vec<WorkResult> = steps
            .iter()
            .zip(outcomes)
            .map(|((agent, _), outcome)| {
                outcome.unwrap_or_else(|e| WorkResult::failed(*agent, e.to_string(), 0))
            })
            .collect();

        let status = if !results.is_empty() && results.iter().all(|r| r.success) {
            WorkflowStatus::Completed
        } else {
            WorkflowStatus::Failed
        };
        let _ = run.finish(status, results.clone())?;
        info!(status = %status, steps = results.len(), "workflow finished");

        Ok(WorkflowRun {
            workflow_id: id,
            status,
            steps: results,
            skipped_agents,
        })
    }

    // ── Reporting ────────────────────────────────────────────────────────

    /// Lifetime and rolling metrics for every agent, plus targets.
    pub fn performance_report(&self) -> PerformanceReport {
        let agents: Vec<AgentPerformanceReport> = self
            .get_all_agents()
            .iter()
            .map(|agent| AgentPerformanceReport {
                status: agent.get_status(),
                rolling: self.performance.metrics_for(agent.id()),
            })
            .collect();
        let metrics: BTreeMap<LayerId, AgentMetrics> = agents
            .iter()
            .map(|a| (a.status.agent_id, a.rolling.to_agent_metrics()))
            .collect();
        PerformanceReport {
            window: self.performance.window_size(),
            target_improvements: calculate_target_improvements(&metrics),
            agents,
            generated_at: Utc::now(),
        }
    }

    /// Framework-wide status.
    pub fn framework_status(&self) -> FrameworkStatus {
        let orchestrator = self.orchestrator();
        let (workflows, active_workflows) = orchestrator.as_ref().map_or((0, 0), |o| {
            (o.workflows().len(), o.workflows().active_count())
        });
        FrameworkStatus {
            framework: FRAMEWORK_NAME.to_string(),
            total_agents: self.len(),
            orchestrator_available: orchestrator.is_some(),
            workflows,
            active_workflows,
            agents: self.get_all_agents().iter().map(|a| a.get_status()).collect(),
        }
    }
}

fn step_task(record: &WorkflowRecord, participants: &[LayerId]) -> AgentTask {
    AgentTask::new(
        "workflow_step",
        format!("Contribute to workflow {}: {}", record.id, record.goal),
    )
    .with_context_entry("workflow_id", json!(record.id.to_string()))
    .with_context_entry("goal", json!(record.goal))
    .with_context_entry("orchestration_plan", json!(record.plan))
    .with_context_entry("participants", json!(participants))
    .with_expected_output("Deliverables for this agent's part of the orchestration plan")
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("agents", &self.agents.read().keys().collect::<Vec<_>>())
            .field("orchestrator", &self.has_orchestrator())
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use assert_matches::assert_matches;
    use esa_llm::GenerationEngine;
    use esa_llm::testutil::{ScriptedEngine, Step};

    use crate::agent::{FunctionalAgent, Specialization};
    use crate::orchestrator::Complexity;

    fn layer(n: u32) -> LayerId {
        LayerId::new(n).unwrap()
    }

    fn leaf(spec: Specialization, engine: &Arc<ScriptedEngine>) -> Arc<dyn Agent> {
        let engine: Arc<dyn GenerationEngine> = engine.clone();
        Arc::new(FunctionalAgent::new(spec, engine))
    }

    fn framework(engine: &Arc<ScriptedEngine>) -> (AgentRegistry, Arc<OrchestratorAgent>) {
        let registry = AgentRegistry::new();
        let orchestrator = Arc::new(OrchestratorAgent::new(engine.clone()));
        registry.register_agent(orchestrator.clone()).unwrap();
        registry
            .register_agent(leaf(Specialization::DatabaseArchitecture, engine))
            .unwrap();
        registry
            .register_agent(leaf(Specialization::CachingStrategy, engine))
            .unwrap();
        (registry, orchestrator)
    }

    #[test]
    fn get_agent_returns_registered_object() {
        let engine = Arc::new(ScriptedEngine::replying("x"));
        let registry = AgentRegistry::new();
        let agent = leaf(Specialization::Reasoning, &engine);
        registry.register_agent(agent.clone()).unwrap();
        let found = registry.get_agent(layer(45)).unwrap();
        assert!(Arc::ptr_eq(&found, &agent));
        assert!(registry.get_agent(layer(44)).is_none());
    }

    #[test]
    fn re_registering_same_object_is_idempotent() {
        let engine = Arc::new(ScriptedEngine::replying("x"));
        let registry = AgentRegistry::new();
        let agent = leaf(Specialization::Reasoning, &engine);
        registry.register_agent(agent.clone()).unwrap();
        registry.register_agent(agent.clone()).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(Arc::ptr_eq(&registry.get_agent(layer(45)).unwrap(), &agent));
    }

    #[test]
    fn different_object_replaces() {
        let engine = Arc::new(ScriptedEngine::replying("x"));
        let registry = AgentRegistry::new();
        let first = leaf(Specialization::Reasoning, &engine);
        let second = leaf(Specialization::Reasoning, &engine);
        registry.register_agent(first.clone()).unwrap();
        registry.register_agent(second.clone()).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(Arc::ptr_eq(&registry.get_agent(layer(45)).unwrap(), &second));
    }

    #[test]
    fn reserved_identity_requires_orchestrator() {
        let engine: Arc<dyn GenerationEngine> = Arc::new(ScriptedEngine::replying("x"));
        let registry = AgentRegistry::new();
        let impostor = Arc::new(FunctionalAgent::with_identity(
            layer(35),
            "Impostor",
            Specialization::Reasoning,
            engine,
        ));
        assert_matches!(
            registry.register_agent(impostor),
            Err(RegistryError::ReservedIdentity(id)) if id.get() == 35
        );
        assert!(registry.is_empty());
        assert!(!registry.has_orchestrator());
    }

    #[test]
    fn all_agents_in_identity_order() {
        let engine = Arc::new(ScriptedEngine::replying("x"));
        let registry = AgentRegistry::new();
        for spec in [
            Specialization::SecurityHardening,
            Specialization::DatabaseArchitecture,
            Specialization::KnowledgeGraph,
        ] {
            registry.register_agent(leaf(spec, &engine)).unwrap();
        }
        let ids: Vec<u32> = registry.get_all_agents().iter().map(|a| a.id().get()).collect();
        assert_eq!(ids, vec![1, 44, 49]);
    }

    #[tokio::test]
    async fn orchestrate_without_orchestrator_fails_cleanly() {
        let engine = Arc::new(ScriptedEngine::replying("Layer 1"));
        let registry = AgentRegistry::new();
        registry
            .register_agent(leaf(Specialization::DatabaseArchitecture, &engine))
            .unwrap();
        let err = registry
            .orchestrate_workflow(&WorkflowRequest::new("x"))
            .await
            .unwrap_err();
        assert_matches!(err, RegistryError::NoOrchestrator);
        assert_eq!(engine.call_count(), 0);
        assert_matches!(registry.workflows(), Err(RegistryError::NoOrchestrator));
    }

    #[tokio::test]
    async fn orchestrate_scenario() {
        let engine = Arc::new(ScriptedEngine::replying(
            "Layer 1 reviews the schema while Layer 14 designs the cache.",
        ));
        let (registry, orchestrator) = framework(&engine);

        let request = WorkflowRequest::new("x").with_complexity(Complexity::Medium);
        let outcome = registry.orchestrate_workflow(&request).await.unwrap();

        let plan = outcome.plan().unwrap();
        let record = orchestrator.workflows().get(plan.workflow_id).unwrap();
        assert_eq!(record.status, WorkflowStatus::Planned);
        assert_eq!(registry.get_all_agents().len(), 3);
        let prompt = engine.last_prompt().unwrap();
        assert!(prompt.contains("Database Architecture"));
        assert!(prompt.contains("AI Agent Management"));
    }

    #[tokio::test]
    async fn execute_task_unknown_agent() {
        let registry = AgentRegistry::new();
        let err = registry
            .execute_task(layer(7), &AgentTask::new("t", "d"))
            .await
            .unwrap_err();
        assert_matches!(err, RegistryError::AgentNotFound(id) if id.get() == 7);
    }

    #[tokio::test]
    async fn execute_task_failure_recorded_once() {
        let engine = Arc::new(ScriptedEngine::failing("boom"));
        let (registry, orchestrator) = framework(&engine);
        let before = registry.agent_status(layer(1)).unwrap().performance.total_tasks;

        let result = registry
            .execute_task(layer(1), &AgentTask::new("t", "d"))
            .await
            .unwrap();

        assert!(!result.success);
        assert!(result.confidence.abs() < f64::EPSILON);
        let after = registry.agent_status(layer(1)).unwrap().performance.total_tasks;
        assert_eq!(after, before + 1);
        assert_eq!(orchestrator.workload().current(layer(1)), 0);
        assert_eq!(registry.performance_report().agents[0].rolling.samples, 1);
    }

    #[tokio::test]
    async fn templates_and_presets() {
        let engine = Arc::new(ScriptedEngine::replying(
            r#"{"decision": "reasoning_valid", "reasoning": "sound", "confidence": 0.9}"#,
        ));
        let registry = AgentRegistry::new();
        registry
            .register_agent(leaf(Specialization::Reasoning, &engine))
            .unwrap();

        let result = registry
            .run_template(layer(45), "outcome_prediction", TaskContext::new())
            .await
            .unwrap();
        assert!(result.success);
        assert!(engine.last_prompt().unwrap().contains("Type: outcome_prediction"));

        let decision = registry
            .decide_with_preset(layer(45), "validate_reasoning_chain", &json!({"chain": []}))
            .await
            .unwrap();
        assert_eq!(decision.decision, json!("reasoning_valid"));
        assert!(engine.last_prompt().unwrap().contains("insufficient_evidence"));

        assert_matches!(
            registry.run_template(layer(45), "astrology", TaskContext::new()).await,
            Err(RegistryError::UnknownTemplate { .. })
        );
    }

    #[tokio::test]
    async fn collaborate_requires_known_peers() {
        let engine = Arc::new(ScriptedEngine::replying("plan"));
        let (registry, _) = framework(&engine);
        let plan = registry
            .collaborate(layer(1), &[layer(14)], &json!({"goal": "x"}))
            .await
            .unwrap();
        assert!(plan.success);
        assert_matches!(
            registry.collaborate(layer(1), &[layer(60)], &json!({})).await,
            Err(RegistryError::AgentNotFound(id)) if id.get() == 60
        );
    }

    #[tokio::test]
    async fn run_workflow_completes() {
        let engine = Arc::new(ScriptedEngine::from_fn(|session, _| {
            if session.id.starts_with("layer-35") {
                Step::Reply("Layer 35 coordinates, Layer 1 and Layer 14 execute, Layer 60 advises.".into())
            } else {
                Step::Reply(format!("{} done", session.id))
            }
        }));
        let (registry, _) = framework(&engine);
        let outcome = registry
            .orchestrate_workflow(&WorkflowRequest::new("speed up"))
            .await
            .unwrap();
        let id = outcome.plan().unwrap().workflow_id;

        let run = registry.run_workflow(id).await.unwrap();

        assert_eq!(run.status, WorkflowStatus::Completed);
        let agents: Vec<u32> = run.steps.iter().map(|s| s.agent_id.get()).collect();
        assert_eq!(agents, vec![1, 14]);
        assert_eq!(run.skipped_agents, vec![layer(60)]);
        let record = registry.workflow(id).unwrap();
        assert_eq!(record.status, WorkflowStatus::Completed);
        assert_eq!(record.step_results.len(), 2);
        assert_matches!(
            registry.run_workflow(id).await,
            Err(RegistryError::InvalidWorkflowTransition { .. })
        );
    }

    #[tokio::test]
    async fn run_workflow_with_failed_step_fails() {
        let engine = Arc::new(ScriptedEngine::from_fn(|session, _| {
            if session.id.starts_with("layer-35") {
                Step::Reply("Layer 1 and Layer 14".into())
            } else if session.id.starts_with("layer-14") {
                Step::Fail("cache cluster unreachable".into())
            } else {
                Step::Reply("ok".into())
            }
        }));
        let (registry, _) = framework(&engine);
        let id = registry
            .orchestrate_workflow(&WorkflowRequest::new("x"))
            .await
            .unwrap()
            .plan()
            .unwrap()
            .workflow_id;

        let run = registry.run_workflow(id).await.unwrap();
        assert_eq!(run.status, WorkflowStatus::Failed);
        assert_eq!(run.steps.iter().filter(|s| !s.success).count(), 1);
    }

    #[tokio::test]
    async fn run_workflow_without_participants_fails() {
        let engine = Arc::new(ScriptedEngine::replying("No layers named in this plan at all."));
        let (registry, _) = framework(&engine);
        let id = registry
            .orchestrate_workflow(&WorkflowRequest::new("x"))
            .await
            .unwrap()
            .plan()
            .unwrap()
            .workflow_id;
        let run = registry.run_workflow(id).await.unwrap();
        assert_eq!(run.status, WorkflowStatus::Failed);
        assert!(run.steps.is_empty());
    }

    #[tokio::test]
    async fn optimize_uses_rolling_metrics() {
        let engine = Arc::new(ScriptedEngine::replying("optimize"));
        let (registry, _) = framework(&engine);
        let _ = registry
            .execute_task(layer(1), &AgentTask::new("t", "d"))
            .await
            .unwrap();

        let plan = registry.optimize_performance().await.unwrap();
        assert!(plan.success);
        let keys: Vec<_> = plan.target_improvements.iter().map(|t| t.key.as_str()).collect();
        // layers 14 and 35 have no samples; layer 1 succeeded quickly
        assert_eq!(keys, vec!["agent_14_success", "agent_35_success"]);
    }

    #[tokio::test]
    async fn orchestrator_calls_feed_the_rolling_window() {
        let engine = Arc::new(ScriptedEngine::replying("Layer 1 and Layer 14 handle it."));
        let (registry, _) = framework(&engine);
        for _ in 0..3 {
            let outcome = registry
                .orchestrate_workflow(&WorkflowRequest::new("x"))
                .await
                .unwrap();
            assert!(outcome.plan().is_some());
        }
        let _ = registry
            .distribute_work(&[AgentTask::new("t", "d")])
            .await
            .unwrap();

        let report = registry.performance_report();
        let orchestrator = report
            .agents
            .iter()
            .find(|a| a.status.agent_id == layer(35))
            .unwrap();
        assert_eq!(orchestrator.rolling.samples, 4);
        assert!((orchestrator.rolling.success_rate - 100.0).abs() < f64::EPSILON);
        assert_eq!(orchestrator.status.performance.total_tasks, 4);
        assert!(
            report
                .target_improvements
                .iter()
                .all(|t| t.key != "agent_35_success")
        );
    }

    #[tokio::test]
    async fn failed_planning_counts_as_a_failed_sample() {
        let engine = Arc::new(ScriptedEngine::failing("overloaded"));
        let (registry, _) = framework(&engine);
        let outcome = registry
            .orchestrate_workflow(&WorkflowRequest::new("x"))
            .await
            .unwrap();
        assert!(outcome.plan().is_none());

        let rolling = registry.performance.metrics_for(layer(35));
        assert_eq!(rolling.samples, 1);
        assert!(rolling.success_rate.abs() < f64::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_run_marks_workflow_failed() {
        let planner = Arc::new(ScriptedEngine::replying("Layer 1 and Layer 14"));
        let workers = Arc::new(
            ScriptedEngine::replying("slow").with_delay(Duration::from_secs(60)),
        );
        let registry = AgentRegistry::new();
        registry
            .register_agent(Arc::new(OrchestratorAgent::new(planner)))
            .unwrap();
        registry
            .register_agent(leaf(Specialization::DatabaseArchitecture, &workers))
            .unwrap();
        registry
            .register_agent(leaf(Specialization::CachingStrategy, &workers))
            .unwrap();
        let id = registry
            .orchestrate_workflow(&WorkflowRequest::new("x"))
            .await
            .unwrap()
            .plan()
            .unwrap()
            .workflow_id;

        let cancelled =
            tokio::time::timeout(Duration::from_secs(1), registry.run_workflow(id)).await;
        assert!(cancelled.is_err());

        let record = registry.workflow(id).unwrap();
        assert_eq!(record.status, WorkflowStatus::Failed);
        assert_eq!(registry.framework_status().active_workflows, 0);
        assert_matches!(
            registry.run_workflow(id).await,
            Err(RegistryError::InvalidWorkflowTransition {
                from: WorkflowStatus::Failed,
                ..
            })
        );
    }

    #[test]
    fn deregister_orchestrator_clears_reference() {
        let engine = Arc::new(ScriptedEngine::replying("x"));
        let (registry, _) = framework(&engine);
        assert!(registry.has_orchestrator());
        assert!(registry.deregister_agent(layer(35)).is_some());
        assert!(!registry.has_orchestrator());
        assert_eq!(registry.len(), 2);
        assert!(registry.deregister_agent(layer(35)).is_none());
    }

    #[test]
    fn framework_status_counts() {
        let engine = Arc::new(ScriptedEngine::replying("x"));
        let (registry, _) = framework(&engine);
        let status = registry.framework_status();
        assert_eq!(status.framework, FRAMEWORK_NAME);
        assert_eq!(status.total_agents, 3);
        assert!(status.orchestrator_available);
        assert_eq!(status.workflows, 0);
        assert_eq!(status.agents.len(), 3);
    }
}
