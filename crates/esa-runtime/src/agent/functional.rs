//! Leaf agent bound to one specialization and one engine conversation.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use esa_core::agent::{
    AgentPerformance, AgentProfile, AgentState, AgentStatus, CollaborationEntry,
    CollaborationPlan, LearningEntry, LearningOutcome, WorkHistoryEntry,
};
use esa_core::ids::LayerId;
use esa_core::task::{AgentTask, Decision, WorkResult};
use esa_llm::{ChatSession, GenerationEngine};
use metrics::{counter, histogram};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::decision::{DecisionSource, parse_decision};
use super::specialization::Specialization;
use super::{Agent, prompts};

#[derive(Default)]
struct AgentLogs {
    work: Vec<WorkHistoryEntry>,
    learnings: Vec<LearningEntry>,
    collaborations: Vec<CollaborationEntry>,
}

/// Leaf agent.
///
/// Owns one [`ChatSession`]. The `channel` lock is held across each engine
/// call and the log append that follows it, so calls into one agent never
/// interleave and a cancelled call leaves no log entry.
pub struct FunctionalAgent {
    profile: AgentProfile,
    specialization: Specialization,
    session: ChatSession,
    engine: Arc<dyn GenerationEngine>,
    channel: tokio::sync::Mutex<()>,
    logs: RwLock<AgentLogs>,
}

impl FunctionalAgent {
    /// Create an agent with the specialization's default identity and name.
    pub fn new(specialization: Specialization, engine: Arc<dyn GenerationEngine>) -> Self {
        Self::with_identity(
            specialization.default_layer(),
            specialization.name(),
            specialization,
            engine,
        )
    }

    /// Create an agent with an explicit identity and display name.
    pub fn with_identity(
        id: LayerId,
        name: impl Into<String>,
        specialization: Specialization,
        engine: Arc<dyn GenerationEngine>,
    ) -> Self {
        let name = name.into();
        let session = ChatSession::new(
            prompts::session_id(id, &name),
            specialization.system_prompt(id, &name),
        );
        Self {
            profile: AgentProfile {
                id,
                name,
                specialization: specialization.description().to_string(),
            },
            specialization,
            session,
            engine,
            channel: tokio::sync::Mutex::new(()),
            logs: RwLock::new(AgentLogs::default()),
        }
    }

    /// The agent's engine conversation.
    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    /// Snapshot of the work-history log.
    pub fn work_history(&self) -> Vec<WorkHistoryEntry> {
        self.logs.read().work.clone()
    }

    /// Snapshot of the learning log.
    pub fn learnings(&self) -> Vec<LearningEntry> {
        self.logs.read().learnings.clone()
    }

    /// Snapshot of the collaboration log.
    pub fn collaborations(&self) -> Vec<CollaborationEntry> {
        self.logs.read().collaborations.clone()
    }

    /// Whether a generation call currently holds the channel.
    pub fn is_busy(&self) -> bool {
        self.channel.try_lock().is_err()
    }

    fn label(&self) -> String {
        self.profile.id.label()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[async_trait]
impl Agent for FunctionalAgent {
    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    fn specialization(&self) -> Specialization {
        self.specialization
    }

    #[instrument(
        skip_all,
        fields(agent_id = %self.profile.id, task_id = %task.id, task_type = %task.task_type)
    )]
    async fn execute_work(&self, task: &AgentTask) -> WorkResult {
        let _channel = self.channel.lock().await;
        let prompt = prompts::work_prompt(&self.profile, task);
        debug!(prompt_len = prompt.len(), "dispatching task");

        let started = Instant::now();
        let outcome = self.engine.send_message(&self.session, &prompt).await;
        let duration_ms = elapsed_ms(started);

        let result = match outcome {
            Ok(text) => {
                let confidence = self.calculate_confidence(task, &text);
                WorkResult::succeeded(self.profile.id, text, confidence, duration_ms)
            }
            Err(error) => {
                warn!(error = %error, category = error.category(), duration_ms, "task failed");
                WorkResult::failed(
                    self.profile.id,
                    format!("Agent execution failed: {error}"),
                    duration_ms,
                )
            }
        };

        self.logs.write().work.push(WorkHistoryEntry {
            task_id: task.id.clone(),
            task_type: task.task_type.clone(),
            description: task.description.clone(),
            outcome: result.result.clone(),
            confidence: result.confidence,
            duration_ms,
            success: result.success,
            timestamp: result.completed_at,
        });

        let outcome_label = if result.success { "success" } else { "failure" };
        counter!("agent_tasks_total", "agent" => self.label(), "outcome" => outcome_label)
            .increment(1);
        histogram!("agent_task_duration_seconds", "agent" => self.label())
            .record(duration_ms as f64 / 1000.0);
        result
    }

    #[instrument(skip_all, fields(agent_id = %self.profile.id))]
    async fn make_decision(&self, context: &Value, options: Option<&[Value]>) -> Decision {
        let _channel = self.channel.lock().await;
        let prompt = prompts::decision_prompt(&self.profile, context, options);

        match self.engine.send_message(&self.session, &prompt).await {
            Ok(text) => {
                let (decision, source) = parse_decision(&text);
                if source == DecisionSource::RawText {
                    debug!("decision response was not structured, using raw text");
                }
                decision
            }
            Err(error) => {
                warn!(error = %error, category = error.category(), "decision failed");
                Decision::failed(&error.to_string())
            }
        }
    }

    #[instrument(skip_all, fields(agent_id = %self.profile.id))]
    async fn learn_from_experience(&self, experience: &Value) -> LearningOutcome {
        let _channel = self.channel.lock().await;
        let prompt = prompts::learning_prompt(&self.profile, experience);

        let (success, learning) = match self.engine.send_message(&self.session, &prompt).await {
            Ok(text) => (true, text),
            Err(error) => {
                warn!(error = %error, category = error.category(), "learning failed");
                (false, format!("Learning failed: {error}"))
            }
        };

        let total_learnings = {
            let mut logs = self.logs.write();
            logs.learnings.push(LearningEntry {
                experience: experience.clone(),
                response: learning.clone(),
                success,
                timestamp: Utc::now(),
            });
            logs.learnings.len()
        };

        LearningOutcome {
            success,
            learning,
            total_learnings,
            agent_id: self.profile.id,
        }
    }

    #[instrument(skip_all, fields(agent_id = %self.profile.id, peers = peers.len()))]
    async fn collaborate_with(
        &self,
        peers: &[AgentProfile],
        workflow: &Value,
    ) -> CollaborationPlan {
        let _channel = self.channel.lock().await;
        let prompt = prompts::collaboration_prompt(&self.profile, peers, workflow);

        let (success, plan) = match self.engine.send_message(&self.session, &prompt).await {
            Ok(text) => (true, text),
            Err(error) => {
                warn!(error = %error, category = error.category(), "collaboration failed");
                (false, format!("Collaboration failed: {error}"))
            }
        };

        self.logs.write().collaborations.push(CollaborationEntry {
            workflow: workflow.clone(),
            collaborating_agents: peers.iter().map(|p| p.id).collect(),
            response: plan.clone(),
            success,
            timestamp: Utc::now(),
        });

        CollaborationPlan {
            success,
            collaboration_plan: plan,
            agent_id: self.profile.id,
        }
    }

    fn get_status(&self) -> AgentStatus {
        let logs = self.logs.read();
        let successful = logs.work.iter().filter(|w| w.success).count();
        AgentStatus {
            agent_id: self.profile.id,
            agent_name: self.profile.name.clone(),
            specialization: self.profile.specialization.clone(),
            state: if self.is_busy() {
                AgentState::Busy
            } else {
                AgentState::Idle
            },
            performance: AgentPerformance::from_counts(
                logs.work.len(),
                successful,
                logs.learnings.len(),
                logs.collaborations.len(),
            ),
            last_activity: logs.work.last().map(|w| w.timestamp),
        }
    }
}

impl std::fmt::Debug for FunctionalAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionalAgent")
            .field("id", &self.profile.id)
            .field("specialization", &self.specialization)
            .field("session", &self.session.id)
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

    use esa_llm::testutil::{ScriptedEngine, Step};
    use serde_json::json;

    fn agent_with(engine: ScriptedEngine) -> (FunctionalAgent, Arc<ScriptedEngine>) {
        let engine = Arc::new(engine);
        let agent = FunctionalAgent::new(Specialization::DatabaseArchitecture, engine.clone());
        (agent, engine)
    }

    #[test]
    fn identity_and_session() {
        let (agent, _) = agent_with(ScriptedEngine::replying("ok"));
        assert_eq!(agent.id().get(), 1);
        assert_eq!(agent.profile().name, "Database Architecture");
        assert_eq!(agent.session().id, "layer-1-database-architecture");
        assert!(agent.session().system_prompt.contains("Layer 1: Database Architecture Agent"));
    }

    #[tokio::test]
    async fn execute_work_success_appends_history() {
        let reply = "Add a composite index on (user_id, created_at) and drop the redundant one.";
        let (agent, engine) = agent_with(ScriptedEngine::replying(reply));
        let task = AgentTask::new("query_tuning", "speed up feed query");

        let result = agent.execute_work(&task).await;

        assert!(result.success);
        assert_eq!(result.result, reply);
        assert_eq!(result.agent_id.get(), 1);
        assert!(result.confidence > 0.3);
        let history = agent.work_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].task_id, task.id);
        assert!(engine.last_prompt().unwrap().contains("Description: speed up feed query"));
    }

    #[tokio::test]
    async fn execute_work_failure_still_appends_history() {
        let (agent, _) = agent_with(ScriptedEngine::failing("connection reset"));
        let task = AgentTask::new("query_tuning", "x");

        let result = agent.execute_work(&task).await;

        assert!(!result.success);
        assert!(result.confidence.abs() < f64::EPSILON);
        assert_eq!(result.result, "Agent execution failed: connection reset");
        let history = agent.work_history();
        assert_eq!(history.len(), 1);
        assert!(!history[0].success);
    }

    #[tokio::test]
    async fn status_counts_and_rate() {
        let (agent, _) = agent_with(
            ScriptedEngine::replying("fine")
                .then_reply("first")
                .then_fail("down")
                .then_reply("third"),
        );
        let empty = agent.get_status();
        assert!(empty.performance.success_rate.abs() < f64::EPSILON);
        assert!(empty.last_activity.is_none());

        for _ in 0..3 {
            let _ = agent.execute_work(&AgentTask::new("t", "d")).await;
        }
        let status = agent.get_status();
        assert_eq!(status.performance.total_tasks, 3);
        assert_eq!(status.performance.successful_tasks, 2);
        assert!((status.performance.success_rate - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(status.state, AgentState::Idle);
        assert!(status.last_activity.is_some());
    }

    #[tokio::test]
    async fn decision_parses_structured_reply() {
        let (agent, engine) = agent_with(ScriptedEngine::replying(
            r#"{"decision":"option_b","reasoning":"cheaper","confidence":0.6,"alternatives":["option_a"]}"#,
        ));
        let options = [json!("option_a"), json!("option_b")];
        let decision = agent.make_decision(&json!({"budget": 10}), Some(&options)).await;
        assert_eq!(decision.decision, json!("option_b"));
        assert_eq!(decision.reasoning, "cheaper");
        assert!((decision.confidence - 0.6).abs() < 1e-9);
        assert!(engine.last_prompt().unwrap().contains("\"option_b\""));
        assert!(agent.work_history().is_empty());
    }

    #[tokio::test]
    async fn decision_failure_has_zero_confidence() {
        let (agent, _) = agent_with(ScriptedEngine::failing("quota"));
        let decision = agent.make_decision(&json!({}), None).await;
        assert!(decision.is_failure());
        assert_eq!(decision.decision, json!("Decision failed: quota"));
    }

    #[tokio::test]
    async fn learning_appends_on_success_and_failure() {
        let (agent, _) = agent_with(ScriptedEngine::failing("down").then_reply("insight"));
        let first = agent.learn_from_experience(&json!({"outcome": "slow"})).await;
        assert!(first.success);
        assert_eq!(first.learning, "insight");
        assert_eq!(first.total_learnings, 1);

        let second = agent.learn_from_experience(&json!({"outcome": "fast"})).await;
        assert!(!second.success);
        assert_eq!(second.total_learnings, 2);
        assert_eq!(agent.learnings()[1].experience, json!({"outcome": "fast"}));
    }

    #[tokio::test]
    async fn collaboration_records_peers() {
        let (agent, engine) = agent_with(ScriptedEngine::replying("plan"));
        let peer = FunctionalAgent::new(Specialization::CachingStrategy, engine.clone());
        let plan = agent
            .collaborate_with(&[peer.profile().clone()], &json!({"goal": "faster feed"}))
            .await;
        assert!(plan.success);
        assert_eq!(plan.collaboration_plan, "plan");
        let log = agent.collaborations();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].collaborating_agents, vec![LayerId::new(14).unwrap()]);
        assert_eq!(agent.get_status().performance.collaborations, 1);
    }

    #[tokio::test]
    async fn calls_into_one_agent_are_serialized() {
        let engine = Arc::new(
            ScriptedEngine::from_fn(|_, _| Step::Reply("done".into()))
                .with_delay(Duration::from_millis(20)),
        );
        let agent = FunctionalAgent::new(Specialization::Reasoning, engine.clone());
        let task = AgentTask::new("t", "d");
        let situation = json!({});
        let experience = json!({});
        let (a, b, c) = tokio::join!(
            agent.execute_work(&task),
            agent.make_decision(&situation, None),
            agent.learn_from_experience(&experience),
        );
        assert!(a.success && !b.is_failure() && c.success);
        assert_eq!(engine.max_session_concurrency(), 1);
        assert_eq!(engine.call_count(), 3);
    }

    #[tokio::test]
    async fn different_agents_run_in_parallel() {
        let engine =
            Arc::new(ScriptedEngine::replying("done").with_delay(Duration::from_millis(20)));
        let first = FunctionalAgent::new(Specialization::Reasoning, engine.clone());
        let second = FunctionalAgent::new(Specialization::KnowledgeGraph, engine.clone());
        let task = AgentTask::new("t", "d");
        let _ = tokio::join!(first.execute_work(&task), second.execute_work(&task));
        assert_eq!(engine.max_total_concurrency(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_call_leaves_no_entry() {
        let engine = Arc::new(ScriptedEngine::replying("late").with_delay(Duration::from_secs(60)));
        let agent = FunctionalAgent::new(Specialization::SecurityHardening, engine);
        let task = AgentTask::new("scan", "audit");

        let timed_out =
            tokio::time::timeout(Duration::from_secs(1), agent.execute_work(&task)).await;

        assert!(timed_out.is_err());
        assert!(agent.work_history().is_empty());
        assert!(!agent.is_busy());
    }
}
