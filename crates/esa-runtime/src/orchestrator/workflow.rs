//! Workflow requests, records, and the orchestrator-owned workflow table.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use esa_core::ids::{LayerId, WorkflowId};
use esa_core::task::{TaskContext, WorkResult};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::RegistryError;

/// Workflow size class used for duration estimates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Complexity {
    /// 5 minutes base.
    Simple,
    /// 15 minutes base.
    #[default]
    Medium,
    /// 30 minutes base.
    Complex,
    /// 60 minutes base.
    Enterprise,
}

impl Complexity {
    /// Base minutes before scaling by agent count.
    pub fn base_minutes(self) -> u32 {
        match self {
            Self::Simple => 5,
            Self::Medium => 15,
            Self::Complex => 30,
            Self::Enterprise => 60,
        }
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Medium => "medium",
            Self::Complex => "complex",
            Self::Enterprise => "enterprise",
        }
    }
}

/// Unknown names fall back to [`Complexity::Medium`].
impl From<String> for Complexity {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "simple" => Self::Simple,
            "complex" => Self::Complex,
            "enterprise" => Self::Enterprise,
            _ => Self::Medium,
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A workflow goal submitted for planning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRequest {
    /// What the workflow should achieve.
    pub goal: String,
    /// Size class.
    #[serde(default)]
    pub complexity: Complexity,
    /// Free-form urgency (`high`, `low`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<String>,
    /// Extra context for the planner.
    #[serde(default)]
    pub context: TaskContext,
    /// Participant count to use for the duration estimate instead of the
    /// number of agents found in the plan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_agents: Option<usize>,
}

impl WorkflowRequest {
    /// Request with default complexity and no context.
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            complexity: Complexity::default(),
            urgency: None,
            context: TaskContext::new(),
            required_agents: None,
        }
    }

    /// Set the complexity.
    #[must_use]
    pub fn with_complexity(mut self, complexity: Complexity) -> Self {
        self.complexity = complexity;
        self
    }

    /// Set the urgency.
    #[must_use]
    pub fn with_urgency(mut self, urgency: impl Into<String>) -> Self {
        self.urgency = Some(urgency.into());
        self
    }
}

/// Lifecycle: planned → executing → completed | failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    /// Plan stored, not yet run.
    Planned,
    /// Steps dispatched.
    Executing,
    /// Every step succeeded.
    Completed,
    /// A step failed, or there was nothing to run.
    Failed,
}

impl WorkflowStatus {
    /// Whether `self → next` is an allowed move.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Planned, Self::Executing)
                | (Self::Executing, Self::Completed | Self::Failed)
        )
    }

    /// Whether the workflow has not reached a final state.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Planned | Self::Executing)
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Executing => "executing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored workflow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRecord {
    /// Generated identity.
    pub id: WorkflowId,
    /// Goal from the request.
    pub goal: String,
    /// Size class from the request.
    pub complexity: Complexity,
    /// Raw plan text.
    pub plan: String,
    /// Current status.
    pub status: WorkflowStatus,
    /// Agents named in the plan.
    pub required_agents: Vec<LayerId>,
    /// Estimated minutes.
    pub estimated_duration_minutes: u32,
    /// When the plan was stored.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
    /// Results of the last run, in dispatch order.
    #[serde(default)]
    pub step_results: Vec<WorkResult>,
}

/// Fields of a freshly planned workflow.
#[derive(Clone, Debug)]
pub struct NewWorkflow {
    /// Goal.
    pub goal: String,
    /// Size class.
    pub complexity: Complexity,
    /// Plan text.
    pub plan: String,
    /// Extracted participants.
    pub required_agents: Vec<LayerId>,
    /// Estimated minutes.
    pub estimated_duration_minutes: u32,
}

struct TableInner {
    next_sequence: u64,
    records: BTreeMap<WorkflowId, WorkflowRecord>,
}

/// In-memory workflow table. Identities are sequence-numbered from 1.
pub struct WorkflowTable {
    inner: Mutex<TableInner>,
}

impl WorkflowTable {
    /// Empty table.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TableInner {
                next_sequence: 1,
                records: BTreeMap::new(),
            }),
        }
    }

    /// Allocate an identity and store a `planned` record.
    pub fn insert(&self, workflow: NewWorkflow) -> WorkflowRecord {
        let mut inner = self.inner.lock();
        let id = WorkflowId::from_sequence(inner.next_sequence);
        inner.next_sequence += 1;
        let now = Utc::now();
        let record = WorkflowRecord {
            id,
            goal: workflow.goal,
            complexity: workflow.complexity,
            plan: workflow.plan,
            status: WorkflowStatus::Planned,
            required_agents: workflow.required_agents,
            estimated_duration_minutes: workflow.estimated_duration_minutes,
            created_at: now,
            updated_at: now,
            step_results: Vec::new(),
        };
        let _ = inner.records.insert(id, record.clone());
        record
    }

    /// Fetch one record.
    pub fn get(&self, id: WorkflowId) -> Option<WorkflowRecord> {
        self.inner.lock().records.get(&id).cloned()
    }

    /// All records, oldest first.
    pub fn list(&self) -> Vec<WorkflowRecord> {
        self.inner.lock().records.values().cloned().collect()
    }

    /// Number of stored workflows.
    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().records.is_empty()
    }

    /// Workflows not yet completed or failed.
    pub fn active_count(&self) -> usize {
        self.inner
            .lock()
            .records
            .values()
            .filter(|r| r.status.is_active())
            .count()
    }

    /// Move a workflow to `to`, returning the updated record.
    pub fn transition(
        &self,
        id: WorkflowId,
        to: WorkflowStatus,
    ) -> Result<WorkflowRecord, RegistryError> {
        self.update(id, to, None)
    }

    /// Move a workflow to a final status and store its step results.
    pub fn finish(
        &self,
        id: WorkflowId,
        to: WorkflowStatus,
        steps: Vec<WorkResult>,
    ) -> Result<WorkflowRecord, RegistryError> {
        self.update(id, to, Some(steps))
    }

    /// Move a `planned` workflow to `executing` and hold it there.
    ///
    /// The returned guard finishes the run. If it is dropped first (the
    /// caller was cancelled or timed out), the workflow is marked `failed`
    /// with the results collected so far, so no record stays `executing`.
    pub fn begin_run(
        &self,
        id: WorkflowId,
    ) -> Result<(WorkflowRecord, RunGuard<'_>), RegistryError> {
        let record = self.transition(id, WorkflowStatus::Executing)?;
        Ok((
            record,
            RunGuard {
                table: self,
                id,
                finished: false,
            },
        ))
    }

    fn update(
        &self,
        id: WorkflowId,
        to: WorkflowStatus,
        steps: Option<Vec<WorkResult>>,
    ) -> Result<WorkflowRecord, RegistryError> {
        let mut inner = self.inner.lock();
        let record = inner
            .records
            .get_mut(&id)
            .ok_or(RegistryError::WorkflowNotFound(id))?;
        if !record.status.can_transition_to(to) {
            return Err(RegistryError::InvalidWorkflowTransition {
                id,
                from: record.status,
                to,
            });
        }
        record.status = to;
        record.updated_at = Utc::now();
        if let Some(steps) = steps {
            record.step_results = steps;
        }
        Ok(record.clone())
    }
}

/// An `executing` workflow that must end `completed` or `failed`.
#[must_use = "dropping the guard fails the workflow"]
pub struct RunGuard<'a> {
    table: &'a WorkflowTable,
    id: WorkflowId,
    finished: bool,
}

impl RunGuard<'_> {
    /// Identity of the running workflow.
    pub fn id(&self) -> WorkflowId {
        self.id
    }

    /// Store the final status and step results.
    pub fn finish(
        mut self,
        status: WorkflowStatus,
        steps: Vec<WorkResult>,
    ) -> Result<WorkflowRecord, RegistryError> {
        self.finished = true;
        self.table.finish(self.id, status, steps)
    }
}

impl std::fmt::Debug for RunGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunGuard")
            .field("id", &self.id)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        warn!(workflow_id = %self.id, "workflow run abandoned, marking failed");
        let _ = self.table.update(self.id, WorkflowStatus::Failed, None);
    }
}

impl Default for WorkflowTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WorkflowTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowTable")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
