//! Branded ID newtypes for type safety.
//!
//! - [`LayerId`] is the stable numeric identity of an agent. Valid identities
//!   are `1..=61`; layer 35 is reserved for the orchestrator.
//! - [`TaskId`] is a UUID v7 string generated per task.
//! - [`WorkflowId`] is sequence-numbered and renders as `workflow_<n>`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lowest valid agent identity.
pub const MIN_LAYER_ID: u32 = 1;

/// Highest valid agent identity.
pub const MAX_LAYER_ID: u32 = 61;

/// Identity reserved for the orchestrator agent.
pub const ORCHESTRATOR_LAYER_ID: LayerId = LayerId(35);

/// Errors produced when parsing or validating identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// Numeric layer identity outside `1..=61`.
    #[error("layer id {0} is outside the valid range 1..=61")]
    LayerOutOfRange(u32),

    /// Text that is not a layer identity at all.
    #[error("invalid layer id: {0:?}")]
    InvalidLayer(String),

    /// Text that is not a `workflow_<n>` identity.
    #[error("invalid workflow id: {0:?}")]
    InvalidWorkflow(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// LayerId
// ─────────────────────────────────────────────────────────────────────────────

/// Stable numeric identity of an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct LayerId(u32);

impl LayerId {
    /// Validate and wrap a numeric identity.
    pub fn new(value: u32) -> Result<Self, IdError> {
        if (MIN_LAYER_ID..=MAX_LAYER_ID).contains(&value) {
            Ok(Self(value))
        } else {
            Err(IdError::LayerOutOfRange(value))
        }
    }

    /// The raw numeric identity.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Whether this is the reserved orchestrator identity.
    pub fn is_orchestrator(self) -> bool {
        self == ORCHESTRATOR_LAYER_ID
    }

    /// Short label used in prompts and result payloads (`Layer35`).
    pub fn label(self) -> String {
        format!("Layer{}", self.0)
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for LayerId {
    type Error = IdError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LayerId> for u32 {
    fn from(id: LayerId) -> Self {
        id.0
    }
}

impl FromStr for LayerId {
    type Err = IdError;

    /// Accepts `35`, `layer35`, `Layer35` and `Layer 35`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = match trimmed.get(..5) {
            Some(prefix) if prefix.eq_ignore_ascii_case("layer") => trimmed[5..].trim_start(),
            _ => trimmed,
        };
        let value: u32 = digits
            .parse()
            .map_err(|_| IdError::InvalidLayer(s.to_string()))?;
        Self::new(value)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TaskId
// ─────────────────────────────────────────────────────────────────────────────

/// Unique identifier for a task (UUID v7, time-ordered).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Create a new random ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Return the inner string as a slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// WorkflowId
// ─────────────────────────────────────────────────────────────────────────────

const WORKFLOW_PREFIX: &str = "workflow_";

/// Sequence-numbered workflow identity, rendered as `workflow_<n>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkflowId(u64);

impl WorkflowId {
    /// Wrap a sequence number.
    pub const fn from_sequence(n: u64) -> Self {
        Self(n)
    }

    /// The underlying sequence number.
    pub const fn sequence(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{WORKFLOW_PREFIX}{}", self.0)
    }
}

impl FromStr for WorkflowId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix(WORKFLOW_PREFIX)
            .and_then(|n| n.parse().ok())
            .map(Self)
            .ok_or_else(|| IdError::InvalidWorkflow(s.to_string()))
    }
}

impl TryFrom<String> for WorkflowId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WorkflowId> for String {
    fn from(id: WorkflowId) -> Self {
        id.to_string()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
