//! Fixed option set for arbitrating disagreements between agents.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Resolution options the orchestrator may choose from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictOption {
    /// Side with the first agent.
    #[serde(rename = "prioritize_agent_1")]
    PrioritizeFirst,
    /// Side with the second agent.
    #[serde(rename = "prioritize_agent_2")]
    PrioritizeSecond,
    /// Merge the positions.
    FindCompromise,
    /// Hand off to a person.
    EscalateToHuman,
    /// Build something new from both.
    CreateHybridSolution,
}

impl ConflictOption {
    /// Every option, in the order offered to the engine.
    pub const ALL: [Self; 5] = [
        Self::PrioritizeFirst,
        Self::PrioritizeSecond,
        Self::FindCompromise,
        Self::EscalateToHuman,
        Self::CreateHybridSolution,
    ];

    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PrioritizeFirst => "prioritize_agent_1",
            Self::PrioritizeSecond => "prioritize_agent_2",
            Self::FindCompromise => "find_compromise",
            Self::EscalateToHuman => "escalate_to_human",
            Self::CreateHybridSolution => "create_hybrid_solution",
        }
    }

    /// Options as decision values.
    pub fn option_values() -> Vec<Value> {
        Self::ALL.iter().map(|o| Value::from(o.as_str())).collect()
    }

    /// Which option a decision value names, if any.
    ///
    /// Exact names win; otherwise the first option whose name appears in
    /// the text.
    pub fn classify(decision: &Value) -> Option<Self> {
        let text = decision.as_str()?.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|o| text == o.as_str())
            .or_else(|| Self::ALL.into_iter().find(|o| text.contains(o.as_str())))
    }
}

/// Decision context wrapping the caller's conflict details.
pub fn conflict_context(details: &Value) -> Value {
    json!({
        "conflict_type": "agent_disagreement",
        "details": details,
        "resolution_required": true,
    })
}
