//! Heuristics over free planning text.
//!
//! Pure functions so the text scraping can later be swapped for a
//! structured-output contract without touching orchestration.

use std::collections::HashSet;
use std::sync::LazyLock;

use esa_core::ids::LayerId;
use regex::Regex;

use super::workflow::Complexity;

static LAYER_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Layer (\d+)").expect("valid layer pattern"));

/// Identities mentioned as `Layer <n>` in `plan`, valid range only.
///
/// First-mention order, without duplicates. Out-of-range or overflowing
/// numbers are skipped; no mentions yields an empty list.
pub fn extract_required_agents(plan: &str) -> Vec<LayerId> {
    let mut seen = HashSet::new();
    LAYER_MENTION
        .captures_iter(plan)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
        .filter_map(|n| LayerId::new(n).ok())
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Estimated minutes: base for `complexity` times `max(1, agent_count / 2)`.
pub fn estimate_workflow_duration(complexity: Complexity, agent_count: usize) -> u32 {
    let factor = u32::try_from((agent_count / 2).max(1)).unwrap_or(u32::MAX);
    complexity.base_minutes().saturating_mul(factor)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
