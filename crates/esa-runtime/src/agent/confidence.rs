//! Response-richness confidence heuristic.
//!
//! A cheap proxy for how much the engine said, not a judgment of whether it
//! was right. Length is counted in characters.

use esa_core::task::AgentTask;

/// Responses shorter than this score [`SHORT_RESPONSE_CONFIDENCE`].
pub const MIN_RESPONSE_CHARS: usize = 50;

/// Score for empty or short responses.
pub const SHORT_RESPONSE_CONFIDENCE: f64 = 0.3;

/// Upper bound of the length-derived base score.
const BASE_CAP: f64 = 0.9;

/// Final upper bound.
pub const MAX_CONFIDENCE: f64 = 0.95;

/// Context entries above this count earn [`CONTEXT_BONUS`].
const RICH_CONTEXT_ENTRIES: usize = 5;

const CONTEXT_BONUS: f64 = 0.1;

/// Score a response for `task`. Pure and deterministic; result is in `[0.0, 0.95]`.
pub fn calculate_confidence(task: &AgentTask, response: &str) -> f64 {
    let length = response.chars().count();
    if length < MIN_RESPONSE_CHARS {
        return SHORT_RESPONSE_CONFIDENCE;
    }

    let mut score = (0.5 + length as f64 / 2000.0).min(BASE_CAP);
    if task.context.len() > RICH_CONTEXT_ENTRIES {
        score += CONTEXT_BONUS;
    }
    score.min(MAX_CONFIDENCE)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn task_with_context(entries: usize) -> AgentTask {
        (0..entries).fold(AgentTask::new("t", "d"), |task, i| {
            task.with_context_entry(format!("k{i}"), json!(i))
        })
    }

    #[test]
    fn empty_response_is_short() {
        let score = calculate_confidence(&task_with_context(0), "");
        assert!((score - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn forty_nine_chars_is_short() {
        let score = calculate_confidence(&task_with_context(10), &"x".repeat(49));
        assert!((score - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn fifty_chars_uses_length() {
        let score = calculate_confidence(&task_with_context(0), &"x".repeat(50));
        assert!((score - 0.525).abs() < 1e-9);
    }

    #[test]
    fn long_response_caps_at_base() {
        let score = calculate_confidence(&task_with_context(0), &"x".repeat(5000));
        assert!((score - 0.9).abs() < 1e-9);
    }

    #[test]
    fn rich_context_bonus_clamps() {
        let score = calculate_confidence(&task_with_context(6), &"x".repeat(5000));
        assert!((score - 0.95).abs() < 1e-9);
        let score = calculate_confidence(&task_with_context(6), &"x".repeat(200));
        assert!((score - 0.7).abs() < 1e-9);
    }

    #[test]
    fn exactly_five_entries_earns_no_bonus() {
        let score = calculate_confidence(&task_with_context(5), &"x".repeat(200));
        assert!((score - 0.6).abs() < 1e-9);
    }

    #[test]
    fn multibyte_characters_count_once() {
        // 49 characters, well over 50 bytes
        let response = "é".repeat(49);
        let score = calculate_confidence(&task_with_context(0), &response);
        assert!((score - 0.3).abs() < f64::EPSILON);
    }

    proptest! {
        #[test]
        fn score_in_range_and_pure(response in ".{0,3000}", entries in 0usize..10) {
            let task = task_with_context(entries);
            let first = calculate_confidence(&task, &response);
            let second = calculate_confidence(&task, &response);
            prop_assert!((0.0..=MAX_CONFIDENCE).contains(&first));
            prop_assert!((first - second).abs() < f64::EPSILON);
        }

        #[test]
        fn short_responses_score_exactly_point_three(response in ".{0,49}", entries in 0usize..10) {
            let score = calculate_confidence(&task_with_context(entries), &response);
            prop_assert!((score - SHORT_RESPONSE_CONFIDENCE).abs() < f64::EPSILON);
        }
    }
}
