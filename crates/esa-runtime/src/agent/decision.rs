//! Decision-response parsing.
//!
//! Policy:
//! - A response whose trimmed text is a JSON object, or that contains a
//!   fenced ```` ```json ```` block holding one, is *structured*.
//! - Structured fields missing or of the wrong type take the defaults:
//!   the whole response text as the decision, [`DEFAULT_REASONING`],
//!   [`DEFAULT_CONFIDENCE`], no alternatives.
//! - Confidence values in `(1, 100]` are read as percentages. Everything is
//!   then clamped into `[0, 1]`.
//! - A scalar `alternatives` value becomes a one-element list.
//! - Anything else is *raw text*: the whole response is the decision.

use esa_core::task::Decision;
use serde_json::{Map, Value};

/// Reasoning used when the response carries none.
pub const DEFAULT_REASONING: &str = "Decision derived from agent expertise";

/// Confidence used when the response carries none.
pub const DEFAULT_CONFIDENCE: f64 = 0.8;

/// How a decision was read from the response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecisionSource {
    /// Fields came from a JSON object.
    Structured,
    /// The whole response became the decision.
    RawText,
}

/// Parse an engine response into a [`Decision`].
pub fn parse_decision(response: &str) -> (Decision, DecisionSource) {
    match structured_object(response) {
        Some(object) => (from_object(&object, response), DecisionSource::Structured),
        None => (raw_decision(response), DecisionSource::RawText),
    }
}

fn raw_decision(response: &str) -> Decision {
    Decision::new(
        Value::String(response.to_string()),
        DEFAULT_REASONING,
        DEFAULT_CONFIDENCE,
        Vec::new(),
    )
}

fn structured_object(response: &str) -> Option<Map<String, Value>> {
    let trimmed = response.trim();
    if trimmed.starts_with('{')
        && let Ok(Value::Object(object)) = serde_json::from_str(trimmed)
    {
        return Some(object);
    }
    let fenced = fenced_json(trimmed)?;
    match serde_json::from_str(fenced) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

fn fenced_json(text: &str) -> Option<&str> {
    let start = text.find("```json")? + "```json".len();
    let rest = &text[start..];
    let end = rest.find("```")?;
    Some(rest[..end].trim())
}

fn from_object(object: &Map<String, Value>, response: &str) -> Decision {
    let decision = match object.get("decision") {
        Some(Value::Null) | None => Value::String(response.to_string()),
        Some(value) => value.clone(),
    };
    let reasoning = object
        .get("reasoning")
        .and_then(Value::as_str)
        .filter(|r| !r.trim().is_empty())
        .unwrap_or(DEFAULT_REASONING);
    let confidence = object
        .get("confidence")
        .and_then(read_confidence)
        .unwrap_or(DEFAULT_CONFIDENCE);
    let alternatives = match object.get("alternatives") {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![other.clone()],
    };
    Decision::new(decision, reasoning, confidence, alternatives)
}

fn read_confidence(value: &Value) -> Option<f64> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok()?,
        _ => return None,
    };
    if raw > 1.0 && raw <= 100.0 {
        Some(raw / 100.0)
    } else {
        Some(raw)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn full_object() {
        let (decision, source) = parse_decision(
            r#"{"decision":"find_compromise","reasoning":"both valid","confidence":0.7,"alternatives":["escalate_to_human"]}"#,
        );
        assert_eq!(source, DecisionSource::Structured);
        assert_eq!(decision.decision, json!("find_compromise"));
        assert_eq!(decision.reasoning, "both valid");
        assert!((decision.confidence - 0.7).abs() < 1e-9);
        assert_eq!(decision.alternatives, vec![json!("escalate_to_human")]);
    }

    #[test]
    fn raw_text_fallback() {
        let (decision, source) = parse_decision("Go with option B.");
        assert_eq!(source, DecisionSource::RawText);
        assert_eq!(decision.decision, json!("Go with option B."));
        assert_eq!(decision.reasoning, DEFAULT_REASONING);
        assert!((decision.confidence - DEFAULT_CONFIDENCE).abs() < 1e-9);
        assert!(decision.alternatives.is_empty());
    }

    #[test]
    fn malformed_object_is_raw_text() {
        let (decision, source) = parse_decision("{\"decision\": \"x\"");
        assert_eq!(source, DecisionSource::RawText);
        assert_eq!(decision.decision, json!("{\"decision\": \"x\""));
    }

    #[test]
    fn fenced_block() {
        let text = "Here is my answer:\n```json\n{\"decision\": {\"choice\": 2}, \"confidence\": 90}\n```";
        let (decision, source) = parse_decision(text);
        assert_eq!(source, DecisionSource::Structured);
        assert_eq!(decision.decision, json!({"choice": 2}));
        assert!((decision.confidence - 0.9).abs() < 1e-9);
        assert_eq!(decision.reasoning, DEFAULT_REASONING);
    }

    #[test]
    fn missing_decision_uses_response() {
        let text = r#"{"reasoning": "no pick"}"#;
        let (decision, _) = parse_decision(text);
        assert_eq!(decision.decision, json!(text));
        assert_eq!(decision.reasoning, "no pick");
    }

    #[test]
    fn confidence_out_of_range_is_clamped() {
        let (decision, _) = parse_decision(r#"{"decision":"a","confidence":250}"#);
        assert!((decision.confidence - 1.0).abs() < f64::EPSILON);
        let (decision, _) = parse_decision(r#"{"decision":"a","confidence":-1}"#);
        assert!(decision.confidence.abs() < f64::EPSILON);
    }

    #[test]
    fn string_confidence_and_scalar_alternative() {
        let (decision, _) =
            parse_decision(r#"{"decision":"a","confidence":"85%","alternatives":"b"}"#);
        assert!((decision.confidence - 0.85).abs() < 1e-9);
        assert_eq!(decision.alternatives, vec![json!("b")]);
    }

    #[test]
    fn non_object_json_is_raw_text() {
        let (_, source) = parse_decision("[1, 2, 3]");
        assert_eq!(source, DecisionSource::RawText);
    }
}
