//! Deterministic performance targets, independent of the engine.

use std::collections::BTreeMap;

use esa_core::ids::LayerId;
use serde::{Deserialize, Serialize};

/// Success rate (percent) below which an agent gets a target.
pub const SUCCESS_RATE_FLOOR: f64 = 90.0;

/// Average response time (ms) above which an agent gets a target.
pub const RESPONSE_TIME_CEILING_MS: f64 = 3000.0;

const DEFAULT_RESPONSE_TIME_MS: f64 = 5000.0;

fn default_response_time() -> f64 {
    DEFAULT_RESPONSE_TIME_MS
}

/// Metrics for one agent. Missing fields take pessimistic defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMetrics {
    /// Percent of successful tasks.
    #[serde(default, alias = "success_rate")]
    pub success_rate: f64,
    /// Average response time in milliseconds.
    #[serde(
        default = "default_response_time",
        alias = "avg_response_time",
        alias = "avgResponseTime",
        alias = "avg_response_time_ms"
    )]
    pub avg_response_time_ms: f64,
}

/// What an improvement target is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImprovementKind {
    /// Raise the success rate.
    SuccessRate,
    /// Lower the response time.
    ResponseTime,
}

/// One improvement target.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementTarget {
    /// `agent_<id>_success` or `agent_<id>_speed`.
    pub key: String,
    /// Agent the target applies to.
    pub agent_id: LayerId,
    /// Target kind.
    pub kind: ImprovementKind,
    /// Human-readable target.
    pub message: String,
}

/// Targets for every agent below the success floor or above the latency
/// ceiling, in identity order.
pub fn calculate_target_improvements(
    metrics: &BTreeMap<LayerId, AgentMetrics>,
) -> Vec<ImprovementTarget> {
    let mut targets = Vec::new();
    for (&agent_id, m) in metrics {
        if m.success_rate < SUCCESS_RATE_FLOOR {
            targets.push(ImprovementTarget {
                key: format!("agent_{agent_id}_success"),
                agent_id,
                kind: ImprovementKind::SuccessRate,
                message: format!(
                    "Improve success rate from {}% to 95%+",
                    format_number(m.success_rate)
                ),
            });
        }
        if m.avg_response_time_ms > RESPONSE_TIME_CEILING_MS {
            targets.push(ImprovementTarget {
                key: format!("agent_{agent_id}_speed"),
                agent_id,
                kind: ImprovementKind::ResponseTime,
                message: format!(
                    "Reduce response time from {}ms to <2000ms",
                    format_number(m.avg_response_time_ms)
                ),
            });
        }
    }
    targets
}

/// Whole numbers without a fraction, others with one decimal.
fn format_number(value: f64) -> String {
    if value.fract().abs() < f64::EPSILON {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}
