//! Orchestrator-only operations under `/api/orchestrator`.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::State;
use esa_core::ids::LayerId;
use esa_core::task::{AgentTask, Decision};
use esa_runtime::orchestrator::{AgentMetrics, ConflictOption, DistributionPlan, OptimizationPlan};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::errors::{ApiError, ApiJson};
use crate::api::with_timeout;
use crate::server::AppState;

/// Arbitration result with the option the decision names, if any.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictResolution {
    /// Raw decision.
    #[serde(flatten)]
    pub decision: Decision,
    /// Recognized option; absent when the decision names none.
    pub resolved_option: Option<ConflictOption>,
}

/// Body of `POST /distribute`.
#[derive(Debug, Deserialize)]
pub struct DistributeRequest {
    /// Tasks to assign.
    pub tasks: Vec<AgentTask>,
}

/// Body of `POST /optimize`.
#[derive(Debug, Default, Deserialize)]
pub struct OptimizeRequest {
    /// Metrics keyed by agent identity; rolling metrics when absent.
    #[serde(default)]
    pub metrics: Option<BTreeMap<LayerId, AgentMetrics>>,
}

/// POST /api/orchestrator/conflicts
///
/// The body is the free-form conflict description.
pub async fn resolve_conflict(
    State(state): State<AppState>,
    ApiJson(conflict): ApiJson<Value>,
) -> Result<Json<ConflictResolution>, ApiError> {
    let decision = with_timeout(
        &state,
        "resolve_conflict",
        state.registry.resolve_conflict(&conflict),
    )
    .await?;
    let resolved_option = ConflictOption::classify(&decision.decision);
    Ok(Json(ConflictResolution {
        decision,
        resolved_option,
    }))
}

/// POST /api/orchestrator/distribute
pub async fn distribute(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<DistributeRequest>,
) -> Result<Json<DistributionPlan>, ApiError> {
    let plan = with_timeout(
        &state,
        "distribute_work",
        state.registry.distribute_work(&body.tasks),
    )
    .await?;
    Ok(Json(plan))
}

/// POST /api/orchestrator/optimize
pub async fn optimize(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<OptimizeRequest>,
) -> Result<Json<OptimizationPlan>, ApiError> {
    let plan = match body.metrics {
        Some(metrics) => {
            with_timeout(
                &state,
                "optimize_performance",
                state.registry.optimize_with_metrics(&metrics),
            )
            .await?
        }
        None => {
            with_timeout(
                &state,
                "optimize_performance",
                state.registry.optimize_performance(),
            )
            .await?
        }
    };
    Ok(Json(plan))
}
