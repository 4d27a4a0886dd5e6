//! Per-agent operations under `/api/agents/{id}`.

use axum::Json;
use axum::extract::{Path, State};
use esa_core::agent::{AgentStatus, CollaborationPlan, LearningOutcome};
use esa_core::ids::LayerId;
use esa_core::task::{AgentTask, Decision, TaskContext, WorkResult};
use serde::Deserialize;
use serde_json::Value;

use crate::api::errors::{ApiError, ApiJson};
use crate::api::{parse_layer, with_timeout};
use crate::server::AppState;

/// Body of `POST /decide`.
#[derive(Debug, Deserialize)]
pub struct DecideRequest {
    /// Decision context.
    #[serde(default)]
    pub context: Value,
    /// Options to choose between; free choice when absent.
    #[serde(default)]
    pub options: Option<Vec<Value>>,
}

/// Body of `POST /learn`.
#[derive(Debug, Deserialize)]
pub struct LearnRequest {
    /// Experience payload.
    pub experience: Value,
}

/// Body of `POST /collaborate`.
#[derive(Debug, Deserialize)]
pub struct CollaborateRequest {
    /// Peer identities; each must be registered.
    #[serde(default)]
    pub peers: Vec<LayerId>,
    /// Shared workflow description.
    #[serde(default)]
    pub workflow: Value,
}

/// Body of `POST /templates/{name}`.
#[derive(Debug, Default, Deserialize)]
pub struct TemplateRequest {
    /// Context for the templated task.
    #[serde(default)]
    pub context: TaskContext,
}

/// Body of `POST /decisions/{name}`.
#[derive(Debug, Deserialize)]
pub struct PresetRequest {
    /// Decision context; may carry `options` to override the preset's.
    #[serde(default)]
    pub context: Value,
}

/// GET /api/agents/{id}/status
pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AgentStatus>, ApiError> {
    let id = parse_layer(&id)?;
    Ok(Json(state.registry.agent_status(id)?))
}

/// POST /api/agents/{id}/execute
pub async fn execute(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(task): ApiJson<AgentTask>,
) -> Result<Json<WorkResult>, ApiError> {
    let id = parse_layer(&id)?;
    let result = with_timeout(&state, "execute", state.registry.execute_task(id, &task)).await?;
    Ok(Json(result))
}

/// POST /api/agents/{id}/decide
pub async fn decide(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<DecideRequest>,
) -> Result<Json<Decision>, ApiError> {
    let id = parse_layer(&id)?;
    let decision = with_timeout(
        &state,
        "decide",
        state
            .registry
            .make_decision(id, &body.context, body.options.as_deref()),
    )
    .await?;
    Ok(Json(decision))
}

/// POST /api/agents/{id}/learn
pub async fn learn(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<LearnRequest>,
) -> Result<Json<LearningOutcome>, ApiError> {
    let id = parse_layer(&id)?;
    let outcome = with_timeout(&state, "learn", state.registry.learn(id, &body.experience)).await?;
    Ok(Json(outcome))
}

/// POST /api/agents/{id}/collaborate
pub async fn collaborate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<CollaborateRequest>,
) -> Result<Json<CollaborationPlan>, ApiError> {
    let id = parse_layer(&id)?;
    let plan = with_timeout(
        &state,
        "collaborate",
        state.registry.collaborate(id, &body.peers, &body.workflow),
    )
    .await?;
    Ok(Json(plan))
}

/// POST /api/agents/{id}/templates/{name}
pub async fn run_template(
    State(state): State<AppState>,
    Path((id, name)): Path<(String, String)>,
    ApiJson(body): ApiJson<TemplateRequest>,
) -> Result<Json<WorkResult>, ApiError> {
    let id = parse_layer(&id)?;
    let result = with_timeout(
        &state,
        "run_template",
        state.registry.run_template(id, &name, body.context),
    )
    .await?;
    Ok(Json(result))
}

/// POST /api/agents/{id}/decisions/{name}
pub async fn decide_with_preset(
    State(state): State<AppState>,
    Path((id, name)): Path<(String, String)>,
    ApiJson(body): ApiJson<PresetRequest>,
) -> Result<Json<Decision>, ApiError> {
    let id = parse_layer(&id)?;
    let decision = with_timeout(
        &state,
        "decide_with_preset",
        state.registry.decide_with_preset(id, &name, &body.context),
    )
    .await?;
    Ok(Json(decision))
}
