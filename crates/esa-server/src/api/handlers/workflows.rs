//! Workflow planning and lifecycle under `/api/workflows`.

use axum::Json;
use axum::extract::{Path, State};
use esa_runtime::orchestrator::{OrchestrationOutcome, WorkflowRecord, WorkflowRequest};
use esa_runtime::registry::WorkflowRun;

use crate::api::errors::{ApiError, ApiJson};
use crate::api::{parse_workflow, with_timeout};
use crate::server::AppState;

/// POST /api/workflows
///
/// Engine failures come back as `{"outcome": "failed", ...}` with 200; only
/// a missing orchestrator or a malformed body is an error status.
pub async fn create(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<WorkflowRequest>,
) -> Result<Json<OrchestrationOutcome>, ApiError> {
    if request.goal.trim().is_empty() {
        return Err(ApiError::invalid_params("goal must not be empty"));
    }
    let outcome = with_timeout(
        &state,
        "orchestrate_workflow",
        state.registry.orchestrate_workflow(&request),
    )
    .await?;
    Ok(Json(outcome))
}

/// GET /api/workflows
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<WorkflowRecord>>, ApiError> {
    Ok(Json(state.registry.workflows()?))
}

/// GET /api/workflows/{id}
pub async fn fetch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WorkflowRecord>, ApiError> {
    let id = parse_workflow(&id)?;
    Ok(Json(state.registry.workflow(id)?))
}

/// POST /api/workflows/{id}/run
pub async fn run(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WorkflowRun>, ApiError> {
    let id = parse_workflow(&id)?;
    let run = with_timeout(&state, "run_workflow", state.registry.run_workflow(id)).await?;
    Ok(Json(run))
}
