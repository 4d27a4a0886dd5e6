//! Framework-wide reads: status, catalogue, performance report.

use axum::Json;
use axum::extract::State;
use esa_core::agent::AgentProfile;
use esa_runtime::agent::{DecisionPreset, TaskTemplate};
use esa_runtime::registry::{FrameworkStatus, PerformanceReport};
use serde::Serialize;

use crate::server::AppState;

/// Catalogue entry with the agent's templates and decision presets.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogueEntry {
    /// Identity, name, specialization.
    #[serde(flatten)]
    pub profile: AgentProfile,
    /// `orchestrator` or `functional`.
    pub kind: &'static str,
    /// Specialization label.
    pub label: &'static str,
    /// Named task templates.
    pub templates: &'static [TaskTemplate],
    /// Named fixed-option decisions.
    pub decision_presets: &'static [DecisionPreset],
}

/// GET /api/status
pub async fn status(State(state): State<AppState>) -> Json<FrameworkStatus> {
    Json(state.registry.framework_status())
}

/// GET /api/agents
pub async fn catalogue(State(state): State<AppState>) -> Json<Vec<CatalogueEntry>> {
    let entries = state
        .registry
        .get_all_agents()
        .iter()
        .map(|agent| {
            let specialization = agent.specialization();
            CatalogueEntry {
                profile: agent.profile().clone(),
                kind: if agent.id().is_orchestrator() {
                    "orchestrator"
                } else {
                    "functional"
                },
                label: specialization.label(),
                templates: specialization.templates(),
                decision_presets: specialization.decision_presets(),
            }
        })
        .collect();
    Json(entries)
}

/// GET /api/performance
pub async fn performance(State(state): State<AppState>) -> Json<PerformanceReport> {
    Json(state.registry.performance_report())
}
