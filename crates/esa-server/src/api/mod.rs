//! JSON request surface under `/api`.
//!
//! Every handler resolves identities from the path, delegates to the
//! [`AgentRegistry`](esa_runtime::AgentRegistry), and maps registry errors
//! through [`errors::ApiError`]. Generation-backed calls run under the
//! configured request timeout.

pub mod errors;
pub mod handlers;

use std::future::Future;

use axum::Router;
use axum::routing::{get, post};
use esa_core::ids::{LayerId, WorkflowId};
use esa_runtime::RegistryError;
use tracing::warn;

use crate::metrics::HTTP_TIMEOUTS_TOTAL;
use crate::server::AppState;
use errors::ApiError;
use handlers::{agents, framework, orchestrator, workflows};

/// Routes under `/api`, without state.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(framework::status))
        .route("/agents", get(framework::catalogue))
        .route("/performance", get(framework::performance))
        .route("/agents/{id}/status", get(agents::status))
        .route("/agents/{id}/execute", post(agents::execute))
        .route("/agents/{id}/decide", post(agents::decide))
        .route("/agents/{id}/learn", post(agents::learn))
        .route("/agents/{id}/collaborate", post(agents::collaborate))
        .route("/agents/{id}/templates/{name}", post(agents::run_template))
        .route("/agents/{id}/decisions/{name}", post(agents::decide_with_preset))
        .route("/workflows", get(workflows::list).post(workflows::create))
        .route("/workflows/{id}", get(workflows::fetch))
        .route("/workflows/{id}/run", post(workflows::run))
        .route("/orchestrator/conflicts", post(orchestrator::resolve_conflict))
        .route("/orchestrator/distribute", post(orchestrator::distribute))
        .route("/orchestrator/optimize", post(orchestrator::optimize))
}

/// Parse an agent identity path segment (`45`, `layer45`, `Layer 45`).
pub(crate) fn parse_layer(raw: &str) -> Result<LayerId, ApiError> {
    raw.parse()
        .map_err(|e: esa_core::ids::IdError| ApiError::invalid_params(e.to_string()))
}

/// Parse a workflow identity path segment (`workflow_3`).
pub(crate) fn parse_workflow(raw: &str) -> Result<WorkflowId, ApiError> {
    raw.parse()
        .map_err(|e: esa_core::ids::IdError| ApiError::invalid_params(e.to_string()))
}

/// Run a generation-backed registry call under the host timeout.
///
/// The call is also abandoned when shutdown begins. In both cases the inner
/// future is dropped; agents leave their logs consistent and a workflow run
/// finishes as `failed`.
pub(crate) async fn with_timeout<T>(
    state: &AppState,
    operation: &'static str,
    fut: impl Future<Output = Result<T, RegistryError>>,
) -> Result<T, ApiError> {
    match tokio::time::timeout(state.request_timeout, state.shutdown.run(fut)).await {
        Ok(Some(result)) => result.map_err(ApiError::from),
        Ok(None) => {
            warn!(operation, "request abandoned for shutdown");
            Err(ApiError::NotAvailable {
                message: format!("{operation} abandoned: server is shutting down"),
            })
        }
        Err(_) => {
            let timeout_ms = state.request_timeout.as_millis();
            warn!(operation, timeout_ms, "request timed out");
            metrics::counter!(HTTP_TIMEOUTS_TOTAL, "route" => operation).increment(1);
            Err(ApiError::Timeout {
                message: format!("{operation} did not finish within {timeout_ms} ms"),
            })
        }
    }
}
