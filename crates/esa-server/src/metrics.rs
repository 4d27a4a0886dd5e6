//! Prometheus metrics recorder, `/metrics` rendering, and request tracking.

use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the `PrometheusHandle` used to render the `/metrics` endpoint.
/// Call once at startup before any metrics are recorded; a second call fails
/// because a global recorder is already set.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    info!("prometheus metrics recorder installed");
    Ok(handle)
}

/// Render Prometheus text format from the installed recorder.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}

/// Record count and latency for every routed request.
///
/// Labels use the matched route template (`/api/agents/{id}/execute`), not the
/// raw path, so identities do not explode label cardinality.
pub async fn track_requests(req: Request, next: Next) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |p| p.as_str().to_string());
    let method = req.method().to_string();
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    metrics::counter!(
        HTTP_REQUESTS_TOTAL,
        "method" => method.clone(),
        "route" => route.clone(),
        "status" => status
    )
    .increment(1);
    metrics::histogram!(HTTP_REQUEST_DURATION_SECONDS, "method" => method, "route" => route)
        .record(start.elapsed().as_secs_f64());
    response
}

// Metric name constants shared with the runtime and engine crates.

/// HTTP requests total (counter, labels: method, route, status).
pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
/// HTTP request duration seconds (histogram, labels: method, route).
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
/// Agent tasks total (counter, labels: agent, outcome).
pub const AGENT_TASKS_TOTAL: &str = "agent_tasks_total";
/// Agent task duration seconds (histogram, labels: agent).
pub const AGENT_TASK_DURATION_SECONDS: &str = "agent_task_duration_seconds";
/// In-flight tasks per agent (gauge, labels: agent).
pub const AGENT_WORKLOAD: &str = "agent_workload";
/// 1 when an agent's rolling success rate is below half (gauge, labels: agent).
pub const AGENT_DEGRADED: &str = "agent_degraded";
/// Generation requests total (counter, labels: model).
pub const ENGINE_REQUESTS_TOTAL: &str = "engine_requests_total";
/// Generation errors total (counter, labels: model, category).
pub const ENGINE_ERRORS_TOTAL: &str = "engine_errors_total";
/// Generation request duration seconds (histogram, labels: model).
pub const ENGINE_REQUEST_DURATION_SECONDS: &str = "engine_request_duration_seconds";
/// Requests cut off by the host timeout (counter, labels: route).
pub const HTTP_TIMEOUTS_TOTAL: &str = "http_timeouts_total";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_are_snake_case() {
        let names = [
            HTTP_REQUESTS_TOTAL,
            HTTP_REQUEST_DURATION_SECONDS,
            AGENT_TASKS_TOTAL,
            AGENT_TASK_DURATION_SECONDS,
            AGENT_WORKLOAD,
            AGENT_DEGRADED,
            ENGINE_REQUESTS_TOTAL,
            ENGINE_ERRORS_TOTAL,
            ENGINE_REQUEST_DURATION_SECONDS,
            HTTP_TIMEOUTS_TOTAL,
        ];
        for name in names {
            assert!(
                name.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
                "metric name not snake_case: {name}"
            );
        }
    }

    #[test]
    fn duration_metrics_use_seconds() {
        for name in [
            HTTP_REQUEST_DURATION_SECONDS,
            AGENT_TASK_DURATION_SECONDS,
            ENGINE_REQUEST_DURATION_SECONDS,
        ] {
            assert!(name.ends_with("_seconds"), "{name}");
        }
    }
}
