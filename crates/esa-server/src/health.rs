//! `/health` endpoint.

use serde::Serialize;
use std::time::Instant;

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server is running.
    pub status: String,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Registered agent count.
    pub agents: usize,
    /// Whether the orchestrator is registered.
    pub orchestrator_available: bool,
    /// Workflows not yet completed or failed.
    pub active_workflows: usize,
}

/// Build a health response from live counters.
pub fn health_check(
    start_time: Instant,
    agents: usize,
    orchestrator_available: bool,
    active_workflows: usize,
) -> HealthResponse {
    HealthResponse {
        status: "ok".into(),
        uptime_secs: start_time.elapsed().as_secs(),
        agents,
        orchestrator_available,
        active_workflows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_ok() {
        let resp = health_check(Instant::now(), 0, false, 0);
        assert_eq!(resp.status, "ok");
    }

    #[test]
    fn uptime_starts_at_zero() {
        let resp = health_check(Instant::now(), 0, false, 0);
        assert!(resp.uptime_secs < 2);
    }

    #[test]
    fn uptime_increases() {
        let start = Instant::now()
            .checked_sub(std::time::Duration::from_secs(60))
            .unwrap();
        let resp = health_check(start, 0, false, 0);
        assert!(resp.uptime_secs >= 59);
    }

    #[test]
    fn serialization() {
        let resp = health_check(Instant::now(), 8, true, 1);
        let parsed = serde_json::to_value(&resp).unwrap();
        assert_eq!(parsed["status"], "ok");
        assert_eq!(parsed["agents"], 8);
        assert_eq!(parsed["orchestrator_available"], true);
        assert_eq!(parsed["active_workflows"], 1);
        assert!(parsed["uptime_secs"].is_number());
    }
}
