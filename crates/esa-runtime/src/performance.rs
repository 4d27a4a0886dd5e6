//! Rolling per-agent performance window.
//!
//! Tracks the most recent task outcomes per agent in a fixed-size ring
//! buffer. Feeds the performance report and the metrics handed to the
//! orchestrator's optimization pass. When the rolling success rate drops
//! below half, logs a warning and sets an `agent_degraded` gauge.

use std::collections::HashMap;

use esa_core::ids::LayerId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::orchestrator::AgentMetrics;

/// Default window size.
pub const DEFAULT_WINDOW: usize = 20;

/// Failure rate above which an agent counts as degraded.
const DEGRADED_THRESHOLD: f64 = 0.5;

#[derive(Clone, Copy)]
struct Sample {
    success: bool,
    duration_ms: u64,
}

struct AgentWindow {
    samples: Vec<Sample>,
    cursor: usize,
    total: usize,
}

impl AgentWindow {
    fn new(size: usize) -> Self {
        Self {
            samples: Vec::with_capacity(size),
            cursor: 0,
            total: 0,
        }
    }

    fn record(&mut self, sample: Sample, size: usize) {
        if self.samples.len() < size {
            self.samples.push(sample);
        } else {
            self.samples[self.cursor] = sample;
        }
        self.cursor = (self.cursor + 1) % size;
        self.total += 1;
    }

    fn metrics(&self) -> RollingMetrics {
        let samples = self.samples.len();
        if samples == 0 {
            return RollingMetrics::default();
        }
        let successes = self.samples.iter().filter(|s| s.success).count();
        let total_ms: u64 = self.samples.iter().map(|s| s.duration_ms).sum();
        RollingMetrics {
            samples,
            lifetime_samples: self.total,
            success_rate: successes as f64 / samples as f64 * 100.0,
            avg_response_time_ms: total_ms as f64 / samples as f64,
        }
    }
}

/// Rolling metrics for one agent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollingMetrics {
    /// Samples currently in the window.
    pub samples: usize,
    /// Samples ever recorded.
    pub lifetime_samples: usize,
    /// Percent successful within the window; `0` with no samples.
    pub success_rate: f64,
    /// Mean duration within the window; `0` with no samples.
    pub avg_response_time_ms: f64,
}

impl RollingMetrics {
    /// Metrics in the shape the optimization pass takes.
    pub fn to_agent_metrics(&self) -> AgentMetrics {
        AgentMetrics {
            success_rate: self.success_rate,
            avg_response_time_ms: self.avg_response_time_ms,
        }
    }
}

/// Per-agent rolling window. Share via `Arc` or embed in the registry.
pub struct PerformanceTracker {
    windows: Mutex<HashMap<LayerId, AgentWindow>>,
    window_size: usize,
}

impl PerformanceTracker {
    /// Tracker with [`DEFAULT_WINDOW`].
    pub fn new() -> Self {
        Self::with_window(DEFAULT_WINDOW)
    }

    /// Tracker keeping the last `window_size` outcomes (at least one).
    pub fn with_window(window_size: usize) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            window_size: window_size.max(1),
        }
    }

    /// Configured window size.
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Record one outcome.
    pub fn record(&self, agent: LayerId, success: bool, duration_ms: u64) {
        let mut windows = self.windows.lock();
        let window = windows
            .entry(agent)
            .or_insert_with(|| AgentWindow::new(self.window_size));
        window.record(
            Sample {
                success,
                duration_ms,
            },
            self.window_size,
        );

        let metrics = window.metrics();
        let failure_rate = 1.0 - metrics.success_rate / 100.0;
        let degraded = metrics.samples >= 2 && failure_rate > DEGRADED_THRESHOLD;
        metrics::gauge!("agent_degraded", "agent" => agent.label())
            .set(if degraded { 1.0 } else { 0.0 });

        if degraded && !success {
            warn!(
                agent_id = %agent,
                success_rate = format!("{:.0}%", metrics.success_rate),
                window = self.window_size,
                "agent degraded, low rolling success rate"
            );
        }
    }

    /// Rolling metrics for one agent; defaults when nothing was recorded.
    pub fn metrics_for(&self, agent: LayerId) -> RollingMetrics {
        self.windows
            .lock()
            .get(&agent)
            .map(AgentWindow::metrics)
            .unwrap_or_default()
    }

    /// Forget an agent's samples.
    pub fn forget(&self, agent: LayerId) {
        let _ = self.windows.lock().remove(&agent);
    }
}

impl Default for PerformanceTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PerformanceTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerformanceTracker")
            .field("window_size", &self.window_size)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(n: u32) -> LayerId {
        LayerId::new(n).unwrap()
    }

    #[test]
    fn unknown_agent_has_defaults() {
        let tracker = PerformanceTracker::new();
        let metrics = tracker.metrics_for(layer(1));
        assert_eq!(metrics.samples, 0);
        assert!(metrics.success_rate.abs() < f64::EPSILON);
        assert!(metrics.avg_response_time_ms.abs() < f64::EPSILON);
    }

    #[test]
    fn mixed_outcomes() {
        let tracker = PerformanceTracker::new();
        tracker.record(layer(1), true, 100);
        tracker.record(layer(1), false, 300);
        tracker.record(layer(1), true, 200);
        tracker.record(layer(1), true, 400);
        let metrics = tracker.metrics_for(layer(1));
        assert_eq!(metrics.samples, 4);
        assert!((metrics.success_rate - 75.0).abs() < 1e-9);
        assert!((metrics.avg_response_time_ms - 250.0).abs() < 1e-9);
    }

    #[test]
    fn window_rolls_over() {
        let tracker = PerformanceTracker::with_window(3);
        for _ in 0..3 {
            tracker.record(layer(14), false, 1000);
        }
        for _ in 0..3 {
            tracker.record(layer(14), true, 10);
        }
        let metrics = tracker.metrics_for(layer(14));
        assert_eq!(metrics.samples, 3);
        assert_eq!(metrics.lifetime_samples, 6);
        assert!((metrics.success_rate - 100.0).abs() < 1e-9);
        assert!((metrics.avg_response_time_ms - 10.0).abs() < 1e-9);
    }

    #[test]
    fn zero_window_is_clamped() {
        let tracker = PerformanceTracker::with_window(0);
        assert_eq!(tracker.window_size(), 1);
        tracker.record(layer(2), true, 5);
        tracker.record(layer(2), false, 7);
        assert_eq!(tracker.metrics_for(layer(2)).samples, 1);
    }

    #[test]
    fn agents_are_independent() {
        let tracker = PerformanceTracker::new();
        tracker.record(layer(1), false, 10);
        tracker.record(layer(2), true, 10);
        assert!(tracker.metrics_for(layer(1)).success_rate.abs() < f64::EPSILON);
        assert!((tracker.metrics_for(layer(2)).success_rate - 100.0).abs() < 1e-9);
        tracker.forget(layer(1));
        assert_eq!(tracker.metrics_for(layer(1)).samples, 0);
    }
}
