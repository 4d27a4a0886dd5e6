//! In-flight task counts per agent.

use std::collections::{BTreeMap, HashMap};

use esa_core::ids::LayerId;
use metrics::gauge;
use parking_lot::Mutex;

/// Counts tasks currently executing on each agent.
#[derive(Debug, Default)]
pub struct WorkloadTracker {
    counts: Mutex<HashMap<LayerId, usize>>,
}

impl WorkloadTracker {
    /// Empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one task on `agent` until the guard is dropped.
    pub fn begin(&self, agent: LayerId) -> WorkloadGuard<'_> {
        self.adjust(agent, true);
        WorkloadGuard {
            tracker: self,
            agent,
        }
    }

    /// Current count for one agent.
    pub fn current(&self, agent: LayerId) -> usize {
        self.counts.lock().get(&agent).copied().unwrap_or(0)
    }

    /// Agents with at least one task in flight.
    pub fn snapshot(&self) -> BTreeMap<LayerId, usize> {
        self.counts
            .lock()
            .iter()
            .filter(|(_, n)| **n > 0)
            .map(|(id, n)| (*id, *n))
            .collect()
    }

    fn adjust(&self, agent: LayerId, increment: bool) {
        let mut counts = self.counts.lock();
        let count = counts.entry(agent).or_default();
        if increment {
            *count += 1;
        } else {
            *count = count.saturating_sub(1);
        }
        gauge!("agent_workload", "agent" => agent.label()).set(*count as f64);
    }
}

/// Decrements the agent's count on drop, including on cancellation.
#[derive(Debug)]
pub struct WorkloadGuard<'a> {
    tracker: &'a WorkloadTracker,
    agent: LayerId,
}

impl Drop for WorkloadGuard<'_> {
    fn drop(&mut self) {
        self.tracker.adjust(self.agent, false);
    }
}
