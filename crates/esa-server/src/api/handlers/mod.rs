//! Route handlers, grouped by resource.

pub mod agents;
pub mod framework;
pub mod orchestrator;
pub mod workflows;
