//! # esa-runtime
//!
//! Agent contract, specialized agents, orchestrator, and registry.
//!
//! - [`agent::Agent`]: the capability contract every worker implements
//! - [`agent::Specialization`]: the closed set of built-in specializations
//! - [`agent::FunctionalAgent`]: leaf agent bound to one specialization and one
//!   engine conversation; calls into one agent are serialized
//! - [`orchestrator::OrchestratorAgent`]: plans workflows, distributes work,
//!   arbitrates conflicts, and proposes performance improvements
//! - [`registry::AgentRegistry`]: explicitly constructed directory of agents
//!   with a back-reference to the orchestrator
//! - [`performance::PerformanceTracker`]: rolling per-agent outcome window
//!
//! ## Crate Position
//!
//! Depends on esa-core and esa-llm. Depended on by esa-server and esa-agent.

#![deny(unsafe_code)]

pub mod agent;
pub mod errors;
pub mod orchestrator;
pub mod performance;
pub mod registry;
pub mod roster;

pub use agent::{Agent, FunctionalAgent, Specialization};
pub use errors::RegistryError;
pub use orchestrator::OrchestratorAgent;
pub use registry::AgentRegistry;
