//! # esa-core
//!
//! Foundation types for the ESA multi-agent framework.
//!
//! This crate provides the shared vocabulary that the other ESA crates depend on:
//!
//! - **Branded IDs**: [`ids::LayerId`] (agent identity, 1–61), [`ids::TaskId`],
//!   [`ids::WorkflowId`]
//! - **Records**: [`task::AgentTask`], [`task::WorkResult`], [`task::Decision`]
//! - **Agent bookkeeping**: [`agent::AgentProfile`], [`agent::AgentStatus`] and the
//!   append-only history entry types
//! - **Logging**: [`logging::init_subscriber`]
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other esa crates.

#![deny(unsafe_code)]

pub mod agent;
pub mod ids;
pub mod logging;
pub mod task;
