//! # esa-server
//!
//! Axum HTTP request surface over the agent registry.
//!
//! - `/health` and `/metrics` (Prometheus text format)
//! - `/api/...` JSON endpoints for agents, workflows, and orchestration
//! - Registry errors mapped to status codes with a stable `{"error": {code, message}}` body
//! - Host-applied timeout around every generation-backed request
//! - Graceful shutdown via `CancellationToken`
//!
//! ## Crate Position
//!
//! Depends on esa-core, esa-settings, and esa-runtime. Depended on by esa-agent.

#![deny(unsafe_code)]

pub mod api;
pub mod config;
pub mod health;
pub mod metrics;
pub mod server;
pub mod shutdown;

pub use api::errors::ApiError;
pub use config::ServerConfig;
pub use server::EsaServer;
