//! # esa-llm
//!
//! The generation-engine collaborator consumed by every agent.
//!
//! - [`engine::GenerationEngine`]: the trait agents call: one prompt in,
//!   free text out, within a persistent [`engine::ChatSession`]
//! - [`engine::EngineError`]: transport/model failures with retry classification
//! - [`chat_completions::ChatCompletionsEngine`]: HTTP client for
//!   chat-completions compatible endpoints, with per-session conversation memory
//! - [`unavailable::UnavailableEngine`]: fails every call; used when no API key
//!   is configured
//! - `testutil::ScriptedEngine`: deterministic engine for tests (`testutil` feature)
//!
//! ## Crate Position
//!
//! Depends on nothing internal. Depended on by esa-runtime and esa-agent.

#![deny(unsafe_code)]

pub mod chat_completions;
pub mod engine;
pub mod unavailable;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use engine::{ChatSession, EngineError, EngineResult, GenerationEngine};
