//! # esa-agent
//!
//! ESA server binary: loads settings, builds the engine and agent roster,
//! and serves the HTTP surface until ctrl-c.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use esa_core::logging::{LogFormat, init_subscriber};
use esa_llm::GenerationEngine;
use esa_llm::chat_completions::{ChatCompletionsConfig, ChatCompletionsEngine};
use esa_llm::unavailable::UnavailableEngine;
use esa_runtime::roster::{build_registry, parse_roster};
use esa_server::{EsaServer, ServerConfig};
use esa_settings::{EngineSettings, EsaSettings, load_settings_from_path, settings_path};
use tracing::{info, warn};

/// ESA multi-agent orchestration server.
#[derive(Parser, Debug)]
#[command(name = "esa-agent", about = "ESA multi-agent orchestration server")]
struct Cli {
    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, 0 for auto-assign (overrides settings).
    #[arg(long)]
    port: Option<u16>,

    /// Path to the settings file (default `~/.esa/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Log level or `EnvFilter` directive (overrides settings).
    #[arg(long)]
    log_level: Option<String>,

    /// Emit JSON log lines.
    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    fn settings_file(&self) -> PathBuf {
        self.settings.clone().unwrap_or_else(settings_path)
    }

    /// Apply flag overrides on top of loaded settings.
    fn apply(&self, settings: &mut EsaSettings) {
        if let Some(host) = &self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(level) = &self.log_level {
            settings.logging.level.clone_from(level);
        }
        if self.json_logs {
            settings.logging.json = true;
        }
    }
}

/// Chat-completions engine when an API key is configured, otherwise an
/// engine that fails every call.
fn build_engine(settings: &EngineSettings) -> Arc<dyn GenerationEngine> {
    match settings.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
        Some(key) => {
            let mut config = ChatCompletionsConfig::new(key, settings.model.clone())
                .with_base_url(settings.base_url.clone())
                .with_max_history(settings.max_history_messages);
            config.temperature = settings.temperature;
            Arc::new(ChatCompletionsEngine::new(config))
        }
        None => {
            warn!("no engine API key configured, generation-backed calls will fail");
            Arc::new(UnavailableEngine::new("no engine API key configured"))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let path = args.settings_file();
    let mut settings = load_settings_from_path(&path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))?;
    args.apply(&mut settings);

    init_subscriber(
        &settings.logging.level,
        LogFormat::from_json_flag(settings.logging.json),
    );

    let metrics = esa_server::metrics::install_recorder()
        .context("Failed to install metrics recorder")?;

    let engine = build_engine(&settings.engine);
    let roster = parse_roster(&settings.roster.layers).context("Invalid agent roster")?;
    let registry = build_registry(&roster, &engine, settings.orchestrator.performance_window)
        .context("Failed to build agent registry")?;

    let server = EsaServer::new(ServerConfig::from(&settings.server), Arc::new(registry))
        .with_metrics(metrics);

    let (addr, handle) = server
        .listen()
        .await
        .context("Failed to bind server")?;

    info!(
        "ESA agent listening on http://{addr} ({} agents, model {})",
        server.registry().len(),
        engine.model()
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    info!("Shutting down...");
    server.shutdown().graceful_shutdown(handle, None).await;

    info!("Shutdown complete");
    Ok(())
}
