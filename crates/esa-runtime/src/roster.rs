//! Startup roster: which specializations to instantiate.

use std::sync::Arc;

use esa_llm::GenerationEngine;
use tracing::info;

use crate::agent::{Agent, FunctionalAgent, Specialization};
use crate::errors::RegistryError;
use crate::orchestrator::OrchestratorAgent;
use crate::registry::AgentRegistry;

/// Parse roster labels. An empty list selects every built-in specialization.
///
/// Duplicates are dropped, keeping the first occurrence.
pub fn parse_roster(labels: &[String]) -> Result<Vec<Specialization>, RegistryError> {
    if labels.is_empty() {
        return Ok(Specialization::ALL.to_vec());
    }
    let mut roster = Vec::with_capacity(labels.len());
    for label in labels {
        let spec = Specialization::from_label(label)
            .ok_or_else(|| RegistryError::UnknownSpecialization(label.clone()))?;
        if !roster.contains(&spec) {
            roster.push(spec);
        }
    }
    Ok(roster)
}

/// Build a registry with one agent per specialization, all sharing `engine`.
pub fn build_registry(
    roster: &[Specialization],
    engine: &Arc<dyn GenerationEngine>,
    performance_window: usize,
) -> Result<AgentRegistry, RegistryError> {
    let registry = AgentRegistry::with_performance_window(performance_window);
    for &spec in roster {
        let agent: Arc<dyn Agent> = match spec {
            Specialization::Orchestration => Arc::new(OrchestratorAgent::new(Arc::clone(engine))),
            _ => Arc::new(FunctionalAgent::new(spec, Arc::clone(engine))),
        };
        registry.register_agent(agent)?;
    }
    info!(
        agents = registry.len(),
        orchestrator = registry.has_orchestrator(),
        model = engine.model(),
        "agent roster ready"
    );
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use esa_llm::testutil::ScriptedEngine;

    #[test]
    fn empty_roster_selects_all() {
        assert_eq!(parse_roster(&[]).unwrap().len(), Specialization::ALL.len());
    }

    #[test]
    fn labels_parse_and_dedupe() {
        let labels = vec!["reasoning".to_string(), "Orchestration".into(), "reasoning".into()];
        assert_eq!(
            parse_roster(&labels).unwrap(),
            vec![Specialization::Reasoning, Specialization::Orchestration]
        );
    }

    #[test]
    fn unknown_label_is_an_error() {
        assert_matches!(
            parse_roster(&["telepathy".to_string()]),
            Err(RegistryError::UnknownSpecialization(ref l)) if l == "telepathy"
        );
    }

    #[test]
    fn full_roster_has_orchestrator() {
        let engine: Arc<dyn GenerationEngine> = Arc::new(ScriptedEngine::replying("x"));
        let registry = build_registry(&Specialization::ALL, &engine, 5).unwrap();
        assert_eq!(registry.len(), 8);
        assert!(registry.has_orchestrator());
        assert_eq!(registry.performance_report().window, 5);
    }

    #[test]
    fn roster_without_orchestrator() {
        let engine: Arc<dyn GenerationEngine> = Arc::new(ScriptedEngine::replying("x"));
        let registry = build_registry(&[Specialization::Reasoning], &engine, 5).unwrap();
        assert!(!registry.has_orchestrator());
    }
}
