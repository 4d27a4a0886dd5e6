//! Prompt composition for the four generation-backed operations.

use esa_core::agent::AgentProfile;
use esa_core::ids::LayerId;
use esa_core::task::AgentTask;
use serde::Serialize;
use serde_json::Value;

/// Conversation identity for an agent: `layer-<id>-<slug>`.
pub fn session_id(id: LayerId, name: &str) -> String {
    format!("layer-{id}-{}", slugify(name))
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for word in name.split_whitespace() {
        if !slug.is_empty() {
            slug.push('-');
        }
        if word == "&" {
            slug.push_str("and");
        } else {
            slug.push_str(&word.to_lowercase().replace('&', "-and-"));
        }
    }
    slug
}

/// Two-space indented JSON, falling back to compact `Debug` text.
pub fn pretty_json<T: Serialize + std::fmt::Debug>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| format!("{value:?}"))
}

/// Prompt for `execute_work`.
pub fn work_prompt(profile: &AgentProfile, task: &AgentTask) -> String {
    format!(
        "AGENT SPECIALIZATION: {spec}
LAYER {id}: {name}

TASK TO PERFORM:
Type: {task_type}
Description: {description}
Expected Output: {expected}

CONTEXT:
{context}

INSTRUCTIONS:
1. Analyze the task using your specialized expertise
2. Perform the requested work with domain-specific knowledge
3. Provide detailed, actionable results
4. Include specific recommendations and next steps
5. Format technical outputs as structured data when appropriate

Deliver professional-grade work that demonstrates your expertise in {spec}.",
        spec = profile.specialization,
        id = profile.id,
        name = profile.name,
        task_type = task.task_type,
        description = task.description,
        expected = task.expected_output,
        context = pretty_json(&task.context),
    )
}

/// Prompt for `make_decision`.
pub fn decision_prompt(
    profile: &AgentProfile,
    context: &Value,
    options: Option<&[Value]>,
) -> String {
    let options = match options {
        Some(options) if !options.is_empty() => pretty_json(&options),
        _ => "Analyze context and determine best course of action".to_string(),
    };
    format!(
        "AGENT EXPERTISE: {spec} (Layer {id}: {name})

DECISION CONTEXT:
{context}

AVAILABLE OPTIONS:
{options}

DECISION REQUIREMENTS:
1. Analyze the situation using your domain expertise
2. Consider all relevant factors and constraints
3. Evaluate potential outcomes and risks
4. Make a clear, justified decision
5. Provide confidence level and alternative approaches

RESPONSE FORMAT (JSON):
{{
    \"decision\": \"your chosen decision\",
    \"reasoning\": \"detailed explanation of why this decision is optimal\",
    \"confidence\": 0.85,
    \"alternatives\": [\"alternative1\", \"alternative2\"],
    \"risks\": [\"potential risk1\", \"potential risk2\"],
    \"benefits\": [\"benefit1\", \"benefit2\"],
    \"next_steps\": [\"step1\", \"step2\"]
}}",
        spec = profile.specialization,
        id = profile.id,
        name = profile.name,
        context = pretty_json(context),
    )
}

/// Prompt for `learn_from_experience`.
pub fn learning_prompt(profile: &AgentProfile, experience: &Value) -> String {
    format!(
        "AGENT LEARNING SESSION: Layer {id} ({name})
SPECIALIZATION: {spec}

EXPERIENCE TO LEARN FROM:
{experience}

LEARNING OBJECTIVES:
1. Identify key insights from this experience
2. Determine what worked well and what could be improved
3. Extract patterns and principles for future application
4. Update your approach based on these learnings
5. Suggest improvements to your domain processes

OUTPUT FORMAT:
{{
    \"key_insights\": [\"insight1\", \"insight2\"],
    \"improvements_identified\": [\"improvement1\", \"improvement2\"],
    \"new_strategies\": [\"strategy1\", \"strategy2\"],
    \"knowledge_updates\": \"summary of updated understanding\",
    \"future_applications\": [\"application1\", \"application2\"],
    \"confidence_in_learning\": 0.9
}}",
        id = profile.id,
        name = profile.name,
        spec = profile.specialization,
        experience = pretty_json(experience),
    )
}

/// Prompt for `collaborate_with`.
pub fn collaboration_prompt(
    profile: &AgentProfile,
    peers: &[AgentProfile],
    workflow: &Value,
) -> String {
    let peer_list = if peers.is_empty() {
        "- (none)".to_string()
    } else {
        peers
            .iter()
            .map(|p| format!("- Layer {}: {} ({})", p.id, p.name, p.specialization))
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!(
        "MULTI-AGENT COLLABORATION: Layer {id} ({name})
YOUR ROLE: {spec}

WORKFLOW CONTEXT:
{workflow}

COLLABORATING AGENTS:
{peer_list}

COLLABORATION OBJECTIVES:
1. Define your specific contribution to this workflow
2. Identify coordination points with other agents
3. Specify data/information you need from other agents
4. Outline deliverables you will provide
5. Suggest optimal collaboration sequence

OUTPUT FORMAT:
{{
    \"your_contribution\": \"specific work you will perform\",
    \"coordination_points\": [\"point1\", \"point2\"],
    \"dependencies\": [\"dependency1\", \"dependency2\"],
    \"deliverables\": [\"deliverable1\", \"deliverable2\"],
    \"timeline\": \"estimated completion time\",
    \"success_criteria\": [\"criteria1\", \"criteria2\"]
}}",
        id = profile.id,
        name = profile.name,
        spec = profile.specialization,
        workflow = pretty_json(workflow),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
