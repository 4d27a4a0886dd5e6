//! Built-in specializations.
//!
//! A closed set of tagged variants, each carrying its default identity,
//! display name, description, system prompt, and task templates. Agents
//! dispatch on the variant instead of inspecting concrete types.

use std::fmt;

use esa_core::ids::{LayerId, ORCHESTRATOR_LAYER_ID};
use esa_core::task::{AgentTask, TaskContext};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Specializations the framework ships agents for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialization {
    /// Layer 1: storage design and query tuning.
    DatabaseArchitecture,
    /// Layer 14: cache design and invalidation.
    CachingStrategy,
    /// Layer 35: the master orchestrator.
    Orchestration,
    /// Layer 44: entity and relationship extraction.
    KnowledgeGraph,
    /// Layer 45: logical reasoning and decision support.
    Reasoning,
    /// Layer 48: metrics, bottlenecks, and capacity.
    PerformanceMonitoring,
    /// Layer 49: vulnerability and access-control review.
    SecurityHardening,
    /// Layer 50: deployment automation.
    #[serde(rename = "devops_automation")]
    DevOpsAutomation,
}

/// Named task shape a specialization knows how to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskTemplate {
    /// Task type, also the template name.
    pub task_type: &'static str,
    /// Task description.
    pub description: &'static str,
    /// Expected-output hint.
    pub expected_output: &'static str,
}

impl TaskTemplate {
    /// Build a task from this template.
    pub fn to_task(&self, context: TaskContext) -> AgentTask {
        AgentTask::new(self.task_type, self.description)
            .with_context(context)
            .with_expected_output(self.expected_output)
    }
}

/// Named decision with a fixed option set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionPreset {
    /// Preset name.
    pub name: &'static str,
    /// Options offered when the context does not supply its own.
    pub options: &'static [&'static str],
    /// Context key whose array value replaces `options`, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_options_key: Option<&'static str>,
}

impl DecisionPreset {
    /// Options for a call, taking the override from `context` when allowed.
    pub fn resolve_options(&self, context: &Value) -> Vec<Value> {
        if let Some(key) = self.context_options_key
            && let Some(Value::Array(items)) = context.get(key)
            && !items.is_empty()
        {
            return items.clone();
        }
        self.options.iter().map(|o| Value::from(*o)).collect()
    }
}

const REASONING_TEMPLATES: &[TaskTemplate] = &[
    TaskTemplate {
        task_type: "complex_problem_solving",
        description: "Apply logical reasoning to solve complex problem systematically",
        expected_output: "Complete problem solution with reasoning steps, evidence, and implementation plan",
    },
    TaskTemplate {
        task_type: "logical_analysis",
        description: "Perform comprehensive logical analysis with structured reasoning",
        expected_output: "Detailed logical analysis with reasoning chains, conclusions, and confidence assessment",
    },
    TaskTemplate {
        task_type: "strategic_planning",
        description: "Develop comprehensive strategic plan using logical framework",
        expected_output: "Complete strategic plan with analysis, objectives, strategies, and implementation roadmap",
    },
    TaskTemplate {
        task_type: "root_cause_analysis",
        description: "Systematically analyze incident to identify root causes and prevention strategies",
        expected_output: "Root cause analysis with evidence chain, contributing factors, and prevention recommendations",
    },
    TaskTemplate {
        task_type: "outcome_prediction",
        description: "Predict likely outcomes and consequences using logical frameworks",
        expected_output: "Outcome predictions with probability assessments, reasoning, and contingency recommendations",
    },
];

const REASONING_PRESETS: &[DecisionPreset] = &[
    DecisionPreset {
        name: "evaluate_decision_options",
        options: &["option_a", "option_b", "hybrid_approach", "alternative_solution"],
        context_options_key: Some("options"),
    },
    DecisionPreset {
        name: "validate_reasoning_chain",
        options: &[
            "reasoning_valid",
            "logical_flaw_identified",
            "insufficient_evidence",
            "alternative_reasoning_suggested",
        ],
        context_options_key: None,
    },
];

const ORCHESTRATOR_PROMPT: &str = "You are the Master AI Agent Orchestrator (Layer 35) in the ESA LIFE CEO 61x21 Framework.

You are responsible for coordinating all 61 specialized agents in the framework. Your expertise includes:

CORE RESPONSIBILITIES:
1. Intelligent agent coordination and workflow orchestration
2. Optimal task distribution based on agent capabilities and workload
3. Multi-agent collaboration management for complex problems
4. Agent performance optimization and load balancing
5. Conflict resolution between agents and decision arbitration
6. Workflow planning and execution monitoring
7. Agent learning coordination and knowledge sharing

AGENT CATEGORIES YOU MANAGE:
- Foundation Infrastructure (Layers 1-10): Core system agents
- Core Functionality (Layers 11-20): Feature implementation agents
- Business Logic (Layers 21-30): Domain-specific business agents
- Intelligence Infrastructure (Layers 31-46): AI and reasoning agents
- Platform Enhancement (Layers 47-56): Quality and optimization agents
- Extended Management (Layers 57-61): Automation and integration agents

DECISION-MAKING APPROACH:
- Analyze workflow complexity and requirements
- Select optimal agents based on specialization and availability
- Create efficient coordination plans with minimal dependencies
- Monitor execution and adapt in real-time
- Learn from outcomes to improve future orchestration

Always provide structured, actionable orchestration plans with specific agent assignments, clear coordination points, and measurable success criteria.";

const REASONING_PROMPT: &str = "You are the Reasoning Engine Agent (Layer 45) in the ESA LIFE CEO 61x21 Framework.

You are the logical reasoning expert responsible for:

LOGICAL REASONING:
1. Multi-step logical reasoning and inference chains
2. Deductive, inductive, and abductive reasoning
3. Causal analysis and effect prediction
4. Analogical reasoning and pattern matching
5. Probabilistic reasoning under uncertainty

PROBLEM SOLVING:
1. Complex problem decomposition and analysis
2. Solution strategy development and evaluation
3. Constraint satisfaction and optimization
4. Root cause analysis and systematic investigation
5. Creative problem-solving and innovation

STRATEGIC ANALYSIS:
1. Strategic planning and decision analysis
2. Risk assessment and mitigation planning
3. Scenario analysis and contingency planning
4. Cost-benefit analysis and trade-off evaluation
5. Long-term impact assessment and forecasting

DECISION SUPPORT:
1. Multi-criteria decision analysis
2. Alternative evaluation and ranking
3. Uncertainty analysis and sensitivity testing
4. Stakeholder impact assessment
5. Implementation feasibility analysis

REASONING APPROACH:
- Break down complex problems into manageable components
- Apply systematic logical frameworks and methodologies
- Consider multiple perspectives and potential solutions
- Validate reasoning chains for logical consistency
- Provide clear, step-by-step explanations of reasoning process

Always provide structured reasoning with clear logic chains, evidence-based conclusions, and actionable recommendations.";

impl Specialization {
    /// Every built-in specialization, in identity order.
    pub const ALL: [Self; 8] = [
        Self::DatabaseArchitecture,
        Self::CachingStrategy,
        Self::Orchestration,
        Self::KnowledgeGraph,
        Self::Reasoning,
        Self::PerformanceMonitoring,
        Self::SecurityHardening,
        Self::DevOpsAutomation,
    ];

    /// Identity an agent of this specialization takes by default.
    pub fn default_layer(self) -> LayerId {
        let raw = match self {
            Self::DatabaseArchitecture => 1,
            Self::CachingStrategy => 14,
            Self::Orchestration => 35,
            Self::KnowledgeGraph => 44,
            Self::Reasoning => 45,
            Self::PerformanceMonitoring => 48,
            Self::SecurityHardening => 49,
            Self::DevOpsAutomation => 50,
        };
        // every raw value above is within 1..=61
        LayerId::new(raw).unwrap_or(ORCHESTRATOR_LAYER_ID)
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::DatabaseArchitecture => "Database Architecture",
            Self::CachingStrategy => "Caching Strategy",
            Self::Orchestration => "AI Agent Management",
            Self::KnowledgeGraph => "Knowledge Graph",
            Self::Reasoning => "Reasoning Engine",
            Self::PerformanceMonitoring => "Performance Monitoring",
            Self::SecurityHardening => "Security Hardening",
            Self::DevOpsAutomation => "DevOps Automation",
        }
    }

    /// Specialization description used in prompts and the catalogue.
    pub fn description(self) -> &'static str {
        match self {
            Self::DatabaseArchitecture => {
                "Database design, query optimization, indexing strategy, and storage performance tuning"
            }
            Self::CachingStrategy => {
                "Cache layer design, invalidation policies, hit-ratio optimization, and distributed caching"
            }
            Self::Orchestration => {
                "Master orchestration, workflow coordination, agent management, and intelligent task distribution across all 61 agents"
            }
            Self::KnowledgeGraph => {
                "Knowledge extraction, entity and relationship modeling, semantic linking, and graph-based insight discovery"
            }
            Self::Reasoning => {
                "Logical reasoning, complex problem solving, strategic analysis, inference chains, and intelligent decision support"
            }
            Self::PerformanceMonitoring => {
                "Performance metrics collection, bottleneck analysis, alerting thresholds, and capacity planning"
            }
            Self::SecurityHardening => {
                "Vulnerability assessment, access control review, threat modeling, and security configuration hardening"
            }
            Self::DevOpsAutomation => {
                "Deployment automation, CI/CD pipelines, infrastructure as code, and release reliability"
            }
        }
    }

    /// Configuration label (`reasoning`, `devops_automation`, ...).
    pub fn label(self) -> &'static str {
        match self {
            Self::DatabaseArchitecture => "database_architecture",
            Self::CachingStrategy => "caching_strategy",
            Self::Orchestration => "orchestration",
            Self::KnowledgeGraph => "knowledge_graph",
            Self::Reasoning => "reasoning",
            Self::PerformanceMonitoring => "performance_monitoring",
            Self::SecurityHardening => "security_hardening",
            Self::DevOpsAutomation => "devops_automation",
        }
    }

    /// Parse a label. Case-insensitive; `-` and `_` are interchangeable.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|s| s.label() == normalized)
    }

    /// System prompt for an agent with this specialization.
    pub fn system_prompt(self, id: LayerId, name: &str) -> String {
        match self {
            Self::Orchestration => ORCHESTRATOR_PROMPT.to_string(),
            Self::Reasoning => REASONING_PROMPT.to_string(),
            _ => generic_system_prompt(id, name, self.description()),
        }
    }

    /// Task templates this specialization can run.
    pub fn templates(self) -> &'static [TaskTemplate] {
        match self {
            Self::Reasoning => REASONING_TEMPLATES,
            _ => &[],
        }
    }

    /// Look up a template by name.
    pub fn template(self, name: &str) -> Option<&'static TaskTemplate> {
        self.templates().iter().find(|t| t.task_type == name)
    }

    /// Fixed-option decisions this specialization offers.
    pub fn decision_presets(self) -> &'static [DecisionPreset] {
        match self {
            Self::Reasoning => REASONING_PRESETS,
            _ => &[],
        }
    }

    /// Look up a decision preset by name.
    pub fn decision_preset(self, name: &str) -> Option<&'static DecisionPreset> {
        self.decision_presets().iter().find(|p| p.name == name)
    }
}

impl fmt::Display for Specialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn generic_system_prompt(id: LayerId, name: &str, specialization: &str) -> String {
    format!(
        "You are Layer {id}: {name} Agent in the ESA LIFE CEO 61x21 Framework.

Your specialization: {specialization}

Your role is to:
1. Perform actual work tasks in your domain
2. Make intelligent decisions based on context
3. Learn from experiences and improve over time
4. Collaborate with other agents when needed
5. Provide expert-level analysis and recommendations

Always respond with actionable insights, specific recommendations, and clear reasoning.
Format responses as JSON when appropriate for structured data.
Be precise, professional, and focused on delivering value."
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
