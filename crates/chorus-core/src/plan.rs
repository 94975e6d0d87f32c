//! Orchestration plans: the planner's decision about whether a request needs
//! multiple dependent service calls, and the ordered list of those calls.
//!
//! Parsing is deliberately lenient. The planner must fail soft on anything
//! malformed, so [`OrchestrationPlan::from_value`] returns `None` only when
//! the required boolean/array shape is missing; individual actions whose
//! `type` falls outside the closed [`ActionKind`] set are dropped while the
//! rest of the plan survives.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// The closed set of orchestration action kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Parse an uploaded file and analyze it.
    AnalyzeData,
    /// Build a chart from a prior analysis.
    CreateVisualization,
    /// Summarize accumulated findings.
    Summarize,
    /// Pull active knowledge-base content.
    RetrieveKnowledge,
    /// Produce the final synthesized answer.
    Respond,
}

impl ActionKind {
    /// Wire name of the kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AnalyzeData => "analyze_data",
            Self::CreateVisualization => "create_visualization",
            Self::Summarize => "summarize",
            Self::RetrieveKnowledge => "retrieve_knowledge",
            Self::Respond => "respond",
        }
    }
}

/// One typed unit of work within a plan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// What to do.
    #[serde(rename = "type")]
    pub kind: ActionKind,
    /// Free-form parameter bag. The kind determines which keys matter.
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl Action {
    /// An action of the given kind with no parameters.
    #[must_use]
    pub fn of(kind: ActionKind) -> Self {
        Self {
            kind,
            params: Map::new(),
        }
    }
}

/// The planner's decision for one user request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationPlan {
    /// Whether the request needs multi-step execution.
    pub is_orchestration: bool,
    /// Human-readable step descriptions for progress display.
    #[serde(default)]
    pub steps: Vec<String>,
    /// Ordered actions to execute.
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl OrchestrationPlan {
    /// The non-actionable plan: fall through to the direct-response path.
    #[must_use]
    pub fn direct() -> Self {
        Self::default()
    }

    /// A plan drives the pipeline only when the model asked for
    /// orchestration *and* more than one action survived parsing. A
    /// single-action plan is equivalent to a direct response.
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        self.is_orchestration && self.actions.len() > 1
    }

    /// Leniently parse a structured planner reply.
    ///
    /// Returns `None` when the required shape (`is_orchestration` boolean,
    /// `actions` array) is absent. Unknown action kinds are dropped; the
    /// second tuple element is how many were dropped.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<(Self, usize)> {
        let is_orchestration = value.get("is_orchestration")?.as_bool()?;
        let raw_actions = value.get("actions")?.as_array()?;

        let steps = value
            .get("steps")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        let actions: Vec<Action> = raw_actions
            .iter()
            .filter_map(|a| serde_json::from_value(a.clone()).ok())
            .collect();
        let dropped = raw_actions.len() - actions.len();

        Some((
            Self {
                is_orchestration,
                steps,
                actions,
            },
            dropped,
        ))
    }
}

/// JSON schema constraining the plan-detection call.
#[must_use]
pub fn plan_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "is_orchestration": { "type": "boolean" },
            "steps": { "type": "array", "items": { "type": "string" } },
            "actions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "type": { "type": "string" },
                        "params": { "type": "object" }
                    }
                }
            }
        }
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
