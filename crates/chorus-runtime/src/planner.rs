//! Orchestration planner: one structured classification call, fail-soft.
//!
//! Whatever goes wrong — transport failure, non-2xx, a reply missing the
//! required boolean/array shape — the planner answers with the
//! non-actionable plan so the caller always has the direct-response path to
//! fall back on. Planning never returns an error.

use std::sync::Arc;

use chorus_core::plan::{OrchestrationPlan, plan_schema};
use chorus_llm::{GenerateRequest, TextProvider};
use metrics::counter;
use tracing::{debug, instrument, warn};

use crate::prompts;

/// Classifies user requests into direct responses or action plans.
pub struct OrchestrationPlanner {
    text: Arc<dyn TextProvider>,
}

impl OrchestrationPlanner {
    /// Create a planner over a text provider.
    #[must_use]
    pub fn new(text: Arc<dyn TextProvider>) -> Self {
        Self { text }
    }

    /// Produce a plan for one user request. Never fails: any error or
    /// malformed reply yields [`OrchestrationPlan::direct`].
    #[instrument(skip(self), fields(has_files))]
    pub async fn plan(&self, request_text: &str, has_files: bool) -> OrchestrationPlan {
        let prompt = prompts::plan_detection(request_text, has_files);
        let request = GenerateRequest::new(prompt);

        let reply = match self.text.generate_structured(request, plan_schema()).await {
            Ok(reply) => reply,
            Err(e) => {
                counter!("planner_fallbacks", "reason" => "call_failed").increment(1);
                warn!(error = %e, category = e.category(), "plan detection failed, using direct response");
                return OrchestrationPlan::direct();
            }
        };

        match OrchestrationPlan::from_value(&reply) {
            Some((plan, dropped)) => {
                if dropped > 0 {
                    warn!(dropped, "plan contained unknown action kinds");
                }
                debug!(
                    is_orchestration = plan.is_orchestration,
                    actions = plan.actions.len(),
                    actionable = plan.is_actionable(),
                    "plan detected"
                );
                plan
            }
            None => {
                counter!("planner_fallbacks", "reason" => "malformed").increment(1);
                warn!("plan reply missing required shape, using direct response");
                OrchestrationPlan::direct()
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chorus_llm::{ProviderError, ProviderResult};
    use mockall::mock;
    use serde_json::{Value, json};

    mock! {
        Text {}

        #[async_trait]
        impl TextProvider for Text {
            async fn generate(&self, request: GenerateRequest) -> ProviderResult<String>;
            async fn generate_structured(
                &self,
                request: GenerateRequest,
                schema: Value,
            ) -> ProviderResult<Value>;
        }
    }

    fn planner_with_reply(reply: ProviderResult<Value>) -> OrchestrationPlanner {
        let mut text = MockText::new();
        let mut reply = Some(reply);
        let _ = text
            .expect_generate_structured()
            .times(1)
            .returning(move |_, _| reply.take().expect("single call"));
        OrchestrationPlanner::new(Arc::new(text))
    }

    #[tokio::test]
    async fn actionable_plan_passes_through() {
        let planner = planner_with_reply(Ok(json!({
            "is_orchestration": true,
            "steps": ["Analyze", "Respond"],
            "actions": [{"type": "analyze_data"}, {"type": "respond"}]
        })));
        let plan = planner.plan("analyze my data", true).await;
        assert!(plan.is_actionable());
        assert_eq!(plan.steps.len(), 2);
    }

    #[tokio::test]
    async fn provider_error_falls_back_to_direct() {
        let planner = planner_with_reply(Err(ProviderError::Api {
            status: 500,
            message: "down".into(),
        }));
        let plan = planner.plan("hello", false).await;
        assert!(!plan.is_actionable());
        assert_eq!(plan, OrchestrationPlan::direct());
    }

    #[tokio::test]
    async fn malformed_shape_falls_back_to_direct() {
        let planner = planner_with_reply(Ok(json!({"text": "I cannot classify this"})));
        let plan = planner.plan("hello", false).await;
        assert_eq!(plan, OrchestrationPlan::direct());
    }

    #[tokio::test]
    async fn unknown_kinds_are_dropped_but_plan_survives() {
        let planner = planner_with_reply(Ok(json!({
            "is_orchestration": true,
            "actions": [
                {"type": "analyze_data"},
                {"type": "teleport"},
                {"type": "respond"}
            ]
        })));
        let plan = planner.plan("analyze", true).await;
        assert_eq!(plan.actions.len(), 2);
        assert!(plan.is_actionable());
    }

    #[tokio::test]
    async fn prompt_carries_request_and_schema() {
        let mut text = MockText::new();
        let _ = text
            .expect_generate_structured()
            .withf(|request, schema| {
                request.prompt.contains("compare these datasets")
                    && request.prompt.contains("Has attached files: true")
                    && !request.open_domain
                    && schema["properties"]["is_orchestration"]["type"] == "boolean"
            })
            .times(1)
            .returning(|_, _| Ok(json!({"is_orchestration": false, "actions": []})));
        let planner = OrchestrationPlanner::new(Arc::new(text));
        let _ = planner.plan("compare these datasets", true).await;
    }
}
