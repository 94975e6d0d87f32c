//! Per-action execution against the result set.
//!
//! One method per [`ActionKind`]. Every method declares its prerequisite
//! slots by pattern-matching the [`ResultSet`]; a missing prerequisite skips
//! the action *before* any external call is made. A failing action is
//! logged and tolerated — the pipeline always advances.

use std::sync::Arc;

use chorus_core::knowledge::{active_content, fact_lines};
use chorus_core::plan::{Action, ActionKind};
use chorus_core::table::DataTable;
use chorus_core::viz::{ChartSpec, NewVisualization, VizConfig, chart_spec_schema};
use chorus_llm::{GenerateRequest, TextProvider};
use chorus_settings::LimitSettings;
use chorus_store::Stores;
use tracing::{debug, warn};

use crate::errors::RuntimeResult;
use crate::pipeline::results::{ResultSet, StepResult};
use crate::prompts;
use crate::state::UploadedFile;

/// Source label stamped onto pipeline-created visualization records.
const PIPELINE_SOURCE: &str = "Orchestration Analysis";

/// How one action ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action wrote its result.
    Completed,
    /// A prerequisite slot was absent; no external call was made.
    Skipped,
    /// The action failed; the pipeline continues.
    Failed,
}

/// Executes one action at a time against a [`ResultSet`].
pub struct ActionExecutor {
    text: Arc<dyn TextProvider>,
    stores: Stores,
    limits: LimitSettings,
}

impl ActionExecutor {
    /// Create an executor over the generation and persistence collaborators.
    #[must_use]
    pub fn new(text: Arc<dyn TextProvider>, stores: Stores, limits: LimitSettings) -> Self {
        Self {
            text,
            stores,
            limits,
        }
    }

    /// Execute one action. Never propagates an error; the outcome reports
    /// what happened.
    pub async fn execute(
        &self,
        action: &Action,
        request_text: &str,
        uploads: &[UploadedFile],
        results: &mut ResultSet,
    ) -> ActionOutcome {
        let kind = action.kind;
        let produced = match kind {
            ActionKind::AnalyzeData => self.analyze_data(uploads).await,
            ActionKind::CreateVisualization => self.create_visualization(results).await,
            ActionKind::Summarize => self.summarize(request_text, results).await,
            ActionKind::RetrieveKnowledge => self.retrieve_knowledge().await,
            ActionKind::Respond => self.respond(request_text, results).await,
        };

        match produced {
            Ok(Some(result)) => {
                let slot = result.slot();
                if results.insert(result) {
                    debug!(kind = kind.as_str(), slot, "action completed");
                    ActionOutcome::Completed
                } else {
                    warn!(kind = kind.as_str(), slot, "result slot already written, dropping");
                    ActionOutcome::Failed
                }
            }
            Ok(None) => {
                debug!(kind = kind.as_str(), "prerequisite missing, action skipped");
                ActionOutcome::Skipped
            }
            Err(e) => {
                warn!(kind = kind.as_str(), error = %e, category = e.category(), "action failed, continuing");
                ActionOutcome::Failed
            }
        }
    }

    /// `analyze_data`: requires an uploaded file; parses it and asks for an
    /// analysis of a row sample.
    async fn analyze_data(&self, uploads: &[UploadedFile]) -> RuntimeResult<Option<StepResult>> {
        let Some(file) = uploads.first() else {
            return Ok(None);
        };
        let text = self.stores.files.fetch_text(&file.url).await?;
        let table = DataTable::parse(&file.name, &text)?;

        let prompt =
            prompts::data_analysis(&table.sample_json(self.limits.analysis_sample_rows), table.len());
        let analysis = self.text.generate(GenerateRequest::new(prompt)).await?;
        Ok(Some(StepResult::DataAnalysis { table, analysis }))
    }

    /// `create_visualization`: requires the data-analysis slot; asks for a
    /// chart spec and persists the visualization record.
    async fn create_visualization(&self, results: &ResultSet) -> RuntimeResult<Option<StepResult>> {
        let Some((table, analysis)) = results.data_analysis() else {
            return Ok(None);
        };

        let prompt = prompts::chart_spec(analysis, &table.sample_json(3));
        let reply = self
            .text
            .generate_structured(GenerateRequest::new(prompt), chart_spec_schema())
            .await?;
        let spec: ChartSpec = serde_json::from_value(reply)
            .map_err(|e| crate::errors::RuntimeError::Malformed(format!("chart spec: {e}")))?;

        let record = self
            .stores
            .visualizations
            .create(NewVisualization {
                name: spec.name,
                description: spec.description,
                chart_type: spec.chart_type,
                data: table.rows.clone(),
                config: VizConfig {
                    x_key: spec.x_key,
                    y_keys: spec.y_keys,
                },
                insights: spec.insights,
                source_file: Some(PIPELINE_SOURCE.to_owned()),
            })
            .await?;
        Ok(Some(StepResult::Visualization(record)))
    }

    /// `summarize`: requires at least one populated finding.
    async fn summarize(
        &self,
        request_text: &str,
        results: &ResultSet,
    ) -> RuntimeResult<Option<StepResult>> {
        if !results.has_findings() {
            return Ok(None);
        }
        let analysis = results.data_analysis().map(|(_, a)| a);
        let insights = results
            .visualization()
            .and_then(|v| v.insights.as_deref());
        let prompt = prompts::findings_summary(request_text, analysis, insights);
        let summary = self.text.generate(GenerateRequest::new(prompt)).await?;
        Ok(Some(StepResult::Summary(summary)))
    }

    /// `retrieve_knowledge`: no prerequisite; concatenates active entries by
    /// descending priority (empty string when none are active).
    async fn retrieve_knowledge(&self) -> RuntimeResult<Option<StepResult>> {
        let entries = self
            .stores
            .knowledge
            .list(self.limits.pipeline_knowledge_entries)
            .await?;
        Ok(Some(StepResult::Knowledge(active_content(&entries))))
    }

    /// `respond`: synthesizes every populated slot plus long-term facts into
    /// the final answer.
    async fn respond(
        &self,
        request_text: &str,
        results: &ResultSet,
    ) -> RuntimeResult<Option<StepResult>> {
        let facts = self.stores.learning.list().await?;
        let memory = fact_lines(&facts);

        let prompt = prompts::final_response(
            request_text,
            results.data_analysis().map(|(_, a)| a),
            results.visualization().map(|v| v.name.as_str()),
            results.summary(),
            results.knowledge(),
            &memory,
        );
        let answer = self
            .text
            .generate(GenerateRequest::new(prompt).open_domain())
            .await?;
        Ok(Some(StepResult::FinalResponse(answer)))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::ScriptedText;
    use chorus_core::knowledge::KnowledgeEntry;
    use chorus_store::InMemoryStore;
    use serde_json::json;

    fn executor_with(
        text: Arc<ScriptedText>,
        store: Arc<InMemoryStore>,
    ) -> ActionExecutor {
        ActionExecutor::new(text, store.into_stores(), LimitSettings::default())
    }

    fn upload(url: &str) -> UploadedFile {
        UploadedFile {
            name: "data.csv".into(),
            url: url.into(),
        }
    }

    #[tokio::test]
    async fn analyze_data_without_upload_skips_silently() {
        let text = Arc::new(ScriptedText::default());
        let store = Arc::new(InMemoryStore::new());
        let executor = executor_with(Arc::clone(&text), store);

        let mut results = ResultSet::new();
        let outcome = executor
            .execute(&Action::of(ActionKind::AnalyzeData), "q", &[], &mut results)
            .await;
        assert_eq!(outcome, ActionOutcome::Skipped);
        assert_eq!(text.call_count(), 0, "no external call on missing prerequisite");
        assert!(results.data_analysis().is_none());
    }

    #[tokio::test]
    async fn analyze_data_parses_and_analyzes() {
        let text = Arc::new(ScriptedText::default());
        text.queue_text(Ok("strong upward trend".into()));
        let store = Arc::new(InMemoryStore::new());
        store.seed_file("mem://files/data.csv", "month,revenue\njan,10\nfeb,20");
        let executor = executor_with(Arc::clone(&text), store);

        let mut results = ResultSet::new();
        let outcome = executor
            .execute(
                &Action::of(ActionKind::AnalyzeData),
                "q",
                &[upload("mem://files/data.csv")],
                &mut results,
            )
            .await;
        assert_eq!(outcome, ActionOutcome::Completed);
        let (table, analysis) = results.data_analysis().unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(analysis, "strong upward trend");
        let prompt = text.prompt_log();
        assert!(prompt.contains("(2 total rows)"));
    }

    #[tokio::test]
    async fn visualization_without_analysis_skips_without_calls() {
        let text = Arc::new(ScriptedText::default());
        let store = Arc::new(InMemoryStore::new());
        let executor = executor_with(Arc::clone(&text), Arc::clone(&store));

        let mut results = ResultSet::new();
        let outcome = executor
            .execute(
                &Action::of(ActionKind::CreateVisualization),
                "q",
                &[],
                &mut results,
            )
            .await;
        assert_eq!(outcome, ActionOutcome::Skipped);
        assert_eq!(text.call_count(), 0);
        assert!(store.visualizations_snapshot().is_empty());
    }

    #[tokio::test]
    async fn visualization_persists_record_from_spec() {
        let text = Arc::new(ScriptedText::default());
        text.queue_structured(Ok(json!({
            "chart_type": "line",
            "name": "Revenue trend",
            "description": "Monthly revenue",
            "xKey": "month",
            "yKeys": ["revenue"],
            "insights": "Feb doubled Jan"
        })));
        let store = Arc::new(InMemoryStore::new());
        let executor = executor_with(Arc::clone(&text), Arc::clone(&store));

        let mut results = ResultSet::new();
        let table = DataTable::parse_csv("month,revenue\njan,10\nfeb,20").unwrap();
        let _ = results.insert(StepResult::DataAnalysis {
            table,
            analysis: "doubling".into(),
        });

        let outcome = executor
            .execute(
                &Action::of(ActionKind::CreateVisualization),
                "q",
                &[],
                &mut results,
            )
            .await;
        assert_eq!(outcome, ActionOutcome::Completed);

        let viz = results.visualization().unwrap();
        assert_eq!(viz.name, "Revenue trend");
        assert_eq!(viz.config.x_key, "month");
        assert_eq!(viz.data.len(), 2);
        assert_eq!(viz.source_file.as_deref(), Some("Orchestration Analysis"));
        assert_eq!(store.visualizations_snapshot().len(), 1);
    }

    #[tokio::test]
    async fn malformed_chart_spec_fails_without_persisting() {
        let text = Arc::new(ScriptedText::default());
        text.queue_structured(Ok(json!({"unexpected": true})));
        let store = Arc::new(InMemoryStore::new());
        let executor = executor_with(Arc::clone(&text), Arc::clone(&store));

        let mut results = ResultSet::new();
        let _ = results.insert(StepResult::DataAnalysis {
            table: DataTable::default(),
            analysis: "a".into(),
        });
        let outcome = executor
            .execute(
                &Action::of(ActionKind::CreateVisualization),
                "q",
                &[],
                &mut results,
            )
            .await;
        assert_eq!(outcome, ActionOutcome::Failed);
        assert!(store.visualizations_snapshot().is_empty());
        assert!(results.visualization().is_none());
    }

    #[tokio::test]
    async fn summarize_without_findings_skips() {
        let text = Arc::new(ScriptedText::default());
        let store = Arc::new(InMemoryStore::new());
        let executor = executor_with(Arc::clone(&text), store);

        let mut results = ResultSet::new();
        let outcome = executor
            .execute(&Action::of(ActionKind::Summarize), "q", &[], &mut results)
            .await;
        assert_eq!(outcome, ActionOutcome::Skipped);
        assert_eq!(text.call_count(), 0);
    }

    #[tokio::test]
    async fn retrieve_knowledge_concatenates_active_entries() {
        let text = Arc::new(ScriptedText::default());
        let store = Arc::new(InMemoryStore::new());
        store.seed_knowledge(vec![
            KnowledgeEntry {
                id: "k1".into(),
                name: "a".into(),
                description: None,
                content: "alpha".into(),
                active: true,
                priority: 2,
            },
            KnowledgeEntry {
                id: "k2".into(),
                name: "b".into(),
                description: None,
                content: "hidden".into(),
                active: false,
                priority: 9,
            },
        ]);
        let executor = executor_with(Arc::clone(&text), store);

        let mut results = ResultSet::new();
        let outcome = executor
            .execute(
                &Action::of(ActionKind::RetrieveKnowledge),
                "q",
                &[],
                &mut results,
            )
            .await;
        assert_eq!(outcome, ActionOutcome::Completed);
        assert_eq!(results.knowledge(), Some("alpha"));
        assert_eq!(text.call_count(), 0, "knowledge retrieval makes no generation call");
    }

    #[tokio::test]
    async fn respond_synthesizes_results_and_memory() {
        let text = Arc::new(ScriptedText::default());
        text.queue_text(Ok("final answer".into()));
        let store = Arc::new(InMemoryStore::new());
        store.seed_facts(vec![chorus_core::knowledge::LearnedFact {
            id: "f1".into(),
            fact: "user loves charts".into(),
        }]);
        let executor = executor_with(Arc::clone(&text), store);

        let mut results = ResultSet::new();
        let _ = results.insert(StepResult::Summary("findings".into()));
        let outcome = executor
            .execute(&Action::of(ActionKind::Respond), "the question", &[], &mut results)
            .await;
        assert_eq!(outcome, ActionOutcome::Completed);
        assert_eq!(results.final_response(), Some("final answer"));

        let prompt = text.prompt_log();
        assert!(prompt.contains("the question"));
        assert!(prompt.contains("- Summary: findings"));
        assert!(prompt.contains("user loves charts"));
    }

    #[tokio::test]
    async fn failed_generation_reports_failed() {
        let text = Arc::new(ScriptedText::default());
        text.queue_text(Err(chorus_llm::ProviderError::Api {
            status: 502,
            message: "bad gateway".into(),
        }));
        let store = Arc::new(InMemoryStore::new());
        let executor = executor_with(Arc::clone(&text), store);

        let mut results = ResultSet::new();
        let outcome = executor
            .execute(&Action::of(ActionKind::Respond), "q", &[], &mut results)
            .await;
        assert_eq!(outcome, ActionOutcome::Failed);
        assert!(results.final_response().is_none());
    }
}
