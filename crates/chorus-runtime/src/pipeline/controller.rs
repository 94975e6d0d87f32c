//! Drives an actionable plan through the executor.
//!
//! State machine over the plan's action list:
//! `idle → running(0) → … → running(n-1) → completed`. The externally
//! observed step counter is published *before* each action runs and
//! advances regardless of that action's outcome; it reaches `n` exactly
//! once per run. On completion the transient orchestration-marker message
//! is removed and the run's outputs (visualization, final response) are
//! appended to the shared sequence. The owning session controller persists
//! the sequence as soon as `run` returns. There is no retry and no
//! cancellation of an in-flight run.

use std::sync::Arc;

use chorus_core::events::{BaseEvent, ChorusEvent};
use chorus_core::messages::Message;
use chorus_core::plan::OrchestrationPlan;
use metrics::{counter, gauge};
use parking_lot::Mutex;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::emitter::EventEmitter;
use crate::pipeline::executor::{ActionExecutor, ActionOutcome};
use crate::pipeline::results::ResultSet;
use crate::state::{PipelineProgress, SharedMessages, UploadedFile};

/// Tally of one finished run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipelineOutcome {
    /// Run identity.
    pub run_id: String,
    /// Actions that wrote their result.
    pub succeeded: usize,
    /// Actions that failed.
    pub failed: usize,
    /// Actions skipped for a missing prerequisite.
    pub skipped: usize,
}

/// Pipeline state machine.
pub struct PipelineController {
    executor: ActionExecutor,
    emitter: Arc<EventEmitter>,
    messages: SharedMessages,
    progress: Arc<Mutex<Option<PipelineProgress>>>,
}

impl PipelineController {
    /// Create a controller writing into the given shared state.
    #[must_use]
    pub fn new(
        executor: ActionExecutor,
        emitter: Arc<EventEmitter>,
        messages: SharedMessages,
        progress: Arc<Mutex<Option<PipelineProgress>>>,
    ) -> Self {
        Self {
            executor,
            emitter,
            messages,
            progress,
        }
    }

    /// Drive `plan` to completion and fold its outputs into the message
    /// sequence.
    #[instrument(skip_all, fields(actions = plan.actions.len()))]
    pub async fn run(
        &self,
        session_id: Option<String>,
        plan: &OrchestrationPlan,
        request_text: &str,
        uploads: &[UploadedFile],
    ) -> PipelineOutcome {
        let run_id = Uuid::now_v7().to_string();
        let total = plan.actions.len();
        counter!("pipeline_runs_total").increment(1);
        gauge!("pipeline_runs_active").increment(1.0);

        self.messages.push(Message::orchestration_marker());
        *self.progress.lock() = Some(PipelineProgress {
            run_id: run_id.clone(),
            steps: plan.steps.clone(),
            current: 0,
            total,
        });
        let _ = self.emitter.emit(ChorusEvent::PipelineStarted {
            base: BaseEvent::now(session_id.clone()),
            run_id: run_id.clone(),
            steps: plan.steps.clone(),
        });

        let mut results = ResultSet::new();
        let mut outcome = PipelineOutcome {
            run_id: run_id.clone(),
            ..PipelineOutcome::default()
        };

        for (i, action) in plan.actions.iter().enumerate() {
            self.publish_step(&session_id, &run_id, i, total, plan.steps.get(i).cloned());
            match self
                .executor
                .execute(action, request_text, uploads, &mut results)
                .await
            {
                ActionOutcome::Completed => outcome.succeeded += 1,
                ActionOutcome::Skipped => outcome.skipped += 1,
                ActionOutcome::Failed => outcome.failed += 1,
            }
        }

        // The counter lands on `n` exactly once, failures notwithstanding.
        self.publish_step(&session_id, &run_id, total, total, None);

        self.messages.retain(|m| !m.orchestration);
        if let Some(viz) = results.visualization() {
            self.messages.push(Message::with_visualization(viz.clone()));
        }
        if let Some(answer) = results.final_response() {
            self.messages.push(Message::assistant(answer));
        }

        *self.progress.lock() = None;
        let _ = self.emitter.emit(ChorusEvent::PipelineCompleted {
            base: BaseEvent::now(session_id),
            run_id: run_id.clone(),
            succeeded: outcome.succeeded,
            failed: outcome.failed,
            skipped: outcome.skipped,
        });
        gauge!("pipeline_runs_active").decrement(1.0);
        info!(
            run_id,
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            skipped = outcome.skipped,
            "pipeline run completed"
        );
        outcome
    }

    fn publish_step(
        &self,
        session_id: &Option<String>,
        run_id: &str,
        step: usize,
        total: usize,
        description: Option<String>,
    ) {
        if let Some(progress) = self.progress.lock().as_mut() {
            progress.current = step;
        }
        let _ = self.emitter.emit(ChorusEvent::PipelineStep {
            base: BaseEvent::now(session_id.clone()),
            run_id: run_id.to_owned(),
            step,
            total,
            description,
        });
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
