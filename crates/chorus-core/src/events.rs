//! Lifecycle events for UI consumers.
//!
//! Everything a front end needs to observe the engine — pipeline progress,
//! presence changes, reconciliation, saves — is broadcast as a
//! [`ChorusEvent`]. Events are transient: they are never persisted and carry
//! their own timestamps.

use serde::{Deserialize, Serialize};

/// Common fields for all events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseEvent {
    /// Session this event belongs to, when one has been saved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// ISO 8601 timestamp.
    pub timestamp: String,
}

impl BaseEvent {
    /// Create a new base event with the current UTC timestamp.
    #[must_use]
    pub fn now(session_id: Option<String>) -> Self {
        Self {
            session_id,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Engine lifecycle event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChorusEvent {
    /// A pipeline run began.
    #[serde(rename = "pipeline_started")]
    PipelineStarted {
        /// Base fields.
        #[serde(flatten)]
        base: BaseEvent,
        /// Run identity.
        #[serde(rename = "runId")]
        run_id: String,
        /// Step descriptions for progress display.
        steps: Vec<String>,
    },

    /// The pipeline entered a step. `step` is zero-based and monotonically
    /// non-decreasing within a run; `step == total` signals completion of
    /// the action list.
    #[serde(rename = "pipeline_step")]
    PipelineStep {
        /// Base fields.
        #[serde(flatten)]
        base: BaseEvent,
        /// Run identity.
        #[serde(rename = "runId")]
        run_id: String,
        /// Current step index.
        step: usize,
        /// Total action count.
        total: usize,
        /// Display description for the step, when the plan provided one.
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },

    /// A pipeline run finished and its results were folded into the
    /// conversation.
    #[serde(rename = "pipeline_completed")]
    PipelineCompleted {
        /// Base fields.
        #[serde(flatten)]
        base: BaseEvent,
        /// Run identity.
        #[serde(rename = "runId")]
        run_id: String,
        /// Actions that wrote a result.
        succeeded: usize,
        /// Actions that failed outright.
        failed: usize,
        /// Actions skipped for a missing prerequisite.
        skipped: usize,
    },

    /// The active/typing collaborator sets changed shape.
    #[serde(rename = "presence_changed")]
    PresenceChanged {
        /// Base fields.
        #[serde(flatten)]
        base: BaseEvent,
        /// Emails of viewers inside the liveness window.
        active: Vec<String>,
        /// Emails of active viewers currently typing (excluding self).
        typing: Vec<String>,
    },

    /// The reconciler replaced the local message sequence with the
    /// authoritative one. Not emitted when the sequences were equal.
    #[serde(rename = "session_synced")]
    SessionSynced {
        /// Base fields.
        #[serde(flatten)]
        base: BaseEvent,
        /// Message count after replacement.
        #[serde(rename = "messageCount")]
        message_count: usize,
    },

    /// The message sequence was persisted.
    #[serde(rename = "session_saved")]
    SessionSaved {
        /// Base fields.
        #[serde(flatten)]
        base: BaseEvent,
        /// Whether this save created the session record.
        created: bool,
    },
}

impl ChorusEvent {
    /// Get the base event fields.
    #[must_use]
    pub fn base(&self) -> &BaseEvent {
        match self {
            Self::PipelineStarted { base, .. }
            | Self::PipelineStep { base, .. }
            | Self::PipelineCompleted { base, .. }
            | Self::PresenceChanged { base, .. }
            | Self::SessionSynced { base, .. }
            | Self::SessionSaved { base, .. } => base,
        }
    }

    /// Get the event type string (for type discrimination).
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::PipelineStarted { .. } => "pipeline_started",
            Self::PipelineStep { .. } => "pipeline_step",
            Self::PipelineCompleted { .. } => "pipeline_completed",
            Self::PresenceChanged { .. } => "presence_changed",
            Self::SessionSynced { .. } => "session_synced",
            Self::SessionSaved { .. } => "session_saved",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
