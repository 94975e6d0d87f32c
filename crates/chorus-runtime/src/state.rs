//! Shared per-session view state.
//!
//! The message sequence is written by three independent parties — the
//! submit handlers, the pipeline controller, and the reconciler tick — with
//! no cross-handler lock. Each mutation takes the lock briefly and never
//! holds it across a suspension point, so writes are atomic per handler and
//! ordering is last-write-wins, exactly the concurrency contract the engine
//! promises.

use std::sync::Arc;

use chorus_core::messages::Message;
use parking_lot::Mutex;

/// A file attached to the next submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedFile {
    /// Original file name (drives tabular parsing).
    pub name: String,
    /// Reference URL returned by the upload collaborator.
    pub url: String,
}

/// Progress snapshot of an in-flight pipeline, for progress displays that
/// poll instead of subscribing to events.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineProgress {
    /// Run identity.
    pub run_id: String,
    /// Step descriptions from the plan.
    pub steps: Vec<String>,
    /// Current step index; equals `total` once the action list is done.
    pub current: usize,
    /// Total action count.
    pub total: usize,
}

/// The shared, last-write-wins message sequence.
#[derive(Clone, Default)]
pub struct SharedMessages(Arc<Mutex<Vec<Message>>>);

impl SharedMessages {
    /// A fresh empty sequence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone of the current sequence.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Message> {
        self.0.lock().clone()
    }

    /// Current length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    /// Whether the sequence is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    /// Append one message.
    pub fn push(&self, message: Message) {
        self.0.lock().push(message);
    }

    /// Replace the whole sequence.
    pub fn replace(&self, messages: Vec<Message>) {
        *self.0.lock() = messages;
    }

    /// Drop messages failing the predicate.
    pub fn retain(&self, keep: impl FnMut(&Message) -> bool) {
        self.0.lock().retain(keep);
    }

    /// Replace the last message (no-op on an empty sequence).
    pub fn replace_last(&self, message: Message) {
        let mut messages = self.0.lock();
        if let Some(last) = messages.last_mut() {
            *last = message;
        }
    }

    /// Clear the sequence.
    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
