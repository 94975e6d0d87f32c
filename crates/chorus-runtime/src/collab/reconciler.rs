//! Session reconciler: periodic fetch-and-replace of local conversation
//! state from the authoritative store.
//!
//! Last-fetch-wins by design: when the fetched message sequence differs
//! structurally from the local one, the local sequence is replaced
//! wholesale — there is no merge and no version token, so local-only
//! unsaved messages lose to a concurrent save observed by the next tick.
//! When the sequences are equal the tick is a no-op and nothing is
//! published.

use std::sync::Arc;
use std::time::Duration;

use chorus_core::events::{BaseEvent, ChorusEvent};
use chorus_store::SessionStore;
use metrics::counter;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::emitter::EventEmitter;
use crate::state::SharedMessages;

/// Polls the authoritative session record on a fixed cadence.
pub struct SessionReconciler {
    cancel: CancellationToken,
}

impl SessionReconciler {
    /// Start reconciling `session_id`, spawning the poll task. The first
    /// fetch happens one full interval after spawn.
    #[must_use]
    pub fn spawn(
        session_id: impl Into<String>,
        sessions: Arc<dyn SessionStore>,
        messages: SharedMessages,
        emitter: Arc<EventEmitter>,
        interval: Duration,
    ) -> Self {
        let session_id = session_id.into();
        let cancel = CancellationToken::new();

        let loop_cancel = cancel.clone();
        drop(tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            loop {
                tokio::select! {
                    () = loop_cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        reconcile_once(&session_id, sessions.as_ref(), &messages, &emitter).await;
                    }
                }
            }
            debug!(session_id, "session reconciler stopped");
        }));

        Self { cancel }
    }

    /// Cancel the poll task.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for SessionReconciler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// One reconciliation tick. Fetch failures are logged and swallowed.
async fn reconcile_once(
    session_id: &str,
    sessions: &dyn SessionStore,
    messages: &SharedMessages,
    emitter: &EventEmitter,
) {
    counter!("reconcile_ticks_total").increment(1);
    let session = match sessions.get(session_id).await {
        Ok(session) => session,
        Err(e) => {
            warn!(session_id, error = %e, "session fetch failed, will retry next tick");
            return;
        }
    };

    if session.messages == messages.snapshot() {
        return;
    }

    let message_count = session.messages.len();
    messages.replace(session.messages);
    counter!("reconcile_replacements_total").increment(1);
    info!(session_id, message_count, "adopted authoritative message sequence");
    let _ = emitter.emit(ChorusEvent::SessionSynced {
        base: BaseEvent::now(Some(session_id.to_owned())),
        message_count,
    });
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
