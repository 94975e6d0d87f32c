//! Presence synchronizer: heartbeat loop and typing debounce.
//!
//! Two independent timers per active session:
//!
//! - **Heartbeat**: on a fixed cadence, upsert this viewer's record (typing
//!   flag cleared), then recompute the active and typing sets from every
//!   record in the session and publish them.
//! - **Typing signal**: every local input change writes an immediate
//!   `is_typing=true` heartbeat and (re)starts a debounce one-shot; when
//!   the debounce fires without further input, a `is_typing=false`
//!   heartbeat follows. Rapid input keeps resetting the one-shot without
//!   ever emitting the false heartbeat.
//!
//! Presence is best-effort: every store failure is logged and swallowed,
//! and the next tick proceeds as if nothing happened.

use std::sync::Arc;

use chorus_core::events::{BaseEvent, ChorusEvent};
use chorus_core::presence::{
    NewPresence, PresenceRecord, PresenceUpdate, Viewer, active_viewers, typing_viewers,
};
use chorus_settings::CollaborationSettings;
use chorus_store::PresenceStore;
use metrics::counter;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::emitter::EventEmitter;

/// Maintains this viewer's liveness record and the collaborator sets.
pub struct PresenceSynchronizer {
    inner: Arc<Inner>,
    cancel: CancellationToken,
    debounce: Mutex<Option<JoinHandle<()>>>,
}

struct Inner {
    session_id: String,
    viewer: Viewer,
    store: Arc<dyn PresenceStore>,
    emitter: Arc<EventEmitter>,
    settings: CollaborationSettings,
    active: Mutex<Vec<PresenceRecord>>,
    typing: Mutex<Vec<PresenceRecord>>,
}

impl PresenceSynchronizer {
    /// Start synchronizing presence for `session_id`, spawning the
    /// heartbeat task. The first heartbeat fires immediately.
    #[must_use]
    pub fn spawn(
        session_id: impl Into<String>,
        viewer: Viewer,
        store: Arc<dyn PresenceStore>,
        emitter: Arc<EventEmitter>,
        settings: CollaborationSettings,
    ) -> Self {
        let inner = Arc::new(Inner {
            session_id: session_id.into(),
            viewer,
            store,
            emitter,
            settings,
            active: Mutex::new(Vec::new()),
            typing: Mutex::new(Vec::new()),
        });
        let cancel = CancellationToken::new();

        let loop_inner = Arc::clone(&inner);
        let loop_cancel = cancel.clone();
        drop(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(loop_inner.settings.heartbeat_interval());
            loop {
                tokio::select! {
                    () = loop_cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        loop_inner.write_heartbeat(false).await;
                        loop_inner.refresh_sets().await;
                    }
                }
            }
            debug!(session_id = %loop_inner.session_id, "presence heartbeat stopped");
        }));

        Self {
            inner,
            cancel,
            debounce: Mutex::new(None),
        }
    }

    /// Signal a local input change: immediate typing heartbeat plus a
    /// debounce reset.
    pub fn input_changed(&self) {
        let typing_inner = Arc::clone(&self.inner);
        drop(tokio::spawn(async move {
            typing_inner.write_heartbeat(true).await;
        }));

        let mut guard = self.debounce.lock();
        if let Some(pending) = guard.take() {
            pending.abort();
        }
        let debounce_inner = Arc::clone(&self.inner);
        let cancel = self.cancel.child_token();
        let delay = self.inner.settings.typing_debounce();
        *guard = Some(tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    debounce_inner.write_heartbeat(false).await;
                }
            }
        }));
    }

    /// Emails of the viewers currently inside the liveness window.
    #[must_use]
    pub fn active_snapshot(&self) -> Vec<PresenceRecord> {
        self.inner.active.lock().clone()
    }

    /// Emails of the active viewers currently typing (excluding self).
    #[must_use]
    pub fn typing_snapshot(&self) -> Vec<PresenceRecord> {
        self.inner.typing.lock().clone()
    }

    /// Cancel the heartbeat loop and any pending debounce.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        if let Some(pending) = self.debounce.lock().take() {
            pending.abort();
        }
    }
}

impl Drop for PresenceSynchronizer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Inner {
    /// Upsert this viewer's record: update when one exists for the
    /// (session, viewer) pair, create otherwise. The read-then-write race
    /// between two tabs of the same viewer is accepted.
    async fn write_heartbeat(&self, typing: bool) {
        counter!("presence_heartbeats_total").increment(1);
        let now = chrono::Utc::now();

        let existing = match self
            .store
            .filter(&self.session_id, Some(&self.viewer.email))
            .await
        {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "presence lookup failed, skipping heartbeat");
                return;
            }
        };

        let result = if let Some(record) = existing.first() {
            self.store
                .update(
                    &record.id,
                    PresenceUpdate {
                        last_seen: Some(now),
                        is_typing: Some(typing),
                        user_name: self.viewer.full_name.clone(),
                    },
                )
                .await
                .map(|_| ())
        } else {
            self.store
                .create(NewPresence {
                    session_id: self.session_id.clone(),
                    user_email: self.viewer.email.clone(),
                    user_name: self.viewer.full_name.clone(),
                    last_seen: now,
                    is_typing: typing,
                })
                .await
                .map(|_| ())
        };

        if let Err(e) = result {
            warn!(error = %e, "presence write failed, will retry on next tick");
        }
    }

    /// Recompute and publish the active/typing sets.
    async fn refresh_sets(&self) {
        let records = match self.store.filter(&self.session_id, None).await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "presence fetch failed, keeping previous sets");
                return;
            }
        };

        let window = chrono::Duration::seconds(self.settings.liveness_window_secs as i64);
        let active = active_viewers(&records, chrono::Utc::now(), window);
        let typing = typing_viewers(&active, &self.viewer.email);

        let _ = self.emitter.emit(ChorusEvent::PresenceChanged {
            base: BaseEvent::now(Some(self.session_id.clone())),
            active: active.iter().map(|r| r.user_email.clone()).collect(),
            typing: typing.iter().map(|r| r.user_email.clone()).collect(),
        });
        *self.active.lock() = active;
        *self.typing.lock() = typing;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_store::InMemoryStore;
    use std::time::Duration;

    fn viewer(email: &str) -> Viewer {
        Viewer {
            email: email.into(),
            full_name: Some("Test Viewer".into()),
        }
    }

    fn settings(heartbeat: u64, debounce: u64) -> CollaborationSettings {
        CollaborationSettings {
            heartbeat_interval_secs: heartbeat,
            liveness_window_secs: 300,
            typing_debounce_secs: debounce,
            sync_interval_secs: 3,
        }
    }

    /// Let spawned tasks run at the current (paused) instant.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    async fn advance(duration: Duration) {
        tokio::time::advance(duration).await;
        settle().await;
    }

    fn my_record(store: &InMemoryStore) -> PresenceRecord {
        store
            .presence_snapshot()
            .into_iter()
            .find(|r| r.user_email == "me@x")
            .expect("own record")
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeat_creates_then_updates_single_record() {
        let store = Arc::new(InMemoryStore::new());
        let emitter = Arc::new(EventEmitter::new());
        let sync = PresenceSynchronizer::spawn(
            "s1",
            viewer("me@x"),
            Arc::clone(&store) as Arc<dyn PresenceStore>,
            emitter,
            settings(5, 2),
        );
        settle().await;
        assert_eq!(store.presence_snapshot().len(), 1);

        let first_seen = my_record(&store).last_seen;
        advance(Duration::from_secs(5)).await;
        let records = store.presence_snapshot();
        assert_eq!(records.len(), 1, "heartbeat upserts, never duplicates");
        assert!(my_record(&store).last_seen > first_seen);

        sync.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeat_clears_typing_flag() {
        let store = Arc::new(InMemoryStore::new());
        let emitter = Arc::new(EventEmitter::new());
        let sync = PresenceSynchronizer::spawn(
            "s1",
            viewer("me@x"),
            Arc::clone(&store) as Arc<dyn PresenceStore>,
            emitter,
            settings(5, 2),
        );
        settle().await;

        sync.input_changed();
        settle().await;
        assert!(my_record(&store).is_typing);

        // Next heartbeat writes typing=false.
        advance(Duration::from_secs(5)).await;
        assert!(!my_record(&store).is_typing);

        sync.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_fires_after_two_quiet_seconds() {
        let store = Arc::new(InMemoryStore::new());
        let emitter = Arc::new(EventEmitter::new());
        let sync = PresenceSynchronizer::spawn(
            "s1",
            viewer("me@x"),
            Arc::clone(&store) as Arc<dyn PresenceStore>,
            emitter,
            settings(3600, 2),
        );
        settle().await;

        sync.input_changed();
        settle().await;
        assert!(my_record(&store).is_typing);

        advance(Duration::from_millis(1900)).await;
        assert!(my_record(&store).is_typing, "debounce has not fired yet");

        advance(Duration::from_millis(200)).await;
        assert!(!my_record(&store).is_typing, "debounce fired at 2s");

        sync.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_input_resets_debounce_without_false_heartbeat() {
        let store = Arc::new(InMemoryStore::new());
        let emitter = Arc::new(EventEmitter::new());
        let sync = PresenceSynchronizer::spawn(
            "s1",
            viewer("me@x"),
            Arc::clone(&store) as Arc<dyn PresenceStore>,
            emitter,
            settings(3600, 2),
        );
        settle().await;

        // Input at t=0 and t=1; debounce window restarts at t=1.
        sync.input_changed();
        settle().await;
        advance(Duration::from_secs(1)).await;
        sync.input_changed();
        settle().await;

        // t=2.9 — the first debounce (t=2) must not have fired.
        advance(Duration::from_millis(1900)).await;
        assert!(my_record(&store).is_typing, "no false heartbeat before t=3");

        // t=3.1 — the second debounce fires.
        advance(Duration::from_millis(200)).await;
        assert!(!my_record(&store).is_typing);

        sync.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_publishes_active_and_typing_sets() {
        let store = Arc::new(InMemoryStore::new());
        let now = chrono::Utc::now();
        store.seed_presence(PresenceRecord {
            id: "p-peer".into(),
            session_id: "s1".into(),
            user_email: "peer@x".into(),
            user_name: None,
            last_seen: now,
            is_typing: true,
        });
        store.seed_presence(PresenceRecord {
            id: "p-stale".into(),
            session_id: "s1".into(),
            user_email: "gone@x".into(),
            user_name: None,
            last_seen: now - chrono::Duration::minutes(6),
            is_typing: true,
        });

        let emitter = Arc::new(EventEmitter::new());
        let mut rx = emitter.subscribe();
        let sync = PresenceSynchronizer::spawn(
            "s1",
            viewer("me@x"),
            Arc::clone(&store) as Arc<dyn PresenceStore>,
            Arc::clone(&emitter),
            settings(5, 2),
        );
        settle().await;

        let active: Vec<String> = sync
            .active_snapshot()
            .iter()
            .map(|r| r.user_email.clone())
            .collect();
        assert!(active.contains(&"me@x".to_owned()));
        assert!(active.contains(&"peer@x".to_owned()));
        assert!(!active.contains(&"gone@x".to_owned()));

        let typing = sync.typing_snapshot();
        assert_eq!(typing.len(), 1);
        assert_eq!(typing[0].user_email, "peer@x");

        let mut saw_presence_event = false;
        while let Ok(event) = rx.try_recv() {
            if let ChorusEvent::PresenceChanged { typing, .. } = event {
                saw_presence_event = true;
                assert_eq!(typing, vec!["peer@x".to_owned()]);
            }
        }
        assert!(saw_presence_event);

        sync.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_timers() {
        let store = Arc::new(InMemoryStore::new());
        let emitter = Arc::new(EventEmitter::new());
        let sync = PresenceSynchronizer::spawn(
            "s1",
            viewer("me@x"),
            Arc::clone(&store) as Arc<dyn PresenceStore>,
            emitter,
            settings(5, 2),
        );
        settle().await;
        let before = store.presence_snapshot()[0].last_seen;

        sync.shutdown();
        advance(Duration::from_secs(30)).await;
        assert_eq!(
            store.presence_snapshot()[0].last_seen, before,
            "no heartbeats after shutdown"
        );
    }
}
