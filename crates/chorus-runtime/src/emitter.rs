//! Broadcast-based event emitter for [`ChorusEvent`] dispatch.

use std::sync::atomic::{AtomicU64, Ordering};

use chorus_core::events::ChorusEvent;
use tokio::sync::broadcast;

/// Default broadcast channel capacity.
const DEFAULT_CAPACITY: usize = 256;

/// Broadcast-based event emitter.
///
/// Non-blocking: `emit` never awaits. Slow receivers lag and drop rather
/// than blocking the sender.
pub struct EventEmitter {
    tx: broadcast::Sender<ChorusEvent>,
    emit_count: AtomicU64,
}

impl EventEmitter {
    /// Create a new emitter with the default channel capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new emitter with a custom channel capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            emit_count: AtomicU64::new(0),
        }
    }

    /// Emit an event to all subscribers. Returns the receiver count
    /// (0 when nobody is listening).
    pub fn emit(&self, event: ChorusEvent) -> usize {
        let _ = self.emit_count.fetch_add(1, Ordering::Relaxed);
        self.tx.send(event).unwrap_or(0)
    }

    /// Subscribe to events emitted after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChorusEvent> {
        self.tx.subscribe()
    }

    /// Number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Total number of events emitted.
    #[must_use]
    pub fn emit_count(&self) -> u64 {
        self.emit_count.load(Ordering::Relaxed)
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_core::events::BaseEvent;

    fn saved_event() -> ChorusEvent {
        ChorusEvent::SessionSaved {
            base: BaseEvent::now(Some("s1".into())),
            created: false,
        }
    }

    #[test]
    fn emit_with_no_subscribers_counts() {
        let emitter = EventEmitter::new();
        assert_eq!(emitter.emit(saved_event()), 0);
        assert_eq!(emitter.emit_count(), 1);
    }

    #[tokio::test]
    async fn emit_reaches_every_subscriber() {
        let emitter = EventEmitter::new();
        let mut rx1 = emitter.subscribe();
        let mut rx2 = emitter.subscribe();
        assert_eq!(emitter.subscriber_count(), 2);

        assert_eq!(emitter.emit(saved_event()), 2);
        assert_eq!(rx1.recv().await.unwrap().event_type(), "session_saved");
        assert_eq!(rx2.recv().await.unwrap().event_type(), "session_saved");
    }

    #[tokio::test]
    async fn slow_receiver_lags_instead_of_blocking() {
        let emitter = EventEmitter::with_capacity(1);
        let mut rx = emitter.subscribe();
        let _ = emitter.emit(saved_event());
        let _ = emitter.emit(saved_event());
        assert!(rx.recv().await.is_err());
    }

    #[test]
    fn dropped_subscribers_are_not_counted() {
        let emitter = EventEmitter::new();
        let rx = emitter.subscribe();
        assert_eq!(emitter.subscriber_count(), 1);
        drop(rx);
        assert_eq!(emitter.subscriber_count(), 0);
    }
}
