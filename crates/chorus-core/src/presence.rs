//! Presence records and the active/typing set computation.
//!
//! One record is expected per (session, viewer) pair; the synchronizer
//! enforces this with a read-then-write upsert (the race between two tabs of
//! the same viewer is accepted). Stale records are ignored, never deleted: a
//! viewer is *active* only while its `last_seen` timestamp is strictly inside
//! the liveness window.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A viewer's liveness record for one session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PresenceRecord {
    /// Server-assigned identity.
    pub id: String,
    /// Session the record belongs to.
    pub session_id: String,
    /// Viewer identity (email-like string).
    pub user_email: String,
    /// Viewer display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    /// Last heartbeat time.
    pub last_seen: DateTime<Utc>,
    /// Whether the viewer was typing at the last heartbeat.
    #[serde(default)]
    pub is_typing: bool,
}

/// Payload for creating a presence record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewPresence {
    /// Session the record belongs to.
    pub session_id: String,
    /// Viewer identity.
    pub user_email: String,
    /// Viewer display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    /// Heartbeat time.
    pub last_seen: DateTime<Utc>,
    /// Typing flag.
    pub is_typing: bool,
}

/// Partial update for an existing presence record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PresenceUpdate {
    /// New heartbeat time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
    /// New typing flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_typing: Option<bool>,
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

/// The viewer identity behind this process (from the identity collaborator).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    /// Email-like identity string.
    pub email: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// Records whose last heartbeat is strictly within `window` of `now`.
///
/// The boundary is exclusive: a record exactly `window` old is stale.
#[must_use]
pub fn active_viewers(
    records: &[PresenceRecord],
    now: DateTime<Utc>,
    window: Duration,
) -> Vec<PresenceRecord> {
    records
        .iter()
        .filter(|r| now - r.last_seen < window)
        .cloned()
        .collect()
}

/// The subset of `active` currently typing, excluding the viewer itself.
#[must_use]
pub fn typing_viewers(active: &[PresenceRecord], self_email: &str) -> Vec<PresenceRecord> {
    active
        .iter()
        .filter(|r| r.is_typing && r.user_email != self_email)
        .cloned()
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
