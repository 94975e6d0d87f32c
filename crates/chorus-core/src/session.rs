//! Conversation session records and the derived-title rule.
//!
//! The authoritative copy of a session lives behind the persistence
//! collaborator; the engine only ever holds a transient, possibly-stale
//! snapshot of it.

use serde::{Deserialize, Serialize};

use crate::messages::Message;

/// How many characters of the first message become the session title.
const TITLE_MAX_CHARS: usize = 40;

/// Interaction mode a session was created in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// Conversational exchange (may orchestrate a pipeline).
    Chat,
    /// Single generated image.
    Image,
    /// Video request (storyboard-offer stub).
    Video,
    /// Multi-scene storyboard.
    Storyboard,
}

impl SessionMode {
    /// Uppercase tag prefixed onto submitted user messages (`[CHAT] …`).
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Chat => "CHAT",
            Self::Image => "IMAGE",
            Self::Video => "VIDEO",
            Self::Storyboard => "STORYBOARD",
        }
    }
}

/// A stored conversation session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSession {
    /// Server-assigned identity.
    pub id: String,
    /// Display title derived from the first saved exchange.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Ordered message sequence. Insertion order is significant.
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Mode the session was created in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<SessionMode>,
    /// Whether the session is archived.
    #[serde(default)]
    pub archived: bool,
    /// Server-owned creation timestamp (ISO 8601).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Server-owned update timestamp (ISO 8601).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Payload for creating a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewSession {
    /// Display title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Initial message sequence.
    pub messages: Vec<Message>,
    /// Session mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<SessionMode>,
}

/// Partial update for a stored session. `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionUpdate {
    /// Replacement title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Replacement message sequence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<Message>>,
    /// Replacement mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<SessionMode>,
    /// Replacement archived flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
}

impl SessionUpdate {
    /// An update that replaces only the message sequence.
    #[must_use]
    pub fn messages(messages: Vec<Message>) -> Self {
        Self {
            messages: Some(messages),
            ..Self::default()
        }
    }
}

/// Derive a session title from the first message: the first
/// [`TITLE_MAX_CHARS`] characters, with a trailing ellipsis when truncated.
#[must_use]
pub fn derive_title(first_message: &str) -> String {
    let mut chars = first_message.chars();
    let head: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
