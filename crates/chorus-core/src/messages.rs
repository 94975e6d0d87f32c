//! Conversation messages and the transient-state stripping rules.
//!
//! A [`Message`] is one entry in a session's ordered sequence. Two pieces of
//! message state are transient and must never reach the persistence
//! collaborator:
//!
//! - the `orchestration` marker (a placeholder rendered as a progress view
//!   while a pipeline runs),
//! - the `thought` reasoning trace.
//!
//! [`persistable`] applies both rules and additionally drops messages that
//! carry neither text nor an image, matching the stored wire format.

use serde::{Deserialize, Serialize};

use crate::viz::Visualization;

/// Who authored a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// A human viewer.
    User,
    /// The assistant.
    Assistant,
}

impl Sender {
    /// Uppercase label used in transcripts (`USER` / `ASSISTANT`).
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Assistant => "ASSISTANT",
        }
    }
}

impl Default for Sender {
    fn default() -> Self {
        Self::User
    }
}

/// One entry in a conversation's message sequence.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Message author.
    pub sender: Sender,
    /// Text body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Generated image reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Attached visualization record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visualization: Option<Visualization>,
    /// Reasoning trace shown alongside the message. Never persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,
    /// In-progress orchestration marker. Never persisted.
    #[serde(default, skip_serializing_if = "is_false")]
    pub orchestration: bool,
}

fn is_false(v: &bool) -> bool {
    !*v
}

impl Message {
    /// A user message with the given text.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// An assistant message with the given text.
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Assistant,
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// An assistant message carrying a generated image.
    #[must_use]
    pub fn assistant_image(text: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            sender: Sender::Assistant,
            text: Some(text.into()),
            image_url: Some(image_url.into()),
            ..Self::default()
        }
    }

    /// An assistant message carrying a visualization; the text is the
    /// visualization's display name.
    #[must_use]
    pub fn with_visualization(viz: Visualization) -> Self {
        Self {
            sender: Sender::Assistant,
            text: Some(viz.name.clone()),
            visualization: Some(viz),
            ..Self::default()
        }
    }

    /// The transient placeholder rendered as pipeline progress.
    #[must_use]
    pub fn orchestration_marker() -> Self {
        Self {
            sender: Sender::Assistant,
            orchestration: true,
            ..Self::default()
        }
    }

    /// Whether this message survives the persistence filter: not a
    /// transient marker, and carrying non-empty text or an image.
    #[must_use]
    pub fn is_persistable(&self) -> bool {
        if self.orchestration {
            return false;
        }
        let has_text = self.text.as_deref().is_some_and(|t| !t.is_empty());
        has_text || self.image_url.is_some()
    }
}

/// Produce the persisted form of a message sequence: orchestration markers
/// and empty messages dropped, reasoning traces stripped.
#[must_use]
pub fn persistable(messages: &[Message]) -> Vec<Message> {
    messages
        .iter()
        .filter(|m| m.is_persistable())
        .map(|m| Message {
            thought: None,
            ..m.clone()
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
