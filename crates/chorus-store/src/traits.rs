//! Contracts the engine consumes from the persistence collaborators.
//!
//! Each trait mirrors one record family of the CRUD API. Server-side
//! defaults apply: session listings come back ordered by descending update
//! time, knowledge listings by descending priority.

use std::sync::Arc;

use async_trait::async_trait;

use chorus_core::knowledge::{KnowledgeEntry, LearnedFact};
use chorus_core::presence::{NewPresence, PresenceRecord, PresenceUpdate, Viewer};
use chorus_core::session::{ConversationSession, NewSession, SessionUpdate};
use chorus_core::viz::{NewVisualization, Visualization};

use crate::error::StoreResult;

/// Conversation session persistence.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// List sessions, most recently updated first.
    async fn list(&self) -> StoreResult<Vec<ConversationSession>>;

    /// Fetch one session by id.
    async fn get(&self, id: &str) -> StoreResult<ConversationSession>;

    /// Create a session; the returned record carries the assigned id.
    async fn create(&self, new: NewSession) -> StoreResult<ConversationSession>;

    /// Patch a session. `None` fields are untouched.
    async fn update(&self, id: &str, update: SessionUpdate) -> StoreResult<ConversationSession>;

    /// Delete a session.
    async fn delete(&self, id: &str) -> StoreResult<()>;
}

/// Presence record persistence.
#[async_trait]
pub trait PresenceStore: Send + Sync {
    /// List records for a session, optionally narrowed to one viewer.
    async fn filter(
        &self,
        session_id: &str,
        user_email: Option<&str>,
    ) -> StoreResult<Vec<PresenceRecord>>;

    /// Create a record.
    async fn create(&self, new: NewPresence) -> StoreResult<PresenceRecord>;

    /// Patch a record.
    async fn update(&self, id: &str, update: PresenceUpdate) -> StoreResult<PresenceRecord>;
}

/// Knowledge-base reads.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// List entries by descending priority, at most `limit`.
    async fn list(&self, limit: u32) -> StoreResult<Vec<KnowledgeEntry>>;
}

/// Learned-fact persistence.
#[async_trait]
pub trait LearningStore: Send + Sync {
    /// List all facts.
    async fn list(&self) -> StoreResult<Vec<LearnedFact>>;

    /// Persist one fact.
    async fn create(&self, fact: &str) -> StoreResult<LearnedFact>;
}

/// Visualization record persistence.
#[async_trait]
pub trait VisualizationStore: Send + Sync {
    /// Create a visualization record.
    async fn create(&self, new: NewVisualization) -> StoreResult<Visualization>;
}

/// Uploaded-file storage.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Upload a file, returning its reference URL.
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> StoreResult<String>;

    /// Fetch the text content behind a reference URL.
    async fn fetch_text(&self, url: &str) -> StoreResult<String>;
}

/// Viewer identity.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// The identity presence records are written under.
    async fn current_viewer(&self) -> StoreResult<Viewer>;
}

/// Bundle of every collaborator the engine needs, shared by clone.
#[derive(Clone)]
pub struct Stores {
    /// Session persistence.
    pub sessions: Arc<dyn SessionStore>,
    /// Presence persistence.
    pub presence: Arc<dyn PresenceStore>,
    /// Knowledge reads.
    pub knowledge: Arc<dyn KnowledgeStore>,
    /// Learned facts.
    pub learning: Arc<dyn LearningStore>,
    /// Visualization records.
    pub visualizations: Arc<dyn VisualizationStore>,
    /// Uploaded files.
    pub files: Arc<dyn FileStore>,
    /// Viewer identity.
    pub identity: Arc<dyn IdentityStore>,
}
