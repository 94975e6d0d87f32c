//! In-process store implementing every collaborator contract.
//!
//! Backs the engine in tests and embedded setups. Semantics mirror the REST
//! API: server-assigned ids, `updated_at` bumped on session writes, session
//! listings ordered by descending update time, knowledge listings by
//! descending priority.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use chorus_core::knowledge::{KnowledgeEntry, LearnedFact};
use chorus_core::presence::{NewPresence, PresenceRecord, PresenceUpdate, Viewer};
use chorus_core::session::{ConversationSession, NewSession, SessionUpdate};
use chorus_core::viz::{NewVisualization, Visualization};

use crate::error::{StoreError, StoreResult};
use crate::traits::{
    FileStore, IdentityStore, KnowledgeStore, LearningStore, PresenceStore, SessionStore,
    Stores, VisualizationStore,
};

/// In-memory store.
pub struct InMemoryStore {
    sessions: Mutex<Vec<ConversationSession>>,
    presence: Mutex<Vec<PresenceRecord>>,
    knowledge: Mutex<Vec<KnowledgeEntry>>,
    facts: Mutex<Vec<LearnedFact>>,
    visualizations: Mutex<Vec<Visualization>>,
    files: Mutex<HashMap<String, String>>,
    viewer: Mutex<Viewer>,
    next_id: AtomicU64,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self {
            sessions: Mutex::new(Vec::new()),
            presence: Mutex::new(Vec::new()),
            knowledge: Mutex::new(Vec::new()),
            facts: Mutex::new(Vec::new()),
            visualizations: Mutex::new(Vec::new()),
            files: Mutex::new(HashMap::new()),
            viewer: Mutex::new(Viewer {
                email: "anonymous@local".to_owned(),
                full_name: Some("Anonymous User".to_owned()),
            }),
            next_id: AtomicU64::new(1),
        }
    }
}

impl InMemoryStore {
    /// A fresh empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bundle one shared store instance into a [`Stores`] handle.
    #[must_use]
    pub fn into_stores(self: Arc<Self>) -> Stores {
        Stores {
            sessions: Arc::clone(&self) as Arc<dyn SessionStore>,
            presence: Arc::clone(&self) as Arc<dyn PresenceStore>,
            knowledge: Arc::clone(&self) as Arc<dyn KnowledgeStore>,
            learning: Arc::clone(&self) as Arc<dyn LearningStore>,
            visualizations: Arc::clone(&self) as Arc<dyn VisualizationStore>,
            files: Arc::clone(&self) as Arc<dyn FileStore>,
            identity: self as Arc<dyn IdentityStore>,
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        format!("{prefix}-{n}")
    }

    /// Replace the viewer identity.
    pub fn set_viewer(&self, viewer: Viewer) {
        *self.viewer.lock() = viewer;
    }

    /// Seed knowledge entries.
    pub fn seed_knowledge(&self, entries: Vec<KnowledgeEntry>) {
        self.knowledge.lock().extend(entries);
    }

    /// Seed learned facts.
    pub fn seed_facts(&self, facts: Vec<LearnedFact>) {
        self.facts.lock().extend(facts);
    }

    /// Seed file content under a reference URL.
    pub fn seed_file(&self, url: impl Into<String>, text: impl Into<String>) {
        let _ = self.files.lock().insert(url.into(), text.into());
    }

    /// Seed a presence record directly (bypasses the upsert path).
    pub fn seed_presence(&self, record: PresenceRecord) {
        self.presence.lock().push(record);
    }

    /// Snapshot of all stored sessions.
    #[must_use]
    pub fn sessions_snapshot(&self) -> Vec<ConversationSession> {
        self.sessions.lock().clone()
    }

    /// Snapshot of all stored presence records.
    #[must_use]
    pub fn presence_snapshot(&self) -> Vec<PresenceRecord> {
        self.presence.lock().clone()
    }

    /// Snapshot of all stored visualizations.
    #[must_use]
    pub fn visualizations_snapshot(&self) -> Vec<Visualization> {
        self.visualizations.lock().clone()
    }

    /// Snapshot of all stored facts.
    #[must_use]
    pub fn facts_snapshot(&self) -> Vec<LearnedFact> {
        self.facts.lock().clone()
    }

    /// Overwrite a stored session's messages from the outside, simulating a
    /// concurrent viewer's save.
    pub fn overwrite_session_messages(
        &self,
        id: &str,
        messages: Vec<chorus_core::messages::Message>,
    ) {
        let mut sessions = self.sessions.lock();
        if let Some(session) = sessions.iter_mut().find(|s| s.id == id) {
            session.messages = messages;
            session.updated_at = Some(chrono::Utc::now().to_rfc3339());
        }
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn list(&self) -> StoreResult<Vec<ConversationSession>> {
        let mut sessions = self.sessions.lock().clone();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }

    async fn get(&self, id: &str) -> StoreResult<ConversationSession> {
        self.sessions
            .lock()
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "session",
                id: id.to_owned(),
            })
    }

    async fn create(&self, new: NewSession) -> StoreResult<ConversationSession> {
        let now = chrono::Utc::now().to_rfc3339();
        let session = ConversationSession {
            id: self.next_id("cs"),
            title: new.title,
            messages: new.messages,
            mode: new.mode,
            archived: false,
            created_at: Some(now.clone()),
            updated_at: Some(now),
        };
        self.sessions.lock().push(session.clone());
        Ok(session)
    }

    async fn update(&self, id: &str, update: SessionUpdate) -> StoreResult<ConversationSession> {
        let mut sessions = self.sessions.lock();
        let session = sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "session",
                id: id.to_owned(),
            })?;
        if let Some(title) = update.title {
            session.title = Some(title);
        }
        if let Some(messages) = update.messages {
            session.messages = messages;
        }
        if let Some(mode) = update.mode {
            session.mode = Some(mode);
        }
        if let Some(archived) = update.archived {
            session.archived = archived;
        }
        session.updated_at = Some(chrono::Utc::now().to_rfc3339());
        Ok(session.clone())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.sessions.lock().retain(|s| s.id != id);
        Ok(())
    }
}

#[async_trait]
impl PresenceStore for InMemoryStore {
    async fn filter(
        &self,
        session_id: &str,
        user_email: Option<&str>,
    ) -> StoreResult<Vec<PresenceRecord>> {
        Ok(self
            .presence
            .lock()
            .iter()
            .filter(|r| r.session_id == session_id)
            .filter(|r| user_email.is_none_or(|email| r.user_email == email))
            .cloned()
            .collect())
    }

    async fn create(&self, new: NewPresence) -> StoreResult<PresenceRecord> {
        let record = PresenceRecord {
            id: self.next_id("pr"),
            session_id: new.session_id,
            user_email: new.user_email,
            user_name: new.user_name,
            last_seen: new.last_seen,
            is_typing: new.is_typing,
        };
        self.presence.lock().push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: &str, update: PresenceUpdate) -> StoreResult<PresenceRecord> {
        let mut presence = self.presence.lock();
        let record = presence
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "presence",
                id: id.to_owned(),
            })?;
        if let Some(last_seen) = update.last_seen {
            record.last_seen = last_seen;
        }
        if let Some(is_typing) = update.is_typing {
            record.is_typing = is_typing;
        }
        if let Some(user_name) = update.user_name {
            record.user_name = Some(user_name);
        }
        Ok(record.clone())
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryStore {
    async fn list(&self, limit: u32) -> StoreResult<Vec<KnowledgeEntry>> {
        let mut entries = self.knowledge.lock().clone();
        entries.sort_by(|a, b| b.priority.cmp(&a.priority));
        entries.truncate(limit as usize);
        Ok(entries)
    }
}

#[async_trait]
impl LearningStore for InMemoryStore {
    async fn list(&self) -> StoreResult<Vec<LearnedFact>> {
        Ok(self.facts.lock().clone())
    }

    async fn create(&self, fact: &str) -> StoreResult<LearnedFact> {
        let record = LearnedFact {
            id: self.next_id("lf"),
            fact: fact.to_owned(),
        };
        self.facts.lock().push(record.clone());
        Ok(record)
    }
}

#[async_trait]
impl VisualizationStore for InMemoryStore {
    async fn create(&self, new: NewVisualization) -> StoreResult<Visualization> {
        let record = Visualization {
            id: self.next_id("dv"),
            name: new.name,
            description: new.description,
            chart_type: new.chart_type,
            data: new.data,
            config: new.config,
            insights: new.insights,
            source_file: new.source_file,
        };
        self.visualizations.lock().push(record.clone());
        Ok(record)
    }
}

#[async_trait]
impl FileStore for InMemoryStore {
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> StoreResult<String> {
        let url = format!("mem://files/{}/{file_name}", self.next_id("uf"));
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let _ = self.files.lock().insert(url.clone(), text);
        Ok(url)
    }

    async fn fetch_text(&self, url: &str) -> StoreResult<String> {
        self.files
            .lock()
            .get(url)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "file",
                id: url.to_owned(),
            })
    }
}

#[async_trait]
impl IdentityStore for InMemoryStore {
    async fn current_viewer(&self) -> StoreResult<Viewer> {
        Ok(self.viewer.lock().clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
