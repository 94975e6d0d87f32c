//! Per-session controller: the engine's entry point.
//!
//! Owns the local message sequence, the attached uploads, the pipeline
//! progress snapshot, and the collaboration timer handles. One controller
//! per viewed conversation; collaboration tasks are constructed on session
//! activation and canceled on deactivation or replacement — timer state is
//! never shared module state.
//!
//! Mutable state lives behind short-lived `parking_lot` locks that are
//! never held across a suspension point. The message sequence is written by
//! submit handlers, the pipeline, and the reconciler with no cross-handler
//! lock: last write wins.

mod learning;
mod modes;

use std::sync::Arc;

use chorus_core::events::{BaseEvent, ChorusEvent};
use chorus_core::knowledge::{knowledge_block, memory_block};
use chorus_core::messages::{Message, persistable};
use chorus_core::session::{NewSession, SessionMode, SessionUpdate, derive_title};
use chorus_llm::{GenerateRequest, ImageProvider, TextProvider};
use chorus_settings::ChorusSettings;
use chorus_store::Stores;
use metrics::counter;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

use crate::collab::{PresenceSynchronizer, SessionReconciler};
use crate::emitter::EventEmitter;
use crate::errors::RuntimeResult;
use crate::pipeline::{ActionExecutor, PipelineController};
use crate::planner::OrchestrationPlanner;
use crate::state::{PipelineProgress, SharedMessages, UploadedFile};

/// Degraded reply for a failed direct-response generation.
const CHAT_FALLBACK: &str = "I've encountered a technical challenge but remain fully operational. I'm processing your request through alternative pathways. Please rephrase your question and I'll provide you with the precise answer you need.";

/// Collaboration task handles for the active session.
struct CollabHandles {
    presence: PresenceSynchronizer,
    _reconciler: SessionReconciler,
}

/// The per-session engine facade.
pub struct SessionController {
    settings: Arc<ChorusSettings>,
    text: Arc<dyn TextProvider>,
    image: Arc<dyn ImageProvider>,
    stores: Stores,
    emitter: Arc<EventEmitter>,
    planner: OrchestrationPlanner,
    pipeline: PipelineController,
    messages: SharedMessages,
    progress: Arc<Mutex<Option<PipelineProgress>>>,
    uploads: Mutex<Vec<UploadedFile>>,
    session_id: Mutex<Option<String>>,
    mode: Mutex<SessionMode>,
    collab: Mutex<Option<CollabHandles>>,
}

impl SessionController {
    /// Build a controller over the generation and persistence collaborators.
    #[must_use]
    pub fn new(
        settings: Arc<ChorusSettings>,
        text: Arc<dyn TextProvider>,
        image: Arc<dyn ImageProvider>,
        stores: Stores,
    ) -> Self {
        let emitter = Arc::new(EventEmitter::new());
        let messages = SharedMessages::new();
        let progress = Arc::new(Mutex::new(None));
        let planner = OrchestrationPlanner::new(Arc::clone(&text));
        let executor = ActionExecutor::new(
            Arc::clone(&text),
            stores.clone(),
            settings.limits.clone(),
        );
        let pipeline = PipelineController::new(
            executor,
            Arc::clone(&emitter),
            messages.clone(),
            Arc::clone(&progress),
        );

        Self {
            settings,
            text,
            image,
            stores,
            emitter,
            planner,
            pipeline,
            messages,
            progress,
            uploads: Mutex::new(Vec::new()),
            session_id: Mutex::new(None),
            mode: Mutex::new(SessionMode::Chat),
            collab: Mutex::new(None),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Observation
    // ─────────────────────────────────────────────────────────────────────

    /// Subscribe to engine lifecycle events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChorusEvent> {
        self.emitter.subscribe()
    }

    /// Snapshot of the local message sequence.
    #[must_use]
    pub fn messages_snapshot(&self) -> Vec<Message> {
        self.messages.snapshot()
    }

    /// Snapshot of the in-flight pipeline progress, when a run is active.
    #[must_use]
    pub fn progress_snapshot(&self) -> Option<PipelineProgress> {
        self.progress.lock().clone()
    }

    /// The active session id, once the conversation has been saved.
    #[must_use]
    pub fn session_id(&self) -> Option<String> {
        self.session_id.lock().clone()
    }

    /// The active interaction mode.
    #[must_use]
    pub fn mode(&self) -> SessionMode {
        *self.mode.lock()
    }

    /// Switch the interaction mode for subsequent submissions.
    pub fn set_mode(&self, mode: SessionMode) {
        *self.mode.lock() = mode;
    }

    /// Emails of viewers currently active on this session.
    #[must_use]
    pub fn active_viewers(&self) -> Vec<String> {
        self.collab.lock().as_ref().map_or_else(Vec::new, |c| {
            c.presence
                .active_snapshot()
                .iter()
                .map(|r| r.user_email.clone())
                .collect()
        })
    }

    /// Emails of collaborators currently typing.
    #[must_use]
    pub fn typing_viewers(&self) -> Vec<String> {
        self.collab.lock().as_ref().map_or_else(Vec::new, |c| {
            c.presence
                .typing_snapshot()
                .iter()
                .map(|r| r.user_email.clone())
                .collect()
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Uploads
    // ─────────────────────────────────────────────────────────────────────

    /// Upload a file and attach it to the next submission.
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub async fn add_upload(&self, file_name: &str, bytes: Vec<u8>) -> RuntimeResult<()> {
        let url = self.stores.files.upload(file_name, bytes).await?;
        self.uploads.lock().push(UploadedFile {
            name: file_name.to_owned(),
            url,
        });
        Ok(())
    }

    /// Detach an upload by position.
    pub fn remove_upload(&self, index: usize) {
        let mut uploads = self.uploads.lock();
        if index < uploads.len() {
            let _ = uploads.remove(index);
        }
    }

    /// Snapshot of the attached uploads.
    #[must_use]
    pub fn uploads_snapshot(&self) -> Vec<UploadedFile> {
        self.uploads.lock().clone()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Session lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// List stored sessions, most recently updated first (history view).
    pub async fn list_sessions(&self) -> RuntimeResult<Vec<chorus_core::session::ConversationSession>> {
        Ok(self.stores.sessions.list().await?)
    }

    /// Make a session id the active one and start its collaboration timers.
    pub async fn activate(&self, session_id: &str) {
        *self.session_id.lock() = Some(session_id.to_owned());
        self.start_collab(session_id.to_owned()).await;
    }

    /// Fetch a stored session and make it the active one.
    pub async fn load_session(&self, id: &str) -> RuntimeResult<()> {
        let session = self.stores.sessions.get(id).await?;
        self.messages.replace(session.messages);
        info!(session_id = %session.id, "session loaded");
        self.activate(&session.id).await;
        Ok(())
    }

    /// Drop the active session and start from a blank conversation.
    pub fn start_new(&self) {
        self.stop_collab();
        *self.session_id.lock() = None;
        self.messages.clear();
        self.uploads.lock().clear();
        *self.progress.lock() = None;
        *self.mode.lock() = SessionMode::Chat;
    }

    /// Tear down the collaboration timers without touching local state.
    pub fn deactivate(&self) {
        self.stop_collab();
    }

    /// Signal a local input change (typing indicator).
    pub fn input_changed(&self) {
        if let Some(collab) = self.collab.lock().as_ref() {
            collab.presence.input_changed();
        }
    }

    async fn start_collab(&self, session_id: String) {
        self.stop_collab();
        let viewer = match self.stores.identity.current_viewer().await {
            Ok(viewer) => viewer,
            Err(e) => {
                warn!(error = %e, "collaboration init failed");
                return;
            }
        };

        let presence = PresenceSynchronizer::spawn(
            session_id.clone(),
            viewer,
            Arc::clone(&self.stores.presence),
            Arc::clone(&self.emitter),
            self.settings.collaboration.clone(),
        );
        let reconciler = SessionReconciler::spawn(
            session_id,
            Arc::clone(&self.stores.sessions),
            self.messages.clone(),
            Arc::clone(&self.emitter),
            self.settings.collaboration.sync_interval(),
        );
        *self.collab.lock() = Some(CollabHandles {
            presence,
            _reconciler: reconciler,
        });
    }

    fn stop_collab(&self) {
        // Dropping the handles cancels their timer tasks.
        let _ = self.collab.lock().take();
    }

    // ─────────────────────────────────────────────────────────────────────
    // Submission
    // ─────────────────────────────────────────────────────────────────────

    /// Submit one user message in the active mode.
    ///
    /// Never fails from the caller's perspective: every error path degrades
    /// into an assistant message so the conversation keeps its continuity.
    #[instrument(skip_all)]
    pub async fn submit(&self, input: &str) {
        let input = input.trim();
        if input.is_empty() {
            return;
        }
        let mode = self.mode();
        self.messages
            .push(Message::user(format!("[{}] {input}", mode.tag())));

        let result = match mode {
            SessionMode::Chat => self.handle_chat(input).await,
            SessionMode::Image => self.single_image(input).await,
            SessionMode::Storyboard => self.storyboard(input).await,
            SessionMode::Video => self.video_stub(input).await,
        };

        if let Err(e) = result {
            warn!(mode = mode.tag(), error = %e, category = e.category(), "generation failed, degrading");
            self.messages.push(Message::assistant(format!(
                "I encountered a technical challenge with {} generation, but I've adapted. Let me provide an alternative response that addresses your request.",
                mode.tag().to_lowercase()
            )));
        }
    }

    /// Chat-mode handling: plan first, then pipeline or direct response.
    async fn handle_chat(&self, user_text: &str) -> RuntimeResult<()> {
        let uploads = self.uploads_snapshot();
        let plan = self.planner.plan(user_text, !uploads.is_empty()).await;

        if plan.is_actionable() {
            let session_id = self.session_id();
            let _ = self
                .pipeline
                .run(session_id, &plan, user_text, &uploads)
                .await;
            self.uploads.lock().clear();
            self.save_session(user_text).await;
            return Ok(());
        }

        self.direct_response(user_text, &uploads).await
    }

    /// The single-call direct-response path.
    async fn direct_response(
        &self,
        user_text: &str,
        uploads: &[UploadedFile],
    ) -> RuntimeResult<()> {
        let facts = self.stores.learning.list().await?;
        let entries = self
            .stores
            .knowledge
            .list(self.settings.limits.chat_knowledge_entries)
            .await?;

        let system = crate::prompts::chat_system(
            &self.settings.persona,
            &memory_block(&facts),
            &knowledge_block(&entries),
            user_text,
        );
        let prompt = format!("{system}{}", crate::prompts::files_block(uploads));
        let request = GenerateRequest::new(prompt)
            .open_domain()
            .with_files(uploads.iter().map(|f| f.url.clone()).collect());

        match self.text.generate(request).await {
            Ok(answer) => {
                counter!("direct_responses_total").increment(1);
                self.messages.push(Message::assistant(&answer));
                self.uploads.lock().clear();
                learning::learn_from_exchange(
                    self.text.as_ref(),
                    self.stores.learning.as_ref(),
                    user_text,
                    &answer,
                )
                .await;
                self.save_session(user_text).await;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, category = e.category(), "direct response failed, degrading");
                self.messages.push(Message::assistant(CHAT_FALLBACK));
                Ok(())
            }
        }
    }

    /// Persist the current message sequence, stripped of transient state.
    ///
    /// Creates the session on the first save (title derived from the first
    /// message) and adopts the assigned id; updates it afterwards. Save
    /// failures are logged and swallowed — the conversation stays usable.
    pub(crate) async fn save_session(&self, first_message_text: &str) {
        let snapshot = persistable(&self.messages.snapshot());
        let existing = self.session_id();

        let saved = if let Some(id) = existing {
            self.stores
                .sessions
                .update(&id, SessionUpdate::messages(snapshot))
                .await
                .map(|_| (id, false))
        } else {
            let mode = self.mode();
            self.stores
                .sessions
                .create(NewSession {
                    title: Some(derive_title(first_message_text)),
                    messages: snapshot,
                    mode: Some(mode),
                })
                .await
                .map(|session| (session.id, true))
        };

        match saved {
            Ok((id, created)) => {
                counter!("session_saves_total").increment(1);
                if created {
                    // A freshly created session becomes collaborative.
                    self.activate(&id).await;
                }
                let _ = self.emitter.emit(ChorusEvent::SessionSaved {
                    base: BaseEvent::now(Some(id)),
                    created,
                });
            }
            Err(e) => warn!(error = %e, "session save failed"),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Conversation summarization
    // ─────────────────────────────────────────────────────────────────────

    /// Summarize the selected messages (by index, any order, text-bearing
    /// only). Returns an empty string when the selection has no text.
    pub async fn summarize_selected(&self, indices: &[usize]) -> RuntimeResult<String> {
        let messages = self.messages.snapshot();
        let mut sorted: Vec<usize> = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let transcript = sorted
            .iter()
            .filter_map(|&i| messages.get(i))
            .filter_map(|m| {
                m.text
                    .as_deref()
                    .map(|text| format!("{}: {text}", m.sender.label()))
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        if transcript.is_empty() {
            return Ok(String::new());
        }

        let summary = self
            .text
            .generate(GenerateRequest::new(crate::prompts::conversation_summary(
                &transcript,
            )))
            .await?;
        Ok(summary)
    }
}
