//! Reqwest-backed store over the REST CRUD API.
//!
//! Endpoint map (all relative to the API base URL):
//!
//! | Record family   | Endpoint                      |
//! |-----------------|-------------------------------|
//! | Sessions        | `/api/chat-sessions[/:id]`    |
//! | Presence        | `/api/session-presence[/:id]` |
//! | Knowledge       | `/api/knowledge-bases`        |
//! | Learned facts   | `/api/learning`               |
//! | Visualizations  | `/api/data-visualizations`    |
//! | Uploads         | `/api/upload`                 |
//! | Viewer identity | `/api/me`                     |
//!
//! Listings take `orderBy`/`limit` query parameters; updates are `PATCH`.
//! A 404 maps to [`StoreError::NotFound`], any other non-2xx to
//! [`StoreError::Api`].

use async_trait::async_trait;
use reqwest::multipart;
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use chorus_core::knowledge::{KnowledgeEntry, LearnedFact};
use chorus_core::presence::{NewPresence, PresenceRecord, PresenceUpdate, Viewer};
use chorus_core::session::{ConversationSession, NewSession, SessionUpdate};
use chorus_core::viz::{NewVisualization, Visualization};

use crate::error::{StoreError, StoreResult};
use crate::traits::{
    FileStore, IdentityStore, KnowledgeStore, LearningStore, PresenceStore, SessionStore,
    VisualizationStore,
};

/// Default listing page size, matching the API's own cap behavior.
const DEFAULT_LIMIT: u32 = 200;

/// HTTP client for the persistence API.
pub struct HttpStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpStore {
    /// Create a store client for the API at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a store client sharing an existing HTTP client.
    #[must_use]
    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            let _ = base_url.pop();
        }
        Self { base_url, client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Map a response to parsed JSON, or a typed error.
    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        entity: &'static str,
        id: &str,
    ) -> StoreResult<T> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound {
                entity,
                id: id.to_owned(),
            });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }

    async fn get_list<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> StoreResult<Vec<T>> {
        let response = self.client.get(self.url(path)).query(query).send().await?;
        Self::parse(response, "listing", path).await
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
        entity: &'static str,
    ) -> StoreResult<T> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        Self::parse(response, entity, path).await
    }

    async fn patch_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
        entity: &'static str,
        id: &str,
    ) -> StoreResult<T> {
        let response = self.client.patch(self.url(path)).json(body).send().await?;
        Self::parse(response, entity, id).await
    }
}

#[async_trait]
impl SessionStore for HttpStore {
    #[instrument(skip(self))]
    async fn list(&self) -> StoreResult<Vec<ConversationSession>> {
        self.get_list(
            "/api/chat-sessions",
            &[
                ("orderBy", "-updatedAt".to_owned()),
                ("limit", DEFAULT_LIMIT.to_string()),
            ],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn get(&self, id: &str) -> StoreResult<ConversationSession> {
        let response = self
            .client
            .get(self.url(&format!("/api/chat-sessions/{id}")))
            .send()
            .await?;
        Self::parse(response, "session", id).await
    }

    #[instrument(skip_all)]
    async fn create(&self, new: NewSession) -> StoreResult<ConversationSession> {
        self.post_json("/api/chat-sessions", &new, "session").await
    }

    #[instrument(skip(self, update))]
    async fn update(&self, id: &str, update: SessionUpdate) -> StoreResult<ConversationSession> {
        self.patch_json(&format!("/api/chat-sessions/{id}"), &update, "session", id)
            .await
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> StoreResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("/api/chat-sessions/{id}")))
            .send()
            .await?;
        let _: Value = Self::parse(response, "session", id).await?;
        Ok(())
    }
}

#[async_trait]
impl PresenceStore for HttpStore {
    #[instrument(skip(self))]
    async fn filter(
        &self,
        session_id: &str,
        user_email: Option<&str>,
    ) -> StoreResult<Vec<PresenceRecord>> {
        let mut query = vec![("session_id", session_id.to_owned())];
        if let Some(email) = user_email {
            query.push(("user_email", email.to_owned()));
        }
        self.get_list("/api/session-presence", &query).await
    }

    #[instrument(skip_all)]
    async fn create(&self, new: NewPresence) -> StoreResult<PresenceRecord> {
        self.post_json("/api/session-presence", &new, "presence")
            .await
    }

    #[instrument(skip(self, update))]
    async fn update(&self, id: &str, update: PresenceUpdate) -> StoreResult<PresenceRecord> {
        self.patch_json(
            &format!("/api/session-presence/{id}"),
            &update,
            "presence",
            id,
        )
        .await
    }
}

#[async_trait]
impl KnowledgeStore for HttpStore {
    #[instrument(skip(self))]
    async fn list(&self, limit: u32) -> StoreResult<Vec<KnowledgeEntry>> {
        self.get_list(
            "/api/knowledge-bases",
            &[
                ("orderBy", "-priority,-updatedAt".to_owned()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }
}

#[async_trait]
impl LearningStore for HttpStore {
    #[instrument(skip(self))]
    async fn list(&self) -> StoreResult<Vec<LearnedFact>> {
        self.get_list(
            "/api/learning",
            &[
                ("orderBy", "-updatedAt".to_owned()),
                ("limit", DEFAULT_LIMIT.to_string()),
            ],
        )
        .await
    }

    #[instrument(skip_all)]
    async fn create(&self, fact: &str) -> StoreResult<LearnedFact> {
        self.post_json("/api/learning", &serde_json::json!({ "fact": fact }), "fact")
            .await
    }
}

#[async_trait]
impl VisualizationStore for HttpStore {
    #[instrument(skip_all)]
    async fn create(&self, new: NewVisualization) -> StoreResult<Visualization> {
        self.post_json("/api/data-visualizations", &new, "visualization")
            .await
    }
}

#[async_trait]
impl FileStore for HttpStore {
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> StoreResult<String> {
        let part = multipart::Part::bytes(bytes).file_name(file_name.to_owned());
        let form = multipart::Form::new().part("file", part);
        let response = self
            .client
            .post(self.url("/api/upload"))
            .multipart(form)
            .send()
            .await?;
        let reply: Value = Self::parse(response, "upload", file_name).await?;
        reply
            .get("file_url")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or(StoreError::Api {
                status: 200,
                message: "upload reply has no file_url".to_owned(),
            })
    }

    #[instrument(skip(self))]
    async fn fetch_text(&self, url: &str) -> StoreResult<String> {
        // File references may point at the API itself or at external blob
        // storage; absolute URLs are used verbatim.
        let absolute = if url.starts_with("http://") || url.starts_with("https://") {
            url.to_owned()
        } else {
            self.url(url)
        };
        let response = self.client.get(absolute).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Api {
                status: status.as_u16(),
                message: format!("file fetch failed for {url}"),
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl IdentityStore for HttpStore {
    #[instrument(skip(self))]
    async fn current_viewer(&self) -> StoreResult<Viewer> {
        let response = self.client.get(self.url("/api/me")).send().await?;
        Self::parse(response, "viewer", "me").await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chorus_core::messages::Message;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mock_api() -> (MockServer, HttpStore) {
        let server = MockServer::start().await;
        let store = HttpStore::new(server.uri());
        (server, store)
    }

    #[tokio::test]
    async fn session_list_sends_default_ordering() {
        let (server, store) = mock_api().await;
        Mock::given(method("GET"))
            .and(path("/api/chat-sessions"))
            .and(query_param("orderBy", "-updatedAt"))
            .and(query_param("limit", "200"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "s1"}])))
            .expect(1)
            .mount(&server)
            .await;

        let sessions = SessionStore::list(&store).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, "s1");
    }

    #[tokio::test]
    async fn session_get_maps_404_to_not_found() {
        let (server, store) = mock_api().await;
        Mock::given(method("GET"))
            .and(path("/api/chat-sessions/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Not found"})))
            .mount(&server)
            .await;

        let err = store.get("missing").await.unwrap_err();
        assert_matches!(err, StoreError::NotFound { entity: "session", .. });
    }

    #[tokio::test]
    async fn session_update_patches_messages() {
        let (server, store) = mock_api().await;
        Mock::given(method("PATCH"))
            .and(path("/api/chat-sessions/s1"))
            .and(body_partial_json(json!({
                "messages": [{"sender": "user", "text": "[CHAT] hi"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "s1",
                "messages": [{"sender": "user", "text": "[CHAT] hi"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let update = SessionUpdate::messages(vec![Message::user("[CHAT] hi")]);
        let session = SessionStore::update(&store, "s1", update).await.unwrap();
        assert_eq!(session.messages.len(), 1);
    }

    #[tokio::test]
    async fn session_create_posts_title_and_messages() {
        let (server, store) = mock_api().await;
        Mock::given(method("POST"))
            .and(path("/api/chat-sessions"))
            .and(body_partial_json(json!({"title": "Greetings"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "s-new", "title": "Greetings"})),
            )
            .mount(&server)
            .await;

        let created = SessionStore::create(
            &store,
            NewSession {
                title: Some("Greetings".into()),
                messages: vec![Message::user("hi")],
                mode: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(created.id, "s-new");
    }

    #[tokio::test]
    async fn presence_filter_narrows_by_session_and_email() {
        let (server, store) = mock_api().await;
        Mock::given(method("GET"))
            .and(path("/api/session-presence"))
            .and(query_param("session_id", "s1"))
            .and(query_param("user_email", "a@x"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": "p1",
                "session_id": "s1",
                "user_email": "a@x",
                "last_seen": "2026-02-01T08:00:00Z",
                "is_typing": false
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let records = store.filter("s1", Some("a@x")).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].user_email, "a@x");
    }

    #[tokio::test]
    async fn knowledge_list_orders_by_priority() {
        let (server, store) = mock_api().await;
        Mock::given(method("GET"))
            .and(path("/api/knowledge-bases"))
            .and(query_param("orderBy", "-priority,-updatedAt"))
            .and(query_param("limit", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let entries = KnowledgeStore::list(&store, 10).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn learning_create_posts_fact() {
        let (server, store) = mock_api().await;
        Mock::given(method("POST"))
            .and(path("/api/learning"))
            .and(body_partial_json(json!({"fact": "prefers charts"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "f1", "fact": "prefers charts"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let fact = LearningStore::create(&store, "prefers charts").await.unwrap();
        assert_eq!(fact.id, "f1");
    }

    #[tokio::test]
    async fn upload_returns_file_url() {
        let (server, store) = mock_api().await;
        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"file_url": "https://files.example/u/1"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let url = store.upload("data.csv", b"a,b\n1,2".to_vec()).await.unwrap();
        assert_eq!(url, "https://files.example/u/1");
    }

    #[tokio::test]
    async fn fetch_text_resolves_relative_refs_against_base() {
        let (server, store) = mock_api().await;
        Mock::given(method("GET"))
            .and(path("/api/files/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x,y\n1,2"))
            .expect(1)
            .mount(&server)
            .await;

        let text = store.fetch_text("/api/files/abc").await.unwrap();
        assert_eq!(text, "x,y\n1,2");
    }

    #[tokio::test]
    async fn identity_parses_viewer() {
        let (server, store) = mock_api().await;
        Mock::given(method("GET"))
            .and(path("/api/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "email": "anonymous@local",
                "full_name": "Anonymous User"
            })))
            .mount(&server)
            .await;

        let viewer = store.current_viewer().await.unwrap();
        assert_eq!(viewer.email, "anonymous@local");
    }

    #[tokio::test]
    async fn non_2xx_maps_to_api_error() {
        let (server, store) = mock_api().await;
        Mock::given(method("GET"))
            .and(path("/api/learning"))
            .respond_with(ResponseTemplate::new(500).set_body_string("db down"))
            .mount(&server)
            .await;

        let err = LearningStore::list(&store).await.unwrap_err();
        assert_matches!(err, StoreError::Api { status: 500, .. });
        assert!(err.is_retryable());
    }
}
