//! # chorus-agent
//!
//! Composition root for the Chorus engine: resolves settings, builds the
//! gateway and store clients over one shared HTTP client, and hands back a
//! ready [`SessionController`].

#![deny(unsafe_code)]

use std::sync::Arc;

use chorus_llm::{GatewayClient, ImageProvider, TextProvider};
use chorus_runtime::SessionController;
use chorus_settings::ChorusSettings;
use chorus_store::{
    FileStore, HttpStore, IdentityStore, KnowledgeStore, LearningStore, PresenceStore,
    SessionStore, Stores, VisualizationStore,
};

/// Initialize the tracing subscriber from `RUST_LOG`, defaulting to `info`.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Build a session controller against the configured collaborator
/// endpoints.
#[must_use]
pub fn build_controller(settings: Arc<ChorusSettings>) -> SessionController {
    let client = reqwest::Client::new();
    let gateway = Arc::new(GatewayClient::with_client(
        settings.endpoints.gateway_base_url.clone(),
        client.clone(),
    ));
    let api = Arc::new(HttpStore::with_client(
        settings.endpoints.api_base_url.clone(),
        client,
    ));

    let stores = Stores {
        sessions: Arc::clone(&api) as Arc<dyn SessionStore>,
        presence: Arc::clone(&api) as Arc<dyn PresenceStore>,
        knowledge: Arc::clone(&api) as Arc<dyn KnowledgeStore>,
        learning: Arc::clone(&api) as Arc<dyn LearningStore>,
        visualizations: Arc::clone(&api) as Arc<dyn VisualizationStore>,
        files: Arc::clone(&api) as Arc<dyn FileStore>,
        identity: api as Arc<dyn IdentityStore>,
    };

    SessionController::new(
        settings,
        Arc::clone(&gateway) as Arc<dyn TextProvider>,
        gateway as Arc<dyn ImageProvider>,
        stores,
    )
}

/// Build a session controller from the global settings.
#[must_use]
pub fn build_default_controller() -> SessionController {
    build_controller(chorus_settings::get_settings())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
