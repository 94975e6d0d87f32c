//! Settings schema with compiled defaults.
//!
//! Every field has a serde default so partial settings files deep-merge
//! cleanly over the compiled values.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root settings for the Chorus engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChorusSettings {
    /// Settings schema version.
    pub version: String,
    /// Instance name.
    pub name: String,
    /// Collaborator endpoints.
    pub endpoints: EndpointSettings,
    /// Presence/reconciliation cadence.
    pub collaboration: CollaborationSettings,
    /// Assistant persona knobs folded into prompts.
    pub persona: PersonaSettings,
    /// Context-composition limits.
    pub limits: LimitSettings,
}

impl Default for ChorusSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_owned(),
            name: "chorus".to_owned(),
            endpoints: EndpointSettings::default(),
            collaboration: CollaborationSettings::default(),
            persona: PersonaSettings::default(),
            limits: LimitSettings::default(),
        }
    }
}

/// Collaborator endpoint configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EndpointSettings {
    /// Base URL of the persistence API.
    pub api_base_url: String,
    /// Base URL of the generation gateway.
    pub gateway_base_url: String,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000".to_owned(),
            gateway_base_url: "http://localhost:3000".to_owned(),
        }
    }
}

/// Presence and reconciliation cadence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollaborationSettings {
    /// Seconds between presence heartbeats.
    pub heartbeat_interval_secs: u64,
    /// Seconds after which a presence record is stale.
    pub liveness_window_secs: u64,
    /// Seconds of input silence before the typing flag clears.
    pub typing_debounce_secs: u64,
    /// Seconds between session reconciliation fetches.
    pub sync_interval_secs: u64,
}

impl Default for CollaborationSettings {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: 5,
            liveness_window_secs: 300,
            typing_debounce_secs: 2,
            sync_interval_secs: 3,
        }
    }
}

impl CollaborationSettings {
    /// Heartbeat cadence as a [`Duration`].
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    /// Liveness window as a [`Duration`].
    #[must_use]
    pub fn liveness_window(&self) -> Duration {
        Duration::from_secs(self.liveness_window_secs)
    }

    /// Typing debounce as a [`Duration`].
    #[must_use]
    pub fn typing_debounce(&self) -> Duration {
        Duration::from_secs(self.typing_debounce_secs)
    }

    /// Reconciliation cadence as a [`Duration`].
    #[must_use]
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }
}

/// Persona knobs folded into the direct-response system prompt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonaSettings {
    /// Assistant display name.
    pub name: String,
    /// Intelligence level, 0–100, surfaced verbatim in the prompt.
    pub intelligence: u8,
    /// Whether the unrestricted content mode is active.
    pub unrestricted: bool,
}

impl Default for PersonaSettings {
    fn default() -> Self {
        Self {
            name: "Chorus".to_owned(),
            intelligence: 100,
            unrestricted: false,
        }
    }
}

/// Context-composition limits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LimitSettings {
    /// Knowledge entries consulted by the direct-response path.
    pub chat_knowledge_entries: u32,
    /// Knowledge entries consulted by the retrieve-knowledge action.
    pub pipeline_knowledge_entries: u32,
    /// Rows of an uploaded table embedded into the analysis prompt.
    pub analysis_sample_rows: usize,
    /// Byte cap on file text clipped into prompts.
    pub file_context_bytes: usize,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            chat_knowledge_entries: 50,
            pipeline_knowledge_entries: 10,
            analysis_sample_rows: 10,
            file_context_bytes: 12_000,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
