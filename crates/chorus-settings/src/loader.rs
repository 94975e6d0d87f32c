//! Layered settings loading: compiled defaults ← file ← environment.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::errors::Result;
use crate::types::ChorusSettings;

/// Environment variable naming the settings file.
const PATH_VAR: &str = "CHORUS_SETTINGS_PATH";

/// Resolve the settings file path: `$CHORUS_SETTINGS_PATH` when set,
/// otherwise `~/.chorus/settings.json`.
#[must_use]
pub fn settings_path() -> PathBuf {
    if let Some(path) = std::env::var_os(PATH_VAR) {
        return PathBuf::from(path);
    }
    let home = std::env::var_os("HOME").map_or_else(|| PathBuf::from("."), PathBuf::from);
    home.join(".chorus").join("settings.json")
}

/// Deep-merge `overlay` onto `base`. Objects merge key-wise; everything else
/// is replaced by the overlay value.
#[must_use]
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                let _ = base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Load settings from the default path with env overrides applied.
pub fn load_settings() -> Result<ChorusSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific file, deep-merged over defaults, with env
/// overrides applied last. A missing file yields defaults + env.
pub fn load_settings_from_path(path: &Path) -> Result<ChorusSettings> {
    let defaults = serde_json::to_value(ChorusSettings::default())?;

    let merged = if path.exists() {
        let raw = std::fs::read_to_string(path)?;
        let file: Value = serde_json::from_str(&raw)?;
        deep_merge(defaults, file)
    } else {
        defaults
    };

    let mut settings: ChorusSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Apply `CHORUS_*` environment overrides. Unparseable values are ignored
/// with a warning rather than failing the load.
fn apply_env_overrides(settings: &mut ChorusSettings) {
    if let Ok(url) = std::env::var("CHORUS_API_BASE_URL") {
        settings.endpoints.api_base_url = url;
    }
    if let Ok(url) = std::env::var("CHORUS_GATEWAY_BASE_URL") {
        settings.endpoints.gateway_base_url = url;
    }
    override_secs(
        "CHORUS_HEARTBEAT_INTERVAL_SECS",
        &mut settings.collaboration.heartbeat_interval_secs,
    );
    override_secs(
        "CHORUS_SYNC_INTERVAL_SECS",
        &mut settings.collaboration.sync_interval_secs,
    );
    override_secs(
        "CHORUS_LIVENESS_WINDOW_SECS",
        &mut settings.collaboration.liveness_window_secs,
    );
}

fn override_secs(var: &str, target: &mut u64) {
    let Ok(raw) = std::env::var(var) else { return };
    match raw.parse() {
        Ok(value) => *target = value,
        Err(_) => tracing::warn!(var, raw, "ignoring unparseable settings override"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
