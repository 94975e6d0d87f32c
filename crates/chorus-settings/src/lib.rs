//! # chorus-settings
//!
//! Layered configuration for the Chorus engine.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`ChorusSettings::default()`]
//! 2. **User file** — `~/.chorus/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — `CHORUS_*` overrides (highest priority)
//!
//! The global singleton is reloadable: writing new values to disk and
//! calling [`reload_settings_from_path`] swaps the cached value so all
//! subsequent [`get_settings`] calls return fresh data.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

use std::path::Path;
use std::sync::{Arc, RwLock};

/// Global settings singleton.
///
/// `RwLock<Option<Arc<_>>>` rather than `OnceLock` so the cached value can
/// be swapped after a reload. Reads are a shared lock plus an `Arc` clone.
static SETTINGS: RwLock<Option<Arc<ChorusSettings>>> = RwLock::new(None);

/// Get the global settings instance.
///
/// On first call, loads from disk with env overrides; later calls return the
/// cached value. A failed load falls back to compiled defaults. Returns an
/// `Arc` so callers hold a consistent snapshot across concurrent reloads.
pub fn get_settings() -> Arc<ChorusSettings> {
    {
        let guard = SETTINGS.read().expect("settings lock poisoned");
        if let Some(ref s) = *guard {
            return Arc::clone(s);
        }
    }

    let mut guard = SETTINGS.write().expect("settings lock poisoned");
    // Another thread may have initialized while we waited for the lock.
    if let Some(ref s) = *guard {
        return Arc::clone(s);
    }

    let settings = Arc::new(match load_settings() {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load settings, using defaults");
            ChorusSettings::default()
        }
    });
    *guard = Some(Arc::clone(&settings));
    settings
}

/// Initialize the global settings with a specific value.
///
/// Replaces any previously cached settings. Useful for tests and embedders
/// that construct their configuration directly.
pub fn init_settings(settings: ChorusSettings) {
    let mut guard = SETTINGS.write().expect("settings lock poisoned");
    *guard = Some(Arc::new(settings));
}

/// Reload settings from a specific file path and swap the global cache.
pub fn reload_settings_from_path(path: &Path) {
    let new = Arc::new(match load_settings_from_path(path) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, ?path, "failed to reload settings, falling back to defaults");
            ChorusSettings::default()
        }
    });
    let mut guard = SETTINGS.write().expect("settings lock poisoned");
    *guard = Some(new);
    tracing::info!(?path, "settings reloaded from disk");
}

/// Reset the global settings cache (test-only).
#[cfg(test)]
pub(crate) fn reset_settings() {
    let mut guard = SETTINGS.write().expect("settings lock poisoned");
    *guard = None;
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Tests that mutate the global SETTINGS static must hold this lock to
    /// avoid racing with each other.
    static SETTINGS_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[test]
    fn init_settings_sets_custom_value() {
        let _lock = SETTINGS_MUTEX.lock().unwrap();
        reset_settings();
        let mut custom = ChorusSettings::default();
        custom.collaboration.sync_interval_secs = 11;
        init_settings(custom);
        assert_eq!(get_settings().collaboration.sync_interval_secs, 11);
        reset_settings();
    }

    #[test]
    fn reload_swaps_cached_value() {
        let _lock = SETTINGS_MUTEX.lock().unwrap();
        reset_settings();
        init_settings(ChorusSettings::default());
        assert_eq!(get_settings().collaboration.heartbeat_interval_secs, 5);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"collaboration": {"heartbeatIntervalSecs": 9}}"#).unwrap();

        reload_settings_from_path(&path);
        assert_eq!(get_settings().collaboration.heartbeat_interval_secs, 9);
        // Untouched sections keep defaults through the merge.
        assert_eq!(get_settings().collaboration.sync_interval_secs, 3);
        reset_settings();
    }

    #[test]
    fn snapshot_isolation_via_arc() {
        let _lock = SETTINGS_MUTEX.lock().unwrap();
        reset_settings();
        init_settings(ChorusSettings::default());
        let snapshot = get_settings();

        let mut new = ChorusSettings::default();
        new.persona.intelligence = 50;
        init_settings(new);

        assert_eq!(snapshot.persona.intelligence, 100);
        assert_eq!(get_settings().persona.intelligence, 50);
        reset_settings();
    }
}
