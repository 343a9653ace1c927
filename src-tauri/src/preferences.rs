use crate::error::{BridgeError, BridgeResult};
use crate::ipc::BridgeDispatcher;
use crate::utils;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tauri::{AppHandle, Emitter, State};

// Global monotonically increasing version for preference writes
lazy_static! {
    static ref PREFS_VERSION: AtomicU64 = AtomicU64::new(0);
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BridgePreferences {
    /// How often `inspect-element` re-checks the devtools panel.
    #[serde(default = "default_inspect_poll_interval_ms")]
    pub inspect_poll_interval_ms: u64,
    /// Give up waiting for the devtools panel after this long.
    #[serde(default = "default_inspect_timeout_ms")]
    pub inspect_timeout_ms: u64,
    #[serde(default = "default_true")]
    pub run_script_enabled: bool,
    #[serde(default = "default_true")]
    pub markdown_inline_default: bool,
}

fn default_inspect_poll_interval_ms() -> u64 {
    100
}

fn default_inspect_timeout_ms() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}

impl Default for BridgePreferences {
    fn default() -> Self {
        Self {
            inspect_poll_interval_ms: default_inspect_poll_interval_ms(),
            inspect_timeout_ms: default_inspect_timeout_ms(),
            run_script_enabled: true,
            markdown_inline_default: true,
        }
    }
}

impl BridgePreferences {
    pub fn inspect_poll_interval(&self) -> Duration {
        // A zero interval would spin the poll loop.
        Duration::from_millis(self.inspect_poll_interval_ms.max(1))
    }

    pub fn inspect_timeout(&self) -> Duration {
        Duration::from_millis(self.inspect_timeout_ms)
    }
}

/// Read preferences from `path`, falling back to defaults when the file is missing.
pub fn load_from(path: &Path) -> BridgeResult<BridgePreferences> {
    if !path.exists() {
        return Ok(BridgePreferences::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| BridgeError::PreferencesLoad(format!("{}: {}", path.display(), e)))?;

    serde_json::from_str(&content)
        .map_err(|e| BridgeError::PreferencesLoad(format!("{}: {}", path.display(), e)))
}

pub fn save_to(path: &Path, preferences: &BridgePreferences) -> BridgeResult<()> {
    let json = serde_json::to_string_pretty(preferences)
        .map_err(|e| BridgeError::PreferencesSave(e.to_string()))?;

    fs::write(path, json)
        .map_err(|e| BridgeError::PreferencesSave(format!("{}: {}", path.display(), e)))
}

/// Load preferences for the running app; any failure falls back to defaults.
pub fn load_or_default(app_handle: &AppHandle) -> BridgePreferences {
    let loaded = utils::get_preferences_path(app_handle)
        .map_err(BridgeError::from)
        .and_then(|path| load_from(&path));

    match loaded {
        Ok(preferences) => preferences,
        Err(e) => {
            log::warn!("using default preferences: {}", e);
            BridgePreferences::default()
        }
    }
}

#[tauri::command]
pub async fn get_preferences(app_handle: AppHandle) -> Result<BridgePreferences, String> {
    let prefs_path = utils::get_preferences_path(&app_handle).map_err(|e| e.to_string())?;

    if !prefs_path.exists() {
        // If preferences don't exist, create default ones
        let default_prefs = BridgePreferences::default();
        save_preferences_to_file(&app_handle, &default_prefs)?;
        return Ok(default_prefs);
    }

    load_from(&prefs_path).map_err(|e| e.to_frontend_message())
}

#[tauri::command]
pub async fn set_preferences(
    app_handle: AppHandle,
    dispatcher: State<'_, BridgeDispatcher>,
    preferences: BridgePreferences,
) -> Result<(), String> {
    save_preferences_to_file(&app_handle, &preferences)?;
    dispatcher.update_preferences(preferences);
    Ok(())
}

fn save_preferences_to_file(
    app_handle: &AppHandle,
    preferences: &BridgePreferences,
) -> Result<(), String> {
    let prefs_path = utils::get_preferences_path(app_handle).map_err(|e| e.to_string())?;
    save_to(&prefs_path, preferences).map_err(|e| e.to_frontend_message())?;

    // Increment version & emit prefs-write event
    let ver = PREFS_VERSION.fetch_add(1, Ordering::Relaxed) + 1;
    let payload = serde_json::json!({
        "event": "write",
        "version": ver,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });
    app_handle.emit("prefs-write", payload).ok();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = load_from(&dir.path().join("preferences.json")).unwrap();
        assert_eq!(prefs, BridgePreferences::default());
        assert_eq!(prefs.inspect_poll_interval(), Duration::from_millis(100));
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, r#"{"run_script_enabled": false}"#).unwrap();

        let prefs = load_from(&path).unwrap();
        assert!(!prefs.run_script_enabled);
        assert_eq!(prefs.inspect_timeout_ms, 10_000);
    }

    #[test]
    fn saved_preferences_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        let prefs = BridgePreferences {
            inspect_timeout_ms: 250,
            markdown_inline_default: false,
            ..Default::default()
        };

        save_to(&path, &prefs).unwrap();
        assert_eq!(load_from(&path).unwrap(), prefs);
    }

    #[test]
    fn corrupt_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, "{not json").unwrap();

        assert!(matches!(load_from(&path), Err(BridgeError::PreferencesLoad(_))));
    }

    #[test]
    fn zero_interval_is_clamped() {
        let prefs = BridgePreferences {
            inspect_poll_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(prefs.inspect_poll_interval(), Duration::from_millis(1));
    }
}
