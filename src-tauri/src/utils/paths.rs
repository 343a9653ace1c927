//! Path resolution utilities: named host locations and app directories.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use tauri::{AppHandle, Manager, Runtime};

/// Named filesystem locations a webview may ask the host about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PathCategory {
    AppPath,
    AppData,
    UserData,
    Home,
    Cache,
    Temp,
    Exe,
    Module,
    Desktop,
    Documents,
    Downloads,
    Music,
    Pictures,
    Videos,
    Recent,
    Logs,
}

impl PathCategory {
    pub const ALL: [PathCategory; 16] = [
        PathCategory::AppPath,
        PathCategory::AppData,
        PathCategory::UserData,
        PathCategory::Home,
        PathCategory::Cache,
        PathCategory::Temp,
        PathCategory::Exe,
        PathCategory::Module,
        PathCategory::Desktop,
        PathCategory::Documents,
        PathCategory::Downloads,
        PathCategory::Music,
        PathCategory::Pictures,
        PathCategory::Videos,
        PathCategory::Recent,
        PathCategory::Logs,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PathCategory::AppPath => "appPath",
            PathCategory::AppData => "appData",
            PathCategory::UserData => "userData",
            PathCategory::Home => "home",
            PathCategory::Cache => "cache",
            PathCategory::Temp => "temp",
            PathCategory::Exe => "exe",
            PathCategory::Module => "module",
            PathCategory::Desktop => "desktop",
            PathCategory::Documents => "documents",
            PathCategory::Downloads => "downloads",
            PathCategory::Music => "music",
            PathCategory::Pictures => "pictures",
            PathCategory::Videos => "videos",
            PathCategory::Recent => "recent",
            PathCategory::Logs => "logs",
        }
    }
}

impl FromStr for PathCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PathCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or(())
    }
}

/// Resolve a category through Tauri's path resolver.
pub fn resolve_category<R: Runtime>(app_handle: &AppHandle<R>, category: PathCategory) -> Result<PathBuf> {
    let resolver = app_handle.path();
    let resolved = match category {
        PathCategory::AppPath => resolver.resource_dir(),
        PathCategory::AppData => resolver.data_dir(),
        PathCategory::UserData => resolver.app_data_dir(),
        PathCategory::Home => resolver.home_dir(),
        PathCategory::Cache => resolver.cache_dir(),
        PathCategory::Temp => resolver.temp_dir(),
        PathCategory::Exe | PathCategory::Module => {
            return std::env::current_exe().map_err(|e| anyhow!("Failed to locate executable: {}", e));
        }
        PathCategory::Desktop => resolver.desktop_dir(),
        PathCategory::Documents => resolver.document_dir(),
        PathCategory::Downloads => resolver.download_dir(),
        PathCategory::Music => resolver.audio_dir(),
        PathCategory::Pictures => resolver.picture_dir(),
        PathCategory::Videos => resolver.video_dir(),
        PathCategory::Recent => return recent_items_dir(),
        PathCategory::Logs => resolver.app_log_dir(),
    };

    resolved.map_err(|e| anyhow!("Failed to resolve '{}': {}", category.as_str(), e))
}

/// Recent items only exist as a folder on Windows.
fn recent_items_dir() -> Result<PathBuf> {
    if cfg!(target_os = "windows") {
        dirs::data_dir()
            .map(|dir| dir.join("Microsoft").join("Windows").join("Recent"))
            .ok_or_else(|| anyhow!("Failed to resolve roaming app data directory"))
    } else {
        Err(anyhow!("Recent items folder is not available on this platform"))
    }
}

/// Get the app config directory, creating it on first use
pub fn get_config_dir<R: Runtime>(app_handle: &AppHandle<R>) -> Result<PathBuf> {
    let config_dir = app_handle
        .path()
        .app_config_dir()
        .map_err(|e| anyhow!("Failed to get config directory: {}", e))?;

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Get the preferences file path
pub fn get_preferences_path<R: Runtime>(app_handle: &AppHandle<R>) -> Result<PathBuf> {
    Ok(get_config_dir(app_handle)?.join("preferences.json"))
}
