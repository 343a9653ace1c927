//! Application initialization utilities for setting up directories and default files.

use crate::preferences::{self, BridgePreferences};
use crate::utils::paths;
use anyhow::{anyhow, Result};
use std::fs;
use std::path::Path;
use tauri::{AppHandle, Manager, Runtime};

/// Initialize app directories
pub fn initialize_app_directories<R: Runtime>(app_handle: &AppHandle<R>) -> Result<()> {
    let app_data_dir = app_handle
        .path()
        .app_data_dir()
        .map_err(|e| anyhow!("Failed to get app data directory: {}", e))?;
    fs::create_dir_all(&app_data_dir)?;

    let log_dir = app_handle
        .path()
        .app_log_dir()
        .map_err(|e| anyhow!("Failed to get log directory: {}", e))?;
    fs::create_dir_all(&log_dir)?;

    let config_dir = paths::get_config_dir(app_handle)?;
    fs::create_dir_all(&config_dir)?;

    create_default_preferences(&paths::get_preferences_path(app_handle)?)?;

    Ok(())
}

/// Write default preferences unless a file is already there.
fn create_default_preferences(prefs_path: &Path) -> Result<()> {
    if prefs_path.exists() {
        return Ok(());
    }

    preferences::save_to(prefs_path, &BridgePreferences::default())?;
    log::info!("wrote default preferences to {}", prefs_path.display());
    Ok(())
}
