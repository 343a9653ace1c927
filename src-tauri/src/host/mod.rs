//! Capabilities the dispatcher consumes from the desktop host.
//!
//! Every rendering context is addressed by its webview label. The Tauri
//! implementation lives in `tauri_host`; tests drive the dispatcher through
//! a recording mock.

use crate::error::BridgeResult;
use crate::ipc::dialog::{DialogOptions, FileDialogResult};
use crate::ipc::window::WindowSpec;
use crate::utils::paths::PathCategory;
use async_trait::async_trait;
use std::path::PathBuf;

mod tauri_host;

#[cfg(test)]
pub mod mock;

pub use tauri_host::TauriHost;

#[async_trait]
pub trait Host: Send + Sync + 'static {
    /// Path resolver. `None` when the platform has no such location.
    fn resolve_path(&self, category: PathCategory) -> Option<PathBuf>;

    /// Shell/file opener, best effort.
    fn open_path(&self, path: &str) -> BridgeResult<()>;

    /// Arguments the current process was started with, executable first.
    fn process_args(&self) -> Vec<String>;

    /// Restart with `args` and quit. Only returns if the restart could not
    /// be started.
    fn relaunch(&self, args: Vec<String>) -> BridgeResult<()>;

    fn is_devtools_open(&self, context: &str) -> BridgeResult<bool>;
    fn open_devtools(&self, context: &str) -> BridgeResult<()>;
    fn close_devtools(&self, context: &str) -> BridgeResult<()>;

    /// Switch an open devtools panel into element picking. The Tauri host
    /// cannot script its devtools frontend, so there this only confirms the
    /// window exists and leaves the panel open; a recorded call in tests shows
    /// the dispatcher reached this step, not that picking started.
    fn enter_inspect_mode(&self, context: &str) -> BridgeResult<()>;

    /// Drop the "devtools-opened" notification for this context.
    fn remove_devtools_listeners(&self, context: &str) -> BridgeResult<()>;

    fn set_minimum_size(&self, context: &str, width: f64, height: f64) -> BridgeResult<()>;
    fn set_size(&self, context: &str, width: f64, height: f64) -> BridgeResult<()>;

    /// OS accent color as `rrggbbaa` hex, `None` where the platform has none.
    fn accent_color(&self) -> Option<String>;

    async fn eval_script(&self, context: &str, script: &str) -> BridgeResult<()>;

    /// `parent` is the context whose window should own the dialog.
    async fn show_open_dialog(
        &self,
        parent: Option<&str>,
        options: DialogOptions,
    ) -> BridgeResult<FileDialogResult>;

    async fn show_save_dialog(
        &self,
        parent: Option<&str>,
        options: DialogOptions,
    ) -> BridgeResult<FileDialogResult>;

    /// Create a window on `url` and wait until it navigates to
    /// `spec.close_on_url` (or is destroyed).
    async fn open_window(&self, url: &str, spec: WindowSpec) -> BridgeResult<()>;

    fn register_preload(&self, path: PathBuf) -> BridgeResult<()>;
}
