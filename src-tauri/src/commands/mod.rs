//! Tauri command handlers organized by domain.
//!
//! - `ipc_ops`: the single `ipc_dispatch` entry point for webview commands
//! - `markdown_ops`: link-aware markdown rendering

pub mod ipc_ops;
pub mod markdown_ops;

// Re-export all commands for convenient registration
pub use ipc_ops::*;
pub use markdown_ops::*;
