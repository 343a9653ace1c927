//! Custom error types for the bridge host.
//!
//! Most of these never reach the webview directly: listener-style commands
//! log them, request/response commands fold them into `{error: ...}`
//! payloads. They exist so host code can use `?` all the way down.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for host capability and bridge failures.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The webview label no longer maps to a live window.
    #[error("Rendering context not found: '{0}'")]
    ContextNotFound(String),

    #[error("Unknown command: '{0}'")]
    UnknownCommand(String),

    /// Positional argument decoding
    #[error("Missing argument #{index} for '{command}'")]
    MissingArgument { command: &'static str, index: usize },

    #[error("Invalid argument #{index} for '{command}': {source}")]
    InvalidArgument {
        command: &'static str,
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Host window/dialog/webview failures
    #[error("Window operation failed: {0}")]
    Window(#[from] tauri::Error),

    #[error("Dialog was dropped before it produced a result")]
    DialogDropped,

    #[error("Failed to open '{path}': {reason}")]
    OpenPath { path: String, reason: String },

    #[error("Failed to relaunch: {0}")]
    Relaunch(String),

    #[error("Failed to read preload script '{path}': {source}")]
    PreloadRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Preferences errors
    #[error("Failed to load preferences: {0}")]
    PreferencesLoad(String),

    #[error("Failed to save preferences: {0}")]
    PreferencesSave(String),

    /// Markdown rule compilation
    #[error("Rule '{0}' still carries an unordered first-character index")]
    UnorderedFirstChars(String),

    #[error("Markdown rule table has no '{0}' rule")]
    MissingRule(&'static str),

    #[error("JSON serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO operation failed: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using BridgeError
pub type BridgeResult<T> = Result<T, BridgeError>;

impl BridgeError {
    /// Convert to the message string handed back to the webview.
    pub fn to_frontend_message(&self) -> String {
        match self {
            BridgeError::ContextNotFound(label) => {
                format!("Window '{}' is not available", label)
            }
            BridgeError::InvalidArgument { command, index, .. } => {
                format!("Invalid argument #{} for {}", index, command)
            }
            BridgeError::Window(e) => format!("Window error: {}", e),
            _ => self.to_string(),
        }
    }
}
