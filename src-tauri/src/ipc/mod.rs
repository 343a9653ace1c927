//! IPC surface between webviews and the privileged host.
//!
//! - `dispatcher`: command routing and option normalization
//! - `dialog`: file dialog requests and results
//! - `window`: transient window specs
//! - `args`: positional argument decoding

pub mod args;
pub mod dialog;
pub mod dispatcher;
pub mod window;

use crate::error::BridgeError;
use crate::host::TauriHost;
use std::str::FromStr;

pub use dispatcher::{relaunch_args, wrap_script, Dispatcher, RelaunchArgs};

/// Dispatcher managed as Tauri state.
pub type BridgeDispatcher = Dispatcher<TauriHost>;

/// Fixed set of commands a webview may send. Wire names are shared with the
/// frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    GetPath,
    OpenPath,
    Relaunch,
    OpenDevTools,
    CloseDevTools,
    ToggleDevTools,
    InspectElement,
    MinimumSize,
    WindowSize,
    DevtoolsWarning,
    RegisterPreload,
    GetAccentColor,
    RunScript,
    OpenDialog,
    OpenWindow,
}

impl Command {
    pub const ALL: [Command; 15] = [
        Command::GetPath,
        Command::OpenPath,
        Command::Relaunch,
        Command::OpenDevTools,
        Command::CloseDevTools,
        Command::ToggleDevTools,
        Command::InspectElement,
        Command::MinimumSize,
        Command::WindowSize,
        Command::DevtoolsWarning,
        Command::RegisterPreload,
        Command::GetAccentColor,
        Command::RunScript,
        Command::OpenDialog,
        Command::OpenWindow,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Command::GetPath => "get-path",
            Command::OpenPath => "open-path",
            Command::Relaunch => "relaunch",
            Command::OpenDevTools => "open-devtools",
            Command::CloseDevTools => "close-devtools",
            Command::ToggleDevTools => "toggle-devtools",
            Command::InspectElement => "inspect-element",
            Command::MinimumSize => "minimum-size",
            Command::WindowSize => "window-size",
            Command::DevtoolsWarning => "devtools-warning",
            Command::RegisterPreload => "register-preload",
            Command::GetAccentColor => "get-accent-color",
            Command::RunScript => "run-script",
            Command::OpenDialog => "open-dialog",
            Command::OpenWindow => "open-window",
        }
    }

    /// Fire-and-forget commands: failures are logged, the caller gets `null`.
    pub fn is_listener(self) -> bool {
        !matches!(
            self,
            Command::GetPath
                | Command::GetAccentColor
                | Command::RunScript
                | Command::OpenDialog
                | Command::OpenWindow
        )
    }
}

impl FromStr for Command {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|command| command.as_str() == s)
            .ok_or_else(|| BridgeError::UnknownCommand(s.to_string()))
    }
}
