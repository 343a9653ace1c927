/// IPC entry point: every webview message funnels through the dispatcher
use crate::ipc::{BridgeDispatcher, Command};
use serde_json::Value;
use tauri::{State, WebviewWindow};

#[tauri::command]
pub async fn ipc_dispatch(
    webview_window: WebviewWindow,
    dispatcher: State<'_, BridgeDispatcher>,
    command: String,
    args: Option<Vec<Value>>,
) -> Result<Value, String> {
    let command: Command = command.parse().map_err(|e: crate::error::BridgeError| {
        log::warn!("rejected message from '{}': {}", webview_window.label(), e);
        e.to_frontend_message()
    })?;

    let args = args.unwrap_or_default();
    Ok(dispatcher
        .dispatch(webview_window.label(), command, &args)
        .await)
}
