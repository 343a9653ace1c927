mod commands;
mod error;
mod host;
mod ipc;
mod markdown;
mod preferences;
mod preloader;
mod utils;

use host::TauriHost;
use ipc::{BridgeDispatcher, Dispatcher};
use markdown::LinkMarkdown;
use tauri::{Manager, RunEvent};

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
  let app = tauri::Builder::default()
    .plugin(tauri_plugin_dialog::init())
    .plugin(tauri_plugin_shell::init())
    .plugin(
        tauri_plugin_log::Builder::default()
            .level(log::LevelFilter::Info)
            .build(),
    )
    .manage(LinkMarkdown::default())
    .setup(|app| {
        let app_handle = app.handle().clone();

        // Missing directories only degrade path lookups and preference writes.
        if let Err(e) = utils::initialize_app_directories(&app_handle) {
            log::error!("failed to initialize app directories: {}", e);
        }

        let prefs = preferences::load_or_default(&app_handle);
        app.manage(Dispatcher::new(TauriHost::new(app_handle.clone()), prefs));

        tauri::async_runtime::spawn(preloader::preload_markdown_rules(app_handle));

        Ok(())
    })
    .invoke_handler(tauri::generate_handler![
        commands::ipc_dispatch,
        commands::render_markdown,
        commands::markdown_to_html,
        preferences::get_preferences,
        preferences::set_preferences
    ])
    .build(tauri::generate_context!())
    .expect("error while building tauri application");

  app.run(|app_handle, event| {
    if let RunEvent::ExitRequested { .. } = event {
        // Release anything still waiting on a devtools panel.
        if let Some(dispatcher) = app_handle.try_state::<BridgeDispatcher>() {
            dispatcher.shutdown();
        }
    }
  });
}
