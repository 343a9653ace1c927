/// Host capabilities backed by the running Tauri app: windows, dialogs,
/// devtools, path resolution and process control.
use super::Host;
use crate::error::{BridgeError, BridgeResult};
use crate::ipc::dialog::{DialogOptions, DialogProperty, FileDialogResult};
use crate::ipc::window::WindowSpec;
use crate::utils::accent;
use crate::utils::paths::{self, PathCategory};
use anyhow::anyhow;
use async_trait::async_trait;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;
use tauri::{
    AppHandle, Emitter, LogicalSize, Manager, Url, WebviewUrl, WebviewWindow, WebviewWindowBuilder,
    Wry,
};
use tauri_plugin_dialog::{DialogExt, FileDialogBuilder, FilePath};
use tokio::sync::oneshot;
use uuid::Uuid;

pub const DEVTOOLS_OPENED_EVENT: &str = "devtools-opened";

pub struct TauriHost {
    app: AppHandle,
    preloads: Mutex<Vec<PathBuf>>,
    quiet_devtools: Mutex<HashSet<String>>,
}

impl TauriHost {
    pub fn new(app: AppHandle) -> Self {
        Self {
            app,
            preloads: Mutex::new(Vec::new()),
            quiet_devtools: Mutex::new(HashSet::new()),
        }
    }

    fn window(&self, context: &str) -> BridgeResult<WebviewWindow> {
        self.app
            .get_webview_window(context)
            .ok_or_else(|| BridgeError::ContextNotFound(context.to_string()))
    }

    fn preload_scripts(&self) -> Vec<String> {
        let registered = match self.preloads.lock() {
            Ok(paths) => paths.clone(),
            Err(_) => return Vec::new(),
        };

        registered
            .into_iter()
            .filter_map(|path| match fs::read_to_string(&path) {
                Ok(script) => Some(script),
                Err(source) => {
                    log::warn!("{}", BridgeError::PreloadRead { path, source });
                    None
                }
            })
            .collect()
    }

    fn file_dialog(
        &self,
        parent: Option<&str>,
        options: &DialogOptions,
    ) -> BridgeResult<FileDialogBuilder<Wry>> {
        let mut builder = self
            .app
            .dialog()
            .file()
            .set_can_create_directories(options.create_directory);

        if let Some(title) = &options.title {
            builder = builder.set_title(title);
        }

        for filter in &options.filters {
            let extensions: Vec<&str> = filter.extensions.iter().map(String::as_str).collect();
            builder = builder.add_filter(&filter.name, &extensions);
        }

        if let Some(default_path) = options.default_path.as_deref() {
            let path = Path::new(default_path);
            if path.is_dir() {
                builder = builder.set_directory(path);
            } else {
                if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                    builder = builder.set_directory(dir);
                }
                if let Some(name) = path.file_name() {
                    builder = builder.set_file_name(name.to_string_lossy());
                }
            }
        }

        // Native pickers have no message line or hidden-file toggle.
        if options.message.is_some() || options.has(DialogProperty::ShowHiddenFiles) {
            log::debug!("dialog message/showHiddenFiles are not supported by the native picker");
        }

        if let Some(context) = parent {
            let window = self.window(context)?;
            builder = builder.set_parent(&window);
        }

        Ok(builder)
    }
}

/// Arguments are not guaranteed to be Unicode; undecodable bytes are
/// replaced rather than aborting the relaunch.
fn lossy_args(args: impl IntoIterator<Item = OsString>) -> Vec<String> {
    args.into_iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect()
}

fn to_strings(paths: Vec<FilePath>) -> Vec<String> {
    paths.iter().map(ToString::to_string).collect()
}

#[async_trait]
impl Host for TauriHost {
    fn resolve_path(&self, category: PathCategory) -> Option<PathBuf> {
        match paths::resolve_category(&self.app, category) {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        }
    }

    fn open_path(&self, path: &str) -> BridgeResult<()> {
        #[cfg(target_os = "windows")]
        {
            Command::new("explorer.exe")
                .arg(path)
                .spawn()
                .map_err(|e| BridgeError::OpenPath {
                    path: path.to_string(),
                    reason: e.to_string(),
                })?;
        }

        #[cfg(not(target_os = "windows"))]
        {
            use tauri_plugin_shell::ShellExt;

            #[allow(deprecated)]
            self.app
                .shell()
                .open(path, None)
                .map_err(|e| BridgeError::OpenPath {
                    path: path.to_string(),
                    reason: e.to_string(),
                })?;
        }

        Ok(())
    }

    fn process_args(&self) -> Vec<String> {
        lossy_args(std::env::args_os())
    }

    fn relaunch(&self, args: Vec<String>) -> BridgeResult<()> {
        let exe = std::env::current_exe().map_err(|e| BridgeError::Relaunch(e.to_string()))?;
        Command::new(&exe)
            .args(&args)
            .spawn()
            .map_err(|e| BridgeError::Relaunch(format!("{}: {}", exe.display(), e)))?;

        log::info!("relaunching {} with {:?}", exe.display(), args);
        self.app.exit(0);
        Ok(())
    }

    fn is_devtools_open(&self, context: &str) -> BridgeResult<bool> {
        Ok(self.window(context)?.is_devtools_open())
    }

    fn open_devtools(&self, context: &str) -> BridgeResult<()> {
        self.window(context)?.open_devtools();

        let quiet = self
            .quiet_devtools
            .lock()
            .map(|labels| labels.contains(context))
            .unwrap_or(false);
        if !quiet {
            self.app.emit_to(context, DEVTOOLS_OPENED_EVENT, ())?;
        }
        Ok(())
    }

    fn close_devtools(&self, context: &str) -> BridgeResult<()> {
        self.window(context)?.close_devtools();
        Ok(())
    }

    fn enter_inspect_mode(&self, context: &str) -> BridgeResult<()> {
        // The webview runtime gives no script access to the devtools frontend,
        // so the open panel is the closest equivalent.
        self.window(context)?;
        log::debug!("inspect mode requested for '{}'", context);
        Ok(())
    }

    fn remove_devtools_listeners(&self, context: &str) -> BridgeResult<()> {
        self.quiet_devtools
            .lock()
            .map_err(|_| anyhow!("devtools listener registry poisoned"))?
            .insert(context.to_string());
        Ok(())
    }

    fn set_minimum_size(&self, context: &str, width: f64, height: f64) -> BridgeResult<()> {
        self.window(context)?
            .set_min_size(Some(LogicalSize::new(width, height)))?;
        Ok(())
    }

    fn set_size(&self, context: &str, width: f64, height: f64) -> BridgeResult<()> {
        self.window(context)?.set_size(LogicalSize::new(width, height))?;
        Ok(())
    }

    fn accent_color(&self) -> Option<String> {
        accent::system_accent_color()
    }

    async fn eval_script(&self, context: &str, script: &str) -> BridgeResult<()> {
        self.window(context)?.eval(script)?;
        Ok(())
    }

    async fn show_open_dialog(
        &self,
        parent: Option<&str>,
        options: DialogOptions,
    ) -> BridgeResult<FileDialogResult> {
        let builder = self.file_dialog(parent, &options)?;
        let multiple = options.has(DialogProperty::MultiSelections);
        let (tx, rx) = oneshot::channel::<Option<Vec<String>>>();

        match (options.has(DialogProperty::OpenDirectory), multiple) {
            (true, true) => builder.pick_folders(move |picked| {
                let _ = tx.send(picked.map(to_strings));
            }),
            (true, false) => builder.pick_folder(move |picked| {
                let _ = tx.send(picked.map(|p| vec![p.to_string()]));
            }),
            (false, true) => builder.pick_files(move |picked| {
                let _ = tx.send(picked.map(to_strings));
            }),
            (false, false) => builder.pick_file(move |picked| {
                let _ = tx.send(picked.map(|p| vec![p.to_string()]));
            }),
        }

        let picked = rx.await.map_err(|_| BridgeError::DialogDropped)?;
        Ok(FileDialogResult::opened(picked))
    }

    async fn show_save_dialog(
        &self,
        parent: Option<&str>,
        options: DialogOptions,
    ) -> BridgeResult<FileDialogResult> {
        let builder = self.file_dialog(parent, &options)?;
        let (tx, rx) = oneshot::channel::<Option<String>>();

        builder.save_file(move |picked| {
            let _ = tx.send(picked.map(|p| p.to_string()));
        });

        let picked = rx.await.map_err(|_| BridgeError::DialogDropped)?;
        Ok(FileDialogResult::saved(picked))
    }

    async fn open_window(&self, url: &str, spec: WindowSpec) -> BridgeResult<()> {
        let label = format!("bridge-{}", Uuid::new_v4().simple());
        let target = match Url::parse(url) {
            Ok(parsed) => WebviewUrl::External(parsed),
            Err(_) => WebviewUrl::App(PathBuf::from(url)),
        };

        let (tx, rx) = oneshot::channel::<()>();
        let notify = Mutex::new(Some(tx));
        let close_spec = spec.clone();

        let mut builder = WebviewWindowBuilder::new(&self.app, &label, target).on_navigation(
            move |navigated: &Url| {
                if close_spec.closes_on(navigated.as_str()) {
                    if let Some(tx) = notify.lock().ok().and_then(|mut slot| slot.take()) {
                        let _ = tx.send(());
                    }
                }
                true
            },
        );

        let options = &spec.window_options;
        if let Some(title) = &options.title {
            builder = builder.title(title);
        }
        if let (Some(width), Some(height)) = (options.width, options.height) {
            builder = builder.inner_size(width, height);
        }
        if let (Some(width), Some(height)) = (options.min_width, options.min_height) {
            builder = builder.min_inner_size(width, height);
        }
        if let Some(resizable) = options.resizable {
            builder = builder.resizable(resizable);
        }
        if options.center == Some(true) {
            builder = builder.center();
        }
        if let Some(show) = options.show {
            builder = builder.visible(show);
        }
        if let Some(on_top) = options.always_on_top {
            builder = builder.always_on_top(on_top);
        }
        for script in self.preload_scripts() {
            builder = builder.initialization_script(&script);
        }

        let window = builder.build()?;
        log::debug!("opened window '{}' on {}", label, url);

        if rx.await.is_err() {
            log::debug!("window '{}' went away before reaching its close URL", label);
            return Ok(());
        }

        if let Err(e) = window.close() {
            log::warn!("failed to close window '{}': {}", label, e);
        }
        Ok(())
    }

    fn register_preload(&self, path: PathBuf) -> BridgeResult<()> {
        self.preloads
            .lock()
            .map_err(|_| anyhow!("preload registry poisoned"))?
            .push(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unicode_args_pass_through() {
        let args = vec![OsString::from("/usr/bin/app"), OsString::from("--open=naïve.md")];
        assert_eq!(lossy_args(args), vec!["/usr/bin/app", "--open=naïve.md"]);
    }

    #[cfg(unix)]
    #[test]
    fn non_unicode_args_are_replaced_not_fatal() {
        use std::os::unix::ffi::OsStringExt;

        let raw = OsString::from_vec(vec![b'f', 0xff, b'.', b'm', b'd']);
        let args = lossy_args(vec![OsString::from("app"), raw]);
        assert_eq!(args, vec!["app".to_string(), "f\u{FFFD}.md".to_string()]);
    }
}
