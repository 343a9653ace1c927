//! Recording host for dispatcher tests.

use super::Host;
use crate::error::{BridgeError, BridgeResult};
use crate::ipc::dialog::{DialogOptions, FileDialogResult};
use crate::ipc::window::WindowSpec;
use crate::utils::paths::PathCategory;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    OpenPath(String),
    Relaunch(Vec<String>),
    OpenDevtools(String),
    CloseDevtools(String),
    InspectMode(String),
    RemoveDevtoolsListeners(String),
    MinimumSize(String, f64, f64),
    Size(String, f64, f64),
    Eval(String, String),
    OpenDialog(Option<String>, DialogOptions),
    SaveDialog(Option<String>, DialogOptions),
    OpenWindow(String, WindowSpec),
    RegisterPreload(PathBuf),
}

#[derive(Default)]
pub struct MockHost {
    pub calls: Mutex<Vec<HostCall>>,
    pub paths: HashMap<PathCategory, PathBuf>,
    pub args: Vec<String>,
    pub accent: Option<String>,
    pub known_contexts: Vec<String>,
    /// Number of `is_devtools_open` polls that still report closed after
    /// the panel was asked to open. `None` means it never opens.
    pub devtools_lag: Mutex<Option<usize>>,
    pub devtools_open: Mutex<HashMap<String, bool>>,
    pub fail_eval: bool,
    pub fail_relaunch: bool,
}

impl MockHost {
    pub fn with_context(context: &str) -> Self {
        Self {
            known_contexts: vec![context.to_string()],
            devtools_lag: Mutex::new(Some(0)),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: HostCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, context: &str) -> BridgeResult<()> {
        if self.known_contexts.iter().any(|c| c == context) {
            Ok(())
        } else {
            Err(BridgeError::ContextNotFound(context.to_string()))
        }
    }
}

#[async_trait]
impl Host for MockHost {
    fn resolve_path(&self, category: PathCategory) -> Option<PathBuf> {
        self.paths.get(&category).cloned()
    }

    fn open_path(&self, path: &str) -> BridgeResult<()> {
        self.record(HostCall::OpenPath(path.to_string()));
        Ok(())
    }

    fn process_args(&self) -> Vec<String> {
        self.args.clone()
    }

    fn relaunch(&self, args: Vec<String>) -> BridgeResult<()> {
        self.record(HostCall::Relaunch(args));
        if self.fail_relaunch {
            return Err(BridgeError::Relaunch("spawn refused".to_string()));
        }
        Ok(())
    }

    fn is_devtools_open(&self, context: &str) -> BridgeResult<bool> {
        self.check(context)?;
        let requested = self.devtools_open.lock().unwrap().get(context).copied().unwrap_or(false);
        if !requested {
            return Ok(false);
        }
        let mut lag = self.devtools_lag.lock().unwrap();
        match lag.as_mut() {
            None => Ok(false),
            Some(0) => Ok(true),
            Some(remaining) => {
                *remaining -= 1;
                Ok(false)
            }
        }
    }

    fn open_devtools(&self, context: &str) -> BridgeResult<()> {
        self.check(context)?;
        self.devtools_open.lock().unwrap().insert(context.to_string(), true);
        self.record(HostCall::OpenDevtools(context.to_string()));
        Ok(())
    }

    fn close_devtools(&self, context: &str) -> BridgeResult<()> {
        self.check(context)?;
        self.devtools_open.lock().unwrap().insert(context.to_string(), false);
        self.record(HostCall::CloseDevtools(context.to_string()));
        Ok(())
    }

    fn enter_inspect_mode(&self, context: &str) -> BridgeResult<()> {
        self.record(HostCall::InspectMode(context.to_string()));
        Ok(())
    }

    fn remove_devtools_listeners(&self, context: &str) -> BridgeResult<()> {
        self.record(HostCall::RemoveDevtoolsListeners(context.to_string()));
        Ok(())
    }

    fn set_minimum_size(&self, context: &str, width: f64, height: f64) -> BridgeResult<()> {
        self.check(context)?;
        self.record(HostCall::MinimumSize(context.to_string(), width, height));
        Ok(())
    }

    fn set_size(&self, context: &str, width: f64, height: f64) -> BridgeResult<()> {
        self.check(context)?;
        self.record(HostCall::Size(context.to_string(), width, height));
        Ok(())
    }

    fn accent_color(&self) -> Option<String> {
        self.accent.clone()
    }

    async fn eval_script(&self, context: &str, script: &str) -> BridgeResult<()> {
        self.record(HostCall::Eval(context.to_string(), script.to_string()));
        if self.fail_eval {
            return Err(BridgeError::ContextNotFound(context.to_string()));
        }
        Ok(())
    }

    async fn show_open_dialog(
        &self,
        parent: Option<&str>,
        options: DialogOptions,
    ) -> BridgeResult<FileDialogResult> {
        self.record(HostCall::OpenDialog(parent.map(str::to_string), options));
        Ok(FileDialogResult::opened(Some(vec!["/picked/file.txt".to_string()])))
    }

    async fn show_save_dialog(
        &self,
        parent: Option<&str>,
        options: DialogOptions,
    ) -> BridgeResult<FileDialogResult> {
        self.record(HostCall::SaveDialog(parent.map(str::to_string), options));
        Ok(FileDialogResult::saved(None))
    }

    async fn open_window(&self, url: &str, spec: WindowSpec) -> BridgeResult<()> {
        self.record(HostCall::OpenWindow(url.to_string(), spec));
        Ok(())
    }

    fn register_preload(&self, path: PathBuf) -> BridgeResult<()> {
        self.record(HostCall::RegisterPreload(path));
        Ok(())
    }
}
