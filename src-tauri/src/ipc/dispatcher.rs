//! Routes webview commands to host capabilities.
//!
//! Listener commands never report failure to the caller; request/response
//! commands resolve either to a value or to `{"error": message}`.

use super::args::Args;
use super::dialog::{DialogMode, DialogRequest};
use super::window::WindowSpec;
use super::Command;
use crate::error::BridgeResult;
use crate::host::Host;
use crate::preferences::BridgePreferences;
use crate::utils::logger::Logger;
use crate::utils::paths::PathCategory;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// Extra relaunch arguments: a single string or a list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RelaunchArgs {
    One(String),
    Many(Vec<String>),
}

/// Restart argument list: the current arguments minus the executable,
/// followed by `extra`.
pub fn relaunch_args(current: &[String], extra: Option<RelaunchArgs>) -> Vec<String> {
    let mut args: Vec<String> = current.iter().skip(1).cloned().collect();
    match extra {
        None => {}
        Some(RelaunchArgs::One(arg)) => args.push(arg),
        Some(RelaunchArgs::Many(more)) => args.extend(more),
    }
    args
}

/// Wrap caller script so anything it throws stays inside the page.
///
/// The source travels as a JSON string literal and is compiled by
/// `Function` inside the `try`, so no input can close the wrapper early.
pub fn wrap_script(script: &str) -> String {
    let literal = Value::String(script.to_owned()).to_string();
    format!("(() => {{ try {{ (new Function({}))(); }} catch {{}} }})();", literal)
}

pub struct Dispatcher<H: Host> {
    host: H,
    preferences: RwLock<BridgePreferences>,
    shutdown: CancellationToken,
    logger: Logger,
}

impl<H: Host> Dispatcher<H> {
    pub fn new(host: H, preferences: BridgePreferences) -> Self {
        let logger = Logger::new("ipc");
        for command in Command::ALL {
            let style = if command.is_listener() { "listener" } else { "handler" };
            logger.debug(format!("registered {} ({})", command.as_str(), style));
        }
        logger.info(format!("{} commands registered", Command::ALL.len()));

        Self {
            host,
            preferences: RwLock::new(preferences),
            shutdown: CancellationToken::new(),
            logger,
        }
    }

    #[cfg(test)]
    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn preferences(&self) -> BridgePreferences {
        self.preferences
            .read()
            .map(|prefs| prefs.clone())
            .unwrap_or_default()
    }

    pub fn update_preferences(&self, preferences: BridgePreferences) {
        match self.preferences.write() {
            Ok(mut current) => *current = preferences,
            Err(_) => self.logger.error("preferences lock poisoned; update dropped"),
        }
    }

    /// Cancel in-flight waits (currently `inspect-element`).
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Run `command` on behalf of the webview labelled `context`.
    pub async fn dispatch(&self, context: &str, command: Command, args: &[Value]) -> Value {
        let args = Args::new(command, args);

        if command.is_listener() {
            if let Err(e) = self.run_listener(context, command, &args).await {
                self.logger
                    .warn(format!("{} from '{}' failed: {}", command.as_str(), context, e));
            }
            return Value::Null;
        }

        match self.run_handler(context, command, &args).await {
            Ok(value) => value,
            Err(e) => {
                self.logger
                    .warn(format!("{} from '{}' failed: {}", command.as_str(), context, e));
                json!({ "error": e.to_frontend_message() })
            }
        }
    }

    async fn run_listener(&self, context: &str, command: Command, args: &Args<'_>) -> BridgeResult<()> {
        match command {
            Command::OpenPath => self.host.open_path(&args.required::<String>(0)?),
            Command::Relaunch => self.relaunch(args.optional(0)?),
            Command::OpenDevTools => self.host.open_devtools(context),
            Command::CloseDevTools => self.host.close_devtools(context),
            Command::ToggleDevTools => self.toggle_devtools(context),
            Command::InspectElement => self.inspect_element(context).await,
            Command::MinimumSize => {
                self.host
                    .set_minimum_size(context, args.required(0)?, args.required(1)?)
            }
            Command::WindowSize => self.host.set_size(context, args.required(0)?, args.required(1)?),
            Command::DevtoolsWarning => self.host.remove_devtools_listeners(context),
            Command::RegisterPreload => {
                self.host
                    .register_preload(PathBuf::from(args.required::<String>(0)?))
            }
            Command::GetPath
            | Command::GetAccentColor
            | Command::RunScript
            | Command::OpenDialog
            | Command::OpenWindow => unreachable!("{} is not a listener", command.as_str()),
        }
    }

    async fn run_handler(&self, context: &str, command: Command, args: &Args<'_>) -> BridgeResult<Value> {
        match command {
            Command::GetPath => Ok(Value::String(self.get_path(args.raw(0)))),
            Command::GetAccentColor => Ok(Value::String(self.host.accent_color().unwrap_or_default())),
            Command::RunScript => {
                self.run_script(context, args).await;
                Ok(Value::Null)
            }
            Command::OpenDialog => self.open_dialog(context, args.optional(0)?.unwrap_or_default()).await,
            Command::OpenWindow => {
                let url: String = args.required(0)?;
                let spec: WindowSpec = args.optional(1)?.unwrap_or_default();
                self.host.open_window(&url, spec).await?;
                Ok(Value::Null)
            }
            _ => unreachable!("{} is a listener", command.as_str()),
        }
    }

    /// Unknown categories and non-string arguments resolve to `""`.
    fn get_path(&self, requested: Option<&Value>) -> String {
        let Some(category) = requested
            .and_then(Value::as_str)
            .and_then(|name| name.parse::<PathCategory>().ok())
        else {
            return String::new();
        };

        self.host
            .resolve_path(category)
            .map(|path| path.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    fn relaunch(&self, extra: Option<RelaunchArgs>) -> BridgeResult<()> {
        let args = relaunch_args(&self.host.process_args(), extra);
        self.host.relaunch(args)?;
        // Only a relaunch that actually started may end pending waits.
        self.shutdown();
        Ok(())
    }

    fn toggle_devtools(&self, context: &str) -> BridgeResult<()> {
        if self.host.is_devtools_open(context)? {
            self.host.close_devtools(context)
        } else {
            self.host.open_devtools(context)
        }
    }

    /// Open the panel if needed, wait for it (bounded, cancellable), then
    /// switch it into element-picking mode.
    async fn inspect_element(&self, context: &str) -> BridgeResult<()> {
        if !self.host.is_devtools_open(context)? {
            self.host.open_devtools(context)?;

            let prefs = self.preferences();
            let cancelled = self.shutdown.child_token();
            let wait = tokio::time::timeout(
                prefs.inspect_timeout(),
                self.wait_for_devtools(context, &prefs),
            );

            tokio::select! {
                _ = cancelled.cancelled() => {
                    self.logger.debug(format!("inspect wait for '{}' cancelled", context));
                    return Ok(());
                }
                waited = wait => match waited {
                    Ok(opened) => opened?,
                    Err(_) => {
                        self.logger.warn(format!(
                            "devtools for '{}' did not open within {}ms",
                            context, prefs.inspect_timeout_ms
                        ));
                        return Ok(());
                    }
                },
            }
        }

        self.host.enter_inspect_mode(context)
    }

    async fn wait_for_devtools(&self, context: &str, prefs: &BridgePreferences) -> BridgeResult<()> {
        let interval = prefs.inspect_poll_interval();
        while !self.host.is_devtools_open(context)? {
            tokio::time::sleep(interval).await;
        }
        Ok(())
    }

    /// Errors from the script or from evaluation itself are dropped.
    async fn run_script(&self, context: &str, args: &Args<'_>) {
        if !self.preferences().run_script_enabled {
            self.logger
                .warn(format!("run-script from '{}' ignored: disabled in preferences", context));
            return;
        }

        let script: String = match args.required(0) {
            Ok(script) => script,
            Err(e) => {
                self.logger.debug(format!("run-script dropped: {}", e));
                return;
            }
        };

        if let Err(e) = self.host.eval_script(context, &wrap_script(&script)).await {
            self.logger.debug(format!("run-script in '{}' dropped: {}", context, e));
        }
    }

    async fn open_dialog(&self, context: &str, request: DialogRequest) -> BridgeResult<Value> {
        let Some(mode) = DialogMode::parse(&request.mode) else {
            return Ok(json!({ "error": format!("Unknown Mode: {}", request.mode) }));
        };

        let parent = request.modal.then_some(context);
        let options = request.into_options();
        let result = match mode {
            DialogMode::Open => self.host.show_open_dialog(parent, options).await?,
            DialogMode::Save => self.host.show_save_dialog(parent, options).await?,
        };

        Ok(serde_json::to_value(result)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::{HostCall, MockHost};
    use crate::ipc::dialog::DialogProperty;
    use std::time::{Duration, Instant};

    const CTX: &str = "main";

    fn dispatcher(host: MockHost) -> Dispatcher<MockHost> {
        Dispatcher::new(host, BridgePreferences::default())
    }

    fn fast_prefs(timeout_ms: u64) -> BridgePreferences {
        BridgePreferences {
            inspect_poll_interval_ms: 1,
            inspect_timeout_ms: timeout_ms,
            ..Default::default()
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn get_path_resolves_known_categories() {
        let mut host = MockHost::with_context(CTX);
        host.paths.insert(PathCategory::UserData, PathBuf::from("/home/u/.config/app"));
        let d = dispatcher(host);

        let found = d.dispatch(CTX, Command::GetPath, &[json!("userData")]).await;
        assert_eq!(found, json!("/home/u/.config/app"));
    }

    #[tokio::test]
    async fn get_path_returns_empty_for_unknown_or_unresolved() {
        let d = dispatcher(MockHost::with_context(CTX));

        assert_eq!(d.dispatch(CTX, Command::GetPath, &[json!("bogus")]).await, json!(""));
        assert_eq!(d.dispatch(CTX, Command::GetPath, &[json!(42)]).await, json!(""));
        assert_eq!(d.dispatch(CTX, Command::GetPath, &[]).await, json!(""));
        // Known category the host cannot resolve.
        assert_eq!(d.dispatch(CTX, Command::GetPath, &[json!("recent")]).await, json!(""));
    }

    #[test]
    fn relaunch_args_normalization() {
        let current = strings(&["/usr/bin/app", "--flag", "file.txt"]);

        assert_eq!(relaunch_args(&current, None), strings(&["--flag", "file.txt"]));
        assert_eq!(
            relaunch_args(&current, Some(RelaunchArgs::One("x".into()))),
            strings(&["--flag", "file.txt", "x"])
        );
        assert_eq!(
            relaunch_args(&current, Some(RelaunchArgs::Many(strings(&["x", "y"])))),
            strings(&["--flag", "file.txt", "x", "y"])
        );
        assert!(relaunch_args(&[], None).is_empty());
    }

    #[tokio::test]
    async fn relaunch_accepts_string_list_or_nothing() {
        let mut host = MockHost::with_context(CTX);
        host.args = strings(&["app", "--a"]);
        let d = dispatcher(host);

        d.dispatch(CTX, Command::Relaunch, &[]).await;
        d.dispatch(CTX, Command::Relaunch, &[json!("x")]).await;
        d.dispatch(CTX, Command::Relaunch, &[json!(["x", "y"])]).await;

        assert_eq!(
            d.host().calls(),
            vec![
                HostCall::Relaunch(strings(&["--a"])),
                HostCall::Relaunch(strings(&["--a", "x"])),
                HostCall::Relaunch(strings(&["--a", "x", "y"])),
            ]
        );
    }

    #[tokio::test]
    async fn unknown_dialog_mode_opens_nothing() {
        let d = dispatcher(MockHost::with_context(CTX));

        let result = d.dispatch(CTX, Command::OpenDialog, &[json!({"mode": "bogus"})]).await;

        assert_eq!(result, json!({"error": "Unknown Mode: bogus"}));
        assert!(d.host().calls().is_empty());
    }

    #[tokio::test]
    async fn open_directory_dialog_flags() {
        let d = dispatcher(MockHost::with_context(CTX));

        let result = d
            .dispatch(
                CTX,
                Command::OpenDialog,
                &[json!({"mode": "open", "openDirectory": true, "openFile": false})],
            )
            .await;
        assert_eq!(result, json!({"canceled": false, "filePaths": ["/picked/file.txt"]}));

        let calls = d.host().calls();
        let HostCall::OpenDialog(parent, options) = &calls[0] else {
            panic!("expected an open dialog, got {:?}", calls);
        };
        assert_eq!(parent, &None);
        assert_eq!(
            options.properties,
            vec![DialogProperty::OpenDirectory, DialogProperty::OpenDirectory]
        );
        assert!(!options.has(DialogProperty::OpenFile));
        assert!(options.create_directory);
    }

    #[tokio::test]
    async fn modal_save_dialog_is_parented() {
        let d = dispatcher(MockHost::with_context(CTX));

        let result = d
            .dispatch(CTX, Command::OpenDialog, &[json!({"mode": "save", "modal": true})])
            .await;
        assert_eq!(result, json!({"canceled": true}));

        let calls = d.host().calls();
        assert!(matches!(&calls[0], HostCall::SaveDialog(Some(parent), _) if parent == CTX));
    }

    #[tokio::test]
    async fn malformed_dialog_options_resolve_to_error() {
        let d = dispatcher(MockHost::with_context(CTX));

        let result = d.dispatch(CTX, Command::OpenDialog, &[json!({"modal": "yes"})]).await;

        assert!(result["error"].as_str().unwrap().contains("open-dialog"));
        assert!(d.host().calls().is_empty());
    }

    #[tokio::test]
    async fn toggle_devtools_round_trip() {
        let d = dispatcher(MockHost::with_context(CTX));

        d.dispatch(CTX, Command::ToggleDevTools, &[]).await;
        assert!(d.host().is_devtools_open(CTX).unwrap());

        d.dispatch(CTX, Command::ToggleDevTools, &[]).await;
        assert!(!d.host().is_devtools_open(CTX).unwrap());

        assert_eq!(
            d.host().calls(),
            vec![
                HostCall::OpenDevtools(CTX.to_string()),
                HostCall::CloseDevtools(CTX.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn inspect_waits_for_panel_then_enters_inspect_mode() {
        let host = MockHost::with_context(CTX);
        *host.devtools_lag.lock().unwrap() = Some(3);
        let d = Dispatcher::new(host, fast_prefs(5_000));

        assert_eq!(d.dispatch(CTX, Command::InspectElement, &[]).await, Value::Null);

        assert_eq!(
            d.host().calls(),
            vec![
                HostCall::OpenDevtools(CTX.to_string()),
                HostCall::InspectMode(CTX.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn inspect_skips_opening_when_panel_already_open() {
        let d = dispatcher(MockHost::with_context(CTX));
        d.host().open_devtools(CTX).unwrap();

        d.dispatch(CTX, Command::InspectElement, &[]).await;

        assert_eq!(
            d.host().calls(),
            vec![
                HostCall::OpenDevtools(CTX.to_string()),
                HostCall::InspectMode(CTX.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn inspect_gives_up_after_timeout() {
        let host = MockHost::with_context(CTX);
        *host.devtools_lag.lock().unwrap() = None;
        let d = Dispatcher::new(host, fast_prefs(30));

        let started = Instant::now();
        assert_eq!(d.dispatch(CTX, Command::InspectElement, &[]).await, Value::Null);

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(d.host().calls(), vec![HostCall::OpenDevtools(CTX.to_string())]);
    }

    #[tokio::test]
    async fn inspect_stops_on_shutdown() {
        let host = MockHost::with_context(CTX);
        *host.devtools_lag.lock().unwrap() = None;
        let d = Dispatcher::new(host, fast_prefs(60_000));
        d.shutdown();

        let started = Instant::now();
        d.dispatch(CTX, Command::InspectElement, &[]).await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(!d.host().calls().contains(&HostCall::InspectMode(CTX.to_string())));
    }

    #[tokio::test]
    async fn failed_relaunch_leaves_inspect_working() {
        let mut host = MockHost::with_context(CTX);
        host.fail_relaunch = true;
        let d = Dispatcher::new(host, fast_prefs(1_000));

        d.dispatch(CTX, Command::Relaunch, &[json!("x")]).await;
        d.dispatch(CTX, Command::InspectElement, &[]).await;

        assert_eq!(
            d.host().calls(),
            vec![
                HostCall::Relaunch(strings(&["x"])),
                HostCall::OpenDevtools(CTX.to_string()),
                HostCall::InspectMode(CTX.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn successful_relaunch_cancels_inspect_waits() {
        let host = MockHost::with_context(CTX);
        *host.devtools_lag.lock().unwrap() = None;
        let d = Dispatcher::new(host, fast_prefs(60_000));

        d.dispatch(CTX, Command::Relaunch, &[]).await;
        let started = Instant::now();
        d.dispatch(CTX, Command::InspectElement, &[]).await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(!d.host().calls().contains(&HostCall::InspectMode(CTX.to_string())));
    }

    #[tokio::test]
    async fn listener_failures_are_not_reported() {
        let d = dispatcher(MockHost::with_context(CTX));

        assert_eq!(d.dispatch("gone", Command::OpenDevTools, &[]).await, Value::Null);
        assert_eq!(
            d.dispatch(CTX, Command::WindowSize, &[json!(800), json!("tall")]).await,
            Value::Null
        );
        assert!(d.host().calls().is_empty());
    }

    #[tokio::test]
    async fn window_sizes_target_the_calling_context() {
        let d = dispatcher(MockHost::with_context(CTX));

        d.dispatch(CTX, Command::MinimumSize, &[json!(640), json!(480)]).await;
        d.dispatch(CTX, Command::WindowSize, &[json!(1280.0), json!(720.0)]).await;

        assert_eq!(
            d.host().calls(),
            vec![
                HostCall::MinimumSize(CTX.to_string(), 640.0, 480.0),
                HostCall::Size(CTX.to_string(), 1280.0, 720.0),
            ]
        );
    }

    #[tokio::test]
    async fn accent_color_never_synthesized() {
        let d = dispatcher(MockHost::with_context(CTX));
        assert_eq!(d.dispatch(CTX, Command::GetAccentColor, &[]).await, json!(""));

        let mut host = MockHost::with_context(CTX);
        host.accent = Some("#3b82f6ff".into());
        let d = dispatcher(host);
        assert_eq!(d.dispatch(CTX, Command::GetAccentColor, &[]).await, json!("#3b82f6ff"));
    }

    #[tokio::test]
    async fn run_script_swallows_errors() {
        let mut host = MockHost::with_context(CTX);
        host.fail_eval = true;
        let d = dispatcher(host);

        let result = d.dispatch(CTX, Command::RunScript, &[json!("throw new Error('x')")]).await;
        assert_eq!(result, Value::Null);

        let calls = d.host().calls();
        let HostCall::Eval(context, script) = &calls[0] else {
            panic!("expected eval, got {:?}", calls);
        };
        assert_eq!(context, CTX);
        assert_eq!(script, &wrap_script("throw new Error('x')"));
    }

    #[tokio::test]
    async fn run_script_respects_preference() {
        let d = Dispatcher::new(
            MockHost::with_context(CTX),
            BridgePreferences {
                run_script_enabled: false,
                ..Default::default()
            },
        );

        assert_eq!(d.dispatch(CTX, Command::RunScript, &[json!("1 + 1")]).await, Value::Null);
        assert!(d.host().calls().is_empty());
    }

    #[test]
    fn wrapped_script_cannot_escape_try() {
        let hostile = "} catch {} })(); alert(1); (() => { try {";
        let wrapped = wrap_script(hostile);

        assert!(wrapped.starts_with("(() => { try { (new Function(\""));
        assert!(wrapped.ends_with("))(); } catch {} })();"));
        // The hostile text only appears inside the string literal.
        assert_eq!(wrapped.matches("catch {}").count(), 2);
        assert!(wrapped.contains(&Value::String(hostile.to_string()).to_string()));
    }

    #[tokio::test]
    async fn open_window_forwards_spec() {
        let d = dispatcher(MockHost::with_context(CTX));

        let result = d
            .dispatch(
                CTX,
                Command::OpenWindow,
                &[
                    json!("https://auth.example.com/login"),
                    json!({"windowOptions": {"width": 500}, "closeOnUrl": "https://auth.example.com/done"}),
                ],
            )
            .await;
        assert_eq!(result, Value::Null);

        let calls = d.host().calls();
        let HostCall::OpenWindow(url, spec) = &calls[0] else {
            panic!("expected window, got {:?}", calls);
        };
        assert_eq!(url, "https://auth.example.com/login");
        assert_eq!(spec.window_options.width, Some(500.0));
        assert!(spec.closes_on("https://auth.example.com/done"));
    }

    #[tokio::test]
    async fn open_window_without_url_resolves_to_error() {
        let d = dispatcher(MockHost::with_context(CTX));

        let result = d.dispatch(CTX, Command::OpenWindow, &[]).await;

        assert_eq!(result, json!({"error": "Missing argument #0 for 'open-window'"}));
    }

    #[tokio::test]
    async fn preload_and_devtools_warning_are_forwarded() {
        let d = dispatcher(MockHost::with_context(CTX));

        d.dispatch(CTX, Command::RegisterPreload, &[json!("/opt/app/preload.js")]).await;
        d.dispatch(CTX, Command::DevtoolsWarning, &[]).await;
        d.dispatch(CTX, Command::OpenPath, &[json!("/tmp")]).await;

        assert_eq!(
            d.host().calls(),
            vec![
                HostCall::RegisterPreload(PathBuf::from("/opt/app/preload.js")),
                HostCall::RemoveDevtoolsListeners(CTX.to_string()),
                HostCall::OpenPath("/tmp".to_string()),
            ]
        );
    }
}
