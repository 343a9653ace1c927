//! Transient window specs for `open-window`.

use serde::Deserialize;
use tauri::Url;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowOptions {
    pub title: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub min_width: Option<f64>,
    pub min_height: Option<f64>,
    pub resizable: Option<bool>,
    pub center: Option<bool>,
    pub show: Option<bool>,
    pub always_on_top: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WindowSpec {
    pub window_options: WindowOptions,
    pub close_on_url: Option<String>,
}

impl WindowSpec {
    /// Whether a navigation target is the one that should close the window.
    ///
    /// Both sides are compared after URL normalization when they parse, so
    /// `https://host` and `https://host/` are the same target.
    pub fn closes_on(&self, target: &str) -> bool {
        let Some(expected) = self.close_on_url.as_deref() else {
            return false;
        };
        match (Url::parse(expected), Url::parse(target)) {
            (Ok(expected), Ok(target)) => expected == target,
            _ => expected == target,
        }
    }
}
