//! File dialog requests: option normalization and the host-facing options.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFilter {
    pub name: String,
    #[serde(default)]
    pub extensions: Vec<String>,
}

/// Dialog options as sent by the webview.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DialogRequest {
    pub mode: String,
    pub open_directory: bool,
    pub open_file: bool,
    pub multi_selections: bool,
    pub filters: Option<Vec<FileFilter>>,
    pub prompt_to_create: bool,
    pub default_path: Option<String>,
    pub title: Option<String>,
    pub show_overwrite_confirmation: Option<bool>,
    pub message: Option<String>,
    pub show_hidden_files: Option<bool>,
    pub modal: bool,
}

impl Default for DialogRequest {
    fn default() -> Self {
        Self {
            mode: "open".to_string(),
            open_directory: false,
            open_file: true,
            multi_selections: false,
            filters: None,
            prompt_to_create: false,
            default_path: None,
            title: None,
            show_overwrite_confirmation: None,
            message: None,
            show_hidden_files: None,
            modal: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogMode {
    Open,
    Save,
}

impl DialogMode {
    pub fn parse(mode: &str) -> Option<Self> {
        match mode {
            "open" => Some(DialogMode::Open),
            "save" => Some(DialogMode::Save),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DialogProperty {
    ShowHiddenFiles,
    OpenDirectory,
    PromptToCreate,
    OpenFile,
    MultiSelections,
    ShowOverwriteConfirmation,
}

/// Options handed to the host dialog provider once the request is normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogOptions {
    pub default_path: Option<String>,
    pub filters: Vec<FileFilter>,
    pub title: Option<String>,
    pub message: Option<String>,
    pub create_directory: bool,
    pub properties: Vec<DialogProperty>,
}

impl DialogOptions {
    pub fn has(&self, property: DialogProperty) -> bool {
        self.properties.contains(&property)
    }
}

impl DialogRequest {
    /// Truthy flags in provider order. `openDirectory` is listed twice,
    /// matching what existing callers have always sent to the provider.
    pub fn properties(&self) -> Vec<DialogProperty> {
        [
            (self.show_hidden_files.unwrap_or(false), DialogProperty::ShowHiddenFiles),
            (self.open_directory, DialogProperty::OpenDirectory),
            (self.prompt_to_create, DialogProperty::PromptToCreate),
            (self.open_directory, DialogProperty::OpenDirectory),
            (self.open_file, DialogProperty::OpenFile),
            (self.multi_selections, DialogProperty::MultiSelections),
            (
                self.show_overwrite_confirmation.unwrap_or(false),
                DialogProperty::ShowOverwriteConfirmation,
            ),
        ]
        .into_iter()
        .filter_map(|(set, property)| set.then_some(property))
        .collect()
    }

    pub fn into_options(self) -> DialogOptions {
        let properties = self.properties();
        DialogOptions {
            default_path: self.default_path,
            filters: self.filters.unwrap_or_default(),
            title: self.title,
            message: self.message,
            create_directory: true,
            properties,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDialogResult {
    pub canceled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_paths: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

impl FileDialogResult {
    pub fn opened(paths: Option<Vec<String>>) -> Self {
        match paths {
            Some(paths) if !paths.is_empty() => Self {
                canceled: false,
                file_paths: Some(paths),
                file_path: None,
            },
            _ => Self {
                canceled: true,
                file_paths: Some(Vec::new()),
                file_path: None,
            },
        }
    }

    pub fn saved(path: Option<String>) -> Self {
        Self {
            canceled: path.is_none(),
            file_paths: None,
            file_path: path,
        }
    }
}
