//! Link-aware markdown for the webview.
//!
//! The stock rule table is patched once so every link opens outside the app
//! window, then compiled and cached for the life of the process.

pub mod compile;
pub mod element;
pub mod rules;

pub use compile::{CmarkCompiler, Compiled, ParseOptions, RuleCompiler};
pub use element::Element;
pub use rules::{FirstChars, Node, RuleTable};

use crate::error::{BridgeError, BridgeResult};
use crate::utils::logger::Logger;
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Class added to every rendered link.
pub const LINK_CLASS: &str = "bridge-link";
pub const LINK_TARGET: &str = "_blank";
pub const LINK_REL: &str = "noopener noreferrer";

/// Wrap the link rule's output so anchors carry the bridge class and open in
/// a new context. Parsing is untouched.
pub fn patch_link_rule(table: &mut RuleTable) -> BridgeResult<()> {
    let rule = table.get_mut("link").ok_or(BridgeError::MissingRule("link"))?;
    let original = rule.output.clone().ok_or(BridgeError::MissingRule("link"))?;

    rule.output = Some(Arc::new(move |node: &Node, output: &rules::Output<'_>| {
        let mut element = original(node, output);
        if let Some(props) = element.props_mut() {
            props.insert("className".to_string(), LINK_CLASS.to_string());
            props.insert("target".to_string(), LINK_TARGET.to_string());
            props.insert("rel".to_string(), LINK_REL.to_string());
        }
        element
    }));
    Ok(())
}

/// Convert every keyed first-character hint into its ordered form.
pub fn normalize_first_chars(table: &mut RuleTable) {
    for rule in table.rules_mut() {
        rule.required_first_chars = rule.required_first_chars.take().map(FirstChars::into_ordered);
    }
}

/// Markdown service with a lazily compiled, process-wide parser/renderer.
pub struct LinkMarkdown<C: RuleCompiler = CmarkCompiler> {
    compiler: C,
    compiled: OnceCell<Compiled>,
    logger: Logger,
}

impl Default for LinkMarkdown<CmarkCompiler> {
    fn default() -> Self {
        Self::new(CmarkCompiler)
    }
}

impl<C: RuleCompiler> LinkMarkdown<C> {
    pub fn new(compiler: C) -> Self {
        Self {
            compiler,
            compiled: OnceCell::new(),
            logger: Logger::new("markdown"),
        }
    }

    #[cfg(test)]
    pub fn is_compiled(&self) -> bool {
        self.compiled.get().is_some()
    }

    fn compiled(&self) -> BridgeResult<&Compiled> {
        self.compiled.get_or_try_init(|| {
            self.logger.time("compile markdown rules", || {
                let mut table = self.compiler.default_rules();
                patch_link_rule(&mut table)?;
                normalize_first_chars(&mut table);
                self.compiler.compile(&table)
            })
        })
    }

    /// Compile ahead of the first render.
    pub fn warm_up(&self) -> BridgeResult<()> {
        self.compiled().map(|_| ())
    }

    #[cfg(test)]
    pub fn parse(&self, text: &str, inline: bool) -> BridgeResult<Vec<Node>> {
        Ok(self.compiled()?.parse(text, ParseOptions { inline }))
    }

    pub fn render(&self, text: &str, inline: bool) -> BridgeResult<Vec<Element>> {
        let compiled = self.compiled()?;
        Ok(compiled.render(&compiled.parse(text, ParseOptions { inline })))
    }

    pub fn render_html(&self, text: &str, inline: bool) -> BridgeResult<String> {
        self.render(text, inline).map(|elements| element::to_html(&elements))
    }
}
