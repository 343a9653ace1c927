//! Render output: a small element tree the webview can mount directly, with
//! an HTML serializer for consumers that want markup.

use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Element {
    Text(String),
    Tag {
        tag: String,
        props: BTreeMap<String, String>,
        children: Vec<Element>,
    },
}

const VOID_TAGS: [&str; 3] = ["br", "hr", "img"];

impl Element {
    pub fn tag(name: impl Into<String>) -> Self {
        Element::Tag {
            tag: name.into(),
            props: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Element::Text(text.into())
    }

    pub fn with_prop(mut self, key: &str, value: impl Into<String>) -> Self {
        if let Some(props) = self.props_mut() {
            props.insert(key.to_string(), value.into());
        }
        self
    }

    pub fn with_children(mut self, new_children: Vec<Element>) -> Self {
        if let Element::Tag { children, .. } = &mut self {
            *children = new_children;
        }
        self
    }

    #[cfg(test)]
    pub fn tag_name(&self) -> Option<&str> {
        match self {
            Element::Tag { tag, .. } => Some(tag),
            Element::Text(_) => None,
        }
    }

    #[cfg(test)]
    pub fn prop(&self, key: &str) -> Option<&str> {
        match self {
            Element::Tag { props, .. } => props.get(key).map(String::as_str),
            Element::Text(_) => None,
        }
    }

    pub fn props_mut(&mut self) -> Option<&mut BTreeMap<String, String>> {
        match self {
            Element::Tag { props, .. } => Some(props),
            Element::Text(_) => None,
        }
    }

    #[cfg(test)]
    pub fn children(&self) -> &[Element] {
        match self {
            Element::Tag { children, .. } => children,
            Element::Text(_) => &[],
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Element::Text(text) => escape_into(text, out),
            Element::Tag { tag, props, children } => {
                out.push('<');
                out.push_str(tag);
                for (key, value) in props {
                    out.push(' ');
                    // Props use DOM names; markup wants the attribute name.
                    out.push_str(if key == "className" { "class" } else { key });
                    out.push_str("=\"");
                    escape_into(value, out);
                    out.push('"');
                }
                out.push('>');

                if VOID_TAGS.contains(&tag.as_str()) {
                    return;
                }

                for child in children {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

/// Serialize a list of siblings.
pub fn to_html(elements: &[Element]) -> String {
    let mut out = String::new();
    for element in elements {
        element.write_html(&mut out);
    }
    out
}

fn escape_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}
