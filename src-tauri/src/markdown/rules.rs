//! Rule table: syntax tree node types and how each one renders.

use super::element::Element;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Paragraph(Vec<Node>),
    Heading { level: u8, children: Vec<Node> },
    BlockQuote(Vec<Node>),
    CodeBlock { lang: Option<String>, code: String },
    List { start: Option<u64>, items: Vec<Vec<Node>> },
    ThematicBreak,
    Em(Vec<Node>),
    Strong(Vec<Node>),
    Del(Vec<Node>),
    InlineCode(String),
    Break,
    Link { target: String, title: Option<String>, children: Vec<Node> },
    Image { target: String, title: Option<String>, alt: String },
    Html(String),
}

impl Node {
    /// Name of the rule that renders this node.
    pub fn rule_name(&self) -> &'static str {
        match self {
            Node::Text(_) => "text",
            Node::Paragraph(_) => "paragraph",
            Node::Heading { .. } => "heading",
            Node::BlockQuote(_) => "blockQuote",
            Node::CodeBlock { .. } => "codeBlock",
            Node::List { .. } => "list",
            Node::ThematicBreak => "hr",
            Node::Em(_) => "em",
            Node::Strong(_) => "strong",
            Node::Del(_) => "del",
            Node::InlineCode(_) => "inlineCode",
            Node::Break => "br",
            Node::Link { .. } => "link",
            Node::Image { .. } => "image",
            Node::Html(_) => "html",
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Paragraph(children)
            | Node::Heading { children, .. }
            | Node::BlockQuote(children)
            | Node::Em(children)
            | Node::Strong(children)
            | Node::Del(children)
            | Node::Link { children, .. } => children,
            _ => &[],
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            Node::Text(_)
                | Node::Em(_)
                | Node::Strong(_)
                | Node::Del(_)
                | Node::InlineCode(_)
                | Node::Break
                | Node::Link { .. }
                | Node::Image { .. }
                | Node::Html(_)
        )
    }

    /// Concatenated text content, used for image alt text.
    pub fn plain_text(nodes: &[Node]) -> String {
        let mut out = String::new();
        for node in nodes {
            match node {
                Node::Text(text) | Node::InlineCode(text) => out.push_str(text),
                Node::Break => out.push('\n'),
                other => out.push_str(&Node::plain_text(other.children())),
            }
        }
        out
    }
}

/// "Required first characters" hint: the characters a rule's match can
/// start with. Engine defaults ship it keyed; compilation wants it ordered.
#[derive(Debug, Clone, PartialEq)]
pub enum FirstChars {
    Keyed(BTreeMap<String, char>),
    Ordered(Vec<char>),
}

impl FirstChars {
    pub fn keyed(entries: &[(&str, char)]) -> Self {
        FirstChars::Keyed(entries.iter().map(|(k, c)| (k.to_string(), *c)).collect())
    }

    /// Values of a keyed index in key order; ordered input is unchanged.
    pub fn into_ordered(self) -> Self {
        match self {
            FirstChars::Keyed(map) => FirstChars::Ordered(map.into_values().collect()),
            ordered => ordered,
        }
    }

    #[cfg(test)]
    pub fn as_ordered(&self) -> Option<&[char]> {
        match self {
            FirstChars::Ordered(chars) => Some(chars),
            FirstChars::Keyed(_) => None,
        }
    }
}

pub type OutputFn = Arc<dyn Fn(&Node, &Output<'_>) -> Element + Send + Sync>;

/// Text matcher for rules the block parser does not know about. Gets the
/// remaining text at a candidate position and returns the bytes consumed
/// plus the node to emit.
pub type ScanFn = Arc<dyn Fn(&str) -> Option<(usize, Node)> + Send + Sync>;

#[derive(Clone)]
pub struct Rule {
    pub order: u32,
    pub required_first_chars: Option<FirstChars>,
    pub scan: Option<ScanFn>,
    /// `None` for rules whose matches render through another rule.
    pub output: Option<OutputFn>,
}

impl Rule {
    fn rendered(order: u32, first: Option<FirstChars>, output: OutputFn) -> Self {
        Self {
            order,
            required_first_chars: first,
            scan: None,
            output: Some(output),
        }
    }
}

#[derive(Clone, Default)]
pub struct RuleTable {
    rules: BTreeMap<String, Rule>,
}

impl RuleTable {
    pub fn insert(&mut self, name: &str, rule: Rule) {
        self.rules.insert(name.to_string(), rule);
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Rule> {
        self.rules.get_mut(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.rules.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    pub fn rules_mut(&mut self) -> impl Iterator<Item = &mut Rule> {
        self.rules.values_mut()
    }
}

/// Renders nodes by looking up each node's rule.
pub struct Output<'a> {
    rules: &'a RuleTable,
}

impl<'a> Output<'a> {
    pub fn new(rules: &'a RuleTable) -> Self {
        Self { rules }
    }

    pub fn node(&self, node: &Node) -> Element {
        match self.rules.get(node.rule_name()).and_then(|rule| rule.output.as_ref()) {
            Some(output) => output(node, self),
            None => Element::tag("span").with_children(self.nodes(node.children())),
        }
    }

    pub fn nodes(&self, nodes: &[Node]) -> Vec<Element> {
        nodes.iter().map(|node| self.node(node)).collect()
    }
}

/// Drop link targets that would run code when followed.
pub fn sanitize_url(url: &str) -> Option<String> {
    let scheme: String = url
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ':' || *c == '/')
        .collect::<String>()
        .to_ascii_lowercase();

    if ["javascript:", "vbscript:", "data:"]
        .iter()
        .any(|blocked| scheme.starts_with(blocked))
    {
        return None;
    }
    Some(url.to_string())
}

static BARE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^https?://[^\s<]+[^<.,:;"')\]\s]"#).expect("valid url regex"));

fn scan_bare_url(text: &str) -> Option<(usize, Node)> {
    let found = BARE_URL.find(text)?;
    let mut end = found.end();
    // A trailing ")" belongs to the URL when it closes a "(" inside it.
    while text[end..].starts_with(')')
        && text[..end].matches('(').count() > text[..end].matches(')').count()
    {
        end += 1;
    }
    let url = text[..end].to_string();
    Some((
        end,
        Node::Link {
            target: url.clone(),
            title: None,
            children: vec![Node::Text(url)],
        },
    ))
}

fn wrap(tag: &'static str) -> OutputFn {
    Arc::new(move |node: &Node, output: &Output<'_>| {
        Element::tag(tag).with_children(output.nodes(node.children()))
    })
}

/// The engine's stock rule table.
pub fn default_rules() -> RuleTable {
    let mut table = RuleTable::default();

    table.insert(
        "heading",
        Rule::rendered(
            0,
            Some(FirstChars::keyed(&[("atx", '#')])),
            Arc::new(|node: &Node, output: &Output<'_>| {
                let level = match node {
                    Node::Heading { level, .. } => (*level).clamp(1, 6),
                    _ => 1,
                };
                Element::tag(format!("h{}", level)).with_children(output.nodes(node.children()))
            }),
        ),
    );
    table.insert(
        "codeBlock",
        Rule::rendered(
            1,
            Some(FirstChars::keyed(&[("backtick", '`'), ("tilde", '~')])),
            Arc::new(|node: &Node, _: &Output<'_>| {
                let (lang, code) = match node {
                    Node::CodeBlock { lang, code } => (lang.as_deref(), code.as_str()),
                    _ => (None, ""),
                };
                let mut inner = Element::tag("code");
                if let Some(lang) = lang {
                    inner = inner.with_prop("className", format!("language-{}", lang));
                }
                Element::tag("pre").with_children(vec![inner.with_children(vec![Element::text(code)])])
            }),
        ),
    );
    table.insert(
        "blockQuote",
        Rule::rendered(2, Some(FirstChars::keyed(&[("gt", '>')])), wrap("blockquote")),
    );
    table.insert(
        "list",
        Rule::rendered(
            3,
            None,
            Arc::new(|node: &Node, output: &Output<'_>| {
                let Node::List { start, items } = node else {
                    return Element::tag("ul");
                };
                let list = match start {
                    Some(1) => Element::tag("ol"),
                    Some(n) => Element::tag("ol").with_prop("start", n.to_string()),
                    None => Element::tag("ul"),
                };
                list.with_children(
                    items
                        .iter()
                        .map(|item| Element::tag("li").with_children(output.nodes(item)))
                        .collect(),
                )
            }),
        ),
    );
    table.insert(
        "hr",
        Rule::rendered(4, None, Arc::new(|_: &Node, _: &Output<'_>| Element::tag("hr"))),
    );
    table.insert("paragraph", Rule::rendered(5, None, wrap("p")));
    table.insert(
        "image",
        Rule::rendered(
            10,
            Some(FirstChars::keyed(&[("bang", '!')])),
            Arc::new(|node: &Node, _: &Output<'_>| {
                let Node::Image { target, title, alt } = node else {
                    return Element::tag("img");
                };
                let mut img = Element::tag("img").with_prop("alt", alt.as_str());
                if let Some(src) = sanitize_url(target) {
                    img = img.with_prop("src", src);
                }
                if let Some(title) = title {
                    img = img.with_prop("title", title.as_str());
                }
                img
            }),
        ),
    );
    table.insert(
        "link",
        Rule::rendered(
            11,
            Some(FirstChars::keyed(&[("angle", '<'), ("bracket", '[')])),
            Arc::new(|node: &Node, output: &Output<'_>| {
                let Node::Link { target, title, children } = node else {
                    return Element::tag("a");
                };
                let mut anchor = Element::tag("a");
                if let Some(href) = sanitize_url(target) {
                    anchor = anchor.with_prop("href", href);
                }
                if let Some(title) = title {
                    anchor = anchor.with_prop("title", title.as_str());
                }
                anchor.with_children(output.nodes(children))
            }),
        ),
    );
    table.insert(
        "url",
        Rule {
            order: 12,
            required_first_chars: Some(FirstChars::keyed(&[("http", 'h')])),
            scan: Some(Arc::new(scan_bare_url)),
            output: None,
        },
    );
    table.insert(
        "strong",
        Rule::rendered(
            13,
            Some(FirstChars::keyed(&[("star", '*'), ("underscore", '_')])),
            wrap("strong"),
        ),
    );
    table.insert(
        "em",
        Rule::rendered(
            14,
            Some(FirstChars::keyed(&[("star", '*'), ("underscore", '_')])),
            wrap("em"),
        ),
    );
    table.insert(
        "del",
        Rule::rendered(15, Some(FirstChars::keyed(&[("tilde", '~')])), wrap("del")),
    );
    table.insert(
        "inlineCode",
        Rule::rendered(
            16,
            Some(FirstChars::keyed(&[("backtick", '`')])),
            Arc::new(|node: &Node, _: &Output<'_>| {
                let code = match node {
                    Node::InlineCode(code) => code.as_str(),
                    _ => "",
                };
                Element::tag("code").with_children(vec![Element::text(code)])
            }),
        ),
    );
    table.insert(
        "br",
        Rule::rendered(17, None, Arc::new(|_: &Node, _: &Output<'_>| Element::tag("br"))),
    );
    // Raw HTML is shown, never interpreted.
    table.insert(
        "html",
        Rule::rendered(
            18,
            Some(FirstChars::keyed(&[("angle", '<')])),
            Arc::new(|node: &Node, _: &Output<'_>| match node {
                Node::Html(raw) => Element::text(raw.as_str()),
                _ => Element::text(""),
            }),
        ),
    );
    table.insert(
        "text",
        Rule::rendered(
            19,
            None,
            Arc::new(|node: &Node, _: &Output<'_>| match node {
                Node::Text(text) => Element::text(text.as_str()),
                _ => Element::text(""),
            }),
        ),
    );

    table
}
