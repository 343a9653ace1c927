//! Compiles a rule table into a parse function and a render function.
//!
//! Block and inline structure come from pulldown-cmark; rules that carry a
//! `scan` function (bare URLs) run afterwards over plain text, tried only at
//! positions whose character appears in their required first characters.

use super::element::Element;
use super::rules::{default_rules, FirstChars, Node, Output, RuleTable, ScanFn};
use crate::error::{BridgeError, BridgeResult};
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Inline mode flattens block structure into a single run.
    pub inline: bool,
}

pub type ParseFn = Box<dyn Fn(&str, ParseOptions) -> Vec<Node> + Send + Sync>;
pub type RenderFn = Box<dyn Fn(&[Node]) -> Vec<Element> + Send + Sync>;

pub struct Compiled {
    parse: ParseFn,
    render: RenderFn,
}

impl Compiled {
    pub fn new(parse: ParseFn, render: RenderFn) -> Self {
        Self { parse, render }
    }

    pub fn parse(&self, text: &str, options: ParseOptions) -> Vec<Node> {
        (self.parse)(text, options)
    }

    pub fn render(&self, nodes: &[Node]) -> Vec<Element> {
        (self.render)(nodes)
    }
}

/// The markdown engine seen from the patcher: a stock rule table plus a
/// compilation step.
pub trait RuleCompiler: Send + Sync {
    fn default_rules(&self) -> RuleTable;
    fn compile(&self, table: &RuleTable) -> BridgeResult<Compiled>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CmarkCompiler;

impl RuleCompiler for CmarkCompiler {
    fn default_rules(&self) -> RuleTable {
        default_rules()
    }

    fn compile(&self, table: &RuleTable) -> BridgeResult<Compiled> {
        let mut scanners = Vec::new();
        for (name, rule) in table.iter() {
            let first = match &rule.required_first_chars {
                Some(FirstChars::Keyed(_)) => {
                    return Err(BridgeError::UnorderedFirstChars(name.to_string()));
                }
                Some(FirstChars::Ordered(chars)) => Some(chars.clone()),
                None => None,
            };
            if let Some(scan) = &rule.scan {
                scanners.push(Scanner {
                    order: rule.order,
                    first,
                    scan: scan.clone(),
                });
            }
        }
        scanners.sort_by_key(|scanner| scanner.order);

        let rules = table.clone();
        Ok(Compiled::new(
            Box::new(move |text, options| parse_document(text, options, &scanners)),
            Box::new(move |nodes| Output::new(&rules).nodes(nodes)),
        ))
    }
}

struct Scanner {
    order: u32,
    first: Option<Vec<char>>,
    scan: ScanFn,
}

impl Scanner {
    fn accepts(&self, ch: char) -> bool {
        self.first.as_ref().is_none_or(|chars| chars.contains(&ch))
    }
}

fn parse_document(text: &str, options: ParseOptions, scanners: &[Scanner]) -> Vec<Node> {
    let blocks = apply_scanners(parse_blocks(text), scanners);
    if options.inline {
        inline_only(blocks)
    } else {
        blocks
    }
}

enum Frame {
    Root,
    Paragraph,
    Heading(u8),
    BlockQuote,
    CodeBlock(Option<String>),
    List(Option<u64>),
    Item,
    Em,
    Strong,
    Del,
    Link { target: String, title: Option<String> },
    Image { target: String, title: Option<String> },
    /// Structure we do not model (tables, footnotes, HTML blocks): children
    /// are spliced into the parent.
    Passthrough,
}

impl Frame {
    fn from_tag(tag: Tag<'_>) -> Self {
        match tag {
            Tag::Paragraph => Frame::Paragraph,
            Tag::Heading { level, .. } => Frame::Heading(level as u8),
            Tag::BlockQuote(_) => Frame::BlockQuote,
            Tag::CodeBlock(CodeBlockKind::Fenced(info)) => {
                Frame::CodeBlock(info.split_whitespace().next().map(str::to_string))
            }
            Tag::CodeBlock(CodeBlockKind::Indented) => Frame::CodeBlock(None),
            Tag::List(start) => Frame::List(start),
            Tag::Item => Frame::Item,
            Tag::Emphasis => Frame::Em,
            Tag::Strong => Frame::Strong,
            Tag::Strikethrough => Frame::Del,
            Tag::Link { dest_url, title, .. } => Frame::Link {
                target: dest_url.to_string(),
                title: non_empty(&title),
            },
            Tag::Image { dest_url, title, .. } => Frame::Image {
                target: dest_url.to_string(),
                title: non_empty(&title),
            },
            _ => Frame::Passthrough,
        }
    }
}

fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}

struct Level {
    frame: Frame,
    children: Vec<Node>,
    items: Vec<Vec<Node>>,
}

impl Level {
    fn new(frame: Frame) -> Self {
        Self {
            frame,
            children: Vec::new(),
            items: Vec::new(),
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(Node::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(Node::Text(text.to_string()));
        }
    }
}

fn parse_blocks(text: &str) -> Vec<Node> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut stack = vec![Level::new(Frame::Root)];
    for event in Parser::new_ext(text, options) {
        match event {
            Event::Start(tag) => stack.push(Level::new(Frame::from_tag(tag))),
            Event::End(_) => {
                if stack.len() > 1 {
                    if let Some(level) = stack.pop() {
                        close_level(level, &mut stack);
                    }
                }
            }
            Event::Text(text) => top(&mut stack).push_text(&text),
            Event::Code(code) => top(&mut stack).children.push(Node::InlineCode(code.to_string())),
            Event::Html(html) | Event::InlineHtml(html) => {
                top(&mut stack).children.push(Node::Html(html.to_string()))
            }
            Event::SoftBreak => top(&mut stack).push_text("\n"),
            Event::HardBreak => top(&mut stack).children.push(Node::Break),
            Event::Rule => top(&mut stack).children.push(Node::ThematicBreak),
            Event::TaskListMarker(done) => top(&mut stack).push_text(if done { "[x] " } else { "[ ] " }),
            Event::FootnoteReference(label) => top(&mut stack).push_text(&format!("[^{}]", label)),
            Event::InlineMath(math) | Event::DisplayMath(math) => top(&mut stack).push_text(&math),
        }
    }

    // Unbalanced input cannot happen with pulldown-cmark, but fold anything
    // left open rather than lose it.
    while stack.len() > 1 {
        if let Some(level) = stack.pop() {
            close_level(level, &mut stack);
        }
    }
    stack.pop().map(|root| root.children).unwrap_or_default()
}

fn top(stack: &mut [Level]) -> &mut Level {
    // The root level is never popped while events are flowing.
    let last = stack.len() - 1;
    &mut stack[last]
}

fn close_level(level: Level, stack: &mut Vec<Level>) {
    let Level { frame, children, items } = level;
    let parent = top(stack);

    let node = match frame {
        Frame::Item => {
            parent.items.push(children);
            return;
        }
        Frame::Passthrough | Frame::Root => {
            for child in children {
                match child {
                    Node::Text(text) => parent.push_text(&text),
                    other => parent.children.push(other),
                }
            }
            return;
        }
        Frame::Paragraph => Node::Paragraph(children),
        Frame::Heading(level) => Node::Heading { level, children },
        Frame::BlockQuote => Node::BlockQuote(children),
        Frame::CodeBlock(lang) => Node::CodeBlock {
            lang,
            code: Node::plain_text(&children),
        },
        Frame::List(start) => Node::List { start, items },
        Frame::Em => Node::Em(children),
        Frame::Strong => Node::Strong(children),
        Frame::Del => Node::Del(children),
        Frame::Link { target, title } => Node::Link {
            target,
            title,
            children,
        },
        Frame::Image { target, title } => Node::Image {
            target,
            title,
            alt: Node::plain_text(&children),
        },
    };
    parent.children.push(node);
}

fn apply_scanners(nodes: Vec<Node>, scanners: &[Scanner]) -> Vec<Node> {
    if scanners.is_empty() {
        return nodes;
    }

    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Text(text) => out.extend(scan_text(&text, scanners)),
            Node::Paragraph(children) => out.push(Node::Paragraph(apply_scanners(children, scanners))),
            Node::Heading { level, children } => out.push(Node::Heading {
                level,
                children: apply_scanners(children, scanners),
            }),
            Node::BlockQuote(children) => out.push(Node::BlockQuote(apply_scanners(children, scanners))),
            Node::List { start, items } => out.push(Node::List {
                start,
                items: items
                    .into_iter()
                    .map(|item| apply_scanners(item, scanners))
                    .collect(),
            }),
            Node::Em(children) => out.push(Node::Em(apply_scanners(children, scanners))),
            Node::Strong(children) => out.push(Node::Strong(apply_scanners(children, scanners))),
            Node::Del(children) => out.push(Node::Del(apply_scanners(children, scanners))),
            // Links, code and raw HTML keep their text verbatim.
            other => out.push(other),
        }
    }
    out
}

fn scan_text(text: &str, scanners: &[Scanner]) -> Vec<Node> {
    let mut out = Vec::new();
    let mut plain_start = 0;
    let mut pos = 0;

    while let Some(ch) = text[pos..].chars().next() {
        let matched = scanners
            .iter()
            .filter(|scanner| scanner.accepts(ch))
            .find_map(|scanner| (scanner.scan)(&text[pos..]))
            .filter(|(len, _)| *len > 0);

        match matched {
            Some((len, node)) => {
                if plain_start < pos {
                    out.push(Node::Text(text[plain_start..pos].to_string()));
                }
                out.push(node);
                pos += len;
                plain_start = pos;
            }
            None => pos += ch.len_utf8(),
        }
    }

    if plain_start < text.len() {
        out.push(Node::Text(text[plain_start..].to_string()));
    }
    out
}

/// Reduce a block tree to inline content, separating blocks with breaks.
fn inline_only(nodes: Vec<Node>) -> Vec<Node> {
    let mut segments: Vec<Vec<Node>> = Vec::new();
    let mut run: Vec<Node> = Vec::new();

    for node in nodes {
        if node.is_inline() {
            run.push(node);
            continue;
        }
        if !run.is_empty() {
            segments.push(std::mem::take(&mut run));
        }

        let segment = match node {
            Node::Paragraph(children) | Node::Heading { children, .. } => children,
            Node::BlockQuote(children) => inline_only(children),
            Node::List { items, .. } => join_segments(items.into_iter().map(inline_only).collect()),
            Node::CodeBlock { code, .. } => vec![Node::InlineCode(code.trim_end_matches('\n').to_string())],
            _ => Vec::new(),
        };
        if !segment.is_empty() {
            segments.push(segment);
        }
    }

    if !run.is_empty() {
        segments.push(run);
    }
    join_segments(segments)
}

fn join_segments(segments: Vec<Vec<Node>>) -> Vec<Node> {
    let mut out = Vec::new();
    for (index, segment) in segments.into_iter().enumerate() {
        if index > 0 {
            out.push(Node::Break);
        }
        out.extend(segment);
    }
    out
}
