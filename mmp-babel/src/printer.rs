//! Dual-mode printer
//!
//!     Renders a normalized [`Manifest`] either as TOML or back in the legacy dialect. Dispatch
//!     is on the node tag; tags without a rendering of their own concatenate their children.
//!
//!     TOML mode:
//!
//!         - Table headers whose key is not a bare key get a quoted basic-string key.
//!         - Implicit arrays get brackets and commas. A single-line array renders as
//!           `[a, b]`; a multi-line one puts every element on a line of its own, indented as in
//!           the source, each followed by a comma.
//!         - An expression that is a single atom renders as that atom, with bare words quoted.
//!           Anything else is a condition and becomes one basic string.
//!         - A key without a value gets an empty string.
//!
//!     Legacy mode keeps the source layout: values are written bare, arrays have no brackets
//!     or commas, and strings keep their quotes only inside conditions.
//!
//!     String lexemes are quoted according to their tag (basic, literal, multi-line), never
//!     according to their content. Line endings follow the manifest's own style.

use crate::error::FormatError;
use mmp_parser::mmp::grammar::Rule;
use mmp_parser::mmp::ir::{Lexeme, Manifest, Node, SyntaxNode};

/// Multi-line arrays whose source lines carry no indentation use this.
const DEFAULT_INDENT: &str = "  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderMode {
    #[default]
    Toml,
    Legacy,
}

impl RenderMode {
    pub fn name(self) -> &'static str {
        match self {
            RenderMode::Toml => "toml",
            RenderMode::Legacy => "ini",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub mode: RenderMode,
    /// Refuse to render a manifest that was not legal TOML
    pub strict_legality: bool,
    /// Parenthesize every compound condition (for inspecting precedence)
    pub debug_parenthesize: bool,
    /// Render an implicit OR as ` ||` instead of nothing
    pub explicit_or: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            mode: RenderMode::Toml,
            strict_legality: false,
            debug_parenthesize: false,
            explicit_or: true,
        }
    }
}

impl RenderOptions {
    pub fn toml() -> Self {
        Self::default()
    }

    /// Legacy output keeps implicit ORs implicit.
    pub fn legacy() -> Self {
        RenderOptions {
            mode: RenderMode::Legacy,
            explicit_or: false,
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_strict_legality(mut self, strict: bool) -> Self {
        self.strict_legality = strict;
        self
    }

    pub fn with_debug_parenthesize(mut self, debug: bool) -> Self {
        self.debug_parenthesize = debug;
        self
    }

    pub fn with_explicit_or(mut self, explicit: bool) -> Self {
        self.explicit_or = explicit;
        self
    }
}

pub struct Printer {
    options: RenderOptions,
}

impl Printer {
    pub fn new(options: RenderOptions) -> Self {
        Printer { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render the whole manifest. Output is composed in memory; nothing is returned on error.
    pub fn render(&self, manifest: &Manifest) -> Result<String, FormatError> {
        if self.options.strict_legality && !manifest.is_legal() {
            return Err(FormatError::LegalityViolation {
                format: self.options.mode.name().to_string(),
            });
        }
        let mut renderer = Renderer {
            options: &self.options,
            newline: manifest.newline(),
            out: String::new(),
        };
        renderer.syntax(manifest.root());
        tracing::debug!(
            mode = self.options.mode.name(),
            legal = manifest.is_legal(),
            bytes = renderer.out.len(),
            "rendered manifest"
        );
        Ok(renderer.out)
    }
}

struct Renderer<'a> {
    options: &'a RenderOptions,
    newline: &'a str,
    out: String,
}

impl Renderer<'_> {
    fn toml(&self) -> bool {
        self.options.mode == RenderMode::Toml
    }

    // Lines

    fn node(&mut self, node: &Node) {
        match node {
            Node::Lexeme(lexeme) => self.out.push_str(lexeme.text()),
            Node::Syntax(syntax) => self.syntax(syntax),
        }
    }

    fn syntax(&mut self, node: &SyntaxNode) {
        match node.tag() {
            Rule::Table => self.table(node),
            Rule::KeyValue => self.key_value(node),
            Rule::Expression | Rule::Array | Rule::ImplicitArray => {
                let text = self.value(node);
                self.out.push_str(&text);
            }
            _ => {
                for child in node.children() {
                    self.node(child);
                }
            }
        }
    }

    fn table(&mut self, node: &SyntaxNode) {
        self.out.push('[');
        if let Some(key) = node.table_key() {
            let key = self.key(key);
            self.out.push_str(&key);
        }
        self.out.push(']');
        for child in node.children() {
            self.node(child);
        }
    }

    fn key(&self, key: &Lexeme) -> String {
        match key.tag() {
            Rule::LegacyKey if self.toml() => basic_string(key.text()),
            Rule::BasicString | Rule::LiteralString if self.toml() => quote(key),
            _ => key.text().to_string(),
        }
    }

    fn key_value(&mut self, node: &SyntaxNode) {
        let children = node.children();
        let value_at = children.iter().position(|c| is_value(c.tag()));
        let equals_at = children.iter().position(|c| c.tag() == Rule::Equals);
        let before_value = |index: usize| match (equals_at, value_at) {
            (Some(equals), Some(value)) => equals < index && index < value,
            _ => false,
        };

        for (index, child) in children.iter().enumerate() {
            match child {
                Node::Lexeme(key) if index == 0 && is_key(key.tag()) => {
                    let key = self.key(key);
                    self.out.push_str(&key);
                }
                Node::Lexeme(equals) if Some(index) == equals_at => {
                    self.out.push_str(equals.text());
                    if self.toml() {
                        self.out
                            .push_str(if value_at.is_some() { " " } else { " \"\"" });
                    }
                }
                Node::Lexeme(ws)
                    if self.toml() && ws.tag() == Rule::Whitespace && before_value(index) => {}
                Node::Syntax(value) if Some(index) == value_at => {
                    let text = self.value(value);
                    if value.tag() == Rule::Array && text.starts_with(['\r', '\n']) {
                        let kept = self.out.trim_end_matches([' ', '\t']).len();
                        self.out.truncate(kept);
                    }
                    self.out.push_str(&text);
                }
                other => self.node(other),
            }
        }
    }

    // Values

    fn value(&self, node: &SyntaxNode) -> String {
        match node.tag() {
            Rule::Expression => self.expression(node),
            Rule::ImplicitArray => self.implicit_array(node),
            Rule::Array => self.array(node),
            _ => self.condition(&Node::Syntax(node.clone()), 0),
        }
    }

    fn expression(&self, node: &SyntaxNode) -> String {
        let (mut body, trailing) = self.expression_parts(node);
        body.push_str(&trailing);
        body
    }

    /// The rendered expression and, apart, its trailing comment with the whitespace before it.
    fn expression_parts(&self, node: &SyntaxNode) -> (String, String) {
        let (body, trailing) = split_trailing_comment(node.children());
        let significant: Vec<&Node> = body.iter().filter(|c| !c.is_layout()).collect();
        let rendered = match significant.as_slice() {
            [Node::Lexeme(atom)] => self.atom(atom),
            _ => {
                let condition: String = body.iter().map(|c| self.condition(c, 1)).collect();
                if self.toml() {
                    basic_string(condition.trim())
                } else {
                    condition
                }
            }
        };
        let trailing = trailing
            .iter()
            .filter_map(Node::as_lexeme)
            .map(Lexeme::text)
            .collect();
        (rendered, trailing)
    }

    fn atom(&self, lexeme: &Lexeme) -> String {
        let tag = lexeme.tag();
        if tag.is_string() {
            return match tag {
                _ if self.toml() => quote(lexeme),
                Rule::BasicString | Rule::MlBasicString => unescape(lexeme.text()),
                _ => lexeme.text().to_string(),
            };
        }
        match tag {
            Rule::Identifier | Rule::Unquoted | Rule::UnquotedString if self.toml() => {
                basic_string(lexeme.text())
            }
            _ => lexeme.text().to_string(),
        }
    }

    /// Condition text as the legacy dialect writes it.
    fn condition(&self, node: &Node, depth: usize) -> String {
        match node {
            Node::Lexeme(lexeme) => match lexeme.tag() {
                Rule::Comment => String::new(),
                Rule::Newline if self.toml() => String::new(),
                Rule::Indent if self.toml() => " ".to_string(),
                Rule::ImplicitOr if self.options.explicit_or => " ||".to_string(),
                Rule::ImplicitOr => String::new(),
                tag if tag.is_string() => quote(lexeme),
                _ => lexeme.text().to_string(),
            },
            Node::Syntax(inner) => {
                let text: String = inner
                    .children()
                    .iter()
                    .map(|c| self.condition(c, depth + 1))
                    .collect();
                if self.options.debug_parenthesize
                    && depth > 0
                    && inner.significant_children().count() > 1
                {
                    format!("({text})")
                } else {
                    text
                }
            }
        }
    }

    fn implicit_array(&self, node: &SyntaxNode) -> String {
        if !self.toml() {
            return node
                .children()
                .iter()
                .map(|child| match child {
                    Node::Lexeme(lexeme) => lexeme.text().to_string(),
                    Node::Syntax(element) => self.value(element),
                })
                .collect();
        }

        let lines = array_lines(node.children());
        if lines.len() <= 1 {
            let mut elements = Vec::new();
            let mut comments = String::new();
            for line in &lines {
                for element in &line.elements {
                    let (body, trailing) = self.expression_parts(element);
                    elements.push(body);
                    comments.push_str(&trailing);
                }
                for comment in &line.comments {
                    comments.push(' ');
                    comments.push_str(comment);
                }
            }
            return format!("[{}]{}", elements.join(", "), comments);
        }

        let mut out = String::from("[");
        for (index, line) in lines.iter().enumerate() {
            let indent = line.indent.unwrap_or(DEFAULT_INDENT);
            for element in &line.elements {
                let (body, trailing) = self.expression_parts(element);
                out.push_str(self.newline);
                out.push_str(indent);
                out.push_str(&body);
                out.push(',');
                out.push_str(&trailing);
            }
            for comment in &line.comments {
                if index > 0 && line.elements.is_empty() {
                    out.push_str(self.newline);
                    out.push_str(indent);
                } else {
                    out.push(' ');
                }
                out.push_str(comment);
            }
        }
        out.push_str(self.newline);
        out.push(']');
        out
    }

    fn array(&self, node: &SyntaxNode) -> String {
        if self.toml() {
            return node
                .children()
                .iter()
                .map(|child| match child {
                    Node::Lexeme(lexeme) => lexeme.text().to_string(),
                    Node::Syntax(element) => self.value(element),
                })
                .collect();
        }

        // Legacy: one source line per line, no brackets or commas
        let mut lines: Vec<(Vec<String>, Vec<&str>)> = vec![(Vec::new(), Vec::new())];
        for child in node.children() {
            match child {
                Node::Lexeme(lexeme) => match lexeme.tag() {
                    Rule::Newline => lines.push((Vec::new(), Vec::new())),
                    Rule::Comment => {
                        if let Some(line) = lines.last_mut() {
                            line.1.push(lexeme.text());
                        }
                    }
                    _ => {}
                },
                Node::Syntax(element) => {
                    let text = self.value(element);
                    if let Some(line) = lines.last_mut() {
                        line.0.push(text);
                    }
                }
            }
        }
        lines.retain(|(elements, comments)| !elements.is_empty() || !comments.is_empty());

        let render_line = |(elements, comments): &(Vec<String>, Vec<&str>)| {
            let mut parts = elements.clone();
            parts.extend(comments.iter().map(|c| c.to_string()));
            parts.join(" ")
        };
        if lines.len() <= 1 {
            return lines.first().map(render_line).unwrap_or_default();
        }
        let mut out = String::new();
        for line in &lines {
            out.push_str(self.newline);
            out.push_str(DEFAULT_INDENT);
            out.push_str(&render_line(line));
        }
        out
    }
}

/// One source line of an implicit array.
#[derive(Default)]
struct ArrayLine<'a> {
    indent: Option<&'a str>,
    elements: Vec<&'a SyntaxNode>,
    comments: Vec<&'a str>,
}

impl ArrayLine<'_> {
    fn is_empty(&self) -> bool {
        self.indent.is_none() && self.elements.is_empty() && self.comments.is_empty()
    }
}

fn array_lines(children: &[Node]) -> Vec<ArrayLine<'_>> {
    let mut lines = Vec::new();
    let mut current = ArrayLine::default();
    for child in children {
        match child {
            Node::Lexeme(lexeme) => match lexeme.tag() {
                Rule::Newline => lines.push(std::mem::take(&mut current)),
                Rule::Indent if !lexeme.is_empty() => current.indent = Some(lexeme.text()),
                Rule::Comment => current.comments.push(lexeme.text()),
                _ => {}
            },
            Node::Syntax(element) => current.elements.push(element),
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Split `children` before the first comment, taking the whitespace in front of it along.
fn split_trailing_comment(children: &[Node]) -> (&[Node], &[Node]) {
    let Some(at) = children.iter().position(Node::is_comment) else {
        return (children, &[]);
    };
    let start = match at.checked_sub(1) {
        Some(before) if children[before].tag() == Rule::Whitespace => before,
        _ => at,
    };
    children.split_at(start)
}

fn is_value(tag: Rule) -> bool {
    matches!(tag, Rule::Expression | Rule::Array | Rule::ImplicitArray)
}

fn is_key(tag: Rule) -> bool {
    matches!(tag, Rule::BareKey | Rule::BasicString | Rule::LiteralString)
}

/// A string lexeme between the quotes its tag calls for.
fn quote(lexeme: &Lexeme) -> String {
    let text = lexeme.text();
    match lexeme.tag() {
        Rule::BasicString => format!("\"{text}\""),
        Rule::LiteralString => format!("'{text}'"),
        Rule::MlBasicString => format!("\"\"\"{text}\"\"\""),
        Rule::MlLiteralString => format!("'''{text}'''"),
        _ => text.to_string(),
    }
}

/// `text` as a TOML basic string.
pub fn basic_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// The characters a basic string's escapes stand for.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('e') => out.push('\u{1b}'),
            Some(kind @ ('u' | 'U')) => {
                let width = if kind == 'u' { 4 } else { 8 };
                let hex: String = chars.by_ref().take(width).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('\\');
                        out.push(kind);
                        out.push_str(&hex);
                    }
                }
            }
            // Line-ending backslash in a multi-line string
            Some(' ' | '\t' | '\r' | '\n') => {
                while matches!(chars.peek(), Some(' ' | '\t' | '\r' | '\n')) {
                    chars.next();
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
