//! Normalization
//!
//!     Legacy manifests write lists as runs of words (`tags = a b`) or as one entry per
//!     continuation line, the same syntax the condition language uses for an implicit OR.
//!     Normalization decides, key by key, what a value really is:
//!
//!         - conditional key: one condition per source line, kept as written
//!           ([`Shape::PerLine`])
//!         - always-array key, or two or more terms: an array with one element per term
//!           ([`Shape::Promoted`])
//!         - unquoted-string key whose terms are all plain words: one string
//!           ([`Shape::Collapsed`])
//!         - otherwise the single term ([`Shape::Scalar`])
//!
//!     Explicit arrays are never touched. A single-line value made of one literal (a quoted
//!     string, a number, a boolean or a date) is kept as written, except under an always-array
//!     key, where it is promoted, and under a conditional key, where only a boolean stays.
//!
//!     Trailing comments are hoisted out of the expressions before terms are split, and put
//!     back on the first element of the line they came from, so they never end up inside a
//!     rendered string. When the value becomes a single scalar, the comments of every line,
//!     comment-only continuation lines included, follow the scalar.
//!
//!     The result of a key value depends on nothing but its key and its terms.

use crate::mmp::classification::{KeyClass, KeyClassification};
use crate::mmp::grammar::Rule;
use crate::mmp::ir::{Lexeme, Manifest, Node, SyntaxNode};
use crate::mmp::reduction::{Legality, Reduced};
use std::sync::Arc;

/// The shape normalization gave a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Unchanged,
    PerLine,
    Promoted,
    Collapsed,
    Scalar,
}

pub struct Normalizer {
    classification: Arc<KeyClassification>,
}

impl Normalizer {
    pub fn new(classification: Arc<KeyClassification>) -> Self {
        Normalizer { classification }
    }

    /// Normalize every key value of a reduced tree and settle the legality verdict.
    pub fn normalize(&self, reduced: Reduced<SyntaxNode>) -> Manifest {
        let Reduced { value: root, legality } = reduced;
        if root.tag() == Rule::KeyValue {
            let (node, _, verdict) = self.normalize_key_value(&root);
            return Manifest::new(node, (legality & verdict).is_legal());
        }

        let tag = root.tag();
        let mut legality = legality;
        let mut children = Vec::with_capacity(root.children().len());
        for child in root.into_children() {
            match child {
                Node::Syntax(key_value) if key_value.tag() == Rule::KeyValue => {
                    let (node, _, verdict) = self.normalize_key_value(&key_value);
                    legality = legality & verdict;
                    children.push(Node::Syntax(node));
                }
                other => children.push(other),
            }
        }
        tracing::debug!(legal = legality.is_legal(), "normalized manifest");
        Manifest::new(SyntaxNode::new(tag, children), legality.is_legal())
    }

    /// Normalize one key value. Returns the new node, the shape its value took, and the
    /// legality verdict of the normalization itself.
    pub fn normalize_key_value(&self, key_value: &SyntaxNode) -> (SyntaxNode, Shape, Legality) {
        let unchanged = || (key_value.clone(), Shape::Unchanged, Legality::LEGAL);

        let Some(key) = key_value
            .children()
            .first()
            .and_then(Node::as_lexeme)
            .filter(|k| matches!(k.tag(), Rule::BareKey | Rule::BasicString | Rule::LiteralString))
        else {
            return unchanged();
        };
        let Some(index) = key_value
            .children()
            .iter()
            .position(|c| matches!(c.tag(), Rule::Expression | Rule::ImplicitArray))
        else {
            return unchanged();
        };
        let Some(value) = key_value.children()[index].as_syntax() else {
            return unchanged();
        };

        let class = self.classification.classify(key.text());
        if let Some(literal) = toml_literal(value) {
            match class {
                KeyClass::Conditional if literal != Rule::Boolean => {}
                KeyClass::AlwaysArray => {}
                _ => return unchanged(),
            }
        }

        let lines = split_lines(value);
        let (replacement, shape, legality) = match class {
            KeyClass::Conditional => per_line(&lines),
            _ => flatten(class, &lines),
        };
        let Some(replacement) = replacement else {
            return unchanged();
        };
        tracing::trace!(key = key.text(), ?class, ?shape, "normalized value");

        let mut children = key_value.children().to_vec();
        let scalar = replacement.tag() == Rule::Expression;
        children[index] = replacement;
        if scalar && value.tag() == Rule::ImplicitArray && children[index - 1].tag() == Rule::Equals {
            children.insert(index, Node::lexeme(Rule::Whitespace, " "));
        }
        (
            SyntaxNode::new(key_value.tag(), children),
            shape,
            legality,
        )
    }
}

/// Pull every comment (and the whitespace right before it) out of a subtree.
///
/// Returns the cleaned subtree and the extracted lexemes in source order.
pub fn hoist_comments(node: &SyntaxNode) -> (SyntaxNode, Vec<Node>) {
    let mut cleaned: Vec<Node> = Vec::with_capacity(node.children().len());
    let mut comments = Vec::new();
    for child in node.children() {
        match child {
            Node::Lexeme(lexeme) if lexeme.tag() == Rule::Comment => {
                if cleaned.last().map(Node::tag) == Some(Rule::Whitespace) {
                    comments.extend(cleaned.pop());
                }
                comments.push(child.clone());
            }
            Node::Syntax(inner) => {
                let (inner, mut extracted) = hoist_comments(inner);
                cleaned.push(Node::Syntax(inner));
                comments.append(&mut extracted);
            }
            Node::Lexeme(_) => cleaned.push(child.clone()),
        }
    }
    (SyntaxNode::new(node.tag(), cleaned), comments)
}

/// The tag of a single-line value that is one TOML literal (string, number, boolean or date).
fn toml_literal(value: &SyntaxNode) -> Option<Rule> {
    if value.tag() != Rule::Expression {
        return None;
    }
    let (cleaned, _) = hoist_comments(value);
    let significant: Vec<&Node> = cleaned.significant_children().collect();
    match significant.as_slice() {
        [only] if only.tag().is_toml_literal() => Some(only.tag()),
        _ => None,
    }
}

/// A bare number, boolean or date standing as a whole condition is condition text, not a value.
fn as_condition_text(node: Node) -> Node {
    match node {
        Node::Lexeme(lexeme)
            if matches!(
                lexeme.tag(),
                Rule::Integer | Rule::Float | Rule::DateTime | Rule::Boolean
            ) =>
        {
            Node::lexeme(Rule::Unquoted, lexeme.text())
        }
        other => other,
    }
}

/// One source line of a value.
#[derive(Debug, Default)]
struct Line {
    indent: Option<Node>,
    expression: Option<SyntaxNode>,
    rest: Vec<Node>,
    newline: Option<Node>,
}

impl Line {
    fn is_empty(&self) -> bool {
        self.indent.is_none() && self.expression.is_none() && self.rest.is_empty()
    }
}

fn split_lines(value: &SyntaxNode) -> Vec<Line> {
    if value.tag() == Rule::Expression {
        return vec![Line {
            expression: Some(value.clone()),
            ..Line::default()
        }];
    }
    let mut lines = Vec::new();
    let mut current = Line::default();
    for child in value.children() {
        match child {
            Node::Lexeme(lexeme) if lexeme.tag() == Rule::Newline => {
                current.newline = Some(child.clone());
                lines.push(std::mem::take(&mut current));
            }
            Node::Lexeme(lexeme) if lexeme.tag() == Rule::Indent && current.is_empty() => {
                current.indent = Some(child.clone());
            }
            Node::Syntax(expression)
                if expression.tag() == Rule::Expression && current.expression.is_none() =>
            {
                current.expression = Some(expression.clone());
            }
            _ => current.rest.push(child.clone()),
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Conditional keys: one element per line, each the line's condition as written.
fn per_line(lines: &[Line]) -> (Option<Node>, Shape, Legality) {
    let mut children = Vec::new();
    for line in lines {
        children.extend(line.indent.clone());
        if let Some(expression) = &line.expression {
            let (cleaned, comments) = hoist_comments(expression);
            let mut element: Vec<Node> =
                cleaned.into_children().into_iter().map(as_condition_text).collect();
            element.extend(comments);
            children.push(Node::syntax(Rule::Expression, element));
        }
        children.extend(line.rest.iter().cloned());
        children.extend(line.newline.clone());
    }
    (
        Some(Node::syntax(Rule::ImplicitArray, children)),
        Shape::PerLine,
        Legality::ILLEGAL,
    )
}

/// A term of the flattened value: what precedes it on its line, and the term itself.
#[derive(Debug, Clone)]
struct Term {
    gap: String,
    node: Node,
}

impl Term {
    fn is_plain(&self) -> bool {
        matches!(&self.node, Node::Lexeme(lexeme) if lexeme.tag().is_plain())
    }

    /// The term as an array element: an expression node of its own.
    fn element(&self, comments: &[Node]) -> Node {
        let mut children = match &self.node {
            Node::Syntax(node) if node.tag() == Rule::Expression => node.children().to_vec(),
            other => vec![other.clone()],
        };
        children.extend(comments.iter().cloned());
        Node::syntax(Rule::Expression, children)
    }
}

/// Split an expression at its top-level implicit ORs.
fn split_terms(expression: &SyntaxNode) -> Vec<Term> {
    let children = expression.children();
    if children.get(1).map(Node::tag) == Some(Rule::ImplicitOr) {
        let mut terms = match &children[0] {
            Node::Syntax(lhs) if lhs.tag() == Rule::Expression => split_terms(lhs),
            lhs => vec![Term {
                gap: String::new(),
                node: lhs.clone(),
            }],
        };
        if let Some((rhs, between)) = children[2..].split_last() {
            let gap = between
                .iter()
                .filter_map(Node::as_lexeme)
                .map(Lexeme::text)
                .collect();
            terms.push(Term {
                gap,
                node: rhs.clone(),
            });
        }
        return terms;
    }

    let significant: Vec<&Node> = expression.significant_children().collect();
    let node = match significant.as_slice() {
        [only] => (*only).clone(),
        _ => Node::Syntax(expression.clone()),
    };
    vec![Term {
        gap: String::new(),
        node,
    }]
}

/// Every other key: flatten the terms of all lines and pick a shape.
fn flatten(class: KeyClass, lines: &[Line]) -> (Option<Node>, Shape, Legality) {
    let mut per_line_terms: Vec<Vec<Term>> = Vec::with_capacity(lines.len());
    let mut per_line_comments: Vec<Vec<Node>> = Vec::with_capacity(lines.len());
    for line in lines {
        match &line.expression {
            Some(expression) => {
                let (cleaned, comments) = hoist_comments(expression);
                per_line_terms.push(split_terms(&cleaned));
                per_line_comments.push(comments);
            }
            None => {
                per_line_terms.push(Vec::new());
                per_line_comments.push(Vec::new());
            }
        }
    }

    let count: usize = per_line_terms.iter().map(Vec::len).sum();
    if count == 0 {
        return (None, Shape::Unchanged, Legality::LEGAL);
    }
    let plain = per_line_terms.iter().flatten().all(Term::is_plain);
    let shape = match class {
        KeyClass::AlwaysArray => Shape::Promoted,
        KeyClass::UnquotedString if plain => Shape::Collapsed,
        _ if count >= 2 => Shape::Promoted,
        _ => Shape::Scalar,
    };
    let mut all_comments: Vec<Node> = Vec::new();
    for (line, comments) in lines.iter().zip(&per_line_comments) {
        all_comments.extend(comments.iter().cloned());
        for comment in line.rest.iter().filter(|n| n.is_comment()) {
            all_comments.push(Node::lexeme(Rule::Whitespace, " "));
            all_comments.push(comment.clone());
        }
    }

    let node = match shape {
        Shape::Promoted => {
            let mut children = Vec::new();
            for ((line, terms), comments) in lines.iter().zip(&per_line_terms).zip(&per_line_comments) {
                children.extend(line.indent.clone());
                for (i, term) in terms.iter().enumerate() {
                    if i == 0 {
                        children.push(term.element(comments));
                    } else {
                        let gap = if term.gap.is_empty() { " " } else { term.gap.as_str() };
                        children.push(Node::lexeme(Rule::Whitespace, gap));
                        children.push(term.element(&[]));
                    }
                }
                children.extend(line.rest.iter().cloned());
                children.extend(line.newline.clone());
            }
            Node::syntax(Rule::ImplicitArray, children)
        }
        Shape::Collapsed => {
            let mut text = String::new();
            for (line_index, terms) in per_line_terms.iter().filter(|t| !t.is_empty()).enumerate() {
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        text.push_str(&term.gap);
                    } else if line_index > 0 {
                        text.push(' ');
                    }
                    if let Node::Lexeme(lexeme) = &term.node {
                        text.push_str(lexeme.text());
                    }
                }
            }
            let mut children = vec![Node::lexeme(Rule::UnquotedString, text)];
            children.extend(all_comments);
            Node::syntax(Rule::Expression, children)
        }
        _ => {
            let term = per_line_terms.iter().flatten().next();
            match term {
                Some(term) => term.element(&all_comments),
                None => return (None, Shape::Unchanged, Legality::LEGAL),
            }
        }
    };
    (Some(node), shape, Legality::LEGAL)
}
