//! Intermediate representation
//!
//!     The IR is what reduction builds from the syntax tree and what the printers render. It
//!     has two kinds of nodes: a [`Lexeme`] is a tagged string leaf, a [`SyntaxNode`] a tagged
//!     interior node with ordered children. Children order is render order. Table headers are
//!     the one node that carries extra data: the key between the brackets, stored apart from
//!     the children so it is never mistaken for a value.
//!
//!     String lexemes hold the characters between the quotes with escapes in canonical form.
//!     Every other lexeme holds its exact source text.
//!
//!     Nodes are never mutated once built. Normalization builds new nodes instead.

use crate::mmp::grammar::Rule;
use serde::Serialize;

/// A tagged string leaf.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Lexeme {
    tag: Rule,
    text: String,
}

impl Lexeme {
    pub fn new(tag: Rule, text: impl Into<String>) -> Self {
        Lexeme {
            tag,
            text: text.into(),
        }
    }

    pub fn tag(&self) -> Rule {
        self.tag
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// A tagged interior node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SyntaxNode {
    tag: Rule,
    children: Vec<Node>,
    #[serde(skip_serializing_if = "Option::is_none")]
    table_key: Option<Lexeme>,
}

impl SyntaxNode {
    pub fn new(tag: Rule, children: Vec<Node>) -> Self {
        SyntaxNode {
            tag,
            children,
            table_key: None,
        }
    }

    /// A table header owning `key`; `children` are the layout after the closing bracket.
    pub fn table(key: Lexeme, children: Vec<Node>) -> Self {
        SyntaxNode {
            tag: Rule::Table,
            children,
            table_key: Some(key),
        }
    }

    pub fn tag(&self) -> Rule {
        self.tag
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn into_children(self) -> Vec<Node> {
        self.children
    }

    pub fn table_key(&self) -> Option<&Lexeme> {
        self.table_key.as_ref()
    }

    /// Children that are not layout lexemes.
    pub fn significant_children(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter(|child| !child.is_layout())
    }

    /// The first child tagged `tag`.
    pub fn find(&self, tag: Rule) -> Option<&Node> {
        self.children.iter().find(|child| child.tag() == tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Lexeme(Lexeme),
    Syntax(SyntaxNode),
}

impl Node {
    pub fn lexeme(tag: Rule, text: impl Into<String>) -> Self {
        Node::Lexeme(Lexeme::new(tag, text))
    }

    pub fn syntax(tag: Rule, children: Vec<Node>) -> Self {
        Node::Syntax(SyntaxNode::new(tag, children))
    }

    pub fn tag(&self) -> Rule {
        match self {
            Node::Lexeme(lexeme) => lexeme.tag(),
            Node::Syntax(node) => node.tag(),
        }
    }

    pub fn as_lexeme(&self) -> Option<&Lexeme> {
        match self {
            Node::Lexeme(lexeme) => Some(lexeme),
            Node::Syntax(_) => None,
        }
    }

    pub fn as_syntax(&self) -> Option<&SyntaxNode> {
        match self {
            Node::Syntax(node) => Some(node),
            Node::Lexeme(_) => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Syntax(node) => node.children(),
            Node::Lexeme(_) => &[],
        }
    }

    pub fn is_layout(&self) -> bool {
        matches!(self, Node::Lexeme(lexeme) if lexeme.tag().is_layout())
    }

    pub fn is_comment(&self) -> bool {
        self.tag() == Rule::Comment
    }

    /// Visit this node and all descendants, depth first, parents before children.
    pub fn walk<'a>(&'a self, depth: usize, visit: &mut dyn FnMut(&'a Node, usize)) {
        visit(self, depth);
        for child in self.children() {
            child.walk(depth + 1, visit);
        }
    }
}

impl From<Lexeme> for Node {
    fn from(lexeme: Lexeme) -> Self {
        Node::Lexeme(lexeme)
    }
}

impl From<SyntaxNode> for Node {
    fn from(node: SyntaxNode) -> Self {
        Node::Syntax(node)
    }
}

/// A normalized manifest: the root node plus the legality verdict of its pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    root: SyntaxNode,
    legal: bool,
}

impl Manifest {
    pub fn new(root: SyntaxNode, legal: bool) -> Self {
        Manifest { root, legal }
    }

    pub fn root(&self) -> &SyntaxNode {
        &self.root
    }

    /// Whether the source was already legal TOML.
    pub fn is_legal(&self) -> bool {
        self.legal
    }

    /// The line ending the source uses, taken from its first line break.
    pub fn newline(&self) -> &str {
        let mut found: Option<&str> = None;
        for child in self.root.children() {
            child.walk(0, &mut |node, _| {
                if found.is_none() {
                    if let Node::Lexeme(lexeme) = node {
                        if lexeme.tag() == Rule::Newline && !lexeme.is_empty() {
                            found = Some(lexeme.text());
                        }
                    }
                }
            });
            if found.is_some() {
                break;
            }
        }
        found.unwrap_or("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_value(newline: &str) -> Node {
        Node::syntax(
            Rule::KeyValue,
            vec![
                Node::lexeme(Rule::BareKey, "a"),
                Node::lexeme(Rule::Equals, "="),
                Node::syntax(Rule::Expression, vec![Node::lexeme(Rule::Integer, "1")]),
                Node::lexeme(Rule::Newline, newline),
            ],
        )
    }

    #[test]
    fn test_newline_style() {
        let crlf = Manifest::new(
            SyntaxNode::new(Rule::Manifest, vec![key_value("\r\n")]),
            true,
        );
        assert_eq!(crlf.newline(), "\r\n");

        let missing = Manifest::new(SyntaxNode::new(Rule::Manifest, vec![key_value("")]), true);
        assert_eq!(missing.newline(), "\n");
    }

    #[test]
    fn test_table_key_is_not_a_child() {
        let table = SyntaxNode::table(
            Lexeme::new(Rule::LegacyKey, "test_a.js"),
            vec![Node::lexeme(Rule::Newline, "\n")],
        );
        assert_eq!(table.children().len(), 1);
        assert_eq!(table.table_key().map(|k| k.text()), Some("test_a.js"));
    }

    #[test]
    fn test_walk_order() {
        let mut seen = Vec::new();
        key_value("\n").walk(0, &mut |node, depth| seen.push((node.tag(), depth)));
        assert_eq!(
            seen,
            vec![
                (Rule::KeyValue, 0),
                (Rule::BareKey, 1),
                (Rule::Equals, 1),
                (Rule::Expression, 1),
                (Rule::Integer, 2),
                (Rule::Newline, 1),
            ]
        );
    }
}
