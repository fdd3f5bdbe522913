//! Concrete syntax tree
//!
//! The parser's output. Every node is tagged with the rule that produced it and leaves keep
//! their exact source text and byte range, including whitespace the grammar matched but
//! that carries no meaning. Optional whitespace that matched nothing is still present as an
//! empty leaf.

use crate::mmp::grammar::Rule;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxTree {
    Node {
        rule: Rule,
        children: Vec<SyntaxTree>,
    },
    Leaf {
        rule: Rule,
        text: String,
        span: Range<usize>,
    },
}

impl SyntaxTree {
    pub fn node(rule: Rule, children: Vec<SyntaxTree>) -> Self {
        SyntaxTree::Node { rule, children }
    }

    pub fn leaf(rule: Rule, text: impl Into<String>, span: Range<usize>) -> Self {
        SyntaxTree::Leaf {
            rule,
            text: text.into(),
            span,
        }
    }

    pub fn rule(&self) -> Rule {
        match self {
            SyntaxTree::Node { rule, .. } | SyntaxTree::Leaf { rule, .. } => *rule,
        }
    }

    pub fn children(&self) -> &[SyntaxTree] {
        match self {
            SyntaxTree::Node { children, .. } => children,
            SyntaxTree::Leaf { .. } => &[],
        }
    }

    /// The source text under this node.
    pub fn text(&self) -> String {
        match self {
            SyntaxTree::Leaf { text, .. } => text.clone(),
            SyntaxTree::Node { children, .. } => children.iter().map(|c| c.text()).collect(),
        }
    }

    pub fn is_empty_leaf(&self) -> bool {
        matches!(self, SyntaxTree::Leaf { text, .. } if text.is_empty())
    }

    /// Number of nodes and leaves in the tree.
    pub fn size(&self) -> usize {
        1 + self.children().iter().map(|c| c.size()).sum::<usize>()
    }
}
