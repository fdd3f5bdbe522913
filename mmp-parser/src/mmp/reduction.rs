//! Reduction
//!
//!     Turns the syntax tree into IR, bottom-up, one reduction per rule. Reductions look up
//!     their handler by the node's tag; rules without a handler keep their reduced children
//!     in a node of the same tag.
//!
//!     Policies shared by all rules:
//!
//!         - Token combination: the leaves of a string, number or date collapse into a single
//!           lexeme tagged with the token's rule. Strings drop their quotes and canonicalize
//!           their escapes (see [`escapes`]).
//!         - Empty elision: an empty whitespace leaf disappears. Empty line breaks and indents
//!           are kept, they still mark a position.
//!         - Comment attachment: the trailing comment of a value line moves into that line's
//!           expression, together with the whitespace before it.
//!         - Implicit OR: an expression whose two operands are separated only by whitespace
//!           gets an [`Rule::ImplicitOr`] lexeme as its second child.
//!
//! Legality
//!
//!     Each reduction returns a [`Legality`] verdict next to its result, and verdicts combine
//!     with a logical AND, so a single construct that is not TOML makes the whole pass
//!     illegal. The constructs are: a key without value, a bare unquoted word, a legacy table
//!     header, continuation lines, and any operator or group of the condition language.

pub mod escapes;

use crate::mmp::grammar::Rule;
use crate::mmp::ir::{Lexeme, Node, SyntaxNode};
use crate::mmp::parsing::SyntaxTree;
use std::ops::BitAnd;

/// Whether everything reduced so far is legal TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Legality(bool);

impl Legality {
    pub const LEGAL: Legality = Legality(true);
    pub const ILLEGAL: Legality = Legality(false);

    pub fn is_legal(self) -> bool {
        self.0
    }

    /// Combine two verdicts. Once illegal, always illegal.
    pub fn and(self, other: Legality) -> Legality {
        Legality(self.0 && other.0)
    }

    /// This verdict, made illegal when `violation` holds.
    pub fn unless(self, violation: bool) -> Legality {
        self.and(Legality(!violation))
    }
}

impl Default for Legality {
    fn default() -> Self {
        Legality::LEGAL
    }
}

impl BitAnd for Legality {
    type Output = Legality;

    fn bitand(self, rhs: Legality) -> Legality {
        self.and(rhs)
    }
}

impl FromIterator<Legality> for Legality {
    fn from_iter<T: IntoIterator<Item = Legality>>(iter: T) -> Self {
        iter.into_iter().fold(Legality::LEGAL, Legality::and)
    }
}

/// A reduction result with the legality of what produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reduced<T> {
    pub value: T,
    pub legality: Legality,
}

impl<T> Reduced<T> {
    pub fn new(value: T, legality: Legality) -> Self {
        Reduced { value, legality }
    }

    pub fn legal(value: T) -> Self {
        Reduced::new(value, Legality::LEGAL)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reduced<U> {
        Reduced::new(f(self.value), self.legality)
    }

    /// Fold in a further verdict.
    pub fn and(self, legality: Legality) -> Self {
        Reduced::new(self.value, self.legality.and(legality))
    }
}

/// Reduce a whole syntax tree to a single IR node.
pub fn reduce(tree: &SyntaxTree) -> Reduced<SyntaxNode> {
    let reduced = reduce_tree(tree);
    let legality = reduced.legality;
    let mut nodes = reduced.value;
    let root = match (nodes.len(), nodes.pop()) {
        (1, Some(Node::Syntax(node))) => node,
        (_, last) => {
            nodes.extend(last);
            SyntaxNode::new(tree.rule(), nodes)
        }
    };
    tracing::debug!(
        root = %root.tag(),
        legal = legality.is_legal(),
        "reduced syntax tree"
    );
    Reduced::new(root, legality)
}

/// Reduce one subtree to zero or more IR nodes.
pub fn reduce_tree(tree: &SyntaxTree) -> Reduced<Vec<Node>> {
    match tree {
        SyntaxTree::Leaf { rule, text, .. } => reduce_leaf(*rule, text),
        SyntaxTree::Node { rule, children } => match rule {
            Rule::BasicString | Rule::MlBasicString | Rule::LiteralString | Rule::MlLiteralString => {
                Reduced::legal(vec![combine_string(*rule, children)])
            }
            Rule::Integer | Rule::Float | Rule::DateTime => {
                Reduced::legal(vec![combine_token(*rule, children)])
            }
            _ => {
                let reduced = reduce_children(children);
                let handler = handler_for(*rule);
                handler(*rule, reduced.value).and(reduced.legality)
            }
        },
    }
}

fn reduce_leaf(rule: Rule, text: &str) -> Reduced<Vec<Node>> {
    if text.is_empty() && !rule.retained_when_empty() {
        return Reduced::legal(Vec::new());
    }
    let legality = Legality::LEGAL.unless(matches!(
        rule,
        Rule::Identifier
            | Rule::Unquoted
            | Rule::LegacyKey
            | Rule::OrOp
            | Rule::AndOp
            | Rule::NotOp
            | Rule::CompareOp
            | Rule::LParen
            | Rule::RParen
    ));
    Reduced::new(vec![Node::lexeme(rule, text)], legality)
}

fn reduce_children(children: &[SyntaxTree]) -> Reduced<Vec<Node>> {
    let mut nodes = Vec::new();
    let mut legality = Legality::LEGAL;
    for child in children {
        let reduced = reduce_tree(child);
        legality = legality & reduced.legality;
        nodes.extend(reduced.value);
    }
    Reduced::new(nodes, legality)
}

/// Reduction for a node whose children are already reduced.
type Handler = fn(Rule, Vec<Node>) -> Reduced<Vec<Node>>;

fn handler_for(rule: Rule) -> Handler {
    match rule {
        Rule::Table => reduce_table,
        Rule::KeyValue => reduce_key_value,
        Rule::ImplicitArray => reduce_implicit_array,
        Rule::Continuation => reduce_continuation,
        Rule::Expression => reduce_expression,
        Rule::Conjunction | Rule::Comparison | Rule::Negation | Rule::Group => reduce_condition,
        _ => keep,
    }
}

/// Fallback: a node of the same tag over the reduced children.
fn keep(rule: Rule, children: Vec<Node>) -> Reduced<Vec<Node>> {
    Reduced::legal(vec![Node::syntax(rule, children)])
}

fn reduce_table(_rule: Rule, children: Vec<Node>) -> Reduced<Vec<Node>> {
    let mut key = None;
    let mut trailing = Vec::new();
    let mut closed = false;
    for child in children {
        match child {
            Node::Lexeme(lexeme) if lexeme.tag() == Rule::RBracket => closed = true,
            Node::Lexeme(lexeme) if closed => trailing.push(Node::Lexeme(lexeme)),
            Node::Lexeme(lexeme)
                if matches!(
                    lexeme.tag(),
                    Rule::BareKey | Rule::LegacyKey | Rule::BasicString | Rule::LiteralString
                ) =>
            {
                key = Some(lexeme)
            }
            _ => {}
        }
    }
    let key = key.unwrap_or_else(|| Lexeme::new(Rule::BareKey, ""));
    Reduced::legal(vec![Node::Syntax(SyntaxNode::table(key, trailing))])
}

fn reduce_key_value(rule: Rule, children: Vec<Node>) -> Reduced<Vec<Node>> {
    let mut children = attach_comments(children);

    // The line break that ends a multi-line value belongs to the key value itself
    if let Some(index) = children
        .iter()
        .position(|c| c.tag() == Rule::ImplicitArray)
    {
        if let Node::Syntax(array) = &children[index] {
            if array.children().last().map(Node::tag) == Some(Rule::Newline) {
                let mut lines = array.children().to_vec();
                let newline = lines.pop();
                children[index] = Node::syntax(Rule::ImplicitArray, lines);
                children.extend(newline);
            }
        }
    }

    let has_value = children.iter().any(|c| {
        matches!(
            c.tag(),
            Rule::Expression | Rule::Array | Rule::ImplicitArray
        )
    });
    let legality = Legality::LEGAL.unless(!has_value);
    Reduced::new(vec![Node::syntax(rule, children)], legality)
}

fn reduce_implicit_array(rule: Rule, children: Vec<Node>) -> Reduced<Vec<Node>> {
    Reduced::new(
        vec![Node::syntax(rule, attach_comments(children))],
        Legality::ILLEGAL,
    )
}

/// Continuation lines dissolve into the implicit array that owns them.
fn reduce_continuation(_rule: Rule, children: Vec<Node>) -> Reduced<Vec<Node>> {
    Reduced::legal(attach_comments(children))
}

fn reduce_expression(rule: Rule, mut children: Vec<Node>) -> Reduced<Vec<Node>> {
    let operands = children.iter().filter(|c| !c.is_layout()).count();
    let explicit = children.iter().any(|c| c.tag() == Rule::OrOp);
    if operands >= 2 && !explicit {
        children.insert(1, Node::lexeme(Rule::ImplicitOr, ""));
        return Reduced::new(vec![Node::syntax(rule, children)], Legality::ILLEGAL);
    }
    Reduced::legal(vec![Node::syntax(rule, children)])
}

fn reduce_condition(rule: Rule, children: Vec<Node>) -> Reduced<Vec<Node>> {
    Reduced::new(vec![Node::syntax(rule, children)], Legality::ILLEGAL)
}

/// Move every `WS? COMMENT` that follows an expression into it.
fn attach_comments(children: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(children.len());
    let mut pending_ws: Option<Node> = None;
    for child in children {
        let target = out
            .last()
            .map_or(false, |last| last.tag() == Rule::Expression);
        match child {
            Node::Lexeme(ws) if ws.tag() == Rule::Whitespace && target && pending_ws.is_none() => {
                pending_ws = Some(Node::Lexeme(ws));
            }
            Node::Lexeme(comment) if comment.tag() == Rule::Comment && target => {
                if let Some(Node::Syntax(expression)) = out.pop() {
                    let mut inner = expression.into_children();
                    inner.extend(pending_ws.take());
                    inner.push(Node::Lexeme(comment));
                    out.push(Node::syntax(Rule::Expression, inner));
                }
            }
            other => {
                out.extend(pending_ws.take());
                out.push(other);
            }
        }
    }
    out.extend(pending_ws);
    out
}

/// One lexeme for a whole string: the content between the quotes.
fn combine_string(rule: Rule, leaves: &[SyntaxTree]) -> Node {
    let mut text = String::new();
    for leaf in leaves {
        if let SyntaxTree::Leaf { rule: part, text: piece, .. } = leaf {
            match part {
                Rule::Quote => {}
                Rule::Escape => text.push_str(&escapes::canonicalize(piece)),
                _ => text.push_str(piece),
            }
        }
    }
    Node::lexeme(rule, text)
}

/// One lexeme for a multi-leaf token: its subfields concatenated.
fn combine_token(rule: Rule, leaves: &[SyntaxTree]) -> Node {
    Node::lexeme(rule, leaves.iter().map(SyntaxTree::text).collect::<String>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mmp::grammar::{Grammar, StartRule};
    use crate::mmp::parsing::parse;

    fn reduce_source(source: &str) -> Reduced<SyntaxNode> {
        reduce(&parse(source, &Grammar::manifest()).unwrap())
    }

    fn reduce_expression_source(source: &str) -> Reduced<SyntaxNode> {
        reduce(&parse(source, &Grammar::with_start(StartRule::Expression)).unwrap())
    }

    fn tags(nodes: &[Node]) -> Vec<Rule> {
        nodes.iter().map(Node::tag).collect()
    }

    #[test]
    fn test_legal_toml_stays_legal() {
        let reduced = reduce_source(
            "[DEFAULT]\nhead = \"head.js\"\ntimeout = 30\n\n[\"test_a.js\"]\nskip-if = [\"os == 'win'\"]\n",
        );
        assert!(reduced.legality.is_legal());
    }

    #[test]
    fn test_each_legacy_construct_is_illegal() {
        for source in [
            "head =\n",
            "head = head.js\n",
            "[test_a.js]\n",
            "k = 1\n  2\n",
            "k = (1)\n",
            "k = \"a\" \"b\"\n",
            "k = !true\n",
            "k = 1 == 1\n",
        ] {
            assert!(
                !reduce_source(source).legality.is_legal(),
                "expected {:?} to be illegal",
                source
            );
        }
    }

    #[test]
    fn test_string_token_combination() {
        let reduced = reduce_expression_source(r#""a\x41é\U0001f600""#);
        let lexeme = reduced.value.children()[0].as_lexeme().unwrap();
        assert_eq!(lexeme.tag(), Rule::BasicString);
        assert_eq!(lexeme.text(), "a\\u0041é\\U0001F600");
    }

    #[test]
    fn test_number_and_date_combination() {
        let reduced = reduce_source("a = -42\nb = 1979-05-27T07:32:00Z\n");
        let values: Vec<_> = reduced
            .value
            .children()
            .iter()
            .map(|kv| kv.as_syntax().unwrap().find(Rule::Expression).unwrap().children()[0].clone())
            .collect();
        assert_eq!(values[0], Node::lexeme(Rule::Integer, "-42"));
        assert_eq!(values[1], Node::lexeme(Rule::DateTime, "1979-05-27T07:32:00Z"));
    }

    #[test]
    fn test_empty_whitespace_is_elided() {
        let reduced = reduce_source("a=1\n");
        let key_value = &reduced.value.children()[0];
        assert_eq!(
            tags(key_value.children()),
            vec![Rule::BareKey, Rule::Equals, Rule::Expression, Rule::Newline]
        );
    }

    #[test]
    fn test_empty_newline_at_end_of_input_is_kept() {
        let reduced = reduce_source("a = 1");
        let key_value = &reduced.value.children()[0];
        assert_eq!(key_value.children().last(), Some(&Node::lexeme(Rule::Newline, "")));
    }

    #[test]
    fn test_trailing_comment_moves_into_expression() {
        let reduced = reduce_source("skip-if = os == \"win\" # bug 1\n");
        let key_value = reduced.value.children()[0].as_syntax().unwrap();
        let expression = key_value.find(Rule::Expression).unwrap();
        assert_eq!(
            tags(expression.children()),
            vec![Rule::Comparison, Rule::Whitespace, Rule::Comment]
        );
        assert_eq!(key_value.children().last().map(Node::tag), Some(Rule::Newline));
    }

    #[test]
    fn test_implicit_or_inserted_as_second_child() {
        let reduced = reduce_expression_source("debug asan");
        assert_eq!(
            tags(reduced.value.children()),
            vec![Rule::Identifier, Rule::ImplicitOr, Rule::Whitespace, Rule::Identifier]
        );
        assert!(!reduced.legality.is_legal());
    }

    #[test]
    fn test_explicit_or_is_kept() {
        let reduced = reduce_expression_source("a || b");
        assert_eq!(
            tags(reduced.value.children()),
            vec![
                Rule::Identifier,
                Rule::Whitespace,
                Rule::OrOp,
                Rule::Whitespace,
                Rule::Identifier
            ]
        );
    }

    #[test]
    fn test_implicit_array_lines() {
        let reduced = reduce_source("skip-if =\n  debug # one\n  asan\n");
        let key_value = reduced.value.children()[0].as_syntax().unwrap();
        assert_eq!(
            tags(key_value.children()),
            vec![
                Rule::BareKey,
                Rule::Whitespace,
                Rule::Equals,
                Rule::ImplicitArray,
                Rule::Newline
            ]
        );
        let array = key_value.find(Rule::ImplicitArray).unwrap();
        assert_eq!(
            tags(array.children()),
            vec![
                Rule::Newline,
                Rule::Indent,
                Rule::Expression,
                Rule::Newline,
                Rule::Indent,
                Rule::Expression
            ]
        );
        assert_eq!(
            tags(array.children()[2].children()),
            vec![Rule::Identifier, Rule::Whitespace, Rule::Comment]
        );
    }

    #[test]
    fn test_table_header_key() {
        let reduced = reduce_source("[test_a.js] # c\n");
        let table = reduced.value.children()[0].as_syntax().unwrap();
        assert_eq!(table.table_key(), Some(&Lexeme::new(Rule::LegacyKey, "test_a.js")));
        assert_eq!(
            tags(table.children()),
            vec![Rule::Whitespace, Rule::Comment, Rule::Newline]
        );
    }

    #[test]
    fn test_legality_accumulates() {
        let verdicts = [Legality::LEGAL, Legality::ILLEGAL, Legality::LEGAL];
        assert_eq!(verdicts.into_iter().collect::<Legality>(), Legality::ILLEGAL);
        assert!(Legality::default().is_legal());
        assert!(!Legality::ILLEGAL.and(Legality::LEGAL).is_legal());
    }
}
