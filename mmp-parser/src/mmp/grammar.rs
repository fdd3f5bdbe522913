//! Grammar
//!
//!     The manifest grammar covers both dialects at once: legal TOML (the subset manifests
//!     use) and the legacy INI-derived format, whose values are written in the condition
//!     language. Every node the parser emits, and every node of the IR built from it, is
//!     tagged with the [`Rule`] that produced it.
//!
//! Rules
//!
//!     manifest      : line*
//!     line          : blank_line | comment_line | table | key_value
//!     blank_line    : WS? NEWLINE
//!     comment_line  : WS? COMMENT NEWLINE
//!     table         : "[" WS? table_key WS? "]" WS? COMMENT? NEWLINE
//!     table_key     : BASIC_STRING | LITERAL_STRING | BARE_KEY | LEGACY_KEY
//!     key_value     : key WS? "=" WS? value_tail
//!     key           : BARE_KEY | BASIC_STRING | LITERAL_STRING
//!     value_tail    : array WS? COMMENT? NEWLINE
//!                   | implicit_array
//!                   | expression WS? COMMENT? NEWLINE
//!                   | COMMENT? NEWLINE
//!     implicit_array: expression? WS? COMMENT? NEWLINE continuation+
//!     continuation  : INDENT expression? WS? COMMENT? NEWLINE
//!     array         : "[" (WS | NEWLINE | COMMENT | expression | ",")* "]"
//!     expression    : conjunction
//!                   | expression WS? "||" WS? conjunction
//!                   | expression WS conjunction             (implicit OR)
//!     conjunction   : comparison (WS? "&&" WS? comparison)*
//!     comparison    : unary (WS? CMP_OP WS? unary)?
//!     unary         : "!" unary | primary
//!     primary       : "(" WS? expression WS? ")" | atom
//!     atom          : string | INTEGER | FLOAT | DATETIME | BOOLEAN | IDENTIFIER | UNQUOTED
//!
//!     A continuation is an indented, non-blank line that directly follows a key value line.
//!     Word-like tokens that touch each other (`dom.foo=true`, `data/**`) glue into a single
//!     UNQUOTED atom.
//!
//! Start symbols
//!
//!     `manifest` parses a whole file, `value` the right hand side of a key (everything after
//!     `=`), `expression` a single condition.

use crate::mmp::error::ParseError;
use serde::Serialize;
use std::fmt;

/// Tag of a syntax tree or IR node: the grammar rule (or terminal) it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    // Structure
    Manifest,
    BlankLine,
    CommentLine,
    Table,
    KeyValue,
    Continuation,
    Array,
    ImplicitArray,

    // Condition language
    Expression,
    Conjunction,
    Comparison,
    Negation,
    Group,

    // Multi-leaf tokens (CST nodes, single lexemes after reduction)
    BasicString,
    LiteralString,
    MlBasicString,
    MlLiteralString,
    Integer,
    Float,
    DateTime,

    // Synthesized by normalization
    UnquotedString,

    // Layout
    Newline,
    Whitespace,
    Indent,
    Comment,

    // Punctuation
    LBracket,
    RBracket,
    Comma,
    LParen,
    RParen,
    Equals,

    // Operators
    CompareOp,
    AndOp,
    OrOp,
    NotOp,
    ImplicitOr,

    // Token pieces
    Quote,
    Chars,
    Escape,
    Sign,
    Digits,
    DatePart,
    TimePart,
    OffsetPart,

    // Words
    BareKey,
    LegacyKey,
    Identifier,
    Boolean,
    Unquoted,
}

impl Rule {
    /// The grammar name of this rule.
    pub fn name(self) -> &'static str {
        match self {
            Rule::Manifest => "manifest",
            Rule::BlankLine => "blank_line",
            Rule::CommentLine => "comment_line",
            Rule::Table => "table",
            Rule::KeyValue => "key_value",
            Rule::Continuation => "continuation",
            Rule::Array => "array",
            Rule::ImplicitArray => "implicit_array",
            Rule::Expression => "expression",
            Rule::Conjunction => "conjunction",
            Rule::Comparison => "comparison",
            Rule::Negation => "negation",
            Rule::Group => "group",
            Rule::BasicString => "basic_string",
            Rule::LiteralString => "literal_string",
            Rule::MlBasicString => "ml_basic_string",
            Rule::MlLiteralString => "ml_literal_string",
            Rule::Integer => "integer",
            Rule::Float => "float",
            Rule::DateTime => "datetime",
            Rule::UnquotedString => "unquoted_string",
            Rule::Newline => "NEWLINE",
            Rule::Whitespace => "WS",
            Rule::Indent => "INDENT",
            Rule::Comment => "COMMENT",
            Rule::LBracket => "\"[\"",
            Rule::RBracket => "\"]\"",
            Rule::Comma => "\",\"",
            Rule::LParen => "\"(\"",
            Rule::RParen => "\")\"",
            Rule::Equals => "\"=\"",
            Rule::CompareOp => "CMP_OP",
            Rule::AndOp => "\"&&\"",
            Rule::OrOp => "\"||\"",
            Rule::NotOp => "\"!\"",
            Rule::ImplicitOr => "implicit_or",
            Rule::Quote => "QUOTE",
            Rule::Chars => "CHARS",
            Rule::Escape => "ESCAPE",
            Rule::Sign => "SIGN",
            Rule::Digits => "DIGITS",
            Rule::DatePart => "DATE",
            Rule::TimePart => "TIME",
            Rule::OffsetPart => "OFFSET",
            Rule::BareKey => "BARE_KEY",
            Rule::LegacyKey => "LEGACY_KEY",
            Rule::Identifier => "IDENTIFIER",
            Rule::Boolean => "BOOLEAN",
            Rule::Unquoted => "UNQUOTED",
        }
    }

    /// Layout lexemes: they carry no value, only position.
    pub fn is_layout(self) -> bool {
        matches!(self, Rule::Newline | Rule::Whitespace | Rule::Indent)
    }

    /// Lexemes kept by reduction even when they captured nothing.
    pub fn retained_when_empty(self) -> bool {
        matches!(self, Rule::Newline | Rule::Indent | Rule::Comment)
    }

    pub fn is_string(self) -> bool {
        matches!(
            self,
            Rule::BasicString | Rule::LiteralString | Rule::MlBasicString | Rule::MlLiteralString
        )
    }

    /// Atoms that are native TOML values as written.
    pub fn is_toml_literal(self) -> bool {
        self.is_string()
            || matches!(
                self,
                Rule::Integer | Rule::Float | Rule::DateTime | Rule::Boolean
            )
    }

    /// Atoms without nested structure that may be folded into an unquoted string.
    pub fn is_plain(self) -> bool {
        matches!(
            self,
            Rule::Identifier | Rule::Unquoted | Rule::Integer | Rule::Float | Rule::Boolean
        )
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rules a parse may start from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StartRule {
    Manifest,
    Value,
    Expression,
}

impl StartRule {
    pub fn name(self) -> &'static str {
        match self {
            StartRule::Manifest => "manifest",
            StartRule::Value => "value",
            StartRule::Expression => "expression",
        }
    }

    pub fn all() -> &'static [StartRule] {
        &[StartRule::Manifest, StartRule::Value, StartRule::Expression]
    }
}

/// A loaded grammar, ready to parse from its start symbol.
///
/// Grammars are immutable and cheap to share between threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    start: StartRule,
}

impl Grammar {
    /// Load the grammar with the given start symbol.
    ///
    /// An unknown start symbol is a configuration error: it is reported before any input
    /// is read.
    pub fn new(start: &str) -> Result<Self, ParseError> {
        StartRule::all()
            .iter()
            .find(|rule| rule.name() == start)
            .map(|&start| Grammar { start })
            .ok_or_else(|| {
                let known: Vec<_> = StartRule::all().iter().map(|r| r.name()).collect();
                ParseError::Configuration(format!(
                    "unknown start symbol '{}' (expected one of: {})",
                    start,
                    known.join(", ")
                ))
            })
    }

    /// The grammar for whole manifest files.
    pub fn manifest() -> Self {
        Grammar {
            start: StartRule::Manifest,
        }
    }

    pub fn with_start(start: StartRule) -> Self {
        Grammar { start }
    }

    pub fn start(&self) -> StartRule {
        self.start
    }
}

impl Default for Grammar {
    fn default() -> Self {
        Self::manifest()
    }
}
