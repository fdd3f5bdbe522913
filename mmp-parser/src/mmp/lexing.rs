//! Tokenizer
//!
//!     A plain logos lexer over the whole source. Tokens carry their byte range; the parser
//!     slices leaf text out of the source with it, so nothing is lost between the two.
//!
//!     Ambiguities are resolved by logos' longest match first and then by priority:
//!     `2020-01-01` is a DATETIME rather than a word, `-5` an INTEGER, `1.5` a FLOAT, and
//!     `foo.js` a single UNQUOTED run. Word-like tokens that touch are glued later, by the
//!     parser, since whether gluing applies depends on the position (keys never glue).

use crate::mmp::error::{line_column, ParseError};
use logos::{Lexer, Logos};
use std::ops::Range;

/// Token stream with byte ranges into the source.
pub type TokenStream = Vec<(Token, Range<usize>)>;

#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Token {
    // Layout
    #[regex(r"\r?\n")]
    Newline,
    #[regex(r"[ \t]+")]
    Whitespace,
    #[regex(r"#[^\r\n]*")]
    Comment,

    // Punctuation
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("=")]
    Equals,

    // Operators
    #[regex(r"==|!=|<=|>=|<|>")]
    CompareOp,
    #[token("&&")]
    And,
    #[token("||")]
    Or,
    #[token("!")]
    Not,

    // Strings
    #[regex(r#""([^"\\\r\n]|\\[^\r\n])*""#)]
    BasicString,
    #[regex(r"'[^'\r\n]*'")]
    LiteralString,
    #[token(r#"""""#, multiline_basic)]
    MlBasicString,
    #[token("'''", multiline_literal)]
    MlLiteralString,

    // Literals
    #[regex(
        r"[0-9]{4}-[0-9]{2}-[0-9]{2}([Tt][0-9]{2}:[0-9]{2}:[0-9]{2}(\.[0-9]+)?([Zz]|[+-][0-9]{2}:[0-9]{2})?)?",
        priority = 6
    )]
    DateTime,
    #[regex(r"[+-]?[0-9]+(\.[0-9]+([eE][+-]?[0-9]+)?|[eE][+-]?[0-9]+)", priority = 5)]
    Float,
    #[regex(r"[+-]?[0-9](_?[0-9])*", priority = 5)]
    Integer,

    // Words
    #[regex(r"[A-Za-z0-9_-]+", priority = 4)]
    Word,
    // An apostrophe inside a run belongs to it; only a leading one opens a string
    #[regex(r#"[^\s"'()\[\]!<>=&|#,][^\s"()\[\]!<>=&|#,]*"#, priority = 2)]
    Unquoted,
    // A lone `&` or `|` (doubled they are operators)
    #[regex(r"[&|]", priority = 1)]
    Symbol,
}

/// Scan to the closing `"""`, skipping backslash escapes.
fn multiline_basic(lex: &mut Lexer<Token>) -> bool {
    let rest = lex.remainder();
    let mut chars = rest.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '"' if rest[i..].starts_with(r#"""""#) => {
                lex.bump(i + 3);
                return true;
            }
            _ => {}
        }
    }
    false
}

/// Scan to the closing `'''`.
fn multiline_literal(lex: &mut Lexer<Token>) -> bool {
    match lex.remainder().find("'''") {
        Some(i) => {
            lex.bump(i + 3);
            true
        }
        None => false,
    }
}

impl Token {
    /// How the token is named in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Token::Newline => "NEWLINE",
            Token::Whitespace => "WS",
            Token::Comment => "COMMENT",
            Token::LBracket => "\"[\"",
            Token::RBracket => "\"]\"",
            Token::Comma => "\",\"",
            Token::LParen => "\"(\"",
            Token::RParen => "\")\"",
            Token::Equals => "\"=\"",
            Token::CompareOp => "CMP_OP",
            Token::And => "\"&&\"",
            Token::Or => "\"||\"",
            Token::Not => "\"!\"",
            Token::BasicString => "BASIC_STRING",
            Token::LiteralString => "LITERAL_STRING",
            Token::MlBasicString => "ML_BASIC_STRING",
            Token::MlLiteralString => "ML_LITERAL_STRING",
            Token::DateTime => "DATETIME",
            Token::Float => "FLOAT",
            Token::Integer => "INTEGER",
            Token::Word => "WORD",
            Token::Unquoted => "UNQUOTED",
            Token::Symbol => "SYMBOL",
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(
            self,
            Token::BasicString | Token::LiteralString | Token::MlBasicString | Token::MlLiteralString
        )
    }

    /// Tokens that glue into one unquoted atom when nothing separates them.
    pub fn is_word_like(&self) -> bool {
        matches!(
            self,
            Token::Word
                | Token::Unquoted
                | Token::Symbol
                | Token::Integer
                | Token::Float
                | Token::DateTime
                | Token::Equals
        )
    }

    /// Tokens that can begin an expression term.
    pub fn starts_term(&self) -> bool {
        self.is_string()
            || matches!(
                self,
                Token::Word
                    | Token::Unquoted
                    | Token::Symbol
                    | Token::Integer
                    | Token::Float
                    | Token::DateTime
                    | Token::Not
                    | Token::LParen
            )
    }
}

/// Tokenize the whole source.
///
/// The first span no token matches is reported as `UnexpectedCharacters`.
pub fn tokenize(source: &str) -> Result<TokenStream, ParseError> {
    let mut tokens = Vec::new();
    for (result, span) in Token::lexer(source).spanned() {
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => {
                let (line, column) = line_column(source, span.start);
                return Err(ParseError::UnexpectedCharacters {
                    line,
                    column,
                    text: source[span].to_string(),
                });
            }
        }
    }
    tracing::trace!(count = tokens.len(), "tokenized source");
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|(token, _)| token)
            .collect()
    }

    #[test]
    fn test_key_value_tokens() {
        assert_eq!(
            kinds("skip-if = os == \"win\"\n"),
            vec![
                Token::Word,
                Token::Whitespace,
                Token::Equals,
                Token::Whitespace,
                Token::Word,
                Token::Whitespace,
                Token::CompareOp,
                Token::Whitespace,
                Token::BasicString,
                Token::Newline,
            ]
        );
    }

    #[test]
    fn test_literal_priorities() {
        assert_eq!(kinds("2020-01-01"), vec![Token::DateTime]);
        assert_eq!(kinds("1979-05-27T07:32:00Z"), vec![Token::DateTime]);
        assert_eq!(kinds("-5"), vec![Token::Integer]);
        assert_eq!(kinds("1_000"), vec![Token::Integer]);
        assert_eq!(kinds("3.14"), vec![Token::Float]);
        assert_eq!(kinds("true"), vec![Token::Word]);
        assert_eq!(kinds("foo.js"), vec![Token::Unquoted]);
        assert_eq!(kinds("data/**"), vec![Token::Unquoted]);
        assert_eq!(kinds("32bit"), vec![Token::Word]);
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("!a&&b||c!=d"),
            vec![
                Token::Not,
                Token::Word,
                Token::And,
                Token::Word,
                Token::Or,
                Token::Word,
                Token::CompareOp,
                Token::Word,
            ]
        );
        assert_eq!(kinds("a&b"), vec![Token::Word, Token::Symbol, Token::Word]);
    }

    #[test]
    fn test_strings() {
        assert_eq!(kinds(r#""a \"b\" c""#), vec![Token::BasicString]);
        assert_eq!(kinds("'C:\\path'"), vec![Token::LiteralString]);
        assert_eq!(kinds("\"\""), vec![Token::BasicString]);
        assert_eq!(kinds("\"\"\"one\ntwo\"\"\""), vec![Token::MlBasicString]);
        assert_eq!(kinds("'''one\ntwo'''"), vec![Token::MlLiteralString]);
    }

    #[test]
    fn test_apostrophe_inside_a_word() {
        assert_eq!(
            kinds("doesn't work"),
            vec![Token::Unquoted, Token::Whitespace, Token::Word]
        );
        assert_eq!(
            kinds("os == 'win'"),
            vec![
                Token::Word,
                Token::Whitespace,
                Token::CompareOp,
                Token::Whitespace,
                Token::LiteralString,
            ]
        );
        assert!(tokenize("a = 'open\n").is_err());
    }

    #[test]
    fn test_crlf_and_comments() {
        let tokens = tokenize("a = 1 # note\r\n").unwrap();
        let (last, span) = tokens.last().unwrap().clone();
        assert_eq!(last, Token::Newline);
        assert_eq!(span.len(), 2);
        assert!(tokens.iter().any(|(t, _)| *t == Token::Comment));
    }

    #[test]
    fn test_unterminated_string_is_lexical_error() {
        match tokenize("a = \"open\n") {
            Err(ParseError::UnexpectedCharacters { line, column, .. }) => {
                assert_eq!((line, column), (1, 5));
            }
            other => panic!("Expected lexical error, got {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_multiline_string() {
        assert!(matches!(
            tokenize("a = '''never closed\n"),
            Err(ParseError::UnexpectedCharacters { .. })
        ));
    }
}
