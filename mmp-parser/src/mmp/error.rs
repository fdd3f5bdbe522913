//! Parse errors
//!
//! Positions are 1-based line and column numbers (columns count characters, not bytes).

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The grammar could not be loaded (unknown start symbol).
    #[error("grammar configuration error: {0}")]
    Configuration(String),

    /// Input that no token of the grammar matches.
    #[error("unexpected characters {text:?} at line {line}, column {column}")]
    UnexpectedCharacters {
        line: usize,
        column: usize,
        text: String,
    },

    /// A token that does not fit the structure at this point.
    #[error(
        "unexpected {found} at line {line}, column {column} (expected {})",
        expected.join(" or ")
    )]
    UnexpectedToken {
        line: usize,
        column: usize,
        found: String,
        expected: Vec<String>,
    },
}

impl ParseError {
    /// Position of the error, when it has one.
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            ParseError::Configuration(_) => None,
            ParseError::UnexpectedCharacters { line, column, .. }
            | ParseError::UnexpectedToken { line, column, .. } => Some((*line, *column)),
        }
    }
}

/// Convert a byte offset into a 1-based (line, column) pair.
pub fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = &source[..floor_char_boundary(source, offset)];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

fn floor_char_boundary(source: &str, mut offset: usize) -> usize {
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_column() {
        let source = "a = 1\nbc = 2\r\nd";
        assert_eq!(line_column(source, 0), (1, 1));
        assert_eq!(line_column(source, 4), (1, 5));
        assert_eq!(line_column(source, 6), (2, 1));
        assert_eq!(line_column(source, 8), (2, 3));
        assert_eq!(line_column(source, source.len() - 1), (3, 1));
    }

    #[test]
    fn test_unexpected_token_display() {
        let err = ParseError::UnexpectedToken {
            line: 3,
            column: 7,
            found: "\"]\"".to_string(),
            expected: vec!["expression".to_string(), "NEWLINE".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "unexpected \"]\" at line 3, column 7 (expected expression or NEWLINE)"
        );
        assert_eq!(err.position(), Some((3, 7)));
    }
}
