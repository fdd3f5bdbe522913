//! Parser
//!
//!     Recursive descent over the token stream, producing a [`SyntaxTree`] for the grammar
//!     documented in [`grammar`](crate::mmp::grammar). The parser is line-aware: a value ends
//!     at its line break unless the following lines are continuation lines (indented, not
//!     blank), in which case the value becomes an implicit array. Comment-only lines between
//!     continuation lines stay part of the value.
//!
//!     The tree is lossless: concatenating the text of all leaves gives back the input. The one
//!     exception is the `expression` start symbol, which drops a final line break.
//!
//!     Any error aborts the parse. Lexical errors surface as `UnexpectedCharacters`, structural
//!     ones as `UnexpectedToken` with the alternatives that would have been accepted.

pub mod tree;

pub use tree::SyntaxTree;

use crate::mmp::error::{line_column, ParseError};
use crate::mmp::grammar::{Grammar, Rule, StartRule};
use crate::mmp::lexing::{tokenize, Token, TokenStream};

/// Parse `source` from the grammar's start symbol.
pub fn parse(source: &str, grammar: &Grammar) -> Result<SyntaxTree, ParseError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser::new(source, tokens);
    let tree = match grammar.start() {
        StartRule::Manifest => parser.manifest()?,
        StartRule::Value => parser.value()?,
        StartRule::Expression => parser.standalone_expression()?,
    };
    tracing::debug!(
        start = grammar.start().name(),
        nodes = tree.size(),
        "parsed syntax tree"
    );
    Ok(tree)
}

/// `[A-Za-z0-9_-]+`
pub fn is_bare_key(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

const LINE_END: &[&str] = &["COMMENT", "NEWLINE"];
const AFTER_EXPRESSION: &[&str] = &["\"||\"", "\"&&\"", "CMP_OP", "COMMENT", "NEWLINE"];

struct Parser<'a> {
    source: &'a str,
    tokens: TokenStream,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, tokens: TokenStream) -> Self {
        Parser {
            source,
            tokens,
            pos: 0,
        }
    }

    // Cursor

    fn peek(&self) -> Option<Token> {
        self.token_at(self.pos)
    }

    fn token_at(&self, index: usize) -> Option<Token> {
        self.tokens.get(index).map(|(token, _)| *token)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(_, span)| span.start)
            .unwrap_or(self.source.len())
    }

    /// Consume the current token as a leaf tagged `rule`. Callers peek first.
    fn bump(&mut self, rule: Rule) -> SyntaxTree {
        let span = self.tokens[self.pos].1.clone();
        self.pos += 1;
        SyntaxTree::leaf(rule, &self.source[span.clone()], span)
    }

    fn empty(&self, rule: Rule) -> SyntaxTree {
        let at = self.offset();
        SyntaxTree::leaf(rule, "", at..at)
    }

    fn opt_ws(&mut self) -> SyntaxTree {
        match self.peek() {
            Some(Token::Whitespace) => self.bump(Rule::Whitespace),
            _ => self.empty(Rule::Whitespace),
        }
    }

    fn opt_comment(&mut self) -> Option<SyntaxTree> {
        match self.peek() {
            Some(Token::Comment) => Some(self.bump(Rule::Comment)),
            _ => None,
        }
    }

    /// A line break, or an empty one at the end of input.
    fn line_end(&mut self, expected: &[&str]) -> Result<SyntaxTree, ParseError> {
        match self.peek() {
            Some(Token::Newline) => Ok(self.bump(Rule::Newline)),
            None => Ok(self.empty(Rule::Newline)),
            Some(_) => Err(self.unexpected(expected)),
        }
    }

    fn unexpected(&self, expected: &[&str]) -> ParseError {
        let (line, column) = line_column(self.source, self.offset());
        let found = match self.tokens.get(self.pos) {
            Some((token, span)) => format!("{} {:?}", token.describe(), &self.source[span.clone()]),
            None => "end of input".to_string(),
        };
        ParseError::UnexpectedToken {
            line,
            column,
            found,
            expected: expected.iter().map(|e| e.to_string()).collect(),
        }
    }

    fn expect_end(&self) -> Result<(), ParseError> {
        match self.peek() {
            None => Ok(()),
            Some(_) => Err(self.unexpected(&["end of input"])),
        }
    }

    // Start symbols

    fn manifest(&mut self) -> Result<SyntaxTree, ParseError> {
        let mut lines = Vec::new();
        while let Some(token) = self.peek() {
            let line = match token {
                Token::Newline => {
                    SyntaxTree::node(Rule::BlankLine, vec![self.empty(Rule::Whitespace), self.bump(Rule::Newline)])
                }
                Token::Whitespace => match self.token_at(self.pos + 1) {
                    None | Some(Token::Newline) => {
                        let ws = self.bump(Rule::Whitespace);
                        let newline = self.line_end(LINE_END)?;
                        SyntaxTree::node(Rule::BlankLine, vec![ws, newline])
                    }
                    Some(Token::Comment) => self.comment_line()?,
                    Some(_) => {
                        // An indented line that does not continue a value
                        self.pos += 1;
                        return Err(self.unexpected(LINE_END));
                    }
                },
                Token::Comment => self.comment_line()?,
                Token::LBracket => self.table()?,
                Token::Word | Token::Integer | Token::BasicString | Token::LiteralString => {
                    self.key_value()?
                }
                _ => return Err(self.unexpected(&["key", "table", "COMMENT", "NEWLINE"])),
            };
            lines.push(line);
        }
        Ok(SyntaxTree::node(Rule::Manifest, lines))
    }

    /// The right hand side of a key: a key_value node without key and separator.
    fn value(&mut self) -> Result<SyntaxTree, ParseError> {
        let mut children = vec![self.opt_ws()];
        self.value_tail(&mut children)?;
        self.expect_end()?;
        Ok(SyntaxTree::node(Rule::KeyValue, children))
    }

    fn standalone_expression(&mut self) -> Result<SyntaxTree, ParseError> {
        let expression = self.expression()?;
        if self.peek() == Some(Token::Newline) {
            self.pos += 1;
        }
        self.expect_end()?;
        Ok(expression)
    }

    // Lines

    fn comment_line(&mut self) -> Result<SyntaxTree, ParseError> {
        let ws = self.opt_ws();
        let comment = self.bump(Rule::Comment);
        let newline = self.line_end(&["NEWLINE"])?;
        Ok(SyntaxTree::node(Rule::CommentLine, vec![ws, comment, newline]))
    }

    fn table(&mut self) -> Result<SyntaxTree, ParseError> {
        let mut children = vec![self.bump(Rule::LBracket), self.opt_ws()];
        children.push(self.table_key()?);
        children.push(self.opt_ws());
        if self.peek() != Some(Token::RBracket) {
            return Err(self.unexpected(&["\"]\""]));
        }
        children.push(self.bump(Rule::RBracket));
        children.push(self.opt_ws());
        children.extend(self.opt_comment());
        children.push(self.line_end(LINE_END)?);
        Ok(SyntaxTree::node(Rule::Table, children))
    }

    fn table_key(&mut self) -> Result<SyntaxTree, ParseError> {
        if let Some(token @ (Token::BasicString | Token::LiteralString)) = self.peek() {
            let mut next = self.pos + 1;
            if self.token_at(next) == Some(Token::Whitespace) {
                next += 1;
            }
            if self.token_at(next) == Some(Token::RBracket) {
                return self.string(token);
            }
        }

        // Anything else up to the closing bracket, minus trailing whitespace
        let start = self.pos;
        let mut end = start;
        let mut index = start;
        loop {
            match self.token_at(index) {
                Some(Token::RBracket) => break,
                None | Some(Token::Newline) => {
                    self.pos = index;
                    return Err(self.unexpected(&["\"]\""]));
                }
                Some(Token::Whitespace) => index += 1,
                Some(_) => {
                    index += 1;
                    end = index;
                }
            }
        }
        if end == start {
            return Err(self.unexpected(&["table_key"]));
        }
        let span = self.tokens[start].1.start..self.tokens[end - 1].1.end;
        self.pos = end;
        let text = &self.source[span.clone()];
        let rule = if is_bare_key(text) {
            Rule::BareKey
        } else {
            Rule::LegacyKey
        };
        Ok(SyntaxTree::leaf(rule, text, span))
    }

    fn key(&mut self) -> Result<SyntaxTree, ParseError> {
        match self.peek() {
            Some(token @ (Token::BasicString | Token::LiteralString)) => self.string(token),
            Some(Token::Word | Token::Integer) => {
                let span = self.tokens[self.pos].1.clone();
                if is_bare_key(&self.source[span]) {
                    Ok(self.bump(Rule::BareKey))
                } else {
                    Err(self.unexpected(&["key"]))
                }
            }
            _ => Err(self.unexpected(&["key"])),
        }
    }

    fn key_value(&mut self) -> Result<SyntaxTree, ParseError> {
        let mut children = vec![self.key()?, self.opt_ws()];
        if self.peek() != Some(Token::Equals) {
            return Err(self.unexpected(&["\"=\""]));
        }
        children.push(self.bump(Rule::Equals));
        children.push(self.opt_ws());
        self.value_tail(&mut children)?;
        Ok(SyntaxTree::node(Rule::KeyValue, children))
    }

    fn value_tail(&mut self, children: &mut Vec<SyntaxTree>) -> Result<(), ParseError> {
        if self.peek() == Some(Token::LBracket) {
            children.push(self.array()?);
            children.push(self.opt_ws());
            children.extend(self.opt_comment());
            children.push(self.line_end(LINE_END)?);
            return Ok(());
        }

        let expression = match self.peek() {
            Some(token) if token.starts_term() => Some(self.expression()?),
            _ => None,
        };
        let ws = self.opt_ws();
        let comment = self.opt_comment();
        let expected: &[&str] = if expression.is_some() {
            AFTER_EXPRESSION
        } else {
            &["expression", "COMMENT", "NEWLINE"]
        };
        let newline = self.line_end(expected)?;

        if self.continuation_follows() {
            let mut lines = Vec::new();
            lines.extend(expression);
            lines.push(ws);
            lines.extend(comment);
            lines.push(newline);
            while self.continuation_follows() {
                lines.push(self.continuation()?);
            }
            children.push(SyntaxTree::node(Rule::ImplicitArray, lines));
        } else {
            children.extend(expression);
            children.push(ws);
            children.extend(comment);
            children.push(newline);
        }
        Ok(())
    }

    /// At a line start: does an indented, non-blank line follow, possibly after
    /// comment-only lines?
    fn continuation_follows(&self) -> bool {
        let mut index = self.pos;
        loop {
            match (self.token_at(index), self.token_at(index + 1)) {
                (Some(Token::Whitespace), Some(next)) if next.starts_term() => return true,
                (Some(Token::Whitespace), Some(Token::Comment)) | (Some(Token::Comment), _) => {
                    match self.next_line_start(index) {
                        Some(next) => index = next,
                        None => return false,
                    }
                }
                _ => return false,
            }
        }
    }

    fn next_line_start(&self, from: usize) -> Option<usize> {
        (from..self.tokens.len())
            .find(|&i| self.token_at(i) == Some(Token::Newline))
            .map(|i| i + 1)
    }

    fn continuation(&mut self) -> Result<SyntaxTree, ParseError> {
        let indent = match self.peek() {
            Some(Token::Whitespace) => self.bump(Rule::Indent),
            _ => self.empty(Rule::Indent),
        };
        let mut children = vec![indent];
        let has_expression = matches!(self.peek(), Some(token) if token.starts_term());
        if has_expression {
            children.push(self.expression()?);
        }
        children.push(self.opt_ws());
        children.extend(self.opt_comment());
        let expected = if has_expression {
            AFTER_EXPRESSION
        } else {
            LINE_END
        };
        children.push(self.line_end(expected)?);
        Ok(SyntaxTree::node(Rule::Continuation, children))
    }

    fn array(&mut self) -> Result<SyntaxTree, ParseError> {
        let mut children = vec![self.bump(Rule::LBracket)];
        loop {
            match self.peek() {
                Some(Token::RBracket) => {
                    children.push(self.bump(Rule::RBracket));
                    return Ok(SyntaxTree::node(Rule::Array, children));
                }
                Some(Token::Whitespace) => children.push(self.bump(Rule::Whitespace)),
                Some(Token::Newline) => children.push(self.bump(Rule::Newline)),
                Some(Token::Comment) => children.push(self.bump(Rule::Comment)),
                Some(Token::Comma) => children.push(self.bump(Rule::Comma)),
                Some(token) if token.starts_term() => children.push(self.expression()?),
                _ => return Err(self.unexpected(&["expression", "\",\"", "\"]\""])),
            }
        }
    }

    // Condition language

    fn expression(&mut self) -> Result<SyntaxTree, ParseError> {
        let mut node = self.conjunction()?;
        loop {
            let save = self.pos;
            let ws = self.opt_ws();
            match self.peek() {
                Some(Token::Or) => {
                    let op = self.bump(Rule::OrOp);
                    let ws_after = self.opt_ws();
                    let rhs = self.conjunction()?;
                    node = SyntaxTree::node(Rule::Expression, vec![node, ws, op, ws_after, rhs]);
                }
                Some(token) if token.starts_term() && !ws.is_empty_leaf() => {
                    let rhs = self.conjunction()?;
                    node = SyntaxTree::node(Rule::Expression, vec![node, ws, rhs]);
                }
                _ => {
                    self.pos = save;
                    break;
                }
            }
        }
        Ok(match node {
            SyntaxTree::Node {
                rule: Rule::Expression,
                ..
            } => node,
            other => SyntaxTree::node(Rule::Expression, vec![other]),
        })
    }

    fn conjunction(&mut self) -> Result<SyntaxTree, ParseError> {
        let first = self.comparison()?;
        let mut rest = Vec::new();
        loop {
            let save = self.pos;
            let ws = self.opt_ws();
            if self.peek() != Some(Token::And) {
                self.pos = save;
                break;
            }
            let op = self.bump(Rule::AndOp);
            let ws_after = self.opt_ws();
            let rhs = self.comparison()?;
            rest.extend([ws, op, ws_after, rhs]);
        }
        if rest.is_empty() {
            return Ok(first);
        }
        let mut children = vec![first];
        children.append(&mut rest);
        Ok(SyntaxTree::node(Rule::Conjunction, children))
    }

    fn comparison(&mut self) -> Result<SyntaxTree, ParseError> {
        let lhs = self.unary()?;
        let save = self.pos;
        let ws = self.opt_ws();
        if self.peek() != Some(Token::CompareOp) {
            self.pos = save;
            return Ok(lhs);
        }
        let op = self.bump(Rule::CompareOp);
        let ws_after = self.opt_ws();
        let rhs = self.unary()?;
        Ok(SyntaxTree::node(Rule::Comparison, vec![lhs, ws, op, ws_after, rhs]))
    }

    fn unary(&mut self) -> Result<SyntaxTree, ParseError> {
        if self.peek() != Some(Token::Not) {
            return self.primary();
        }
        let op = self.bump(Rule::NotOp);
        let ws = self.opt_ws();
        let operand = self.unary()?;
        Ok(SyntaxTree::node(Rule::Negation, vec![op, ws, operand]))
    }

    fn primary(&mut self) -> Result<SyntaxTree, ParseError> {
        match self.peek() {
            Some(Token::LParen) => {
                let open = self.bump(Rule::LParen);
                let ws = self.opt_ws();
                let inner = self.expression()?;
                let ws_after = self.opt_ws();
                if self.peek() != Some(Token::RParen) {
                    return Err(self.unexpected(&["\")\""]));
                }
                let close = self.bump(Rule::RParen);
                Ok(SyntaxTree::node(Rule::Group, vec![open, ws, inner, ws_after, close]))
            }
            Some(token) if token.is_string() => self.string(token),
            Some(token) if token.starts_term() && token != Token::Not => self.atom(),
            _ => Err(self.unexpected(&["expression"])),
        }
    }

    // Atoms

    fn atom(&mut self) -> Result<SyntaxTree, ParseError> {
        let start = self.pos;
        let mut end = start + 1;
        while let (Some((_, previous)), Some((token, span))) =
            (self.tokens.get(end - 1), self.tokens.get(end))
        {
            if !token.is_word_like() || span.start != previous.end {
                break;
            }
            end += 1;
        }

        if end - start > 1 {
            let span = self.tokens[start].1.start..self.tokens[end - 1].1.end;
            self.pos = end;
            return Ok(SyntaxTree::leaf(
                Rule::Unquoted,
                &self.source[span.clone()],
                span,
            ));
        }

        let (token, span) = self.tokens[start].clone();
        Ok(match token {
            Token::Integer => self.signed(Rule::Integer),
            Token::Float => self.signed(Rule::Float),
            Token::DateTime => self.datetime(),
            Token::Word => {
                let text = &self.source[span];
                let rule = if text == "true" || text == "false" {
                    Rule::Boolean
                } else if is_identifier(text) {
                    Rule::Identifier
                } else {
                    Rule::Unquoted
                };
                self.bump(rule)
            }
            _ => self.bump(Rule::Unquoted),
        })
    }

    /// A numeric token split into its optional sign and the rest.
    fn signed(&mut self, rule: Rule) -> SyntaxTree {
        let span = self.tokens[self.pos].1.clone();
        self.pos += 1;
        let text = &self.source[span.clone()];
        let mut children = Vec::new();
        let digits = if text.starts_with(|c| c == '+' || c == '-') {
            children.push(SyntaxTree::leaf(
                Rule::Sign,
                &text[..1],
                span.start..span.start + 1,
            ));
            1
        } else {
            0
        };
        children.push(SyntaxTree::leaf(
            Rule::Digits,
            &text[digits..],
            span.start + digits..span.end,
        ));
        SyntaxTree::node(rule, children)
    }

    /// Date, optional time and optional offset subfields.
    fn datetime(&mut self) -> SyntaxTree {
        let span = self.tokens[self.pos].1.clone();
        self.pos += 1;
        let text = &self.source[span.clone()];
        let base = span.start;

        let mut children = vec![SyntaxTree::leaf(Rule::DatePart, &text[..10], base..base + 10)];
        let rest = &text[10..];
        if !rest.is_empty() {
            let offset_len = if rest.ends_with(['Z', 'z']) {
                1
            } else if rest.len() > 6 && matches!(rest.as_bytes()[rest.len() - 6], b'+' | b'-') {
                6
            } else {
                0
            };
            let time_end = 10 + rest.len() - offset_len;
            children.push(SyntaxTree::leaf(
                Rule::TimePart,
                &text[10..time_end],
                base + 10..base + time_end,
            ));
            if offset_len > 0 {
                children.push(SyntaxTree::leaf(
                    Rule::OffsetPart,
                    &text[time_end..],
                    base + time_end..span.end,
                ));
            }
        }
        SyntaxTree::node(Rule::DateTime, children)
    }

    /// A string token split into quotes, character runs and escapes.
    fn string(&mut self, token: Token) -> Result<SyntaxTree, ParseError> {
        let span = self.tokens[self.pos].1.clone();
        let (rule, delimiter) = match token {
            Token::BasicString => (Rule::BasicString, 1),
            Token::LiteralString => (Rule::LiteralString, 1),
            Token::MlBasicString => (Rule::MlBasicString, 3),
            _ => (Rule::MlLiteralString, 3),
        };
        let inner = span.start + delimiter..span.end - delimiter;

        let mut children = vec![SyntaxTree::leaf(
            Rule::Quote,
            &self.source[span.start..inner.start],
            span.start..inner.start,
        )];
        match rule {
            Rule::BasicString | Rule::MlBasicString => {
                children.extend(self.basic_content(inner.clone(), rule == Rule::MlBasicString)?)
            }
            _ if !inner.is_empty() => children.push(SyntaxTree::leaf(
                Rule::Chars,
                &self.source[inner.clone()],
                inner.clone(),
            )),
            _ => {}
        }
        children.push(SyntaxTree::leaf(
            Rule::Quote,
            &self.source[inner.end..span.end],
            inner.end..span.end,
        ));
        self.pos += 1;
        Ok(SyntaxTree::node(rule, children))
    }

    fn basic_content(
        &self,
        range: std::ops::Range<usize>,
        multiline: bool,
    ) -> Result<Vec<SyntaxTree>, ParseError> {
        let content = &self.source[range.clone()];
        let mut leaves = Vec::new();
        let mut run_start = 0;
        let mut chars = content.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if c != '\\' {
                continue;
            }
            if run_start < i {
                let at = range.start + run_start..range.start + i;
                leaves.push(SyntaxTree::leaf(Rule::Chars, &content[run_start..i], at));
            }
            let len = match escape_length(&content[i..], multiline) {
                Some(len) => len,
                None => {
                    let (line, column) = line_column(self.source, range.start + i);
                    return Err(ParseError::UnexpectedCharacters {
                        line,
                        column,
                        text: content[i..].chars().take(2).collect(),
                    });
                }
            };
            let at = range.start + i..range.start + i + len;
            leaves.push(SyntaxTree::leaf(Rule::Escape, &content[i..i + len], at));
            while chars.peek().is_some_and(|(j, _)| *j < i + len) {
                chars.next();
            }
            run_start = i + len;
        }
        if run_start < content.len() {
            let at = range.start + run_start..range.end;
            leaves.push(SyntaxTree::leaf(Rule::Chars, &content[run_start..], at));
        }
        Ok(leaves)
    }
}

/// Byte length of the escape sequence at the start of `text` (which starts with a
/// backslash), or `None` when it is not a valid escape.
fn escape_length(text: &str, multiline: bool) -> Option<usize> {
    let hex = |digits: usize| -> Option<u32> {
        let field = text.get(2..2 + digits)?;
        if field.chars().all(|c| c.is_ascii_hexdigit()) {
            u32::from_str_radix(field, 16).ok()
        } else {
            None
        }
    };
    match text[1..].chars().next()? {
        'n' | 't' | 'r' | 'b' | 'f' | '"' | '\\' => Some(2),
        'x' => hex(2).map(|_| 4),
        'u' => hex(4).and_then(char::from_u32).map(|_| 6),
        'U' => hex(8).and_then(char::from_u32).map(|_| 10),
        ' ' | '\t' | '\r' | '\n' if multiline => {
            // Line-ending backslash: whitespace up to and including the line break
            let rest = &text[1..];
            let trimmed = rest.trim_start_matches([' ', '\t']);
            let newline = if trimmed.starts_with("\r\n") {
                2
            } else if trimmed.starts_with('\n') {
                1
            } else {
                return None;
            };
            Some(1 + rest.len() - trimmed.len() + newline)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_manifest(source: &str) -> SyntaxTree {
        parse(source, &Grammar::manifest()).unwrap()
    }

    fn rules(tree: &SyntaxTree) -> Vec<Rule> {
        tree.children().iter().map(|c| c.rule()).collect()
    }

    #[test]
    fn test_tree_is_lossless() {
        let sources = [
            "[DEFAULT]\nhead = head.js\n\n# comment\n[test_a.js]\nskip-if = os == \"win\" # bug 1\n",
            "[test_b.js]\r\nskip-if =\r\n  debug\r\n  (os == 'mac' && !fission)\r\n",
            "support-files = [\n  \"a.js\", # first\n  \"b.js\",\n]\n",
            "no-newline = 1",
            "when = 1979-05-27T07:32:00-08:00\nratio = -1.5e3\n",
        ];
        for source in sources {
            assert_eq!(parse_manifest(source).text(), source);
        }
    }

    #[test]
    fn test_manifest_lines() {
        let tree = parse_manifest("# c\n\n[a]\nk = v\n");
        assert_eq!(
            rules(&tree),
            vec![Rule::CommentLine, Rule::BlankLine, Rule::Table, Rule::KeyValue]
        );
    }

    #[test]
    fn test_table_keys() {
        let tree = parse_manifest("[DEFAULT]\n[test_foo.js]\n[\"quoted.js\"]\n[include:other.ini]\n");
        let keys: Vec<Rule> = tree
            .children()
            .iter()
            .map(|table| table.children()[2].rule())
            .collect();
        assert_eq!(
            keys,
            vec![Rule::BareKey, Rule::LegacyKey, Rule::BasicString, Rule::LegacyKey]
        );
    }

    #[test]
    fn test_legacy_key_with_spaces() {
        let tree = parse_manifest("[test one.html ]\n");
        let key = &tree.children()[0].children()[2];
        assert_eq!(key.rule(), Rule::LegacyKey);
        assert_eq!(key.text(), "test one.html");
    }

    #[test]
    fn test_implicit_array_from_continuation_lines() {
        let tree = parse_manifest("skip-if =\n  os == \"win\"\n  # note\n  debug\n\n[b]\n");
        let key_value = &tree.children()[0];
        let implicit = key_value
            .children()
            .iter()
            .find(|c| c.rule() == Rule::ImplicitArray)
            .unwrap();
        let continuations: Vec<_> = implicit
            .children()
            .iter()
            .filter(|c| c.rule() == Rule::Continuation)
            .collect();
        assert_eq!(continuations.len(), 3);
        assert_eq!(rules(&tree)[1..], [Rule::BlankLine, Rule::Table]);
    }

    #[test]
    fn test_trailing_comment_lines_are_not_continuations() {
        let tree = parse_manifest("a = 1\n  # trailing\n");
        assert_eq!(rules(&tree), vec![Rule::KeyValue, Rule::CommentLine]);
    }

    #[test]
    fn test_implicit_or_and_precedence() {
        let tree = parse(
            "a b || c && !d == e",
            &Grammar::with_start(StartRule::Expression),
        )
        .unwrap();
        assert_eq!(tree.rule(), Rule::Expression);
        // ((a b) || (c && (!d == e)))
        let children = tree.children();
        assert_eq!(children[0].rule(), Rule::Expression);
        assert_eq!(children[2].rule(), Rule::OrOp);
        assert_eq!(children[4].rule(), Rule::Conjunction);
        let comparison = &children[4].children()[4];
        assert_eq!(comparison.rule(), Rule::Comparison);
        assert_eq!(comparison.children()[0].rule(), Rule::Negation);
    }

    #[test]
    fn test_word_gluing() {
        let tree = parse("dom.foo=true data/**", &Grammar::with_start(StartRule::Expression)).unwrap();
        let inner = &tree.children()[0];
        assert_eq!(inner.rule(), Rule::Unquoted);
        assert_eq!(inner.text(), "dom.foo=true");
        assert_eq!(tree.children()[2].text(), "data/**");
    }

    #[test]
    fn test_atom_classification() {
        let expression = Grammar::with_start(StartRule::Expression);
        let atom = |source: &str| parse(source, &expression).unwrap().children()[0].rule();
        assert_eq!(atom("true"), Rule::Boolean);
        assert_eq!(atom("debug"), Rule::Identifier);
        assert_eq!(atom("foo-bar"), Rule::Unquoted);
        assert_eq!(atom("+42"), Rule::Integer);
        assert_eq!(atom("2.5"), Rule::Float);
        assert_eq!(atom("2021-01-01"), Rule::DateTime);
        assert_eq!(atom("'lit'"), Rule::LiteralString);
    }

    #[test]
    fn test_string_escapes_split() {
        let tree = parse(r#""a\tb\u00e9""#, &Grammar::with_start(StartRule::Expression)).unwrap();
        let string = &tree.children()[0];
        assert_eq!(
            rules(string),
            vec![
                Rule::Quote,
                Rule::Chars,
                Rule::Escape,
                Rule::Chars,
                Rule::Escape,
                Rule::Quote
            ]
        );
    }

    #[test]
    fn test_invalid_escape_is_lexical_error() {
        match parse("k = \"bad \\q\"\n", &Grammar::manifest()) {
            Err(ParseError::UnexpectedCharacters { line, column, text }) => {
                assert_eq!((line, column), (1, 10));
                assert_eq!(text, "\\q");
            }
            other => panic!("Expected lexical error, got {:?}", other),
        }
    }

    #[test]
    fn test_structural_error_position() {
        match parse("[a]\nk = (os\n", &Grammar::manifest()) {
            Err(ParseError::UnexpectedToken {
                line,
                column,
                expected,
                ..
            }) => {
                assert_eq!((line, column), (2, 8));
                assert_eq!(expected, vec!["\")\"".to_string()]);
            }
            other => panic!("Expected structural error, got {:?}", other),
        }
    }

    #[test]
    fn test_indented_key_is_rejected() {
        assert!(matches!(
            parse("[a]\n  k = 1\n", &Grammar::manifest()),
            Err(ParseError::UnexpectedToken { line: 2, .. })
        ));
    }

    #[test]
    fn test_value_start_symbol() {
        let tree = parse(" [1, 2] # c\n", &Grammar::with_start(StartRule::Value)).unwrap();
        assert_eq!(tree.rule(), Rule::KeyValue);
        assert_eq!(tree.children()[1].rule(), Rule::Array);
    }

    #[test]
    fn test_key_without_value() {
        let tree = parse_manifest("head =\n");
        assert_eq!(
            rules(&tree.children()[0]),
            vec![
                Rule::BareKey,
                Rule::Whitespace,
                Rule::Equals,
                Rule::Whitespace,
                Rule::Whitespace,
                Rule::Newline
            ]
        );
    }

    #[test]
    fn test_multiline_string_line_ending_backslash() {
        let source = "k = \"\"\"one \\\n  two\"\"\"\n";
        let tree = parse_manifest(source);
        assert_eq!(tree.text(), source);
    }
}
