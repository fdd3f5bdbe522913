//! Section sorting
//!
//! Re-emits a TOML manifest. With sorting on, the `DEFAULT` section comes first and every
//! other section follows in alphabetical order, its header written as a literal key. Comments,
//! blank lines inside a section and the order of keys within a section survive as written;
//! sections end up separated by one blank line.
//!
//! The document goes through the manifest parser and reduction only, never normalization, so
//! no value is reshaped. The TOML printer renders the reordered tree.

use crate::error::FormatError;
use crate::printer::{Printer, RenderOptions};
use mmp_parser::mmp::transforms::standard::STRING_TO_IR;
use mmp_parser::mmp::{Lexeme, Manifest, Node, Rule, SyntaxNode};

const DEFAULT_SECTION: &str = "DEFAULT";

/// A table header and everything up to the next one.
struct Section {
    name: String,
    nodes: Vec<Node>,
}

/// Validate `source` as TOML and re-emit it, sorting its sections when `alpha_sort` is set.
pub fn sort_sections(source: &str, alpha_sort: bool) -> Result<String, FormatError> {
    toml::from_str::<toml::Table>(source)?;
    if !alpha_sort {
        return Ok(source.to_string());
    }

    let mut text = source.to_string();
    if !text.is_empty() && !text.ends_with('\n') {
        text.push_str(if text.contains("\r\n") { "\r\n" } else { "\n" });
    }
    let reduced = STRING_TO_IR.run(text)?;
    let root = match reduced.value.tag() {
        Rule::Manifest => reduced.value,
        _ => SyntaxNode::new(Rule::Manifest, vec![Node::Syntax(reduced.value)]),
    };
    let manifest = Manifest::new(root, reduced.legality.is_legal());
    let newline = manifest.newline().to_string();

    let mut preamble = Vec::new();
    let mut sections: Vec<Section> = Vec::new();
    for child in manifest.root().children() {
        match child {
            Node::Syntax(table) if table.tag() == Rule::Table => {
                let name = table
                    .table_key()
                    .map(|key| key.text().to_string())
                    .unwrap_or_default();
                sections.push(Section {
                    nodes: vec![Node::Syntax(literal_header(table, &name))],
                    name,
                });
            }
            other => match sections.last_mut() {
                Some(section) => section.nodes.push(other.clone()),
                None => preamble.push(other.clone()),
            },
        }
    }
    sections.sort_by(|a, b| {
        (a.name != DEFAULT_SECTION, &a.name).cmp(&(b.name != DEFAULT_SECTION, &b.name))
    });

    let count = sections.len();
    let mut children = preamble;
    for (index, mut section) in sections.into_iter().enumerate() {
        while section.nodes.last().map(Node::tag) == Some(Rule::BlankLine) {
            section.nodes.pop();
        }
        children.extend(section.nodes);
        if index + 1 < count {
            children.push(Node::syntax(
                Rule::BlankLine,
                vec![Node::lexeme(Rule::Newline, newline.as_str())],
            ));
        }
    }

    tracing::debug!(sections = count, "sorted manifest sections");
    let sorted = Manifest::new(SyntaxNode::new(Rule::Manifest, children), manifest.is_legal());
    Printer::new(RenderOptions::toml()).render(&sorted)
}

/// The header with its name as a literal key, unless the name needs escapes or is `DEFAULT`.
fn literal_header(table: &SyntaxNode, name: &str) -> SyntaxNode {
    if name == DEFAULT_SECTION || name.is_empty() || name.contains(['\'', '\\']) {
        return table.clone();
    }
    SyntaxNode::table(
        Lexeme::new(Rule::LiteralString, name),
        table.children().to_vec(),
    )
}
