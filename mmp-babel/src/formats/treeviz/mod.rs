//! Treeviz formatter for the IR
//!
//! One line per node, nesting drawn with box characters:
//!
//! ```text
//! Manifest (illegal, 2 entries)
//! ├─ Table: DEFAULT
//! │ └─ Newline: "\n"
//! └─ KeyValue: tags
//!   ├─ BareKey: "tags"
//!   ├─ Whitespace: " "
//!   ├─ Equals: "="
//!   ├─ Whitespace: " "
//!   ├─ Expression: 1 child
//!   │ └─ UnquotedString: "a b"
//!   └─ Newline: "\n"
//! ```
//!
//! Lexeme labels are truncated to 30 characters.

use crate::error::FormatError;
use crate::format::Format;
use mmp_parser::mmp::{Manifest, Node, Rule};

pub struct TreevizFormat;

impl Format for TreevizFormat {
    fn name(&self) -> &str {
        "treeviz"
    }

    fn description(&self) -> &str {
        "Tree visualization of the IR, one line per node"
    }

    fn extension(&self) -> &str {
        "txt"
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn serialize(&self, manifest: &Manifest) -> Result<String, FormatError> {
        Ok(to_treeviz_str(manifest))
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let mut truncated = s.chars().take(max_chars).collect::<String>();
        truncated.push_str("...");
        truncated
    } else {
        s.to_string()
    }
}

pub fn to_treeviz_str(manifest: &Manifest) -> String {
    let root = manifest.root();
    let verdict = if manifest.is_legal() { "legal" } else { "illegal" };
    let mut result = format!(
        "{:?} ({}, {} entries)\n",
        root.tag(),
        verdict,
        root.children().len()
    );
    append_children(&mut result, root.children(), "");
    result
}

fn append_children(result: &mut String, children: &[Node], prefix: &str) {
    for (i, child) in children.iter().enumerate() {
        append_node(result, child, prefix, i == children.len() - 1);
    }
}

fn append_node(result: &mut String, node: &Node, prefix: &str, is_last: bool) {
    let connector = if is_last { "└─" } else { "├─" };
    result.push_str(&format!("{}{} {:?}: {}\n", prefix, connector, node.tag(), label(node)));

    let new_prefix = format!("{}{}", prefix, if is_last { "  " } else { "│ " });
    append_children(result, node.children(), &new_prefix);
}

fn label(node: &Node) -> String {
    match node {
        Node::Lexeme(lexeme) => format!("{:?}", truncate(lexeme.text(), 30)),
        Node::Syntax(syntax) => {
            if let Some(key) = syntax.table_key() {
                return key.text().to_string();
            }
            if let Some(Node::Lexeme(key)) = syntax.children().first() {
                if syntax.find(Rule::Equals).is_some() {
                    return key.text().to_string();
                }
            }
            match syntax.children().len() {
                1 => "1 child".to_string(),
                n => format!("{n} children"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mmp_parser::mmp::ManifestLoader;

    #[test]
    fn test_treeviz_lines() {
        let manifest = ManifestLoader::from_string("[DEFAULT]\ntags = a b\n")
            .manifest()
            .unwrap();
        insta::assert_snapshot!(to_treeviz_str(&manifest), @r###"
        Manifest (illegal, 2 entries)
        ├─ Table: DEFAULT
        │ └─ Newline: "\n"
        └─ KeyValue: tags
          ├─ BareKey: "tags"
          ├─ Whitespace: " "
          ├─ Equals: "="
          ├─ Whitespace: " "
          ├─ Expression: 1 child
          │ └─ UnquotedString: "a b"
          └─ Newline: "\n"
        "###);
    }

    #[test]
    fn test_long_lexemes_are_truncated() {
        let manifest = ManifestLoader::from_string(format!("# {}\n", "x".repeat(40)))
            .manifest()
            .unwrap();
        let output = to_treeviz_str(&manifest);
        assert!(output.contains(&format!("\"# {}...\"", "x".repeat(28))));
    }
}
