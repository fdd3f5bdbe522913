//! Prebuilt pipelines
//!
//! The statics use the manifest grammar and the default key tables. Use
//! [`manifest_transform`] for anything configured differently.

use crate::mmp::classification::KeyClassification;
use crate::mmp::grammar::Grammar;
use crate::mmp::ir::{Manifest, SyntaxNode};
use crate::mmp::parsing::SyntaxTree;
use crate::mmp::reduction::Reduced;
use crate::mmp::transforms::stages::{Normalization, Parsing, Reduction};
use crate::mmp::transforms::Transform;
use once_cell::sync::Lazy;
use std::sync::Arc;

pub type TreeTransform = Transform<String, SyntaxTree>;

pub type IrTransform = Transform<String, Reduced<SyntaxNode>>;

pub type ManifestTransform = Transform<String, Manifest>;

/// String → SyntaxTree
pub static STRING_TO_TREE: Lazy<TreeTransform> =
    Lazy::new(|| Transform::from_fn(Ok).then(Parsing::default()));

/// String → reduced IR (before normalization)
pub static STRING_TO_IR: Lazy<IrTransform> =
    Lazy::new(|| Transform::from_fn(Ok).then_transform(&*STRING_TO_TREE).then(Reduction::new()));

/// String → Manifest, the full pipeline.
pub static STRING_TO_MANIFEST: Lazy<ManifestTransform> =
    Lazy::new(|| manifest_transform(Arc::new(Grammar::manifest()), Arc::new(KeyClassification::default())));

/// The full pipeline over the given grammar and key tables.
pub fn manifest_transform(
    grammar: Arc<Grammar>,
    classification: Arc<KeyClassification>,
) -> ManifestTransform {
    Transform::from_fn(Ok)
        .then(Parsing::new(grammar))
        .then(Reduction::new())
        .then(Normalization::new(classification))
}
