//! Pipeline stages
//!
//! Each stage wraps one step of the conversion as a [`Runnable`].

use crate::mmp::classification::KeyClassification;
use crate::mmp::grammar::Grammar;
use crate::mmp::ir::{Manifest, SyntaxNode};
use crate::mmp::normalization::Normalizer;
use crate::mmp::parsing::{parse, SyntaxTree};
use crate::mmp::reduction::{reduce, Reduced};
use crate::mmp::transforms::{Runnable, TransformError};
use std::sync::Arc;

/// Source text to syntax tree.
pub struct Parsing {
    grammar: Arc<Grammar>,
}

impl Parsing {
    pub fn new(grammar: Arc<Grammar>) -> Self {
        Parsing { grammar }
    }
}

impl Default for Parsing {
    fn default() -> Self {
        Self::new(Arc::new(Grammar::manifest()))
    }
}

impl Runnable<String, SyntaxTree> for Parsing {
    fn run(&self, input: String) -> Result<SyntaxTree, TransformError> {
        Ok(parse(&input, &self.grammar)?)
    }
}

/// Syntax tree to IR, with the legality verdict of the pass.
#[derive(Default)]
pub struct Reduction;

impl Reduction {
    pub fn new() -> Self {
        Reduction
    }
}

impl Runnable<SyntaxTree, Reduced<SyntaxNode>> for Reduction {
    fn run(&self, input: SyntaxTree) -> Result<Reduced<SyntaxNode>, TransformError> {
        Ok(reduce(&input))
    }
}

/// Reduced IR to a normalized manifest.
pub struct Normalization {
    normalizer: Normalizer,
}

impl Normalization {
    pub fn new(classification: Arc<KeyClassification>) -> Self {
        Normalization {
            normalizer: Normalizer::new(classification),
        }
    }
}

impl Default for Normalization {
    fn default() -> Self {
        Self::new(Arc::new(KeyClassification::default()))
    }
}

impl Runnable<Reduced<SyntaxNode>, Manifest> for Normalization {
    fn run(&self, input: Reduced<SyntaxNode>) -> Result<Manifest, TransformError> {
        Ok(self.normalizer.normalize(input))
    }
}
