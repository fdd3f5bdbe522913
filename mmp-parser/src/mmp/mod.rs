//! Main module for mmp library functionality

pub mod classification;
pub mod error;
pub mod grammar;
pub mod ir;
pub mod lexing;
pub mod loader;
pub mod normalization;
pub mod parsing;
pub mod reduction;
pub mod transforms;

pub use classification::{ClassificationError, KeyClass, KeyClassification};
pub use error::ParseError;
pub use grammar::{Grammar, Rule, StartRule};
pub use ir::{Lexeme, Manifest, Node, SyntaxNode};
pub use loader::{LoaderError, ManifestLoader};
pub use normalization::{Normalizer, Shape};
pub use parsing::{parse, SyntaxTree};
pub use reduction::{Legality, Reduced};
