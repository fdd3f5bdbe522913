//! Format trait definition
//!
//! Every format converts between text and a normalized [`Manifest`]. Formats can support
//! parsing, serialization, or both.

use crate::error::FormatError;
use mmp_parser::mmp::transforms::standard::{ManifestTransform, STRING_TO_MANIFEST};
use mmp_parser::mmp::Manifest;
use std::sync::Arc;

/// Trait for manifest formats
///
/// # Examples
///
/// ```ignore
/// struct Upper;
///
/// impl Format for Upper {
///     fn name(&self) -> &str {
///         "upper"
///     }
///
///     fn supports_serialization(&self) -> bool {
///         true
///     }
///
///     fn serialize(&self, manifest: &Manifest) -> Result<String, FormatError> {
///         Ok(format!("{:?}", manifest.root().tag()).to_uppercase())
///     }
/// }
/// ```
pub trait Format: Send + Sync {
    /// The name of this format (e.g., "toml", "ini", "treeviz")
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// File extension written by this format, without the dot
    fn extension(&self) -> &str {
        self.name()
    }

    fn supports_parsing(&self) -> bool {
        false
    }

    fn supports_serialization(&self) -> bool {
        false
    }

    /// Parse source text into a normalized manifest
    ///
    /// Default implementation returns NotSupported error.
    fn parse(&self, _source: &str) -> Result<Manifest, FormatError> {
        Err(FormatError::NotSupported(format!(
            "Format '{}' does not support parsing",
            self.name()
        )))
    }

    /// Serialize a manifest into text
    ///
    /// Default implementation returns NotSupported error.
    fn serialize(&self, _manifest: &Manifest) -> Result<String, FormatError> {
        Err(FormatError::NotSupported(format!(
            "Format '{}' does not support serialization",
            self.name()
        )))
    }
}

/// The pipeline a parsing format runs: the standard one unless configured otherwise.
#[derive(Clone, Default)]
pub struct Pipeline {
    transform: Option<Arc<ManifestTransform>>,
}

impl Pipeline {
    pub fn new(transform: Arc<ManifestTransform>) -> Self {
        Pipeline {
            transform: Some(transform),
        }
    }

    pub fn run(&self, source: &str) -> Result<Manifest, FormatError> {
        let transform = match &self.transform {
            Some(transform) => transform.as_ref(),
            None => &*STRING_TO_MANIFEST,
        };
        Ok(transform.run(source.to_string())?)
    }
}
