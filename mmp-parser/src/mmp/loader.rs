//! Manifest loading
//!
//! `ManifestLoader` reads a manifest from a file, raw bytes or a string and runs transforms
//! over it. Files are read as bytes and decoded as UTF-8 without touching line endings, so
//! CRLF sources stay CRLF.
//!
//! ```rust,ignore
//! use mmp_parser::mmp::loader::ManifestLoader;
//!
//! let manifest = ManifestLoader::from_path("xpcshell.ini")?.manifest()?;
//! let tree = ManifestLoader::from_string("[DEFAULT]\n").parse()?;
//! ```

use crate::mmp::ir::{Manifest, SyntaxNode};
use crate::mmp::parsing::SyntaxTree;
use crate::mmp::reduction::Reduced;
use crate::mmp::transforms::standard::{STRING_TO_IR, STRING_TO_MANIFEST, STRING_TO_TREE};
use crate::mmp::transforms::{Transform, TransformError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{origin} is not valid UTF-8: {source}")]
    Decode {
        origin: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error(transparent)]
    Transform(#[from] TransformError),
}

pub struct ManifestLoader {
    source: String,
    origin: Option<PathBuf>,
}

impl ManifestLoader {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LoaderError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| LoaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let source = String::from_utf8(bytes).map_err(|source| LoaderError::Decode {
            origin: path.display().to_string(),
            source,
        })?;
        tracing::debug!(path = %path.display(), bytes = source.len(), "loaded manifest");
        Ok(ManifestLoader {
            source,
            origin: Some(path.to_path_buf()),
        })
    }

    /// Decode raw bytes (for instance standard input).
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, LoaderError> {
        let source = String::from_utf8(bytes).map_err(|source| LoaderError::Decode {
            origin: "input".to_string(),
            source,
        })?;
        Ok(Self::from_string(source))
    }

    pub fn from_string<S: Into<String>>(source: S) -> Self {
        ManifestLoader {
            source: source.into(),
            origin: None,
        }
    }

    /// Run any transform over the source.
    pub fn with<O>(&self, transform: &Transform<String, O>) -> Result<O, LoaderError> {
        Ok(transform.run(self.source.clone())?)
    }

    pub fn parse(&self) -> Result<SyntaxTree, LoaderError> {
        self.with(&*STRING_TO_TREE)
    }

    /// The reduced IR, before normalization.
    pub fn reduce(&self) -> Result<Reduced<SyntaxNode>, LoaderError> {
        self.with(&*STRING_TO_IR)
    }

    /// The normalized manifest under the default grammar and key tables.
    pub fn manifest(&self) -> Result<Manifest, LoaderError> {
        self.with(&*STRING_TO_MANIFEST)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mmp::error::ParseError;
    use crate::mmp::grammar::Rule;
    use std::io::Write;

    #[test]
    fn test_from_string() {
        let loader = ManifestLoader::from_string("[DEFAULT]\n");
        assert_eq!(loader.source(), "[DEFAULT]\n");
        assert!(loader.origin().is_none());
        assert_eq!(loader.parse().unwrap().rule(), Rule::Manifest);
    }

    #[test]
    fn test_from_path_keeps_crlf() {
        let dir = std::env::temp_dir().join(format!("mmp-loader-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("crlf.ini");
        fs::File::create(&path)
            .unwrap()
            .write_all(b"[a]\r\nk = 1\r\n")
            .unwrap();

        let loader = ManifestLoader::from_path(&path).unwrap();
        assert_eq!(loader.source(), "[a]\r\nk = 1\r\n");
        assert_eq!(loader.manifest().unwrap().newline(), "\r\n");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file() {
        let result = ManifestLoader::from_path("/nonexistent/mmp/manifest.ini");
        assert!(matches!(result, Err(LoaderError::Io { .. })));
    }

    #[test]
    fn test_invalid_utf8() {
        let result = ManifestLoader::from_bytes(vec![b'k', b' ', b'=', b' ', 0xff, b'\n']);
        match result {
            Err(err @ LoaderError::Decode { .. }) => {
                assert!(err.to_string().starts_with("input is not valid UTF-8"))
            }
            other => panic!("Expected decode error, got {:?}", other.map(|l| l.source().to_string())),
        }
    }

    #[test]
    fn test_transform_errors_are_wrapped() {
        let result = ManifestLoader::from_string("k = (\n").manifest();
        assert!(matches!(
            result,
            Err(LoaderError::Transform(TransformError::Parse(
                ParseError::UnexpectedToken { .. }
            )))
        ));
    }
}
