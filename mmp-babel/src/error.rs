//! Format errors

use mmp_parser::mmp::transforms::TransformError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Format '{0}' not found")]
    FormatNotFound(String),

    #[error("{0}")]
    NotSupported(String),

    /// Strict rendering of a manifest that was not legal TOML to begin with.
    #[error("input is not legal TOML; refusing to render {format} in strict mode")]
    LegalityViolation { format: String },

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("invalid TOML: {0}")]
    InvalidToml(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}
