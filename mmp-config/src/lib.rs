//! Shared configuration loader for the mmp toolchain.
//!
//! `defaults/mmp.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer user-specific files on top
//! of those defaults via [`Loader`] before deserializing into [`MmpConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File, FileFormat, ValueKind};
use mmp_babel::{RenderMode, RenderOptions};
use mmp_parser::mmp::{ClassificationError, KeyClassification};
use serde::Deserialize;
use std::path::Path;

pub use config::ConfigError;

const DEFAULT_TOML: &str = include_str!("../defaults/mmp.default.toml");

/// Top-level configuration consumed by mmp applications.
#[derive(Debug, Clone, Deserialize)]
pub struct MmpConfig {
    pub convert: ConvertConfig,
    pub keys: KeysConfig,
    pub discovery: DiscoveryConfig,
}

/// Mirrors the knobs exposed by the printer. `explicit-or` only applies to TOML output; the
/// legacy dialect keeps implicit ORs implicit.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConvertConfig {
    pub target: Target,
    pub strict: bool,
    pub debug_parenthesize: bool,
    pub explicit_or: bool,
}

impl ConvertConfig {
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            mode: self.target.mode(),
            strict_legality: self.strict,
            debug_parenthesize: self.debug_parenthesize,
            explicit_or: self.explicit_or && self.target == Target::Toml,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Target {
    Toml,
    Ini,
}

impl Target {
    pub fn mode(self) -> RenderMode {
        match self {
            Target::Toml => RenderMode::Toml,
            Target::Ini => RenderMode::Legacy,
        }
    }

    /// Name of the format that writes this target.
    pub fn format_name(self) -> &'static str {
        self.mode().name()
    }
}

/// Key classification tables.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct KeysConfig {
    pub conditional_suffix: String,
    pub always_array: Vec<String>,
    pub unquoted_string: Vec<String>,
}

impl KeysConfig {
    pub fn to_classification(&self) -> Result<KeyClassification, ClassificationError> {
        KeyClassification::new(
            self.conditional_suffix.as_str(),
            self.always_array.iter().map(String::as_str),
            self.unquoted_string.iter().map(String::as_str),
        )
    }
}

/// Controls `mmp find`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DiscoveryConfig {
    #[serde(rename = "match")]
    pub pattern: String,
    pub skip_prefix: String,
    pub follow_includes: bool,
    pub ignore_includes: bool,
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<MmpConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<MmpConfig, ConfigError> {
    Loader::new().build()
}
