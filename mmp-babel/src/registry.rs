//! Format registry for format discovery and selection

use crate::error::FormatError;
use crate::format::{Format, Pipeline};
use crate::formats::{IniFormat, JsonFormat, TomlFormat, TreevizFormat};
use crate::printer::RenderOptions;
use mmp_parser::mmp::Manifest;
use std::collections::HashMap;

/// Registry of manifest formats, by name
///
/// # Examples
///
/// ```ignore
/// let registry = FormatRegistry::with_defaults();
/// let manifest = registry.parse(source, "ini")?;
/// let toml = registry.serialize(&manifest, "toml")?;
/// ```
pub struct FormatRegistry {
    formats: HashMap<String, Box<dyn Format>>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        FormatRegistry {
            formats: HashMap::new(),
        }
    }

    /// Register a format
    ///
    /// If a format with the same name already exists, it will be replaced.
    pub fn register<F: Format + 'static>(&mut self, format: F) {
        self.formats
            .insert(format.name().to_string(), Box::new(format));
    }

    pub fn get(&self, name: &str) -> Result<&dyn Format, FormatError> {
        self.formats
            .get(name)
            .map(|f| f.as_ref())
            .ok_or_else(|| FormatError::FormatNotFound(name.to_string()))
    }

    pub fn has(&self, name: &str) -> bool {
        self.formats.contains_key(name)
    }

    /// List all available format names (sorted)
    pub fn list_formats(&self) -> Vec<String> {
        let mut names: Vec<_> = self.formats.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn parse(&self, source: &str, format: &str) -> Result<Manifest, FormatError> {
        let fmt = self.get(format)?;
        if !fmt.supports_parsing() {
            return Err(FormatError::NotSupported(format!(
                "Format '{}' does not support parsing",
                format
            )));
        }
        fmt.parse(source)
    }

    pub fn serialize(&self, manifest: &Manifest, format: &str) -> Result<String, FormatError> {
        let fmt = self.get(format)?;
        if !fmt.supports_serialization() {
            return Err(FormatError::NotSupported(format!(
                "Format '{}' does not support serialization",
                format
            )));
        }
        fmt.serialize(manifest)
    }

    /// The built-in formats, rendering with `options` and parsing through `pipeline`.
    pub fn configured(options: RenderOptions, pipeline: Pipeline) -> Self {
        let mut registry = Self::new();
        registry.register(TomlFormat::new(options, pipeline.clone()));
        registry.register(IniFormat::new(options, pipeline));
        registry.register(TreevizFormat);
        registry.register(JsonFormat);
        registry
    }

    /// Create a registry with default formats
    pub fn with_defaults() -> Self {
        let mut registry = Self::configured(RenderOptions::toml(), Pipeline::default());
        registry.register(IniFormat::default());
        registry
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
