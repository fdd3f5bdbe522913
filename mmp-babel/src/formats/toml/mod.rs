//! TOML format
//!
//! Serialization renders the manifest as TOML. Parsing accepts anything the manifest grammar
//! accepts; in strict mode the result must already be legal TOML.

pub mod sort;

pub use sort::sort_sections;

use crate::error::FormatError;
use crate::format::{Format, Pipeline};
use crate::printer::{Printer, RenderMode, RenderOptions};
use mmp_parser::mmp::Manifest;

#[derive(Default)]
pub struct TomlFormat {
    options: RenderOptions,
    pipeline: Pipeline,
}

impl TomlFormat {
    pub fn new(options: RenderOptions, pipeline: Pipeline) -> Self {
        TomlFormat {
            options: options.with_mode(RenderMode::Toml),
            pipeline,
        }
    }
}

impl Format for TomlFormat {
    fn name(&self) -> &str {
        "toml"
    }

    fn description(&self) -> &str {
        "TOML test manifest"
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse(&self, source: &str) -> Result<Manifest, FormatError> {
        let manifest = self.pipeline.run(source)?;
        if self.options.strict_legality && !manifest.is_legal() {
            return Err(FormatError::LegalityViolation {
                format: self.name().to_string(),
            });
        }
        Ok(manifest)
    }

    fn serialize(&self, manifest: &Manifest) -> Result<String, FormatError> {
        Printer::new(self.options).render(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_legacy_source() {
        let format = TomlFormat::default();
        let manifest = format.parse("[DEFAULT]\nsupport-files = a.js b.js\n").unwrap();
        assert!(!manifest.is_legal());
        assert_eq!(
            format.serialize(&manifest).unwrap(),
            "[DEFAULT]\nsupport-files = [\"a.js\", \"b.js\"]\n"
        );
    }

    #[test]
    fn test_strict_parse_wants_legal_toml() {
        let strict = TomlFormat::new(
            RenderOptions::toml().with_strict_legality(true),
            Pipeline::default(),
        );
        assert!(strict.parse("[DEFAULT]\nskip-if = true\n").is_ok());
        assert!(matches!(
            strict.parse("[DEFAULT]\nskip-if = debug\n"),
            Err(FormatError::LegalityViolation { .. })
        ));
    }

    #[test]
    fn test_mode_is_forced() {
        let format = TomlFormat::new(RenderOptions::legacy(), Pipeline::default());
        let manifest = format.parse("[test_a.js]\n").unwrap();
        assert_eq!(format.serialize(&manifest).unwrap(), "[\"test_a.js\"]\n");
    }
}
