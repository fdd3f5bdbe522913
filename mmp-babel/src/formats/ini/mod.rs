//! Legacy INI format
//!
//! The dialect the manifests were written in before TOML. Serialization renders in legacy
//! mode, which puts a converted manifest back into INI form.

use crate::error::FormatError;
use crate::format::{Format, Pipeline};
use crate::printer::{Printer, RenderMode, RenderOptions};
use mmp_parser::mmp::Manifest;

pub struct IniFormat {
    options: RenderOptions,
    pipeline: Pipeline,
}

impl IniFormat {
    pub fn new(options: RenderOptions, pipeline: Pipeline) -> Self {
        IniFormat {
            options: options.with_mode(RenderMode::Legacy),
            pipeline,
        }
    }
}

impl Default for IniFormat {
    fn default() -> Self {
        Self::new(RenderOptions::legacy(), Pipeline::default())
    }
}

impl Format for IniFormat {
    fn name(&self) -> &str {
        "ini"
    }

    fn description(&self) -> &str {
        "Legacy INI test manifest"
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse(&self, source: &str) -> Result<Manifest, FormatError> {
        self.pipeline.run(source)
    }

    fn serialize(&self, manifest: &Manifest) -> Result<String, FormatError> {
        Printer::new(self.options).render(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_back_to_ini() {
        let format = IniFormat::default();
        let manifest = format
            .parse("[\"test_a.js\"]\nskip-if = [\"os == 'win'\"]\ntags = \"a b\"\n")
            .unwrap();
        assert_eq!(
            format.serialize(&manifest).unwrap(),
            "[test_a.js]\nskip-if = os == 'win'\ntags = a b\n"
        );
    }

    #[test]
    fn test_ini_round_trip() {
        let source = "[DEFAULT]\nhead = head.js\nskip-if = os == \"mac\" # bug 3\n\n[test_a.js]\n";
        let format = IniFormat::default();
        let manifest = format.parse(source).unwrap();
        assert_eq!(format.serialize(&manifest).unwrap(), source);
    }
}
