//! `mmp convert`
//!
//! Every file runs through its own parse, normalization and render. The grammar and the key
//! tables are shared. Several files are converted in parallel; results are reported in the
//! order the paths were given.

use mmp_babel::{FormatError, FormatRegistry};
use mmp_parser::mmp::{LoaderError, ManifestLoader};
use rayon::prelude::*;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Path that stands for standard input.
pub const STDIN: &str = "-";

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Load(#[from] LoaderError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("cannot read standard input: {0}")]
    Stdin(#[source] std::io::Error),

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub struct Converter<'a> {
    registry: &'a FormatRegistry,
    target: &'a str,
}

/// What happened to one input.
pub struct Converted {
    pub path: PathBuf,
    pub result: Result<String, ConvertError>,
}

impl<'a> Converter<'a> {
    pub fn new(registry: &'a FormatRegistry, target: &'a str) -> Self {
        Converter { registry, target }
    }

    /// Convert one file to text in the target format.
    pub fn convert(&self, path: &Path) -> Result<String, ConvertError> {
        let loader = if path.as_os_str() == STDIN {
            let mut bytes = Vec::new();
            std::io::stdin()
                .read_to_end(&mut bytes)
                .map_err(ConvertError::Stdin)?;
            ManifestLoader::from_bytes(bytes)?
        } else {
            ManifestLoader::from_path(path)?
        };
        let manifest = self
            .registry
            .parse(loader.source(), source_format(path))?;
        tracing::debug!(
            path = %path.display(),
            legal = manifest.is_legal(),
            target = self.target,
            "converting manifest"
        );
        Ok(self.registry.serialize(&manifest, self.target)?)
    }

    /// Convert all files, in parallel.
    pub fn convert_all(&self, paths: &[PathBuf]) -> Vec<Converted> {
        paths
            .par_iter()
            .map(|path| Converted {
                path: path.clone(),
                result: self.convert(path),
            })
            .collect()
    }
}

/// TOML sources parse strictly through the TOML format, everything else as legacy INI.
fn source_format(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => "toml",
        _ => "ini",
    }
}

/// Where `--write` puts the output for `source`.
pub fn output_path(source: &Path, extension: &str) -> PathBuf {
    source.with_extension(extension)
}

pub fn write_output(path: &Path, text: &str) -> Result<(), ConvertError> {
    fs::write(path, text).map_err(|source| ConvertError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "wrote output");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_format() {
        assert_eq!(source_format(Path::new("a/xpcshell.ini")), "ini");
        assert_eq!(source_format(Path::new("a/xpcshell.toml")), "toml");
        assert_eq!(source_format(Path::new(STDIN)), "ini");
    }

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("dom/tests/mochitest.ini"), "toml"),
            PathBuf::from("dom/tests/mochitest.toml")
        );
    }

    #[test]
    fn test_convert_all_keeps_order() {
        let dir = std::env::temp_dir().join(format!("mmp-convert-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let good = dir.join("good.ini");
        fs::write(&good, "[DEFAULT]\ntags = a b\n").unwrap();
        let bad = dir.join("bad.ini");
        fs::write(&bad, "[DEFAULT\n").unwrap();

        let registry = FormatRegistry::with_defaults();
        let converter = Converter::new(&registry, "toml");
        let results = converter.convert_all(&[good.clone(), bad.clone(), dir.join("missing.ini")]);

        assert_eq!(results[0].path, good);
        assert_eq!(
            results[0].result.as_ref().unwrap(),
            "[DEFAULT]\ntags = \"a b\"\n"
        );
        assert!(matches!(
            results[1].result,
            Err(ConvertError::Format(FormatError::Transform(_)))
        ));
        assert!(matches!(
            results[2].result,
            Err(ConvertError::Load(LoaderError::Io { .. }))
        ));
        fs::remove_dir_all(&dir).unwrap();
    }
}
