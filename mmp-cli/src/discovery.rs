//! Manifest discovery for `mmp find`
//!
//! Walks a mozilla-central checkout for `*.ini` files. A file is reported when its name
//! fully matches the pattern, or when it contains an `[include:` header (unless includes are
//! ignored). Build directories (`obj-*` at the top) are never entered. With
//! `follow_includes`, manifests named by `[include:NAME]` headers of reported files are
//! reported too, recursively.
//!
//! Paths are reported relative to the root as `./dir/file.ini`, sorted.

use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

const INCLUDE_MARKER: &str = "[include:";

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("topsrcdir is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("topsrcdir is not a firefox repo (no mach): {}", .0.display())]
    NotAFirefoxRepo(PathBuf),

    #[error("invalid match pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("cannot walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

pub struct Discovery {
    root: PathBuf,
    pattern: Regex,
    skip_prefix: String,
    ignore_includes: bool,
    follow_includes: bool,
}

impl Discovery {
    /// `pattern` must match a whole file name.
    pub fn new(root: impl AsRef<Path>, pattern: &str) -> Result<Self, DiscoveryError> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(DiscoveryError::NotADirectory(root));
        }
        if !root.join("mach").exists() {
            return Err(DiscoveryError::NotAFirefoxRepo(root));
        }
        Ok(Discovery {
            root,
            pattern: Regex::new(&format!("^(?:{pattern})$"))?,
            skip_prefix: "obj-".to_string(),
            ignore_includes: false,
            follow_includes: false,
        })
    }

    pub fn skip_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.skip_prefix = prefix.into();
        self
    }

    pub fn ignore_includes(mut self, ignore: bool) -> Self {
        self.ignore_includes = ignore;
        self
    }

    pub fn follow_includes(mut self, follow: bool) -> Self {
        self.follow_includes = follow;
        self
    }

    pub fn find(&self) -> Result<Vec<String>, DiscoveryError> {
        let mut found: BTreeSet<PathBuf> = BTreeSet::new();
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| {
                // Build directories only live at the top
                !(e.depth() == 1
                    && e.file_type().is_dir()
                    && !self.skip_prefix.is_empty()
                    && e.file_name().to_string_lossy().starts_with(&self.skip_prefix))
            });

        for entry in walker {
            let entry = entry.map_err(|source| DiscoveryError::Walk {
                path: self.root.clone(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if !name.ends_with(".ini") {
                continue;
            }
            if self.pattern.is_match(&name) {
                found.insert(entry.path().to_path_buf());
            } else if !self.ignore_includes && has_include(entry.path()) {
                found.insert(entry.path().to_path_buf());
            }
        }

        if self.follow_includes {
            let mut pending: Vec<PathBuf> = found.iter().cloned().collect();
            while let Some(path) = pending.pop() {
                for included in includes_of(&path) {
                    if included.is_file() && found.insert(included.clone()) {
                        tracing::debug!(from = %path.display(), to = %included.display(), "followed include");
                        pending.push(included);
                    }
                }
            }
        }

        tracing::debug!(root = %self.root.display(), manifests = found.len(), "discovery finished");
        Ok(found.iter().map(|path| self.relative(path)).collect())
    }

    fn relative(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        format!("./{}", parts.join("/"))
    }
}

/// Undecodable files have no includes.
fn has_include(path: &Path) -> bool {
    fs::read_to_string(path)
        .map(|text| text.contains(INCLUDE_MARKER))
        .unwrap_or(false)
}

/// Files named by the `[include:NAME]` headers of a manifest, resolved next to it.
fn includes_of(path: &Path) -> Vec<PathBuf> {
    let Ok(text) = fs::read_to_string(path) else {
        return Vec::new();
    };
    let dir = path.parent().unwrap_or(Path::new("."));
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            let name = line.strip_prefix(INCLUDE_MARKER)?.strip_suffix(']')?;
            Some(dir.join(name.trim()))
        })
        .collect()
}
