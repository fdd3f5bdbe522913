//! Key classification
//!
//!     How a value is normalized depends only on its key. Conditional keys (ending in the
//!     reserved suffix, `-if` by default) hold one condition per source line. Always-array keys
//!     become arrays even with a single term. Unquoted-string keys fold a run of plain words
//!     into one string. Everything else gets a scalar or, with several terms, an array.
//!
//!     The tables are immutable once built and shared between files.

use std::collections::BTreeSet;
use thiserror::Error;

pub const DEFAULT_CONDITIONAL_SUFFIX: &str = "-if";

pub const DEFAULT_ALWAYS_ARRAY: &[&str] = &[
    "args",
    "environment",
    "generated-files",
    "prefs",
    "support-files",
    "test-directories",
];

pub const DEFAULT_UNQUOTED_STRING: &[&str] = &[
    "dupe-manifest",
    "disabled",
    "expected",
    "firefox-appdir",
    "head",
    "install-to-subdir",
    "reason",
    "run-sequentially",
    "scheme",
    "subsuite",
    "tags",
    "tail",
    "variant",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyClass {
    Conditional,
    AlwaysArray,
    UnquotedString,
    Neither,
}

/// Invalid classification tables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassificationError {
    #[error("conditional key suffix must not be empty")]
    EmptySuffix,

    #[error("key '{0}' is registered both as always-array and as unquoted-string")]
    Conflict(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyClassification {
    conditional_suffix: String,
    always_array: BTreeSet<String>,
    unquoted_string: BTreeSet<String>,
}

impl KeyClassification {
    /// Build and validate the tables.
    pub fn new<S, A, U>(
        conditional_suffix: S,
        always_array: A,
        unquoted_string: U,
    ) -> Result<Self, ClassificationError>
    where
        S: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
        U: IntoIterator,
        U::Item: Into<String>,
    {
        let conditional_suffix = conditional_suffix.into();
        if conditional_suffix.is_empty() {
            return Err(ClassificationError::EmptySuffix);
        }
        let always_array: BTreeSet<String> = always_array.into_iter().map(Into::into).collect();
        let unquoted_string: BTreeSet<String> =
            unquoted_string.into_iter().map(Into::into).collect();
        if let Some(key) = always_array.intersection(&unquoted_string).next() {
            return Err(ClassificationError::Conflict(key.clone()));
        }
        Ok(KeyClassification {
            conditional_suffix,
            always_array,
            unquoted_string,
        })
    }

    pub fn classify(&self, key: &str) -> KeyClass {
        if key.len() > self.conditional_suffix.len() && key.ends_with(&self.conditional_suffix) {
            KeyClass::Conditional
        } else if self.always_array.contains(key) {
            KeyClass::AlwaysArray
        } else if self.unquoted_string.contains(key) {
            KeyClass::UnquotedString
        } else {
            KeyClass::Neither
        }
    }

    pub fn conditional_suffix(&self) -> &str {
        &self.conditional_suffix
    }

    pub fn always_array(&self) -> impl Iterator<Item = &str> {
        self.always_array.iter().map(String::as_str)
    }

    pub fn unquoted_string(&self) -> impl Iterator<Item = &str> {
        self.unquoted_string.iter().map(String::as_str)
    }
}

impl Default for KeyClassification {
    fn default() -> Self {
        KeyClassification {
            conditional_suffix: DEFAULT_CONDITIONAL_SUFFIX.to_string(),
            always_array: DEFAULT_ALWAYS_ARRAY.iter().map(|k| k.to_string()).collect(),
            unquoted_string: DEFAULT_UNQUOTED_STRING.iter().map(|k| k.to_string()).collect(),
        }
    }
}
