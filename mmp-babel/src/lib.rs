//! Formats for Mozilla test manifests
//!
//!     This crate turns the normalized manifest of `mmp-parser` into text, and text into
//!     manifests, through a uniform [`Format`] interface. Formats are looked up by name in a
//!     [`FormatRegistry`].
//!
//!     Like the parser this is a pure lib: no printing, no environment, no file system. The
//!     CLI owns all of that.
//!
//!     The file structure :
//!     .
//!     ├── error.rs
//!     ├── format.rs               # Format trait, parsing pipeline
//!     ├── printer.rs              # The dual-mode (TOML / legacy) printer
//!     ├── registry.rs             # FormatRegistry for discovery and selection
//!     ├── formats
//!     │   ├── toml                # TOML, plus section sorting
//!     │   ├── ini                 # The legacy dialect
//!     │   ├── treeviz             # IR as a tree, one line per node
//!     │   └── json                # IR as JSON
//!     └── lib.rs
//!
//! Testing
//!
//!     Unit tests sit next to each format. End to end conversions live in tests/, with their
//!     input manifests under tests/fixtures.

pub mod error;
pub mod format;
pub mod formats;
pub mod printer;
pub mod registry;

pub use error::FormatError;
pub use format::{Format, Pipeline};
pub use printer::{Printer, RenderMode, RenderOptions};
pub use registry::FormatRegistry;
