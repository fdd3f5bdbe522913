//! Format implementations
//!
//! `toml` and `ini` differ only in how the printer renders; both parse through the same
//! pipeline. `treeviz` and `json` are for looking at the IR.

pub mod ini;
pub mod json;
pub mod toml;
pub mod treeviz;

pub use ini::IniFormat;
pub use json::JsonFormat;
pub use toml::TomlFormat;
pub use treeviz::TreevizFormat;
