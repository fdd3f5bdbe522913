//! # mmp
//!
//! Parser and intermediate representation for Mozilla test manifests.
//!
//! Manifests come in two dialects: the legacy INI-derived format (with its embedded
//! skip/run condition language) and TOML. Both are read with the same grammar, which is a
//! superset of the subset of TOML that manifests use.
//!
//! File Layout
//!
//! src/mmp
//!   ├── lexing          logos tokenizer
//!   ├── grammar         rule tags, start symbols and the grammar in EBNF form
//!   ├── parsing         recursive descent parser producing the concrete syntax tree
//!   ├── ir              the lossless intermediate tree (Lexeme / SyntaxNode)
//!   ├── reduction       CST -> IR, one reduction per grammar rule
//!   ├── classification  key classification tables
//!   ├── normalization   legacy term sequences -> TOML arrays / scalars
//!   ├── transforms      composable pipeline stages
//!   └── loader          reading manifests from disk
//!
//! The printer that renders the IR lives in the `mmp-babel` crate.

pub mod mmp;
