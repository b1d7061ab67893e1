//! Docsync - keeps documentation comments in sync with code.
//!
//! Docsync locates functions, methods and classes in source files, decides
//! whether their documentation is missing or outdated, asks a generation
//! backend for new text, and rewrites only the documentation spans.
//!
//! # Architecture
//!
//! - `lang`: tree-sitter item locators, one per language, plus doc comment syntax
//! - `staleness`: parameter fingerprints and Documented/Missing/Outdated classification
//! - `updater`: rendering generated text into comments and applying edits
//! - `backend`: LLM providers behind the `DocBackend` trait
//! - `pipeline`: per-file orchestration and bounded parallelism
//! - `report`: output formatting (pretty, JSON)
//!
//! # Adding a New Language
//!
//! See `src/lang/` for examples. Write a query and a `treesitter::Config`
//! for the grammar and register the parser in `lang/mod.rs`.

pub mod backend;
pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod item;
pub mod lang;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod staleness;
pub mod text;
pub mod updater;

pub use backend::{DocBackend, GenerationContext, MockBackend, Provider};
pub use config::Config;
pub use error::{BackendError, ParseError, UpdateError, WriteError};
pub use item::{CodeItem, ItemKind};
pub use lang::{get_parser, Language, LanguageParser};
pub use pipeline::{FileResult, RunMode, RunOptions, Runner};
pub use staleness::{DocStatus, StalenessPolicy};

/// Initialize all parsers.
///
/// Call this once at startup.
pub fn init() {
    lang::init();
}
