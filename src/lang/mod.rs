//! Language parsers: locate documentable items and their existing docs.
//!
//! # Adding a New Language
//!
//! 1. Create a module with a tree-sitter item query and a [`treesitter::Config`]
//! 2. Add a variant to [`Language`] and its extensions to the extension map
//! 3. Wire the parser into [`get_parser`]

pub mod doc_comment;
mod generic;

#[cfg(feature = "tree-sitter")]
pub mod treesitter;

#[cfg(feature = "tree-sitter")]
mod go;
#[cfg(feature = "tree-sitter")]
mod java;
#[cfg(feature = "tree-sitter")]
mod javascript;
#[cfg(feature = "tree-sitter")]
mod python;
#[cfg(feature = "tree-sitter")]
mod rust_lang;
#[cfg(feature = "tree-sitter")]
mod typescript;

use phf::phf_map;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub use doc_comment::{CommentStyle, DocSyntax, ParamStyle};
pub use generic::GenericParser;

use crate::error::ParseError;
use crate::item::CodeItem;
use crate::text::{SourceText, Span};

/// Languages with a dedicated parser, plus the fail-closed fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Rust,
    JavaScript,
    TypeScript,
    Tsx,
    Go,
    Java,
    Generic,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Rust => "rust",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
            Language::Go => "go",
            Language::Java => "java",
            Language::Generic => "generic",
        }
    }

    /// Detect the language of a file from its extension.
    ///
    /// Unknown extensions map to [`Language::Generic`], which never edits.
    pub fn detect(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|ext| EXTENSIONS.get(ext.to_ascii_lowercase().as_str()))
            .copied()
            .unwrap_or(Language::Generic)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "python" | "py" => Ok(Language::Python),
            "rust" | "rs" => Ok(Language::Rust),
            "javascript" | "js" | "jsx" => Ok(Language::JavaScript),
            "typescript" | "ts" => Ok(Language::TypeScript),
            "tsx" => Ok(Language::Tsx),
            "go" | "golang" => Ok(Language::Go),
            "java" => Ok(Language::Java),
            "generic" => Ok(Language::Generic),
            other => Err(format!("unknown language {:?}", other)),
        }
    }
}

/// File extension (without dot) to language.
static EXTENSIONS: phf::Map<&'static str, Language> = phf_map! {
    "py" => Language::Python,
    "pyi" => Language::Python,
    "rs" => Language::Rust,
    "js" => Language::JavaScript,
    "jsx" => Language::JavaScript,
    "mjs" => Language::JavaScript,
    "cjs" => Language::JavaScript,
    "ts" => Language::TypeScript,
    "mts" => Language::TypeScript,
    "cts" => Language::TypeScript,
    "tsx" => Language::Tsx,
    "go" => Language::Go,
    "java" => Language::Java,
};

/// Whether files with this extension have a dedicated parser.
pub fn is_supported_extension(ext: &str) -> bool {
    EXTENSIONS.contains_key(ext.to_ascii_lowercase().as_str())
}

/// Items and syntax errors found in one file.
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    /// Items in strictly ascending, non-overlapping span order.
    pub items: Vec<CodeItem>,
    pub errors: Vec<ParseError>,
}

/// Language-specific parser capability.
///
/// # Thread Safety
///
/// tree_sitter::Parser is not Sync, so implementations create a parser per
/// call.
pub trait LanguageParser: Send + Sync {
    fn language(&self) -> Language;

    /// File extensions this parser handles (without dot).
    fn file_extensions(&self) -> &'static [&'static str];

    fn doc_syntax(&self) -> &DocSyntax;

    /// Locate every documentable item in document order.
    ///
    /// Items containing syntax errors are skipped and reported in
    /// [`ParseOutcome::errors`]; the rest are still returned.
    fn locate_items(&self, source: &SourceText) -> anyhow::Result<ParseOutcome>;

    /// Inner text of an existing doc comment, delimiters stripped.
    fn extract_doc_text(&self, source: &SourceText, doc_span: &Span) -> String {
        doc_comment::strip_delimiters(source.slice(doc_span))
    }
}

#[cfg(feature = "tree-sitter")]
mod registry {
    use once_cell::sync::OnceCell;

    use super::treesitter::TreeSitterParser;
    use super::{go, java, javascript, python, rust_lang, typescript};

    pub static GO: OnceCell<TreeSitterParser> = OnceCell::new();
    pub static JAVA: OnceCell<TreeSitterParser> = OnceCell::new();
    pub static JAVASCRIPT: OnceCell<TreeSitterParser> = OnceCell::new();
    pub static PYTHON: OnceCell<TreeSitterParser> = OnceCell::new();
    pub static RUST: OnceCell<TreeSitterParser> = OnceCell::new();
    pub static TYPESCRIPT: OnceCell<TreeSitterParser> = OnceCell::new();
    pub static TSX: OnceCell<TreeSitterParser> = OnceCell::new();

    pub fn go() -> &'static TreeSitterParser {
        GO.get_or_init(go::parser)
    }

    pub fn java() -> &'static TreeSitterParser {
        JAVA.get_or_init(java::parser)
    }

    pub fn javascript() -> &'static TreeSitterParser {
        JAVASCRIPT.get_or_init(javascript::parser)
    }

    pub fn python() -> &'static TreeSitterParser {
        PYTHON.get_or_init(python::parser)
    }

    pub fn rust() -> &'static TreeSitterParser {
        RUST.get_or_init(rust_lang::parser)
    }

    pub fn typescript() -> &'static TreeSitterParser {
        TYPESCRIPT.get_or_init(typescript::parser)
    }

    pub fn tsx() -> &'static TreeSitterParser {
        TSX.get_or_init(typescript::tsx_parser)
    }
}

static GENERIC: GenericParser = GenericParser;

/// Get the parser for a language.
///
/// Without the `tree-sitter` feature every language resolves to the generic
/// fallback.
pub fn get_parser(language: Language) -> &'static dyn LanguageParser {
    match language {
        #[cfg(feature = "tree-sitter")]
        Language::Python => registry::python(),
        #[cfg(feature = "tree-sitter")]
        Language::Rust => registry::rust(),
        #[cfg(feature = "tree-sitter")]
        Language::JavaScript => registry::javascript(),
        #[cfg(feature = "tree-sitter")]
        Language::TypeScript => registry::typescript(),
        #[cfg(feature = "tree-sitter")]
        Language::Tsx => registry::tsx(),
        #[cfg(feature = "tree-sitter")]
        Language::Go => registry::go(),
        #[cfg(feature = "tree-sitter")]
        Language::Java => registry::java(),
        _ => &GENERIC,
    }
}

/// Get the parser for a file path.
pub fn parser_for_path(path: &Path) -> &'static dyn LanguageParser {
    get_parser(Language::detect(path))
}

/// Initialize all parsers up front.
///
/// This is idempotent - calling it multiple times is safe.
pub fn init() {
    for language in [
        Language::Python,
        Language::Rust,
        Language::JavaScript,
        Language::TypeScript,
        Language::Tsx,
        Language::Go,
        Language::Java,
    ] {
        get_parser(language);
    }
}
