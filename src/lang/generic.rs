//! Fallback for files without a dedicated parser.
//!
//! Locates nothing, so the pipeline never edits a file it cannot parse.

use super::doc_comment::{CommentStyle, DocSyntax, ParamStyle};
use super::{Language, LanguageParser, ParseOutcome};
use crate::text::SourceText;

const GENERIC_DOC: DocSyntax = DocSyntax {
    render: CommentStyle::Block,
    line_marker: None,
    block: true,
    params: ParamStyle::Tags,
    blank_line_breaks: false,
};

pub struct GenericParser;

impl LanguageParser for GenericParser {
    fn language(&self) -> Language {
        Language::Generic
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &[]
    }

    fn doc_syntax(&self) -> &DocSyntax {
        &GENERIC_DOC
    }

    fn locate_items(&self, _source: &SourceText) -> anyhow::Result<ParseOutcome> {
        Ok(ParseOutcome::default())
    }
}
