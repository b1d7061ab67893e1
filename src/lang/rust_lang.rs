//! Rust: `///` line docs (or `/** */` blocks) above the item and its attributes.

use super::doc_comment::{CommentStyle, DocSyntax, ParamStyle};
use super::treesitter::{Config, DocPlacement, TreeSitterParser};
use super::Language;

const ITEM_QUERY: &str = r#"
(function_item name: (identifier) @name) @function
(function_signature_item name: (identifier) @name) @function

(impl_item
  body: (declaration_list
    (function_item name: (identifier) @name) @method))

(trait_item
  body: (declaration_list
    (function_item name: (identifier) @name) @method))

(trait_item
  body: (declaration_list
    (function_signature_item name: (identifier) @name) @method))

(struct_item name: (type_identifier) @name) @class
(enum_item name: (type_identifier) @name) @class
(union_item name: (type_identifier) @name) @class
(trait_item name: (type_identifier) @name) @class
"#;

const DOC: DocSyntax = DocSyntax {
    render: CommentStyle::Line("///"),
    line_marker: Some("///"),
    block: true,
    params: ParamStyle::Markdown,
    blank_line_breaks: false,
};

pub fn parser() -> TreeSitterParser {
    TreeSitterParser::new(Config {
        language: Language::Rust,
        grammar: tree_sitter_rust::LANGUAGE.into(),
        extensions: &["rs"],
        item_query: ITEM_QUERY,
        wrapper_kinds: &[],
        modifier_kinds: &["attribute_item"],
        comment_kinds: &["line_comment", "block_comment"],
        skip_param_kinds: &["self_parameter", "attribute_item"],
        implicit_params: &["self"],
        placement: DocPlacement::Leading,
        doc: DOC,
    })
}
