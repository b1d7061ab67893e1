//! JavaScript (and JSX): JSDoc `/** */` blocks above declarations.

use super::doc_comment::{CommentStyle, DocSyntax, ParamStyle};
use super::treesitter::{Config, DocPlacement, TreeSitterParser};
use super::Language;

/// Declarations, function-valued variables and class methods.
pub(super) const ITEM_QUERY: &str = r#"
(function_declaration name: (identifier) @name) @function
(generator_function_declaration name: (identifier) @name) @function

(lexical_declaration
  (variable_declarator
    name: (identifier) @name
    value: [(arrow_function) (function_expression)])) @function

(variable_declaration
  (variable_declarator
    name: (identifier) @name
    value: [(arrow_function) (function_expression)])) @function

(class_declaration name: (_) @name) @class

(class_body (method_definition name: (_) @name) @method)
"#;

pub(super) const DOC: DocSyntax = DocSyntax {
    render: CommentStyle::Block,
    line_marker: None,
    block: true,
    params: ParamStyle::Tags,
    blank_line_breaks: false,
};

pub fn parser() -> TreeSitterParser {
    TreeSitterParser::new(Config {
        language: Language::JavaScript,
        grammar: tree_sitter_javascript::LANGUAGE.into(),
        extensions: &["js", "jsx", "mjs", "cjs"],
        item_query: ITEM_QUERY,
        wrapper_kinds: &["export_statement"],
        modifier_kinds: &["decorator"],
        comment_kinds: &["comment"],
        skip_param_kinds: &[],
        implicit_params: &["this"],
        placement: DocPlacement::Leading,
        doc: DOC,
    })
}
