//! Java: Javadoc blocks above declarations; annotations live inside the node.

use super::doc_comment::{CommentStyle, DocSyntax, ParamStyle};
use super::treesitter::{Config, DocPlacement, TreeSitterParser};
use super::Language;

const ITEM_QUERY: &str = r#"
(method_declaration name: (identifier) @name) @method
(constructor_declaration name: (identifier) @name) @method
(class_declaration name: (identifier) @name) @class
(interface_declaration name: (identifier) @name) @class
(enum_declaration name: (identifier) @name) @class
(record_declaration name: (identifier) @name) @class
"#;

const DOC: DocSyntax = DocSyntax {
    render: CommentStyle::Block,
    line_marker: None,
    block: true,
    params: ParamStyle::Tags,
    blank_line_breaks: false,
};

pub fn parser() -> TreeSitterParser {
    TreeSitterParser::new(Config {
        language: Language::Java,
        grammar: tree_sitter_java::LANGUAGE.into(),
        extensions: &["java"],
        item_query: ITEM_QUERY,
        wrapper_kinds: &[],
        modifier_kinds: &[],
        comment_kinds: &["line_comment", "block_comment"],
        skip_param_kinds: &["receiver_parameter"],
        implicit_params: &["this"],
        placement: DocPlacement::Leading,
        doc: DOC,
    })
}
