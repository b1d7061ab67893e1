//! TypeScript and TSX: JSDoc blocks, plus interfaces, enums and abstract classes.

use super::javascript::DOC;
use super::treesitter::{Config, DocPlacement, TreeSitterParser};
use super::Language;

const ITEM_QUERY: &str = r#"
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
(abstract_class_declaration name: (_) @name) @class
(interface_declaration name: (_) @name) @class
(enum_declaration name: (_) @name) @class

(class_body (method_definition name: (_) @name) @method)
"#;

fn config(language: Language, grammar: tree_sitter::Language, extensions: &'static [&'static str]) -> Config {
    Config {
        language,
        grammar,
        extensions,
        item_query: ITEM_QUERY,
        wrapper_kinds: &["export_statement"],
        modifier_kinds: &["decorator"],
        comment_kinds: &["comment"],
        skip_param_kinds: &[],
        implicit_params: &["this"],
        placement: DocPlacement::Leading,
        doc: DOC,
    }
}

pub fn parser() -> TreeSitterParser {
    TreeSitterParser::new(config(
        Language::TypeScript,
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        &["ts", "mts", "cts"],
    ))
}

pub fn tsx_parser() -> TreeSitterParser {
    TreeSitterParser::new(config(
        Language::Tsx,
        tree_sitter_typescript::LANGUAGE_TSX.into(),
        &["tsx"],
    ))
}
