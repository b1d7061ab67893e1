//! Go: `//` line comments directly above the declaration.

use super::doc_comment::{CommentStyle, DocSyntax, ParamStyle};
use super::treesitter::{Config, DocPlacement, TreeSitterParser};
use super::Language;

const ITEM_QUERY: &str = r#"
(function_declaration name: (identifier) @name) @function
(method_declaration name: (field_identifier) @name) @method
(type_declaration (type_spec name: (type_identifier) @name)) @class
"#;

const DOC: DocSyntax = DocSyntax {
    render: CommentStyle::Line("//"),
    line_marker: Some("//"),
    block: false,
    params: ParamStyle::Inline,
    blank_line_breaks: true,
};

pub fn parser() -> TreeSitterParser {
    TreeSitterParser::new(Config {
        language: Language::Go,
        grammar: tree_sitter_go::LANGUAGE.into(),
        extensions: &["go"],
        item_query: ITEM_QUERY,
        wrapper_kinds: &[],
        modifier_kinds: &[],
        comment_kinds: &["comment"],
        skip_param_kinds: &[],
        implicit_params: &[],
        placement: DocPlacement::Leading,
        doc: DOC,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemKind;
    use crate::lang::LanguageParser;
    use crate::text::SourceText;

    #[test]
    fn test_go_items() {
        let src = SourceText::new(
            r#"package calc

// Calculator keeps a running total.
type Calculator struct {
	total int
}

// Add adds two numbers.
//
// Parameters: a, b
func Add(a, b int) int {
	return a + b
}

// Scale multiplies the total.

func (c *Calculator) Scale(factor int, extra ...int) {
	c.total *= factor
}
"#,
        );
        let outcome = parser().locate_items(&src).unwrap();
        assert!(outcome.errors.is_empty());

        let names: Vec<(&str, ItemKind)> = outcome
            .items
            .iter()
            .map(|i| (i.name.as_str(), i.kind))
            .collect();
        assert_eq!(
            names,
            vec![
                ("Calculator", ItemKind::Class),
                ("Add", ItemKind::Function),
                ("Scale", ItemKind::Method),
            ]
        );

        let add = &outcome.items[1];
        assert_eq!(add.params, vec!["a", "b"]);
        let doc = parser().extract_doc_text(&src, add.doc_span.as_ref().unwrap());
        assert_eq!(doc, "Add adds two numbers.\n\nParameters: a, b");

        let scale = &outcome.items[2];
        assert_eq!(scale.parent.as_deref(), Some("Calculator"));
        assert_eq!(scale.params, vec!["factor", "extra"]);
        // separated by a blank line
        assert!(scale.doc_span.is_none());
    }
}
