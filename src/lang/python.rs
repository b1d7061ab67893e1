//! Python: docstrings are the first statement of the body.

use super::doc_comment::{CommentStyle, DocSyntax, ParamStyle};
use super::treesitter::{Config, DocPlacement, TreeSitterParser};
use super::Language;

/// Functions, classes, and methods defined directly in a class body.
const ITEM_QUERY: &str = r#"
(function_definition name: (identifier) @name) @function

(class_definition name: (identifier) @name) @class

(class_definition
  body: (block
    (function_definition name: (identifier) @name) @method))

(class_definition
  body: (block
    (decorated_definition
      definition: (function_definition name: (identifier) @name) @method)))
"#;

const DOC: DocSyntax = DocSyntax {
    render: CommentStyle::Docstring,
    line_marker: None,
    block: false,
    params: ParamStyle::Google,
    blank_line_breaks: false,
};

pub fn parser() -> TreeSitterParser {
    TreeSitterParser::new(Config {
        language: Language::Python,
        grammar: tree_sitter_python::LANGUAGE.into(),
        extensions: &["py", "pyi"],
        item_query: ITEM_QUERY,
        wrapper_kinds: &["decorated_definition"],
        modifier_kinds: &[],
        comment_kinds: &["comment"],
        skip_param_kinds: &["keyword_separator", "positional_separator"],
        implicit_params: &["self", "cls"],
        placement: DocPlacement::BodyDocstring,
        doc: DOC,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MODULE_SCOPE;
    use crate::item::ItemKind;
    use crate::lang::LanguageParser;
    use crate::text::SourceText;

    #[test]
    fn test_locates_functions_classes_and_methods() {
        let src = SourceText::new(
            r#"import os


def add(a, b=2, *args, **kwargs):
    return a + b


class Calculator:
    """A calculator."""

    def __init__(self, value):
        self.value = value

    @staticmethod
    def twice(x: int, *, scale: float = 1.0) -> int:
        """Doubles.

        Args:
            x: number
            scale: factor
        """
        return x * 2
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
                ("add", ItemKind::Function),
                ("Calculator", ItemKind::Class),
                ("__init__", ItemKind::Method),
                ("twice", ItemKind::Method),
            ]
        );

        let add = &outcome.items[0];
        assert_eq!(add.params, vec!["a", "b", "args", "kwargs"]);
        assert_eq!(add.signature, "def add(a, b=2, *args, **kwargs)");
        assert!(add.doc_span.is_none());
        assert!(add.body_digest.is_some());

        let class = &outcome.items[1];
        assert_eq!(
            class.doc_span.as_ref().map(|s| src.slice(s)),
            Some("\"\"\"A calculator.\"\"\"")
        );
        assert!(class.body_digest.is_none());

        let init = &outcome.items[2];
        assert_eq!(init.params, vec!["value"]);
        assert_eq!(init.parent.as_deref(), Some("Calculator"));
        let insertion = init.insertion.as_ref().unwrap();
        assert_eq!(insertion.indent, "        ");

        let twice = &outcome.items[3];
        assert_eq!(twice.params, vec!["x", "scale"]);
        assert_eq!(src.slice(&twice.span).lines().next(), Some("@staticmethod"));
        let doc = parser().extract_doc_text(&src, twice.doc_span.as_ref().unwrap());
        assert_eq!(doc, "Doubles.\n\nArgs:\n    x: number\n    scale: factor");
    }

    #[test]
    fn test_header_span_ends_at_colon() {
        let src = SourceText::new("def f(a):  # note\n    return a\n");
        let outcome = parser().locate_items(&src).unwrap();
        let item = &outcome.items[0];
        assert!(src.slice(&item.span).starts_with("def f(a):"));
        assert_eq!(item.signature, "def f(a)");
        assert_eq!(item.insertion.as_ref().unwrap().offset, src.line_start(1));
    }

    #[test]
    fn test_one_line_body_has_no_insertion_point() {
        let src = SourceText::new("def f(a): return a\n");
        let outcome = parser().locate_items(&src).unwrap();
        assert!(outcome.items[0].insertion.is_none());
    }

    #[test]
    fn test_body_digest_ignores_docstring_and_comments() {
        let plain = SourceText::new("def f(a):\n    return a + 1\n");
        let documented =
            SourceText::new("def f(a):\n    \"\"\"Adds one.\"\"\"\n    # bump\n    return a + 1\n");
        let changed = SourceText::new("def f(a):\n    return a + 2\n");

        let digest = |src: &SourceText| parser().locate_items(src).unwrap().items[0].body_digest.clone();
        assert_eq!(digest(&plain), digest(&documented));
        assert_ne!(digest(&plain), digest(&changed));
    }

    #[test]
    fn test_syntax_error_skips_only_the_broken_item() {
        let src = SourceText::new("def good(a):\n    return a\n\n\ndef bad(x:\n    return x\n");
        let outcome = parser().locate_items(&src).unwrap();
        assert!(!outcome.errors.is_empty());
        assert!(outcome.items.iter().any(|i| i.name == "good"));
        assert!(outcome
            .errors
            .iter()
            .all(|e| e.scope == "bad" || e.scope == MODULE_SCOPE));
    }
}
