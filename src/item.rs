//! Documentable units located in a source file.

use serde::Serialize;
use std::fmt;

use crate::text::Span;

/// Kind of documentable item.
///
/// Structs, enums, traits, interfaces and type declarations are all `Class`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Function,
    Method,
    Class,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Function => "function",
            ItemKind::Method => "method",
            ItemKind::Class => "class",
        }
    }

    /// Check if this is a callable (function or method).
    pub fn is_callable(&self) -> bool {
        matches!(self, ItemKind::Function | ItemKind::Method)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where new documentation for an item is inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Insertion {
    /// Byte offset of the zero-width anchor.
    pub offset: usize,
    /// Verbatim whitespace each rendered doc line is prefixed with.
    pub indent: String,
    /// The anchor sits mid-line, after other code on the same line.
    pub inline: bool,
}

/// A function, method or class declaration eligible for documentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeItem {
    pub kind: ItemKind,
    pub name: String,
    /// Enclosing class, impl or receiver type for methods.
    pub parent: Option<String>,
    /// Normalized declaration header.
    pub signature: String,
    /// Parameter names in declaration order, implicit receivers excluded.
    pub params: Vec<String>,
    pub body_digest: Option<String>,
    /// Header span: leading modifiers through the opening of the body.
    pub span: Span,
    pub doc_span: Option<Span>,
    /// Leading whitespace of the declaration's first line.
    pub indent: String,
    pub insertion: Option<Insertion>,
}

impl CodeItem {
    /// Name qualified with its parent, e.g. `Calculator.add`.
    pub fn qualified_name(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{}.{}", parent, self.name),
            None => self.name.clone(),
        }
    }

    pub fn line(&self) -> usize {
        self.span.start_line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::SourceText;

    #[test]
    fn test_qualified_name() {
        let src = SourceText::new("def add(a, b):\n    pass\n");
        let item = CodeItem {
            kind: ItemKind::Method,
            name: "add".to_string(),
            parent: Some("Calculator".to_string()),
            signature: "def add(a, b)".to_string(),
            params: vec!["a".into(), "b".into()],
            body_digest: None,
            span: src.span(0, 14),
            doc_span: None,
            indent: String::new(),
            insertion: None,
        };
        assert_eq!(item.qualified_name(), "Calculator.add");
        assert_eq!(item.line(), 1);
        assert!(item.kind.is_callable());
        assert!(!ItemKind::Class.is_callable());
    }
}
