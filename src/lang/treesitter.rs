//! Tree-sitter based item locator.
//!
//! One generic implementation configured per language with an item query
//! and a handful of node-kind lists. Queries capture the declaration node as
//! `@function`, `@method` or `@class` together with its `@name`.

use std::collections::{BTreeMap, HashSet};

use streaming_iterator::StreamingIterator;
use tracing::debug;
use tree_sitter::{Node, Parser as TsParser, Query, QueryCursor};

use super::doc_comment::{self, DocSyntax};
use super::{Language, LanguageParser, ParseOutcome};
use crate::error::{ParseError, MODULE_SCOPE};
use crate::item::{CodeItem, Insertion, ItemKind};
use crate::staleness;
use crate::text::{SourceText, Span};

/// Node kinds whose `name` field names the owner of the methods inside them.
const OWNER_KINDS: &[&str] = &[
    "class_definition",
    "class_declaration",
    "abstract_class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "trait_item",
];

/// Destructuring parameters, which have no single name.
const PATTERN_KINDS: &[&str] = &["object_pattern", "array_pattern"];

/// Where a language keeps an item's documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocPlacement {
    /// Comment block immediately preceding the declaration.
    Leading,
    /// String literal that is the first statement of the body.
    BodyDocstring,
}

/// Configuration for a tree-sitter language parser.
#[derive(Clone)]
pub struct Config {
    pub language: Language,
    /// The tree-sitter grammar
    pub grammar: tree_sitter::Language,
    pub extensions: &'static [&'static str],
    /// Query capturing `@function`/`@method`/`@class` and `@name`
    pub item_query: &'static str,
    /// Parents that belong to the declaration (`export_statement`, `decorated_definition`)
    pub wrapper_kinds: &'static [&'static str],
    /// Preceding siblings that belong to the declaration (attributes, decorators)
    pub modifier_kinds: &'static [&'static str],
    pub comment_kinds: &'static [&'static str],
    /// Parameter-list children that are not parameters
    pub skip_param_kinds: &'static [&'static str],
    /// Receiver names excluded from the parameter list
    pub implicit_params: &'static [&'static str],
    pub placement: DocPlacement,
    pub doc: DocSyntax,
}

/// A declaration matched by the item query.
struct Declaration<'t> {
    node: Node<'t>,
    kind: ItemKind,
    name: String,
}

/// Tree-sitter based parser.
pub struct TreeSitterParser {
    config: Config,
}

impl TreeSitterParser {
    /// Create a new tree-sitter parser with the given configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Parse source code and return the tree.
    fn parse(&self, source: &[u8]) -> anyhow::Result<tree_sitter::Tree> {
        let mut parser = TsParser::new();
        parser.set_language(&self.config.grammar)?;
        parser
            .parse(source, None)
            .ok_or_else(|| anyhow::anyhow!("failed to parse source"))
    }

    /// Run the item query, one declaration per node.
    ///
    /// A node matched both as a function and as a method is a method.
    fn collect_declarations<'t>(
        &self,
        root: Node<'t>,
        source: &[u8],
    ) -> anyhow::Result<Vec<Declaration<'t>>> {
        let query = Query::new(&self.config.grammar, self.config.item_query)?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, root, source);

        let mut by_node: BTreeMap<(usize, usize), Declaration<'t>> = BTreeMap::new();
        while let Some(m) = matches.next() {
            let mut found = None;
            let mut name = None;
            for capture in m.captures {
                match query.capture_names()[capture.index as usize] {
                    "function" => found = Some((capture.node, ItemKind::Function)),
                    "method" => found = Some((capture.node, ItemKind::Method)),
                    "class" => found = Some((capture.node, ItemKind::Class)),
                    "name" => name = Some(node_text(capture.node, source).to_string()),
                    _ => {}
                }
            }

            if let (Some((node, kind)), Some(name)) = (found, name) {
                let key = (node.start_byte(), node.end_byte());
                let replace = match by_node.get(&key) {
                    Some(existing) => existing.kind == ItemKind::Function && kind == ItemKind::Method,
                    None => true,
                };
                if replace {
                    by_node.insert(key, Declaration { node, kind, name });
                }
            }
        }

        Ok(by_node.into_values().collect())
    }

    /// Outermost node that still belongs to the declaration.
    fn leading_node<'t>(&self, node: Node<'t>) -> Node<'t> {
        let mut lead = node;
        while let Some(parent) = lead.parent() {
            if !self.config.wrapper_kinds.contains(&parent.kind()) {
                break;
            }
            lead = parent;
        }
        lead
    }

    /// Start of the declaration's leading material, modifiers included.
    fn leading_start(&self, lead: Node, text: &str) -> usize {
        let mut start = lead.start_byte();
        let mut current = lead;
        while let Some(prev) = current.prev_named_sibling() {
            if !self.config.modifier_kinds.contains(&prev.kind()) {
                break;
            }
            if !text[prev.end_byte()..start].trim().is_empty() {
                break;
            }
            start = prev.start_byte();
            current = prev;
        }
        start
    }

    fn build_item(&self, source: &SourceText, decl: &Declaration) -> CodeItem {
        let text = source.as_str();
        let bytes = source.as_bytes();
        let node = decl.node;

        let lead_start = self.leading_start(self.leading_node(node), text);
        let body = body_node(node);
        let header_end = header_end(text, node, body);
        let span = source.span(lead_start, header_end);
        let indent = source.indent_of_line(source.line_of(lead_start)).to_string();

        let (doc_span, insertion) = match self.config.placement {
            DocPlacement::Leading => (
                doc_comment::scan_leading_doc(source, lead_start, &self.config.doc),
                Some(leading_insertion(source, lead_start, &indent)),
            ),
            DocPlacement::BodyDocstring => (
                body.and_then(|b| self.docstring_span(b)),
                body.and_then(|b| body_insertion(source, b, header_end)),
            ),
        };

        let params = if decl.kind.is_callable() {
            self.params(node, bytes)
        } else {
            Vec::new()
        };
        let body_digest = match body {
            Some(b) if decl.kind.is_callable() => Some(self.body_digest(text, b, doc_span.as_ref())),
            _ => None,
        };
        let parent = if decl.kind == ItemKind::Method {
            parent_name(node, bytes)
        } else {
            None
        };

        CodeItem {
            kind: decl.kind,
            name: decl.name.clone(),
            parent,
            signature: self.signature(text, node, header_end),
            params,
            body_digest,
            span,
            doc_span,
            indent,
            insertion,
        }
    }

    /// Normalized header text with comments removed.
    fn signature(&self, text: &str, node: Node, header_end: usize) -> String {
        let start = node.start_byte();
        let mut comments = Vec::new();
        self.comment_ranges(node, start, header_end, &mut comments);
        let header = text_without(text, start, header_end, &comments);
        let normalized = staleness::normalize_whitespace(&header);
        normalized
            .trim_end_matches(['{', ':'])
            .trim_end()
            .to_string()
    }

    fn body_digest(&self, text: &str, body: Node, doc_span: Option<&Span>) -> String {
        let (start, end) = (body.start_byte(), body.end_byte());
        let mut skipped = Vec::new();
        self.comment_ranges(body, start, end, &mut skipped);
        if let Some(doc) = doc_span {
            if doc.start_byte >= start && doc.end_byte <= end {
                skipped.push((doc.start_byte, doc.end_byte));
            }
        }
        skipped.sort_unstable();
        let normalized = staleness::normalize_whitespace(&text_without(text, start, end, &skipped));
        staleness::digest(&normalized)
    }

    fn comment_ranges(&self, node: Node, start: usize, end: usize, out: &mut Vec<(usize, usize)>) {
        if node.end_byte() <= start || node.start_byte() >= end {
            return;
        }
        if self.config.comment_kinds.contains(&node.kind()) {
            out.push((node.start_byte(), node.end_byte()));
            return;
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.comment_ranges(child, start, end, out);
        }
    }

    fn params(&self, node: Node, source: &[u8]) -> Vec<String> {
        let callable = callable_node(node);
        let list = callable
            .child_by_field_name("parameters")
            .or_else(|| callable.child_by_field_name("parameter"));
        match list {
            Some(list) => self.param_names(list, source),
            None => Vec::new(),
        }
    }

    fn param_names(&self, list: Node, source: &[u8]) -> Vec<String> {
        // arrow function with a single bare parameter
        if list.kind() == "identifier" {
            return vec![node_text(list, source).to_string()];
        }

        let mut names = Vec::new();
        let mut cursor = list.walk();
        for child in list.named_children(&mut cursor) {
            if self.config.skip_param_kinds.contains(&child.kind())
                || self.config.comment_kinds.contains(&child.kind())
            {
                continue;
            }

            let mut field_cursor = child.walk();
            let declared: Vec<Node> = child.children_by_field_name("name", &mut field_cursor).collect();
            let candidates: Vec<String> = if declared.is_empty() {
                let target = child
                    .child_by_field_name("pattern")
                    .or_else(|| child.child_by_field_name("left"))
                    .unwrap_or(child);
                let name = if PATTERN_KINDS.contains(&target.kind()) {
                    placeholder_param(names.len())
                } else {
                    match first_identifier(target) {
                        Some(ident) => node_text(ident, source).to_string(),
                        None => {
                            let text = staleness::normalize_whitespace(node_text(target, source));
                            if is_bare_name(&text) {
                                text
                            } else {
                                placeholder_param(names.len())
                            }
                        }
                    }
                };
                vec![name]
            } else {
                declared
                    .into_iter()
                    .map(|n| node_text(n, source).to_string())
                    .collect()
            };

            for name in candidates {
                let is_word = name.chars().any(|c| c.is_alphanumeric() || c == '_');
                if is_word && !self.config.implicit_params.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// The docstring literal opening a body, if any.
    fn docstring_span(&self, body: Node) -> Option<Span> {
        let mut cursor = body.walk();
        let first = body
            .named_children(&mut cursor)
            .find(|c| !self.config.comment_kinds.contains(&c.kind()))?;
        if first.kind() != "expression_statement" {
            return None;
        }
        let expr = first.named_child(0)?;
        (expr.kind() == "string").then(|| Span::from_node(expr))
    }
}

impl LanguageParser for TreeSitterParser {
    fn language(&self) -> Language {
        self.config.language
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        self.config.extensions
    }

    fn doc_syntax(&self) -> &DocSyntax {
        &self.config.doc
    }

    fn locate_items(&self, source: &SourceText) -> anyhow::Result<ParseOutcome> {
        let bytes = source.as_bytes();
        let tree = self.parse(bytes)?;
        let root = tree.root_node();

        let declarations = self.collect_declarations(root, bytes)?;

        let mut error_nodes = Vec::new();
        collect_error_nodes(root, &mut error_nodes);

        let mut broken = HashSet::new();
        let mut errors = Vec::new();
        for err in error_nodes {
            let owner = declarations
                .iter()
                .enumerate()
                .filter(|(_, d)| {
                    d.node.start_byte() <= err.start_byte() && err.end_byte() <= d.node.end_byte()
                })
                .min_by_key(|(_, d)| d.node.end_byte() - d.node.start_byte());
            let scope = match owner {
                Some((index, decl)) => {
                    broken.insert(index);
                    decl.name.clone()
                }
                None => MODULE_SCOPE.to_string(),
            };
            errors.push(ParseError {
                scope,
                line: err.start_position().row + 1,
                message: describe_error(err, bytes),
            });
        }

        let mut items: Vec<CodeItem> = declarations
            .iter()
            .enumerate()
            .filter(|(index, decl)| {
                let keep = !broken.contains(index);
                if !keep {
                    debug!(item = %decl.name, "skipping item with syntax errors");
                }
                keep
            })
            .map(|(_, decl)| self.build_item(source, decl))
            .collect();

        items.sort_by_key(|item| item.span.start_byte);
        let mut last_end = 0;
        items.retain(|item| {
            if item.span.start_byte < last_end {
                debug!(item = %item.name, "dropping item overlapping a previous header");
                return false;
            }
            last_end = item.span.end_byte;
            true
        });

        Ok(ParseOutcome { items, errors })
    }
}

/// Get text for a tree-sitter node.
fn node_text<'s>(node: Node, source: &'s [u8]) -> &'s str {
    node.utf8_text(source).unwrap_or("")
}

/// The function-like node of a declaration (`const f = () => {}` yields the arrow).
fn callable_node(node: Node) -> Node {
    if matches!(node.kind(), "lexical_declaration" | "variable_declaration") {
        let mut cursor = node.walk();
        let value = node
            .named_children(&mut cursor)
            .find(|c| c.kind() == "variable_declarator")
            .and_then(|d| d.child_by_field_name("value"));
        if let Some(value) = value {
            return value;
        }
    }
    node
}

fn body_node(node: Node) -> Option<Node> {
    node.child_by_field_name("body").or_else(|| {
        let callable = callable_node(node);
        if callable.id() == node.id() {
            None
        } else {
            callable.child_by_field_name("body")
        }
    })
}

/// End of the declaration header: just past the body's `{`, after the
/// Python `:`, or the end of a body-less declaration.
fn header_end(text: &str, node: Node, body: Option<Node>) -> usize {
    match body {
        Some(body) if body.start_byte() >= node.start_byte() => {
            if text.as_bytes().get(body.start_byte()) == Some(&b'{') {
                body.start_byte() + 1
            } else {
                let head = &text[node.start_byte()..body.start_byte()];
                node.start_byte() + head.trim_end().len()
            }
        }
        _ => node.end_byte(),
    }
}

fn leading_insertion(source: &SourceText, lead_start: usize, indent: &str) -> Insertion {
    let line_start = source.line_start(source.line_of(lead_start));
    if source.as_str()[line_start..lead_start].trim().is_empty() {
        Insertion {
            offset: line_start,
            indent: indent.to_string(),
            inline: false,
        }
    } else {
        Insertion {
            offset: lead_start,
            indent: indent.to_string(),
            inline: true,
        }
    }
}

/// Docstrings go on the first line of the body, at the body's indentation.
/// One-line bodies have no such line.
fn body_insertion(source: &SourceText, body: Node, header_end: usize) -> Option<Insertion> {
    let body_line = source.line_of(body.start_byte());
    if body_line == source.line_of(header_end) {
        return None;
    }
    Some(Insertion {
        offset: source.line_start(body_line),
        indent: source.indent_of_line(body_line).to_string(),
        inline: false,
    })
}

fn parent_name(node: Node, source: &[u8]) -> Option<String> {
    // Go methods name their owner in the receiver
    if let Some(receiver) = node.child_by_field_name("receiver") {
        let mut cursor = receiver.walk();
        let param = receiver.named_children(&mut cursor).next()?;
        let ty = param.child_by_field_name("type")?;
        let name = node_text(ty, source).trim_start_matches('*');
        return name.split('[').next().map(|n| n.trim().to_string());
    }

    let mut current = node.parent();
    while let Some(n) = current {
        if n.kind() == "impl_item" {
            return n
                .child_by_field_name("type")
                .map(|t| node_text(t, source).to_string());
        }
        if OWNER_KINDS.contains(&n.kind()) {
            return n
                .child_by_field_name("name")
                .map(|t| node_text(t, source).to_string());
        }
        current = n.parent();
    }
    None
}

/// Positional name for a parameter that binds a pattern, e.g. `param0`.
fn placeholder_param(position: usize) -> String {
    format!("param{}", position)
}

fn is_bare_name(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn first_identifier(node: Node) -> Option<Node> {
    if node.kind() == "identifier" {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.named_children(&mut cursor).collect();
    children.into_iter().find_map(first_identifier)
}

fn collect_error_nodes<'t>(node: Node<'t>, out: &mut Vec<Node<'t>>) {
    if node.is_error() || node.is_missing() {
        out.push(node);
        return;
    }
    if !node.has_error() {
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_error_nodes(child, out);
    }
}

fn describe_error(node: Node, source: &[u8]) -> String {
    if node.is_missing() {
        return format!("missing `{}`", node.kind());
    }
    let snippet: String = node_text(node, source)
        .lines()
        .next()
        .unwrap_or("")
        .trim()
        .chars()
        .take(40)
        .collect();
    if snippet.is_empty() {
        "syntax error".to_string()
    } else {
        format!("syntax error near `{}`", snippet)
    }
}

/// Copy `text[start..end]`, leaving out the sorted `skip` ranges.
fn text_without(text: &str, start: usize, end: usize, skip: &[(usize, usize)]) -> String {
    let mut out = String::with_capacity(end - start);
    let mut pos = start;
    for &(s, e) in skip {
        let (s, e) = (s.max(start), e.min(end));
        if s > pos {
            out.push_str(&text[pos..s]);
        }
        // keep tokens on either side of a removed comment apart
        out.push(' ');
        pos = pos.max(e);
    }
    if pos < end {
        out.push_str(&text[pos..end]);
    }
    out
}
