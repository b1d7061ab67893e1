//! Documentation comment syntax: recognition and delimiter stripping.
//!
//! Every language is normalized to "contiguous comment block immediately
//! preceding the declaration", except Python whose docstring lives inside the
//! body and is located by the parser itself.

use crate::text::{SourceText, Span};

/// How a documentation comment is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `/** ... */` with ` * ` continuation lines.
    Block,
    /// Consecutive line comments starting with the marker.
    Line(&'static str),
    /// Triple-quoted string literal.
    Docstring,
}

/// Canonical parameter section written into generated documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamStyle {
    /// `@param name` tags.
    Tags,
    /// Markdown `# Arguments` list.
    Markdown,
    /// Google style `Args:` section.
    Google,
    /// Single `Parameters: a, b` line.
    Inline,
}

/// Per-language documentation syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocSyntax {
    /// Style used when rendering new documentation.
    pub render: CommentStyle,
    /// Line-comment marker recognized as documentation.
    pub line_marker: Option<&'static str>,
    /// Whether `/** ... */` blocks are recognized.
    pub block: bool,
    pub params: ParamStyle,
    /// A blank line between comment and declaration breaks the association.
    pub blank_line_breaks: bool,
}

/// Find the documentation comment immediately preceding `lead_start`.
///
/// `lead_start` is the start of the item's leading material (decorators,
/// attributes, `export`). Anything other than whitespace between the comment
/// and that point means there is no documentation.
pub fn scan_leading_doc(source: &SourceText, lead_start: usize, syntax: &DocSyntax) -> Option<Span> {
    let lead_line = source.line_of(lead_start);
    let line_start = source.line_start(lead_line);
    if !source.as_str()[line_start..lead_start].trim().is_empty() {
        return None;
    }

    if syntax.block {
        if let Some(span) = scan_block(source, line_start, syntax) {
            return Some(span);
        }
    }
    syntax
        .line_marker
        .and_then(|marker| scan_lines(source, lead_line, marker, syntax.blank_line_breaks))
}

fn scan_block(source: &SourceText, line_start: usize, syntax: &DocSyntax) -> Option<Span> {
    let text = source.as_str();
    let before = &text[..line_start];
    let trimmed = before.trim_end();
    if !trimmed.ends_with("*/") {
        return None;
    }

    let gap = &before[trimmed.len()..];
    if syntax.blank_line_breaks && gap.matches('\n').count() > 1 {
        return None;
    }

    let close_end = trimmed.len();
    let open = trimmed[..close_end - 2].rfind("/*")?;
    // `/**/` is an empty comment, not a doc block
    if !trimmed[open..].starts_with("/**") || open + 3 > close_end - 2 {
        return None;
    }

    let open_line = source.line_of(open);
    if !text[source.line_start(open_line)..open].trim().is_empty() {
        return None;
    }
    Some(source.span(open, close_end))
}

fn scan_lines(source: &SourceText, lead_line: usize, marker: &str, blank_line_breaks: bool) -> Option<Span> {
    let mut first = None;
    let mut last = None;
    let mut line = lead_line;

    while line > 0 {
        line -= 1;
        let content = source.line_text(line).trim_start();
        if content.is_empty() {
            if last.is_some() || blank_line_breaks {
                break;
            }
            continue;
        }
        if is_directive(content, marker) {
            if last.is_some() {
                break;
            }
            continue;
        }
        if !is_doc_line(content, marker) {
            break;
        }
        if last.is_none() {
            last = Some(line);
        }
        first = Some(line);
    }

    let (first, last) = (first?, last?);
    let start = source.line_start(first) + source.indent_of_line(first).len();
    Some(source.span(start, source.line_end(last)))
}

fn is_doc_line(content: &str, marker: &str) -> bool {
    if !content.starts_with(marker) {
        return false;
    }
    // `////` is an ordinary comment in Rust
    !(marker == "///" && content.starts_with("////"))
}

/// Go compiler directives sit between a doc comment and its declaration.
fn is_directive(content: &str, marker: &str) -> bool {
    marker == "//"
        && (content.starts_with("//go:")
            || content.starts_with("//line ")
            || content.starts_with("//export ")
            || content.starts_with("//nolint"))
}

/// Strip comment delimiters and common indentation from a doc comment.
///
/// Works on any of the supported styles, so it also cleans generated text
/// that arrives already wrapped in delimiters.
pub fn strip_delimiters(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("/**") {
        strip_block(trimmed)
    } else if trimmed.starts_with("///") {
        strip_lines(trimmed, "///")
    } else if trimmed.starts_with("//") {
        strip_lines(trimmed, "//")
    } else if let Some(inner) = docstring_inner(trimmed) {
        clean_doc(&inner.replace("\\\"\\\"\\\"", "\"\"\""))
    } else {
        clean_doc(trimmed)
    }
}

fn strip_block(raw: &str) -> String {
    let inner = raw.strip_prefix("/**").unwrap_or(raw);
    let inner = inner.strip_suffix("*/").unwrap_or(inner);
    let lines: Vec<String> = inner
        .lines()
        .map(|line| {
            let content = line.trim_start();
            match content.strip_prefix('*') {
                Some(rest) => rest.strip_prefix(' ').unwrap_or(rest).trim_end().to_string(),
                None => content.trim_end().to_string(),
            }
        })
        .collect();
    trim_blank_lines(&lines).join("\n").replace("*\\/", "*/")
}

fn strip_lines(raw: &str, marker: &str) -> String {
    let lines: Vec<String> = raw
        .lines()
        .map(|line| {
            let content = line.trim_start();
            let rest = content.strip_prefix(marker).unwrap_or(content);
            rest.strip_prefix(' ').unwrap_or(rest).trim_end().to_string()
        })
        .collect();
    trim_blank_lines(&lines).join("\n")
}

/// Contents of a Python string literal, prefix and quotes removed.
fn docstring_inner(raw: &str) -> Option<&str> {
    let body = raw.trim_start_matches(|c: char| "rRuUbBfF".contains(c));
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if body.len() >= quote.len() * 2 && body.starts_with(quote) && body.ends_with(quote) {
            return Some(&body[quote.len()..body.len() - quote.len()]);
        }
    }
    None
}

/// First line trimmed, remaining lines dedented by their common indentation.
fn clean_doc(text: &str) -> String {
    let mut lines = text.lines();
    let first = lines.next().unwrap_or("").trim().to_string();
    let rest: Vec<&str> = lines.collect();
    let common = rest
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut out = vec![first];
    for line in rest {
        let dedented = line.get(common..).unwrap_or_else(|| line.trim_start());
        out.push(dedented.trim_end().to_string());
    }
    trim_blank_lines(&out).join("\n")
}

fn trim_blank_lines(lines: &[String]) -> &[String] {
    let start = lines.iter().position(|l| !l.trim().is_empty()).unwrap_or(lines.len());
    let end = lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .map(|i| i + 1)
        .unwrap_or(start);
    &lines[start..end.max(start)]
}
