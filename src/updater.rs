//! Turning generated text into edits, and applying edits to a file.
//!
//! Edits are collected against the original text and applied from the
//! highest anchor offset to the lowest, so no edit shifts the offsets of
//! another edit that is still pending.

use serde::Serialize;

use crate::error::UpdateError;
use crate::item::CodeItem;
use crate::lang::doc_comment::{strip_delimiters, CommentStyle, DocSyntax, ParamStyle};
use crate::staleness::{self, StalenessPolicy, BODY_DIGEST_MARKER};
use crate::text::{SourceText, Span};

/// Whether an edit adds a new doc or replaces an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    Insert,
    Replace,
}

/// A single documentation change against the original text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocEdit {
    /// Zero-width for inserts, the old doc's span for replacements.
    pub anchor: Span,
    pub replacement: String,
    pub mode: EditMode,
    /// Qualified name of the item the edit documents.
    pub item: String,
}

/// Build the final doc text for an item from raw backend output.
///
/// The result always records the item's current parameters in the
/// language's canonical form, so classifying it again yields `Documented`.
pub fn compose_doc_text(raw: &str, item: &CodeItem, syntax: &DocSyntax, policy: StalenessPolicy) -> String {
    let mut text = clean_generated(raw);
    if !item.kind.is_callable() {
        return text;
    }

    if staleness::recorded_params(&text).as_ref() != Some(&item.params) {
        text = strip_param_tags(&text);
        let needs_section = match staleness::recorded_params(&text) {
            Some(recorded) => recorded != item.params,
            None => !item.params.is_empty(),
        };
        if needs_section {
            text = append_paragraph(&text, &param_section(&item.params, syntax.params));
        }
    }

    if policy == StalenessPolicy::SignatureAndBody {
        if let Some(body_digest) = &item.body_digest {
            let marker = format!("{} {}", BODY_DIGEST_MARKER, body_digest);
            text = append_paragraph(&text, &marker);
        }
    }
    text
}

/// Strip code fences, comment delimiters and stale digest lines.
fn clean_generated(raw: &str) -> String {
    let mut lines: Vec<&str> = raw.trim().lines().collect();
    if lines.first().is_some_and(|l| l.trim_start().starts_with("```")) {
        lines.remove(0);
        if lines.last().is_some_and(|l| l.trim() == "```") {
            lines.pop();
        }
    }
    let text = strip_delimiters(&lines.join("\n"));
    text.lines()
        .filter(|l| !l.trim_start().starts_with(BODY_DIGEST_MARKER))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn strip_param_tags(text: &str) -> String {
    text.lines()
        .filter(|l| !staleness::is_param_tag(l))
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}

fn append_paragraph(text: &str, paragraph: &str) -> String {
    let text = text.trim_end();
    if text.is_empty() {
        paragraph.to_string()
    } else {
        format!("{}\n\n{}", text, paragraph)
    }
}

/// Canonical parameter section for a language.
fn param_section(params: &[String], style: ParamStyle) -> String {
    if params.is_empty() {
        return "Parameters: none".to_string();
    }
    match style {
        ParamStyle::Tags => params
            .iter()
            .map(|p| format!("@param {}", p))
            .collect::<Vec<_>>()
            .join("\n"),
        ParamStyle::Markdown => {
            let entries: Vec<String> = params.iter().map(|p| format!("* `{}`", p)).collect();
            format!("# Arguments\n\n{}", entries.join("\n"))
        }
        ParamStyle::Google => {
            let entries: Vec<String> = params.iter().map(|p| format!("    {}", p)).collect();
            format!("Args:\n{}", entries.join("\n"))
        }
        ParamStyle::Inline => format!("Parameters: {}", params.join(", ")),
    }
}

/// Wrap doc text in comment delimiters, one entry per output line.
///
/// Lines are returned without indentation.
pub fn render(text: &str, style: CommentStyle) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();
    match style {
        CommentStyle::Block => {
            let mut out = vec!["/**".to_string()];
            for line in &lines {
                let line = line.replace("*/", "*\\/");
                if line.trim().is_empty() {
                    out.push(" *".to_string());
                } else {
                    out.push(format!(" * {}", line));
                }
            }
            out.push(" */".to_string());
            out
        }
        CommentStyle::Line(marker) => lines
            .iter()
            .map(|line| {
                if line.trim().is_empty() {
                    marker.to_string()
                } else {
                    format!("{} {}", marker, line)
                }
            })
            .collect(),
        CommentStyle::Docstring => {
            let escaped = text.replace("\"\"\"", "\\\"\\\"\\\"");
            let prefix = if escaped.contains('\\') { "r" } else { "" };
            let lines: Vec<&str> = escaped.lines().collect();
            let single = lines.len() <= 1 && !escaped.ends_with('"') && !escaped.ends_with('\\');
            if single {
                return vec![format!("{}\"\"\"{}\"\"\"", prefix, escaped)];
            }
            let mut out = Vec::with_capacity(lines.len() + 1);
            for (i, line) in lines.iter().enumerate() {
                if i == 0 {
                    out.push(format!("{}\"\"\"{}", prefix, line));
                } else {
                    out.push(line.trim_end().to_string());
                }
            }
            out.push("\"\"\"".to_string());
            out
        }
    }
}

/// Plan the edit that writes `text` as the item's documentation.
pub fn plan_edit(
    item: &CodeItem,
    syntax: &DocSyntax,
    source: &SourceText,
    text: &str,
) -> Result<DocEdit, UpdateError> {
    let insertion = item
        .insertion
        .as_ref()
        .ok_or_else(|| UpdateError::NoInsertionPoint {
            item: item.qualified_name(),
            reason: "declaration has no line to place documentation on".to_string(),
        })?;
    let newline = source.line_ending().as_str();
    let lines = render(text, syntax.render);

    let edit = match &item.doc_span {
        Some(doc_span) => {
            // the first line takes the old doc's place; the rest follow its indent
            let mut replacement = String::new();
            for (i, line) in lines.iter().enumerate() {
                if i > 0 {
                    replacement.push_str(newline);
                    if !line.is_empty() {
                        replacement.push_str(&insertion.indent);
                    }
                }
                replacement.push_str(line);
            }
            DocEdit {
                anchor: doc_span.clone(),
                replacement,
                mode: EditMode::Replace,
                item: item.qualified_name(),
            }
        }
        None => {
            let mut replacement = String::new();
            if insertion.inline {
                replacement.push_str(newline);
            }
            for line in &lines {
                if !line.is_empty() {
                    replacement.push_str(&insertion.indent);
                }
                replacement.push_str(line);
                replacement.push_str(newline);
            }
            if insertion.inline {
                replacement.push_str(&insertion.indent);
            }
            DocEdit {
                anchor: source.span(insertion.offset, insertion.offset),
                replacement,
                mode: EditMode::Insert,
                item: item.qualified_name(),
            }
        }
    };
    Ok(edit)
}

/// Apply edits to `text`, highest anchor first.
///
/// Edits are validated against the original text before anything is
/// applied. Inserts sharing an offset keep their relative order.
pub fn apply_edits(text: &str, edits: &[DocEdit]) -> Result<String, UpdateError> {
    for edit in edits {
        let (start, end) = (edit.anchor.start_byte, edit.anchor.end_byte);
        if start > end || end > text.len() {
            return Err(UpdateError::OutOfBounds {
                item: edit.item.clone(),
                start,
                end,
                len: text.len(),
            });
        }
        if !text.is_char_boundary(start) || !text.is_char_boundary(end) {
            return Err(UpdateError::NotCharBoundary {
                item: edit.item.clone(),
                start,
                end,
            });
        }
    }

    let mut order: Vec<usize> = (0..edits.len()).collect();
    order.sort_by_key(|&i| (edits[i].anchor.start_byte, edits[i].anchor.end_byte, i));

    for pair in order.windows(2) {
        let (first, second) = (&edits[pair[0]], &edits[pair[1]]);
        if first.anchor.end_byte > second.anchor.start_byte {
            return Err(UpdateError::Overlap {
                first: first.item.clone(),
                second: second.item.clone(),
            });
        }
    }

    let mut out = text.to_string();
    for &i in order.iter().rev() {
        let edit = &edits[i];
        out.replace_range(edit.anchor.start_byte..edit.anchor.end_byte, &edit.replacement);
    }
    Ok(out)
}
