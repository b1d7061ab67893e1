//! Staleness detection.
//!
//! Documentation is compared against the item's current parameter surface
//! (and optionally its body digest). The parameter list recorded in a doc is
//! recovered from whichever convention the doc uses: `@param` tags, an inline
//! `Parameters: a, b` line, or a `Parameters`/`Args`/`# Arguments` section.

use regex::Regex;
use sha2::{Digest, Sha256};
use std::fmt;

use crate::item::CodeItem;

/// Marker line recording the body digest under [`StalenessPolicy::SignatureAndBody`].
pub const BODY_DIGEST_MARKER: &str = "Body-Digest:";

const DIGEST_LEN: usize = 12;

lazy_static::lazy_static! {
    // @param name, @param {Type} name, @param [name=default], @arg, @argument
    static ref TAG_RE: Regex = Regex::new(r"^\s*\*?\s*@(?:param|arg|argument)\b\s*(?:\{[^}]*\}\s*)?\[?\s*([A-Za-z_$][\w$.]*)").unwrap();
    // Parameters: a, b
    static ref INLINE_RE: Regex = Regex::new(r"(?i)^\s*(?:parameters|params|args|arguments)\s*:\s*(\S.*)$").unwrap();
    // Args:, Parameters, # Arguments
    static ref SECTION_RE: Regex = Regex::new(r"(?i)^\s*(?:#+\s*)?(?:parameters|params|args|arguments)\s*:?\s*$").unwrap();
    static ref UNDERLINE_RE: Regex = Regex::new(r"^\s*[-=]{3,}\s*$").unwrap();
    static ref NAME_RE: Regex = Regex::new(r"^[A-Za-z_$][\w$]*").unwrap();
    static ref DIGEST_RE: Regex = Regex::new(r"(?m)^\s*Body-Digest:\s*([0-9a-fA-F]+)\s*$").unwrap();
}

/// Which changes make documentation stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StalenessPolicy {
    /// Only parameter changes invalidate a doc.
    #[default]
    SignatureOnly,
    /// Body changes invalidate a doc too, tracked by a `Body-Digest:` line.
    SignatureAndBody,
}

impl StalenessPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            StalenessPolicy::SignatureOnly => "signature",
            StalenessPolicy::SignatureAndBody => "signature+body",
        }
    }
}

impl fmt::Display for StalenessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a doc is considered out of date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutdatedReason {
    EmptyDoc,
    /// The doc records no parameter list we can read.
    UnparsableFingerprint,
    ParamsChanged {
        recorded: Vec<String>,
        current: Vec<String>,
    },
    MissingBodyDigest,
    BodyChanged,
}

impl fmt::Display for OutdatedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutdatedReason::EmptyDoc => write!(f, "documentation is empty"),
            OutdatedReason::UnparsableFingerprint => {
                write!(f, "documentation does not record the parameter list")
            }
            OutdatedReason::ParamsChanged { recorded, current } => write!(
                f,
                "parameters changed from ({}) to ({})",
                recorded.join(", "),
                current.join(", ")
            ),
            OutdatedReason::MissingBodyDigest => write!(f, "documentation has no body digest"),
            OutdatedReason::BodyChanged => write!(f, "body changed since documentation was written"),
        }
    }
}

/// Classification of one item's documentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocStatus {
    Documented,
    Missing,
    Outdated(OutdatedReason),
}

impl DocStatus {
    pub fn needs_generation(&self) -> bool {
        !matches!(self, DocStatus::Documented)
    }

    pub fn label(&self) -> &'static str {
        match self {
            DocStatus::Documented => "documented",
            DocStatus::Missing => "missing",
            DocStatus::Outdated(_) => "outdated",
        }
    }
}

impl fmt::Display for DocStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocStatus::Outdated(reason) => write!(f, "outdated: {}", reason),
            other => write!(f, "{}", other.label()),
        }
    }
}

/// Classify an item given the text of its existing doc, if any.
pub fn classify(item: &CodeItem, doc_text: Option<&str>, policy: StalenessPolicy) -> DocStatus {
    let Some(doc) = doc_text else {
        return DocStatus::Missing;
    };
    if doc.trim().is_empty() {
        return DocStatus::Outdated(OutdatedReason::EmptyDoc);
    }
    if !item.kind.is_callable() {
        return DocStatus::Documented;
    }

    match recorded_params(doc) {
        Some(recorded) if recorded != item.params => {
            return DocStatus::Outdated(OutdatedReason::ParamsChanged {
                recorded,
                current: item.params.clone(),
            });
        }
        None if !item.params.is_empty() => {
            return DocStatus::Outdated(OutdatedReason::UnparsableFingerprint);
        }
        _ => {}
    }

    if policy == StalenessPolicy::SignatureAndBody {
        if let Some(current) = &item.body_digest {
            match recorded_body_digest(doc) {
                None => return DocStatus::Outdated(OutdatedReason::MissingBodyDigest),
                Some(recorded) if !recorded.eq_ignore_ascii_case(current) => {
                    return DocStatus::Outdated(OutdatedReason::BodyChanged)
                }
                Some(_) => {}
            }
        }
    }

    DocStatus::Documented
}

/// Parameter names recorded in a doc, or `None` when it records none.
///
/// Tags win over sections; among inline markers and sections the last one
/// wins. `Parameters: none` records an empty list.
pub fn recorded_params(doc: &str) -> Option<Vec<String>> {
    let lines: Vec<&str> = doc.lines().collect();

    let mut tags = Vec::new();
    let mut saw_tag = false;
    for line in &lines {
        if let Some(caps) = TAG_RE.captures(line) {
            saw_tag = true;
            let name = &caps[1];
            // @param options.name documents a property, not a parameter
            if !name.contains('.') {
                tags.push(name.to_string());
            }
        }
    }
    if saw_tag {
        return Some(tags);
    }

    let mut found = None;
    for (i, line) in lines.iter().enumerate() {
        if let Some(caps) = INLINE_RE.captures(line) {
            if let Some(names) = parse_inline(&caps[1]) {
                found = Some(names);
            }
        } else if SECTION_RE.is_match(line) {
            found = Some(section_entries(&lines, i));
        }
    }
    found
}

/// Whether a doc line is a `@param`-style tag.
pub fn is_param_tag(line: &str) -> bool {
    TAG_RE.is_match(line)
}

/// The `Body-Digest:` value recorded in a doc.
pub fn recorded_body_digest(doc: &str) -> Option<String> {
    DIGEST_RE.captures(doc).map(|caps| caps[1].to_string())
}

fn parse_inline(list: &str) -> Option<Vec<String>> {
    let list = list.trim();
    if list.eq_ignore_ascii_case("none") || list == "-" {
        return Some(Vec::new());
    }
    list.split(',').map(|part| entry_name(part, true)).collect()
}

fn section_entries(lines: &[&str], header: usize) -> Vec<String> {
    let header_indent = indent_width(lines[header]);
    let mut j = header + 1;
    if lines.get(j).is_some_and(|l| UNDERLINE_RE.is_match(l)) {
        j += 1;
    }
    while lines.get(j).is_some_and(|l| l.trim().is_empty()) {
        j += 1;
    }

    let mut names = Vec::new();
    let Some(first) = lines.get(j) else {
        return names;
    };
    let entry_indent = indent_width(first);
    if entry_indent < header_indent {
        return names;
    }

    for (k, line) in lines.iter().enumerate().skip(j) {
        if line.trim().is_empty() {
            break;
        }
        let indent = indent_width(line);
        if indent < entry_indent {
            break;
        }
        if indent > entry_indent {
            continue;
        }
        // next numpy-style section header
        if lines.get(k + 1).is_some_and(|l| UNDERLINE_RE.is_match(l)) {
            break;
        }
        match entry_name(line, false) {
            Some(name) => names.push(name),
            None => break,
        }
    }
    names
}

/// Parameter name at the start of a list entry.
///
/// Accepts `name`, `name: ...`, `name (type): ...`, `name : type`,
/// `* \`name\` - ...` and `*args`. With `strict`, anything after the name
/// must start a type or description.
fn entry_name(entry: &str, strict: bool) -> Option<String> {
    let entry = entry.trim_start();
    let entry = entry.strip_prefix("- ").or_else(|| entry.strip_prefix("* ")).unwrap_or(entry);
    let entry = entry.trim_start().trim_start_matches('`').trim_start_matches('*');
    let name = NAME_RE.find(entry)?.as_str();
    if strict {
        let rest = entry[name.len()..].trim_start();
        if !(rest.is_empty() || rest.starts_with([':', '(', '=', '`', '-'])) {
            return None;
        }
    }
    Some(name.to_string())
}

fn indent_width(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Collapse whitespace runs to a single space.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Short SHA-256 hex digest of already-normalized text.
pub fn digest(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let mut hex = hex::encode(hasher.finalize());
    hex.truncate(DIGEST_LEN);
    hex
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemKind;
    use crate::text::SourceText;

    fn callable(params: &[&str]) -> CodeItem {
        let src = SourceText::new("function f() {}");
        CodeItem {
            kind: ItemKind::Function,
            name: "f".to_string(),
            parent: None,
            signature: "function f()".to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
            body_digest: Some(digest("return 1;")),
            span: src.span(0, 14),
            doc_span: None,
            indent: String::new(),
            insertion: None,
        }
    }

    #[test]
    fn test_missing_when_no_doc() {
        assert_eq!(
            classify(&callable(&["a"]), None, StalenessPolicy::default()),
            DocStatus::Missing
        );
    }

    #[test]
    fn test_added_parameter_is_outdated() {
        let doc = "Adds numbers.\n@param a\n@param b";
        let status = classify(&callable(&["a", "b", "c"]), Some(doc), StalenessPolicy::default());
        assert_eq!(
            status,
            DocStatus::Outdated(OutdatedReason::ParamsChanged {
                recorded: vec!["a".into(), "b".into()],
                current: vec!["a".into(), "b".into(), "c".into()],
            })
        );
    }

    #[test]
    fn test_reordered_parameters_are_outdated() {
        let doc = "Args:\n    b: second\n    a: first";
        let status = classify(&callable(&["a", "b"]), Some(doc), StalenessPolicy::default());
        assert!(matches!(status, DocStatus::Outdated(OutdatedReason::ParamsChanged { .. })));
    }

    #[test]
    fn test_freeform_prose_with_params_is_outdated() {
        let doc = "Adds two numbers together and returns the result.";
        assert_eq!(
            classify(&callable(&["a", "b"]), Some(doc), StalenessPolicy::default()),
            DocStatus::Outdated(OutdatedReason::UnparsableFingerprint)
        );
    }

    #[test]
    fn test_freeform_prose_without_params_is_documented() {
        let doc = "Returns the current version.";
        assert_eq!(
            classify(&callable(&[]), Some(doc), StalenessPolicy::default()),
            DocStatus::Documented
        );
    }

    #[test]
    fn test_empty_doc_is_outdated() {
        assert_eq!(
            classify(&callable(&[]), Some("  \n"), StalenessPolicy::default()),
            DocStatus::Outdated(OutdatedReason::EmptyDoc)
        );
    }

    #[test]
    fn test_class_with_doc_is_documented() {
        let mut item = callable(&[]);
        item.kind = ItemKind::Class;
        assert_eq!(
            classify(&item, Some("A calculator."), StalenessPolicy::SignatureAndBody),
            DocStatus::Documented
        );
    }

    #[test]
    fn test_recorded_params_formats() {
        assert_eq!(
            recorded_params("@param {number} a - first\n@param {number} [b=2]"),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(
            recorded_params("@param {Object} opts\n@param {string} opts.name"),
            Some(vec!["opts".to_string()])
        );
        assert_eq!(
            recorded_params("Sums.\n\nParameters: a, b"),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(recorded_params("Parameters: none"), Some(vec![]));
        assert_eq!(
            recorded_params("Adds.\n\n# Arguments\n\n* `a` - first\n* `b` - second\n\n# Returns\n\nSum."),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(
            recorded_params("Adds.\n\nParameters\n----------\na : int\n    First.\nb : int\n\nReturns\n-------\nint"),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(
            recorded_params("Adds.\n\nArgs:\n    *values (int): numbers\n    **kw: extra\nReturns:\n    int"),
            Some(vec!["values".to_string(), "kw".to_string()])
        );
        assert_eq!(recorded_params("Just prose."), None);
    }

    #[test]
    fn test_original_tool_docstring_format() {
        let doc = "Adds two numbers together.\n\nParameters:\na (int or float): The first number.\nb (int or float): The second number.\n\nReturns:\nint or float: The sum.";
        assert_eq!(
            recorded_params(doc),
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_last_section_wins() {
        let doc = "Args:\n    a: old\n\nArgs:\n    a: new\n    b: new";
        assert_eq!(
            recorded_params(doc),
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_inline_prose_is_not_a_parameter_list() {
        assert_eq!(recorded_params("Params: the numbers to add"), None);
    }

    #[test]
    fn test_body_policy() {
        let item = callable(&["a"]);
        let current = item.body_digest.clone().unwrap();

        let without = "Doc.\n@param a";
        assert_eq!(
            classify(&item, Some(without), StalenessPolicy::SignatureOnly),
            DocStatus::Documented
        );
        assert_eq!(
            classify(&item, Some(without), StalenessPolicy::SignatureAndBody),
            DocStatus::Outdated(OutdatedReason::MissingBodyDigest)
        );

        let stale = "Doc.\n@param a\n\nBody-Digest: 000000000000";
        assert_eq!(
            classify(&item, Some(stale), StalenessPolicy::SignatureAndBody),
            DocStatus::Outdated(OutdatedReason::BodyChanged)
        );

        let fresh = format!("Doc.\n@param a\n\n{} {}", BODY_DIGEST_MARKER, current);
        assert_eq!(
            classify(&item, Some(&fresh), StalenessPolicy::SignatureAndBody),
            DocStatus::Documented
        );
    }

    #[test]
    fn test_normalize_and_digest() {
        assert_eq!(normalize_whitespace("fn  add(\n  a: i32 )"), "fn add( a: i32 )");
        let d = digest("return a + b;");
        assert_eq!(d.len(), DIGEST_LEN);
        assert_eq!(d, digest("return a + b;"));
        assert_ne!(d, digest("return a - b;"));
    }
}
