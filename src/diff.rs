//! Unified diffs for dry runs.

use similar::{ChangeTag, TextDiff};
use std::path::Path;

/// Unified diff between the original and updated text of `path`.
///
/// Empty when the texts are equal.
pub fn unified_diff(path: &Path, original: &str, updated: &str) -> String {
    if original == updated {
        return String::new();
    }
    let name = path.display().to_string().replace('\\', "/");
    let diff = TextDiff::from_lines(original, updated);
    let mut output = format!("--- a/{}\n+++ b/{}\n", name, name);

    for group in diff.grouped_ops(3) {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        let old = first.old_range().start..last.old_range().end;
        let new = first.new_range().start..last.new_range().end;
        output.push_str(&format!(
            "@@ -{},{} +{},{} @@\n",
            old.start + 1,
            old.len(),
            new.start + 1,
            new.len()
        ));
        for op in &group {
            for change in diff.iter_changes(op) {
                let sign = match change.tag() {
                    ChangeTag::Delete => '-',
                    ChangeTag::Insert => '+',
                    ChangeTag::Equal => ' ',
                };
                output.push(sign);
                output.push_str(change.value());
                if change.missing_newline() {
                    output.push('\n');
                }
            }
        }
    }

    output
}
