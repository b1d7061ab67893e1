//! Output formatting for docsync results.
//!
//! Supports two output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption

use colored::*;
use serde::Serialize;

use crate::diff::unified_diff;
use crate::pipeline::{FileResult, ItemReport, RunMode};
use crate::staleness::StalenessPolicy;

/// Totals over every file in a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub files: usize,
    pub files_changed: usize,
    pub files_skipped: usize,
    pub documented: usize,
    pub missing: usize,
    pub outdated: usize,
    pub updated_items: usize,
    pub parse_errors: usize,
    pub failures: usize,
    pub file_errors: usize,
}

impl RunSummary {
    pub fn from_results(results: &[FileResult]) -> Self {
        let mut summary = RunSummary {
            files: results.len(),
            ..Default::default()
        };
        for result in results {
            if result.updated.is_some() {
                summary.files_changed += 1;
            }
            if result.skipped {
                summary.files_skipped += 1;
            }
            summary.documented += result.summary.documented;
            summary.missing += result.summary.missing;
            summary.outdated += result.summary.outdated;
            summary.updated_items += result.edits.len();
            summary.parse_errors += result.summary.parse_errors;
            summary.failures += result.failures.len();
            if result.error.is_some() {
                summary.file_errors += 1;
            }
        }
        summary
    }

    pub fn has_errors(&self) -> bool {
        self.parse_errors > 0 || self.failures > 0 || self.file_errors > 0
    }
}

// =============================================================================
// JSON Format
// =============================================================================

#[derive(Serialize)]
pub struct JsonReport<'a> {
    pub version: &'static str,
    pub mode: RunMode,
    pub policy: String,
    pub summary: RunSummary,
    pub files: Vec<JsonFile<'a>>,
}

#[derive(Serialize)]
pub struct JsonFile<'a> {
    #[serde(flatten)]
    pub result: &'a FileResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

pub fn build_json_report<'a>(mode: RunMode, policy: StalenessPolicy, results: &'a [FileResult]) -> JsonReport<'a> {
    let files = results
        .iter()
        .map(|result| JsonFile {
            result,
            diff: match (&result.updated, mode) {
                (Some(updated), RunMode::DryRun) => {
                    Some(unified_diff(&result.path, &result.original, updated))
                }
                _ => None,
            },
        })
        .collect();
    JsonReport {
        version: env!("CARGO_PKG_VERSION"),
        mode,
        policy: policy.to_string(),
        summary: RunSummary::from_results(results),
        files,
    }
}

/// Write results in JSON format.
pub fn write_json(mode: RunMode, policy: StalenessPolicy, results: &[FileResult]) -> anyhow::Result<()> {
    let report = build_json_report(mode, policy, results);
    let json = serde_json::to_string_pretty(&report)?;
    println!("{}", json);
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write results in colored human-readable format.
///
/// Without `verbose` only items needing attention are listed.
pub fn write_pretty(mode: RunMode, policy: StalenessPolicy, results: &[FileResult], verbose: bool) {
    println!();
    print!("  ");
    print!("{}", "docsync".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    print!("  {}", "Mode:   ".dimmed());
    println!("{}", mode_label(mode));
    print!("  {}", "Policy: ".dimmed());
    println!("{}", policy);
    println!();

    for result in results {
        if !verbose && !needs_listing(result) {
            continue;
        }
        write_file(result, mode, verbose);
        println!();
    }

    let summary = RunSummary::from_results(results);
    write_summary(&summary, mode);
    println!();
}

fn mode_label(mode: RunMode) -> &'static str {
    match mode {
        RunMode::Write => "write",
        RunMode::Check => "check",
        RunMode::Test => "parser test",
        RunMode::DryRun => "dry run",
    }
}

fn needs_listing(result: &FileResult) -> bool {
    result.has_errors() || result.summary.stale() > 0 || result.updated.is_some()
}

fn write_file(result: &FileResult, mode: RunMode, verbose: bool) {
    print!("  {}", result.path.display().to_string().blue());
    print!("  {}", format!("({})", result.language).dimmed());
    if result.written {
        print!("  {}", "updated".green());
    }
    println!();

    if result.skipped {
        println!("    {}", "no parser for this file type, skipped".dimmed());
    }
    if let Some(error) = &result.error {
        println!("    {} {}", "ERROR  ".red(), error);
    }
    for error in &result.parse_errors {
        print!("    {} {}", "PARSE  ".red(), error.scope);
        println!("{} {}", format!(":{}", error.line).dimmed(), error.message);
    }

    for item in &result.items {
        if verbose || item.status != "documented" || item.updated {
            write_item(item);
        }
    }

    for failure in &result.failures {
        print!("    {} {}", "FAILED ".red(), failure.item);
        println!("{} {}", format!(":{}", failure.line).dimmed(), failure.reason);
    }

    if mode == RunMode::DryRun {
        if let Some(updated) = &result.updated {
            println!();
            write_diff(&unified_diff(&result.path, &result.original, updated));
        }
    }
}

fn write_item(item: &ItemReport) {
    match item.status {
        "missing" => print!("    {} ", "MISSING".yellow()),
        "outdated" => print!("    {} ", "STALE  ".yellow().bold()),
        _ => print!("    {} ", "OK     ".green()),
    }
    print!("{:<8} {}", item.kind.as_str().dimmed(), item.name);
    print!("{}", format!(":{}", item.line).dimmed());
    if let Some(reason) = &item.reason {
        print!("  {}", reason.dimmed());
    }
    if item.updated {
        print!("  {}", "→ documented".green());
    }
    println!();
}

fn write_diff(diff: &str) {
    for line in diff.lines() {
        if line.starts_with("+++") || line.starts_with("---") {
            println!("    {}", line.bold());
        } else if line.starts_with('+') {
            println!("    {}", line.green());
        } else if line.starts_with('-') {
            println!("    {}", line.red());
        } else if line.starts_with("@@") {
            println!("    {}", line.cyan());
        } else {
            println!("    {}", line);
        }
    }
}

fn write_summary(summary: &RunSummary, mode: RunMode) {
    println!(
        "  {} files, {} documented, {} missing, {} outdated, {} parse errors",
        summary.files,
        summary.documented.to_string().green(),
        summary.missing.to_string().yellow(),
        summary.outdated.to_string().yellow(),
        summary.parse_errors.to_string().red()
    );
    if mode.generates() {
        let verb = if mode == RunMode::DryRun { "would update" } else { "updated" };
        println!(
            "  {} {} items in {} files",
            verb, summary.updated_items, summary.files_changed
        );
    }
    if summary.files_skipped > 0 {
        println!(
            "  {}",
            format!("{} files skipped (no parser)", summary.files_skipped).dimmed()
        );
    }

    let problems = summary.parse_errors + summary.failures + summary.file_errors;
    if problems > 0 {
        println!("  {}", format!("✗ {} errors", problems).red());
    } else if mode == RunMode::Check && summary.missing + summary.outdated > 0 {
        println!("  {}", "✗ documentation out of date".red());
    } else {
        println!("  {}", "✓ OK".green());
    }
}
