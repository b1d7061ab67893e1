//! Per-file processing: parse, classify, generate, edit, write.
//!
//! Each file goes through those steps strictly in order. Files run in
//! parallel: on rayon when no backend is involved, otherwise on a tokio
//! runtime with a semaphore bounding in-flight backend calls. Results come
//! back in input order.

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::backend::{DocBackend, GenerationContext};
use crate::error::{BackendError, ParseError, WriteError};
use crate::item::{CodeItem, ItemKind};
use crate::lang::{self, Language, LanguageParser};
use crate::staleness::{self, DocStatus, StalenessPolicy};
use crate::text::SourceText;
use crate::updater::{self, DocEdit};

/// What a run does with the files it processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    /// Generate documentation and rewrite files.
    Write,
    /// Classify only; no backend, no writes.
    Check,
    /// Parse and classify to exercise the parsers; no backend, no writes.
    Test,
    /// Generate documentation but keep the new text in memory.
    DryRun,
}

impl RunMode {
    pub fn generates(&self) -> bool {
        matches!(self, RunMode::Write | RunMode::DryRun)
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub mode: RunMode,
    pub policy: StalenessPolicy,
    /// Files (and backend calls) in flight at once.
    pub concurrency: usize,
    /// Force a language instead of detecting it per file.
    pub language: Option<Language>,
    pub show_progress: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            mode: RunMode::Write,
            policy: StalenessPolicy::default(),
            concurrency: crate::config::DEFAULT_CONCURRENCY,
            language: None,
            show_progress: false,
        }
    }
}

/// An item together with its existing doc and classification.
#[derive(Debug, Clone)]
pub struct AnalyzedItem {
    pub item: CodeItem,
    pub doc_text: Option<String>,
    pub status: DocStatus,
}

/// Parse and classification result for one text.
#[derive(Debug)]
pub struct Analysis {
    pub source: SourceText,
    pub items: Vec<AnalyzedItem>,
    pub parse_errors: Vec<ParseError>,
}

/// Locate items in `source` and classify their documentation.
pub fn analyze(
    parser: &dyn LanguageParser,
    source: SourceText,
    policy: StalenessPolicy,
) -> anyhow::Result<Analysis> {
    let outcome = parser.locate_items(&source)?;
    let items = outcome
        .items
        .into_iter()
        .map(|item| {
            let doc_text = item
                .doc_span
                .as_ref()
                .map(|span| parser.extract_doc_text(&source, span));
            let status = staleness::classify(&item, doc_text.as_deref(), policy);
            AnalyzedItem {
                item,
                doc_text,
                status,
            }
        })
        .collect();
    Ok(Analysis {
        source,
        items,
        parse_errors: outcome.errors,
    })
}

/// Per-item line in a file report.
#[derive(Debug, Clone, Serialize)]
pub struct ItemReport {
    pub name: String,
    pub kind: ItemKind,
    pub line: usize,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// A new doc was produced for this item.
    pub updated: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub documented: usize,
    pub missing: usize,
    pub outdated: usize,
    /// Syntax errors found while locating items.
    pub parse_errors: usize,
}

impl StatusSummary {
    fn record(&mut self, status: &DocStatus) {
        match status {
            DocStatus::Documented => self.documented += 1,
            DocStatus::Missing => self.missing += 1,
            DocStatus::Outdated(_) => self.outdated += 1,
        }
    }

    pub fn stale(&self) -> usize {
        self.missing + self.outdated
    }
}

/// An item whose documentation could not be produced or placed.
#[derive(Debug, Clone, Serialize)]
pub struct ItemFailure {
    pub item: String,
    pub line: usize,
    pub reason: String,
}

/// Everything that happened to one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub path: PathBuf,
    pub language: Language,
    pub items: Vec<ItemReport>,
    pub summary: StatusSummary,
    pub parse_errors: Vec<ParseError>,
    pub failures: Vec<ItemFailure>,
    /// Applied edits in document order.
    pub edits: Vec<DocEdit>,
    #[serde(skip)]
    pub original: String,
    /// New text, when any edit was applied.
    #[serde(skip)]
    pub updated: Option<String>,
    pub written: bool,
    /// No parser for this language; the file was left alone.
    pub skipped: bool,
    /// File-level failure (read, write or parser setup).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileResult {
    fn new(path: &Path, language: Language) -> Self {
        Self {
            path: path.to_path_buf(),
            language,
            items: Vec::new(),
            summary: StatusSummary::default(),
            parse_errors: Vec::new(),
            failures: Vec::new(),
            edits: Vec::new(),
            original: String::new(),
            updated: None,
            written: false,
            skipped: false,
            error: None,
        }
    }

    /// Parse errors, item failures or a file-level error occurred.
    pub fn has_errors(&self) -> bool {
        !self.parse_errors.is_empty() || !self.failures.is_empty() || self.error.is_some()
    }
}

/// Drives a run over a list of files.
pub struct Runner {
    options: RunOptions,
    backend: Option<Arc<dyn DocBackend>>,
}

impl Runner {
    pub fn new(options: RunOptions) -> Self {
        Self {
            options,
            backend: None,
        }
    }

    pub fn with_backend(mut self, backend: Arc<dyn DocBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Process every file, returning results in input order.
    ///
    /// Generating modes need a backend and start their own tokio runtime, so
    /// this must not be called from inside one; use [`Runner::run_async`]
    /// there.
    pub fn run(&self, files: &[PathBuf]) -> anyhow::Result<Vec<FileResult>> {
        if self.options.mode.generates() {
            let backend = self
                .backend
                .clone()
                .ok_or_else(|| anyhow::anyhow!("a backend is required to generate documentation"))?;
            let runtime = tokio::runtime::Runtime::new()?;
            return Ok(runtime.block_on(self.run_async(files, backend)));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.concurrency.max(1))
            .build()?;
        let progress = self.progress_bar(files.len());
        let results: Vec<FileResult> = pool.install(|| {
            files
                .par_iter()
                .map(|path| {
                    let result = self.process_offline(path);
                    progress.inc(1);
                    result
                })
                .collect()
        });
        progress.finish_and_clear();
        Ok(results)
    }

    /// Generate documentation for every file on the current runtime.
    pub async fn run_async(&self, files: &[PathBuf], backend: Arc<dyn DocBackend>) -> Vec<FileResult> {
        let concurrency = self.options.concurrency.max(1);
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let progress = self.progress_bar(files.len());
        info!(
            files = files.len(),
            backend = backend.name(),
            concurrency,
            "generating documentation"
        );

        let mut results: Vec<(usize, FileResult)> = stream::iter(files.iter().enumerate())
            .map(|(index, path)| {
                let backend = Arc::clone(&backend);
                let semaphore = Arc::clone(&semaphore);
                let progress = progress.clone();
                async move {
                    let result = self.process_generating(path, backend, semaphore).await;
                    progress.inc(1);
                    (index, result)
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        progress.finish_and_clear();
        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, result)| result).collect()
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.options.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}") {
            bar.set_style(style);
        }
        bar
    }

    /// Read, parse and classify one file. `Err` carries the finished result.
    fn prepare(&self, path: &Path) -> Result<(FileResult, Analysis, &'static dyn LanguageParser), FileResult> {
        let language = self.options.language.unwrap_or_else(|| Language::detect(path));
        let mut result = FileResult::new(path, language);

        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read file");
                result.error = Some(format!("failed to read file: {}", e));
                return Err(result);
            }
        };
        result.original = text.clone();

        let parser = lang::get_parser(language);
        if parser.language() == Language::Generic {
            warn!(path = %path.display(), "no parser for this file type, leaving it untouched");
            result.skipped = true;
            return Err(result);
        }

        let analysis = match analyze(parser, SourceText::new(text), self.options.policy) {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "parser failed");
                result.error = Some(format!("parser failed: {}", e));
                return Err(result);
            }
        };

        for error in &analysis.parse_errors {
            warn!(path = %path.display(), scope = %error.scope, line = error.line, "{}", error.message);
        }
        result.parse_errors = analysis.parse_errors.clone();
        result.summary.parse_errors = analysis.parse_errors.len();
        for analyzed in &analysis.items {
            result.summary.record(&analyzed.status);
        }
        debug!(
            path = %path.display(),
            items = analysis.items.len(),
            missing = result.summary.missing,
            outdated = result.summary.outdated,
            "classified"
        );
        Ok((result, analysis, parser))
    }

    fn process_offline(&self, path: &Path) -> FileResult {
        let (mut result, analysis, _) = match self.prepare(path) {
            Ok(prepared) => prepared,
            Err(result) => return result,
        };
        result.items = item_reports(&analysis, &[]);
        result
    }

    async fn process_generating(
        &self,
        path: &Path,
        backend: Arc<dyn DocBackend>,
        semaphore: Arc<Semaphore>,
    ) -> FileResult {
        let (mut result, analysis, parser) = match self.prepare(path) {
            Ok(prepared) => prepared,
            Err(result) => return result,
        };
        let syntax = *parser.doc_syntax();
        let language = result.language;

        let mut pending = Vec::new();
        for analyzed in analysis.items.iter().filter(|a| a.status.needs_generation()) {
            if analyzed.item.insertion.is_none() {
                result.failures.push(ItemFailure {
                    item: analyzed.item.qualified_name(),
                    line: analyzed.item.line(),
                    reason: "declaration has no line to place documentation on".to_string(),
                });
                continue;
            }
            pending.push(analyzed);
        }

        let generated = futures::future::join_all(pending.iter().map(|analyzed| {
            let outdated_doc = match analyzed.status {
                DocStatus::Outdated(_) => analyzed.doc_text.clone(),
                _ => None,
            };
            let ctx = GenerationContext::new(language, &analyzed.item, &analysis.source, outdated_doc);
            let backend = Arc::clone(&backend);
            let semaphore = Arc::clone(&semaphore);
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|_| BackendError::Unavailable("run is shutting down".to_string()))?;
                backend.generate(&ctx).await
            }
        }))
        .await;

        let mut edits = Vec::new();
        for (analyzed, outcome) in pending.iter().zip(generated) {
            let item = &analyzed.item;
            let planned = outcome.map_err(|e| e.to_string()).and_then(|raw| {
                let text = updater::compose_doc_text(&raw, item, &syntax, self.options.policy);
                updater::plan_edit(item, &syntax, &analysis.source, &text).map_err(|e| e.to_string())
            });
            match planned {
                Ok(edit) => edits.push(edit),
                Err(reason) => {
                    warn!(path = %path.display(), item = %item.qualified_name(), "{}", reason);
                    result.failures.push(ItemFailure {
                        item: item.qualified_name(),
                        line: item.line(),
                        reason,
                    });
                }
            }
        }

        if edits.is_empty() {
            result.items = item_reports(&analysis, &[]);
            return result;
        }

        let updated = match updater::apply_edits(analysis.source.as_str(), &edits) {
            Ok(updated) => updated,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "edits rejected, file left untouched");
                result.error = Some(e.to_string());
                result.items = item_reports(&analysis, &[]);
                return result;
            }
        };

        if self.options.mode == RunMode::Write {
            match write_atomic(path, &updated) {
                Ok(()) => {
                    info!(path = %path.display(), edits = edits.len(), "updated documentation");
                    result.written = true;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "write failed, file left untouched");
                    result.error = Some(e.to_string());
                    result.items = item_reports(&analysis, &[]);
                    return result;
                }
            }
        }

        edits.sort_by_key(|edit| (edit.anchor.start_byte, edit.anchor.end_byte));
        result.items = item_reports(&analysis, &edits);
        result.edits = edits;
        result.updated = Some(updated);
        result
    }
}

fn item_reports(analysis: &Analysis, edits: &[DocEdit]) -> Vec<ItemReport> {
    analysis
        .items
        .iter()
        .map(|analyzed| {
            let name = analyzed.item.qualified_name();
            let reason = match &analyzed.status {
                DocStatus::Outdated(reason) => Some(reason.to_string()),
                _ => None,
            };
            ItemReport {
                updated: edits.iter().any(|e| e.item == name),
                kind: analyzed.item.kind,
                line: analyzed.item.line(),
                status: analyzed.status.label(),
                reason,
                name,
            }
        })
        .collect()
}

/// Replace `path` with `contents` via a temporary sibling and a rename.
///
/// On failure the original file is untouched and the temporary is removed.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), WriteError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.docsync.tmp", file_name));

    let result: std::io::Result<()> = (|| {
        fs::write(&tmp, contents)?;
        if let Ok(metadata) = fs::metadata(path) {
            fs::set_permissions(&tmp, metadata.permissions())?;
        }
        fs::rename(&tmp, path)
    })();

    if let Err(source) = result {
        let _ = fs::remove_file(&tmp);
        return Err(WriteError {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_replaces_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.py");
        fs::write(&path, "old\n").unwrap();

        write_atomic(&path, "new\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
        let leftovers: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_write_atomic_failure_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("a.py");
        let err = write_atomic(&path, "new\n").unwrap_err();
        assert_eq!(err.path, path);
        assert!(!path.exists());
    }

    #[test]
    fn test_unreadable_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let runner = Runner::new(RunOptions {
            mode: RunMode::Check,
            ..RunOptions::default()
        });
        let results = runner.run(&[dir.path().join("nope.py")]).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].error.is_some());
        assert!(results[0].has_errors());
    }

    #[test]
    fn test_unknown_language_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "function f() {}\n").unwrap();
        let runner = Runner::new(RunOptions {
            mode: RunMode::Check,
            ..RunOptions::default()
        });
        let results = runner.run(&[path]).unwrap();
        assert!(results[0].skipped);
        assert!(results[0].items.is_empty());
        assert!(!results[0].has_errors());
    }

    #[test]
    #[cfg(feature = "tree-sitter")]
    fn test_failed_write_reports_no_applied_edits() {
        use crate::backend::MockBackend;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sum.py");
        let original = "def add(a, b):\n    return a + b\n";
        fs::write(&path, original).unwrap();
        // a directory in the way of the temporary file makes the write fail
        fs::create_dir(dir.path().join(".sum.py.docsync.tmp")).unwrap();

        let runner = Runner::new(RunOptions::default()).with_backend(Arc::new(MockBackend::new()));
        let results = runner.run(&[path.clone()]).unwrap();
        let result = &results[0];

        assert!(result.error.is_some());
        assert!(!result.written);
        assert!(result.edits.is_empty());
        assert!(result.updated.is_none());
        assert!(result.items.iter().all(|item| !item.updated));
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    #[cfg(feature = "tree-sitter")]
    fn test_summary_counts_parse_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.py");
        fs::write(&path, "def good(a):\n    return a\n\n\ndef bad(x:\n    return x\n").unwrap();

        let runner = Runner::new(RunOptions {
            mode: RunMode::Check,
            ..RunOptions::default()
        });
        let results = runner.run(&[path]).unwrap();
        let result = &results[0];

        assert!(result.summary.parse_errors > 0);
        assert_eq!(result.summary.parse_errors, result.parse_errors.len());
        assert!(result.has_errors());
    }

    #[test]
    fn test_generating_without_backend_is_an_error() {
        let runner = Runner::new(RunOptions::default());
        assert!(runner.run(&[]).is_err());
    }
}
