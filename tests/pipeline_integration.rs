//! Integration tests for the full generate-and-write pipeline.
//!
//! Fixtures are copied into a temporary directory and processed with the
//! mock backend, so every run is deterministic and offline.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use docsync::backend::MockBackend;
use docsync::error::BackendError;
use docsync::lang;
use docsync::pipeline::{FileResult, RunMode, RunOptions, Runner};
use docsync::staleness::StalenessPolicy;
use tempfile::TempDir;

const FIXTURES: &[&str] = &[
    "calculator.py",
    "calculator.rs",
    "calculator.js",
    "calculator.ts",
    "calculator.go",
    "Calculator.java",
];

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn setup() {
    lang::init();
}

/// Copy fixtures into a fresh temporary directory.
fn copy_fixtures(files: &[&str]) -> (TempDir, Vec<PathBuf>) {
    let dir = TempDir::new().expect("should create temp dir");
    let paths = files
        .iter()
        .map(|name| {
            let dest = dir.path().join(name);
            fs::copy(testdata_path().join(name), &dest).expect("should copy fixture");
            dest
        })
        .collect();
    (dir, paths)
}

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn options(mode: RunMode) -> RunOptions {
    RunOptions {
        mode,
        policy: StalenessPolicy::SignatureOnly,
        concurrency: 4,
        language: None,
        show_progress: false,
    }
}

fn run_with(mode: RunMode, backend: Arc<MockBackend>, files: &[PathBuf]) -> Vec<FileResult> {
    setup();
    Runner::new(options(mode))
        .with_backend(backend)
        .run(files)
        .expect("run should succeed")
}

fn check(files: &[PathBuf]) -> Vec<FileResult> {
    setup();
    Runner::new(options(RunMode::Check))
        .run(files)
        .expect("check should succeed")
}

#[test]
#[cfg(feature = "tree-sitter")]
fn test_javascript_function_gets_jsdoc() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        dir.path(),
        "sum.js",
        "function calculateSum(a, b) {\n  return a + b;\n}\n",
    );
    let backend = Arc::new(MockBackend::new().with_response("calculateSum", "Adds two numbers."));

    let results = run_with(RunMode::Write, backend, &[path.clone()]);
    assert!(!results[0].has_errors(), "{:?}", results[0]);
    assert!(results[0].written);
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "/**\n * Adds two numbers.\n *\n * @param a\n * @param b\n */\nfunction calculateSum(a, b) {\n  return a + b;\n}\n"
    );
}

#[test]
#[cfg(feature = "tree-sitter")]
fn test_python_function_gets_docstring() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        dir.path(),
        "sum.py",
        "def calculateSum(a, b):\n    return a + b\n",
    );
    let backend = Arc::new(MockBackend::new().with_response("calculateSum", "Adds two numbers."));

    let results = run_with(RunMode::Write, backend, &[path.clone()]);
    assert!(results[0].written);
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "def calculateSum(a, b):\n    \"\"\"Adds two numbers.\n\n    Args:\n        a\n        b\n    \"\"\"\n    return a + b\n"
    );
}

#[test]
#[cfg(feature = "tree-sitter")]
fn test_second_run_is_a_no_op() {
    let (_dir, files) = copy_fixtures(FIXTURES);
    let backend = Arc::new(MockBackend::new());

    let first = run_with(RunMode::Write, Arc::clone(&backend), &files);
    for result in &first {
        assert!(!result.has_errors(), "{}: {:?}", result.path.display(), result);
        // one missing and one outdated item per fixture
        assert_eq!(result.edits.len(), 2, "{}", result.path.display());
        assert!(result.written);
    }
    let after_first: Vec<String> = files.iter().map(|p| fs::read_to_string(p).unwrap()).collect();

    for result in check(&files) {
        assert_eq!(result.summary.stale(), 0, "{}: {:?}", result.path.display(), result.items);
    }

    let calls_before = backend.calls();
    let second = run_with(RunMode::Write, Arc::clone(&backend), &files);
    assert_eq!(backend.calls(), calls_before);
    for (result, before) in second.iter().zip(&after_first) {
        assert!(result.edits.is_empty());
        assert!(result.updated.is_none());
        assert!(!result.written);
        assert_eq!(&fs::read_to_string(&result.path).unwrap(), before);
    }
}

#[test]
#[cfg(feature = "tree-sitter")]
fn test_class_and_method_are_documented_independently() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        dir.path(),
        "calc.py",
        "class Calculator:\n    def add(self, a, b):\n        return a + b\n",
    );
    let backend = Arc::new(
        MockBackend::new()
            .with_response("Calculator", "Keeps a running total.")
            .with_response("Calculator.add", "Adds two numbers."),
    );

    let results = run_with(RunMode::Write, backend, &[path.clone()]);
    assert_eq!(results[0].edits.len(), 2);
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "class Calculator:\n    \"\"\"Keeps a running total.\"\"\"\n    def add(self, a, b):\n        \"\"\"Adds two numbers.\n\n        Args:\n            a\n            b\n        \"\"\"\n        return a + b\n"
    );

    let checked = check(&[path]);
    assert_eq!(checked[0].summary.documented, 2);
}

#[test]
#[cfg(feature = "tree-sitter")]
fn test_only_the_missing_method_is_edited() {
    let dir = TempDir::new().unwrap();
    let source = r#"class Calculator:
    """Keeps a running total."""

    def add(self, a, b):
        """Adds two numbers.

        Args:
            a: first
            b: second
        """
        return a + b

    def reset(self):
        self.total = 0
"#;
    let path = write_file(dir.path(), "calc.py", source);
    let reset_body = source.find("        self.total = 0").unwrap();

    let results = run_with(RunMode::Write, Arc::new(MockBackend::new()), &[path.clone()]);
    let result = &results[0];
    assert_eq!(result.summary.documented, 2);
    assert_eq!(result.summary.missing, 1);
    assert_eq!(result.edits.len(), 1);
    assert_eq!(result.edits[0].item, "Calculator.reset");
    assert_eq!(result.edits[0].anchor.start_byte, reset_body);
    assert_eq!(result.edits[0].anchor.end_byte, reset_body);

    let updated = fs::read_to_string(&path).unwrap();
    assert!(updated.starts_with(&source[..reset_body]));
    assert!(updated.ends_with("        self.total = 0\n"));
    assert_eq!(check(&[path])[0].summary.documented, 3);
}

#[test]
#[cfg(feature = "tree-sitter")]
fn test_destructured_parameters_reach_a_fixed_point() {
    let dir = TempDir::new().unwrap();
    let files = vec![
        write_file(
            dir.path(),
            "opts.js",
            "function f({ a, b }, c) {\n  return a + b + c;\n}\n",
        ),
        write_file(
            dir.path(),
            "opts.ts",
            "function g({ a }: Opts): number {\n  return a;\n}\n",
        ),
    ];
    let backend = Arc::new(MockBackend::new());

    let first = run_with(RunMode::Write, Arc::clone(&backend), &files);
    for result in &first {
        assert!(!result.has_errors(), "{:?}", result);
        assert_eq!(result.edits.len(), 1);
    }
    let js = fs::read_to_string(&files[0]).unwrap();
    assert!(js.contains(" * @param param0\n * @param c\n"), "{}", js);
    let ts = fs::read_to_string(&files[1]).unwrap();
    assert!(ts.contains(" * @param param0\n */\n"), "{}", ts);

    for result in check(&files) {
        assert_eq!(result.summary.stale(), 0, "{:?}", result.items);
    }

    let second = run_with(RunMode::Write, backend, &files);
    for result in &second {
        assert!(result.edits.is_empty());
        assert!(!result.written);
    }
    assert_eq!(fs::read_to_string(&files[0]).unwrap(), js);
    assert_eq!(fs::read_to_string(&files[1]).unwrap(), ts);
}

#[test]
#[cfg(feature = "tree-sitter")]
fn test_backend_failure_is_isolated_to_its_item() {
    let (_dir, files) = copy_fixtures(&["calculator.py"]);
    let original = fs::read_to_string(&files[0]).unwrap();
    let backend = Arc::new(MockBackend::new().with_failure(
        "calculateSum",
        BackendError::Auth("invalid key".to_string()),
    ));

    let results = run_with(RunMode::Write, backend, &files);
    let result = &results[0];
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].item, "calculateSum");
    assert!(result.failures[0].reason.contains("invalid key"));
    assert!(result.has_errors());

    // the outdated method was still rewritten
    assert_eq!(result.edits.len(), 1);
    assert_eq!(result.edits[0].item, "Calculator.add");
    let updated = fs::read_to_string(&files[0]).unwrap();
    assert_ne!(updated, original);
    assert!(updated.contains("def calculateSum(a, b):\n    return a + b\n"));
}

#[test]
#[cfg(feature = "tree-sitter")]
fn test_no_successful_item_leaves_file_untouched() {
    let (_dir, files) = copy_fixtures(&["calculator.go"]);
    let original = fs::read_to_string(&files[0]).unwrap();
    let backend = Arc::new(
        MockBackend::new()
            .with_failure("CalculateSum", BackendError::Timeout)
            .with_failure("Add", BackendError::Server { status: 503 }),
    );

    let results = run_with(RunMode::Write, backend, &files);
    assert_eq!(results[0].failures.len(), 2);
    assert!(results[0].updated.is_none());
    assert!(!results[0].written);
    assert_eq!(fs::read_to_string(&files[0]).unwrap(), original);
}

#[test]
#[cfg(feature = "tree-sitter")]
fn test_crlf_line_endings_are_kept() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        dir.path(),
        "sum.py",
        "def calculateSum(a, b):\r\n    return a + b\r\n",
    );
    let backend = Arc::new(MockBackend::new().with_response("calculateSum", "Adds two numbers."));

    run_with(RunMode::Write, backend, &[path.clone()]);
    let updated = fs::read_to_string(&path).unwrap();
    assert!(updated.contains("    \"\"\"Adds two numbers.\r\n"));
    assert_eq!(updated.matches('\n').count(), updated.matches("\r\n").count());
}

#[test]
#[cfg(feature = "tree-sitter")]
fn test_check_mode_counts_without_writing() {
    let (_dir, files) = copy_fixtures(FIXTURES);
    let originals: Vec<String> = files.iter().map(|p| fs::read_to_string(p).unwrap()).collect();

    let results = check(&files);
    assert_eq!(results.len(), FIXTURES.len());
    for (result, original) in results.iter().zip(&originals) {
        assert_eq!(result.summary.documented, 2, "{}", result.path.display());
        assert_eq!(result.summary.missing, 1, "{}", result.path.display());
        assert_eq!(result.summary.outdated, 1, "{}", result.path.display());
        assert!(result.edits.is_empty());
        assert_eq!(&fs::read_to_string(&result.path).unwrap(), original);
    }
}

#[test]
#[cfg(feature = "tree-sitter")]
fn test_dry_run_keeps_files_and_returns_new_text() {
    let (_dir, files) = copy_fixtures(&["calculator.rs"]);
    let original = fs::read_to_string(&files[0]).unwrap();

    let results = run_with(RunMode::DryRun, Arc::new(MockBackend::new()), &files);
    let result = &results[0];
    assert!(!result.written);
    assert_eq!(fs::read_to_string(&files[0]).unwrap(), original);

    let updated = result.updated.as_ref().expect("dry run should produce text");
    assert!(updated.contains("/// Mock documentation for function `calculate_sum`.\n"));
    assert!(updated.contains("/// * `times`\n"));
}

#[test]
#[cfg(feature = "tree-sitter")]
fn test_concurrency_limit_bounds_backend_calls() {
    let dir = TempDir::new().unwrap();
    let files: Vec<PathBuf> = (0..6)
        .map(|i| {
            write_file(
                dir.path(),
                &format!("f{}.py", i),
                "def one(a):\n    return a\n\n\ndef two(b):\n    return b\n\n\ndef three(c):\n    return c\n",
            )
        })
        .collect();
    let backend = Arc::new(MockBackend::new().with_delay(Duration::from_millis(20)));

    setup();
    let results = Runner::new(RunOptions {
        concurrency: 2,
        ..options(RunMode::DryRun)
    })
    .with_backend(Arc::clone(&backend) as Arc<dyn docsync::DocBackend>)
    .run(&files)
    .unwrap();

    assert_eq!(backend.calls(), 18);
    assert!(backend.peak_in_flight() >= 1);
    assert!(backend.peak_in_flight() <= 2, "peak {}", backend.peak_in_flight());

    // results come back in input order
    let paths: Vec<&PathBuf> = results.iter().map(|r| &r.path).collect();
    assert_eq!(paths, files.iter().collect::<Vec<_>>());
}
