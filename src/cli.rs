//! Command-line interface for docsync.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use walkdir::WalkDir;

use crate::backend::{self, Provider};
use crate::config::{load_env_file, Config};
use crate::lang::{self, Language};
use crate::pipeline::{FileResult, RunMode, RunOptions, Runner};
use crate::report;
use crate::staleness::StalenessPolicy;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Directory names never descended into.
const SKIPPED_DIRS: &[&str] = &["node_modules", "vendor", "target", "__pycache__", "venv"];

/// Keep documentation comments in sync with the code they describe.
///
/// Docsync finds functions, methods and classes whose documentation is
/// missing or no longer matches their parameters, and writes new
/// documentation generated by an LLM provider.
#[derive(Parser, Debug)]
#[command(name = "docsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Files or directories to process
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Language: auto, python, rust, javascript, typescript, tsx, go, java
    #[arg(short, long, default_value = "auto")]
    pub language: String,

    /// LLM provider: openai, anthropic (or claude), mock (default: openai)
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Report missing and outdated documentation without changing files
    #[arg(short, long, conflicts_with_all = ["test", "dry_run"])]
    pub check: bool,

    /// Parse and classify only, without calling a provider
    #[arg(long, conflicts_with = "dry_run")]
    pub test: bool,

    /// Generate documentation and print diffs instead of writing files
    #[arg(long)]
    pub dry_run: bool,

    /// List every item and enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Path to config YAML file (default: auto-discover)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Maximum files and provider calls in flight
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Also treat body changes as making documentation stale
    #[arg(long)]
    pub body_changes: bool,

    /// Model name passed to the provider
    #[arg(long)]
    pub model: Option<String>,
}

impl Cli {
    pub fn mode(&self) -> RunMode {
        if self.check {
            RunMode::Check
        } else if self.test {
            RunMode::Test
        } else if self.dry_run {
            RunMode::DryRun
        } else {
            RunMode::Write
        }
    }
}

/// Collect supported source files under `root`.
pub fn collect_files(root: &Path, config: &Config) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            // Skip hidden, dependency and build directories
            !name.starts_with('.') && !SKIPPED_DIRS.contains(&&*name)
        })
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !lang::is_supported_extension(ext) {
            continue;
        }
        let relative = path.strip_prefix(root).unwrap_or(path);
        if config.is_path_excluded(relative) || config.is_path_excluded(path) {
            continue;
        }
        files.push(path.to_path_buf());
    }

    Ok(files)
}

/// Exit code for a finished run.
pub fn exit_code(mode: RunMode, results: &[FileResult]) -> i32 {
    if results.iter().any(FileResult::has_errors) {
        return EXIT_FAILED;
    }
    if mode == RunMode::Check && results.iter().any(|r| r.summary.stale() > 0) {
        return EXIT_FAILED;
    }
    EXIT_SUCCESS
}

/// Run docsync with parsed arguments.
pub fn run(cli: &Cli) -> anyhow::Result<i32> {
    // Initialize tree-sitter parsers (no-op if feature disabled)
    lang::init();

    // Validate format
    if cli.format != "pretty" && cli.format != "json" {
        eprintln!("Error: invalid format {:?}, must be 'pretty' or 'json'", cli.format);
        return Ok(EXIT_ERROR);
    }

    // Validate language
    let language = if cli.language.eq_ignore_ascii_case("auto") {
        None
    } else {
        match Language::from_str(&cli.language) {
            Ok(language) => Some(language),
            Err(e) => {
                eprintln!("Error: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    };

    let cwd = std::env::current_dir()?;
    let (mut config, config_path) = match Config::load(cli.config.as_deref(), &cwd) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };
    if let Some(path) = &config_path {
        tracing::debug!(path = %path.display(), "loaded config");
    }
    if let Some(path) = load_env_file(&cwd) {
        tracing::debug!(path = %path.display(), "loaded environment file");
    }
    if cli.model.is_some() {
        config.model = cli.model.clone();
    }

    let provider = match &cli.provider {
        Some(name) => match Provider::from_str(name) {
            Ok(provider) => provider,
            Err(e) => {
                eprintln!("Error: {}", e);
                return Ok(EXIT_ERROR);
            }
        },
        None => config.provider.unwrap_or(Provider::OpenAi),
    };

    // Collect files
    let mut files = Vec::new();
    for path in &cli.paths {
        let metadata = match std::fs::metadata(path) {
            Ok(m) => m,
            Err(e) => {
                eprintln!("Error: cannot access path {:?}: {}", path, e);
                return Ok(EXIT_ERROR);
            }
        };
        if metadata.is_dir() {
            files.extend(collect_files(path, &config)?);
        } else {
            files.push(path.clone());
        }
    }

    if files.is_empty() {
        eprintln!("Warning: no files to process");
        return Ok(EXIT_SUCCESS);
    }

    let mode = cli.mode();
    let options = RunOptions {
        mode,
        policy: if cli.body_changes {
            StalenessPolicy::SignatureAndBody
        } else {
            config.staleness_policy()
        },
        concurrency: cli.concurrency.unwrap_or_else(|| config.get_concurrency()).max(1),
        language,
        show_progress: cli.format == "pretty" && !cli.quiet,
    };
    let policy = options.policy;

    let mut runner = Runner::new(options);
    if mode.generates() {
        match backend::build_backend(provider, &config) {
            Ok(backend) => runner = runner.with_backend(backend),
            Err(e) => {
                eprintln!("Error: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    let results = runner.run(&files)?;

    match cli.format.as_str() {
        "json" => report::write_json(mode, policy, &results)?,
        _ => report::write_pretty(mode, policy, &results, cli.verbose),
    }

    Ok(exit_code(mode, &results))
}
