//! Configuration file schema and discovery.
//!
//! A config file is optional. Lookup order: `--config`, then `docsync.yaml`
//! or `.docsync.yaml` in the working directory, then `config.yaml` in the
//! per-user config directory. API keys may also come from a `.env` file in
//! the working directory.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backend::{Provider, RetryPolicy};
use crate::staleness::StalenessPolicy;

/// File names searched for in the working directory.
pub const CONFIG_FILE_NAMES: &[&str] = &["docsync.yaml", ".docsync.yaml"];

/// Optional credentials file in the working directory.
pub const ENV_FILE_NAME: &str = ".env";

pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub provider: Option<Provider>,
    /// Model name passed to the provider.
    #[serde(default)]
    pub model: Option<String>,
    /// Maximum files (and backend calls) in flight at once.
    #[serde(default)]
    pub concurrency: Option<usize>,
    /// Treat body changes as staleness too.
    #[serde(default)]
    pub body_changes: Option<bool>,
    /// Glob patterns for paths to skip (e.g., "**/generated/**").
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    #[serde(default)]
    pub openai: Option<EndpointConfig>,
    #[serde(default)]
    pub anthropic: Option<EndpointConfig>,
}

/// Retry settings for HTTP backends.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RetryConfig {
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub base_delay_ms: Option<u64>,
}

/// Per-provider endpoint override.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EndpointConfig {
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Config {
    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Find the config file that applies to `dir`, if any.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
            .or_else(user_config_path)
    }

    /// Load the explicit config, the discovered one, or defaults.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> anyhow::Result<(Self, Option<PathBuf>)> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover(dir),
        };
        match path {
            Some(path) => {
                let config = Self::parse_file(&path)
                    .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?;
                Ok((config, Some(path)))
            }
            None => Ok((Self::default(), None)),
        }
    }

    /// Returns the concurrency limit (defaults to 4, never below 1).
    pub fn get_concurrency(&self) -> usize {
        self.concurrency.unwrap_or(DEFAULT_CONCURRENCY).max(1)
    }

    pub fn staleness_policy(&self) -> StalenessPolicy {
        if self.body_changes.unwrap_or(false) {
            StalenessPolicy::SignatureAndBody
        } else {
            StalenessPolicy::SignatureOnly
        }
    }

    /// Per-request timeout for HTTP backends.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        match &self.retry {
            Some(retry) => RetryPolicy {
                max_attempts: retry.max_attempts.unwrap_or(defaults.max_attempts).max(1),
                base_delay: retry
                    .base_delay_ms
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.base_delay),
            },
            None => defaults,
        }
    }

    pub fn openai_base_url(&self) -> &str {
        self.openai
            .as_ref()
            .and_then(|e| e.base_url.as_deref())
            .unwrap_or(DEFAULT_OPENAI_BASE_URL)
    }

    pub fn anthropic_base_url(&self) -> &str {
        self.anthropic
            .as_ref()
            .and_then(|e| e.base_url.as_deref())
            .unwrap_or(DEFAULT_ANTHROPIC_BASE_URL)
    }

    /// Check if a path should be excluded based on excluded_paths patterns.
    /// Uses globset for matching, which supports `**` for recursive directory matching.
    pub fn is_path_excluded(&self, path: &Path) -> bool {
        if self.excluded_paths.is_empty() {
            return false;
        }

        let path_str = path.to_string_lossy();
        self.excluded_paths.iter().any(|pattern| match globset::Glob::new(pattern) {
            Ok(glob) => glob.compile_matcher().is_match(&*path_str),
            Err(_) => false,
        })
    }
}

/// Load `.env` from `dir` into the process environment.
///
/// Variables that are already set keep their values. Returns the file that
/// was loaded, if any.
pub fn load_env_file(dir: &Path) -> Option<PathBuf> {
    let path = dir.join(ENV_FILE_NAME);
    if !path.is_file() {
        return None;
    }
    match dotenvy::from_path(&path) {
        Ok(()) => Some(path),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to load env file");
            None
        }
    }
}

fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "docsync")
        .map(|dirs| dirs.config_dir().join("config.yaml"))
        .filter(|path| path.is_file())
}
