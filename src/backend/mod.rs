//! Documentation generation backends.
//!
//! The pipeline only sees [`DocBackend`]: one call per item, plain text back.
//! Formatting the text into a comment is the updater's job.
//!
//! - `openai`: chat completions API
//! - `anthropic`: messages API
//! - `mock`: deterministic, scripted responses for tests and offline runs

mod anthropic;
mod mock;
mod openai;
pub mod prompt;
mod retry;

pub use anthropic::AnthropicBackend;
pub use mock::MockBackend;
pub use openai::OpenAiBackend;
pub use retry::{with_retry, RetryPolicy};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::Config;
use crate::error::BackendError;
use crate::item::{CodeItem, ItemKind};
use crate::lang::Language;
use crate::text::SourceText;

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Lines of source sent along with a request.
const EXCERPT_MAX_LINES: usize = 60;
const EXCERPT_MAX_BYTES: usize = 4000;

/// Everything a backend needs to document one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationContext {
    pub language: Language,
    pub kind: ItemKind,
    pub name: String,
    pub parent: Option<String>,
    pub signature: String,
    pub params: Vec<String>,
    /// Source from the declaration onwards, truncated.
    pub excerpt: String,
    /// Existing doc text when regenerating an outdated doc.
    pub outdated_doc: Option<String>,
}

impl GenerationContext {
    pub fn new(language: Language, item: &CodeItem, source: &SourceText, outdated_doc: Option<String>) -> Self {
        Self {
            language,
            kind: item.kind,
            name: item.name.clone(),
            parent: item.parent.clone(),
            signature: item.signature.clone(),
            params: item.params.clone(),
            excerpt: excerpt(source, item),
            outdated_doc,
        }
    }
}

fn excerpt(source: &SourceText, item: &CodeItem) -> String {
    let first = source.line_of(item.span.start_byte);
    let last = (first + EXCERPT_MAX_LINES).min(source.line_count()).saturating_sub(1);
    let start = source.line_start(first);
    let mut end = source.line_end(last.max(first));
    if end - start > EXCERPT_MAX_BYTES {
        end = start + EXCERPT_MAX_BYTES;
        while !source.as_str().is_char_boundary(end) {
            end -= 1;
        }
    }
    source.as_str()[start..end].to_string()
}

/// A source of documentation text.
#[async_trait]
pub trait DocBackend: Send + Sync {
    /// Short name for logs and reports.
    fn name(&self) -> &str;

    /// Produce documentation text for one item.
    async fn generate(&self, ctx: &GenerationContext) -> Result<String, BackendError>;
}

/// Supported providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(alias = "claude")]
    Anthropic,
    Mock,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Mock => "mock",
        }
    }

    /// Environment variable holding the API key, if the provider needs one.
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            Provider::OpenAi => Some(OPENAI_API_KEY_ENV),
            Provider::Anthropic => Some(ANTHROPIC_API_KEY_ENV),
            Provider::Mock => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            "mock" => Ok(Provider::Mock),
            other => Err(format!(
                "unsupported provider '{}' (expected openai, anthropic, claude or mock)",
                other
            )),
        }
    }
}

/// Build a ready backend for a provider.
///
/// HTTP providers read their API key from the environment; a missing key is
/// a configuration error.
pub fn build_backend(provider: Provider, config: &Config) -> Result<Arc<dyn DocBackend>, BackendError> {
    let api_key = match provider.api_key_env() {
        Some(var) => match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => key,
            _ => {
                return Err(BackendError::Config(format!(
                    "{} environment variable is not set",
                    var
                )))
            }
        },
        None => String::new(),
    };

    let backend: Arc<dyn DocBackend> = match provider {
        Provider::OpenAi => Arc::new(OpenAiBackend::new(
            http_client(config)?,
            api_key,
            config.openai_base_url(),
            config.model.as_deref().unwrap_or(OpenAiBackend::DEFAULT_MODEL),
            config.retry_policy(),
        )),
        Provider::Anthropic => Arc::new(AnthropicBackend::new(
            http_client(config)?,
            api_key,
            config.anthropic_base_url(),
            config.model.as_deref().unwrap_or(AnthropicBackend::DEFAULT_MODEL),
            config.retry_policy(),
        )),
        Provider::Mock => Arc::new(MockBackend::new()),
    };
    Ok(backend)
}

fn http_client(config: &Config) -> Result<reqwest::Client, BackendError> {
    reqwest::Client::builder()
        .user_agent(concat!("docsync/", env!("CARGO_PKG_VERSION")))
        .timeout(config.timeout())
        .build()
        .map_err(|e| BackendError::Config(format!("failed to create HTTP client: {}", e)))
}

/// Map a non-success HTTP status to an error.
pub(crate) fn status_error(status: u16, body: &str) -> BackendError {
    match status {
        401 | 403 => BackendError::Auth(format!("HTTP {}", status)),
        429 => BackendError::RateLimited,
        500..=599 => BackendError::Server { status },
        _ => {
            let snippet: String = body.chars().take(200).collect();
            BackendError::Unavailable(format!("HTTP {}: {}", status, snippet.trim()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Insertion;

    #[test]
    fn test_provider_parsing() {
        assert_eq!("openai".parse::<Provider>(), Ok(Provider::OpenAi));
        assert_eq!("Claude".parse::<Provider>(), Ok(Provider::Anthropic));
        assert_eq!("anthropic".parse::<Provider>(), Ok(Provider::Anthropic));
        assert_eq!("mock".parse::<Provider>(), Ok(Provider::Mock));
        assert!("gemini".parse::<Provider>().is_err());
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(status_error(401, ""), BackendError::Auth(_)));
        assert_eq!(status_error(429, ""), BackendError::RateLimited);
        assert_eq!(status_error(502, ""), BackendError::Server { status: 502 });
        assert!(matches!(status_error(400, "bad model"), BackendError::Unavailable(m) if m.contains("bad model")));
    }

    #[test]
    fn test_mock_needs_no_key() {
        let backend = build_backend(Provider::Mock, &Config::default()).unwrap();
        assert_eq!(backend.name(), "mock");
    }

    #[test]
    fn test_context_excerpt_starts_at_declaration() {
        let text = "import os\n\ndef add(a, b):\n    return a + b\n";
        let src = SourceText::new(text);
        let start = text.find("def").unwrap();
        let item = CodeItem {
            kind: ItemKind::Function,
            name: "add".to_string(),
            parent: None,
            signature: "def add(a, b)".to_string(),
            params: vec!["a".into(), "b".into()],
            body_digest: None,
            span: src.span(start, start + 14),
            doc_span: None,
            indent: String::new(),
            insertion: Some(Insertion {
                offset: start,
                indent: String::new(),
                inline: false,
            }),
        };
        let ctx = GenerationContext::new(Language::Python, &item, &src, None);
        assert_eq!(ctx.excerpt, "def add(a, b):\n    return a + b\n");
        assert_eq!(ctx.params, vec!["a", "b"]);
    }
}
