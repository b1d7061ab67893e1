//! Anthropic messages backend.
//!
//! POST {base_url}/messages with `x-api-key` and `anthropic-version` headers.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::prompt::{build_prompt, SYSTEM_PROMPT};
use super::{status_error, with_retry, DocBackend, GenerationContext, RetryPolicy};
use crate::error::BackendError;

const API_VERSION: &str = "2023-06-01";

pub struct AnthropicBackend {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
    retry: RetryPolicy,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicBackend {
    pub const DEFAULT_MODEL: &'static str = "claude-3-opus-20240229";

    pub fn new(http: Client, api_key: String, base_url: &str, model: &str, retry: RetryPolicy) -> Self {
        Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            retry,
        }
    }

    fn request_body(&self, ctx: &GenerationContext) -> Value {
        json!({
            "model": self.model,
            "max_tokens": 1000,
            "system": SYSTEM_PROMPT,
            "messages": [
                { "role": "user", "content": build_prompt(ctx) }
            ]
        })
    }

    async fn request(&self, ctx: &GenerationContext) -> Result<String, BackendError> {
        let url = format!("{}/messages", self.base_url);
        debug!(item = %ctx.name, model = %self.model, "requesting documentation from anthropic");

        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&self.request_body(ctx))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), &body));
        }

        let parsed: MessagesResponse = response.json().await?;
        extract_text(parsed)
    }
}

fn extract_text(response: MessagesResponse) -> Result<String, BackendError> {
    let text: Vec<String> = response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect();
    let text = text.join("\n").trim().to_string();
    if text.is_empty() {
        return Err(BackendError::MalformedResponse(
            "response contained no text blocks".to_string(),
        ));
    }
    Ok(text)
}

#[async_trait]
impl DocBackend for AnthropicBackend {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn generate(&self, ctx: &GenerationContext) -> Result<String, BackendError> {
        with_retry(&self.retry, || self.request(ctx)).await
    }
}
