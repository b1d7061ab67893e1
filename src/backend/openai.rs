//! OpenAI chat completions backend.
//!
//! POST {base_url}/chat/completions with a bearer token.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::prompt::{build_prompt, SYSTEM_PROMPT};
use super::{status_error, with_retry, DocBackend, GenerationContext, RetryPolicy};
use crate::error::BackendError;

pub struct OpenAiBackend {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
    retry: RetryPolicy,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiBackend {
    pub const DEFAULT_MODEL: &'static str = "gpt-4";

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
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": build_prompt(ctx) }
            ],
            "temperature": 0.3,
            "max_tokens": 1000
        })
    }

    async fn request(&self, ctx: &GenerationContext) -> Result<String, BackendError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(item = %ctx.name, model = %self.model, "requesting documentation from openai");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(ctx))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), &body));
        }

        let parsed: ChatResponse = response.json().await?;
        extract_text(parsed)
    }
}

fn extract_text(response: ChatResponse) -> Result<String, BackendError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| BackendError::MalformedResponse("response contained no text".to_string()))
}

#[async_trait]
impl DocBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, ctx: &GenerationContext) -> Result<String, BackendError> {
        with_retry(&self.retry, || self.request(ctx)).await
    }
}
