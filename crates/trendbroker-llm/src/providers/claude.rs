//! Anthropic Messages API adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use trendbroker_core::{ProviderOutput, TrendRequest};

use super::{http_client, read_json, TrendProvider};
use crate::error::ProviderError;
use crate::parser::parse_sections;
use crate::prompt::{build_prompt, DataContext, SYSTEM_INSTRUCTION};

pub const CLAUDE_DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
/// Used when the answer carries no parsable confidence score.
pub const CLAUDE_DEFAULT_CONFIDENCE: f64 = 0.7;

const PROVIDER: &str = "claude";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1400;
const TEMPERATURE: f32 = 0.4;

pub struct ClaudeProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'static str,
    messages: [Message; 1],
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
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
    text: Option<String>,
}

impl ClaudeProvider {
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the HTTP client cannot be built.
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl TrendProvider for ClaudeProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn call(&self, request: &TrendRequest) -> Result<ProviderOutput, ProviderError> {
        let prompt = build_prompt(request);
        let context = DataContext::from_request(request).to_json()?;
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            system: SYSTEM_INSTRUCTION,
            messages: [Message {
                role: "user",
                content: format!("{prompt}\n\n[DATA]\n{context}"),
            }],
        };

        tracing::debug!(provider = PROVIDER, model = %self.model, "sending completion request");
        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let payload: MessagesResponse = read_json(PROVIDER, response).await?;
        let text = payload
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("\n");
        let text = text.trim();
        if text.is_empty() {
            return Err(ProviderError::Decode {
                provider: PROVIDER,
                reason: "response contained no text blocks".to_string(),
            });
        }

        Ok(parse_sections(text).into_output(PROVIDER, &self.model, CLAUDE_DEFAULT_CONFIDENCE))
    }
}
