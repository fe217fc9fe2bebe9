//! Google Gemini `generateContent` adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use trendbroker_core::{ProviderOutput, TrendRequest};

use super::{http_client, read_json, TrendProvider};
use crate::error::ProviderError;
use crate::parser::parse_sections;
use crate::prompt::{build_prompt, DataContext};

pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.5-flash";
/// Used when the answer carries no parsable confidence score.
pub const GEMINI_DEFAULT_CONFIDENCE: f64 = 0.65;

const PROVIDER: &str = "gemini";

pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiProvider {
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

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl TrendProvider for GeminiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn call(&self, request: &TrendRequest) -> Result<ProviderOutput, ProviderError> {
        let prompt = build_prompt(request);
        let context = DataContext::from_request(request).to_json()?;
        let body = GenerateContentRequest {
            contents: [Content {
                role: "user",
                parts: vec![Part { text: &prompt }, Part { text: &context }],
            }],
        };

        tracing::debug!(provider = PROVIDER, model = %self.model, "sending completion request");
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            // The URL carries the API key.
            .map_err(|e| ProviderError::Http(e.without_url()))?;

        let payload: GenerateContentResponse = read_json(PROVIDER, response).await?;
        let candidate = payload
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Decode {
                provider: PROVIDER,
                reason: "response contained no candidates".to_string(),
            })?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        let text = text.trim();
        if text.is_empty() {
            // Blocked or truncated candidates carry a finishReason but no parts.
            return Err(ProviderError::Decode {
                provider: PROVIDER,
                reason: "candidate contained no text".to_string(),
            });
        }

        Ok(parse_sections(text).into_output(PROVIDER, &self.model, GEMINI_DEFAULT_CONFIDENCE))
    }
}
