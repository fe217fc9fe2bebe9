//! Provider adapters: one [`TrendProvider`] implementation per LLM vendor.
//!
//! An adapter exists only when its credential is configured. Each one builds
//! the shared prompt, attaches the data context, makes exactly one completion
//! call, and runs the answer through [`crate::parser::parse_sections`].

mod claude;
mod gemini;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use trendbroker_core::{BrokerConfig, ProviderOutput, TrendRequest};

use crate::error::ProviderError;

pub use claude::{ClaudeProvider, CLAUDE_DEFAULT_CONFIDENCE, CLAUDE_DEFAULT_MODEL};
pub use gemini::{GeminiProvider, GEMINI_DEFAULT_CONFIDENCE, GEMINI_DEFAULT_MODEL};

/// Longest slice of an error body kept in [`ProviderError::Status`].
const MAX_ERROR_BODY_CHARS: usize = 300;

const USER_AGENT: &str = "trendbroker/0.1 (trend-summary)";

/// One LLM vendor capable of summarizing a trend request.
#[async_trait]
pub trait TrendProvider: Send + Sync {
    /// Short tag reported in [`ProviderOutput::provider`].
    fn name(&self) -> &str;

    /// Concrete model identifier used for calls.
    fn model(&self) -> &str;

    /// Summarize `request` with a single completion call.
    async fn call(&self, request: &TrendRequest) -> Result<ProviderOutput, ProviderError>;
}

/// Pick the first preferred model whose lowercase form starts with `prefix`,
/// or `fallback` when none match.
#[must_use]
pub fn pick_model(preferred: &[String], prefix: &str, fallback: &str) -> String {
    preferred
        .iter()
        .find(|m| m.to_lowercase().starts_with(prefix))
        .cloned()
        .unwrap_or_else(|| fallback.to_string())
}

/// Construct every adapter whose credential is present, in dispatch order.
///
/// # Errors
///
/// Returns [`ProviderError::Http`] if an HTTP client cannot be built.
pub fn build_providers(config: &BrokerConfig) -> Result<Vec<Arc<dyn TrendProvider>>, ProviderError> {
    let mut providers: Vec<Arc<dyn TrendProvider>> = Vec::new();

    if let Some(key) = config.gemini_api_key.as_deref() {
        let model = pick_model(&config.preferred_models, "gemini", GEMINI_DEFAULT_MODEL);
        providers.push(Arc::new(GeminiProvider::new(
            key,
            &config.gemini_base_url,
            &model,
            config.provider_timeout_secs,
        )?));
    }

    if let Some(key) = config.claude_api_key.as_deref() {
        let model = pick_model(&config.preferred_models, "claude", CLAUDE_DEFAULT_MODEL);
        providers.push(Arc::new(ClaudeProvider::new(
            key,
            &config.claude_base_url,
            &model,
            config.provider_timeout_secs,
        )?));
    }

    Ok(providers)
}

fn http_client(timeout_secs: u64) -> Result<Client, ProviderError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Check the status of a provider response and decode its JSON body.
async fn read_json<T: DeserializeOwned>(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Status {
            provider,
            status: status.as_u16(),
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::Decode {
            provider,
            reason: e.without_url().to_string(),
        })
}
