use thiserror::Error;
use trendbroker_core::ValidationError;

/// Failure of a single provider call. Recovered by the broker.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} returned status {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} response decode error: {reason}")]
    Decode {
        provider: &'static str,
        reason: String,
    },

    #[error("failed to serialize request context: {0}")]
    Context(#[from] serde_json::Error),
}

/// Cache backend failure. Never surfaced past the broker.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Request-level failures the broker reports to its caller.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("No LLM provider available (set GEMINI_API_KEY and/or CLAUDE_API_KEY).")]
    NoProvider,

    #[error("All LLM providers failed.")]
    AllProvidersFailed,

    #[error("failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),
}
