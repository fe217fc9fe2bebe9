//! Fan-out, merge and caching for summarize requests.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use trendbroker_core::{
    cache_key, validate_request, BrokerConfig, ProviderOutput, TrendRequest, TrendResponse,
};

use crate::cache::{connect_cache, ResultCache};
use crate::error::{BrokerError, ProviderError};
use crate::providers::{build_providers, TrendProvider};

/// Disclaimer attached to every fresh response.
pub const RESPONSE_NOTES: &str = "本結果僅依據提供的曝光時序資料，不含外部新聞。";

/// A finished summarize call.
///
/// `body` is the exact JSON stored in (or read from) the cache, so repeated
/// identical requests yield byte-identical bodies.
#[derive(Debug, Clone)]
pub struct Summarized {
    pub response: TrendResponse,
    pub body: String,
    pub from_cache: bool,
}

/// Runs every configured provider for a request and merges the results.
///
/// Providers and the cache are created once at startup and injected, so the
/// broker itself holds no per-request state.
pub struct Broker {
    providers: Vec<Arc<dyn TrendProvider>>,
    cache: Option<Arc<dyn ResultCache>>,
    cache_ttl: Duration,
    output_lang: String,
}

impl Broker {
    #[must_use]
    pub fn new(
        providers: Vec<Arc<dyn TrendProvider>>,
        cache: Option<Arc<dyn ResultCache>>,
        cache_ttl: Duration,
        output_lang: impl Into<String>,
    ) -> Self {
        Self {
            providers,
            cache,
            cache_ttl,
            output_lang: output_lang.into(),
        }
    }

    /// Build providers and connect the cache described by `config`.
    ///
    /// A cache that cannot be reached is logged and left out; the broker then
    /// runs uncached.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if a provider HTTP client cannot be built.
    pub async fn from_config(config: &BrokerConfig) -> Result<Self, ProviderError> {
        let providers = build_providers(config)?;

        let cache = match &config.cache {
            Some(backend) => match connect_cache(backend).await {
                Ok(cache) => {
                    tracing::info!(backend = %backend, "result cache connected");
                    Some(cache)
                }
                Err(e) => {
                    tracing::warn!(backend = %backend, error = %e, "result cache unavailable; running uncached");
                    None
                }
            },
            None => None,
        };

        tracing::info!(
            providers = ?providers.iter().map(|p| p.name()).collect::<Vec<_>>(),
            cache = cache.is_some(),
            "broker initialized"
        );

        Ok(Self::new(
            providers,
            cache,
            Duration::from_secs(config.cache_ttl_secs),
            config.output_lang.clone(),
        ))
    }

    /// Whether a provider with tag `name` is configured.
    #[must_use]
    pub fn has_provider(&self, name: &str) -> bool {
        self.providers.iter().any(|p| p.name() == name)
    }

    #[must_use]
    pub fn has_cache(&self) -> bool {
        self.cache.is_some()
    }

    /// Summarize `request` across every configured provider.
    ///
    /// Cache reads happen only when `use_cache` is set; fresh results are
    /// always written when a cache exists. Provider failures are logged and
    /// dropped; the call fails only when none succeed.
    ///
    /// # Errors
    ///
    /// - [`BrokerError::Validation`] for malformed input. No provider is called.
    /// - [`BrokerError::NoProvider`] when no adapter is configured.
    /// - [`BrokerError::AllProvidersFailed`] when every adapter errored.
    /// - [`BrokerError::Serialize`] if the response cannot be rendered as JSON.
    pub async fn summarize(&self, request: TrendRequest) -> Result<Summarized, BrokerError> {
        validate_request(&request)?;
        let request = request.with_default_lang(&self.output_lang);

        let key = self.cache.as_ref().and_then(|_| match cache_key(&request) {
            Ok(key) => Some(key),
            Err(e) => {
                tracing::warn!(error = %e, "could not build cache key; skipping cache");
                None
            }
        });

        if request.use_cache {
            if let Some(hit) = self.lookup(key.as_deref()).await {
                return Ok(hit);
            }
        }

        if self.providers.is_empty() {
            return Err(BrokerError::NoProvider);
        }

        let outputs = self.dispatch(&request).await;
        if outputs.is_empty() {
            tracing::error!(
                attempted = self.providers.len(),
                "all LLM providers failed"
            );
            return Err(BrokerError::AllProvidersFailed);
        }

        let response = TrendResponse {
            period: request.period,
            top_keywords: request.top_keywords,
            dates: request.dates,
            consensus_summary: make_consensus(&outputs),
            provider_outputs: outputs,
            notes: Some(RESPONSE_NOTES.to_string()),
        };
        let body = serde_json::to_string(&response)?;

        self.store(key.as_deref(), &body).await;

        Ok(Summarized {
            response,
            body,
            from_cache: false,
        })
    }

    /// Invoke every provider concurrently and keep the successes in
    /// dispatch order.
    async fn dispatch(&self, request: &TrendRequest) -> Vec<ProviderOutput> {
        let calls = self.providers.iter().map(|provider| async move {
            let result = provider.call(request).await;
            (provider.name(), provider.model(), result)
        });

        join_all(calls)
            .await
            .into_iter()
            .filter_map(|(name, model, result)| match result {
                Ok(output) => {
                    tracing::debug!(provider = name, model, "provider succeeded");
                    Some(output)
                }
                Err(e) => {
                    tracing::warn!(provider = name, model, error = %e, "provider failed; excluding from response");
                    None
                }
            })
            .collect()
    }

    async fn lookup(&self, key: Option<&str>) -> Option<Summarized> {
        let (cache, key) = (self.cache.as_ref()?, key?);

        let raw = match cache.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(cache_key = key, error = %e, "cache read failed");
                return None;
            }
        };

        match serde_json::from_str::<TrendResponse>(&raw) {
            Ok(response) => {
                tracing::debug!(cache_key = key, "serving summary from cache");
                Some(Summarized {
                    response,
                    body: raw,
                    from_cache: true,
                })
            }
            Err(e) => {
                tracing::warn!(cache_key = key, error = %e, "corrupt cache entry; treating as miss");
                None
            }
        }
    }

    async fn store(&self, key: Option<&str>, body: &str) {
        let (Some(cache), Some(key)) = (self.cache.as_ref(), key) else {
            return;
        };
        if let Err(e) = cache.set(key, body, self.cache_ttl).await {
            tracing::warn!(cache_key = key, error = %e, "cache write failed");
        }
    }
}

/// Concatenate each provider's tagged summary, in order, separated by blank
/// lines.
#[must_use]
pub fn make_consensus(outputs: &[ProviderOutput]) -> String {
    outputs
        .iter()
        .map(|o| format!("【{}】\n{}\n", o.provider, o.summary))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
