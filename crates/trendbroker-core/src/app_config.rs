use std::net::SocketAddr;

/// Where summarize results are cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheBackend {
    /// A Redis-compatible server at the given URL.
    Redis(String),
    /// Process-local map; mostly useful for development.
    Memory,
}

impl std::fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackend::Redis(_) => write!(f, "redis"),
            CacheBackend::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Clone)]
pub struct BrokerConfig {
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub gemini_api_key: Option<String>,
    pub claude_api_key: Option<String>,
    pub gemini_base_url: String,
    pub claude_base_url: String,
    /// Ordered model identifiers, matched against each vendor's prefix.
    pub preferred_models: Vec<String>,
    pub output_lang: String,
    pub cache: Option<CacheBackend>,
    pub cache_ttl_secs: u64,
    pub provider_timeout_secs: u64,
    pub cors_origins: Vec<String>,
}

impl BrokerConfig {
    #[must_use]
    pub fn gemini_enabled(&self) -> bool {
        self.gemini_api_key.is_some()
    }

    #[must_use]
    pub fn claude_enabled(&self) -> bool {
        self.claude_api_key.is_some()
    }
}

impl std::fmt::Debug for BrokerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerConfig")
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "claude_api_key",
                &self.claude_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("gemini_base_url", &self.gemini_base_url)
            .field("claude_base_url", &self.claude_base_url)
            .field("preferred_models", &self.preferred_models)
            .field("output_lang", &self.output_lang)
            .field("cache", &self.cache.as_ref().map(ToString::to_string))
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("provider_timeout_secs", &self.provider_timeout_secs)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}
