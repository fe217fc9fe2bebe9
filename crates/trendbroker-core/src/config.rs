use crate::app_config::{BrokerConfig, CacheBackend};
use crate::types::DEFAULT_OUTPUT_LANG;
use crate::ConfigError;

const DEFAULT_PREFERRED_MODELS: &str = "gemini-2.0-flash,claude-3-5-sonnet-20241022";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:4200,http://127.0.0.1:4200";
/// Three days.
const DEFAULT_CACHE_TTL_SECS: &str = "259200";

/// Load broker configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_broker_config() -> Result<BrokerConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_broker_config_from_env()
}

/// Load broker configuration from environment variables already in the process.
///
/// Unlike [`load_broker_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_broker_config_from_env() -> Result<BrokerConfig, ConfigError> {
    build_broker_config(|key| std::env::var(key))
}

/// Build broker configuration using the provided env-var lookup function.
///
/// Every option is independently optional. Credentials that are set but empty
/// count as absent, so the matching provider stays disabled.
fn build_broker_config<F>(lookup: F) -> Result<BrokerConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let bind_raw = or_default("LLM_BROKER_BIND_ADDR", "0.0.0.0:9001");
    let bind_addr = bind_raw
        .parse::<SocketAddr>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "LLM_BROKER_BIND_ADDR".to_string(),
            reason: e.to_string(),
        })?;

    let log_level = or_default("LLM_BROKER_LOG_LEVEL", "info");
    let gemini_api_key = optional("GEMINI_API_KEY");
    let claude_api_key = optional("CLAUDE_API_KEY");
    let gemini_base_url = or_default(
        "GEMINI_BASE_URL",
        "https://generativelanguage.googleapis.com",
    );
    let claude_base_url = or_default("CLAUDE_BASE_URL", "https://api.anthropic.com");

    let preferred_models = split_list(&or_default("PREFERRED_MODELS", DEFAULT_PREFERRED_MODELS));
    let output_lang = optional("OUTPUT_LANG").unwrap_or_else(|| DEFAULT_OUTPUT_LANG.to_string());
    let cache = optional("REDIS_URL").map(|url| parse_cache_backend(&url)).transpose()?;
    let cache_ttl_secs = parse_u64("LLM_CACHE_TTL_SEC", DEFAULT_CACHE_TTL_SECS)?;
    let provider_timeout_secs = parse_u64("LLM_PROVIDER_TIMEOUT_SECS", "60")?;
    let cors_origins = split_list(&or_default("LLM_BROKER_CORS_ORIGINS", DEFAULT_CORS_ORIGINS));

    Ok(BrokerConfig {
        bind_addr,
        log_level,
        gemini_api_key,
        claude_api_key,
        gemini_base_url,
        claude_base_url,
        preferred_models,
        output_lang,
        cache,
        cache_ttl_secs,
        provider_timeout_secs,
        cors_origins,
    })
}

/// Parse the cache address into a backend.
///
/// `memory://` selects the in-process cache; `redis://` and `rediss://` select
/// a Redis server. Anything else is rejected.
fn parse_cache_backend(url: &str) -> Result<CacheBackend, ConfigError> {
    if url.starts_with("memory://") {
        Ok(CacheBackend::Memory)
    } else if url.starts_with("redis://") || url.starts_with("rediss://") {
        Ok(CacheBackend::Redis(url.to_string()))
    } else {
        Err(ConfigError::InvalidEnvVar {
            var: "REDIS_URL".to_string(),
            reason: format!("unsupported cache scheme in '{url}'"),
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
