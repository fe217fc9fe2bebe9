use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn build_broker_config_defaults_with_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_broker_config(lookup_from_map(&map)).expect("defaults are valid");
    assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:9001");
    assert_eq!(cfg.log_level, "info");
    assert!(cfg.gemini_api_key.is_none());
    assert!(cfg.claude_api_key.is_none());
    assert_eq!(
        cfg.preferred_models,
        vec!["gemini-2.0-flash", "claude-3-5-sonnet-20241022"]
    );
    assert_eq!(cfg.output_lang, "zh-tw");
    assert!(cfg.cache.is_none());
    assert_eq!(cfg.cache_ttl_secs, 259_200);
    assert_eq!(cfg.provider_timeout_secs, 60);
    assert_eq!(
        cfg.cors_origins,
        vec!["http://localhost:4200", "http://127.0.0.1:4200"]
    );
}

#[test]
fn credentials_toggle_providers() {
    let mut map = HashMap::new();
    map.insert("GEMINI_API_KEY", "g-key");
    let cfg = build_broker_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.gemini_enabled());
    assert!(!cfg.claude_enabled());
}

#[test]
fn blank_credential_counts_as_absent() {
    let mut map = HashMap::new();
    map.insert("CLAUDE_API_KEY", "   ");
    let cfg = build_broker_config(lookup_from_map(&map)).unwrap();
    assert!(!cfg.claude_enabled());
}

#[test]
fn preferred_models_are_trimmed_and_ordered() {
    let mut map = HashMap::new();
    map.insert("PREFERRED_MODELS", " claude-3-opus , ,gemini-1.5-pro ");
    let cfg = build_broker_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.preferred_models, vec!["claude-3-opus", "gemini-1.5-pro"]);
}

#[test]
fn redis_url_selects_redis_backend() {
    let mut map = HashMap::new();
    map.insert("REDIS_URL", "redis://127.0.0.1:6379/0");
    let cfg = build_broker_config(lookup_from_map(&map)).unwrap();
    assert_eq!(
        cfg.cache,
        Some(CacheBackend::Redis("redis://127.0.0.1:6379/0".to_string()))
    );
}

#[test]
fn memory_url_selects_memory_backend() {
    let mut map = HashMap::new();
    map.insert("REDIS_URL", "memory://");
    let cfg = build_broker_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.cache, Some(CacheBackend::Memory));
}

#[test]
fn unknown_cache_scheme_is_invalid() {
    let mut map = HashMap::new();
    map.insert("REDIS_URL", "memcached://localhost");
    let result = build_broker_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "REDIS_URL"),
        "expected InvalidEnvVar(REDIS_URL), got: {result:?}"
    );
}

#[test]
fn invalid_cache_ttl_is_rejected() {
    let mut map = HashMap::new();
    map.insert("LLM_CACHE_TTL_SEC", "three-days");
    let result = build_broker_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "LLM_CACHE_TTL_SEC"),
        "expected InvalidEnvVar(LLM_CACHE_TTL_SEC), got: {result:?}"
    );
}

#[test]
fn invalid_bind_addr_is_rejected() {
    let mut map = HashMap::new();
    map.insert("LLM_BROKER_BIND_ADDR", "not-a-socket-addr");
    let result = build_broker_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "LLM_BROKER_BIND_ADDR"),
        "expected InvalidEnvVar(LLM_BROKER_BIND_ADDR), got: {result:?}"
    );
}

#[test]
fn debug_output_redacts_credentials() {
    let mut map = HashMap::new();
    map.insert("GEMINI_API_KEY", "super-secret");
    let cfg = build_broker_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("super-secret"));
    assert!(rendered.contains("[redacted]"));
}
