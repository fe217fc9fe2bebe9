//! Shared request/response types, configuration, and payload shaping for the
//! trend-summarization broker.

pub mod app_config;
pub mod cache_key;
pub mod config;
pub mod series;
pub mod types;
pub mod validate;

use thiserror::Error;

pub use app_config::{BrokerConfig, CacheBackend};
pub use cache_key::{cache_key, canonical_json, CACHE_KEY_NAMESPACE};
pub use config::{load_broker_config, load_broker_config_from_env};
pub use types::{
    Period, ProviderOutput, SeriesItem, TrendRequest, TrendResponse, DEFAULT_BASE_DAYS,
    DEFAULT_MODE, DEFAULT_OUTPUT_LANG,
};
pub use validate::{validate_request, ValidationError, MAX_TOP_KEYWORDS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
