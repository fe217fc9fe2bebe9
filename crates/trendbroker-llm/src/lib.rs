//! LLM fan-out for trend summaries: prompt construction, vendor adapters,
//! answer parsing, result caching and the broker that ties them together.

pub mod cache;
pub mod error;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod providers;

pub use cache::{connect_cache, MemoryCache, RedisCache, ResultCache};
pub use error::{BrokerError, CacheError, ProviderError};
pub use orchestrator::{make_consensus, Broker, Summarized, RESPONSE_NOTES};
pub use parser::{parse_sections, ParsePath, ParsedSections};
pub use prompt::{build_prompt, DataContext, SECTION_FORMAT, SYSTEM_INSTRUCTION};
pub use providers::{
    build_providers, pick_model, ClaudeProvider, GeminiProvider, TrendProvider,
    CLAUDE_DEFAULT_CONFIDENCE, CLAUDE_DEFAULT_MODEL, GEMINI_DEFAULT_CONFIDENCE,
    GEMINI_DEFAULT_MODEL,
};
