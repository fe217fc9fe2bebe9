use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Locale tag used when neither the request nor the config names one.
pub const DEFAULT_OUTPUT_LANG: &str = "zh-tw";
/// Short-term horizon in days; mid-term is 2x, long-term 3x.
pub const DEFAULT_BASE_DAYS: u32 = 7;
/// Restricts models to the supplied series (no browsing, no news).
pub const DEFAULT_MODE: &str = "no-external";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Inclusive day count. Trusted from the caller.
    pub days: u32,
}

/// One named impression series, parallel-indexed with [`TrendRequest::dates`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesItem {
    pub name: String,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendRequest {
    pub period: Period,
    pub top_keywords: Vec<String>,
    pub dates: Vec<String>,
    pub series: Vec<SeriesItem>,
    /// `None` until the broker fills in its configured default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_lang: Option<String>,
    #[serde(default = "default_base_days")]
    pub short_mid_long_base_days: u32,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
}

fn default_base_days() -> u32 {
    DEFAULT_BASE_DAYS
}

fn default_mode() -> String {
    DEFAULT_MODE.to_string()
}

fn default_use_cache() -> bool {
    true
}

impl TrendRequest {
    /// Fill `output_lang` with `lang` when the caller omitted it.
    #[must_use]
    pub fn with_default_lang(mut self, lang: &str) -> Self {
        if self.output_lang.is_none() {
            self.output_lang = Some(lang.to_string());
        }
        self
    }

    /// The effective output language.
    #[must_use]
    pub fn output_lang(&self) -> &str {
        self.output_lang.as_deref().unwrap_or(DEFAULT_OUTPUT_LANG)
    }

    /// Horizon lengths in days for the short, mid and long action tiers.
    #[must_use]
    pub fn horizons(&self) -> (u32, u32, u32) {
        let base = self.short_mid_long_base_days;
        (base, base.saturating_mul(2), base.saturating_mul(3))
    }
}

/// Structured answer from one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderOutput {
    pub provider: String,
    pub model: String,
    pub summary: String,
    pub actions_short: Vec<String>,
    pub actions_mid: Vec<String>,
    pub actions_long: Vec<String>,
    /// Always within `[0, 1]`.
    pub confidence: f64,
}

/// The unit returned to callers and stored in the result cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendResponse {
    pub period: Period,
    pub top_keywords: Vec<String>,
    pub dates: Vec<String>,
    pub provider_outputs: Vec<ProviderOutput>,
    pub consensus_summary: String,
    #[serde(default)]
    pub notes: Option<String>,
}
