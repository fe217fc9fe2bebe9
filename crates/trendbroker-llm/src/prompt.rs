//! The shared prompt and data context sent to every provider.

use serde::Serialize;
use trendbroker_core::{Period, SeriesItem, TrendRequest, DEFAULT_MODE};

/// Exact section headers the parser looks for.
pub const SECTION_FORMAT: &str = "[趨勢摘要]
<多段落敘述>

[行動建議-短期]
- <建議1>
- <建議2>

[行動建議-中期]
- <建議1>
- <建議2>

[行動建議-長期]
- <建議1>
- <建議2>

[信心分數]
0.0~1.0（量化信心並簡述理由）";

/// System instruction for providers that accept one separately.
pub const SYSTEM_INSTRUCTION: &str =
    "You are an expert SEO analyst. Do NOT browse the web. Only use provided data.";

/// The time-series payload attached next to the prompt.
#[derive(Debug, Serialize)]
pub struct DataContext<'a> {
    pub period: &'a Period,
    pub top_keywords: &'a [String],
    pub dates: &'a [String],
    pub series: &'a [SeriesItem],
}

impl<'a> DataContext<'a> {
    #[must_use]
    pub fn from_request(request: &'a TrendRequest) -> Self {
        Self {
            period: &request.period,
            top_keywords: &request.top_keywords,
            dates: &request.dates,
            series: &request.series,
        }
    }

    /// Serialize as compact JSON with non-ASCII kept verbatim.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Build the instruction text shared by every provider.
#[must_use]
pub fn build_prompt(request: &TrendRequest) -> String {
    let (short, mid, long) = request.horizons();
    let source_rule = if request.mode == DEFAULT_MODE {
        "只根據使用者提供的 Google Search Console 關鍵字「曝光」時間序列作答，不得上網檢索或引用外部新聞。"
    } else {
        "以使用者提供的 Google Search Console 關鍵字「曝光」時間序列為主要依據。"
    };

    format!(
        "你是一位專業的個人信貸與房屋貸款行銷分析師。請用 {lang} 回答。
資料來源：{source_rule}
目標：
1) 描述 {start} 至 {end}（共 {days} 天）期間的曝光趨勢與變化。
2) 比較 Top-{top_n} 關鍵字的相對表現（成長/衰退、彼此交叉）。
3) 依短/中/長期（短={short}天；中={mid}天；長={long}天）提出具體行動建議，說明如何以內容標題與貸款產品推廣吸引使用者點擊。
4) 提供不超過一段的風險/不確定性說明（如資料天數不足、總量波動、季節性）。

請嚴格使用以下格式輸出（若無內容亦請保留標題）：
{SECTION_FORMAT}",
        lang = request.output_lang(),
        start = request.period.start,
        end = request.period.end,
        days = request.period.days,
        top_n = request.top_keywords.len(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> TrendRequest {
        serde_json::from_value(serde_json::json!({
            "period": {"start": "2025-04-01", "end": "2025-04-02", "days": 2},
            "top_keywords": ["信貸", "房貸", "車貸"],
            "dates": ["2025-04-01", "2025-04-02"],
            "series": [{"name": "信貸", "data": [3, 4]}],
            "output_lang": "en",
            "short_mid_long_base_days": 10
        }))
        .unwrap()
    }

    #[test]
    fn prompt_carries_language_period_and_horizons() {
        let prompt = build_prompt(&request());
        assert!(prompt.contains("請用 en 回答"));
        assert!(prompt.contains("2025-04-01 至 2025-04-02"));
        assert!(prompt.contains("Top-3"));
        assert!(prompt.contains("短=10天；中=20天；長=30天"));
        assert!(prompt.contains("不得上網"));
    }

    #[test]
    fn prompt_lists_every_section_header() {
        let prompt = build_prompt(&request());
        for header in [
            "[趨勢摘要]",
            "[行動建議-短期]",
            "[行動建議-中期]",
            "[行動建議-長期]",
            "[信心分數]",
        ] {
            assert!(prompt.contains(header), "missing {header}");
        }
    }

    #[test]
    fn context_json_has_only_data_fields() {
        let req = request();
        let json = DataContext::from_request(&req).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 4);
        assert!(json.contains("\"信貸\""));
        assert!(value.get("output_lang").is_none());
    }
}
