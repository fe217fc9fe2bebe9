//! Section parser for free-text model answers.
//!
//! Models are asked to answer in five bracketed sections. [`parse_sections`]
//! takes one of two paths:
//!
//! - [`ParsePath::Structured`]: at least one recognized header exists. Each
//!   header's body runs until the next recognized header or end of text.
//! - [`ParsePath::Fallback`]: no header exists anywhere. The whole text is the
//!   summary and every bulleted line is dealt into short/mid/long thirds.
//!
//! Confidence is only read on the structured path; the adapter substitutes its
//! own default when it is left unset.

use std::sync::LazyLock;

use regex::Regex;
use trendbroker_core::ProviderOutput;

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[ \t]*\[[ \t]*(趨勢摘要|行動建議[ \t]*-[ \t]*[短中長]期|信心分數|trend[ \t]+summary|(?:short|mid|long)[ \t-]*term[ \t]+actions|actions[ \t]*-[ \t]*(?:short|mid|long)[ \t-]*term|confidence[ \t]+score)[ \t]*\][ \t]*\r?$",
    )
    .expect("valid regex")
});

static CONFIDENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[01](?:\.\d+)?").expect("valid regex"));

const BULLET_MARKERS: [&str; 2] = ["- ", "• "];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsePath {
    Structured,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Summary,
    Short,
    Mid,
    Long,
    Confidence,
}

impl Section {
    fn classify(title: &str) -> Option<Self> {
        let key: String = title
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        if key == "趨勢摘要" || key == "trendsummary" {
            Some(Self::Summary)
        } else if key == "信心分數" || key == "confidencescore" {
            Some(Self::Confidence)
        } else if key.contains("短期") || key.contains("short") {
            Some(Self::Short)
        } else if key.contains("中期") || key.contains("mid") {
            Some(Self::Mid)
        } else if key.contains("長期") || key.contains("long") {
            Some(Self::Long)
        } else {
            None
        }
    }
}

/// Result of parsing one model answer.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSections {
    pub path: ParsePath,
    pub summary: String,
    pub actions_short: Vec<String>,
    pub actions_mid: Vec<String>,
    pub actions_long: Vec<String>,
    /// `None` when no confidence section or no number inside it was found.
    pub confidence: Option<f64>,
}

impl ParsedSections {
    /// Finish into a [`ProviderOutput`], substituting `default_confidence` when
    /// the text did not carry one.
    #[must_use]
    pub fn into_output(self, provider: &str, model: &str, default_confidence: f64) -> ProviderOutput {
        ProviderOutput {
            provider: provider.to_string(),
            model: model.to_string(),
            summary: self.summary,
            actions_short: self.actions_short,
            actions_mid: self.actions_mid,
            actions_long: self.actions_long,
            confidence: self
                .confidence
                .unwrap_or(default_confidence)
                .clamp(0.0, 1.0),
        }
    }
}

/// Parse a model answer into summary, action tiers and confidence.
#[must_use]
pub fn parse_sections(text: &str) -> ParsedSections {
    let headers: Vec<(Section, usize, usize)> = HEADER_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let section = Section::classify(caps.get(1)?.as_str())?;
            Some((section, whole.start(), whole.end()))
        })
        .collect();

    if headers.is_empty() {
        parse_fallback(text)
    } else {
        parse_structured(text, &headers)
    }
}

fn parse_structured(text: &str, headers: &[(Section, usize, usize)]) -> ParsedSections {
    let mut parsed = ParsedSections {
        path: ParsePath::Structured,
        summary: text.trim().to_string(),
        actions_short: Vec::new(),
        actions_mid: Vec::new(),
        actions_long: Vec::new(),
        confidence: None,
    };

    for (i, (section, _, body_start)) in headers.iter().enumerate() {
        let body_end = headers.get(i + 1).map_or(text.len(), |next| next.1);
        let body = text[*body_start..body_end].trim();

        match section {
            Section::Summary => {
                if !body.is_empty() {
                    parsed.summary = body.to_string();
                }
            }
            Section::Short => parsed.actions_short = bullets(body),
            Section::Mid => parsed.actions_mid = bullets(body),
            Section::Long => parsed.actions_long = bullets(body),
            Section::Confidence => parsed.confidence = extract_confidence(body),
        }
    }

    parsed
}

fn parse_fallback(text: &str) -> ParsedSections {
    let mut items = bullets(text);
    let (short_len, mid_len) = split_thirds(items.len());
    let long = items.split_off(short_len + mid_len);
    let mid = items.split_off(short_len);

    ParsedSections {
        path: ParsePath::Fallback,
        summary: text.trim().to_string(),
        actions_short: items,
        actions_mid: mid,
        actions_long: long,
        confidence: None,
    }
}

/// Sizes of the short and mid thirds of `n` items. Remainders go to the
/// earliest tiers; long gets whatever is left.
fn split_thirds(n: usize) -> (usize, usize) {
    let base = n / 3;
    let rem = n % 3;
    (base + usize::from(rem > 0), base + usize::from(rem > 1))
}

fn bullets(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter_map(|line| {
            BULLET_MARKERS
                .iter()
                .find_map(|marker| line.strip_prefix(*marker))
        })
        .map(|rest| rest.trim().to_string())
        .collect()
}

fn extract_confidence(body: &str) -> Option<f64> {
    CONFIDENCE_RE
        .find(body)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map(|v| v.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_answer_with_short_actions_only() {
        let text = "[趨勢摘要]\n曝光量穩定上升。\n\n[行動建議-短期]\n- 加強信貸標題\n• 更新房貸頁面\n\n[信心分數]\n0.8 because volume stable\n";
        let parsed = parse_sections(text);
        assert_eq!(parsed.path, ParsePath::Structured);
        assert_eq!(parsed.summary, "曝光量穩定上升。");
        assert_eq!(parsed.actions_short, vec!["加強信貸標題", "更新房貸頁面"]);
        assert!(parsed.actions_mid.is_empty());
        assert!(parsed.actions_long.is_empty());
        assert_eq!(parsed.confidence, Some(0.8));
    }

    #[test]
    fn fallback_splits_six_bullets_evenly() {
        let text = "Impressions rose.\n- one\n- two\n• three\n- four\nnot a bullet\n- five\n- six";
        let parsed = parse_sections(text);
        assert_eq!(parsed.path, ParsePath::Fallback);
        assert_eq!(parsed.summary, text);
        assert_eq!(parsed.actions_short, vec!["one", "two"]);
        assert_eq!(parsed.actions_mid, vec!["three", "four"]);
        assert_eq!(parsed.actions_long, vec!["five", "six"]);
        assert_eq!(parsed.confidence, None);

        let output = parsed.into_output("gemini", "gemini-2.0-flash", 0.65);
        assert!((output.confidence - 0.65).abs() < f64::EPSILON);
    }

    #[test]
    fn fallback_remainder_favors_earlier_tiers() {
        let text = "- a\n- b\n- c\n- d\n- e\n- f\n- g";
        let parsed = parse_sections(text);
        assert_eq!(parsed.actions_short, vec!["a", "b", "c"]);
        assert_eq!(parsed.actions_mid, vec!["d", "e"]);
        assert_eq!(parsed.actions_long, vec!["f", "g"]);

        let parsed = parse_sections("- a\n- b");
        assert_eq!(parsed.actions_short, vec!["a"]);
        assert_eq!(parsed.actions_mid, vec!["b"]);
        assert!(parsed.actions_long.is_empty());
    }

    #[test]
    fn empty_text_parses_to_empty_record() {
        let parsed = parse_sections("");
        assert_eq!(parsed.path, ParsePath::Fallback);
        assert_eq!(parsed.summary, "");
        assert!(parsed.actions_short.is_empty());
        assert!(parsed.actions_mid.is_empty());
        assert!(parsed.actions_long.is_empty());
        assert_eq!(parsed.confidence, None);
    }

    #[test]
    fn summary_only_header_leaves_actions_empty() {
        let parsed = parse_sections("[趨勢摘要]\n只有摘要\n- 這行不是行動建議區塊");
        assert_eq!(parsed.path, ParsePath::Structured);
        assert_eq!(parsed.summary, "只有摘要\n- 這行不是行動建議區塊");
        assert!(parsed.actions_short.is_empty());
        assert!(parsed.actions_mid.is_empty());
        assert!(parsed.actions_long.is_empty());
    }

    #[test]
    fn both_bullet_glyphs_are_identical() {
        let dash = parse_sections("[行動建議-長期]\n- 擴充內容");
        let dot = parse_sections("[行動建議-長期]\n• 擴充內容");
        assert_eq!(dash.actions_long, dot.actions_long);
        assert_eq!(dash.actions_long, vec!["擴充內容"]);
    }

    #[test]
    fn headers_tolerate_case_and_whitespace() {
        let text = "  [ Trend Summary ]  \r\nVolume is flat.\r\n[SHORT-TERM ACTIONS]\r\n- refresh titles\r\n[actions - mid term]\r\n- add FAQ\r\n[Long Term Actions]\r\n- build hub page\r\n[confidence score]\r\n1.0\r\n";
        let parsed = parse_sections(text);
        assert_eq!(parsed.path, ParsePath::Structured);
        assert_eq!(parsed.summary, "Volume is flat.");
        assert_eq!(parsed.actions_short, vec!["refresh titles"]);
        assert_eq!(parsed.actions_mid, vec!["add FAQ"]);
        assert_eq!(parsed.actions_long, vec!["build hub page"]);
        assert_eq!(parsed.confidence, Some(1.0));
    }

    #[test]
    fn header_inside_a_line_is_not_recognized() {
        let parsed = parse_sections("see [信心分數] below\n- tip");
        assert_eq!(parsed.path, ParsePath::Fallback);
        assert_eq!(parsed.actions_short, vec!["tip"]);
    }

    #[test]
    fn header_split_across_lines_is_not_recognized() {
        let parsed = parse_sections("[\n趨勢摘要\n]\nbody\n[行動建議 -\n短期]\n- tip");
        assert_eq!(parsed.path, ParsePath::Fallback);
        assert_eq!(parsed.summary, "[\n趨勢摘要\n]\nbody\n[行動建議 -\n短期]\n- tip");
        assert_eq!(parsed.actions_short, vec!["tip"]);
    }

    #[test]
    fn confidence_without_number_stays_unset() {
        let parsed = parse_sections("[趨勢摘要]\nx\n[信心分數]\nhigh");
        assert_eq!(parsed.confidence, None);
        let output = parsed.into_output("claude", "claude-3-5-sonnet-20241022", 0.7);
        assert!((output.confidence - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn confidence_above_one_is_clamped() {
        let parsed = parse_sections("[信心分數]\n1.75");
        assert_eq!(parsed.confidence, Some(1.0));
    }

    #[test]
    fn empty_summary_section_falls_back_to_whole_text() {
        let text = "[趨勢摘要]\n\n[行動建議-中期]\n- 中期建議";
        let parsed = parse_sections(text);
        assert_eq!(parsed.summary, text);
        assert_eq!(parsed.actions_mid, vec!["中期建議"]);
    }
}
