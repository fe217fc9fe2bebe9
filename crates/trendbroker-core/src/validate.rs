use std::collections::HashSet;

use thiserror::Error;

use crate::types::TrendRequest;

pub const MAX_TOP_KEYWORDS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Series '{name}' length {actual} != dates length {expected}")]
    SeriesLength {
        name: String,
        actual: usize,
        expected: usize,
    },

    #[error("top_keywords must contain between 1 and 10 entries, got {0}")]
    KeywordCount(usize),

    #[error("top_keywords contains duplicate entry '{0}'")]
    DuplicateKeyword(String),

    #[error("short_mid_long_base_days must be a positive integer")]
    BaseDays,
}

/// Check the structural invariants of a summarize request.
///
/// # Errors
///
/// Returns the first violated invariant. Series lengths are checked last so
/// shape problems in the keyword list surface first.
pub fn validate_request(request: &TrendRequest) -> Result<(), ValidationError> {
    let count = request.top_keywords.len();
    if count == 0 || count > MAX_TOP_KEYWORDS {
        return Err(ValidationError::KeywordCount(count));
    }

    let mut seen = HashSet::with_capacity(count);
    for keyword in &request.top_keywords {
        if !seen.insert(keyword.as_str()) {
            return Err(ValidationError::DuplicateKeyword(keyword.clone()));
        }
    }

    if request.short_mid_long_base_days == 0 {
        return Err(ValidationError::BaseDays);
    }

    let expected = request.dates.len();
    for series in &request.series {
        if series.data.len() != expected {
            return Err(ValidationError::SeriesLength {
                name: series.name.clone(),
                actual: series.data.len(),
                expected,
            });
        }
    }

    Ok(())
}
