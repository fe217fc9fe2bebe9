//! Per-day series shaping used when preparing summarize payloads.
//!
//! These mirror the dashboard's top-N comparison view: a window of at most
//! [`MAX_WINDOW_DAYS`] days, optional per-day share normalization, running
//! totals, and a trailing moving average.

use chrono::{Duration, NaiveDate};

use crate::types::{Period, SeriesItem};

pub const MAX_WINDOW_DAYS: u32 = 90;
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Build a period from explicit bounds, truncating windows longer than
/// [`MAX_WINDOW_DAYS`] by moving `end` forward from `start`.
///
/// Returns `None` when `end` precedes `start`.
#[must_use]
pub fn clamp_period(start: NaiveDate, end: NaiveDate) -> Option<Period> {
    let total = (end - start).num_days() + 1;
    if total < 1 {
        return None;
    }
    if total > i64::from(MAX_WINDOW_DAYS) {
        return Some(Period {
            start,
            end: start + Duration::days(i64::from(MAX_WINDOW_DAYS) - 1),
            days: MAX_WINDOW_DAYS,
        });
    }
    Some(Period {
        start,
        end,
        days: u32::try_from(total).unwrap_or(MAX_WINDOW_DAYS),
    })
}

/// The `days`-long window ending on `today`, with `days` clamped to `1..=90`.
#[must_use]
pub fn trailing_period(today: NaiveDate, days: Option<u32>) -> Period {
    let days = days
        .unwrap_or(DEFAULT_WINDOW_DAYS)
        .clamp(1, MAX_WINDOW_DAYS);
    Period {
        start: today - Duration::days(i64::from(days) - 1),
        end: today,
        days,
    }
}

/// Every date in `period`, inclusive, as ISO 8601 strings.
#[must_use]
pub fn date_range(period: &Period) -> Vec<String> {
    period
        .start
        .iter_days()
        .take_while(|d| *d <= period.end)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect()
}

/// Replace each value by its share of that day's total across all series.
///
/// Days whose total is zero become `0.0` for every series.
#[must_use]
pub fn normalize_share(series: &[SeriesItem]) -> Vec<SeriesItem> {
    let len = series.iter().map(|s| s.data.len()).max().unwrap_or(0);
    let totals: Vec<f64> = (0..len)
        .map(|i| series.iter().filter_map(|s| s.data.get(i)).sum())
        .collect();

    series
        .iter()
        .map(|s| SeriesItem {
            name: s.name.clone(),
            data: s
                .data
                .iter()
                .zip(&totals)
                .map(|(v, total)| if *total > 0.0 { v / total } else { 0.0 })
                .collect(),
        })
        .collect()
}

/// Running sum of `data`.
#[must_use]
pub fn cumulative(data: &[f64]) -> Vec<f64> {
    data.iter()
        .scan(0.0, |acc, v| {
            *acc += v;
            Some(*acc)
        })
        .collect()
}

/// Trailing simple moving average. The first `window - 1` points average over
/// however many values exist so far. A window of 0 or 1 returns the input.
#[must_use]
pub fn moving_average(data: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 {
        return data.to_vec();
    }
    let mut out = Vec::with_capacity(data.len());
    let mut sum = 0.0;
    for (i, v) in data.iter().enumerate() {
        sum += v;
        if i >= window {
            sum -= data[i - window];
        }
        #[allow(clippy::cast_precision_loss)]
        let denom = (i + 1).min(window) as f64;
        out.push(sum / denom);
    }
    out
}

/// Display transforms applied to a set of series, in the order
/// normalize → cumulative → smooth. Smoothing is skipped for cumulative views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeriesTransform {
    pub normalized: bool,
    pub cumulative: bool,
    pub smooth: usize,
}

impl SeriesTransform {
    #[must_use]
    pub fn apply(&self, series: &[SeriesItem]) -> Vec<SeriesItem> {
        let mut shaped = if self.normalized {
            normalize_share(series)
        } else {
            series.to_vec()
        };

        for item in &mut shaped {
            if self.cumulative {
                item.data = cumulative(&item.data);
            } else if self.smooth > 0 {
                item.data = moving_average(&item.data, self.smooth);
            }
        }
        shaped
    }
}
