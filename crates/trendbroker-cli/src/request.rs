//! Build summarize payloads from the dashboard's CSV time-series export.
//!
//! The export has a `date` column followed by one column per keyword, one row
//! per day. Keywords are ranked by total impressions and the top N become the
//! payload's `top_keywords` and `series`.

use std::collections::HashMap;
use std::io::Read;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use trendbroker_core::series::{clamp_period, date_range, trailing_period, SeriesTransform};
use trendbroker_core::{SeriesItem, TrendRequest, DEFAULT_MODE, MAX_TOP_KEYWORDS};

pub(crate) const DEFAULT_TOP: usize = 5;

#[derive(Debug, Clone)]
pub(crate) struct RequestOptions {
    pub top: usize,
    /// Trailing window length; the whole export when `None`.
    pub days: Option<u32>,
    pub transform: SeriesTransform,
    pub output_lang: Option<String>,
    pub base_days: u32,
    pub use_cache: bool,
}

/// Day-indexed impressions parsed from an export.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CsvExport {
    pub dates: Vec<NaiveDate>,
    pub series: Vec<SeriesItem>,
}

/// Parse a CSV export. Blank cells count as zero impressions.
///
/// # Errors
///
/// Fails on a missing `date` header, an unparsable date or value, or an
/// export with no keyword columns or no rows.
pub(crate) fn read_csv_export<R: Read>(reader: R) -> anyhow::Result<CsvExport> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers().context("failed to read CSV headers")?.clone();
    match headers.get(0) {
        Some(first) if first.eq_ignore_ascii_case("date") => {}
        _ => bail!("first CSV column must be `date`"),
    }
    if headers.len() < 2 {
        bail!("CSV export has no keyword columns");
    }

    let mut series: Vec<SeriesItem> = headers
        .iter()
        .skip(1)
        .map(|name| SeriesItem {
            name: name.to_string(),
            data: Vec::new(),
        })
        .collect();
    let mut dates = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header line; CSV lines are 1-based.
        let line = idx + 2;
        let record = result.with_context(|| format!("CSV parse error on line {line}"))?;

        let raw_date = record.get(0).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
            .with_context(|| format!("line {line}: invalid date `{raw_date}`"))?;
        dates.push(date);

        for (col, item) in series.iter_mut().enumerate() {
            let cell = record.get(col + 1).unwrap_or_default();
            let value = if cell.is_empty() {
                0.0
            } else {
                cell.parse::<f64>().with_context(|| {
                    format!("line {line}: invalid value `{cell}` for `{}`", item.name)
                })?
            };
            item.data.push(value);
        }
    }

    if dates.is_empty() {
        bail!("CSV export has no rows");
    }

    tracing::debug!(rows = dates.len(), keywords = series.len(), "read CSV export");
    Ok(CsvExport { dates, series })
}

/// Keep the `top` series with the largest totals, preserving column order on
/// ties.
pub(crate) fn top_series(series: &[SeriesItem], top: usize) -> Vec<SeriesItem> {
    let mut ranked: Vec<(usize, f64)> = series
        .iter()
        .enumerate()
        .map(|(i, s)| (i, s.data.iter().sum()))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    ranked
        .into_iter()
        .take(top.clamp(1, MAX_TOP_KEYWORDS))
        .map(|(i, _)| series[i].clone())
        .collect()
}

/// Assemble a [`TrendRequest`] from an export.
///
/// Without `days`, the period spans the first to last exported date, capped
/// at 90 days. With `days`, it is the trailing window ending on the last
/// exported date. Days inside the period that the export lacks count as zero
/// impressions; rows outside it are dropped.
///
/// # Errors
///
/// Fails when the export's last date precedes its first.
pub(crate) fn build_request(
    export: &CsvExport,
    options: &RequestOptions,
) -> anyhow::Result<TrendRequest> {
    let (Some(first), Some(last)) = (export.dates.first(), export.dates.last()) else {
        bail!("CSV export has no rows");
    };
    let period = match options.days {
        Some(days) => trailing_period(*last, Some(days)),
        None => clamp_period(*first, *last)
            .with_context(|| format!("export dates run backwards ({first} .. {last})"))?,
    };

    let dates = date_range(&period);
    let rows: HashMap<String, usize> = export
        .dates
        .iter()
        .enumerate()
        .map(|(i, d)| (d.format("%Y-%m-%d").to_string(), i))
        .collect();
    let windowed: Vec<SeriesItem> = export
        .series
        .iter()
        .map(|s| SeriesItem {
            name: s.name.clone(),
            data: dates
                .iter()
                .map(|d| rows.get(d).map_or(0.0, |&i| s.data[i]))
                .collect(),
        })
        .collect();

    let series = options.transform.apply(&top_series(&windowed, options.top));

    Ok(TrendRequest {
        period,
        top_keywords: series.iter().map(|s| s.name.clone()).collect(),
        dates,
        series,
        output_lang: options.output_lang.clone(),
        short_mid_long_base_days: options.base_days,
        mode: DEFAULT_MODE.to_string(),
        use_cache: options.use_cache,
    })
}
