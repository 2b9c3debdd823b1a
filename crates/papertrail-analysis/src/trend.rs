//! Growth ratio and recent slope per country.

use std::cmp::Ordering;

use papertrail_core::{country_display_name, CountYearRecord, CountrySummary, Error, Result};
use tracing::info;

use crate::pivot::PivotTable;

/// Length of the trailing slope window, ending at the last year.
pub const RECENT_WINDOW_YEARS: usize = 5;

/// `(end + 1) / (start + 1)`: finite and strictly positive for any counts.
pub fn growth_ratio(start_value: u64, end_value: u64) -> f64 {
    (end_value as f64 + 1.0) / (start_value as f64 + 1.0)
}

/// Ordinary-least-squares slope of `values` against x = 0..n.
///
/// Fails with [`Error::DegenerateWindow`] for fewer than two points.
pub fn ols_slope(values: &[f64]) -> Result<f64> {
    let n = values.len();
    if n < 2 {
        return Err(Error::DegenerateWindow(n));
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = values.iter().sum::<f64>() / n as f64;

    let (num, den) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, &y)| {
            let dx = i as f64 - x_mean;
            (num + dx * (y - y_mean), den + dx * dx)
        });
    Ok(num / den)
}

/// Pivot → totals → growth ratio → recent slope → sorted summary.
pub struct TrendAnalyzer;

impl TrendAnalyzer {
    /// Summarize every country seen in `records`.
    ///
    /// Sorted by `total_count` descending, ties by `country_code` ascending.
    /// The slope window is the last [`RECENT_WINDOW_YEARS`] years, clamped to
    /// the range.
    pub fn summarize(
        records: &[CountYearRecord],
        start_year: i32,
        end_year: i32,
    ) -> Result<Vec<CountrySummary>> {
        let table = PivotTable::from_records(records, start_year, end_year)?;
        let window_len = table.years().len().min(RECENT_WINDOW_YEARS);

        let mut summary = Vec::with_capacity(table.countries().len());
        for country_code in table.countries() {
            let Some(series) = table.column(country_code) else {
                continue;
            };
            let total_count = series.iter().fold(0u64, |acc, &v| acc.saturating_add(v));
            let first = series.first().copied().unwrap_or(0);
            let last = series.last().copied().unwrap_or(0);
            let window: Vec<f64> = series[series.len() - window_len..]
                .iter()
                .map(|&v| v as f64)
                .collect();

            summary.push(CountrySummary {
                country_code: country_code.clone(),
                country: country_display_name(country_code),
                total_count,
                growth_ratio: growth_ratio(first, last),
                recent_slope: ols_slope(&window)?,
            });
        }

        summary.sort_by(|a, b| match b.total_count.cmp(&a.total_count) {
            Ordering::Equal => a.country_code.cmp(&b.country_code),
            other => other,
        });

        info!(
            "Trend summary: {} countries over {}..={} (slope window {} years)",
            summary.len(),
            start_year,
            end_year,
            window_len
        );
        Ok(summary)
    }
}
