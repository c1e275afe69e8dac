//! Growth trend extraction from review timestamps.
//!
//! Review timestamps are capped to the trailing 365 days of the newest
//! review (not wall-clock now, so a long-dormant app is not judged against
//! today), bucketed into gap-free weekly bins, log-compressed, and fitted
//! with an ordinary-least-squares line. The slope is the growth signal in
//! log-count units per week.

use chrono::{DateTime, NaiveDate};

const DAY_MS: i64 = 86_400_000;
const WEEK_MS: i64 = 7 * DAY_MS;
const WINDOW_MS: i64 = 365 * DAY_MS;

/// Parse one timestamp to epoch milliseconds. Accepts RFC 3339 (the reviews
/// feed format) with a plain-date fallback.
fn parse_timestamp(raw: &str) -> Option<i64> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw.trim()) {
        return Some(parsed.timestamp_millis());
    }
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Weekly review counts over the retained window, gap-free. Bin 0 is the
/// epoch week of the earliest retained timestamp.
fn weekly_counts(mut times: Vec<i64>) -> Vec<u64> {
    times.sort_unstable();

    let newest = *times.last().expect("non-empty by construction");
    let cutoff = newest - WINDOW_MS;
    times.retain(|&t| t >= cutoff);

    let start_week = times[0].div_euclid(WEEK_MS);
    let last_week = newest.div_euclid(WEEK_MS);
    let mut counts = vec![0u64; (last_week - start_week + 1) as usize];

    for t in times {
        let index = (t.div_euclid(WEEK_MS) - start_week) as usize;
        counts[index] += 1;
    }
    counts
}

/// Ordinary-least-squares slope of y over x. Degenerate inputs (fewer than
/// two points, zero variance) yield 0, never NaN.
fn ols_slope(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len();
    if n < 2 {
        return 0.0;
    }

    let n_f = n as f64;
    let sum_x: f64 = x.iter().sum();
    let sum_y: f64 = y.iter().sum();
    let sum_xy: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();
    let sum_xx: f64 = x.iter().map(|a| a * a).sum();

    let denom = n_f * sum_xx - sum_x * sum_x;
    if denom == 0.0 {
        return 0.0;
    }

    (n_f * sum_xy - sum_x * sum_y) / denom
}

/// Weekly log-count trend slope from raw review timestamps.
///
/// `None` means no usable history at all (empty input or nothing parsed),
/// which is a distinct state from a flat trend of 0.
pub fn growth_slope(timestamps: &[String]) -> Option<f64> {
    let times: Vec<i64> = timestamps.iter().filter_map(|t| parse_timestamp(t)).collect();
    if times.is_empty() {
        return None;
    }

    let counts = weekly_counts(times);

    let x: Vec<f64> = (0..counts.len()).map(|i| i as f64).collect();
    let y: Vec<f64> = counts.iter().map(|&c| (1.0 + c as f64).ln()).collect();

    let slope = ols_slope(&x, &y);
    tracing::debug!(weeks = counts.len(), slope, "growth slope fitted");
    Some(slope)
}
