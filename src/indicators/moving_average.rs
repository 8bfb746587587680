//! Simple and exponential moving averages.

use super::Reading;
use crate::{stats, AnalysisError, Period, Result};

/// Mean of the last `period` closes.
///
/// Fewer than `period` closes: `InsufficientHistory(last close)`.
pub fn sma(closes: &[f64], period: Period) -> Result<Reading<f64>> {
    let last = *closes.last().ok_or(AnalysisError::EmptyInput)?;
    let period = period.get();

    if closes.len() < period {
        return Ok(Reading::InsufficientHistory(last));
    }
    Ok(Reading::Ready(stats::mean(&closes[closes.len() - period..])?))
}

/// EMA at every point of the series.
///
/// Seeded with the first price (not an SMA of the first `period` values), then
/// `ema = (price - ema) * 2 / (period + 1) + ema` left to right.
pub fn ema_series(values: &[f64], period: Period) -> Vec<f64> {
    let Some(&seed) = values.first() else {
        return Vec::new();
    };
    let k = 2.0 / (period.get() as f64 + 1.0);

    let mut out = Vec::with_capacity(values.len());
    let mut current = seed;
    out.push(current);
    for price in &values[1..] {
        current = (price - current) * k + current;
        out.push(current);
    }
    out
}

/// Latest EMA value.
///
/// Fewer than `period` closes: `InsufficientHistory(last close)`.
pub fn ema(closes: &[f64], period: Period) -> Result<Reading<f64>> {
    let last = *closes.last().ok_or(AnalysisError::EmptyInput)?;

    if closes.len() < period.get() {
        return Ok(Reading::InsufficientHistory(last));
    }
    let series = ema_series(closes, period);
    Ok(Reading::Ready(series.last().copied().unwrap_or(last)))
}
