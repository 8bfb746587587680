//! Basic statistics over price series.
//!
//! Everything here is a plain function over `&[f64]`. An empty slice is a
//! caller bug and yields [`AnalysisError::EmptyInput`]; every other numeric
//! edge case (single element, zero denominator) resolves to a documented value.

use crate::{AnalysisError, Result};

/// Arithmetic mean.
pub fn mean(xs: &[f64]) -> Result<f64> {
    if xs.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    Ok(xs.iter().sum::<f64>() / xs.len() as f64)
}

/// Population standard deviation.
///
/// Pass `around_mean` when the mean is already known (Bollinger Bands reuse the
/// SMA); otherwise it is computed. A single element gives `0.0`.
pub fn stddev(xs: &[f64], around_mean: Option<f64>) -> Result<f64> {
    let m = match around_mean {
        Some(m) => m,
        None => mean(xs)?,
    };
    if xs.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    if xs.len() == 1 {
        return Ok(0.0);
    }
    let variance = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / xs.len() as f64;
    Ok(variance.sqrt())
}

/// Ordinary least squares line through `xs` indexed `0..n`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    /// Value of the fitted line at index `x`.
    #[inline]
    pub fn at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Least squares slope and intercept. Fewer than two points give slope `0`
/// with the intercept at the single value (or `0` when empty).
pub fn linear_regression(xs: &[f64]) -> LinearFit {
    if xs.len() < 2 {
        return LinearFit {
            slope: 0.0,
            intercept: xs.first().copied().unwrap_or(0.0),
        };
    }

    let n = xs.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = xs.iter().sum::<f64>() / n;

    let (num, den) = xs
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, y)| {
            let dx = i as f64 - x_mean;
            (num + dx * (y - y_mean), den + dx * dx)
        });

    let slope = num / den;
    LinearFit {
        slope,
        intercept: y_mean - slope * x_mean,
    }
}

/// Relative change `(to - from) / from`; `0.0` when `from == 0`.
#[inline]
pub fn pct_change(from: f64, to: f64) -> f64 {
    if from == 0.0 {
        return 0.0;
    }
    (to - from) / from
}

/// Absolute and percent change between a previous close and the current price.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PriceChange {
    pub change: f64,
    /// Percent, i.e. `2.5` for +2.5%.
    pub change_percent: f64,
}

/// Quote-style change. A non-positive previous close reports no change.
pub fn price_change(previous_close: f64, current: f64) -> PriceChange {
    if previous_close <= 0.0 {
        return PriceChange {
            change: 0.0,
            change_percent: 0.0,
        };
    }
    let change = current - previous_close;
    PriceChange {
        change,
        change_percent: change / previous_close * 100.0,
    }
}
