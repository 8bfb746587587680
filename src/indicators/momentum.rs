//! Momentum indicators: RSI and MACD.

use super::{moving_average::ema_series, Reading};
use crate::{AnalysisError, Period, Result};

/// Neutral RSI reported when there are not enough deltas.
pub const RSI_NEUTRAL: f64 = 50.0;

/// Relative Strength Index over the trailing `period` deltas.
///
/// Gains and losses are plain averages over the window (no Wilder smoothing).
/// With no losses the RSI is exactly 100. Fewer than `period + 1` closes give
/// `InsufficientHistory(50.0)`.
pub fn rsi(closes: &[f64], period: Period) -> Result<Reading<f64>> {
    if closes.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    let period = period.get();
    if closes.len() < period + 1 {
        return Ok(Reading::InsufficientHistory(RSI_NEUTRAL));
    }

    let tail = &closes[closes.len() - period - 1..];
    let (gains, losses) = tail.windows(2).fold((0.0, 0.0), |(g, l), w| {
        let delta = w[1] - w[0];
        if delta > 0.0 {
            (g + delta, l)
        } else {
            (g, l - delta)
        }
    });

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_loss == 0.0 {
        return Ok(Reading::Ready(100.0));
    }
    let rs = avg_gain / avg_loss;
    Ok(Reading::Ready(100.0 - 100.0 / (1.0 + rs)))
}

/// MACD parameters.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MacdParams {
    /// Fast EMA period (default: 12).
    pub fast_period: Period,
    /// Slow EMA period (default: 26).
    pub slow_period: Period,
    /// Signal EMA period (default: 9).
    pub signal_period: Period,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast_period: Period::new_const(12),
            slow_period: Period::new_const(26),
            signal_period: Period::new_const(9),
        }
    }
}

/// Latest MACD values.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MacdLine {
    /// Fast EMA - slow EMA.
    pub macd: f64,
    /// EMA of the MACD series.
    pub signal: f64,
    /// MACD - signal.
    pub histogram: f64,
}

/// MACD with a signal line that is a true EMA of the MACD series.
///
/// Both EMAs use the first-price seed of [`ema_series`]. Fewer closes than the
/// slow period give an `InsufficientHistory` reading computed the same way.
pub fn macd(closes: &[f64], params: MacdParams) -> Result<Reading<MacdLine>> {
    if closes.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }

    let fast = ema_series(closes, params.fast_period);
    let slow = ema_series(closes, params.slow_period);
    let macd_series: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
    let signal_series = ema_series(&macd_series, params.signal_period);

    let macd = macd_series.last().copied().unwrap_or_default();
    let signal = signal_series.last().copied().unwrap_or_default();
    let line = MacdLine {
        macd,
        signal,
        histogram: macd - signal,
    };

    if closes.len() < params.slow_period.get() {
        Ok(Reading::InsufficientHistory(line))
    } else {
        Ok(Reading::Ready(line))
    }
}
