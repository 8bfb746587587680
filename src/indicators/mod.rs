//! Technical indicators over a close-price series (oldest first).
//!
//! # Indicators
//!
//! - **SMA / EMA**: [`sma`], [`ema`], [`ema_series`]
//! - **RSI**: [`rsi`]
//! - **MACD**: [`macd`], signal line is a true EMA of the MACD series
//! - **Bollinger Bands**: [`bollinger`]
//!
//! Every function takes a non-empty slice and returns a [`Reading`]. When the
//! series is shorter than the indicator needs, the reading is
//! [`Reading::InsufficientHistory`] carrying the documented fallback, so a
//! caller can always tell a real value from a placeholder.

pub mod momentum;
pub mod moving_average;
pub mod volatility;

pub use momentum::{macd, rsi, MacdLine, MacdParams};
pub use moving_average::{ema, ema_series, sma};
pub use volatility::{bollinger, BollingerBands, BollingerParams};

use crate::{Period, Result};

/// Indicator value tagged with whether enough history backed it.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Reading<T> {
    Ready(T),
    /// Fallback used because the series was too short
    InsufficientHistory(T),
}

impl<T> Reading<T> {
    /// The value, real or fallback
    #[inline]
    pub fn value(self) -> T {
        match self {
            Reading::Ready(v) | Reading::InsufficientHistory(v) => v,
        }
    }

    /// The value only if enough history backed it
    #[inline]
    pub fn ready(self) -> Option<T> {
        match self {
            Reading::Ready(v) => Some(v),
            Reading::InsufficientHistory(_) => None,
        }
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        matches!(self, Reading::Ready(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reading<U> {
        match self {
            Reading::Ready(v) => Reading::Ready(f(v)),
            Reading::InsufficientHistory(v) => Reading::InsufficientHistory(f(v)),
        }
    }
}

const SMA_20: Period = Period::new_const(20);
const SMA_50: Period = Period::new_const(50);
const SMA_200: Period = Period::new_const(200);
const EMA_12: Period = Period::new_const(12);
const EMA_26: Period = Period::new_const(26);
const RSI_14: Period = Period::new_const(14);

/// Snapshot of the standard indicators for one series.
///
/// A field is `None` when the series is too short for that indicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSet {
    pub sma20: Option<f64>,
    pub sma50: Option<f64>,
    pub sma200: Option<f64>,
    pub ema12: Option<f64>,
    pub ema26: Option<f64>,
    pub rsi14: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub bollinger_upper: Option<f64>,
    pub bollinger_lower: Option<f64>,
}

impl IndicatorSet {
    /// Compute every indicator with its standard parameters.
    pub fn compute(closes: &[f64]) -> Result<Self> {
        let macd_line = macd(closes, MacdParams::default())?.ready();
        let bands = bollinger(closes, BollingerParams::default())?.ready();

        Ok(Self {
            sma20: sma(closes, SMA_20)?.ready(),
            sma50: sma(closes, SMA_50)?.ready(),
            sma200: sma(closes, SMA_200)?.ready(),
            ema12: ema(closes, EMA_12)?.ready(),
            ema26: ema(closes, EMA_26)?.ready(),
            rsi14: rsi(closes, RSI_14)?.ready(),
            macd: macd_line.map(|m| m.macd),
            macd_signal: macd_line.map(|m| m.signal),
            bollinger_upper: bands.map(|b| b.upper),
            bollinger_lower: bands.map(|b| b.lower),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AnalysisError;

    #[test]
    fn test_reading_accessors() {
        let ready = Reading::Ready(1.5);
        assert_eq!(ready.value(), 1.5);
        assert_eq!(ready.ready(), Some(1.5));

        let degraded = Reading::InsufficientHistory(2.0);
        assert_eq!(degraded.value(), 2.0);
        assert_eq!(degraded.ready(), None);
        assert_eq!(degraded.map(|v| v * 2.0), Reading::InsufficientHistory(4.0));
    }

    #[test]
    fn test_indicator_set_short_history() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let set = IndicatorSet::compute(&closes).unwrap();

        assert!(set.sma20.is_some());
        assert!(set.sma50.is_none());
        assert!(set.sma200.is_none());
        assert!(set.ema12.is_some());
        assert!(set.ema26.is_some());
        assert_eq!(set.rsi14, Some(100.0));
        assert!(set.macd.is_some() && set.macd_signal.is_some());
        assert!(set.bollinger_lower.unwrap() <= set.sma20.unwrap());
        assert!(set.sma20.unwrap() <= set.bollinger_upper.unwrap());
    }

    #[test]
    fn test_indicator_set_full_history() {
        let closes: Vec<f64> = (0..250).map(|i| 100.0 + (i as f64 * 0.3).sin()).collect();
        let set = IndicatorSet::compute(&closes).unwrap();
        assert!(set.sma200.is_some());
        let rsi = set.rsi14.unwrap();
        assert!((0.0..=100.0).contains(&rsi));
    }

    #[test]
    fn test_indicator_set_empty() {
        assert_eq!(IndicatorSet::compute(&[]), Err(AnalysisError::EmptyInput));
    }
}
