//! Trend classification and the pattern-scan context built from it.
//!
//! A trailing window (10 closes by default) is split in half and the mean of
//! the later half is compared with the mean of the earlier half. A move beyond
//! ±2% is a trend; anything else, or fewer than 5 closes, is sideways.

use crate::{stats, Period, OHLCV};

/// Direction of the preceding price action
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TrendLabel {
    Uptrend,
    Downtrend,
    #[default]
    Sideways,
}

impl TrendLabel {
    #[inline]
    pub fn is_up(self) -> bool {
        matches!(self, TrendLabel::Uptrend)
    }

    #[inline]
    pub fn is_down(self) -> bool {
        matches!(self, TrendLabel::Downtrend)
    }
}

/// Half-window mean comparison
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrendClassifier {
    pub lookback: Period,
    /// Relative change between half means that counts as a trend
    pub threshold: f64,
    /// Below this many closes the answer is always sideways
    pub min_points: usize,
}

impl Default for TrendClassifier {
    fn default() -> Self {
        Self {
            lookback: Period::new_const(10),
            threshold: 0.02,
            min_points: 5,
        }
    }
}

impl TrendClassifier {
    pub fn classify(&self, closes: &[f64]) -> TrendLabel {
        if closes.len() < self.min_points.max(2) {
            return TrendLabel::Sideways;
        }

        let take = self.lookback.get().min(closes.len());
        let window = &closes[closes.len() - take..];
        let (early, late) = window.split_at(window.len() / 2);

        let (Ok(early_mean), Ok(late_mean)) = (stats::mean(early), stats::mean(late)) else {
            return TrendLabel::Sideways;
        };

        let change = stats::pct_change(early_mean, late_mean);
        if change > self.threshold {
            TrendLabel::Uptrend
        } else if change < -self.threshold {
            TrendLabel::Downtrend
        } else {
            TrendLabel::Sideways
        }
    }
}

/// Classify with the default 10-point window and ±2% threshold.
pub fn classify(closes: &[f64]) -> TrendLabel {
    TrendClassifier::default().classify(closes)
}

// ============================================================
// SCAN CONTEXT
// ============================================================

/// Trend preceding the candles under test.
///
/// `trend_before(n)` is the label of the window with its last `n` candles
/// removed, so a pattern is never its own context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanContext {
    preceding: [TrendLabel; 3],
}

impl ScanContext {
    /// Labels for spans 1, 2 and 3
    pub fn new(preceding: [TrendLabel; 3]) -> Self {
        Self { preceding }
    }

    /// Same label for every span
    pub fn uniform(label: TrendLabel) -> Self {
        Self {
            preceding: [label; 3],
        }
    }

    #[inline]
    pub fn trend_before(&self, span: usize) -> TrendLabel {
        self.preceding
            .get(span.saturating_sub(1))
            .copied()
            .unwrap_or_default()
    }
}

/// Provider of scan context for a window
pub trait ContextProvider: Send + Sync {
    fn context<T: OHLCV>(&self, window: &[T]) -> ScanContext;
}

/// Runs the trend classifier over the closes preceding each span
#[derive(Debug, Clone, Default)]
pub struct DefaultContextProvider {
    pub classifier: TrendClassifier,
}

impl ContextProvider for DefaultContextProvider {
    fn context<T: OHLCV>(&self, window: &[T]) -> ScanContext {
        // enough for the longest span plus whichever of lookback/min_points is larger
        let keep = self.classifier.lookback.get().max(self.classifier.min_points) + 3;
        let tail = &window[window.len().saturating_sub(keep)..];
        let closes: Vec<f64> = tail.iter().map(|b| b.close()).collect();
        let before = |span: usize| {
            let end = closes.len().saturating_sub(span);
            self.classifier.classify(&closes[..end])
        };
        ScanContext::new([before(1), before(2), before(3)])
    }
}
