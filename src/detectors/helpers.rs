//! Common helper functions for candlestick pattern detection
//!
//! Geometry thresholds, confidence weight tables and the pin-bar shape shared
//! by the Hammer family.

use crate::{
    Candle, DetectedPattern, OHLCVExt, PatternCategory, PatternClass, PatternId, PatternMetadata,
    OHLCV,
};

// ============================================================
// GEOMETRY THRESHOLDS (fractions of the candle range)
// ============================================================

/// Doji: body < 10% of range
pub const DOJI_RATIO: f64 = 0.1;
/// Dragonfly/Gravestone: body < 5% of range
pub const TIGHT_DOJI_RATIO: f64 = 0.05;
/// Dragonfly/Gravestone: dominant shadow > 70% of range
pub const LONG_LEG_RATIO: f64 = 0.7;
/// "No shadow" tolerance for Dragonfly/Gravestone
pub const NO_SHADOW_RATIO: f64 = 0.01;
/// Hammer family: body <= 30% of range
pub const SMALL_BODY_RATIO: f64 = 0.3;
/// Hammer family: dominant shadow >= 2x body
pub const SHADOW_BODY_FACTOR: f64 = 2.0;
/// Hammer family bonus: dominant shadow >= 3x body
pub const EXTENDED_SHADOW_FACTOR: f64 = 3.0;
/// Spinning top: body between 10% and 30% of range
pub const SPINNING_TOP_MAX_RATIO: f64 = 0.3;
/// Star patterns: body >= 50% of range counts as a large candle
pub const LARGE_BODY_RATIO: f64 = 0.5;
/// Star patterns: middle body <= 30% of the first candle's range
pub const STAR_BODY_RATIO: f64 = 0.3;
/// Two-candle bonus: second body >= 1.5x first body
pub const DOMINANT_BODY_FACTOR: f64 = 1.5;
/// Piercing/Dark Cloud bonus: penetration >= 75% of the first body
pub const DEEP_PENETRATION_RATIO: f64 = 0.75;
/// Harami bonus: second body <= 25% of first body
pub const SMALL_HARAMI_RATIO: f64 = 0.25;

// ============================================================
// CONFIDENCE WEIGHT TABLES
// ============================================================
// Each table sums to 1.0. Gating conditions are listed first and always hold
// for an emitted match; the trailing entries are quality bonuses.

/// Hammer, Hanging Man, Inverted Hammer, Shooting Star:
/// small body, long dominant shadow, short opposite shadow, trend context,
/// dominant shadow >= 3x body, body in the outer third of the range.
pub const PIN_BAR_WEIGHTS: [f64; 6] = [0.20, 0.20, 0.15, 0.15, 0.15, 0.15];

/// Bullish/Bearish Engulfing:
/// body containment, opposite colours, trend context,
/// second body >= 1.5x first, higher volume on the second candle.
pub const ENGULFING_WEIGHTS: [f64; 5] = [0.40, 0.20, 0.20, 0.10, 0.10];

/// Piercing Line / Dark Cloud Cover:
/// first candle colour, gap open beyond the first extreme, close past the
/// first midpoint, trend context, deep penetration, long first body.
pub const PENETRATION_WEIGHTS: [f64; 6] = [0.20, 0.20, 0.20, 0.15, 0.15, 0.10];

/// Bullish/Bearish Harami:
/// second body inside first, opposite colours, trend context,
/// tiny second body, long first body.
pub const HARAMI_WEIGHTS: [f64; 5] = [0.30, 0.15, 0.15, 0.20, 0.20];

/// Three White Soldiers / Three Black Crows:
/// three same-colour candles, each opening inside the previous body,
/// strictly progressing closes, long bodies, short closing shadows.
pub const THREE_LINE_WEIGHTS: [f64; 5] = [0.25, 0.25, 0.20, 0.15, 0.15];

/// Fixed confidences
pub const DOJI_CONFIDENCE: u8 = 60;
pub const DRAGONFLY_CONFIDENCE: u8 = 70;
pub const SPINNING_TOP_CONFIDENCE: u8 = 50;
pub const STAR_CONFIDENCE: u8 = 80;

/// Sum of the weights whose condition holds, scaled to 0..=100.
pub fn weighted_confidence(weights: &[f64], hits: &[bool]) -> u8 {
    let score: f64 = weights
        .iter()
        .zip(hits)
        .filter(|(_, hit)| **hit)
        .map(|(w, _)| w)
        .sum();
    (score * 100.0).round().clamp(0.0, 100.0) as u8
}

// ============================================================
// SHADOW TOLERANCE
// ============================================================

/// How short the opposite shadow of a pin bar must be, as a fraction of the body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowTolerance {
    /// < 10% of body
    #[default]
    Strict,
    /// < 30% of body
    Moderate,
    /// < 50% of body
    Loose,
}

impl ShadowTolerance {
    #[inline]
    pub fn factor(self) -> f64 {
        match self {
            ShadowTolerance::Strict => 0.1,
            ShadowTolerance::Moderate => 0.3,
            ShadowTolerance::Loose => 0.5,
        }
    }

    /// Map a numeric factor from a parameter map to the nearest tier.
    pub fn from_factor(factor: f64) -> Self {
        [
            ShadowTolerance::Strict,
            ShadowTolerance::Moderate,
            ShadowTolerance::Loose,
        ]
        .into_iter()
        .min_by(|a, b| {
            let da = (a.factor() - factor).abs();
            let db = (b.factor() - factor).abs();
            da.total_cmp(&db)
        })
        .unwrap_or_default()
    }
}

// ============================================================
// PIN BAR SHAPE
// ============================================================

/// Which side carries the long shadow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinSide {
    /// Long lower shadow (Hammer, Hanging Man)
    Lower,
    /// Long upper shadow (Shooting Star, Inverted Hammer)
    Upper,
}

/// Pin-bar geometry parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinBarShape {
    pub small_body_ratio: f64,
    pub shadow_factor: f64,
    pub tolerance: ShadowTolerance,
}

impl Default for PinBarShape {
    fn default() -> Self {
        Self {
            small_body_ratio: SMALL_BODY_RATIO,
            shadow_factor: SHADOW_BODY_FACTOR,
            tolerance: ShadowTolerance::Strict,
        }
    }
}

/// Quality bonuses of a matched pin bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinBarQuality {
    pub extended_shadow: bool,
    pub body_in_outer_third: bool,
}

impl PinBarShape {
    /// `None` unless the candle has the pin-bar geometry on `side`.
    ///
    /// The opposite shadow must be strictly shorter than `tolerance × body`
    /// while the dominant one is at least `shadow_factor × body`, so a candle
    /// can never be a pin bar on both sides.
    pub fn matches<T: OHLCV>(&self, bar: &T, side: PinSide) -> Option<PinBarQuality> {
        let body_ratio = bar.body_ratio()?;
        let body = bar.body();
        let range = bar.range();
        let (dominant, opposite) = match side {
            PinSide::Lower => (bar.lower_shadow(), bar.upper_shadow()),
            PinSide::Upper => (bar.upper_shadow(), bar.lower_shadow()),
        };

        if body_ratio > self.small_body_ratio {
            return None;
        }
        if dominant < body * self.shadow_factor {
            return None;
        }
        if opposite >= body * self.tolerance.factor() {
            return None;
        }

        let body_in_outer_third = match side {
            PinSide::Lower => bar.body_bottom() >= bar.low() + range * 2.0 / 3.0,
            PinSide::Upper => bar.body_top() <= bar.low() + range / 3.0,
        };

        Some(PinBarQuality {
            extended_shadow: dominant >= body * EXTENDED_SHADOW_FACTOR,
            body_in_outer_third,
        })
    }
}

// ============================================================
// WINDOW HELPERS
// ============================================================

/// The trailing `span` candles, oldest first, if the window is long enough
/// and none of them is flat.
#[inline]
pub fn tail<T: OHLCV>(window: &[T], span: usize) -> Option<&[T]> {
    let start = window.len().checked_sub(span)?;
    let tail = &window[start..];
    tail.iter()
        .all(|b| b.range() > f64::EPSILON)
        .then_some(tail)
}

/// Fixed text attached to a match
#[derive(Debug, Clone, Copy)]
pub struct PatternText {
    pub description: &'static str,
    pub trading_implication: &'static str,
}

impl PatternText {
    /// Registry metadata for the rule that attaches this text
    pub fn metadata(self, name: PatternId, span: usize) -> PatternMetadata {
        PatternMetadata {
            name: name.as_str(),
            description: self.description,
            trading_implication: self.trading_implication,
            category: PatternCategory::from_span(span),
        }
    }
}

/// Build a match covering the trailing `span` candles of `window`.
pub fn build_match<T: OHLCV>(
    window: &[T],
    span: usize,
    name: PatternId,
    pattern_class: PatternClass,
    confidence: u8,
    text: PatternText,
) -> DetectedPattern {
    let end_index = window.len().saturating_sub(1);
    let start_index = window.len().saturating_sub(span);
    DetectedPattern {
        name,
        pattern_class,
        confidence: confidence.min(100),
        involved_candles: window[start_index..].iter().map(Candle::from_ohlcv).collect(),
        description: text.description,
        trading_implication: text.trading_implication,
        start_index,
        end_index,
    }
}
