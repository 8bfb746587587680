//! Two-candle pattern rules
//!
//! Patterns: Bullish/Bearish Engulfing, Piercing Line, Dark Cloud Cover,
//! Bullish/Bearish Harami.
//!
//! The trend context excludes both candles of the pair.

use std::collections::HashMap;

use super::helpers::{
    self, build_match, weighted_confidence, PatternText, ENGULFING_WEIGHTS, HARAMI_WEIGHTS,
    PENETRATION_WEIGHTS,
};
use crate::{
    params::{check_factor, get_factor, ParamMeta, ParameterizedDetector},
    trend::{ScanContext, TrendLabel},
    DetectedPattern, OHLCVExt, PatternClass, PatternDetector, PatternId, PatternMetadata, Result,
    OHLCV,
};

impl_with_defaults!(
    BullishEngulfingDetector,
    BearishEngulfingDetector,
    PiercingLineDetector,
    DarkCloudCoverDetector,
    BullishHaramiDetector,
    BearishHaramiDetector,
);

/// Direction of a mirrored rule pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Bullish,
    Bearish,
}

impl Side {
    fn required_trend(self) -> TrendLabel {
        match self {
            Side::Bullish => TrendLabel::Downtrend,
            Side::Bearish => TrendLabel::Uptrend,
        }
    }

    fn reversal(self) -> PatternClass {
        match self {
            Side::Bullish => PatternClass::BullishReversal,
            Side::Bearish => PatternClass::BearishReversal,
        }
    }

    /// `(first, second)` have the colours this side expects
    fn colours<T: OHLCV>(self, first: &T, second: &T) -> bool {
        match self {
            Side::Bullish => first.is_bearish() && second.is_bullish(),
            Side::Bearish => first.is_bullish() && second.is_bearish(),
        }
    }
}

// ============================================================
// ENGULFING PATTERNS
// ============================================================

const BULLISH_ENGULFING_TEXT: PatternText = PatternText {
    description: "A bullish body fully engulfs the previous bearish body after a decline.",
    trading_implication: "Buyers took control. Potential bullish reversal.",
};

const BEARISH_ENGULFING_TEXT: PatternText = PatternText {
    description: "A bearish body fully engulfs the previous bullish body after an advance.",
    trading_implication: "Sellers took control. Potential bearish reversal.",
};

fn detect_engulfing<T: OHLCV>(
    window: &[T],
    ctx: &ScanContext,
    side: Side,
    dominant_factor: f64,
    id: PatternId,
    text: PatternText,
) -> Option<DetectedPattern> {
    let pair = helpers::tail(window, 2)?;
    let (first, second) = (&pair[0], &pair[1]);

    if !side.colours(first, second) {
        return None;
    }
    let contains = second.body_top() >= first.body_top()
        && second.body_bottom() <= first.body_bottom()
        && second.body() > first.body();
    if !contains {
        return None;
    }
    if ctx.trend_before(2) != side.required_trend() {
        return None;
    }

    let confidence = weighted_confidence(
        &ENGULFING_WEIGHTS,
        &[
            true,
            true,
            true,
            second.body() >= first.body() * dominant_factor,
            second.volume() > first.volume(),
        ],
    );
    Some(build_match(window, 2, id, side.reversal(), confidence, text))
}

/// Bullish Engulfing - bullish body contains the prior bearish body, after a decline
#[derive(Debug, Clone, Copy)]
pub struct BullishEngulfingDetector {
    /// Second body at least this multiple of the first earns the size bonus
    pub dominant_factor: f64,
}

impl Default for BullishEngulfingDetector {
    fn default() -> Self {
        Self {
            dominant_factor: helpers::DOMINANT_BODY_FACTOR,
        }
    }
}

impl PatternDetector for BullishEngulfingDetector {
    fn id(&self) -> PatternId {
        PatternId("Bullish Engulfing")
    }

    fn span(&self) -> usize {
        2
    }

    fn metadata(&self) -> PatternMetadata {
        BULLISH_ENGULFING_TEXT.metadata(PatternDetector::id(self), 2)
    }

    fn detect<T: OHLCV>(&self, window: &[T], ctx: &ScanContext) -> Option<DetectedPattern> {
        detect_engulfing(
            window,
            ctx,
            Side::Bullish,
            self.dominant_factor,
            PatternDetector::id(self),
            BULLISH_ENGULFING_TEXT,
        )
    }

    fn validate_config(&self) -> Result<()> {
        check_factor(self.dominant_factor).map(|_| ())
    }
}

/// Bearish Engulfing - bearish body contains the prior bullish body, after an advance
#[derive(Debug, Clone, Copy)]
pub struct BearishEngulfingDetector {
    pub dominant_factor: f64,
}

impl Default for BearishEngulfingDetector {
    fn default() -> Self {
        Self {
            dominant_factor: helpers::DOMINANT_BODY_FACTOR,
        }
    }
}

impl PatternDetector for BearishEngulfingDetector {
    fn id(&self) -> PatternId {
        PatternId("Bearish Engulfing")
    }

    fn span(&self) -> usize {
        2
    }

    fn metadata(&self) -> PatternMetadata {
        BEARISH_ENGULFING_TEXT.metadata(PatternDetector::id(self), 2)
    }

    fn detect<T: OHLCV>(&self, window: &[T], ctx: &ScanContext) -> Option<DetectedPattern> {
        detect_engulfing(
            window,
            ctx,
            Side::Bearish,
            self.dominant_factor,
            PatternDetector::id(self),
            BEARISH_ENGULFING_TEXT,
        )
    }

    fn validate_config(&self) -> Result<()> {
        check_factor(self.dominant_factor).map(|_| ())
    }
}

static ENGULFING_PARAMS: &[ParamMeta] = &[ParamMeta::factor(
    "dominant_factor",
    helpers::DOMINANT_BODY_FACTOR,
    (1.0, 2.5, 0.5),
    "Second body as a multiple of the first needed for the size bonus",
)];

impl ParameterizedDetector for BullishEngulfingDetector {
    fn param_meta() -> &'static [ParamMeta] {
        ENGULFING_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            dominant_factor: get_factor(params, "dominant_factor", helpers::DOMINANT_BODY_FACTOR)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        "Bullish Engulfing"
    }
}

impl ParameterizedDetector for BearishEngulfingDetector {
    fn param_meta() -> &'static [ParamMeta] {
        ENGULFING_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            dominant_factor: get_factor(params, "dominant_factor", helpers::DOMINANT_BODY_FACTOR)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        "Bearish Engulfing"
    }
}

// ============================================================
// PENETRATION PATTERNS
// ============================================================

const PIERCING_TEXT: PatternText = PatternText {
    description: "After a bearish candle, a bullish candle opens below its low and closes above its midpoint.",
    trading_implication: "Buyers absorbed the gap down. Potential bullish reversal.",
};

const DARK_CLOUD_TEXT: PatternText = PatternText {
    description: "After a bullish candle, a bearish candle opens above its high and closes below its midpoint.",
    trading_implication: "Sellers absorbed the gap up. Potential bearish reversal.",
};

fn detect_penetration<T: OHLCV>(
    window: &[T],
    ctx: &ScanContext,
    side: Side,
    id: PatternId,
    text: PatternText,
) -> Option<DetectedPattern> {
    let pair = helpers::tail(window, 2)?;
    let (first, second) = (&pair[0], &pair[1]);
    let midpoint = first.body_midpoint();

    let (first_colour, gap, past_midpoint, penetration) = match side {
        Side::Bullish => (
            first.is_bearish(),
            second.open() < first.low(),
            second.close() > midpoint,
            second.close() - first.close(),
        ),
        Side::Bearish => (
            first.is_bullish(),
            second.open() > first.high(),
            second.close() < midpoint,
            first.close() - second.close(),
        ),
    };
    if !(first_colour && gap && past_midpoint) {
        return None;
    }
    if ctx.trend_before(2) != side.required_trend() {
        return None;
    }

    let confidence = weighted_confidence(
        &PENETRATION_WEIGHTS,
        &[
            true,
            true,
            true,
            true,
            penetration >= first.body() * helpers::DEEP_PENETRATION_RATIO,
            first.body_ratio()? >= helpers::LARGE_BODY_RATIO,
        ],
    );
    Some(build_match(window, 2, id, side.reversal(), confidence, text))
}

/// Piercing Line - gap below a bearish candle's low, close above its midpoint
#[derive(Debug, Clone, Copy, Default)]
pub struct PiercingLineDetector;

impl PatternDetector for PiercingLineDetector {
    fn id(&self) -> PatternId {
        PatternId("Piercing Line")
    }

    fn span(&self) -> usize {
        2
    }

    fn metadata(&self) -> PatternMetadata {
        PIERCING_TEXT.metadata(PatternDetector::id(self), 2)
    }

    fn detect<T: OHLCV>(&self, window: &[T], ctx: &ScanContext) -> Option<DetectedPattern> {
        detect_penetration(
            window,
            ctx,
            Side::Bullish,
            PatternDetector::id(self),
            PIERCING_TEXT,
        )
    }
}

/// Dark Cloud Cover - gap above a bullish candle's high, close below its midpoint
#[derive(Debug, Clone, Copy, Default)]
pub struct DarkCloudCoverDetector;

impl PatternDetector for DarkCloudCoverDetector {
    fn id(&self) -> PatternId {
        PatternId("Dark Cloud Cover")
    }

    fn span(&self) -> usize {
        2
    }

    fn metadata(&self) -> PatternMetadata {
        DARK_CLOUD_TEXT.metadata(PatternDetector::id(self), 2)
    }

    fn detect<T: OHLCV>(&self, window: &[T], ctx: &ScanContext) -> Option<DetectedPattern> {
        detect_penetration(
            window,
            ctx,
            Side::Bearish,
            PatternDetector::id(self),
            DARK_CLOUD_TEXT,
        )
    }
}

// ============================================================
// HARAMI PATTERNS
// ============================================================

const BULLISH_HARAMI_TEXT: PatternText = PatternText {
    description: "A small bullish body sits inside the previous bearish body after a decline.",
    trading_implication: "Selling pressure is fading. Watch for a bullish follow-through.",
};

const BEARISH_HARAMI_TEXT: PatternText = PatternText {
    description: "A small bearish body sits inside the previous bullish body after an advance.",
    trading_implication: "Buying pressure is fading. Watch for a bearish follow-through.",
};

fn detect_harami<T: OHLCV>(
    window: &[T],
    ctx: &ScanContext,
    side: Side,
    id: PatternId,
    text: PatternText,
) -> Option<DetectedPattern> {
    let pair = helpers::tail(window, 2)?;
    let (first, second) = (&pair[0], &pair[1]);

    if !side.colours(first, second) {
        return None;
    }
    let inside = second.body_top() <= first.body_top()
        && second.body_bottom() >= first.body_bottom()
        && second.body() < first.body();
    if !inside {
        return None;
    }
    if ctx.trend_before(2) != side.required_trend() {
        return None;
    }

    let confidence = weighted_confidence(
        &HARAMI_WEIGHTS,
        &[
            true,
            true,
            true,
            second.body() <= first.body() * helpers::SMALL_HARAMI_RATIO,
            first.body_ratio()? >= helpers::LARGE_BODY_RATIO,
        ],
    );
    Some(build_match(window, 2, id, side.reversal(), confidence, text))
}

/// Bullish Harami - small bullish body inside a prior bearish body, after a decline
#[derive(Debug, Clone, Copy, Default)]
pub struct BullishHaramiDetector;

impl PatternDetector for BullishHaramiDetector {
    fn id(&self) -> PatternId {
        PatternId("Bullish Harami")
    }

    fn span(&self) -> usize {
        2
    }

    fn metadata(&self) -> PatternMetadata {
        BULLISH_HARAMI_TEXT.metadata(PatternDetector::id(self), 2)
    }

    fn detect<T: OHLCV>(&self, window: &[T], ctx: &ScanContext) -> Option<DetectedPattern> {
        detect_harami(
            window,
            ctx,
            Side::Bullish,
            PatternDetector::id(self),
            BULLISH_HARAMI_TEXT,
        )
    }
}

/// Bearish Harami - small bearish body inside a prior bullish body, after an advance
#[derive(Debug, Clone, Copy, Default)]
pub struct BearishHaramiDetector;

impl PatternDetector for BearishHaramiDetector {
    fn id(&self) -> PatternId {
        PatternId("Bearish Harami")
    }

    fn span(&self) -> usize {
        2
    }

    fn metadata(&self) -> PatternMetadata {
        BEARISH_HARAMI_TEXT.metadata(PatternDetector::id(self), 2)
    }

    fn detect<T: OHLCV>(&self, window: &[T], ctx: &ScanContext) -> Option<DetectedPattern> {
        detect_harami(
            window,
            ctx,
            Side::Bearish,
            PatternDetector::id(self),
            BEARISH_HARAMI_TEXT,
        )
    }
}
