//! Three-candle pattern rules
//!
//! Patterns: Morning Star, Evening Star, Three White Soldiers, Three Black Crows.

use std::collections::HashMap;

use super::helpers::{self, build_match, weighted_confidence, PatternText, THREE_LINE_WEIGHTS};
use crate::{
    params::{get_ratio, ParamMeta, ParameterizedDetector},
    trend::{ScanContext, TrendLabel},
    DetectedPattern, OHLCVExt, PatternClass, PatternDetector, PatternId, PatternMetadata, Ratio,
    Result, OHLCV,
};

impl_with_defaults!(
    MorningStarDetector,
    EveningStarDetector,
    ThreeWhiteSoldiersDetector,
    ThreeBlackCrowsDetector,
);

// ============================================================
// STAR PATTERNS
// ============================================================

const MORNING_STAR_TEXT: PatternText = PatternText {
    description: "Large bearish candle, small-bodied star, then a large bullish candle closing above the first candle's midpoint.",
    trading_implication: "Strong bullish reversal signal after a decline.",
};

const EVENING_STAR_TEXT: PatternText = PatternText {
    description: "Large bullish candle, small-bodied star, then a large bearish candle closing below the first candle's midpoint.",
    trading_implication: "Strong bearish reversal signal after an advance.",
};

/// Star geometry shared by Morning and Evening Star
#[derive(Debug, Clone, Copy)]
struct StarShape {
    large_body_ratio: f64,
    star_body_ratio: f64,
}

impl StarShape {
    /// `bullish` selects the Morning Star orientation
    fn matches<T: OHLCV>(&self, first: &T, star: &T, third: &T, bullish: bool) -> Option<bool> {
        let large = |bar: &T| -> Option<bool> { Some(bar.body_ratio()? >= self.large_body_ratio) };

        let colours = if bullish {
            first.is_bearish() && third.is_bullish()
        } else {
            first.is_bullish() && third.is_bearish()
        };
        let closes_past_midpoint = if bullish {
            third.close() > first.body_midpoint()
        } else {
            third.close() < first.body_midpoint()
        };

        Some(
            colours
                && large(first)?
                && star.body() <= first.range() * self.star_body_ratio
                && large(third)?
                && closes_past_midpoint,
        )
    }
}

fn detect_star<T: OHLCV>(
    window: &[T],
    ctx: &ScanContext,
    shape: StarShape,
    bullish: bool,
    id: PatternId,
    text: PatternText,
) -> Option<DetectedPattern> {
    let bars = helpers::tail(window, 3)?;
    if !shape.matches(&bars[0], &bars[1], &bars[2], bullish)? {
        return None;
    }

    let (required, class) = if bullish {
        (TrendLabel::Downtrend, PatternClass::BullishReversal)
    } else {
        (TrendLabel::Uptrend, PatternClass::BearishReversal)
    };
    if ctx.trend_before(3) != required {
        return None;
    }

    Some(build_match(
        window,
        3,
        id,
        class,
        helpers::STAR_CONFIDENCE,
        text,
    ))
}

/// Morning Star - bullish three-candle reversal after a decline
#[derive(Debug, Clone, Copy)]
pub struct MorningStarDetector {
    /// First and third bodies at least this fraction of their range
    pub large_body_ratio: Ratio,
    /// Star body at most this fraction of the first candle's range
    pub star_body_ratio: Ratio,
}

impl Default for MorningStarDetector {
    fn default() -> Self {
        Self {
            large_body_ratio: Ratio::new_const(helpers::LARGE_BODY_RATIO),
            star_body_ratio: Ratio::new_const(helpers::STAR_BODY_RATIO),
        }
    }
}

impl MorningStarDetector {
    fn shape(&self) -> StarShape {
        StarShape {
            large_body_ratio: self.large_body_ratio.get(),
            star_body_ratio: self.star_body_ratio.get(),
        }
    }
}

impl PatternDetector for MorningStarDetector {
    fn id(&self) -> PatternId {
        PatternId("Morning Star")
    }

    fn span(&self) -> usize {
        3
    }

    fn metadata(&self) -> PatternMetadata {
        MORNING_STAR_TEXT.metadata(PatternDetector::id(self), 3)
    }

    fn detect<T: OHLCV>(&self, window: &[T], ctx: &ScanContext) -> Option<DetectedPattern> {
        detect_star(
            window,
            ctx,
            self.shape(),
            true,
            PatternDetector::id(self),
            MORNING_STAR_TEXT,
        )
    }
}

/// Evening Star - bearish three-candle reversal after an advance
#[derive(Debug, Clone, Copy)]
pub struct EveningStarDetector {
    pub large_body_ratio: Ratio,
    pub star_body_ratio: Ratio,
}

impl Default for EveningStarDetector {
    fn default() -> Self {
        Self {
            large_body_ratio: Ratio::new_const(helpers::LARGE_BODY_RATIO),
            star_body_ratio: Ratio::new_const(helpers::STAR_BODY_RATIO),
        }
    }
}

impl EveningStarDetector {
    fn shape(&self) -> StarShape {
        StarShape {
            large_body_ratio: self.large_body_ratio.get(),
            star_body_ratio: self.star_body_ratio.get(),
        }
    }
}

impl PatternDetector for EveningStarDetector {
    fn id(&self) -> PatternId {
        PatternId("Evening Star")
    }

    fn span(&self) -> usize {
        3
    }

    fn metadata(&self) -> PatternMetadata {
        EVENING_STAR_TEXT.metadata(PatternDetector::id(self), 3)
    }

    fn detect<T: OHLCV>(&self, window: &[T], ctx: &ScanContext) -> Option<DetectedPattern> {
        detect_star(
            window,
            ctx,
            self.shape(),
            false,
            PatternDetector::id(self),
            EVENING_STAR_TEXT,
        )
    }
}

static STAR_PARAMS: &[ParamMeta] = &[
    ParamMeta::ratio(
        "large_body_ratio",
        helpers::LARGE_BODY_RATIO,
        (0.4, 0.7, 0.1),
        "Minimum body of the outer candles as a fraction of their range",
    ),
    ParamMeta::ratio(
        "star_body_ratio",
        helpers::STAR_BODY_RATIO,
        (0.1, 0.4, 0.1),
        "Maximum star body as a fraction of the first candle's range",
    ),
];

impl ParameterizedDetector for MorningStarDetector {
    fn param_meta() -> &'static [ParamMeta] {
        STAR_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            large_body_ratio: get_ratio(params, "large_body_ratio", helpers::LARGE_BODY_RATIO)?,
            star_body_ratio: get_ratio(params, "star_body_ratio", helpers::STAR_BODY_RATIO)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        "Morning Star"
    }
}

impl ParameterizedDetector for EveningStarDetector {
    fn param_meta() -> &'static [ParamMeta] {
        STAR_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            large_body_ratio: get_ratio(params, "large_body_ratio", helpers::LARGE_BODY_RATIO)?,
            star_body_ratio: get_ratio(params, "star_body_ratio", helpers::STAR_BODY_RATIO)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        "Evening Star"
    }
}

// ============================================================
// THREE WHITE SOLDIERS / THREE BLACK CROWS
// ============================================================

const SOLDIERS_TEXT: PatternText = PatternText {
    description: "Three consecutive bullish candles, each opening inside the previous body and closing higher.",
    trading_implication: "Steady buying pressure. The advance is likely to continue.",
};

const CROWS_TEXT: PatternText = PatternText {
    description: "Three consecutive bearish candles, each opening inside the previous body and closing lower.",
    trading_implication: "Steady selling pressure. The decline is likely to continue.",
};

fn opens_inside_body<T: OHLCV>(prev: &T, next: &T) -> bool {
    next.open() >= prev.body_bottom() && next.open() <= prev.body_top()
}

fn detect_three_line<T: OHLCV>(
    window: &[T],
    bullish: bool,
    id: PatternId,
    text: PatternText,
) -> Option<DetectedPattern> {
    let bars = helpers::tail(window, 3)?;

    let same_colour = bars
        .iter()
        .all(|b| if bullish { b.is_bullish() } else { b.is_bearish() });
    let opens_inside = bars.windows(2).all(|w| opens_inside_body(&w[0], &w[1]));
    let progressing = bars.windows(2).all(|w| {
        if bullish {
            w[1].close() > w[0].close()
        } else {
            w[1].close() < w[0].close()
        }
    });
    if !(same_colour && opens_inside && progressing) {
        return None;
    }

    let mut long_bodies = true;
    let mut short_closing_shadows = true;
    for bar in bars {
        long_bodies &= bar.body_ratio()? >= helpers::LARGE_BODY_RATIO;
        let closing_shadow = if bullish {
            bar.upper_shadow_ratio()?
        } else {
            bar.lower_shadow_ratio()?
        };
        short_closing_shadows &= closing_shadow <= helpers::DOJI_RATIO;
    }

    let class = if bullish {
        PatternClass::BullishContinuation
    } else {
        PatternClass::BearishContinuation
    };
    let confidence = weighted_confidence(
        &THREE_LINE_WEIGHTS,
        &[true, true, true, long_bodies, short_closing_shadows],
    );
    Some(build_match(window, 3, id, class, confidence, text))
}

/// Three White Soldiers - three rising bullish candles
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreeWhiteSoldiersDetector;

impl PatternDetector for ThreeWhiteSoldiersDetector {
    fn id(&self) -> PatternId {
        PatternId("Three White Soldiers")
    }

    fn span(&self) -> usize {
        3
    }

    fn metadata(&self) -> PatternMetadata {
        SOLDIERS_TEXT.metadata(PatternDetector::id(self), 3)
    }

    fn detect<T: OHLCV>(&self, window: &[T], _ctx: &ScanContext) -> Option<DetectedPattern> {
        detect_three_line(window, true, PatternDetector::id(self), SOLDIERS_TEXT)
    }
}

/// Three Black Crows - three falling bearish candles
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreeBlackCrowsDetector;

impl PatternDetector for ThreeBlackCrowsDetector {
    fn id(&self) -> PatternId {
        PatternId("Three Black Crows")
    }

    fn span(&self) -> usize {
        3
    }

    fn metadata(&self) -> PatternMetadata {
        CROWS_TEXT.metadata(PatternDetector::id(self), 3)
    }

    fn detect<T: OHLCV>(&self, window: &[T], _ctx: &ScanContext) -> Option<DetectedPattern> {
        detect_three_line(window, false, PatternDetector::id(self), CROWS_TEXT)
    }
}
