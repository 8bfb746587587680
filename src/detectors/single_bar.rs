//! Single-candle pattern rules
//!
//! Patterns: Doji, Dragonfly Doji, Gravestone Doji, Spinning Top, Hammer,
//! Hanging Man, Inverted Hammer, Shooting Star.
//!
//! Each rule looks at the last candle of the window; the trend context is the
//! classification of every candle before it.

use std::collections::HashMap;

use super::helpers::{
    self, build_match, weighted_confidence, PatternText, PinBarShape, PinSide, ShadowTolerance,
    PIN_BAR_WEIGHTS,
};
use crate::{
    params::{check_factor, get_factor, get_ratio, ParamMeta, ParameterizedDetector},
    trend::{ScanContext, TrendLabel},
    AnalysisError, DetectedPattern, OHLCVExt, PatternClass, PatternDetector, PatternId,
    PatternMetadata, Ratio, Result, OHLCV,
};

impl_with_defaults!(
    DojiDetector,
    DragonflyDojiDetector,
    GravestoneDojiDetector,
    SpinningTopDetector,
    HammerDetector,
    HangingManDetector,
    InvertedHammerDetector,
    ShootingStarDetector,
);

// ============================================================
// DOJI FAMILY
// ============================================================

const DOJI_TEXT: PatternText = PatternText {
    description: "Open and close are nearly equal; buyers and sellers are in balance.",
    trading_implication: "Indecision. Wait for the next candle to confirm direction.",
};

const DRAGONFLY_TEXT: PatternText = PatternText {
    description: "Open, high and close sit at the top of the range with a long lower shadow after a decline.",
    trading_implication: "Sellers were rejected. Potential bullish reversal.",
};

const GRAVESTONE_TEXT: PatternText = PatternText {
    description: "Open, low and close sit at the bottom of the range with a long upper shadow after an advance.",
    trading_implication: "Buyers were rejected. Potential bearish reversal.",
};

const SPINNING_TOP_TEXT: PatternText = PatternText {
    description: "Small body with both shadows longer than the body.",
    trading_implication: "Indecision. The prevailing move is losing momentum.",
};

/// Doji - body < 10% of range
#[derive(Debug, Clone, Copy)]
pub struct DojiDetector {
    pub max_body_ratio: Ratio,
}

impl Default for DojiDetector {
    fn default() -> Self {
        Self {
            max_body_ratio: Ratio::new_const(helpers::DOJI_RATIO),
        }
    }
}

impl PatternDetector for DojiDetector {
    fn id(&self) -> PatternId {
        PatternId("Doji")
    }

    fn span(&self) -> usize {
        1
    }

    fn detect<T: OHLCV>(&self, window: &[T], _ctx: &ScanContext) -> Option<DetectedPattern> {
        let bar = helpers::tail(window, 1)?.first()?;
        if bar.body_ratio()? >= self.max_body_ratio.get() {
            return None;
        }

        Some(build_match(
            window,
            1,
            PatternDetector::id(self),
            PatternClass::Indecision,
            helpers::DOJI_CONFIDENCE,
            DOJI_TEXT,
        ))
    }

    fn metadata(&self) -> PatternMetadata {
        DOJI_TEXT.metadata(PatternDetector::id(self), 1)
    }
}

/// Dragonfly Doji - tight doji, long lower shadow, no upper shadow, after a decline
#[derive(Debug, Clone, Copy)]
pub struct DragonflyDojiDetector {
    pub max_body_ratio: Ratio,
    pub min_shadow_ratio: Ratio,
}

impl Default for DragonflyDojiDetector {
    fn default() -> Self {
        Self {
            max_body_ratio: Ratio::new_const(helpers::TIGHT_DOJI_RATIO),
            min_shadow_ratio: Ratio::new_const(helpers::LONG_LEG_RATIO),
        }
    }
}

impl PatternDetector for DragonflyDojiDetector {
    fn id(&self) -> PatternId {
        PatternId("Dragonfly Doji")
    }

    fn span(&self) -> usize {
        1
    }

    fn metadata(&self) -> PatternMetadata {
        DRAGONFLY_TEXT.metadata(PatternDetector::id(self), 1)
    }

    fn detect<T: OHLCV>(&self, window: &[T], ctx: &ScanContext) -> Option<DetectedPattern> {
        let bar = helpers::tail(window, 1)?.first()?;

        if bar.body_ratio()? >= self.max_body_ratio.get() {
            return None;
        }
        if bar.lower_shadow_ratio()? <= self.min_shadow_ratio.get() {
            return None;
        }
        if bar.upper_shadow_ratio()? > helpers::NO_SHADOW_RATIO {
            return None;
        }
        if ctx.trend_before(1) != TrendLabel::Downtrend {
            return None;
        }

        Some(build_match(
            window,
            1,
            PatternDetector::id(self),
            PatternClass::BullishReversal,
            helpers::DRAGONFLY_CONFIDENCE,
            DRAGONFLY_TEXT,
        ))
    }
}

/// Gravestone Doji - tight doji, long upper shadow, no lower shadow, after an advance
#[derive(Debug, Clone, Copy)]
pub struct GravestoneDojiDetector {
    pub max_body_ratio: Ratio,
    pub min_shadow_ratio: Ratio,
}

impl Default for GravestoneDojiDetector {
    fn default() -> Self {
        Self {
            max_body_ratio: Ratio::new_const(helpers::TIGHT_DOJI_RATIO),
            min_shadow_ratio: Ratio::new_const(helpers::LONG_LEG_RATIO),
        }
    }
}

impl PatternDetector for GravestoneDojiDetector {
    fn id(&self) -> PatternId {
        PatternId("Gravestone Doji")
    }

    fn span(&self) -> usize {
        1
    }

    fn metadata(&self) -> PatternMetadata {
        GRAVESTONE_TEXT.metadata(PatternDetector::id(self), 1)
    }

    fn detect<T: OHLCV>(&self, window: &[T], ctx: &ScanContext) -> Option<DetectedPattern> {
        let bar = helpers::tail(window, 1)?.first()?;

        if bar.body_ratio()? >= self.max_body_ratio.get() {
            return None;
        }
        if bar.upper_shadow_ratio()? <= self.min_shadow_ratio.get() {
            return None;
        }
        if bar.lower_shadow_ratio()? > helpers::NO_SHADOW_RATIO {
            return None;
        }
        if ctx.trend_before(1) != TrendLabel::Uptrend {
            return None;
        }

        Some(build_match(
            window,
            1,
            PatternDetector::id(self),
            PatternClass::BearishReversal,
            helpers::DRAGONFLY_CONFIDENCE,
            GRAVESTONE_TEXT,
        ))
    }
}

/// Spinning Top - body 10-30% of range, both shadows longer than the body
#[derive(Debug, Clone, Copy, Default)]
pub struct SpinningTopDetector;

impl PatternDetector for SpinningTopDetector {
    fn id(&self) -> PatternId {
        PatternId("Spinning Top")
    }

    fn span(&self) -> usize {
        1
    }

    fn metadata(&self) -> PatternMetadata {
        SPINNING_TOP_TEXT.metadata(PatternDetector::id(self), 1)
    }

    fn detect<T: OHLCV>(&self, window: &[T], _ctx: &ScanContext) -> Option<DetectedPattern> {
        let bar = helpers::tail(window, 1)?.first()?;
        let ratio = bar.body_ratio()?;
        let body = bar.body();

        if !(helpers::DOJI_RATIO..=helpers::SPINNING_TOP_MAX_RATIO).contains(&ratio) {
            return None;
        }
        if bar.upper_shadow() <= body || bar.lower_shadow() <= body {
            return None;
        }

        Some(build_match(
            window,
            1,
            PatternDetector::id(self),
            PatternClass::Indecision,
            helpers::SPINNING_TOP_CONFIDENCE,
            SPINNING_TOP_TEXT,
        ))
    }
}

// ============================================================
// HAMMER FAMILY
// ============================================================

const HAMMER_TEXT: PatternText = PatternText {
    description: "Small body near the high with a long lower shadow after a decline.",
    trading_implication: "Potential bullish reversal. Confirm with a higher close.",
};

const HANGING_MAN_TEXT: PatternText = PatternText {
    description: "Hammer-shaped candle after an advance.",
    trading_implication: "Potential bearish reversal. Buyers may be losing control.",
};

const INVERTED_HAMMER_TEXT: PatternText = PatternText {
    description: "Small body near the low with a long upper shadow after a decline.",
    trading_implication: "Potential bullish reversal if the next candle closes higher.",
};

const SHOOTING_STAR_TEXT: PatternText = PatternText {
    description: "Small body near the low with a long upper shadow after an advance.",
    trading_implication: "Potential bearish reversal. The rally was rejected.",
};

/// Shared body of the four pin-bar rules.
#[allow(clippy::too_many_arguments)]
fn detect_pin_bar<T: OHLCV>(
    window: &[T],
    ctx: &ScanContext,
    shape: PinBarShape,
    side: PinSide,
    required_trend: TrendLabel,
    id: PatternId,
    class: PatternClass,
    text: PatternText,
) -> Option<DetectedPattern> {
    let bar = helpers::tail(window, 1)?.first()?;
    let quality = shape.matches(bar, side)?;
    if ctx.trend_before(1) != required_trend {
        return None;
    }

    let confidence = weighted_confidence(
        &PIN_BAR_WEIGHTS,
        &[
            true,
            true,
            true,
            true,
            quality.extended_shadow,
            quality.body_in_outer_third,
        ],
    );
    Some(build_match(window, 1, id, class, confidence, text))
}

fn validate_pin_bar(shadow_factor: f64) -> Result<()> {
    check_factor(shadow_factor)
        .map(|_| ())
        .map_err(|_| {
            AnalysisError::InvalidConfig(format!(
                "shadow_factor must be a positive number, got {shadow_factor}"
            ))
        })
}

macro_rules! pin_bar_detector {
    (
        $(#[$doc:meta])*
        $name:ident, $id:literal, $side:expr, $trend:expr, $class:expr, $text:expr
    ) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name {
            /// Body must be at most this fraction of the range
            pub small_body_ratio: Ratio,
            /// Dominant shadow must be at least this multiple of the body
            pub shadow_factor: f64,
            pub tolerance: ShadowTolerance,
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    small_body_ratio: Ratio::new_const(helpers::SMALL_BODY_RATIO),
                    shadow_factor: helpers::SHADOW_BODY_FACTOR,
                    tolerance: ShadowTolerance::Strict,
                }
            }
        }

        impl $name {
            pub fn shape(&self) -> PinBarShape {
                PinBarShape {
                    small_body_ratio: self.small_body_ratio.get(),
                    shadow_factor: self.shadow_factor,
                    tolerance: self.tolerance,
                }
            }
        }

        impl PatternDetector for $name {
            fn id(&self) -> PatternId {
                PatternId($id)
            }

            fn span(&self) -> usize {
                1
            }

            fn detect<T: OHLCV>(
                &self,
                window: &[T],
                ctx: &ScanContext,
            ) -> Option<DetectedPattern> {
                detect_pin_bar(
                    window,
                    ctx,
                    self.shape(),
                    $side,
                    $trend,
                    PatternDetector::id(self),
                    $class,
                    $text,
                )
            }

            fn validate_config(&self) -> Result<()> {
                validate_pin_bar(self.shadow_factor)
            }

            fn metadata(&self) -> PatternMetadata {
                $text.metadata(PatternDetector::id(self), 1)
            }
        }

        impl ParameterizedDetector for $name {
            fn param_meta() -> &'static [ParamMeta] {
                PIN_BAR_PARAMS
            }

            fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
                let detector = Self {
                    small_body_ratio: get_ratio(
                        params,
                        "small_body_ratio",
                        helpers::SMALL_BODY_RATIO,
                    )?,
                    shadow_factor: get_factor(
                        params,
                        "shadow_factor",
                        helpers::SHADOW_BODY_FACTOR,
                    )?,
                    tolerance: ShadowTolerance::from_factor(
                        params
                            .get("tolerance")
                            .copied()
                            .unwrap_or(ShadowTolerance::Strict.factor()),
                    ),
                };
                PatternDetector::validate_config(&detector)?;
                Ok(detector)
            }

            fn pattern_id_str() -> &'static str {
                $id
            }
        }
    };
}

pin_bar_detector!(
    /// Hammer - small body at the top, lower shadow >= 2x body, after a decline
    HammerDetector,
    "Hammer",
    PinSide::Lower,
    TrendLabel::Downtrend,
    PatternClass::BullishReversal,
    HAMMER_TEXT
);

pin_bar_detector!(
    /// Hanging Man - hammer geometry after an advance
    HangingManDetector,
    "Hanging Man",
    PinSide::Lower,
    TrendLabel::Uptrend,
    PatternClass::BearishReversal,
    HANGING_MAN_TEXT
);

pin_bar_detector!(
    /// Inverted Hammer - shooting-star geometry after a decline
    InvertedHammerDetector,
    "Inverted Hammer",
    PinSide::Upper,
    TrendLabel::Downtrend,
    PatternClass::BullishReversal,
    INVERTED_HAMMER_TEXT
);

pin_bar_detector!(
    /// Shooting Star - small body at the bottom, upper shadow >= 2x body, after an advance
    ShootingStarDetector,
    "Shooting Star",
    PinSide::Upper,
    TrendLabel::Uptrend,
    PatternClass::BearishReversal,
    SHOOTING_STAR_TEXT
);

// ============================================================
// PARAMETER METADATA
// ============================================================

static PIN_BAR_PARAMS: &[ParamMeta] = &[
    ParamMeta::ratio(
        "small_body_ratio",
        helpers::SMALL_BODY_RATIO,
        (0.1, 0.4, 0.05),
        "Maximum body as a fraction of the candle range",
    ),
    ParamMeta::factor(
        "shadow_factor",
        helpers::SHADOW_BODY_FACTOR,
        (1.5, 3.0, 0.5),
        "Minimum dominant shadow as a multiple of the body",
    ),
    ParamMeta::ratio(
        "tolerance",
        0.1,
        (0.1, 0.5, 0.2),
        "Maximum opposite shadow as a fraction of the body (0.1 / 0.3 / 0.5)",
    ),
];

static DOJI_PARAMS: &[ParamMeta] = &[ParamMeta::ratio(
    "max_body_ratio",
    helpers::DOJI_RATIO,
    (0.05, 0.15, 0.05),
    "Maximum body as a fraction of the candle range",
)];

impl ParameterizedDetector for DojiDetector {
    fn param_meta() -> &'static [ParamMeta] {
        DOJI_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            max_body_ratio: get_ratio(params, "max_body_ratio", helpers::DOJI_RATIO)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        "Doji"
    }
}
