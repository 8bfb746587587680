//! # candlecast
//!
//! Technical indicators, candlestick pattern detection and a heuristic
//! price-direction score over OHLCV series.
//!
//! ## Quick Start
//!
//! ```rust
//! use candlecast::prelude::*;
//!
//! let candles: Vec<Candle> = (0..30)
//!     .map(|i| {
//!         let base = 100.0 + i as f64;
//!         Candle::new(i, base, base + 1.5, base - 1.0, base + 1.0, 1_000)
//!     })
//!     .collect();
//!
//! // Indicators and trend
//! let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
//! let indicators = IndicatorSet::compute(&closes).unwrap();
//! let trend = classify(&closes);
//!
//! // Candlestick patterns on the trailing window
//! let engine = EngineBuilder::new().with_all_defaults().build().unwrap();
//! let patterns = engine.detect(&candles).unwrap();
//!
//! // Bullishness score and projections
//! let prediction = predict(&closes, &indicators, trend).unwrap();
//! assert!(prediction.bullishness_score >= 0.0 && prediction.bullishness_score <= 100.0);
//! # let _ = patterns;
//! ```

pub mod analysis;
pub mod cache;
pub mod detectors;
pub mod indicators;
pub mod params;
pub mod prediction;
pub mod stats;
pub mod trend;

pub mod prelude {
    pub use crate::{
        // Facade
        analysis::{analyze_parallel, Analysis, AnalysisFailure, Analyzer},
        // Cache
        cache::PredictionCache,
        // Detectors
        detectors::*,
        // Indicators
        indicators::{
            bollinger, ema, ema_series, macd, rsi, sma, BollingerBands, BollingerParams,
            IndicatorSet, MacdLine, MacdParams, Reading,
        },
        // Parameters
        params::{get_factor, get_ratio, ParamMeta, ParamType, ParameterizedDetector},
        // Prediction
        prediction::{
            predict, Action, ActionThresholds, PredictionResult, Predictor, PredictorConfig,
        },
        // Statistics
        stats::{price_change, PriceChange},
        // Trend
        trend::{
            classify, ContextProvider, DefaultContextProvider, ScanContext, TrendClassifier,
            TrendLabel,
        },
        // Iterator
        BarPatterns,
        // Engine
        BuiltinDetector,
        DefaultEngine,
        // Types
        Candle,
        DetectedPattern,
        // Core traits
        DynPatternDetector,
        EngineBuilder,
        OHLCVExt,
        // Errors
        AnalysisError,
        PatternCategory,
        PatternClass,
        PatternDetector,
        PatternEngine,
        PatternId,
        PatternIterator,
        PatternMetadata,
        Period,
        Ratio,
        Result,
        OHLCV,
    };
}

use trend::{ContextProvider, DefaultContextProvider, ScanContext};

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors surfaced to callers.
///
/// Numeric edge cases (flat candles, short history for a single indicator)
/// never reach this type; they resolve locally to documented fallbacks.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    #[error("Empty input series")]
    EmptyInput,

    #[error("Insufficient data: need {need} points, got {got}")]
    InsufficientData { need: usize, got: usize },

    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid candle at index {index}: {reason}")]
    InvalidCandle { index: usize, reason: &'static str },
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Normalized value in range 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Ratio(f64);

impl Ratio {
    /// Create a new Ratio, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(AnalysisError::InvalidValue(
                "Ratio cannot be NaN or infinite",
            ));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(AnalysisError::OutOfRange {
                field: "Ratio",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    /// Create a Ratio from a compile-time constant (library internal use)
    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl serde::Serialize for Ratio {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Ratio {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Ratio::new(value).map_err(serde::de::Error::custom)
    }
}

/// Look-back length (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(AnalysisError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl serde::Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLCV TRAITS
// ============================================================

/// Core OHLCV data trait
pub trait OHLCV {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> f64;

    fn timestamp(&self) -> Option<i64> {
        None
    }
}

/// Blanket impl for references to dyn OHLCV
impl OHLCV for &dyn OHLCV {
    fn open(&self) -> f64 {
        (*self).open()
    }

    fn high(&self) -> f64 {
        (*self).high()
    }

    fn low(&self) -> f64 {
        (*self).low()
    }

    fn close(&self) -> f64 {
        (*self).close()
    }

    fn volume(&self) -> f64 {
        (*self).volume()
    }

    fn timestamp(&self) -> Option<i64> {
        (*self).timestamp()
    }
}

/// Candle geometry derived from OHLCV
pub trait OHLCVExt: OHLCV {
    #[inline]
    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    #[inline]
    fn upper_shadow(&self) -> f64 {
        self.high() - self.open().max(self.close())
    }

    #[inline]
    fn lower_shadow(&self) -> f64 {
        self.open().min(self.close()) - self.low()
    }

    #[inline]
    fn body_top(&self) -> f64 {
        self.open().max(self.close())
    }

    #[inline]
    fn body_bottom(&self) -> f64 {
        self.open().min(self.close())
    }

    /// Midpoint of the real body
    #[inline]
    fn body_midpoint(&self) -> f64 {
        (self.open() + self.close()) / 2.0
    }

    #[inline]
    fn is_bullish(&self) -> bool {
        self.close() > self.open()
    }

    #[inline]
    fn is_bearish(&self) -> bool {
        self.close() < self.open()
    }

    /// Body as ratio of range. Returns None for a flat candle.
    #[inline]
    fn body_ratio(&self) -> Option<f64> {
        let range = self.range();
        (range > f64::EPSILON).then(|| self.body() / range)
    }

    #[inline]
    fn upper_shadow_ratio(&self) -> Option<f64> {
        let range = self.range();
        (range > f64::EPSILON).then(|| self.upper_shadow() / range)
    }

    #[inline]
    fn lower_shadow_ratio(&self) -> Option<f64> {
        let range = self.range();
        (range > f64::EPSILON).then(|| self.lower_shadow() / range)
    }

    /// Validate OHLCV data consistency
    fn validate(&self) -> Result<()> {
        let values = [self.open(), self.high(), self.low(), self.close()];
        if values.iter().any(|v| v.is_nan()) {
            return Err(AnalysisError::InvalidCandle {
                index: 0,
                reason: "NaN in OHLCV",
            });
        }
        if values.iter().any(|v| v.is_infinite()) {
            return Err(AnalysisError::InvalidCandle {
                index: 0,
                reason: "Infinite value in OHLCV",
            });
        }
        if values.iter().any(|v| *v < 0.0) || self.volume() < 0.0 {
            return Err(AnalysisError::InvalidCandle {
                index: 0,
                reason: "negative price or volume",
            });
        }
        if self.high() < self.low() {
            return Err(AnalysisError::InvalidCandle {
                index: 0,
                reason: "high < low",
            });
        }
        if self.high() < self.body_top() {
            return Err(AnalysisError::InvalidCandle {
                index: 0,
                reason: "high below body",
            });
        }
        if self.low() > self.body_bottom() {
            return Err(AnalysisError::InvalidCandle {
                index: 0,
                reason: "low above body",
            });
        }
        Ok(())
    }
}

impl<T: OHLCV> OHLCVExt for T {}

/// One immutable OHLCV observation.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Candle {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Snapshot any OHLCV source. Missing timestamps become `0`.
    pub fn from_ohlcv<T: OHLCV + ?Sized>(bar: &T) -> Self {
        Self {
            timestamp: bar.timestamp().unwrap_or_default(),
            open: bar.open(),
            high: bar.high(),
            low: bar.low(),
            close: bar.close(),
            volume: bar.volume().max(0.0).round() as u64,
        }
    }
}

impl OHLCV for Candle {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> f64 {
        self.volume as f64
    }

    fn timestamp(&self) -> Option<i64> {
        Some(self.timestamp)
    }
}

// ============================================================
// DETECTED PATTERN
// ============================================================

/// Name of a pattern in the fixed taxonomy, e.g. `"Morning Star"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatternId(pub &'static str);

impl PatternId {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for PatternId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl serde::Serialize for PatternId {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(self.0)
    }
}

/// Directional class of a formation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternClass {
    BullishReversal,
    BearishReversal,
    BullishContinuation,
    BearishContinuation,
    Indecision,
}

impl PatternClass {
    #[inline]
    pub fn is_bullish(self) -> bool {
        matches!(
            self,
            PatternClass::BullishReversal | PatternClass::BullishContinuation
        )
    }

    #[inline]
    pub fn is_bearish(self) -> bool {
        matches!(
            self,
            PatternClass::BearishReversal | PatternClass::BearishContinuation
        )
    }

    #[inline]
    pub fn is_reversal(self) -> bool {
        matches!(
            self,
            PatternClass::BullishReversal | PatternClass::BearishReversal
        )
    }
}

/// One identified formation.
///
/// `start_index..=end_index` locates `involved_candles` inside the scanned slice.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedPattern {
    pub name: PatternId,
    pub pattern_class: PatternClass,
    /// 0..=100
    pub confidence: u8,
    pub involved_candles: Vec<Candle>,
    pub description: &'static str,
    pub trading_implication: &'static str,
    pub start_index: usize,
    pub end_index: usize,
}

/// Category of pattern by number of candles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternCategory {
    SingleCandle,
    TwoCandle,
    ThreeCandle,
}

impl PatternCategory {
    /// Category for a rule spanning `span` candles
    pub fn from_span(span: usize) -> Self {
        match span {
            0 | 1 => PatternCategory::SingleCandle,
            2 => PatternCategory::TwoCandle,
            _ => PatternCategory::ThreeCandle,
        }
    }
}

/// Additional metadata about a pattern
#[derive(Debug, Clone)]
pub struct PatternMetadata {
    pub name: &'static str,
    pub description: &'static str,
    pub trading_implication: &'static str,
    pub category: PatternCategory,
}

// ============================================================
// PATTERN DETECTOR TRAITS
// ============================================================

/// Generic pattern rule - for concrete types.
///
/// A rule inspects the trailing `span()` candles of the window. The context
/// carries the trend of the candles *before* those.
pub trait PatternDetector: Send + Sync {
    fn id(&self) -> PatternId;
    fn span(&self) -> usize;
    fn detect<T: OHLCV>(&self, window: &[T], ctx: &ScanContext) -> Option<DetectedPattern>;

    fn validate_config(&self) -> Result<()> {
        Ok(())
    }

    fn metadata(&self) -> PatternMetadata {
        PatternMetadata {
            name: self.id().0,
            description: "",
            trading_implication: "",
            category: PatternCategory::from_span(self.span()),
        }
    }
}

/// Object-safe pattern rule - for custom rules
pub trait DynPatternDetector: Send + Sync {
    fn id(&self) -> PatternId;
    fn span(&self) -> usize;
    fn detect(&self, window: &[&dyn OHLCV], ctx: &ScanContext) -> Option<DetectedPattern>;
    fn validate_config(&self) -> Result<()>;
}

impl<D: PatternDetector> DynPatternDetector for D {
    fn id(&self) -> PatternId {
        PatternDetector::id(self)
    }

    fn span(&self) -> usize {
        PatternDetector::span(self)
    }

    fn detect(&self, window: &[&dyn OHLCV], ctx: &ScanContext) -> Option<DetectedPattern> {
        PatternDetector::detect(self, window, ctx)
    }

    fn validate_config(&self) -> Result<()> {
        PatternDetector::validate_config(self)
    }
}

// ============================================================
// BUILTIN DETECTORS - generated via macro
// ============================================================

use detectors::*;

/// Macro to generate BuiltinDetector enum without boilerplate
macro_rules! define_builtin_detectors {
    (
        $(
            $variant:ident($detector:ty)
        ),* $(,)?
    ) => {
        /// Registry of builtin rules - enum dispatch, no vtable
        #[derive(Debug, Clone)]
        pub enum BuiltinDetector {
            $($variant($detector)),*
        }

        impl BuiltinDetector {
            #[inline]
            pub fn detect<T: OHLCV>(
                &self,
                window: &[T],
                ctx: &ScanContext,
            ) -> Option<DetectedPattern> {
                match self {
                    $(Self::$variant(d) => PatternDetector::detect(d, window, ctx)),*
                }
            }

            #[inline]
            pub fn id(&self) -> PatternId {
                match self {
                    $(Self::$variant(d) => PatternDetector::id(d)),*
                }
            }

            #[inline]
            pub fn span(&self) -> usize {
                match self {
                    $(Self::$variant(d) => PatternDetector::span(d)),*
                }
            }

            pub fn metadata(&self) -> PatternMetadata {
                match self {
                    $(Self::$variant(d) => PatternDetector::metadata(d)),*
                }
            }

            pub fn validate_config(&self) -> Result<()> {
                match self {
                    $(Self::$variant(d) => PatternDetector::validate_config(d)),*
                }
            }
        }
    };
}

define_builtin_detectors! {
    // Single candle (8)
    Doji(DojiDetector),
    DragonflyDoji(DragonflyDojiDetector),
    GravestoneDoji(GravestoneDojiDetector),
    SpinningTop(SpinningTopDetector),
    Hammer(HammerDetector),
    HangingMan(HangingManDetector),
    InvertedHammer(InvertedHammerDetector),
    ShootingStar(ShootingStarDetector),

    // Two candle (6)
    BullishEngulfing(BullishEngulfingDetector),
    BearishEngulfing(BearishEngulfingDetector),
    PiercingLine(PiercingLineDetector),
    DarkCloudCover(DarkCloudCoverDetector),
    BullishHarami(BullishHaramiDetector),
    BearishHarami(BearishHaramiDetector),

    // Three candle (4)
    MorningStar(MorningStarDetector),
    EveningStar(EveningStarDetector),
    ThreeWhiteSoldiers(ThreeWhiteSoldiersDetector),
    ThreeBlackCrows(ThreeBlackCrowsDetector),
}

// ============================================================
// PATTERN ENGINE
// ============================================================

/// Smallest window the engine will scan
pub const MIN_WINDOW: usize = 3;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub min_confidence: Option<u8>,
    pub validate_data: bool,
    pub pattern_filter: Option<Vec<PatternId>>,
    /// Windows shorter than this yield no patterns
    pub min_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_confidence: None,
            validate_data: false,
            pattern_filter: None,
            min_window: MIN_WINDOW,
        }
    }
}

/// Main pattern detection engine
pub struct PatternEngine<C: ContextProvider = DefaultContextProvider> {
    builtin: Vec<BuiltinDetector>,
    custom: Vec<Box<dyn DynPatternDetector>>,
    context_provider: C,
    config: EngineConfig,
}

impl<C: ContextProvider> PatternEngine<C> {
    pub fn new(context_provider: C) -> Self {
        Self {
            builtin: Vec::new(),
            custom: Vec::new(),
            context_provider,
            config: EngineConfig::default(),
        }
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of registered rules (builtin + custom)
    #[inline]
    pub fn rule_count(&self) -> usize {
        self.builtin.len() + self.custom.len()
    }

    /// Trend context for the tail of `window`.
    #[inline]
    pub fn compute_context<T: OHLCV>(&self, window: &[T]) -> ScanContext {
        self.context_provider.context(window)
    }

    /// Detect every formation ending on the last candle of `window`,
    /// sorted by descending confidence.
    ///
    /// A window shorter than `min_window` yields an empty list; only invalid
    /// candle data (when validation is enabled) is an error.
    pub fn detect<T: OHLCV>(&self, window: &[T]) -> Result<Vec<DetectedPattern>> {
        if self.config.validate_data {
            self.validate_bars(window)?;
        }
        if window.len() < self.config.min_window {
            tracing::trace!(
                len = window.len(),
                min_window = self.config.min_window,
                "window too short, skipping scan"
            );
            return Ok(Vec::new());
        }

        let ctx = self.compute_context(window);
        Ok(self.detect_with_context(window, &ctx))
    }

    /// Detect with a caller-supplied context (no validation).
    pub fn detect_with_context<T: OHLCV>(
        &self,
        window: &[T],
        ctx: &ScanContext,
    ) -> Vec<DetectedPattern> {
        if window.len() < self.config.min_window {
            return Vec::new();
        }

        let mut results = if self.custom.is_empty() {
            self.detect_internal(window, &[], ctx)
        } else {
            let bar_refs: Vec<&dyn OHLCV> = window.iter().map(|b| b as &dyn OHLCV).collect();
            self.detect_internal(window, &bar_refs, ctx)
        };

        results.sort_by(|a, b| b.confidence.cmp(&a.confidence));
        tracing::debug!(
            window = window.len(),
            matches = results.len(),
            "pattern scan complete"
        );
        results
    }

    /// Iterate a history, scanning each prefix that ends on a bar.
    ///
    /// With validation enabled the whole history is checked once, up front.
    pub fn iter<'a, T: OHLCV>(&'a self, bars: &'a [T]) -> Result<PatternIterator<'a, T, C>> {
        if self.config.validate_data {
            self.validate_bars(bars)?;
        }
        Ok(PatternIterator::new(self, bars))
    }

    // ===========================================
    // Internal helpers
    // ===========================================

    fn detect_internal<T: OHLCV>(
        &self,
        window: &[T],
        bar_refs: &[&dyn OHLCV],
        ctx: &ScanContext,
    ) -> Vec<DetectedPattern> {
        let mut results = Vec::new();

        // Fast path: builtin detectors (enum dispatch, no vtable)
        for detector in &self.builtin {
            if window.len() >= detector.span() {
                if let Some(m) = detector.detect(window, ctx) {
                    self.push_match(&mut results, m);
                }
            }
        }

        // Slow path: custom detectors (vtable)
        if !self.custom.is_empty() && !bar_refs.is_empty() {
            for detector in &self.custom {
                if bar_refs.len() >= detector.span() {
                    if let Some(m) = detector.detect(bar_refs, ctx) {
                        self.push_match(&mut results, m);
                    }
                }
            }
        }

        results
    }

    fn push_match(&self, results: &mut Vec<DetectedPattern>, m: DetectedPattern) {
        if self.should_include(&m) {
            tracing::trace!(
                pattern = m.name.as_str(),
                confidence = m.confidence,
                "pattern matched"
            );
            results.push(m);
        }
    }

    fn should_include(&self, m: &DetectedPattern) -> bool {
        if let Some(min) = self.config.min_confidence {
            if m.confidence < min {
                return false;
            }
        }
        if let Some(ref filter) = self.config.pattern_filter {
            if !filter.contains(&m.name) {
                return false;
            }
        }
        true
    }

    fn validate_bars<T: OHLCV>(&self, bars: &[T]) -> Result<()> {
        for (i, bar) in bars.iter().enumerate() {
            bar.validate().map_err(|e| match e {
                AnalysisError::InvalidCandle { reason, .. } => {
                    tracing::warn!(index = i, reason, "rejecting invalid candle");
                    AnalysisError::InvalidCandle { index: i, reason }
                }
                other => other,
            })?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.config.min_window < MIN_WINDOW {
            return Err(AnalysisError::InvalidConfig(format!(
                "min_window must be >= {MIN_WINDOW}, got {}",
                self.config.min_window
            )));
        }
        for d in &self.builtin {
            d.validate_config()?;
        }
        for d in &self.custom {
            d.validate_config()?;
        }
        Ok(())
    }
}

// ============================================================
// PATTERN ITERATOR
// ============================================================

/// Patterns ending at a specific bar
#[derive(Debug, Clone)]
pub struct BarPatterns {
    pub index: usize,
    pub patterns: Vec<DetectedPattern>,
}

/// Iterator over bars with the patterns ending on each of them.
///
/// Starts at the first bar with a full `min_window` behind it.
pub struct PatternIterator<'a, T: OHLCV, C: ContextProvider> {
    engine: &'a PatternEngine<C>,
    bars: &'a [T],
    bar_refs: Vec<&'a dyn OHLCV>,
    current: usize,
}

impl<'a, T: OHLCV, C: ContextProvider> PatternIterator<'a, T, C> {
    fn new(engine: &'a PatternEngine<C>, bars: &'a [T]) -> Self {
        let bar_refs = if engine.custom.is_empty() {
            Vec::new()
        } else {
            bars.iter().map(|b| b as &dyn OHLCV).collect()
        };

        Self {
            engine,
            bars,
            bar_refs,
            current: engine.config.min_window.saturating_sub(1),
        }
    }
}

impl<'a, T: OHLCV, C: ContextProvider> Iterator for PatternIterator<'a, T, C> {
    type Item = BarPatterns;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.bars.len() {
            return None;
        }

        let index = self.current;
        let window = &self.bars[..=index];
        let refs: &[&dyn OHLCV] = if self.bar_refs.is_empty() {
            &[]
        } else {
            &self.bar_refs[..=index]
        };
        let ctx = self.engine.compute_context(window);
        let mut patterns = self.engine.detect_internal(window, refs, &ctx);
        patterns.sort_by(|a, b| b.confidence.cmp(&a.confidence));

        self.current += 1;

        Some(BarPatterns { index, patterns })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.bars.len().saturating_sub(self.current);
        (remaining, Some(remaining))
    }
}

impl<'a, T: OHLCV, C: ContextProvider> ExactSizeIterator for PatternIterator<'a, T, C> {}

// ============================================================
// BUILDER
// ============================================================

/// Builder for creating PatternEngine instances
pub struct EngineBuilder<C: ContextProvider = DefaultContextProvider> {
    context_provider: C,
    builtin: Vec<BuiltinDetector>,
    custom: Vec<Box<dyn DynPatternDetector>>,
    config: EngineConfig,
}

impl Default for EngineBuilder<DefaultContextProvider> {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder<DefaultContextProvider> {
    pub fn new() -> Self {
        Self {
            context_provider: DefaultContextProvider::default(),
            builtin: Vec::new(),
            custom: Vec::new(),
            config: EngineConfig::default(),
        }
    }
}

/// Generate an array of `BuiltinDetector` variants using `Default::default()` for each inner type.
macro_rules! builtin_defaults {
  ($($variant:ident),* $(,)?) => {
    [$(BuiltinDetector::$variant(Default::default())),*]
  };
}

impl<C: ContextProvider> EngineBuilder<C> {
    /// Change context provider
    pub fn context_provider<C2: ContextProvider>(self, provider: C2) -> EngineBuilder<C2> {
        EngineBuilder {
            context_provider: provider,
            builtin: self.builtin,
            custom: self.custom,
            config: self.config,
        }
    }

    /// Add all builtin patterns with default configurations
    pub fn with_all_defaults(self) -> Self {
        self.with_single_bar_defaults()
            .with_two_bar_defaults()
            .with_three_bar_defaults()
    }

    /// Add single-candle patterns with defaults (8)
    pub fn with_single_bar_defaults(mut self) -> Self {
        self.builtin.extend(builtin_defaults![
            Doji,
            DragonflyDoji,
            GravestoneDoji,
            SpinningTop,
            Hammer,
            HangingMan,
            InvertedHammer,
            ShootingStar,
        ]);
        self
    }

    /// Add two-candle patterns with defaults (6)
    pub fn with_two_bar_defaults(mut self) -> Self {
        self.builtin.extend(builtin_defaults![
            BullishEngulfing,
            BearishEngulfing,
            PiercingLine,
            DarkCloudCover,
            BullishHarami,
            BearishHarami,
        ]);
        self
    }

    /// Add three-candle patterns with defaults (4)
    pub fn with_three_bar_defaults(mut self) -> Self {
        self.builtin.extend(builtin_defaults![
            MorningStar,
            EveningStar,
            ThreeWhiteSoldiers,
            ThreeBlackCrows,
        ]);
        self
    }

    /// Add a builtin detector
    #[allow(clippy::should_implement_trait)]
    pub fn add(mut self, detector: BuiltinDetector) -> Self {
        self.builtin.push(detector);
        self
    }

    /// Add with config validation
    pub fn add_checked(mut self, detector: BuiltinDetector) -> Result<Self> {
        detector.validate_config()?;
        self.builtin.push(detector);
        Ok(self)
    }

    /// Add a custom detector (slow path)
    pub fn add_custom<D: DynPatternDetector + 'static>(mut self, detector: D) -> Self {
        self.custom.push(Box::new(detector));
        self
    }

    /// Drop matches below this confidence
    pub fn min_confidence(mut self, confidence: u8) -> Self {
        self.config.min_confidence = Some(confidence);
        self
    }

    /// Enable/disable data validation
    pub fn validate_data(mut self, enable: bool) -> Self {
        self.config.validate_data = enable;
        self
    }

    /// Filter to specific patterns only
    pub fn only_patterns(mut self, ids: impl IntoIterator<Item = PatternId>) -> Self {
        self.config.pattern_filter = Some(ids.into_iter().collect());
        self
    }

    /// Minimum window length (at least 3)
    pub fn min_window(mut self, len: usize) -> Self {
        self.config.min_window = len;
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<PatternEngine<C>> {
        let engine = PatternEngine {
            builtin: self.builtin,
            custom: self.custom,
            context_provider: self.context_provider,
            config: self.config,
        };
        engine.validate()?;
        Ok(engine)
    }
}

/// Default engine with DefaultContextProvider
pub type DefaultEngine = PatternEngine<DefaultContextProvider>;

// ============================================================
// TESTS
// ============================================================
