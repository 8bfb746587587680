//! One-call analysis of a symbol's candles, and parallel analysis of many.
//!
//! Indicators, trend, patterns and the (cached) prediction in one pass. A
//! history too short for a prediction still reports its patterns; the
//! prediction slot carries the error instead.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use crate::{
    cache::PredictionCache,
    indicators::IndicatorSet,
    prediction::{PredictionResult, Predictor},
    trend::{ContextProvider, DefaultContextProvider, TrendClassifier, TrendLabel},
    AnalysisError, DetectedPattern, EngineBuilder, PatternEngine, Result, OHLCV,
};

/// Everything known about one symbol after a pass.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub symbol: String,
    pub indicators: IndicatorSet,
    pub trend: TrendLabel,
    /// Sorted by descending confidence
    pub patterns: Vec<DetectedPattern>,
    pub prediction: Result<Arc<PredictionResult>>,
}

/// Error from analyzing a single symbol
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisFailure {
    pub symbol: String,
    pub error: AnalysisError,
}

/// Pattern engine, trend classifier and predictor bundled together.
pub struct Analyzer<C: ContextProvider = DefaultContextProvider> {
    engine: PatternEngine<C>,
    classifier: TrendClassifier,
    predictor: Predictor,
}

impl Analyzer {
    /// Every builtin rule, default trend classifier and predictor.
    pub fn new() -> Result<Self> {
        let engine = EngineBuilder::new().with_all_defaults().build()?;
        Ok(Self::with_engine(engine))
    }
}

impl<C: ContextProvider> Analyzer<C> {
    pub fn with_engine(engine: PatternEngine<C>) -> Self {
        Self {
            engine,
            classifier: TrendClassifier::default(),
            predictor: Predictor::default(),
        }
    }

    pub fn predictor(mut self, predictor: Predictor) -> Self {
        self.predictor = predictor;
        self
    }

    pub fn classifier(mut self, classifier: TrendClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    #[inline]
    pub fn engine(&self) -> &PatternEngine<C> {
        &self.engine
    }

    /// Analyze `candles` (oldest first) for `symbol`.
    ///
    /// The prediction is served from `cache` while fresh and only when it was
    /// computed over data ending on the same last-candle timestamp. Candles
    /// without timestamps share one entry per symbol. Failed predictions are
    /// never cached.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::EmptyInput`] for no candles, and any validation error
    /// from a validating engine. Prediction errors land in
    /// [`Analysis::prediction`].
    pub fn analyze<T: OHLCV>(
        &self,
        symbol: &str,
        candles: &[T],
        cache: &PredictionCache,
    ) -> Result<Analysis> {
        if candles.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }
        let closes: Vec<f64> = candles.iter().map(OHLCV::close).collect();

        let patterns = self.engine.detect(candles)?;
        let indicators = IndicatorSet::compute(&closes)?;
        let trend = self.classifier.classify(&closes);
        let as_of = candles.last().and_then(OHLCV::timestamp);
        let prediction = cache.get_or_compute_as_of(symbol, as_of, || {
            self.predictor.predict(&closes, &indicators, trend)
        });

        debug!(
            symbol,
            candles = candles.len(),
            patterns = patterns.len(),
            ?trend,
            predicted = prediction.is_ok(),
            "analysis complete"
        );

        Ok(Analysis {
            symbol: symbol.to_string(),
            indicators,
            trend,
            patterns,
            prediction,
        })
    }
}

/// Analyze many symbols on the rayon pool.
///
/// Returns the successful analyses and the per-symbol failures; one bad
/// series never aborts the batch.
pub fn analyze_parallel<'a, T, I, C>(
    analyzer: &Analyzer<C>,
    instruments: I,
    cache: &PredictionCache,
) -> (Vec<Analysis>, Vec<AnalysisFailure>)
where
    T: OHLCV + Sync + 'a,
    I: IntoParallelIterator<Item = (&'a str, &'a [T])>,
    C: ContextProvider + Sync,
{
    let results: Vec<_> = instruments
        .into_par_iter()
        .map(|(symbol, candles)| {
            analyzer
                .analyze(symbol, candles, cache)
                .map_err(|error| AnalysisFailure {
                    symbol: symbol.to_string(),
                    error,
                })
        })
        .collect();

    let mut successes = Vec::new();
    let mut failures = Vec::new();

    for result in results {
        match result {
            Ok(analysis) => successes.push(analysis),
            Err(failure) => failures.push(failure),
        }
    }

    debug!(
        analyzed = successes.len(),
        failed = failures.len(),
        "parallel analysis complete"
    );
    (successes, failures)
}
