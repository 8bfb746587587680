//! Integration tests for the prediction synthesizer, cache and analysis facade.

use std::time::{Duration, Instant};

use candlecast::prelude::*;

fn rising(n: usize) -> Vec<f64> {
    (0..n).map(|i| 100.0 + i as f64).collect()
}

fn candles_from(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Candle::new(i as i64, c - 0.5, c + 1.0, c - 1.0, c, 1_000))
        .collect()
}

#[test]
fn test_nineteen_points_fail_twenty_succeed() {
    let closes = rising(19);
    let indicators = IndicatorSet::compute(&closes).unwrap();
    assert_eq!(
        predict(&closes, &indicators, classify(&closes)),
        Err(AnalysisError::InsufficientData { need: 20, got: 19 })
    );

    let closes = rising(20);
    let indicators = IndicatorSet::compute(&closes).unwrap();
    let result = predict(&closes, &indicators, classify(&closes)).unwrap();
    assert!((0.0..=100.0).contains(&result.bullishness_score));
    assert!(result.confidence <= 100);
    assert_eq!(result.current_price, 119.0);
}

#[test]
fn test_computed_indicators_end_to_end() {
    let closes: Vec<f64> = (0..60)
        .map(|i| 100.0 + (i as f64 * 0.3).sin() * 4.0 + i as f64 * 0.1)
        .collect();
    let indicators = IndicatorSet::compute(&closes).unwrap();
    let result = predict(&closes, &indicators, classify(&closes)).unwrap();

    let expected_confidence = ((result.bullishness_score - 50.0).abs() * 2.0).round() as u8;
    assert_eq!(result.confidence, expected_confidence);

    // linear horizon scaling: 5D and 30D moves are 3x and 10x the 1D move
    let one_day = result.predicted_price_1d - result.current_price;
    let five_day = result.predicted_price_5d - result.current_price;
    let thirty_day = result.predicted_price_30d - result.current_price;
    assert!((five_day - 3.0 * one_day).abs() < 1e-9);
    assert!((thirty_day - 10.0 * one_day).abs() < 1e-9);
}

#[test]
fn test_custom_predictor_config() {
    let config = PredictorConfig {
        min_points: 30,
        ..PredictorConfig::default()
    };
    let predictor = Predictor::new(config).unwrap();
    let closes = rising(25);
    assert_eq!(
        predictor.predict(&closes, &IndicatorSet::default(), TrendLabel::Sideways),
        Err(AnalysisError::InsufficientData { need: 30, got: 25 })
    );
}

#[test]
fn test_predictor_config_from_json() {
    let config: PredictorConfig =
        serde_json::from_str(r#"{ "min_points": 25, "thresholds": { "strong_buy": 85.0 } }"#)
            .unwrap();
    assert_eq!(config.min_points, 25);
    assert_eq!(config.momentum_lookback.get(), 10);
    assert_eq!(config.thresholds.strong_buy, 85.0);
    assert_eq!(config.thresholds.buy, 70.0);

    let bad: std::result::Result<PredictorConfig, _> =
        serde_json::from_str(r#"{ "momentum_lookback": 0 }"#);
    assert!(bad.is_err());
}

// ============================================================
// CACHE
// ============================================================

#[test]
fn test_cache_entry_expires_after_fifteen_minutes() {
    let closes = rising(30);
    let indicators = IndicatorSet::compute(&closes).unwrap();
    let result = predict(&closes, &indicators, classify(&closes)).unwrap();

    let cache = PredictionCache::new();
    assert_eq!(cache.ttl(), Duration::from_secs(900));

    let t0 = Instant::now();
    cache.insert_at("SPY", result.clone(), t0);
    assert_eq!(
        *cache.get_at("SPY", t0 + Duration::from_secs(899)).unwrap(),
        result
    );
    assert!(cache.get_at("SPY", t0 + Duration::from_secs(900)).is_none());
    assert_eq!(cache.purge_expired_at(t0 + Duration::from_secs(901)), 1);
    assert!(cache.is_empty());
}

// ============================================================
// ANALYSIS FACADE
// ============================================================

#[test]
fn test_analyzer_serves_cached_prediction() {
    let analyzer = Analyzer::new().unwrap();
    let cache = PredictionCache::new();

    let candles = candles_from(&rising(30));
    let first = analyzer.analyze("QQQ", &candles, &cache).unwrap();
    let second = analyzer.analyze("QQQ", &candles, &cache).unwrap();

    let a = first.prediction.unwrap();
    let b = second.prediction.unwrap();
    assert!(std::sync::Arc::ptr_eq(&a, &b));
}

#[test]
fn test_analyzer_recomputes_when_candles_advance() {
    let analyzer = Analyzer::new().unwrap();
    let cache = PredictionCache::new();

    let first = analyzer
        .analyze("QQQ", &candles_from(&rising(30)), &cache)
        .unwrap();
    let second = analyzer
        .analyze("QQQ", &candles_from(&rising(40)), &cache)
        .unwrap();

    let a = first.prediction.unwrap();
    let b = second.prediction.unwrap();
    assert!(!std::sync::Arc::ptr_eq(&a, &b));
    assert_eq!(a.current_price, 129.0);
    assert_eq!(b.current_price, 139.0);
    assert_eq!(second.indicators.sma20, Some(129.5));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_analyze_parallel_many_symbols() {
    let analyzer = Analyzer::new().unwrap();
    let cache = PredictionCache::new();

    let series: Vec<(String, Vec<Candle>)> = (0..8)
        .map(|i| (format!("SYM{i}"), candles_from(&rising(20 + i))))
        .collect();
    let short = candles_from(&rising(4));

    let mut instruments: Vec<(&str, &[Candle])> = series
        .iter()
        .map(|(s, c)| (s.as_str(), c.as_slice()))
        .collect();
    instruments.push(("SHORT", short.as_slice()));

    let (ok, failed) = analyze_parallel(&analyzer, instruments, &cache);
    assert_eq!(ok.len(), 9);
    assert!(failed.is_empty());
    assert_eq!(cache.len(), 8);

    let short = ok.iter().find(|a| a.symbol == "SHORT").unwrap();
    assert!(matches!(
        short.prediction,
        Err(AnalysisError::InsufficientData { need: 20, got: 4 })
    ));
}
