//! Integration tests for candlestick pattern detection.
//!
//! Every scan goes through the public engine so the trend context is the one
//! computed from the preceding candles.

use candlecast::prelude::*;

/// Simple test bar structure
#[derive(Debug, Clone, Copy)]
struct TestBar {
    o: f64,
    h: f64,
    l: f64,
    c: f64,
}

impl TestBar {
    fn new(o: f64, h: f64, l: f64, c: f64) -> Self {
        Self { o, h, l, c }
    }
}

impl OHLCV for TestBar {
    fn open(&self) -> f64 {
        self.o
    }

    fn high(&self) -> f64 {
        self.h
    }

    fn low(&self) -> f64 {
        self.l
    }

    fn close(&self) -> f64 {
        self.c
    }

    fn volume(&self) -> f64 {
        1000.0
    }
}

/// Closes 99.5, 97.5, ..., 81.5
fn make_downtrend(n: usize) -> Vec<TestBar> {
    (0..n)
        .map(|i| {
            let base = 100.0 - (i as f64) * 2.0;
            TestBar::new(base + 1.0, base + 2.0, base - 1.0, base - 0.5)
        })
        .collect()
}

/// Closes 101, 103, ..., 119
fn make_uptrend(n: usize) -> Vec<TestBar> {
    (0..n)
        .map(|i| {
            let base = 100.0 + (i as f64) * 2.0;
            TestBar::new(base - 0.5, base + 1.5, base - 1.5, base + 1.0)
        })
        .collect()
}

fn make_sideways(n: usize) -> Vec<TestBar> {
    (0..n)
        .map(|_| TestBar::new(100.0, 102.0, 98.0, 101.0))
        .collect()
}

fn engine() -> DefaultEngine {
    EngineBuilder::new().with_all_defaults().build().unwrap()
}

fn find<'a>(patterns: &'a [DetectedPattern], name: &str) -> Option<&'a DetectedPattern> {
    patterns.iter().find(|p| p.name.as_str() == name)
}

// ============================================================
// SINGLE BAR PATTERN TESTS
// ============================================================

#[test]
fn test_doji_detection() {
    let mut bars = make_downtrend(10);
    bars.push(TestBar::new(80.0, 85.0, 75.0, 80.0));

    let patterns = engine().detect(&bars).unwrap();
    let doji = find(&patterns, "Doji").expect("doji");
    assert_eq!(doji.confidence, 60);
    assert_eq!(doji.pattern_class, PatternClass::Indecision);
}

#[test]
fn test_hammer_after_downtrend() {
    let mut bars = make_downtrend(10);
    bars.push(TestBar::new(80.0, 80.52, 75.0, 80.5));

    let patterns = engine().detect(&bars).unwrap();
    assert_eq!(patterns[0].name.as_str(), "Hammer");
    assert_eq!(patterns[0].pattern_class, PatternClass::BullishReversal);
    assert_eq!(patterns[0].confidence, 100);
    assert!(find(&patterns, "Hanging Man").is_none());
    assert!(find(&patterns, "Shooting Star").is_none());
}

#[test]
fn test_hanging_man_after_uptrend() {
    let mut bars = make_uptrend(10);
    bars.push(TestBar::new(120.0, 120.52, 115.0, 120.5));

    let patterns = engine().detect(&bars).unwrap();
    let m = find(&patterns, "Hanging Man").expect("hanging man");
    assert_eq!(m.pattern_class, PatternClass::BearishReversal);
    assert!(find(&patterns, "Hammer").is_none());
}

#[test]
fn test_shooting_star_after_uptrend() {
    let mut bars = make_uptrend(10);
    bars.push(TestBar::new(120.5, 126.0, 119.98, 120.0));

    let patterns = engine().detect(&bars).unwrap();
    let star = find(&patterns, "Shooting Star").expect("shooting star");
    assert_eq!(star.pattern_class, PatternClass::BearishReversal);
    assert!(find(&patterns, "Inverted Hammer").is_none());
}

#[test]
fn test_hammer_shape_without_trend_is_not_reported() {
    let mut bars = make_sideways(10);
    bars.push(TestBar::new(100.0, 100.52, 95.0, 100.5));

    let patterns = engine().detect(&bars).unwrap();
    assert!(find(&patterns, "Hammer").is_none());
    assert!(find(&patterns, "Hanging Man").is_none());
}

// ============================================================
// TWO BAR PATTERN TESTS
// ============================================================

#[test]
fn test_bullish_engulfing_after_downtrend() {
    let mut bars = make_downtrend(10);
    bars.push(TestBar::new(82.0, 82.5, 78.5, 79.0));
    bars.push(TestBar::new(78.5, 84.5, 78.0, 84.0));

    let patterns = engine().detect(&bars).unwrap();
    let m = find(&patterns, "Bullish Engulfing").expect("engulfing");
    assert_eq!(m.pattern_class, PatternClass::BullishReversal);
    // size bonus, equal volume
    assert_eq!(m.confidence, 90);
    assert_eq!(m.involved_candles.len(), 2);
    assert_eq!((m.start_index, m.end_index), (10, 11));
}

#[test]
fn test_dark_cloud_cover_after_uptrend() {
    let mut bars = make_uptrend(10);
    bars.push(TestBar::new(120.0, 131.0, 119.0, 130.0));
    bars.push(TestBar::new(132.0, 132.5, 121.5, 122.0));

    let patterns = engine().detect(&bars).unwrap();
    let m = find(&patterns, "Dark Cloud Cover").expect("dark cloud");
    assert_eq!(m.pattern_class, PatternClass::BearishReversal);
}

#[test]
fn test_bearish_harami_after_uptrend() {
    let mut bars = make_uptrend(10);
    bars.push(TestBar::new(120.0, 131.0, 119.0, 130.0));
    bars.push(TestBar::new(126.0, 127.0, 123.5, 124.0));

    let patterns = engine().detect(&bars).unwrap();
    let m = find(&patterns, "Bearish Harami").expect("bearish harami");
    assert_eq!(m.pattern_class, PatternClass::BearishReversal);
    assert_eq!(m.confidence, 100);
    assert_eq!((m.start_index, m.end_index), (10, 11));
    assert!(find(&patterns, "Bullish Harami").is_none());

    // same pair without the advance in front of it
    let mut flat = make_sideways(10);
    flat.extend_from_slice(&bars[10..]);
    let patterns = engine().detect(&flat).unwrap();
    assert!(find(&patterns, "Bearish Harami").is_none());
}

// ============================================================
// THREE BAR PATTERN TESTS
// ============================================================

#[test]
fn test_morning_star_in_downtrend() {
    let mut bars: Vec<TestBar> = [120.0, 118.0, 116.0, 114.0, 112.0, 110.0]
        .iter()
        .map(|&c| TestBar::new(c + 1.0, c + 1.5, c - 0.5, c))
        .collect();
    bars.push(TestBar::new(110.0, 110.5, 100.5, 101.0));
    bars.push(TestBar::new(99.5, 100.0, 98.5, 99.0));
    bars.push(TestBar::new(100.0, 109.0, 99.5, 108.5));

    let patterns = engine().detect(&bars).unwrap();
    let star = find(&patterns, "Morning Star").expect("morning star");
    assert_eq!(star.pattern_class, PatternClass::BullishReversal);
    assert_eq!(star.confidence, 80);
    assert_eq!(star.involved_candles.len(), 3);
    assert_eq!(star.involved_candles[2].close, 108.5);
    assert_eq!((star.start_index, star.end_index), (6, 8));
}

#[test]
fn test_three_white_soldiers() {
    let mut bars = make_sideways(5);
    bars.push(TestBar::new(100.0, 104.2, 99.8, 104.0));
    bars.push(TestBar::new(102.0, 106.2, 101.8, 106.0));
    bars.push(TestBar::new(104.0, 108.2, 103.8, 108.0));

    let patterns = engine().detect(&bars).unwrap();
    let m = find(&patterns, "Three White Soldiers").expect("soldiers");
    assert_eq!(m.pattern_class, PatternClass::BullishContinuation);
    assert_eq!(m.confidence, 100);
}

// ============================================================
// EDGE CASES
// ============================================================

#[test]
fn test_flat_candles_yield_nothing() {
    let flat = vec![TestBar::new(100.0, 100.0, 100.0, 100.0); 10];
    assert!(engine().detect(&flat).unwrap().is_empty());

    let mut bars = make_downtrend(10);
    bars.push(TestBar::new(100.0, 100.0, 100.0, 100.0));
    assert!(engine().detect(&bars).unwrap().is_empty());
}

#[test]
fn test_short_window_is_empty_not_error() {
    let bars = make_downtrend(2);
    assert!(engine().detect(&bars).unwrap().is_empty());
    let none: Vec<TestBar> = Vec::new();
    assert!(engine().detect(&none).unwrap().is_empty());
}

#[test]
fn test_results_sorted_by_confidence() {
    let mut bars = make_downtrend(10);
    bars.push(TestBar::new(80.0, 80.52, 75.0, 80.5));

    let patterns = engine().detect(&bars).unwrap();
    assert!(patterns.len() >= 2);
    assert!(patterns
        .windows(2)
        .all(|w| w[0].confidence >= w[1].confidence));
}

#[test]
fn test_min_confidence_and_filter() {
    let mut bars = make_downtrend(10);
    bars.push(TestBar::new(80.0, 80.52, 75.0, 80.5));

    let strict = EngineBuilder::new()
        .with_all_defaults()
        .min_confidence(90)
        .build()
        .unwrap();
    let patterns = strict.detect(&bars).unwrap();
    assert!(patterns.iter().all(|p| p.confidence >= 90));
    assert!(find(&patterns, "Doji").is_none());

    let only_doji = EngineBuilder::new()
        .with_all_defaults()
        .only_patterns([PatternId("Doji")])
        .build()
        .unwrap();
    let patterns = only_doji.detect(&bars).unwrap();
    assert_eq!(patterns.len(), 1);
    assert_eq!(patterns[0].name.as_str(), "Doji");
}

#[test]
fn test_validating_engine_rejects_bad_candle() {
    let mut bars = make_downtrend(5);
    bars[2] = TestBar::new(100.0, 90.0, 110.0, 100.0);

    let engine = EngineBuilder::new()
        .with_all_defaults()
        .validate_data(true)
        .build()
        .unwrap();
    assert!(matches!(
        engine.detect(&bars),
        Err(AnalysisError::InvalidCandle { index: 2, .. })
    ));
}

#[test]
fn test_rolling_history() {
    let mut bars = make_downtrend(10);
    bars.push(TestBar::new(80.0, 80.52, 75.0, 80.5));
    bars.extend(make_sideways(3));

    let engine = engine();
    let scans: Vec<BarPatterns> = engine.iter(&bars).unwrap().collect();
    assert_eq!(scans.len(), bars.len() - 2);
    assert_eq!(scans[0].index, 2);

    let hammer_bar = scans.iter().find(|s| s.index == 10).unwrap();
    assert!(find(&hammer_bar.patterns, "Hammer").is_some());
}

#[test]
fn test_rule_registry() {
    let engine = engine();
    assert_eq!(engine.rule_count(), 18);

    let singles = EngineBuilder::new().with_single_bar_defaults().build().unwrap();
    assert_eq!(singles.rule_count(), 8);

    let meta = BuiltinDetector::MorningStar(MorningStarDetector::default()).metadata();
    assert_eq!(meta.name, "Morning Star");

    let bad = EngineBuilder::new().add_checked(BuiltinDetector::Hammer(HammerDetector {
        shadow_factor: 0.0,
        ..HammerDetector::default()
    }));
    assert!(matches!(bad, Err(AnalysisError::InvalidConfig(_))));
}

#[test]
fn test_every_rule_describes_itself() {
    let rules = [
        BuiltinDetector::Doji(DojiDetector::default()),
        BuiltinDetector::DragonflyDoji(DragonflyDojiDetector::default()),
        BuiltinDetector::GravestoneDoji(GravestoneDojiDetector::default()),
        BuiltinDetector::SpinningTop(SpinningTopDetector),
        BuiltinDetector::Hammer(HammerDetector::default()),
        BuiltinDetector::HangingMan(HangingManDetector::default()),
        BuiltinDetector::InvertedHammer(InvertedHammerDetector::default()),
        BuiltinDetector::ShootingStar(ShootingStarDetector::default()),
        BuiltinDetector::BullishEngulfing(BullishEngulfingDetector::default()),
        BuiltinDetector::BearishEngulfing(BearishEngulfingDetector::default()),
        BuiltinDetector::PiercingLine(PiercingLineDetector),
        BuiltinDetector::DarkCloudCover(DarkCloudCoverDetector),
        BuiltinDetector::BullishHarami(BullishHaramiDetector),
        BuiltinDetector::BearishHarami(BearishHaramiDetector),
        BuiltinDetector::MorningStar(MorningStarDetector::default()),
        BuiltinDetector::EveningStar(EveningStarDetector::default()),
        BuiltinDetector::ThreeWhiteSoldiers(ThreeWhiteSoldiersDetector),
        BuiltinDetector::ThreeBlackCrows(ThreeBlackCrowsDetector),
    ];

    for rule in &rules {
        let meta = rule.metadata();
        assert_eq!(meta.name, rule.id().as_str());
        assert!(!meta.description.is_empty(), "{}", meta.name);
        assert!(!meta.trading_implication.is_empty(), "{}", meta.name);
        assert_eq!(meta.category, PatternCategory::from_span(rule.span()));
    }

    let star = rules[14].metadata();
    assert_eq!(star.name, "Morning Star");
    assert_eq!(star.category, PatternCategory::ThreeCandle);
}

#[test]
fn test_detected_pattern_json_shape() {
    let mut bars = make_downtrend(10);
    bars.push(TestBar::new(80.0, 80.52, 75.0, 80.5));

    let patterns = engine().detect(&bars).unwrap();
    let json = serde_json::to_value(&patterns[0]).unwrap();
    assert_eq!(json["name"], "Hammer");
    assert_eq!(json["patternClass"], "bullish-reversal");
    assert_eq!(json["confidence"], 100);
    assert_eq!(json["involvedCandles"].as_array().unwrap().len(), 1);
    assert!(json["tradingImplication"].is_string());
}
