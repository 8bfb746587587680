//! Heuristic price-direction score.
//!
//! Starts at a neutral 50 and applies additive adjustments from the indicator
//! snapshot, the short/long SMA cross, the Bollinger position, the trend label
//! and recent momentum. The clamped score maps to an [`Action`] tier and to
//! linear price projections for 1, 5 and 30 days.
//!
//! This is not a forecasting model; it is a readable summary of the indicators.

use tracing::debug;

use crate::{
    indicators::{sma, IndicatorSet},
    stats::{self, linear_regression},
    trend::TrendLabel,
    AnalysisError, Period, Result,
};

/// Points needed before a prediction is attempted
pub const MIN_POINTS: usize = 20;

/// Neutral score
pub const NEUTRAL_SCORE: f64 = 50.0;

// ============================================================
// ACTION TIERS
// ============================================================

/// Suggested action derived from the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    StrongBuy,
    Buy,
    WeakBuy,
    Hold,
    WeakSell,
    Sell,
    StrongSell,
}

impl Action {
    pub fn is_buy(self) -> bool {
        matches!(self, Action::StrongBuy | Action::Buy | Action::WeakBuy)
    }

    pub fn is_sell(self) -> bool {
        matches!(self, Action::StrongSell | Action::Sell | Action::WeakSell)
    }
}

/// Score boundaries for each action. Buy tiers are inclusive lower bounds,
/// sell tiers inclusive upper bounds.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ActionThresholds {
    pub strong_buy: f64,
    pub buy: f64,
    pub weak_buy: f64,
    pub weak_sell: f64,
    pub sell: f64,
    pub strong_sell: f64,
}

impl Default for ActionThresholds {
    fn default() -> Self {
        Self {
            strong_buy: 80.0,
            buy: 70.0,
            weak_buy: 60.0,
            weak_sell: 40.0,
            sell: 30.0,
            strong_sell: 20.0,
        }
    }
}

impl ActionThresholds {
    pub fn action(&self, score: f64) -> Action {
        if score >= self.strong_buy {
            Action::StrongBuy
        } else if score >= self.buy {
            Action::Buy
        } else if score >= self.weak_buy {
            Action::WeakBuy
        } else if score <= self.strong_sell {
            Action::StrongSell
        } else if score <= self.sell {
            Action::Sell
        } else if score <= self.weak_sell {
            Action::WeakSell
        } else {
            Action::Hold
        }
    }

    fn validate(&self) -> Result<()> {
        let ordered = self.strong_sell <= self.sell
            && self.sell <= self.weak_sell
            && self.weak_sell < self.weak_buy
            && self.weak_buy <= self.buy
            && self.buy <= self.strong_buy;
        if !ordered {
            return Err(AnalysisError::InvalidConfig(
                "action thresholds must increase from strong_sell to strong_buy".into(),
            ));
        }
        Ok(())
    }
}

// ============================================================
// CONFIGURATION
// ============================================================

/// Predictor configuration
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// Fewer closes fail with `InsufficientData`
    pub min_points: usize,
    /// Look-back of the momentum term
    pub momentum_lookback: Period,
    /// Short SMA compared against SMA(20)
    pub short_sma: Period,
    /// Closes fed to the regression note
    pub regression_window: Period,
    pub thresholds: ActionThresholds,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            min_points: MIN_POINTS,
            momentum_lookback: Period::new_const(10),
            short_sma: Period::new_const(5),
            regression_window: Period::new_const(20),
            thresholds: ActionThresholds::default(),
        }
    }
}

// ============================================================
// RESULT
// ============================================================

/// Output of one prediction
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    /// 0..=100, 50 is neutral
    pub bullishness_score: f64,
    pub action: Action,
    /// 0..=100, distance of the score from neutral
    pub confidence: u8,
    pub current_price: f64,
    #[serde(rename = "predictedPrice1D")]
    pub predicted_price_1d: f64,
    #[serde(rename = "predictedPrice5D")]
    pub predicted_price_5d: f64,
    #[serde(rename = "predictedPrice30D")]
    pub predicted_price_30d: f64,
    pub supporting_factors: Vec<String>,
    pub risk_factors: Vec<String>,
}

/// Score accumulator with the explanations behind each adjustment
#[derive(Debug, Default)]
struct Scorecard {
    score: f64,
    supporting: Vec<String>,
    risks: Vec<String>,
}

impl Scorecard {
    fn new() -> Self {
        Self {
            score: NEUTRAL_SCORE,
            ..Self::default()
        }
    }

    fn adjust(&mut self, delta: f64, reason: String) {
        self.score += delta;
        if delta >= 0.0 {
            self.supporting.push(reason);
        } else {
            self.risks.push(reason);
        }
    }

    fn missing(&mut self, indicator: &str) {
        self.risks
            .push(format!("{indicator} unavailable: not enough history"));
    }
}

// ============================================================
// PREDICTOR
// ============================================================

/// Prediction synthesizer
#[derive(Debug, Clone, Default)]
pub struct Predictor {
    config: PredictorConfig,
}

impl Predictor {
    pub fn new(config: PredictorConfig) -> Result<Self> {
        config.thresholds.validate()?;
        Ok(Self { config })
    }

    #[inline]
    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    /// Score `closes` (oldest first) given their indicator snapshot and trend.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::InsufficientData`] with fewer than `min_points` closes
    /// - [`AnalysisError::InvalidValue`] when a close is NaN or infinite
    pub fn predict(
        &self,
        closes: &[f64],
        indicators: &IndicatorSet,
        trend: TrendLabel,
    ) -> Result<PredictionResult> {
        let need = self.config.min_points;
        if closes.len() < need {
            return Err(AnalysisError::InsufficientData {
                need,
                got: closes.len(),
            });
        }
        if closes.iter().any(|c| !c.is_finite()) {
            return Err(AnalysisError::InvalidValue("close price is NaN or infinite"));
        }
        let current = closes.last().copied().ok_or(AnalysisError::EmptyInput)?;

        let mut card = Scorecard::new();
        score_rsi(&mut card, indicators.rsi14);
        score_macd(&mut card, indicators.macd, indicators.macd_signal);

        let short_period = self.config.short_sma.get();
        let short = sma(closes, self.config.short_sma)?.value();
        match indicators.sma20 {
            Some(long) if short > long => card.adjust(
                10.0,
                format!("SMA{short_period} ({short:.2}) above SMA20 ({long:.2})"),
            ),
            Some(long) => card.adjust(
                -10.0,
                format!("SMA{short_period} ({short:.2}) below SMA20 ({long:.2})"),
            ),
            None => card.missing("SMA20"),
        }

        score_bollinger(&mut card, current, indicators);

        match trend {
            TrendLabel::Uptrend => card.adjust(5.0, "Price is in an uptrend".into()),
            TrendLabel::Downtrend => card.adjust(-5.0, "Price is in a downtrend".into()),
            TrendLabel::Sideways => {}
        }

        let lookback = self.config.momentum_lookback.get();
        let momentum = closes
            .len()
            .checked_sub(lookback + 1)
            .map(|i| stats::pct_change(closes[i], current).clamp(-1.0, 1.0))
            .unwrap_or(0.0);
        if momentum != 0.0 {
            card.adjust(
                momentum * 10.0,
                format!("{lookback}-period momentum {:+.2}%", momentum * 100.0),
            );
        }

        let score = card.score.clamp(0.0, 100.0);
        let action = self.config.thresholds.action(score);

        let avg_daily_change = average_abs_daily_change(closes);
        let direction = if score > NEUTRAL_SCORE { 1.0 } else { -1.0 };
        let predicted_change =
            avg_daily_change * direction * ((score - NEUTRAL_SCORE).abs() / NEUTRAL_SCORE);

        let window = self.config.regression_window.get();
        let fit = linear_regression(&closes[closes.len().saturating_sub(window)..]);
        if fit.slope > 0.0 {
            card.supporting.push(format!(
                "Regression over the last {window} closes is rising ({:+.4} per bar)",
                fit.slope
            ));
        } else if fit.slope < 0.0 {
            card.risks.push(format!(
                "Regression over the last {window} closes is falling ({:+.4} per bar)",
                fit.slope
            ));
        }

        let confidence = ((score - NEUTRAL_SCORE).abs() * 2.0).round().clamp(0.0, 100.0) as u8;

        debug!(
            points = closes.len(),
            score,
            ?action,
            confidence,
            "prediction computed"
        );

        Ok(PredictionResult {
            bullishness_score: score,
            action,
            confidence,
            current_price: current,
            predicted_price_1d: current * (1.0 + predicted_change),
            predicted_price_5d: current * (1.0 + 3.0 * predicted_change),
            predicted_price_30d: current * (1.0 + 10.0 * predicted_change),
            supporting_factors: card.supporting,
            risk_factors: card.risks,
        })
    }
}

/// Predict with the default configuration.
pub fn predict(
    closes: &[f64],
    indicators: &IndicatorSet,
    trend: TrendLabel,
) -> Result<PredictionResult> {
    Predictor::default().predict(closes, indicators, trend)
}

fn score_rsi(card: &mut Scorecard, rsi: Option<f64>) {
    let Some(rsi) = rsi else {
        card.missing("RSI14");
        return;
    };
    if rsi < 30.0 {
        card.adjust(15.0, format!("RSI {rsi:.1} is oversold"));
    } else if rsi > 70.0 {
        card.adjust(-15.0, format!("RSI {rsi:.1} is overbought"));
    } else if rsi > 30.0 && rsi < 40.0 {
        card.adjust(5.0, format!("RSI {rsi:.1} is approaching oversold"));
    } else if rsi > 60.0 && rsi < 70.0 {
        card.adjust(-5.0, format!("RSI {rsi:.1} is approaching overbought"));
    }
}

fn score_macd(card: &mut Scorecard, macd: Option<f64>, signal: Option<f64>) {
    match (macd, signal) {
        (Some(m), Some(s)) if m > s => {
            card.adjust(10.0, format!("MACD {m:.3} above signal {s:.3}"))
        }
        (Some(m), Some(s)) => card.adjust(-10.0, format!("MACD {m:.3} below signal {s:.3}")),
        _ => card.missing("MACD"),
    }
}

fn score_bollinger(card: &mut Scorecard, price: f64, indicators: &IndicatorSet) {
    let (Some(upper), Some(lower)) = (indicators.bollinger_upper, indicators.bollinger_lower)
    else {
        card.missing("Bollinger Bands");
        return;
    };
    let width = upper - lower;
    if width <= f64::EPSILON {
        return;
    }
    let position = (price - lower) / width;
    if position < 0.2 {
        card.adjust(10.0, "Price near the lower Bollinger band".into());
    } else if position > 0.8 {
        card.adjust(-10.0, "Price near the upper Bollinger band".into());
    }
}

/// Mean of `|close[i] - close[i-1]| / close[i-1]`, skipping zero bases.
fn average_abs_daily_change(closes: &[f64]) -> f64 {
    let changes: Vec<f64> = closes
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| ((w[1] - w[0]) / w[0]).abs())
        .collect();
    stats::mean(&changes).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bullish_set() -> IndicatorSet {
        IndicatorSet {
            sma20: Some(90.0),
            rsi14: Some(25.0),
            macd: Some(1.0),
            macd_signal: Some(0.5),
            bollinger_upper: Some(120.0),
            bollinger_lower: Some(97.0),
            ..IndicatorSet::default()
        }
    }

    #[test]
    fn test_insufficient_data() {
        let closes = [100.0; 19];
        assert_eq!(
            predict(&closes, &IndicatorSet::default(), TrendLabel::Sideways),
            Err(AnalysisError::InsufficientData { need: 20, got: 19 })
        );
    }

    #[test]
    fn test_every_bullish_adjustment() {
        let closes = [100.0; 20];
        let result = predict(&closes, &bullish_set(), TrendLabel::Uptrend).unwrap();
        // 50 + 15 + 10 + 10 + 10 + 5
        assert_eq!(result.bullishness_score, 100.0);
        assert_eq!(result.action, Action::StrongBuy);
        assert_eq!(result.confidence, 100);
        // flat series: no projected move
        assert_eq!(result.predicted_price_30d, 100.0);
        assert_eq!(result.supporting_factors.len(), 5);
        assert!(result.risk_factors.is_empty());
    }

    #[test]
    fn test_every_bearish_adjustment() {
        let closes = [100.0; 20];
        let set = IndicatorSet {
            sma20: Some(110.0),
            rsi14: Some(75.0),
            macd: Some(-1.0),
            macd_signal: Some(0.0),
            bollinger_upper: Some(101.0),
            bollinger_lower: Some(80.0),
            ..IndicatorSet::default()
        };
        let result = predict(&closes, &set, TrendLabel::Downtrend).unwrap();
        assert_eq!(result.bullishness_score, 0.0);
        assert_eq!(result.action, Action::StrongSell);
        assert_eq!(result.risk_factors.len(), 5);
    }

    #[test]
    fn test_missing_indicators_are_risks() {
        let closes = [100.0; 20];
        let result = predict(&closes, &IndicatorSet::default(), TrendLabel::Sideways).unwrap();
        assert_eq!(result.bullishness_score, 50.0);
        assert_eq!(result.action, Action::Hold);
        assert_eq!(result.confidence, 0);
        assert_eq!(result.risk_factors.len(), 4);
        assert!(result.risk_factors[0].contains("RSI14"));
        assert_eq!(result.predicted_price_1d, 100.0);
    }

    #[test]
    fn test_momentum_and_projection() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let result = predict(&closes, &IndicatorSet::default(), TrendLabel::Sideways).unwrap();

        // 10 / 109 * 10
        let expected = 50.0 + 10.0 / 109.0 * 10.0;
        assert!((result.bullishness_score - expected).abs() < 1e-9);
        assert_eq!(result.action, Action::Hold);
        assert!(result.predicted_price_1d > result.current_price);
        assert!(result.predicted_price_5d > result.predicted_price_1d);
        assert!(result.predicted_price_30d > result.predicted_price_5d);
        assert!(result
            .supporting_factors
            .iter()
            .any(|f| f.starts_with("Regression")));
    }

    #[test]
    fn test_action_tiers() {
        let t = ActionThresholds::default();
        assert_eq!(t.action(80.0), Action::StrongBuy);
        assert_eq!(t.action(79.9), Action::Buy);
        assert_eq!(t.action(70.0), Action::Buy);
        assert_eq!(t.action(60.0), Action::WeakBuy);
        assert_eq!(t.action(59.9), Action::Hold);
        assert_eq!(t.action(40.1), Action::Hold);
        assert_eq!(t.action(40.0), Action::WeakSell);
        assert_eq!(t.action(30.0), Action::Sell);
        assert_eq!(t.action(20.0), Action::StrongSell);
        assert!(Action::WeakBuy.is_buy() && Action::Sell.is_sell());
    }

    #[test]
    fn test_rejects_unordered_thresholds() {
        let config = PredictorConfig {
            thresholds: ActionThresholds {
                weak_buy: 35.0,
                ..ActionThresholds::default()
            },
            ..PredictorConfig::default()
        };
        assert!(matches!(
            Predictor::new(config),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_non_finite_close() {
        let mut closes = vec![100.0; 20];
        closes[3] = f64::NAN;
        assert!(predict(&closes, &IndicatorSet::default(), TrendLabel::Sideways).is_err());
    }

    #[test]
    fn test_json_field_names() {
        let closes = [100.0; 20];
        let result = predict(&closes, &bullish_set(), TrendLabel::Uptrend).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["action"], "strongBuy");
        assert!(json.get("bullishnessScore").is_some());
        assert!(json.get("predictedPrice30D").is_some());
    }
}
