//! Bollinger Bands.

use super::Reading;
use crate::{stats, AnalysisError, Period, Result};

/// Bollinger Bands parameters.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BollingerParams {
    /// SMA period (default: 20).
    pub period: Period,
    /// Standard deviation multiplier (default: 2.0). Finite and >= 0.
    #[serde(deserialize_with = "deserialize_multiplier")]
    pub std_dev_multiplier: f64,
}

fn check_multiplier(value: f64) -> Result<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(AnalysisError::InvalidConfig(format!(
            "std_dev_multiplier must be finite and >= 0, got {value}"
        )));
    }
    Ok(value)
}

fn deserialize_multiplier<'de, D: serde::Deserializer<'de>>(
    d: D,
) -> std::result::Result<f64, D::Error> {
    let value = <f64 as serde::Deserialize>::deserialize(d)?;
    check_multiplier(value).map_err(serde::de::Error::custom)
}

impl Default for BollingerParams {
    fn default() -> Self {
        Self {
            period: Period::new_const(20),
            std_dev_multiplier: 2.0,
        }
    }
}

/// Bands around the trailing SMA.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerBands {
    #[inline]
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Where `price` sits between the bands: 0 at the lower band, 1 at the
    /// upper. `None` when the bands have collapsed.
    pub fn position(&self, price: f64) -> Option<f64> {
        let width = self.width();
        (width > f64::EPSILON).then(|| (price - self.lower) / width)
    }
}

/// Middle = SMA(period), upper/lower = middle ± k·σ of the same closes
/// (population σ).
///
/// Fewer closes than `period` give `InsufficientHistory` bands over whatever
/// closes exist. A negative or non-finite multiplier is `InvalidConfig`.
pub fn bollinger(closes: &[f64], params: BollingerParams) -> Result<Reading<BollingerBands>> {
    let multiplier = check_multiplier(params.std_dev_multiplier)?;
    if closes.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    let period = params.period.get();
    let window = &closes[closes.len().saturating_sub(period)..];

    let middle = stats::mean(window)?;
    let sigma = stats::stddev(window, Some(middle))?;
    let offset = multiplier * sigma;
    let bands = BollingerBands {
        upper: middle + offset,
        middle,
        lower: middle - offset,
    };

    if closes.len() < period {
        Ok(Reading::InsufficientHistory(bands))
    } else {
        Ok(Reading::Ready(bands))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bollinger_known_values() {
        // mean 5, population sigma 2
        let closes = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let params = BollingerParams {
            period: Period::new(8).unwrap(),
            std_dev_multiplier: 2.0,
        };
        let bands = bollinger(&closes, params).unwrap();
        assert!(bands.is_ready());
        let bands = bands.value();
        assert!((bands.middle - 5.0).abs() < 1e-12);
        assert!((bands.upper - 9.0).abs() < 1e-12);
        assert!((bands.lower - 1.0).abs() < 1e-12);
        assert!((bands.position(5.0).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_bollinger_uses_trailing_period() {
        let mut closes = vec![1000.0; 5];
        closes.extend(std::iter::repeat(50.0).take(20));
        let bands = bollinger(&closes, BollingerParams::default()).unwrap().value();
        assert_eq!(bands.middle, 50.0);
        assert_eq!(bands.width(), 0.0);
        assert!(bands.position(50.0).is_none());
    }

    #[test]
    fn test_bollinger_short_history() {
        let bands = bollinger(&[10.0, 12.0], BollingerParams::default()).unwrap();
        assert!(!bands.is_ready());
        let bands = bands.value();
        assert!(bands.lower <= bands.middle && bands.middle <= bands.upper);
        assert!(bollinger(&[], BollingerParams::default()).is_err());
    }

    #[test]
    fn test_negative_multiplier_rejected() {
        let closes = [10.0, 12.0, 11.0, 13.0, 14.0];
        let params = BollingerParams {
            period: Period::new(5).unwrap(),
            std_dev_multiplier: -2.0,
        };
        assert!(matches!(
            bollinger(&closes, params),
            Err(AnalysisError::InvalidConfig(_))
        ));

        let params = BollingerParams {
            std_dev_multiplier: f64::NAN,
            ..params
        };
        assert!(matches!(
            bollinger(&closes, params),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }
}
