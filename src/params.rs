//! Parameter metadata for pattern rules
//!
//! Tunable rules describe their thresholds so callers can build them from a
//! plain `name -> value` map or sweep a grid of values.
//!
//! # Example
//!
//! ```rust
//! use candlecast::params::{ParamMeta, ParamType, ParameterizedDetector};
//! use candlecast::prelude::*;
//!
//! for param in HammerDetector::param_meta() {
//!     println!("{}: {:?} (default: {})", param.name, param.param_type, param.default);
//! }
//! ```

use std::collections::HashMap;

use crate::{AnalysisError, Ratio, Result};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// Fraction of a candle range or body, 0.0..=1.0
    Ratio,
    /// Positive multiplier, may exceed 1.0 (e.g. shadow >= 2x body)
    Factor,
}

/// Metadata for a single rule parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
    /// Parameter name (e.g., "shadow_factor")
    pub name: &'static str,
    pub param_type: ParamType,
    pub default: f64,
    /// Range for optimization: (min, max, step)
    pub range: (f64, f64, f64),
    pub description: &'static str,
}

impl ParamMeta {
    pub const fn ratio(
        name: &'static str,
        default: f64,
        range: (f64, f64, f64),
        description: &'static str,
    ) -> Self {
        Self {
            name,
            param_type: ParamType::Ratio,
            default,
            range,
            description,
        }
    }

    pub const fn factor(
        name: &'static str,
        default: f64,
        range: (f64, f64, f64),
        description: &'static str,
    ) -> Self {
        Self {
            name,
            param_type: ParamType::Factor,
            default,
            range,
            description,
        }
    }

    /// Generate all values for grid search
    pub fn generate_grid(&self) -> Vec<f64> {
        let (min, max, step) = self.range;
        if step <= 0.0 || max < min {
            return vec![min];
        }
        // index-based so no step error accumulates across the sweep
        let steps = ((max - min) / step + 1e-9).floor() as usize;
        (0..=steps)
            .map(|i| (min + i as f64 * step).min(max))
            .collect()
    }

    /// Validate a value for this parameter
    pub fn validate(&self, value: f64) -> Result<()> {
        let (min, max, _) = self.range;
        if value < min || value > max {
            return Err(AnalysisError::OutOfRange {
                field: self.name,
                value,
                min,
                max,
            });
        }
        match self.param_type {
            ParamType::Ratio => Ratio::new(value).map(|_| ()),
            ParamType::Factor => check_factor(value).map(|_| ()),
        }
    }
}

// ============================================================
// PARAMETERIZED DETECTOR TRAIT
// ============================================================

/// Rules that can be built from a parameter map.
pub trait ParameterizedDetector: Sized {
    /// Returns metadata for all configurable parameters
    fn param_meta() -> &'static [ParamMeta];

    /// Missing parameters use their default values.
    fn with_params(params: &HashMap<&str, f64>) -> Result<Self>;

    fn pattern_id_str() -> &'static str;
}

// ============================================================
// PARAMETER VALUE HELPERS
// ============================================================

/// Helper to get a Ratio from params with default fallback
pub fn get_ratio(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<Ratio> {
    let value = params.get(key).copied().unwrap_or(default);
    Ratio::new(value)
}

/// Helper to get a positive multiplier from params with default fallback
pub fn get_factor(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<f64> {
    check_factor(params.get(key).copied().unwrap_or(default))
}

/// A multiplier must be finite and positive
pub(crate) fn check_factor(value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(AnalysisError::InvalidValue(
            "Factor cannot be NaN or infinite",
        ));
    }
    if value <= 0.0 {
        return Err(AnalysisError::InvalidValue("Factor must be > 0"));
    }
    Ok(value)
}

// ============================================================
// TESTS
// ============================================================
