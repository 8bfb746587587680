//! Candlestick pattern rules
//!
//! Each rule is a small config struct implementing [`crate::PatternDetector`]:
//! a pure function of the trailing candles and the trend that preceded them.
//!
//! # Pattern Categories
//!
//! - **Single-candle (8)**: Doji, Dragonfly/Gravestone Doji, Spinning Top, Hammer family
//! - **Two-candle (6)**: Engulfing, Piercing Line, Dark Cloud Cover, Harami
//! - **Three-candle (4)**: Morning/Evening Star, Three White Soldiers, Three Black Crows

pub mod helpers;

/// Generate `with_defaults()` -> `Self::default()` for multiple detector types.
macro_rules! impl_with_defaults {
  ($($detector:ty),* $(,)?) => {
    $(impl $detector {
      pub fn with_defaults() -> Self { Self::default() }
    })*
  };
}

pub mod single_bar;
pub mod three_bar;
pub mod two_bar;

// Re-export all detectors for convenience
pub use helpers::{PinBarShape, PinSide, ShadowTolerance};
pub use single_bar::*;
pub use three_bar::*;
pub use two_bar::*;
