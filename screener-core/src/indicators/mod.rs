//! Indicators computed locally from fetched history.

pub mod sma;

pub use sma::{sma_series, trailing_mean};

/// Tolerance for floating-point comparisons in indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "expected {expected}, got {actual} (epsilon {epsilon})"
    );
}
