//! Simple Moving Average (SMA).
//!
//! Trailing arithmetic mean of closes over `period` values, inclusive of the
//! current one. Where fewer than `period` values exist the average is absent
//! (`None`), never zero.

/// Mean of the last `period` values, or `None` if there are fewer than
/// `period` values, `period` is zero, or the window holds a non-finite value.
pub fn trailing_mean(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let window = &values[values.len() - period..];
    if window.iter().any(|v| !v.is_finite()) {
        return None;
    }
    Some(window.iter().sum::<f64>() / period as f64)
}

/// SMA for every index: `None` for the first `period - 1` entries.
pub fn sma_series(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];
    if period == 0 || n < period {
        return result;
    }

    // Compute initial window sum
    let mut sum: f64 = values[..period].iter().sum();
    result[period - 1] = finite_mean(sum, &values[..period], period);

    // Roll the window forward
    for i in period..n {
        sum = sum - values[i - period] + values[i];
        let window = &values[(i + 1 - period)..=i];
        if !sum.is_finite() {
            // Recompute: a non-finite value left the window
            sum = window.iter().sum();
        }
        result[i] = finite_mean(sum, window, period);
    }

    result
}

fn finite_mean(sum: f64, window: &[f64], period: usize) -> Option<f64> {
    if window.iter().all(|v| v.is_finite()) {
        Some(sum / period as f64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn sma_5_basic() {
        let closes = [10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0];
        let result = sma_series(&closes, 5);

        assert_eq!(result.len(), 7);
        for (i, v) in result.iter().enumerate().take(4) {
            assert!(v.is_none(), "expected None at index {i}");
        }
        // SMA[4] = mean(10,11,12,13,14) = 12.0
        assert_approx(result[4].unwrap(), 12.0, DEFAULT_EPSILON);
        // SMA[5] = mean(11,12,13,14,15) = 13.0
        assert_approx(result[5].unwrap(), 13.0, DEFAULT_EPSILON);
        // SMA[6] = mean(12,13,14,15,16) = 14.0
        assert_approx(result[6].unwrap(), 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn trailing_mean_matches_last_series_value() {
        let closes: Vec<f64> = (1..=60).map(f64::from).collect();
        let series = sma_series(&closes, 20);
        assert_eq!(trailing_mean(&closes, 20), *series.last().unwrap());
        // mean(41..=60) = 50.5
        assert_approx(trailing_mean(&closes, 20).unwrap(), 50.5, DEFAULT_EPSILON);
        assert_approx(trailing_mean(&closes, 50).unwrap(), 35.5, DEFAULT_EPSILON);
    }

    #[test]
    fn too_few_values_is_absent() {
        let closes = [10.0; 49];
        assert_eq!(trailing_mean(&closes, 50), None);
        assert!(sma_series(&closes, 50).iter().all(Option::is_none));
        assert!(trailing_mean(&closes, 20).is_some());
    }

    #[test]
    fn exactly_period_values() {
        let closes = [2.0, 4.0, 6.0];
        assert_eq!(trailing_mean(&closes, 3), Some(4.0));
    }

    #[test]
    fn zero_period_is_absent() {
        assert_eq!(trailing_mean(&[1.0, 2.0], 0), None);
        assert_eq!(sma_series(&[1.0, 2.0], 0), vec![None, None]);
    }

    #[test]
    fn nan_poisons_only_windows_that_contain_it() {
        let closes = [10.0, 11.0, f64::NAN, 13.0, 14.0, 15.0];
        let result = sma_series(&closes, 3);
        assert!(result[2].is_none());
        assert!(result[3].is_none());
        assert!(result[4].is_none());
        // Window [13,14,15] → 14.0
        assert_approx(result[5].unwrap(), 14.0, DEFAULT_EPSILON);
    }
}
