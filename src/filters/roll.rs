use super::{exponential::ExponentialFilter, AngleFilter};
use crate::constants::{DEFAULT_JUMP_THRESHOLD, DEFAULT_SMOOTHING_FACTOR, HALF_TURN, ROLL_WRAP_LIMIT};
use log::debug;

/// Fold a solver angle into [-90°, 90°].
///
/// The rotation decomposition is only defined up to a half turn for roll,
/// so a reading of 170° and one of -10° describe the same tilt. Inputs are
/// expected in (-180°, 180°].
#[must_use]
pub fn normalize_wrap(raw: f64) -> f64 {
    if raw > ROLL_WRAP_LIMIT {
        raw - HALF_TURN
    } else if raw < -ROLL_WRAP_LIMIT {
        raw + HALF_TURN
    } else {
        raw
    }
}

/// Roll stabiliser: wrap folding, jump rejection, then exponential smoothing.
///
/// A sample that differs from the previous output by more than the jump
/// threshold is dropped and the previous output is returned unchanged.
pub struct RollFilter {
    smoother: ExponentialFilter,
    jump_threshold: f64,
}

impl RollFilter {
    /// Create a roll filter with the default smoothing factor and jump threshold
    #[must_use]
    pub fn new() -> Self {
        Self::with_params(DEFAULT_SMOOTHING_FACTOR, DEFAULT_JUMP_THRESHOLD)
    }

    /// Create a roll filter with explicit parameters
    ///
    /// # Panics
    ///
    /// Panics if `alpha` is not in (0, 1] or `jump_threshold` is not positive
    #[must_use]
    pub fn with_params(alpha: f64, jump_threshold: f64) -> Self {
        assert!(jump_threshold > 0.0, "Jump threshold must be positive");
        Self {
            smoother: ExponentialFilter::new(alpha),
            jump_threshold,
        }
    }

    /// Filter a sample that is already folded into [-90°, 90°]
    pub fn filter_normalized(&mut self, value: f64) -> f64 {
        let Some(previous) = self.smoother.last() else {
            if !value.is_finite() {
                return value;
            }
            return self.smoother.apply(value);
        };

        if !value.is_finite() {
            return previous;
        }

        let diff = (value - previous).abs();
        if diff > self.jump_threshold {
            debug!("Rejected roll jump of {diff:.1}° ({previous:.1}° -> {value:.1}°)");
            return previous;
        }

        self.smoother.apply(value)
    }

    /// Previous filtered value, if any
    #[must_use]
    pub const fn previous(&self) -> Option<f64> {
        self.smoother.last()
    }
}

impl Default for RollFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl AngleFilter for RollFilter {
    fn apply(&mut self, value: f64) -> f64 {
        self.filter_normalized(normalize_wrap(value))
    }

    fn reset(&mut self) {
        self.smoother.reset();
    }

    fn name(&self) -> &str {
        "RollFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_wrap() {
        assert_eq!(normalize_wrap(0.0), 0.0);
        assert_eq!(normalize_wrap(90.0), 90.0);
        assert_eq!(normalize_wrap(-90.0), -90.0);
        assert_eq!(normalize_wrap(170.0), -10.0);
        assert_eq!(normalize_wrap(-170.0), 10.0);
        assert_eq!(normalize_wrap(180.0), 0.0);
    }

    #[test]
    fn test_first_sample_adopted() {
        let mut filter = RollFilter::new();
        assert_eq!(filter.previous(), None);
        assert_eq!(filter.apply(25.0), 25.0);
        assert_eq!(filter.previous(), Some(25.0));
    }

    #[test]
    fn test_jump_rejected() {
        let mut filter = RollFilter::new();
        filter.apply(0.0);
        assert_eq!(filter.apply(61.0), 0.0);
        assert_eq!(filter.previous(), Some(0.0));
    }

    #[test]
    fn test_small_step_smoothed() {
        let mut filter = RollFilter::new();
        filter.apply(0.0);
        let out = filter.apply(59.0);
        assert!((out - 17.7).abs() < 1e-9);
    }

    #[test]
    fn test_wrapped_flip_is_not_a_jump() {
        let mut filter = RollFilter::new();
        filter.apply(-5.0);
        // 178° folds to -2°, a 3° move
        let out = filter.apply(178.0);
        assert!((out - (-5.0 + 0.3 * 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_sample_ignored() {
        let mut filter = RollFilter::new();
        filter.apply(10.0);
        assert_eq!(filter.apply(f64::NAN), 10.0);
        assert_eq!(filter.previous(), Some(10.0));
    }

    #[test]
    fn test_reset_clears_previous() {
        let mut filter = RollFilter::new();
        filter.apply(10.0);
        filter.reset();
        assert_eq!(filter.apply(80.0), 80.0);
    }

    proptest! {
        #[test]
        fn prop_normalize_wrap_in_half_range(raw in -179.999f64..=180.0) {
            let folded = normalize_wrap(raw);
            prop_assert!((-90.0..=90.0).contains(&folded));
            let delta = (raw - folded).abs();
            prop_assert!(delta == 0.0 || (delta - 180.0).abs() < 1e-9);
        }

        #[test]
        fn prop_repeated_input_converges(value in -90.0f64..=90.0) {
            let mut filter = RollFilter::new();
            let first = filter.apply(value);
            let second = filter.apply(value);
            prop_assert_eq!(first, value);
            prop_assert_eq!(second, value);
        }
    }
}
