//! Linear range mapping from pose angles to MIDI data values.

use crate::utils::safe_cast::f64_to_i32_clamp;

/// Map `value` from `[in_min, in_max]` onto `[out_min, out_max]`.
///
/// The input is clamped to the input range first (callers are expected to
/// pass `in_min <= in_max`), the interpolated result is truncated toward
/// zero, and the output is clamped to the closed interval spanned by the
/// two output bounds in whichever order they were given. A degenerate input
/// range (`in_min == in_max`) and a NaN input both map to `out_min`.
///
/// # Examples
///
/// ```
/// use head_pose_midi::mapping::map_value;
///
/// assert_eq!(map_value(15.0, -30.0, 30.0, 0, 127), 95);
/// assert_eq!(map_value(-200.0, -30.0, 30.0, 0, 127), 0);
/// assert_eq!(map_value(5.0, 10.0, 10.0, 0, 127), 0);
/// ```
#[must_use]
pub fn map_value(value: f64, in_min: f64, in_max: f64, out_min: i32, out_max: i32) -> i32 {
    if value.is_nan() {
        return out_min;
    }

    let value = value.min(in_max).max(in_min);

    let input_range = in_max - in_min;
    if input_range == 0.0 {
        return out_min;
    }

    let normalized = (value - in_min) / input_range;
    let output = normalized * f64::from(out_max - out_min) + f64::from(out_min);

    f64_to_i32_clamp(output, out_min, out_max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_map_value_midpoints() {
        assert_eq!(map_value(0.0, -30.0, 30.0, 0, 127), 63);
        assert_eq!(map_value(15.0, -30.0, 30.0, 0, 127), 95);
        assert_eq!(map_value(30.0, -30.0, 30.0, 0, 127), 127);
        assert_eq!(map_value(-30.0, -30.0, 30.0, 0, 127), 0);
    }

    #[test]
    fn test_map_value_clamps_input() {
        assert_eq!(map_value(-130.0, -30.0, 30.0, 0, 127), 0);
        assert_eq!(map_value(130.0, -30.0, 30.0, 0, 127), 127);
        assert_eq!(map_value(f64::INFINITY, -30.0, 30.0, 0, 127), 127);
    }

    #[test]
    fn test_map_value_degenerate_range() {
        assert_eq!(map_value(5.0, 10.0, 10.0, 0, 127), 0);
        assert_eq!(map_value(50.0, 10.0, 10.0, 20, 100), 20);
    }

    #[test]
    fn test_map_value_reversed_output() {
        // Inverted output: larger angles give smaller values
        assert_eq!(map_value(-30.0, -30.0, 30.0, 127, 0), 127);
        assert_eq!(map_value(30.0, -30.0, 30.0, 127, 0), 0);
        let mid = map_value(0.0, -30.0, 30.0, 127, 0);
        assert!((0..=127).contains(&mid));
    }

    #[test]
    fn test_map_value_nan() {
        assert_eq!(map_value(f64::NAN, -30.0, 30.0, 10, 127), 10);
    }

    proptest! {
        #[test]
        fn prop_map_value_within_output_bounds(
            value in -1000.0f64..1000.0,
            in_min in -90.0f64..0.0,
            span in 0.0f64..180.0,
            out_a in 0i32..=127,
            out_b in 0i32..=127
        ) {
            let out = map_value(value, in_min, in_min + span, out_a, out_b);
            prop_assert!(out >= out_a.min(out_b));
            prop_assert!(out <= out_a.max(out_b));
        }

        #[test]
        fn prop_map_value_monotonic(
            a in -100.0f64..100.0,
            b in -100.0f64..100.0,
            in_min in -90.0f64..0.0,
            span in 0.1f64..180.0
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let in_max = in_min + span;
            prop_assert!(map_value(lo, in_min, in_max, 0, 127) <= map_value(hi, in_min, in_max, 0, 127));
        }

        #[test]
        fn prop_map_value_clamps_outside_range(in_min in -90.0f64..0.0, span in 0.1f64..180.0) {
            let in_max = in_min + span;
            prop_assert_eq!(map_value(in_min - 100.0, in_min, in_max, 0, 127), 0);
            prop_assert_eq!(map_value(in_max + 100.0, in_min, in_max, 0, 127), 127);
        }
    }
}
