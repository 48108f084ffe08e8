//! Safe numeric conversions for MIDI data bytes and mapped values

/// Truncate toward zero and clamp into `[min, max]` (bounds may be given in either order)
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Clamping ensures safe truncation
pub fn f64_to_i32_clamp(value: f64, min: i32, max: i32) -> i32 {
    let (min, max) = if min <= max { (min, max) } else { (max, min) };

    if !value.is_finite() {
        return min;
    }

    let clamped = value.trunc().clamp(f64::from(min), f64::from(max));
    (clamped as i32).clamp(min, max)
}

/// Clamp an integer into `0..=max` and narrow it to a byte
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Clamped to u8 range first
pub fn i64_to_u8_clamp(value: i64, max: u8) -> u8 {
    value.clamp(0, i64::from(max)) as u8
}
