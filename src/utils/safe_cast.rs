//! Safe casting utilities for pixel values

/// Round to the nearest integer pixel, saturating at the i32 range
///
/// Non-finite values map to 0.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Clamping ensures safe truncation
pub fn f64_to_i32_round(value: f64) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    value.round().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
}

/// Convert a pixel dimension to f64
#[must_use]
pub fn u32_to_f64(value: u32) -> f64 {
    f64::from(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_f64_to_i32_round() {
        assert_eq!(f64_to_i32_round(2334.6), 2335);
        assert_eq!(f64_to_i32_round(0.49), 0);
        assert_eq!(f64_to_i32_round(-3.6), -4);
        assert_eq!(f64_to_i32_round(f64::NAN), 0);
        assert_eq!(f64_to_i32_round(f64::INFINITY), 0);
        assert_eq!(f64_to_i32_round(1e12), i32::MAX);
        assert_eq!(f64_to_i32_round(-1e12), i32::MIN);
    }

    #[test]
    fn test_u32_to_f64() {
        assert_eq!(u32_to_f64(320), 320.0);
        assert_eq!(u32_to_f64(u32::MAX), 4294967295.0);
    }

    proptest! {
        #[test]
        fn prop_round_within_half_pixel(value in -1e6f64..1e6) {
            let rounded = f64_to_i32_round(value);
            prop_assert!((f64::from(rounded) - value).abs() <= 0.5);
        }
    }
}
