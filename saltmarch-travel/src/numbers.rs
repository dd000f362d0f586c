//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Floor a f64 and clamp it to the u32 range, returning 0 for NaN or negative values.
#[must_use]
pub fn floor_f64_to_u32(value: f64) -> u32 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    let max = f64::from(u32::MAX);
    cast::<f64, u32>(value.min(max).floor()).unwrap_or(0)
}

/// Round a f64 and clamp it to the u32 range, returning 0 for NaN or negative values.
#[must_use]
pub fn round_f64_to_u32(value: f64) -> u32 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    let max = f64::from(u32::MAX);
    cast::<f64, u32>(value.min(max).round()).unwrap_or(0)
}

/// Round a f64 and clamp it to the i32 range, returning 0 for NaN values.
#[must_use]
pub fn round_f64_to_i32(value: f64) -> i32 {
    if value.is_nan() {
        return 0;
    }
    let min = f64::from(i32::MIN);
    let max = f64::from(i32::MAX);
    cast::<f64, i32>(value.clamp(min, max).round()).unwrap_or(0)
}

/// Floor a f64 into a slice index, saturating at `len - 1`.
#[must_use]
pub fn floor_f64_to_index(value: f64, len: usize) -> usize {
    if len == 0 || value.is_nan() || value <= 0.0 {
        return 0;
    }
    let idx = cast::<f64, usize>(value.floor()).unwrap_or(usize::MAX);
    idx.min(len - 1)
}

/// Convert a length into f64 while allowing precision loss in a single location.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Convert a u64 into f64 while allowing precision loss in a single location.
#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_and_round_reject_negative_and_nan() {
        assert_eq!(floor_f64_to_u32(-3.2), 0);
        assert_eq!(floor_f64_to_u32(f64::NAN), 0);
        assert_eq!(floor_f64_to_u32(2.999), 2);
        assert_eq!(round_f64_to_u32(59.5), 60);
        assert_eq!(round_f64_to_u32(f64::INFINITY), u32::MAX);
    }

    #[test]
    fn signed_rounding_clamps() {
        assert_eq!(round_f64_to_i32(-1.6), -2);
        assert_eq!(round_f64_to_i32(f64::from(i32::MAX) * 2.0), i32::MAX);
        assert_eq!(round_f64_to_i32(f64::NAN), 0);
    }

    #[test]
    fn index_saturates_at_last_element() {
        assert_eq!(floor_f64_to_index(2.7, 5), 2);
        assert_eq!(floor_f64_to_index(9.0, 5), 4);
        assert_eq!(floor_f64_to_index(1.0, 0), 0);
    }
}
