//! Physical range calculation
//!
//! Derives the plausible physical min/max of a signal from its raw bit width,
//! signedness and linear scaling. All arithmetic is done in `f64`, so widths
//! close to 64 bits lose integer precision.

use crate::types::{DbcError, Result};

/// Compute the physical `(min, max)` reachable by a signal.
///
/// The raw range is `[0, 2^len - 1]` for unsigned signals and
/// `[-2^(len-1), 2^(len-1) - 1]` for signed ones; both ends are mapped
/// through `raw * factor + offset`.
///
/// # Example
/// ```
/// use dbc_core::physical_range;
///
/// assert_eq!(physical_range(8, false, 1.0, 0.0).unwrap(), (0.0, 255.0));
/// assert!(physical_range(0, false, 1.0, 0.0).is_err());
/// ```
pub fn physical_range(length: u32, signed: bool, factor: f64, offset: f64) -> Result<(f64, f64)> {
    if !(1..=64).contains(&length) {
        return Err(DbcError::InvalidBitLength(length));
    }

    let (raw_min, raw_max) = if signed {
        let half = 2f64.powi(length as i32 - 1);
        (-half, half - 1.0)
    } else {
        (0.0, 2f64.powi(length as i32) - 1.0)
    };

    Ok((raw_min * factor + offset, raw_max * factor + offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsigned_byte() {
        assert_eq!(physical_range(8, false, 1.0, 0.0).unwrap(), (0.0, 255.0));
    }

    #[test]
    fn test_signed_scaled_with_offset() {
        let (min, max) = physical_range(16, true, 0.1, -10.0).unwrap();
        assert_eq!(min, -10.0 + (-32768.0 * 0.1));
        assert_eq!(max, -10.0 + (32767.0 * 0.1));
    }

    #[test]
    fn test_half_scale_with_offset() {
        let (min, max) = physical_range(8, false, 0.5, 1.0).unwrap();
        assert_eq!(min, 1.0);
        assert_eq!(max, 1.0 + 255.0 * 0.5);
    }

    #[test]
    fn test_single_bit() {
        assert_eq!(physical_range(1, false, 1.0, 0.0).unwrap(), (0.0, 1.0));
        assert_eq!(physical_range(1, true, 1.0, 0.0).unwrap(), (-1.0, 0.0));
    }

    #[test]
    fn test_wide_signals_stay_finite() {
        let (min, max) = physical_range(32, true, 1.0, 0.0).unwrap();
        assert_eq!(min, -2147483648.0);
        assert_eq!(max, 2147483647.0);

        let (min, max) = physical_range(64, false, 1.0, 0.0).unwrap();
        assert_eq!(min, 0.0);
        assert!(max.is_finite());
        // 2^64 - 1 is not representable; the f64 result rounds up to 2^64
        assert_eq!(max, 18446744073709551616.0);
    }

    #[test]
    fn test_negative_factor_keeps_order() {
        let (min, max) = physical_range(8, false, -1.0, 0.0).unwrap();
        assert_eq!(min, 0.0);
        assert_eq!(max, -255.0);
    }

    #[test]
    fn test_invalid_lengths() {
        assert!(matches!(
            physical_range(0, false, 1.0, 0.0),
            Err(DbcError::InvalidBitLength(0))
        ));
        assert!(matches!(
            physical_range(65, true, 1.0, 0.0),
            Err(DbcError::InvalidBitLength(65))
        ));
    }
}
