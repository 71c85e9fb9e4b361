//
// Dometrack - Telescope dome following
// Copyright (c) 2026 Filip Szczerek <ga.software@yahoo.com>
//
// This project is licensed under the terms of the MIT license
// (see the LICENSE file for details).
//

//!
//! Angle utilities (all values in degrees).
//!

pub const FULL_CIRCLE: f64 = 360.0;

/// Returns `angle` wrapped into [0, 360).
pub fn wrap_nonnegative(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(FULL_CIRCLE);
    // `rem_euclid` of a tiny negative value rounds up to exactly 360
    if wrapped >= FULL_CIRCLE { 0.0 } else { wrapped }
}

/// Returns the shortest signed angular distance `a - b`, wrapped into (-180, 180].
///
/// NaN inputs yield NaN.
pub fn wrapped_diff(a: f64, b: f64) -> f64 {
    let diff = wrap_nonnegative(a - b);
    if diff > FULL_CIRCLE / 2.0 { diff - FULL_CIRCLE } else { diff }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn given_angle_wrap_into_nonnegative_range() {
        assert_relative_eq!(10.0, wrap_nonnegative(10.0));
        assert_relative_eq!(350.0, wrap_nonnegative(-10.0));
        assert_relative_eq!(5.0, wrap_nonnegative(725.0));
        assert_relative_eq!(0.0, wrap_nonnegative(360.0));
        assert_relative_eq!(0.0, wrap_nonnegative(-720.0));
    }

    #[test]
    fn given_tiny_negative_angle_wrap_below_full_circle() {
        let wrapped = wrap_nonnegative(-1.0e-17);
        assert!(wrapped >= 0.0 && wrapped < FULL_CIRCLE);
    }

    #[test]
    fn given_angles_across_zero_diff_is_short_way_round() {
        assert_relative_eq!(-2.0, wrapped_diff(359.0, 1.0));
        assert_relative_eq!(2.0, wrapped_diff(1.0, 359.0));
        assert_relative_eq!(10.0, wrapped_diff(10.0, 0.0));
        assert_relative_eq!(-10.0, wrapped_diff(-370.0, 0.0));
    }

    #[test]
    fn given_opposite_angles_diff_is_positive_half_circle() {
        assert_relative_eq!(180.0, wrapped_diff(180.0, 0.0));
        assert_relative_eq!(180.0, wrapped_diff(0.0, 180.0));
    }

    #[test]
    fn given_nan_diff_is_nan() {
        assert!(wrapped_diff(f64::NAN, 0.0).is_nan());
        assert!(wrapped_diff(0.0, f64::NAN).is_nan());
    }
}
