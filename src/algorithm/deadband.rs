//
// Dometrack - Telescope dome following
// Copyright (c) 2026 Filip Szczerek <ga.software@yahoo.com>
//
// This project is licensed under the terms of the MIT license
// (see the LICENSE file for details).
//

//!
//! Deadband algorithms.
//!
//! If the difference between the telescope and dome position on an axis exceeds the configured maximum, the dome
//! is commanded to the telescope's position on that axis; otherwise the axis is left alone. The test is applied
//! independently to each axis.
//!

use crate::algorithm::{elevation_target, exceeds, DomeTarget, FollowingConfig, MotionAlgorithm};
use crate::angle;
use crate::telemetry::{DomePointing, TelescopePointing};

/// Compares the raw wrapped azimuth difference with the deadband.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct DeadbandAlgorithm;

/// Compares the on-sky azimuth separation (azimuth difference scaled by cos(telescope elevation)) with
/// the deadband, so that the dome moves less often near the zenith.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ScaledDeadbandAlgorithm;

impl MotionAlgorithm for DeadbandAlgorithm {
    fn decide(&self, telescope: &TelescopePointing, dome: &DomePointing, config: &FollowingConfig) -> Option<DomeTarget> {
        let az_error = angle::wrapped_diff(telescope.azimuth_deg, dome.azimuth_deg);

        DomeTarget::new(
            if exceeds(az_error, config.max_delta_azimuth_deg) { Some(telescope.azimuth_deg) } else { None },
            elevation_target(telescope, dome, config)
        )
    }
}

impl MotionAlgorithm for ScaledDeadbandAlgorithm {
    fn decide(&self, telescope: &TelescopePointing, dome: &DomePointing, config: &FollowingConfig) -> Option<DomeTarget> {
        // NaN elevation makes the scaled error NaN too, which suppresses the azimuth axis
        let az_error = angle::wrapped_diff(telescope.azimuth_deg, dome.azimuth_deg)
            * telescope.elevation_deg.to_radians().cos();

        DomeTarget::new(
            if exceeds(az_error, config.max_delta_azimuth_deg) { Some(telescope.azimuth_deg) } else { None },
            elevation_target(telescope, dome, config)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn telescope(az: f64, el: f64) -> TelescopePointing { TelescopePointing::new(az, el) }

    fn dome(az: f64, el: f64) -> DomePointing { DomePointing::new(az, el, Some(1.0)) }

    fn config(enable_elevation_motion: bool) -> FollowingConfig {
        FollowingConfig{
            max_delta_azimuth_deg: 3.5,
            max_delta_elevation_deg: 4.0,
            enable_elevation_motion,
            ..Default::default()
        }
    }

    #[test]
    fn given_azimuth_outside_deadband_move_to_telescope_azimuth() {
        let target = DeadbandAlgorithm.decide(&telescope(10.0, 45.0), &dome(0.0, 45.0), &config(false)).unwrap();
        assert_relative_eq!(10.0, target.azimuth_deg().unwrap());
        assert_eq!(None, target.elevation_deg());
    }

    #[test]
    fn given_azimuth_inside_deadband_no_target() {
        assert_eq!(None, DeadbandAlgorithm.decide(&telescope(2.0, 45.0), &dome(0.0, 45.0), &config(false)));
        assert_eq!(None, DeadbandAlgorithm.decide(&telescope(-3.0, 45.0), &dome(0.0, 45.0), &config(false)));
    }

    #[test]
    fn given_azimuths_across_zero_use_wrapped_error() {
        assert_eq!(None, DeadbandAlgorithm.decide(&telescope(359.0, 45.0), &dome(1.0, 45.0), &config(false)));
        assert_eq!(None, DeadbandAlgorithm.decide(&telescope(-1.0, 45.0), &dome(1.0, 45.0), &config(false)));

        let target = DeadbandAlgorithm.decide(&telescope(355.0, 45.0), &dome(1.0, 45.0), &config(false)).unwrap();
        assert_relative_eq!(355.0, target.azimuth_deg().unwrap());
    }

    #[test]
    fn given_unwrapped_telescope_azimuth_target_is_normalized() {
        let target = DeadbandAlgorithm.decide(&telescope(-20.0, 45.0), &dome(0.0, 45.0), &config(false)).unwrap();
        assert_relative_eq!(340.0, target.azimuth_deg().unwrap());

        let target = DeadbandAlgorithm.decide(&telescope(370.0, 45.0), &dome(0.0, 45.0), &config(false)).unwrap();
        assert_relative_eq!(10.0, target.azimuth_deg().unwrap());
    }

    #[test]
    fn given_azimuth_exactly_at_deadband_no_target() {
        assert_eq!(None, DeadbandAlgorithm.decide(&telescope(3.5, 45.0), &dome(0.0, 45.0), &config(false)));
    }

    #[test]
    fn given_random_azimuth_pairs_target_iff_error_exceeds_deadband() {
        let config = config(false);
        // deterministic sweep over pairs, including unwrapped telescope azimuths
        for i in 0..720 {
            let tel_az = -540.0 + i as f64 * 1.53;
            for j in 0..36 {
                let dome_az = j as f64 * 10.0 + 0.25;
                let error = angle::wrapped_diff(tel_az, dome_az);
                let target = DeadbandAlgorithm.decide(&telescope(tel_az, 45.0), &dome(dome_az, 45.0), &config);
                assert_eq!(error.abs() > config.max_delta_azimuth_deg, target.is_some(), "{} vs {}", tel_az, dome_az);
                if let Some(target) = target {
                    let az = target.azimuth_deg().unwrap();
                    assert!(az >= 0.0 && az < 360.0);
                    assert_relative_eq!(angle::wrap_nonnegative(tel_az), az);
                }
            }
        }
    }

    #[test]
    fn given_elevation_motion_disabled_never_command_elevation() {
        for el_error in [0.0, 5.0, 30.0, 89.0] {
            let target = DeadbandAlgorithm.decide(&telescope(50.0, el_error), &dome(0.0, 0.0), &config(false));
            assert_eq!(None, target.unwrap().elevation_deg());
        }
        assert_eq!(None, DeadbandAlgorithm.decide(&telescope(0.0, 80.0), &dome(0.0, 0.0), &config(false)));
    }

    #[test]
    fn given_elevation_motion_enabled_command_elevation_outside_deadband() {
        let target = DeadbandAlgorithm.decide(&telescope(0.0, 60.0), &dome(0.0, 50.0), &config(true)).unwrap();
        assert_eq!(None, target.azimuth_deg());
        assert_eq!(Some(60.0), target.elevation_deg());

        assert_eq!(None, DeadbandAlgorithm.decide(&telescope(0.0, 53.0), &dome(0.0, 50.0), &config(true)));
    }

    #[test]
    fn given_nan_telescope_azimuth_never_command_azimuth() {
        let target = DeadbandAlgorithm.decide(&telescope(f64::NAN, 60.0), &dome(0.0, 10.0), &config(true)).unwrap();
        assert_eq!(None, target.azimuth_deg());
        assert_eq!(Some(60.0), target.elevation_deg());

        assert_eq!(None, DeadbandAlgorithm.decide(&telescope(f64::NAN, 10.0), &dome(0.0, 10.0), &config(true)));
    }

    #[test]
    fn given_nan_telescope_elevation_never_command_elevation() {
        let target = DeadbandAlgorithm.decide(&telescope(90.0, f64::NAN), &dome(0.0, 10.0), &config(true)).unwrap();
        assert_relative_eq!(90.0, target.azimuth_deg().unwrap());
        assert_eq!(None, target.elevation_deg());
    }

    #[test]
    fn given_nan_dome_azimuth_never_command_azimuth() {
        assert_eq!(None, DeadbandAlgorithm.decide(&telescope(90.0, 10.0), &dome(f64::NAN, 10.0), &config(true)));
    }

    #[test]
    fn given_identical_inputs_decision_is_identical() {
        let (t, d, c) = (telescope(123.0, 30.0), dome(10.0, 0.0), config(true));
        assert_eq!(DeadbandAlgorithm.decide(&t, &d, &c), DeadbandAlgorithm.decide(&t, &d, &c));
        assert_eq!(ScaledDeadbandAlgorithm.decide(&t, &d, &c), ScaledDeadbandAlgorithm.decide(&t, &d, &c));
    }

    #[test]
    fn given_high_elevation_scaled_error_stays_inside_deadband() {
        // 10 deg of azimuth at 80 deg elevation is ~1.7 deg on the sky
        assert_eq!(None, ScaledDeadbandAlgorithm.decide(&telescope(10.0, 80.0), &dome(0.0, 80.0), &config(false)));

        let target = DeadbandAlgorithm.decide(&telescope(10.0, 80.0), &dome(0.0, 80.0), &config(false)).unwrap();
        assert_relative_eq!(10.0, target.azimuth_deg().unwrap());

        let target = ScaledDeadbandAlgorithm.decide(&telescope(10.0, 20.0), &dome(0.0, 20.0), &config(false)).unwrap();
        assert_relative_eq!(10.0, target.azimuth_deg().unwrap());
    }

    #[test]
    fn given_nan_elevation_scaled_algorithm_never_commands_azimuth() {
        assert_eq!(
            None,
            ScaledDeadbandAlgorithm.decide(&telescope(90.0, f64::NAN), &dome(0.0, 10.0), &config(true))
        );
    }
}
