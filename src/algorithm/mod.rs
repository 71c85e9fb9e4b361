//
// Dometrack - Telescope dome following
// Copyright (c) 2026 Filip Szczerek <ga.software@yahoo.com>
//
// This project is licensed under the terms of the MIT license
// (see the LICENSE file for details).
//

//!
//! Dome motion algorithms.
//!
//! An algorithm is a pure function of the latest telescope and dome pointing; it decides whether the dome needs
//! to move and where to. Algorithms are selected by name at configuration time (see `Algorithm::from_name`).
//!

mod deadband;

pub use deadband::{DeadbandAlgorithm, ScaledDeadbandAlgorithm};

use crate::angle;
use crate::config::ConfigError;
use crate::gateway::Axis;
use crate::telemetry::{DomePointing, TelescopePointing};
use enum_dispatch::enum_dispatch;
use std::str::FromStr;
use strum::IntoEnumIterator;

pub const DEFAULT_ALGORITHM_NAME: &str = "deadband";
pub const DEFAULT_MAX_DELTA_AZIMUTH: f64 = 3.5;
pub const DEFAULT_MAX_DELTA_ELEVATION: f64 = 4.0;

/// Position the dome should be commanded to. An axis set to `None` is not to be commanded.
///
/// Both axes are never `None` at the same time, and a present value is always finite.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DomeTarget {
    azimuth_deg: Option<f64>,
    elevation_deg: Option<f64>
}

impl DomeTarget {
    /// Creates a target from the finite values among `azimuth_deg` and `elevation_deg`; azimuth is wrapped into
    /// [0, 360).
    ///
    /// Returns `None` if no axis is left to be commanded.
    pub fn new(azimuth_deg: Option<f64>, elevation_deg: Option<f64>) -> Option<DomeTarget> {
        let azimuth_deg = azimuth_deg.filter(|az| az.is_finite()).map(angle::wrap_nonnegative);
        let elevation_deg = elevation_deg.filter(|el| el.is_finite());

        if azimuth_deg.is_none() && elevation_deg.is_none() {
            None
        } else {
            Some(DomeTarget{ azimuth_deg, elevation_deg })
        }
    }

    pub fn azimuth_deg(&self) -> Option<f64> { self.azimuth_deg }

    pub fn elevation_deg(&self) -> Option<f64> { self.elevation_deg }

    pub fn axis(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::Azimuth => self.azimuth_deg,
            Axis::Elevation => self.elevation_deg
        }
    }
}

/// Following parameters; fixed for the duration of a following session.
#[derive(Clone, Debug, PartialEq)]
pub struct FollowingConfig {
    pub algorithm_name: String,
    /// Max tolerated azimuth difference between telescope and dome before the dome is moved.
    pub max_delta_azimuth_deg: f64,
    /// Max tolerated elevation difference between telescope and dome before the dome is moved.
    pub max_delta_elevation_deg: f64,
    pub enable_elevation_motion: bool
}

impl Default for FollowingConfig {
    fn default() -> FollowingConfig {
        FollowingConfig{
            algorithm_name: DEFAULT_ALGORITHM_NAME.to_string(),
            max_delta_azimuth_deg: DEFAULT_MAX_DELTA_AZIMUTH,
            max_delta_elevation_deg: DEFAULT_MAX_DELTA_ELEVATION,
            enable_elevation_motion: false
        }
    }
}

impl FollowingConfig {
    pub fn max_delta(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Azimuth => self.max_delta_azimuth_deg,
            Axis::Elevation => self.max_delta_elevation_deg
        }
    }

    /// Checks the thresholds and resolves the configured algorithm.
    pub fn validate(&self) -> Result<Algorithm, ConfigError> {
        for (name, value) in [
            ("max_delta_azimuth", self.max_delta_azimuth_deg),
            ("max_delta_elevation", self.max_delta_elevation_deg)
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidThreshold{ name: name.to_string(), value });
            }
        }

        Algorithm::from_name(&self.algorithm_name)
    }
}

#[enum_dispatch]
#[derive(Clone, Debug, PartialEq, strum_macros::Display, strum_macros::EnumString, strum_macros::EnumIter)]
pub enum Algorithm {
    #[strum(to_string = "deadband", serialize = "simple")]
    Deadband(DeadbandAlgorithm),
    #[strum(to_string = "scaled_deadband")]
    ScaledDeadband(ScaledDeadbandAlgorithm)
}

#[enum_dispatch(Algorithm)]
pub trait MotionAlgorithm {
    /// Returns the new dome target, or `None` if the dome should not be commanded.
    ///
    /// Implementations must not return a target for an axis whose inputs are not finite, and must compare azimuths
    /// using the wrapped difference.
    fn decide(&self, telescope: &TelescopePointing, dome: &DomePointing, config: &FollowingConfig) -> Option<DomeTarget>;
}

impl Algorithm {
    pub fn from_name(name: &str) -> Result<Algorithm, ConfigError> {
        Algorithm::from_str(name).map_err(|_| ConfigError::UnknownAlgorithm{
            name: name.to_string(),
            known: Algorithm::names().join(", ")
        })
    }

    /// Primary names of all available algorithms.
    pub fn names() -> Vec<String> {
        Algorithm::iter().map(|alg| alg.to_string()).collect()
    }
}

/// Returns true if `error` is finite and outside the deadband.
fn exceeds(error: f64, max_delta: f64) -> bool {
    error.is_finite() && error.abs() > max_delta
}

/// Elevation part of a dome target; common to all algorithms.
fn elevation_target(telescope: &TelescopePointing, dome: &DomePointing, config: &FollowingConfig) -> Option<f64> {
    if !config.enable_elevation_motion || !(0.0..=90.0).contains(&telescope.elevation_deg) {
        return None;
    }

    if exceeds(telescope.elevation_deg - dome.elevation_deg, config.max_delta_elevation_deg) {
        Some(telescope.elevation_deg)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_known_names_resolve_algorithm() {
        assert_eq!(Algorithm::Deadband(DeadbandAlgorithm), Algorithm::from_name("deadband").unwrap());
        assert_eq!(Algorithm::Deadband(DeadbandAlgorithm), Algorithm::from_name("simple").unwrap());
        assert_eq!(
            Algorithm::ScaledDeadband(ScaledDeadbandAlgorithm),
            Algorithm::from_name("scaled_deadband").unwrap()
        );
        assert_eq!("deadband", Algorithm::from_name("simple").unwrap().to_string());
    }

    #[test]
    fn given_unknown_name_fail() {
        match Algorithm::from_name("velocity_feedforward") {
            Err(ConfigError::UnknownAlgorithm{ name, known }) => {
                assert_eq!("velocity_feedforward", name);
                assert_eq!("deadband, scaled_deadband", known);
            },
            other => panic!("unexpected result: {:?}", other)
        }
    }

    #[test]
    fn given_invalid_threshold_fail_validation() {
        let config = FollowingConfig{ max_delta_azimuth_deg: -1.0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidThreshold{ .. })));

        let config = FollowingConfig{ max_delta_elevation_deg: f64::NAN, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidThreshold{ .. })));

        let config = FollowingConfig{ max_delta_azimuth_deg: 0.0, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn given_non_finite_values_target_not_constructed() {
        assert_eq!(None, DomeTarget::new(None, None));
        assert_eq!(None, DomeTarget::new(Some(f64::NAN), Some(f64::INFINITY)));

        let target = DomeTarget::new(Some(f64::NAN), Some(30.0)).unwrap();
        assert_eq!(None, target.azimuth_deg());
        assert_eq!(Some(30.0), target.elevation_deg());
    }

    #[test]
    fn given_azimuth_out_of_range_target_wrapped() {
        let target = DomeTarget::new(Some(-90.0), None).unwrap();
        assert_eq!(Some(270.0), target.axis(Axis::Azimuth));
        assert_eq!(None, target.axis(Axis::Elevation));
    }
}
