//
// Dometrack - Telescope dome following
// Copyright (c) 2026 Filip Szczerek <ga.software@yahoo.com>
//
// This project is licensed under the terms of the MIT license
// (see the LICENSE file for details).
//

//!
//! Telescope vignetting evaluation.
//!
//! Determines from the latest telemetry whether the telescope's light path is obstructed by the dome, either
//! because the dome slit is not aligned with the telescope in azimuth or because the aperture shutter is not
//! fully open. Elevation (light/wind screen) mismatch is not taken into account.
//!

use crate::angle;
use crate::config::ConfigError;
use crate::telemetry::{DomePointing, TelemetrySnapshot, TelescopePointing};
use serde::Deserialize;
use std::time::{Duration, Instant};

/// Degrees.
pub const DEFAULT_AZIMUTH_PARTIAL: f64 = 2.5;
/// Degrees.
pub const DEFAULT_AZIMUTH_FULL: f64 = 10.0;
/// Open fraction.
pub const DEFAULT_SHUTTER_PARTIAL: f64 = 0.95;
/// Open fraction.
pub const DEFAULT_SHUTTER_FULL: f64 = 0.05;
pub const DEFAULT_MAX_TELEMETRY_AGE: Duration = Duration::from_secs(5);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Vignetting {
    /// Cannot be determined (missing, stale or invalid telemetry).
    Unknown,
    No,
    Partially,
    Fully
}

impl Vignetting {
    pub fn is_vignetted(&self) -> bool {
        matches!(self, Vignetting::Partially | Vignetting::Fully)
    }

    /// Combines per-component levels into the overall one.
    pub fn combine(a: Vignetting, b: Vignetting) -> Vignetting {
        use Vignetting::*;

        match (a, b) {
            (Unknown, _) | (_, Unknown) => Unknown,
            (No, No) => No,
            (Fully, _) | (_, Fully) => Fully,
            _ => Partially
        }
    }
}

/// How to treat a dome which does not report its shutter position.
#[derive(Copy, Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnknownShutterPolicy {
    /// Shutter vignetting is reported as unknown (and the report as stale).
    #[default]
    Indeterminate,
    /// Shutter is assumed not to vignette the telescope.
    NotVignetted
}

#[derive(Clone, Debug, PartialEq)]
pub struct VignetteConfig {
    /// Azimuth error (degrees) at and above which the telescope is partially vignetted.
    pub azimuth_partial_deg: f64,
    /// Azimuth error (degrees) at and above which the telescope is fully vignetted.
    pub azimuth_full_deg: f64,
    /// Shutter open fraction at and above which the shutter does not vignette the telescope.
    pub shutter_partial_fraction: f64,
    /// Shutter open fraction at and below which the shutter fully vignettes the telescope.
    pub shutter_full_fraction: f64,
    pub unknown_shutter: UnknownShutterPolicy,
    /// Telemetry older than this is treated as unavailable.
    pub max_telemetry_age: Duration,
    /// If true, azimuth error is multiplied by cos(telescope elevation).
    pub scale_azimuth_by_elevation: bool
}

impl Default for VignetteConfig {
    fn default() -> VignetteConfig {
        VignetteConfig{
            azimuth_partial_deg: DEFAULT_AZIMUTH_PARTIAL,
            azimuth_full_deg: DEFAULT_AZIMUTH_FULL,
            shutter_partial_fraction: DEFAULT_SHUTTER_PARTIAL,
            shutter_full_fraction: DEFAULT_SHUTTER_FULL,
            unknown_shutter: UnknownShutterPolicy::default(),
            max_telemetry_age: DEFAULT_MAX_TELEMETRY_AGE,
            scale_azimuth_by_elevation: true
        }
    }
}

impl VignetteConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let error = |msg: String| Err(ConfigError::InvalidVignetting(msg));

        if !(self.azimuth_partial_deg.is_finite() && self.azimuth_full_deg.is_finite())
            || self.azimuth_partial_deg < 0.0
            || self.azimuth_partial_deg > self.azimuth_full_deg {
            return error(format!(
                "expected 0 <= azimuth_partial ({}) <= azimuth_full ({})",
                self.azimuth_partial_deg, self.azimuth_full_deg
            ));
        }

        let in_unit_range = |f: f64| (0.0..=1.0).contains(&f);
        if !in_unit_range(self.shutter_partial_fraction)
            || !in_unit_range(self.shutter_full_fraction)
            || self.shutter_full_fraction >= self.shutter_partial_fraction {
            return error(format!(
                "expected 0 <= shutter_full ({}) < shutter_partial ({}) <= 1",
                self.shutter_full_fraction, self.shutter_partial_fraction
            ));
        }

        if self.max_telemetry_age.is_zero() {
            return error("max_telemetry_age must be positive".to_string());
        }

        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VignetteReport {
    /// True if vignetted (partially or fully) by azimuth or shutter.
    pub vignetted: bool,
    pub vignetted_by_azimuth: bool,
    /// Always false; elevation mismatch is not evaluated.
    pub vignetted_by_elevation: bool,
    pub vignetted_by_shutter: bool,
    pub azimuth: Vignetting,
    pub shutter: Vignetting,
    pub overall: Vignetting,
    /// True if any component could not be determined; the corresponding flag is then `false`.
    pub stale: bool
}

impl VignetteReport {
    pub fn new(azimuth: Vignetting, shutter: Vignetting) -> VignetteReport {
        let vignetted_by_azimuth = azimuth.is_vignetted();
        let vignetted_by_shutter = shutter.is_vignetted();

        VignetteReport{
            vignetted: vignetted_by_azimuth || vignetted_by_shutter,
            vignetted_by_azimuth,
            vignetted_by_elevation: false,
            vignetted_by_shutter,
            azimuth,
            shutter,
            overall: Vignetting::combine(azimuth, shutter),
            stale: azimuth == Vignetting::Unknown || shutter == Vignetting::Unknown
        }
    }

    /// Report to use when nothing is known.
    pub fn unknown() -> VignetteReport {
        VignetteReport::new(Vignetting::Unknown, Vignetting::Unknown)
    }
}

/// Evaluates vignetting for the given telemetry as of `now`.
pub fn evaluate(snapshot: &TelemetrySnapshot, config: &VignetteConfig, now: Instant) -> VignetteReport {
    let fresh = |timestamp: Instant| now.saturating_duration_since(timestamp) <= config.max_telemetry_age;
    let telescope = snapshot.telescope.as_ref().filter(|t| fresh(t.timestamp));
    let dome = snapshot.dome.as_ref().filter(|d| fresh(d.timestamp));

    VignetteReport::new(
        vignetting_by_azimuth(telescope, dome, config),
        vignetting_by_shutter(dome, config)
    )
}

fn vignetting_by_azimuth(
    telescope: Option<&TelescopePointing>,
    dome: Option<&DomePointing>,
    config: &VignetteConfig
) -> Vignetting {
    let (telescope, dome) = match (telescope, dome) {
        (Some(t), Some(d)) => (t, d),
        _ => return Vignetting::Unknown
    };

    let mut error = angle::wrapped_diff(telescope.azimuth_deg, dome.azimuth_deg).abs();
    if config.scale_azimuth_by_elevation {
        error *= telescope.elevation_deg.to_radians().cos().abs();
    }

    if !error.is_finite() {
        Vignetting::Unknown
    } else if error < config.azimuth_partial_deg {
        Vignetting::No
    } else if error < config.azimuth_full_deg {
        Vignetting::Partially
    } else {
        Vignetting::Fully
    }
}

fn vignetting_by_shutter(dome: Option<&DomePointing>, config: &VignetteConfig) -> Vignetting {
    let dome = match dome {
        Some(d) => d,
        None => return Vignetting::Unknown
    };

    match dome.shutter_open_fraction {
        None => match config.unknown_shutter {
            UnknownShutterPolicy::Indeterminate => Vignetting::Unknown,
            UnknownShutterPolicy::NotVignetted => Vignetting::No
        },

        Some(fraction) if !fraction.is_finite() => Vignetting::Unknown,

        Some(fraction) => {
            let fraction = fraction.clamp(0.0, 1.0);
            if fraction >= config.shutter_partial_fraction {
                Vignetting::No
            } else if fraction <= config.shutter_full_fraction {
                Vignetting::Fully
            } else {
                Vignetting::Partially
            }
        }
    }
}
