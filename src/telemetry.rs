//
// Dometrack - Telescope dome following
// Copyright (c) 2026 Filip Szczerek <ga.software@yahoo.com>
//
// This project is licensed under the terms of the MIT license
// (see the LICENSE file for details).
//

//!
//! Telescope and dome telemetry.
//!

use std::time::Instant;

/// Telescope pointing as reported by the telescope mount.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TelescopePointing {
    /// Unconstrained range (may be outside [0, 360)).
    pub azimuth_deg: f64,
    /// Expected range: [0, 90].
    pub elevation_deg: f64,
    pub timestamp: Instant
}

impl TelescopePointing {
    pub fn new(azimuth_deg: f64, elevation_deg: f64) -> TelescopePointing {
        TelescopePointing{ azimuth_deg, elevation_deg, timestamp: Instant::now() }
    }

    pub fn is_valid(&self) -> bool {
        self.azimuth_deg.is_finite() && self.elevation_deg.is_finite()
            && self.elevation_deg >= 0.0 && self.elevation_deg <= 90.0
    }
}

/// Dome pointing and shutter state as reported by the dome.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DomePointing {
    /// Expected range: [0, 360).
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    /// Open fraction of the aperture shutter in [0, 1]; `None` if unknown.
    pub shutter_open_fraction: Option<f64>,
    pub timestamp: Instant
}

impl DomePointing {
    pub fn new(azimuth_deg: f64, elevation_deg: f64, shutter_open_fraction: Option<f64>) -> DomePointing {
        DomePointing{ azimuth_deg, elevation_deg, shutter_open_fraction, timestamp: Instant::now() }
    }

    pub fn is_valid(&self) -> bool {
        self.azimuth_deg.is_finite() && self.elevation_deg.is_finite()
            && self.shutter_open_fraction.map_or(true, |f| f.is_finite() && (0.0..=1.0).contains(&f))
    }
}

/// A single telemetry event; the two sources arrive independently.
#[derive(Copy, Clone, Debug)]
pub enum TelemetrySample {
    Telescope(TelescopePointing),
    Dome(DomePointing)
}

/// Most recent telemetry received from each source.
#[derive(Copy, Clone, Debug, Default)]
pub struct TelemetrySnapshot {
    pub telescope: Option<TelescopePointing>,
    pub dome: Option<DomePointing>
}

impl TelemetrySnapshot {
    pub fn update(&mut self, sample: TelemetrySample) {
        match sample {
            TelemetrySample::Telescope(t) => self.telescope = Some(t),
            TelemetrySample::Dome(d) => self.dome = Some(d)
        }
    }
}
