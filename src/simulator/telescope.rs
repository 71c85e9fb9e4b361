//
// Dometrack - Telescope dome following
// Copyright (c) 2026 Filip Szczerek <ga.software@yahoo.com>
//
// This project is licensed under the terms of the MIT license
// (see the LICENSE file for details).
//

//!
//! Telescope simulator.
//!

use crate::angle;
use crate::telemetry::TelescopePointing;
use tokio::time::Instant;

/// Simulated telescope sweeping in azimuth at a constant rate and fixed elevation.
pub struct TelescopeSimulator {
    t0: Instant,
    azimuth_deg: f64,
    elevation_deg: f64,
    /// Degrees per second.
    azimuth_rate: f64
}

impl TelescopeSimulator {
    pub fn new(azimuth_deg: f64, elevation_deg: f64, azimuth_rate: f64) -> TelescopeSimulator {
        TelescopeSimulator{ t0: Instant::now(), azimuth_deg, elevation_deg, azimuth_rate }
    }

    /// Moves instantly to the new position; the sweep continues from there.
    pub fn point_at(&mut self, azimuth_deg: f64, elevation_deg: f64) {
        self.t0 = Instant::now();
        self.azimuth_deg = azimuth_deg;
        self.elevation_deg = elevation_deg;
    }

    pub fn pointing(&self) -> TelescopePointing {
        let azimuth = self.azimuth_deg + self.azimuth_rate * self.t0.elapsed().as_secs_f64();
        TelescopePointing::new(angle::wrap_nonnegative(azimuth), self.elevation_deg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn given_elapsed_time_sweep_azimuth() {
        let mut telescope = TelescopeSimulator::new(350.0, 30.0, 2.0);

        tokio::time::sleep(Duration::from_secs(10)).await;
        let pointing = telescope.pointing();
        assert_abs_diff_eq!(10.0, pointing.azimuth_deg, epsilon = 0.1);
        assert_eq!(30.0, pointing.elevation_deg);

        telescope.point_at(200.0, 60.0);
        let pointing = telescope.pointing();
        assert_abs_diff_eq!(200.0, pointing.azimuth_deg, epsilon = 1.0e-9);
        assert_eq!(60.0, pointing.elevation_deg);
    }
}
