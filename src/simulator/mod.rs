//
// Dometrack - Telescope dome following
// Copyright (c) 2026 Filip Szczerek <ga.software@yahoo.com>
//
// This project is licensed under the terms of the MIT license
// (see the LICENSE file for details).
//

//!
//! Dome and telescope simulators.
//!

mod dome;
mod telescope;

pub use dome::DomeSimulator;
pub use telescope::TelescopeSimulator;

use tokio::time::Instant;

/// Constant-speed motion of one axis.
#[derive(Copy, Clone, Debug)]
struct MoveRequest {
    t: Instant,
    origin: f64,
    /// May be outside [0, 360) for azimuth; the sign of `target - origin` gives the direction.
    target: f64,
    /// Degrees per second.
    speed: f64
}

impl MoveRequest {
    fn position(&self, now: Instant) -> f64 {
        let distance = self.target - self.origin;
        let traveled = now.saturating_duration_since(self.t).as_secs_f64() * self.speed;
        if traveled >= distance.abs() {
            self.target
        } else {
            self.origin + distance.signum() * traveled
        }
    }

    fn finished(&self, now: Instant) -> bool {
        self.position(now) == self.target
    }
}
