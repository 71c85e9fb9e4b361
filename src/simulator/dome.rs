//
// Dometrack - Telescope dome following
// Copyright (c) 2026 Filip Szczerek <ga.software@yahoo.com>
//
// This project is licensed under the terms of the MIT license
// (see the LICENSE file for details).
//

//!
//! Dome simulator.
//!

use crate::angle;
use crate::gateway::{Axis, CommandGateway, GatewayError};
use crate::simulator::MoveRequest;
use crate::telemetry::DomePointing;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

/// Degrees per second.
const DEFAULT_AZIMUTH_SPEED: f64 = 20.0;
/// Degrees per second.
const DEFAULT_ELEVATION_SPEED: f64 = 10.0;

#[derive(Debug)]
struct AxisState {
    position: f64,
    speed: f64,
    move_request: Option<MoveRequest>
}

impl AxisState {
    fn new(position: f64, speed: f64) -> AxisState {
        AxisState{ position, speed, move_request: None }
    }

    fn update(&mut self, now: Instant) {
        if let Some(request) = &self.move_request {
            self.position = request.position(now);
            if request.finished(now) { self.move_request = None; }
        }
    }
}

#[derive(Debug)]
struct State {
    azimuth: AxisState,
    elevation: AxisState,
    shutter_open_fraction: Option<f64>,
    ack_delay: Duration,
    rejection: Option<String>,
    num_commands: usize
}

/// Simulated dome; moves each axis at constant speed, azimuth along the shorter arc.
///
/// A new command for an axis replaces the one in progress, starting from the current position.
pub struct DomeSimulator {
    state: Mutex<State>
}

impl DomeSimulator {
    pub fn new(azimuth_deg: f64, elevation_deg: f64) -> DomeSimulator {
        DomeSimulator::with_speeds(azimuth_deg, elevation_deg, DEFAULT_AZIMUTH_SPEED, DEFAULT_ELEVATION_SPEED)
    }

    /// Speeds in degrees per second.
    pub fn with_speeds(azimuth_deg: f64, elevation_deg: f64, azimuth_speed: f64, elevation_speed: f64) -> DomeSimulator {
        DomeSimulator{
            state: Mutex::new(State{
                azimuth: AxisState::new(angle::wrap_nonnegative(azimuth_deg), azimuth_speed),
                elevation: AxisState::new(elevation_deg, elevation_speed),
                shutter_open_fraction: Some(1.0),
                ack_delay: Duration::ZERO,
                rejection: None,
                num_commands: 0
            })
        }
    }

    /// Time between receiving a command and acknowledging it (i.e., starting the motion).
    pub fn set_ack_delay(&self, delay: Duration) {
        self.lock().ack_delay = delay;
    }

    /// If `Some`, subsequent commands are rejected with the given reason.
    pub fn set_rejection(&self, reason: Option<String>) {
        self.lock().rejection = reason;
    }

    pub fn set_shutter_open_fraction(&self, fraction: Option<f64>) {
        self.lock().shutter_open_fraction = fraction;
    }

    /// Number of move commands received so far (including rejected ones).
    pub fn num_commands(&self) -> usize {
        self.lock().num_commands
    }

    pub fn is_moving(&self) -> bool {
        let mut state = self.lock();
        let now = Instant::now();
        state.azimuth.update(now);
        state.elevation.update(now);

        state.azimuth.move_request.is_some() || state.elevation.move_request.is_some()
    }

    pub fn telemetry(&self) -> DomePointing {
        let mut state = self.lock();
        let now = Instant::now();
        state.azimuth.update(now);
        state.elevation.update(now);

        DomePointing::new(
            angle::wrap_nonnegative(state.azimuth.position),
            state.elevation.position,
            state.shutter_open_fraction
        )
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // state is always consistent between statements, so a poisoned lock can still be used
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn start_move(&self, axis: Axis, target_deg: f64) {
        let mut state = self.lock();
        let now = Instant::now();
        let axis_state = match axis {
            Axis::Azimuth => &mut state.azimuth,
            Axis::Elevation => &mut state.elevation
        };
        axis_state.update(now);

        let origin = axis_state.position;
        let target = match axis {
            Axis::Azimuth => origin + angle::wrapped_diff(target_deg, origin),
            Axis::Elevation => target_deg.clamp(0.0, 90.0)
        };

        log::debug!("dome simulator: moving {} from {:.2}° to {:.2}°", axis, origin, target);

        axis_state.move_request = Some(MoveRequest{ t: now, origin, target, speed: axis_state.speed });
    }
}

impl CommandGateway for DomeSimulator {
    fn move_axis(&self, axis: Axis, target_deg: f64) -> impl Future<Output=Result<(), GatewayError>> + Send {
        let (ack_delay, rejection) = {
            let mut state = self.lock();
            state.num_commands += 1;
            (state.ack_delay, state.rejection.clone())
        };

        async move {
            if !ack_delay.is_zero() { tokio::time::sleep(ack_delay).await; }

            if let Some(reason) = rejection { return Err(GatewayError::Rejected(reason)); }

            if !target_deg.is_finite() {
                return Err(GatewayError::Rejected(format!("invalid target: {}", target_deg)));
            }

            self.start_move(axis, target_deg);

            Ok(())
        }
    }
}
