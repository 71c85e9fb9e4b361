//
// Dometrack - Telescope dome following
// Copyright (c) 2026 Filip Szczerek <ga.software@yahoo.com>
//
// This project is licensed under the terms of the MIT license
// (see the LICENSE file for details).
//

//!
//! Dome command gateway.
//!

use std::future::Future;
use thiserror::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::EnumIter)]
pub enum Axis {
    #[strum(to_string = "azimuth")]
    Azimuth,
    #[strum(to_string = "elevation")]
    Elevation
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum GatewayError {
    /// The dome refused the command (e.g., it is in a fault state).
    #[error("command rejected: {0}")]
    Rejected(String),

    #[error("dome unavailable: {0}")]
    Unavailable(String)
}

/// Accepts dome motion commands.
pub trait CommandGateway: Send + Sync + 'static {
    /// Starts moving `axis` to `target_deg`.
    ///
    /// The returned future completes once the dome has acknowledged the command (i.e., the motion has started),
    /// not when the motion ends. The caller bounds the wait; the future may be dropped at any time.
    ///
    /// # Parameters
    ///
    /// * `axis` - Axis to move.
    /// * `target_deg` - Target position; for azimuth always in [0, 360).
    ///
    fn move_axis(&self, axis: Axis, target_deg: f64) -> impl Future<Output=Result<(), GatewayError>> + Send;
}
