//
// Dometrack - Telescope dome following
// Copyright (c) 2026 Filip Szczerek <ga.software@yahoo.com>
//
// This project is licensed under the terms of the MIT license
// (see the LICENSE file for details).
//

//!
//! Status publishing.
//!

use crate::algorithm::FollowingConfig;
use crate::gateway::Axis;
use crate::vignetting::VignetteReport;

#[derive(Clone, Debug, PartialEq)]
pub enum Fault {
    /// The dome did not acknowledge a move command in time.
    CommandTimeout{ axis: Axis, target_deg: f64 },
    /// The dome refused a move command.
    CommandRejected{ axis: Axis, target_deg: f64, reason: String }
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Fault::CommandTimeout{ axis, target_deg } =>
                write!(f, "dome {} move to {:.2}° timed out", axis, target_deg),

            Fault::CommandRejected{ axis, target_deg, reason } =>
                write!(f, "dome {} move to {:.2}° rejected: {}", axis, target_deg, reason)
        }
    }
}

/// Receives everything the following controller reports to the outside world.
pub trait Publisher: Send + 'static {
    /// Called when the vignetting report changes and on every heartbeat.
    fn vignetting(&mut self, report: &VignetteReport);

    fn following_mode(&mut self, enabled: bool);

    /// Called after a new configuration has been accepted.
    fn algorithm(&mut self, config: &FollowingConfig);

    fn fault(&mut self, fault: &Fault);
}

/// Publishes to the log.
#[derive(Default)]
pub struct LogPublisher {
    last_report: Option<VignetteReport>
}

impl Publisher for LogPublisher {
    fn vignetting(&mut self, report: &VignetteReport) {
        if self.last_report.as_ref() != Some(report) {
            log::info!(
                "vignetting: {} (azimuth: {}, shutter: {}){}",
                report.overall, report.azimuth, report.shutter, if report.stale { ", stale" } else { "" }
            );
            self.last_report = Some(*report);
        }
    }

    fn following_mode(&mut self, enabled: bool) {
        log::info!("following {}", if enabled { "enabled" } else { "disabled" });
    }

    fn algorithm(&mut self, config: &FollowingConfig) {
        log::info!(
            "algorithm: {} (max delta az.: {}°, max delta el.: {}°, elevation motion: {})",
            config.algorithm_name,
            config.max_delta_azimuth_deg,
            config.max_delta_elevation_deg,
            config.enable_elevation_motion
        );
    }

    fn fault(&mut self, fault: &Fault) {
        log::error!("fault: {}", fault);
    }
}
