//
// Dometrack - Telescope dome following
// Copyright (c) 2026 Filip Szczerek <ga.software@yahoo.com>
//
// This project is licensed under the terms of the MIT license
// (see the LICENSE file for details).
//

//!
//! Dome following controller.
//!
//! Owns the following state machine and the latest telemetry. Every telemetry sample updates the vignetting
//! report; while following, it is also passed to the motion algorithm and the resulting dome target is sent
//! to the command gateway, one command per axis.
//!
//! Commands are dispatched as separate tasks (a Tokio runtime is required) and their outcomes are delivered
//! back via `CommandOutcomes`; the owner of the controller must pass them to `on_command_outcome`.
//!

use crate::algorithm::{Algorithm, FollowingConfig, MotionAlgorithm};
use crate::angle;
use crate::config::ConfigError;
use crate::gateway::{Axis, CommandGateway, GatewayError};
use crate::publisher::{Fault, Publisher};
use crate::telemetry::{TelemetrySample, TelemetrySnapshot};
use crate::vignetting::{self, VignetteConfig, VignetteReport};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Copy, Clone, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum FollowingState {
    NotFollowing,
    Following
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("following cannot be enabled without a valid configuration")]
    NotConfigured,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("following worker has finished")]
    WorkerGone
}

#[derive(Clone, Debug, PartialEq)]
pub struct ControllerConfig {
    pub following: FollowingConfig,
    pub vignetting: VignetteConfig,
    /// Max wait for the dome to acknowledge a move command.
    pub command_timeout: Duration
}

impl Default for ControllerConfig {
    fn default() -> ControllerConfig {
        ControllerConfig{
            following: FollowingConfig::default(),
            vignetting: VignetteConfig::default(),
            command_timeout: Duration::from_secs(120)
        }
    }
}

impl ControllerConfig {
    pub fn validate(&self) -> Result<Algorithm, ConfigError> {
        let algorithm = self.following.validate()?;
        self.vignetting.validate()?;
        if self.command_timeout.is_zero() {
            return Err(ConfigError::InvalidThreshold{ name: "command_timeout".to_string(), value: 0.0 });
        }

        Ok(algorithm)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CommandResult {
    Completed,
    TimedOut,
    Rejected(GatewayError)
}

#[derive(Clone, Debug, PartialEq)]
pub struct CommandOutcome {
    pub id: u64,
    pub axis: Axis,
    pub target_deg: f64,
    pub result: CommandResult
}

/// Receiving end of dispatched commands' outcomes.
pub struct CommandOutcomes(mpsc::UnboundedReceiver<CommandOutcome>);

impl CommandOutcomes {
    pub async fn recv(&mut self) -> Option<CommandOutcome> {
        self.0.recv().await
    }

    pub fn try_recv(&mut self) -> Option<CommandOutcome> {
        self.0.try_recv().ok()
    }
}

/// Last move command sent to the dome for an axis.
///
/// Kept after the dome acknowledges it, as the motion towards `target_deg` is then in progress; a new target
/// within the axis' deadband of `target_deg` is not sent. Released when the command times out or is rejected.
#[derive(Copy, Clone, Debug)]
struct Commanded {
    id: u64,
    target_deg: f64,
    acknowledged: bool
}

#[derive(Default)]
struct CommandedTargets {
    azimuth: Option<Commanded>,
    elevation: Option<Commanded>
}

impl CommandedTargets {
    fn get_mut(&mut self, axis: Axis) -> &mut Option<Commanded> {
        match axis {
            Axis::Azimuth => &mut self.azimuth,
            Axis::Elevation => &mut self.elevation
        }
    }

    fn clear(&mut self) {
        self.azimuth = None;
        self.elevation = None;
    }
}

struct ActiveConfig {
    config: ControllerConfig,
    algorithm: Algorithm
}

pub struct FollowingController<G: CommandGateway, P: Publisher> {
    gateway: Arc<G>,
    publisher: P,
    state: FollowingState,
    /// `None` until successfully configured.
    active: Option<ActiveConfig>,
    /// Used also before the controller gets configured.
    vignette_config: VignetteConfig,
    telemetry: TelemetrySnapshot,
    vignetting: Option<VignetteReport>,
    commanded: CommandedTargets,
    next_command_id: u64,
    outcome_sender: mpsc::UnboundedSender<CommandOutcome>,
    /// Validity of the last sample from each source; used to log changes only.
    telescope_valid: bool,
    dome_valid: bool
}

impl<G: CommandGateway, P: Publisher> FollowingController<G, P> {
    pub fn new(gateway: Arc<G>, publisher: P) -> (FollowingController<G, P>, CommandOutcomes) {
        let (outcome_sender, outcome_receiver) = mpsc::unbounded_channel();

        (
            FollowingController{
                gateway,
                publisher,
                state: FollowingState::NotFollowing,
                active: None,
                vignette_config: VignetteConfig::default(),
                telemetry: TelemetrySnapshot::default(),
                vignetting: None,
                commanded: CommandedTargets::default(),
                next_command_id: 0,
                outcome_sender,
                telescope_valid: true,
                dome_valid: true
            },
            CommandOutcomes(outcome_receiver)
        )
    }

    pub fn state(&self) -> FollowingState { self.state }

    pub fn telemetry(&self) -> &TelemetrySnapshot { &self.telemetry }

    pub fn vignetting(&self) -> Option<&VignetteReport> { self.vignetting.as_ref() }

    pub fn config(&self) -> Option<&ControllerConfig> { self.active.as_ref().map(|a| &a.config) }

    /// Validates and installs a new configuration. Not allowed while following; on failure the previous
    /// configuration (if any) stays in effect.
    pub fn configure(&mut self, config: ControllerConfig) -> Result<(), ConfigError> {
        if self.state == FollowingState::Following {
            return Err(ConfigError::WhileFollowing);
        }

        let algorithm = config.validate()?;
        log::info!("configured algorithm \"{}\", command timeout {:?}", algorithm, config.command_timeout);
        self.publisher.algorithm(&config.following);
        self.vignette_config = config.vignetting.clone();
        self.active = Some(ActiveConfig{ config, algorithm });
        self.update_vignetting(false);

        Ok(())
    }

    /// Starts following. The dome is not commanded until the next telemetry sample arrives.
    ///
    /// Targets commanded during a previous following session are forgotten (the dome may have been moved by
    /// other means in the meantime); outcomes of their commands are ignored.
    pub fn enable(&mut self) -> Result<(), ControllerError> {
        if self.active.is_none() { return Err(ControllerError::NotConfigured); }

        if self.state == FollowingState::NotFollowing {
            self.commanded.clear();
            self.state = FollowingState::Following;
            log::info!("following enabled");
            self.publisher.following_mode(true);
        }

        Ok(())
    }

    /// Stops following. Commands already sent to the dome are not aborted (the dome may be in the middle of
    /// an accelerated motion, which cannot be stopped safely).
    pub fn disable(&mut self) {
        if self.state == FollowingState::Following {
            self.state = FollowingState::NotFollowing;
            log::info!("following disabled");
            self.publisher.following_mode(false);
        }
    }

    /// Stops following and publishes an all-unknown vignetting report, since no further telemetry will be
    /// evaluated.
    pub fn shutdown(&mut self) {
        self.disable();
        let report = VignetteReport::unknown();
        self.publisher.vignetting(&report);
        self.vignetting = Some(report);
    }

    pub fn on_telemetry(&mut self, sample: TelemetrySample) {
        self.check_validity(&sample);
        self.telemetry.update(sample);
        self.update_vignetting(false);

        if self.state == FollowingState::Following {
            self.follow();
        }
    }

    pub fn on_command_outcome(&mut self, outcome: CommandOutcome) {
        let slot = self.commanded.get_mut(outcome.axis);
        let is_current = slot.map_or(false, |c| c.id == outcome.id);
        if !is_current {
            log::debug!(
                "outcome of superseded {} command (target {:.2}°): {:?}",
                outcome.axis, outcome.target_deg, outcome.result
            );
            return;
        }

        match outcome.result {
            CommandResult::Completed => {
                if let Some(commanded) = slot { commanded.acknowledged = true; }
                log::debug!("dome {} move to {:.2}° acknowledged", outcome.axis, outcome.target_deg);
            },

            CommandResult::TimedOut => {
                *slot = None;
                log::warn!(
                    "dome {} move to {:.2}° not acknowledged in time; will re-evaluate on next telemetry",
                    outcome.axis, outcome.target_deg
                );
                self.publisher.fault(&Fault::CommandTimeout{ axis: outcome.axis, target_deg: outcome.target_deg });
            },

            CommandResult::Rejected(e) => {
                *slot = None;
                log::error!("dome {} move to {:.2}° failed: {}", outcome.axis, outcome.target_deg, e);
                self.publisher.fault(&Fault::CommandRejected{
                    axis: outcome.axis,
                    target_deg: outcome.target_deg,
                    reason: e.to_string()
                });
            }
        }
    }

    /// Re-evaluates (telemetry may have become stale in the meantime) and republishes the vignetting report.
    pub fn on_heartbeat(&mut self) {
        self.update_vignetting(true);
    }

    fn update_vignetting(&mut self, always_publish: bool) {
        let report = vignetting::evaluate(&self.telemetry, &self.vignette_config, Instant::now());
        if always_publish || self.vignetting.as_ref() != Some(&report) {
            self.publisher.vignetting(&report);
        }
        self.vignetting = Some(report);
    }

    fn check_validity(&mut self, sample: &TelemetrySample) {
        match sample {
            TelemetrySample::Telescope(t) => {
                let valid = t.is_valid();
                if !valid && self.telescope_valid { log::warn!("invalid telescope telemetry: {:?}", t); }
                if valid && !self.telescope_valid { log::info!("telescope telemetry valid again"); }
                self.telescope_valid = valid;
            },

            TelemetrySample::Dome(d) => {
                let valid = d.is_valid();
                if !valid && self.dome_valid { log::warn!("invalid dome telemetry: {:?}", d); }
                if valid && !self.dome_valid { log::info!("dome telemetry valid again"); }
                self.dome_valid = valid;
            }
        }
    }

    fn follow(&mut self) {
        let (telescope, dome) = match (&self.telemetry.telescope, &self.telemetry.dome) {
            (Some(t), Some(d)) => (t, d),
            _ => return
        };

        let active = match &self.active {
            Some(active) => active,
            None => return
        };

        let target = match active.algorithm.decide(telescope, dome, &active.config.following) {
            Some(target) => target,
            None => return
        };

        for axis in [Axis::Azimuth, Axis::Elevation] {
            if let Some(target_deg) = target.axis(axis) {
                self.dispatch(axis, target_deg);
            }
        }
    }

    fn dispatch(&mut self, axis: Axis, target_deg: f64) {
        let (max_delta, timeout) = match &self.active {
            Some(active) => (active.config.following.max_delta(axis), active.config.command_timeout),
            None => return
        };

        let target_deg = match axis {
            Axis::Azimuth => angle::wrap_nonnegative(target_deg),
            Axis::Elevation => target_deg
        };

        let slot = self.commanded.get_mut(axis);
        if let Some(commanded) = *slot {
            let difference = match axis {
                Axis::Azimuth => angle::wrapped_diff(target_deg, commanded.target_deg),
                Axis::Elevation => target_deg - commanded.target_deg
            };

            if difference.abs() <= max_delta {
                log::debug!(
                    "dome {} already commanded to {:.2}° ({})",
                    axis, commanded.target_deg, if commanded.acknowledged { "acknowledged" } else { "pending" }
                );
                return;
            }

            log::info!(
                "superseding dome {} move to {:.2}° with {:.2}°", axis, commanded.target_deg, target_deg
            );
        }

        let id = self.next_command_id;
        self.next_command_id += 1;
        *slot = Some(Commanded{ id, target_deg, acknowledged: false });

        log::debug!("moving dome {} to {:.2}°", axis, target_deg);

        let gateway = Arc::clone(&self.gateway);
        let sender = self.outcome_sender.clone();
        tokio::spawn(async move {
            let result = match tokio::time::timeout(timeout, gateway.move_axis(axis, target_deg)).await {
                Ok(Ok(())) => CommandResult::Completed,
                Ok(Err(e)) => CommandResult::Rejected(e),
                Err(_) => CommandResult::TimedOut
            };
            // receiver is gone only if the controller has been dropped
            let _ = sender.send(CommandOutcome{ id, axis, target_deg, result });
        });
    }
}
