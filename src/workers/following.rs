//
// Dometrack - Telescope dome following
// Copyright (c) 2026 Filip Szczerek <ga.software@yahoo.com>
//
// This project is licensed under the terms of the MIT license
// (see the LICENSE file for details).
//

//!
//! Following worker task.
//!
//! Owns the following controller and serializes everything that happens to it: messages from `FollowingHandle`,
//! outcomes of dispatched dome commands and heartbeat ticks.
//!

use crate::config::ConfigError;
use crate::controller::{ControllerConfig, ControllerError, FollowingController, FollowingState};
use crate::gateway::CommandGateway;
use crate::publisher::Publisher;
use crate::telemetry::TelemetrySample;
use crate::vignetting::VignetteReport;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FollowingStatus {
    pub state: FollowingState,
    pub vignetting: Option<VignetteReport>
}

#[derive(Debug)]
pub enum ToFollowingMsg {
    Telemetry(TelemetrySample),
    SetFollowing{ enable: bool, reply: oneshot::Sender<Result<(), ControllerError>> },
    Configure{ config: Box<ControllerConfig>, reply: oneshot::Sender<Result<(), ConfigError>> },
    Status(oneshot::Sender<FollowingStatus>),
    Finish
}

/// Sends requests to the following worker.
#[derive(Clone)]
pub struct FollowingHandle {
    sender: mpsc::Sender<ToFollowingMsg>
}

impl FollowingHandle {
    pub async fn telemetry(&self, sample: TelemetrySample) -> Result<(), ControllerError> {
        self.send(ToFollowingMsg::Telemetry(sample)).await
    }

    pub async fn enable(&self) -> Result<(), ControllerError> {
        self.set_following(true).await
    }

    pub async fn disable(&self) -> Result<(), ControllerError> {
        self.set_following(false).await
    }

    pub async fn configure(&self, config: ControllerConfig) -> Result<(), ControllerError> {
        let (reply, response) = oneshot::channel();
        self.send(ToFollowingMsg::Configure{ config: Box::new(config), reply }).await?;
        Ok(response.await.map_err(|_| ControllerError::WorkerGone)??)
    }

    pub async fn status(&self) -> Result<FollowingStatus, ControllerError> {
        let (reply, response) = oneshot::channel();
        self.send(ToFollowingMsg::Status(reply)).await?;
        response.await.map_err(|_| ControllerError::WorkerGone)
    }

    /// Requests the worker to finish; does not wait for it.
    pub async fn finish(&self) {
        // if the worker is already gone, there is nothing to finish
        let _ = self.sender.send(ToFollowingMsg::Finish).await;
    }

    async fn set_following(&self, enable: bool) -> Result<(), ControllerError> {
        let (reply, response) = oneshot::channel();
        self.send(ToFollowingMsg::SetFollowing{ enable, reply }).await?;
        response.await.map_err(|_| ControllerError::WorkerGone)?
    }

    async fn send(&self, msg: ToFollowingMsg) -> Result<(), ControllerError> {
        self.sender.send(msg).await.map_err(|_| ControllerError::WorkerGone)
    }
}

/// Spawns the following worker on the current Tokio runtime.
///
/// The worker starts unconfigured and not following.
///
/// # Parameters
///
/// * `gateway` - Receives dome move commands.
/// * `publisher` - Receives vignetting reports, following mode and algorithm announcements, and faults.
/// * `heartbeat` - Interval of unconditional vignetting report publishing.
///
pub fn spawn_following_worker<G: CommandGateway, P: Publisher>(
    gateway: Arc<G>,
    publisher: P,
    heartbeat: Duration
) -> (FollowingHandle, tokio::task::JoinHandle<()>) {
    let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
    let join_handle = tokio::spawn(following_worker(gateway, publisher, receiver, heartbeat));

    (FollowingHandle{ sender }, join_handle)
}

async fn following_worker<G: CommandGateway, P: Publisher>(
    gateway: Arc<G>,
    publisher: P,
    mut receiver: mpsc::Receiver<ToFollowingMsg>,
    heartbeat: Duration
) {
    let (mut controller, mut outcomes) = FollowingController::new(gateway, publisher);

    let mut heartbeat_timer = tokio::time::interval(heartbeat);
    heartbeat_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    log::info!("following worker started");

    loop {
        tokio::select! {
            msg = receiver.recv() => match msg {
                Some(msg) => if !on_message(&mut controller, msg) { break; },
                None => break
            },

            Some(outcome) = outcomes.recv() => controller.on_command_outcome(outcome),

            _ = heartbeat_timer.tick() => controller.on_heartbeat()
        }
    }

    controller.shutdown();
    log::info!("following worker finished");
}

/// Returns false if the worker shall finish.
fn on_message<G: CommandGateway, P: Publisher>(
    controller: &mut FollowingController<G, P>,
    msg: ToFollowingMsg
) -> bool {
    // a dropped reply receiver means the requester is no longer interested
    match msg {
        ToFollowingMsg::Telemetry(sample) => controller.on_telemetry(sample),

        ToFollowingMsg::SetFollowing{ enable, reply } => {
            let result = if enable {
                controller.enable()
            } else {
                controller.disable();
                Ok(())
            };
            if let Err(e) = &result { log::warn!("cannot enable following: {}", e); }
            let _ = reply.send(result);
        },

        ToFollowingMsg::Configure{ config, reply } => {
            let result = controller.configure(*config);
            if let Err(e) = &result { log::error!("configuration rejected: {}", e); }
            let _ = reply.send(result);
        },

        ToFollowingMsg::Status(reply) => {
            let _ = reply.send(FollowingStatus{
                state: controller.state(),
                vignetting: controller.vignetting().copied()
            });
        },

        ToFollowingMsg::Finish => return false
    }

    true
}
