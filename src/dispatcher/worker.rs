// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The per-device queue task.
//!
//! Each registered device owns exactly one worker. The worker takes jobs
//! from the device's channel one at a time, so the driver never sees two
//! calls for the same device at once and results come back in submission
//! order.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::command::{
    Command, CommandResult, Outcome, validate_delta, validate_operation,
};
use crate::config::HubConfig;
use crate::device::{Device, DeviceId};
use crate::driver::DeviceDriver;
use crate::error::{DriverError, ValueError};
use crate::event::{EventBus, HubEvent};
use crate::state::StateDelta;
use crate::store::StateStore;

use super::handle::CancelToken;

/// Work item for a device queue.
#[derive(Debug)]
pub(crate) enum Job {
    /// Dispatch a command to the driver.
    Command {
        command: Command,
        cancel: CancelToken,
        reply: oneshot::Sender<CommandResult>,
    },
    /// Merge externally observed telemetry.
    Ingest {
        delta: StateDelta,
        reply: oneshot::Sender<Result<bool, ValueError>>,
    },
}

/// Everything a worker shares with the dispatcher.
pub(crate) struct WorkerContext<D> {
    pub(crate) driver: Arc<D>,
    pub(crate) store: StateStore,
    pub(crate) events: EventBus,
    pub(crate) config: Arc<HubConfig>,
}

impl<D> Clone for WorkerContext<D> {
    fn clone(&self) -> Self {
        Self {
            driver: Arc::clone(&self.driver),
            store: self.store.clone(),
            events: self.events.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

/// Runs the queue of one device until every sender is gone.
pub(crate) async fn run<D: DeviceDriver>(
    device: Device,
    ctx: WorkerContext<D>,
    mut jobs: mpsc::Receiver<Job>,
) {
    let device_id = device.id().clone();
    tracing::debug!(%device_id, "Device queue started");

    while let Some(job) = jobs.recv().await {
        match job {
            Job::Command {
                command,
                cancel,
                reply,
            } => {
                let result = execute(&device, &ctx, &command, &cancel).await;
                tracing::debug!(
                    %device_id,
                    command_id = %result.command_id,
                    outcome = result.outcome.label(),
                    attempts = result.attempts,
                    "Command finished"
                );
                ctx.events.publish(HubEvent::CommandCompleted {
                    result: result.clone(),
                });
                // The caller may have dropped its handle
                let _ = reply.send(result);
            }
            Job::Ingest { delta, reply } => {
                let verdict = ingest(&device, &ctx, &delta);
                if let Err(ref e) = verdict {
                    tracing::warn!(%device_id, error = %e, "Rejected telemetry");
                }
                let _ = reply.send(verdict);
            }
        }
    }

    tracing::debug!(%device_id, "Device queue drained");
}

/// Carries one command through validation and the retry loop.
async fn execute<D: DeviceDriver>(
    device: &Device,
    ctx: &WorkerContext<D>,
    command: &Command,
    cancel: &CancelToken,
) -> CommandResult {
    let device_id = device.id();

    if cancel.is_cancelled() {
        tracing::debug!(%device_id, command_id = %command.id(), "Command cancelled before dispatch");
        return CommandResult::new(command, Outcome::Cancelled, None, 0);
    }

    if let Err(e) = validate_operation(
        command.operation(),
        &device.capabilities(),
        &ctx.config.temperature_range,
    ) {
        tracing::debug!(%device_id, command_id = %command.id(), error = %e, "Command rejected");
        return CommandResult::new(command, Outcome::InvalidInput(e), None, 0);
    }

    let retry = &ctx.config.retry;
    let mut attempts = 0;

    loop {
        attempts += 1;
        ctx.events.publish(HubEvent::CommandStarted {
            device_id: device_id.clone(),
            command_id: command.id(),
            attempt: attempts,
        });

        let err = match call_driver(ctx, command).await {
            Ok(delta) => {
                // Telemetry from a read is checked like pushed telemetry
                if command.operation().is_read()
                    && let Err(e) = validate_delta(
                        &delta,
                        &device.capabilities(),
                        &ctx.config.temperature_range,
                    )
                {
                    tracing::warn!(%device_id, error = %e, "Driver reported implausible reading");
                    return CommandResult::new(
                        command,
                        Outcome::DeviceError(e.to_string()),
                        None,
                        attempts,
                    );
                }
                apply(ctx, device_id, &delta);
                return CommandResult::new(command, Outcome::Success, Some(delta), attempts);
            }
            Err(err) => err,
        };

        if err.is_transient() && retry.should_retry(attempts) {
            let delay = retry.delay_for_attempt(attempts);
            tracing::warn!(
                %device_id,
                command_id = %command.id(),
                attempt = attempts,
                error = %err,
                ?delay,
                "Driver call failed, retrying"
            );
            tokio::time::sleep(delay).await;
            continue;
        }

        let outcome = match err {
            DriverError::Timeout(_) => Outcome::Timeout,
            DriverError::Unavailable(_) => Outcome::DeviceError(err.to_string()),
            DriverError::MalformedResponse(_) => {
                tracing::warn!(%device_id, command_id = %command.id(), error = %err, "Malformed driver response");
                Outcome::DeviceError(err.to_string())
            }
        };
        return CommandResult::new(command, outcome, None, attempts);
    }
}

/// Invokes the driver, bounded by the configured command timeout.
async fn call_driver<D: DeviceDriver>(
    ctx: &WorkerContext<D>,
    command: &Command,
) -> Result<StateDelta, DriverError> {
    let bound = ctx.config.command_timeout;
    let call = async {
        if command.operation().is_read() {
            ctx.driver.read_telemetry(command.device_id()).await
        } else {
            ctx.driver.apply_command(command).await
        }
    };

    match tokio::time::timeout(bound, call).await {
        Ok(result) => result,
        Err(_) => Err(DriverError::Timeout(
            u64::try_from(bound.as_millis()).unwrap_or(u64::MAX),
        )),
    }
}

fn ingest<D>(device: &Device, ctx: &WorkerContext<D>, delta: &StateDelta) -> Result<bool, ValueError> {
    validate_delta(delta, &device.capabilities(), &ctx.config.temperature_range)?;
    Ok(apply(ctx, device.id(), delta))
}

/// Applies a delta and publishes the new snapshot if anything changed.
fn apply<D>(ctx: &WorkerContext<D>, device_id: &DeviceId, delta: &StateDelta) -> bool {
    if ctx.store.apply_delta(device_id, delta) != Some(true) {
        return false;
    }

    if let Some(snapshot) = ctx.store.get(device_id) {
        tracing::trace!(%device_id, ?delta, "State changed");
        ctx.events.publish(HubEvent::StateChanged {
            device_id: device_id.clone(),
            delta: delta.clone(),
            snapshot,
        });
    }
    true
}
