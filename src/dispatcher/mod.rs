// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command dispatcher coordinating all registered devices.
//!
//! Every device gets its own FIFO queue served by one Tokio task. Commands
//! for the same device run strictly one after another in submission order;
//! commands for different devices run concurrently.

mod handle;
mod scheduler;
mod worker;

pub use handle::{CancelToken, CommandHandle};

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, watch};

use crate::command::{Command, CommandResult, Operation};
use crate::config::{HomeConfig, HubConfig};
use crate::device::{Device, DeviceId};
use crate::driver::DeviceDriver;
use crate::error::{Error, Result};
use crate::event::{DeviceEvents, EventBus, HubEvent};
use crate::state::{DeviceState, StateDelta};
use crate::store::StateStore;

use scheduler::Scheduler;
use worker::{Job, WorkerContext};

/// Coordinates commands, state and events for a set of devices.
///
/// Cloning is cheap; clones share the same devices and queues.
///
/// # Examples
///
/// ```
/// use homecore::{Device, Dispatcher, SimulatedDriver};
///
/// #[tokio::main]
/// async fn main() -> homecore::Result<()> {
///     let hub = Dispatcher::new(SimulatedDriver::new().with_delay(std::time::Duration::ZERO));
///
///     let lamp = Device::light("001", "Living room")?;
///     let id = lamp.id().clone();
///     hub.register_device(lamp)?;
///
///     let result = hub.set_brightness(&id, 80).await?;
///     assert!(result.is_success());
///     assert_eq!(hub.get_device_state(&id)?.brightness().map(|b| b.value()), Some(80));
///
///     hub.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct Dispatcher<D: DeviceDriver> {
    inner: Arc<Inner<D>>,
}

struct Inner<D> {
    ctx: WorkerContext<D>,
    scheduler: Scheduler,
}

impl<D: DeviceDriver> Clone for Dispatcher<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: DeviceDriver> Dispatcher<D> {
    /// Creates a dispatcher with default settings.
    #[must_use]
    pub fn new(driver: D) -> Self {
        Self::build(driver, HubConfig::default(), EventBus::new())
    }

    /// Creates a dispatcher with custom settings.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is invalid.
    pub fn with_config(driver: D, config: HubConfig) -> Result<Self> {
        config.validate()?;
        let events = EventBus::with_capacity(config.event_capacity)?;
        Ok(Self::build(driver, config, events))
    }

    /// Creates a dispatcher and registers every configured device.
    ///
    /// Must be called inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is invalid.
    pub fn from_home_config(driver: D, config: HomeConfig) -> Result<Self> {
        config.validate()?;
        let events = EventBus::with_capacity(config.hub.event_capacity)?;
        let dispatcher = Self::build(driver, config.hub, events);
        for device in config.devices {
            dispatcher.register_device(device)?;
        }
        Ok(dispatcher)
    }

    fn build(driver: D, config: HubConfig, events: EventBus) -> Self {
        Self {
            inner: Arc::new(Inner {
                ctx: WorkerContext {
                    driver: Arc::new(driver),
                    store: StateStore::new(),
                    events,
                    config: Arc::new(config),
                },
                scheduler: Scheduler::new(),
            }),
        }
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &HubConfig {
        &self.inner.ctx.config
    }

    /// Returns the driver.
    #[must_use]
    pub fn driver(&self) -> &D {
        &self.inner.ctx.driver
    }

    /// Returns the state store. Reads never wait for device queues.
    #[must_use]
    pub fn store(&self) -> &StateStore {
        &self.inner.ctx.store
    }

    // =========================================================================
    // Subscription
    // =========================================================================

    /// Subscribes to hub events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<HubEvent> {
        self.inner.ctx.events.subscribe()
    }

    /// Subscribes to the events of one device.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotFound` if the device is not registered.
    pub fn subscribe_device(&self, device_id: &DeviceId) -> Result<DeviceEvents> {
        if !self.store().contains(device_id) {
            return Err(Error::DeviceNotFound(device_id.clone()));
        }
        Ok(self.inner.ctx.events.subscribe_device(device_id.clone()))
    }

    /// Watches the snapshots of one device.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotFound` if the device is not registered.
    pub fn watch_device(&self, device_id: &DeviceId) -> Result<watch::Receiver<DeviceState>> {
        self.store()
            .watch(device_id)
            .ok_or_else(|| Error::DeviceNotFound(device_id.clone()))
    }

    // =========================================================================
    // Device Management
    // =========================================================================

    /// Registers a device and starts its queue.
    ///
    /// The device starts in its kind's default state. Must be called inside
    /// a Tokio runtime.
    ///
    /// # Errors
    ///
    /// - `Error::ShuttingDown` after [`shutdown`](Self::shutdown)
    /// - `Error::DuplicateDevice` if the id is already registered
    /// - `Error::Value` if the capability set does not fit the device kind
    pub fn register_device(&self, device: Device) -> Result<()> {
        let scheduler = &self.inner.scheduler;
        if !scheduler.is_accepting() {
            return Err(Error::ShuttingDown);
        }
        device.check_capabilities()?;

        let device_id = device.id().clone();
        let (sender, jobs) = mpsc::channel(self.config().queue_capacity);
        let task = worker::run(device.clone(), self.inner.ctx.clone(), jobs);
        // The store entry appears together with the queue
        scheduler.start(device_id.clone(), sender, task, || {
            self.store().insert(device.clone())
        })?;

        tracing::info!(%device_id, kind = %device.kind(), name = device.name(), "Device registered");
        self.inner
            .ctx
            .events
            .publish(HubEvent::DeviceRegistered { device_id });
        Ok(())
    }

    /// Removes a device.
    ///
    /// The device queue is closed first; commands already queued still run
    /// to completion before the device disappears from the store.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotFound` if the device is not registered.
    pub async fn remove_device(&self, device_id: &DeviceId) -> Result<Device> {
        let store = self.store();
        // A device without a queue (after shutdown) is dropped under the
        // scheduler lock so a concurrent registration cannot slip in
        let mut detached = None;
        let task = self
            .inner
            .scheduler
            .close(device_id, || detached = store.remove(device_id));

        let removed = match task {
            Some(task) => {
                if let Err(e) = task.await {
                    tracing::error!(%device_id, error = %e, "Device queue task failed");
                }
                store.remove(device_id)
            }
            None => detached,
        };
        let device = removed.ok_or_else(|| Error::DeviceNotFound(device_id.clone()))?;

        tracing::info!(%device_id, "Device removed");
        self.inner.ctx.events.publish(HubEvent::DeviceRemoved {
            device_id: device_id.clone(),
        });
        Ok(device)
    }

    /// Returns the ids of all registered devices, sorted.
    #[must_use]
    pub fn device_ids(&self) -> Vec<DeviceId> {
        self.store()
            .devices()
            .into_iter()
            .map(|device| device.id().clone())
            .collect()
    }

    /// Returns the descriptor of a device.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotFound` if the device is not registered.
    pub fn device(&self, device_id: &DeviceId) -> Result<Device> {
        self.store()
            .device(device_id)
            .ok_or_else(|| Error::DeviceNotFound(device_id.clone()))
    }

    /// Returns the current snapshot of a device.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotFound` if the device is not registered.
    pub fn get_device_state(&self, device_id: &DeviceId) -> Result<DeviceState> {
        self.store()
            .get(device_id)
            .ok_or_else(|| Error::DeviceNotFound(device_id.clone()))
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Queues a command and returns without waiting for it.
    ///
    /// Suspends only while the device queue is full.
    ///
    /// # Errors
    ///
    /// - `Error::ShuttingDown` after [`shutdown`](Self::shutdown)
    /// - `Error::DeviceNotFound` if the device is not registered
    /// - `Error::QueueClosed` if the device was removed meanwhile
    pub async fn submit(&self, device_id: &DeviceId, operation: Operation) -> Result<CommandHandle> {
        let sender = self.inner.scheduler.sender(device_id)?;
        let command = Command::new(device_id.clone(), operation);
        let cancel = CancelToken::new();
        let (reply, result_rx) = oneshot::channel();

        tracing::debug!(
            %device_id,
            command_id = %command.id(),
            operation = %command.operation(),
            "Command queued"
        );

        sender
            .send(Job::Command {
                command: command.clone(),
                cancel: cancel.clone(),
                reply,
            })
            .await
            .map_err(|_| Error::QueueClosed(device_id.clone()))?;

        Ok(CommandHandle::new(command, cancel, result_rx))
    }

    /// Queues a command and waits for its terminal result.
    ///
    /// Failed commands are reported through the result's outcome, not as
    /// errors.
    ///
    /// # Errors
    ///
    /// Same as [`submit`](Self::submit).
    pub async fn submit_command(
        &self,
        device_id: &DeviceId,
        operation: Operation,
    ) -> Result<CommandResult> {
        self.submit(device_id, operation).await?.result().await
    }

    /// Turns a device on.
    ///
    /// # Errors
    ///
    /// Same as [`submit`](Self::submit).
    pub async fn turn_on(&self, device_id: &DeviceId) -> Result<CommandResult> {
        self.submit_command(device_id, Operation::TurnOn).await
    }

    /// Turns a device off.
    ///
    /// # Errors
    ///
    /// Same as [`submit`](Self::submit).
    pub async fn turn_off(&self, device_id: &DeviceId) -> Result<CommandResult> {
        self.submit_command(device_id, Operation::TurnOff).await
    }

    /// Sets the brightness of a light, in percent.
    ///
    /// # Errors
    ///
    /// Same as [`submit`](Self::submit).
    pub async fn set_brightness(&self, device_id: &DeviceId, level: i64) -> Result<CommandResult> {
        self.submit_command(device_id, Operation::SetBrightness(level))
            .await
    }

    /// Sets the target temperature of a thermostat, in °C.
    ///
    /// # Errors
    ///
    /// Same as [`submit`](Self::submit).
    pub async fn set_temperature(&self, device_id: &DeviceId, celsius: i64) -> Result<CommandResult> {
        self.submit_command(device_id, Operation::SetTemperature(celsius))
            .await
    }

    /// Arms a security system.
    ///
    /// # Errors
    ///
    /// Same as [`submit`](Self::submit).
    pub async fn arm(&self, device_id: &DeviceId) -> Result<CommandResult> {
        self.submit_command(device_id, Operation::Arm).await
    }

    /// Disarms a security system.
    ///
    /// # Errors
    ///
    /// Same as [`submit`](Self::submit).
    pub async fn disarm(&self, device_id: &DeviceId) -> Result<CommandResult> {
        self.submit_command(device_id, Operation::Disarm).await
    }

    /// Reads the current temperature of a thermostat.
    ///
    /// # Errors
    ///
    /// Same as [`submit`](Self::submit).
    pub async fn read_temperature(&self, device_id: &DeviceId) -> Result<CommandResult> {
        self.submit_command(device_id, Operation::ReadTemperature)
            .await
    }

    // =========================================================================
    // Telemetry
    // =========================================================================

    /// Reads telemetry from the driver and applies it.
    ///
    /// Runs through the device queue like any other command.
    ///
    /// # Errors
    ///
    /// Same as [`submit`](Self::submit).
    pub async fn refresh_telemetry(&self, device_id: &DeviceId) -> Result<CommandResult> {
        self.submit_command(device_id, Operation::RefreshTelemetry)
            .await
    }

    /// Applies telemetry reported by an external source.
    ///
    /// The delta is validated and applied in queue order. Returns whether
    /// the snapshot changed.
    ///
    /// # Errors
    ///
    /// - `Error::Value` if the delta does not fit the device
    /// - otherwise the same as [`submit`](Self::submit)
    pub async fn ingest_telemetry(&self, device_id: &DeviceId, delta: StateDelta) -> Result<bool> {
        let sender = self.inner.scheduler.sender(device_id)?;
        let (reply, verdict) = oneshot::channel();

        sender
            .send(Job::Ingest { delta, reply })
            .await
            .map_err(|_| Error::QueueClosed(device_id.clone()))?;

        let changed = verdict
            .await
            .map_err(|_| Error::QueueClosed(device_id.clone()))??;
        Ok(changed)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Returns `true` once [`shutdown`](Self::shutdown) was called.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        !self.inner.scheduler.is_accepting()
    }

    /// Stops accepting commands and waits until every queued command has a
    /// result.
    pub async fn shutdown(&self) {
        tracing::info!(devices = self.store().len(), "Shutting down dispatcher");
        self.inner.scheduler.shutdown().await;
        tracing::info!("Dispatcher stopped");
    }
}

impl<D: DeviceDriver> std::fmt::Debug for Dispatcher<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("store", self.store())
            .field("scheduler", &self.inner.scheduler)
            .finish_non_exhaustive()
    }
}
