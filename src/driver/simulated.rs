// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Simulated driver.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::Rng;

use crate::command::Command;
use crate::device::DeviceId;
use crate::error::DriverError;
use crate::state::StateDelta;
use crate::types::Temperature;

use super::DeviceDriver;

/// Default delay of every simulated call.
const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// Sensor readings are drawn from this range.
const SENSOR_MIN: i32 = 10;
const SENSOR_MAX: i32 = 39;

#[derive(Debug, Default)]
struct SimulatedDevice {
    faults: VecDeque<DriverError>,
    invocations: u32,
    delay: Option<Duration>,
    sensor: Option<Temperature>,
}

/// A driver that answers after a delay without touching any hardware.
///
/// - Every call sleeps for the configured delay (500 ms by default) plus a
///   random jitter when one is set.
/// - Commands report the change they request.
/// - Telemetry reports a temperature drawn from 10-39 °C unless a fixed
///   reading was set with [`set_sensor_reading`](Self::set_sensor_reading).
/// - Faults queued with [`inject_fault`](Self::inject_fault) are returned
///   by the next calls for that device, one per call.
///
/// Cloning shares the same simulated devices.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use homecore::DeviceId;
/// use homecore::driver::SimulatedDriver;
/// use homecore::error::DriverError;
///
/// let driver = SimulatedDriver::new().with_delay(Duration::from_millis(10));
/// let id = DeviceId::new("001").unwrap();
/// driver.inject_fault(&id, DriverError::Timeout(10));
/// assert_eq!(driver.invocations(&id), 0);
/// ```
#[derive(Debug, Clone)]
pub struct SimulatedDriver {
    delay: Duration,
    jitter: Duration,
    devices: Arc<Mutex<HashMap<DeviceId, SimulatedDevice>>>,
}

impl SimulatedDriver {
    /// Creates a driver with the default 500 ms delay and no jitter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            delay: DEFAULT_DELAY,
            jitter: Duration::ZERO,
            devices: Arc::default(),
        }
    }

    /// Sets the delay of every call.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Adds a random extra delay of up to `jitter` to every call.
    #[must_use]
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Overrides the delay for one device.
    pub fn set_device_delay(&self, id: &DeviceId, delay: Duration) {
        self.devices.lock().entry(id.clone()).or_default().delay = Some(delay);
    }

    /// Fixes the temperature the sensor of a device reports.
    pub fn set_sensor_reading(&self, id: &DeviceId, reading: Temperature) {
        self.devices.lock().entry(id.clone()).or_default().sensor = Some(reading);
    }

    /// Queues a fault returned by the next call for this device.
    pub fn inject_fault(&self, id: &DeviceId, fault: DriverError) {
        self.devices
            .lock()
            .entry(id.clone())
            .or_default()
            .faults
            .push_back(fault);
    }

    /// Returns how many times the driver was called for a device.
    #[must_use]
    pub fn invocations(&self, id: &DeviceId) -> u32 {
        self.devices.lock().get(id).map_or(0, |d| d.invocations)
    }

    /// Records a call and returns its delay and scripted fault.
    fn begin_call(&self, id: &DeviceId) -> (Duration, Option<DriverError>) {
        let mut devices = self.devices.lock();
        let device = devices.entry(id.clone()).or_default();
        device.invocations += 1;
        let fault = device.faults.pop_front();
        let base = device.delay.unwrap_or(self.delay);
        drop(devices);

        (base + self.random_jitter(), fault)
    }

    fn random_jitter(&self) -> Duration {
        if self.jitter.is_zero() {
            return Duration::ZERO;
        }
        let max = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(rand::thread_rng().gen_range(0..=max))
    }

    fn sensor_reading(&self, id: &DeviceId) -> Temperature {
        let fixed = self.devices.lock().get(id).and_then(|d| d.sensor);
        fixed.unwrap_or_else(|| {
            Temperature::celsius(rand::thread_rng().gen_range(SENSOR_MIN..=SENSOR_MAX))
        })
    }
}

impl Default for SimulatedDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceDriver for SimulatedDriver {
    async fn apply_command(&self, command: &Command) -> Result<StateDelta, DriverError> {
        let (delay, fault) = self.begin_call(command.device_id());
        tokio::time::sleep(delay).await;
        if let Some(fault) = fault {
            return Err(fault);
        }

        let operation = command.operation();
        if operation.is_read() {
            return Ok(StateDelta::current_temperature(
                self.sensor_reading(command.device_id()),
            ));
        }
        operation.requested_delta().ok_or_else(|| {
            DriverError::MalformedResponse(format!("device cannot apply {operation}"))
        })
    }

    async fn read_telemetry(&self, device_id: &DeviceId) -> Result<StateDelta, DriverError> {
        let (delay, fault) = self.begin_call(device_id);
        tokio::time::sleep(delay).await;
        if let Some(fault) = fault {
            return Err(fault);
        }
        Ok(StateDelta::current_temperature(self.sensor_reading(device_id)))
    }
}
