// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boundary between the dispatcher and device transports.
//!
//! The [`DeviceDriver`] trait is the only point of contact with real or
//! simulated device I/O. The dispatcher makes no assumption about the
//! transport behind it (network, bus, timer).
//!
//! # Implementations
//!
//! - [`SimulatedDriver`]: fixed or jittered delays, a random temperature
//!   sensor, and scripted faults for testing

mod simulated;

pub use simulated::SimulatedDriver;

use std::future::Future;

use crate::command::Command;
use crate::device::DeviceId;
use crate::error::DriverError;
use crate::state::StateDelta;

/// Transport for device commands and telemetry.
///
/// Both calls may suspend. The dispatcher never calls a driver twice at the
/// same time for the same device, but calls for different devices overlap.
///
/// # Errors
///
/// [`DriverError::Timeout`] and [`DriverError::Unavailable`] are retried by
/// the dispatcher; [`DriverError::MalformedResponse`] is terminal.
pub trait DeviceDriver: Send + Sync + 'static {
    /// Carries a validated command to the device and returns the change the
    /// device reports.
    fn apply_command(
        &self,
        command: &Command,
    ) -> impl Future<Output = Result<StateDelta, DriverError>> + Send;

    /// Reads the device's current telemetry.
    fn read_telemetry(
        &self,
        device_id: &DeviceId,
    ) -> impl Future<Output = Result<StateDelta, DriverError>> + Send;
}
