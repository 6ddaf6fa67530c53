// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command definitions.
//!
//! A [`Command`] is an immutable request to run one [`Operation`] on one
//! device. Each command yields exactly one [`CommandResult`].
//!
//! # Available Operations
//!
//! | Operation | Capability | Payload |
//! |-----------|------------|---------|
//! | [`Operation::TurnOn`] / [`Operation::TurnOff`] | power | none |
//! | [`Operation::SetBrightness`] | brightness | 0-100 |
//! | [`Operation::SetTemperature`] | temperature-target | °C within the configured range |
//! | [`Operation::Arm`] / [`Operation::Disarm`] | arm-state | none |
//! | [`Operation::ReadTemperature`] | temperature-sense | none |
//! | [`Operation::RefreshTelemetry`] | none | none |
//!
//! # Examples
//!
//! ```
//! use homecore::DeviceId;
//! use homecore::command::{Command, Operation};
//!
//! let cmd = Command::new(DeviceId::new("001").unwrap(), Operation::SetBrightness(80));
//! assert_eq!(cmd.operation().name(), "set_brightness");
//! assert_eq!(cmd.operation().payload(), Some("80".to_string()));
//! ```

mod operation;
mod result;
mod validate;

pub use operation::Operation;
pub use result::{CommandResult, Outcome};
pub use validate::{validate_delta, validate_operation};

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::device::DeviceId;

/// Unique identifier of a submitted command.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(Uuid);

impl CommandId {
    /// Creates a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for CommandId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First 8 characters are enough to tell commands apart in logs
        let short = &self.0.to_string()[..8];
        write!(f, "CommandId({short}...)")
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A request to run an operation on a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    id: CommandId,
    device_id: DeviceId,
    operation: Operation,
    issued_at: DateTime<Utc>,
}

impl Command {
    /// Creates a command stamped with the current time.
    #[must_use]
    pub fn new(device_id: DeviceId, operation: Operation) -> Self {
        Self {
            id: CommandId::new(),
            device_id,
            operation,
            issued_at: Utc::now(),
        }
    }

    /// Returns the command id.
    #[must_use]
    pub fn id(&self) -> CommandId {
        self.id
    }

    /// Returns the target device.
    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Returns the requested operation.
    #[must_use]
    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Returns when the command was created.
    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }
}
