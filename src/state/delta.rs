// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State delta representation.
//!
//! Deltas are the only way a [`DeviceState`](super::DeviceState) changes.
//! Drivers return them from commands and telemetry reads; external sources
//! can push them through
//! [`Dispatcher::ingest_telemetry`](crate::Dispatcher::ingest_telemetry).
//!
//! # Examples
//!
//! ```
//! use homecore::state::StateDelta;
//! use homecore::types::{Brightness, Temperature};
//!
//! let dim = StateDelta::brightness(Brightness::new(80).unwrap());
//! let heat = StateDelta::target_temperature(Temperature::celsius(23));
//! let both = StateDelta::batch(vec![dim, heat]);
//! assert_eq!(both.leaves().count(), 2);
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{ArmState, Brightness, PowerState, Temperature};

/// A change to a device's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StateDelta {
    /// Power turned on or off.
    Power(PowerState),

    /// Light level changed.
    Brightness(Brightness),

    /// Thermostat setpoint changed.
    TargetTemperature(Temperature),

    /// New sensor reading.
    CurrentTemperature(Temperature),

    /// Security system armed or disarmed.
    Arm(ArmState),

    /// Multiple changes at once.
    Batch(Vec<StateDelta>),
}

impl StateDelta {
    /// Creates a power-on delta.
    #[must_use]
    pub fn power_on() -> Self {
        Self::Power(PowerState::On)
    }

    /// Creates a power-off delta.
    #[must_use]
    pub fn power_off() -> Self {
        Self::Power(PowerState::Off)
    }

    /// Creates a brightness delta.
    #[must_use]
    pub fn brightness(value: Brightness) -> Self {
        Self::Brightness(value)
    }

    /// Creates a setpoint delta.
    #[must_use]
    pub fn target_temperature(value: Temperature) -> Self {
        Self::TargetTemperature(value)
    }

    /// Creates a sensor reading delta.
    #[must_use]
    pub fn current_temperature(value: Temperature) -> Self {
        Self::CurrentTemperature(value)
    }

    /// Creates an arm-state delta.
    #[must_use]
    pub fn arm(state: ArmState) -> Self {
        Self::Arm(state)
    }

    /// Creates a batch of deltas.
    #[must_use]
    pub fn batch(changes: Vec<StateDelta>) -> Self {
        Self::Batch(changes)
    }

    /// Iterates over the leaf changes, flattening nested batches.
    pub fn leaves(&self) -> Box<dyn Iterator<Item = &StateDelta> + '_> {
        match self {
            Self::Batch(changes) => Box::new(changes.iter().flat_map(Self::leaves)),
            leaf => Box::new(std::iter::once(leaf)),
        }
    }
}
