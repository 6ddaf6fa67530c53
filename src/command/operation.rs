// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Operations a command can request.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::capabilities::Capability;
use crate::state::StateDelta;
use crate::types::{ArmState, Brightness, Temperature};

/// An operation with its payload.
///
/// Payloads are carried unchecked so that out-of-range input reaches
/// validation and comes back as an
/// [`Outcome::InvalidInput`](super::Outcome::InvalidInput) result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum Operation {
    /// Power the device on.
    TurnOn,
    /// Power the device off.
    TurnOff,
    /// Set the light level in percent.
    SetBrightness(i64),
    /// Set the thermostat setpoint in °C.
    SetTemperature(i64),
    /// Arm the security system.
    Arm,
    /// Disarm the security system.
    Disarm,
    /// Read the current temperature from the sensor.
    ReadTemperature,
    /// Read whatever telemetry the device offers.
    RefreshTelemetry,
}

impl Operation {
    /// Returns the operation name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TurnOn => "turn_on",
            Self::TurnOff => "turn_off",
            Self::SetBrightness(_) => "set_brightness",
            Self::SetTemperature(_) => "set_temperature",
            Self::Arm => "arm",
            Self::Disarm => "disarm",
            Self::ReadTemperature => "read_temperature",
            Self::RefreshTelemetry => "refresh_telemetry",
        }
    }

    /// Returns the payload rendered as text, if any.
    #[must_use]
    pub fn payload(&self) -> Option<String> {
        match self {
            Self::SetBrightness(value) | Self::SetTemperature(value) => Some(value.to_string()),
            _ => None,
        }
    }

    /// Returns the capability the target device needs.
    #[must_use]
    pub const fn required_capability(&self) -> Option<Capability> {
        match self {
            Self::TurnOn | Self::TurnOff => Some(Capability::Power),
            Self::SetBrightness(_) => Some(Capability::Brightness),
            Self::SetTemperature(_) => Some(Capability::TemperatureTarget),
            Self::Arm | Self::Disarm => Some(Capability::ArmState),
            Self::ReadTemperature => Some(Capability::TemperatureSense),
            Self::RefreshTelemetry => None,
        }
    }

    /// Returns `true` if the operation reads telemetry instead of changing
    /// the device.
    #[must_use]
    pub const fn is_read(&self) -> bool {
        matches!(self, Self::ReadTemperature | Self::RefreshTelemetry)
    }

    /// Returns the state change this operation asks for.
    ///
    /// Returns `None` for reads and for payloads that are out of range.
    #[must_use]
    pub fn requested_delta(&self) -> Option<StateDelta> {
        match self {
            Self::TurnOn => Some(StateDelta::power_on()),
            Self::TurnOff => Some(StateDelta::power_off()),
            Self::SetBrightness(value) => Brightness::from_raw(*value)
                .ok()
                .map(StateDelta::brightness),
            Self::SetTemperature(value) => i32::try_from(*value)
                .ok()
                .map(|v| StateDelta::target_temperature(Temperature::celsius(v))),
            Self::Arm => Some(StateDelta::arm(ArmState::Armed)),
            Self::Disarm => Some(StateDelta::arm(ArmState::Disarmed)),
            Self::ReadTemperature | Self::RefreshTelemetry => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.payload() {
            Some(payload) => write!(f, "{} {}", self.name(), payload),
            None => f.write_str(self.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_payload() {
        assert_eq!(Operation::SetTemperature(23).to_string(), "set_temperature 23");
        assert_eq!(Operation::Arm.to_string(), "arm");
    }

    #[test]
    fn requested_delta_for_valid_brightness() {
        assert_eq!(
            Operation::SetBrightness(80).requested_delta(),
            Some(StateDelta::brightness(Brightness::new(80).unwrap()))
        );
    }

    #[test]
    fn requested_delta_none_for_invalid_payload_and_reads() {
        assert_eq!(Operation::SetBrightness(101).requested_delta(), None);
        assert_eq!(Operation::ReadTemperature.requested_delta(), None);
    }

    #[test]
    fn required_capabilities() {
        assert_eq!(
            Operation::Disarm.required_capability(),
            Some(Capability::ArmState)
        );
        assert_eq!(Operation::RefreshTelemetry.required_capability(), None);
    }

    #[test]
    fn json_shape() {
        let json = serde_json::to_value(Operation::SetBrightness(80)).unwrap();
        assert_eq!(json, serde_json::json!({"op": "set_brightness", "value": 80}));
        let op: Operation = serde_json::from_str(r#"{"op": "turn_on"}"#).unwrap();
        assert_eq!(op, Operation::TurnOn);
    }
}
