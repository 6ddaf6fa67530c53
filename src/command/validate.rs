// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Validation rules of the device model.
//!
//! These are pure functions: they inspect their inputs and return a verdict
//! without touching any state.

use crate::capabilities::{Capabilities, Capability};
use crate::error::ValueError;
use crate::state::StateDelta;
use crate::types::{Brightness, TemperatureRange};

use super::Operation;

/// Checks an operation against a device's capabilities and the plausible
/// temperature range.
///
/// # Errors
///
/// - `ValueError::UnsupportedOperation` if the device lacks the capability
/// - `ValueError::OutOfRange` if the payload is out of range
///
/// # Examples
///
/// ```
/// use homecore::Capabilities;
/// use homecore::command::{Operation, validate_operation};
/// use homecore::types::TemperatureRange;
///
/// let light = Capabilities::light();
/// let range = TemperatureRange::default();
///
/// assert!(validate_operation(&Operation::SetBrightness(100), &light, &range).is_ok());
/// assert!(validate_operation(&Operation::SetBrightness(101), &light, &range).is_err());
/// assert!(validate_operation(&Operation::Arm, &light, &range).is_err());
/// ```
pub fn validate_operation(
    operation: &Operation,
    capabilities: &Capabilities,
    temperature_range: &TemperatureRange,
) -> Result<(), ValueError> {
    if let Some(capability) = operation.required_capability() {
        require(capabilities, capability, operation.name())?;
    }

    match operation {
        Operation::SetBrightness(value) => Brightness::from_raw(*value).map(|_| ()),
        Operation::SetTemperature(value) => temperature_range.check(*value).map(|_| ()),
        _ => Ok(()),
    }
}

/// Checks a telemetry delta, read from a driver or pushed in, before it
/// reaches the store.
///
/// # Errors
///
/// - `ValueError::UnsupportedOperation` if a change targets a capability
///   the device lacks
/// - `ValueError::OutOfRange` if a temperature is implausible
pub fn validate_delta(
    delta: &StateDelta,
    capabilities: &Capabilities,
    temperature_range: &TemperatureRange,
) -> Result<(), ValueError> {
    for leaf in delta.leaves() {
        let (capability, temperature) = match leaf {
            StateDelta::Power(_) => (Capability::Power, None),
            StateDelta::Brightness(_) => (Capability::Brightness, None),
            StateDelta::TargetTemperature(t) => (Capability::TemperatureTarget, Some(*t)),
            StateDelta::CurrentTemperature(t) => (Capability::TemperatureSense, Some(*t)),
            StateDelta::Arm(_) => (Capability::ArmState, None),
            StateDelta::Batch(_) => continue,
        };
        require(capabilities, capability, "ingest_telemetry")?;
        if let Some(t) = temperature {
            temperature_range.check(i64::from(t.value()))?;
        }
    }
    Ok(())
}

fn require(
    capabilities: &Capabilities,
    capability: Capability,
    operation: &str,
) -> Result<(), ValueError> {
    if capabilities.supports(capability) {
        Ok(())
    } else {
        Err(ValueError::UnsupportedOperation {
            operation: operation.to_string(),
            capability: capability.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Temperature;

    fn range() -> TemperatureRange {
        TemperatureRange::default()
    }

    #[test]
    fn every_brightness_in_range_is_valid() {
        let caps = Capabilities::light();
        for v in 0..=100 {
            assert!(validate_operation(&Operation::SetBrightness(v), &caps, &range()).is_ok());
        }
    }

    #[test]
    fn brightness_out_of_range_is_rejected() {
        let caps = Capabilities::light();
        for v in [-1, 101, 255, i64::MIN, i64::MAX] {
            let err = validate_operation(&Operation::SetBrightness(v), &caps, &range()).unwrap_err();
            assert!(matches!(err, ValueError::OutOfRange { actual, .. } if actual == v));
        }
    }

    #[test]
    fn temperature_checked_against_range() {
        let caps = Capabilities::thermostat();
        assert!(validate_operation(&Operation::SetTemperature(23), &caps, &range()).is_ok());
        assert!(validate_operation(&Operation::SetTemperature(-40), &caps, &range()).is_err());

        let narrow = TemperatureRange::new(15, 25).unwrap();
        assert!(validate_operation(&Operation::SetTemperature(26), &caps, &narrow).is_err());
    }

    #[test]
    fn missing_capability_is_reported() {
        let err = validate_operation(
            &Operation::SetTemperature(20),
            &Capabilities::light(),
            &range(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ValueError::UnsupportedOperation {
                operation: "set_temperature".to_string(),
                capability: "temperature-target".to_string(),
            }
        );
    }

    #[test]
    fn refresh_telemetry_needs_no_capability() {
        let caps = Capabilities::security_system();
        assert!(validate_operation(&Operation::RefreshTelemetry, &caps, &range()).is_ok());
    }

    #[test]
    fn telemetry_delta_validation() {
        let caps = Capabilities::thermostat();
        let ok = StateDelta::current_temperature(Temperature::celsius(21));
        assert!(validate_delta(&ok, &caps, &range()).is_ok());

        let too_hot = StateDelta::current_temperature(Temperature::celsius(500));
        assert!(validate_delta(&too_hot, &caps, &range()).is_err());

        let wrong_kind = StateDelta::batch(vec![StateDelta::arm(crate::types::ArmState::Armed)]);
        assert!(validate_delta(&wrong_kind, &caps, &range()).is_err());
    }
}
