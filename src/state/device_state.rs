// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state tracking.

use serde::{Deserialize, Serialize};

use crate::device::DeviceKind;
use crate::types::{ArmState, Brightness, PowerState, Temperature};

use super::StateDelta;

/// Last-known state of a device.
///
/// Every device has a power state; the rest depends on its kind and lives
/// in [`KindState`].
///
/// # Examples
///
/// ```
/// use homecore::DeviceKind;
/// use homecore::state::{DeviceState, StateDelta};
/// use homecore::types::Temperature;
///
/// let mut state = DeviceState::initial(DeviceKind::Thermostat);
/// assert_eq!(state.target_temperature(), Some(Temperature::celsius(0)));
/// assert_eq!(state.current_temperature(), None);
///
/// state.apply(&StateDelta::target_temperature(Temperature::celsius(23)));
/// assert_eq!(state.target_temperature(), Some(Temperature::celsius(23)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    /// Power state (off until told otherwise).
    pub power: PowerState,
    /// Kind-specific fields.
    #[serde(flatten)]
    pub detail: KindState,
}

/// Kind-specific part of a [`DeviceState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KindState {
    /// Light fields.
    Light {
        /// Current light level.
        brightness: Brightness,
    },
    /// Thermostat fields.
    Thermostat {
        /// Setpoint.
        target_temperature: Temperature,
        /// Last sensor reading, unknown until telemetry arrives.
        current_temperature: Option<Temperature>,
    },
    /// Security system fields.
    SecuritySystem {
        /// Whether the alarm is armed.
        arm_state: ArmState,
    },
}

impl DeviceState {
    /// Returns the defaults for a freshly registered device of this kind.
    #[must_use]
    pub fn initial(kind: DeviceKind) -> Self {
        let detail = match kind {
            DeviceKind::Light => KindState::Light {
                brightness: Brightness::MIN,
            },
            DeviceKind::Thermostat => KindState::Thermostat {
                target_temperature: Temperature::default(),
                current_temperature: None,
            },
            DeviceKind::SecuritySystem => KindState::SecuritySystem {
                arm_state: ArmState::Disarmed,
            },
        };
        Self {
            power: PowerState::Off,
            detail,
        }
    }

    /// Returns the kind this state belongs to.
    #[must_use]
    pub fn kind(&self) -> DeviceKind {
        match self.detail {
            KindState::Light { .. } => DeviceKind::Light,
            KindState::Thermostat { .. } => DeviceKind::Thermostat,
            KindState::SecuritySystem { .. } => DeviceKind::SecuritySystem,
        }
    }

    /// Returns the brightness of a light.
    #[must_use]
    pub fn brightness(&self) -> Option<Brightness> {
        match self.detail {
            KindState::Light { brightness } => Some(brightness),
            _ => None,
        }
    }

    /// Returns the setpoint of a thermostat.
    #[must_use]
    pub fn target_temperature(&self) -> Option<Temperature> {
        match self.detail {
            KindState::Thermostat {
                target_temperature, ..
            } => Some(target_temperature),
            _ => None,
        }
    }

    /// Returns the last sensor reading of a thermostat.
    #[must_use]
    pub fn current_temperature(&self) -> Option<Temperature> {
        match self.detail {
            KindState::Thermostat {
                current_temperature,
                ..
            } => current_temperature,
            _ => None,
        }
    }

    /// Returns the arm state of a security system.
    #[must_use]
    pub fn arm_state(&self) -> Option<ArmState> {
        match self.detail {
            KindState::SecuritySystem { arm_state } => Some(arm_state),
            _ => None,
        }
    }

    /// Applies a delta and reports whether anything changed.
    ///
    /// Deltas that do not fit this device's kind are ignored.
    pub fn apply(&mut self, delta: &StateDelta) -> bool {
        match delta {
            StateDelta::Batch(changes) => {
                let mut changed = false;
                for change in changes {
                    changed |= self.apply(change);
                }
                changed
            }
            StateDelta::Power(state) => replace(&mut self.power, *state),
            _ => self.apply_detail(delta),
        }
    }

    fn apply_detail(&mut self, delta: &StateDelta) -> bool {
        match (delta, &mut self.detail) {
            (StateDelta::Brightness(value), KindState::Light { brightness }) => {
                replace(brightness, *value)
            }
            (
                StateDelta::TargetTemperature(value),
                KindState::Thermostat {
                    target_temperature, ..
                },
            ) => replace(target_temperature, *value),
            (
                StateDelta::CurrentTemperature(value),
                KindState::Thermostat {
                    current_temperature,
                    ..
                },
            ) => replace(current_temperature, Some(*value)),
            (StateDelta::Arm(state), KindState::SecuritySystem { arm_state }) => {
                replace(arm_state, *state)
            }
            _ => false,
        }
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}
