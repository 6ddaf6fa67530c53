// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device capabilities.
//!
//! A device's capability set decides which operations it accepts. Every
//! device kind has a preset, and custom sets can be assembled with
//! [`CapabilitiesBuilder`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single feature a device may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// On/off control.
    Power,
    /// Light level control (0-100%).
    Brightness,
    /// Accepts a target temperature.
    TemperatureTarget,
    /// Reports a measured temperature.
    TemperatureSense,
    /// Can be armed and disarmed.
    ArmState,
}

impl Capability {
    /// All capabilities in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Power,
        Self::Brightness,
        Self::TemperatureTarget,
        Self::TemperatureSense,
        Self::ArmState,
    ];

    /// Returns the kebab-case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Power => "power",
            Self::Brightness => "brightness",
            Self::TemperatureTarget => "temperature-target",
            Self::TemperatureSense => "temperature-sense",
            Self::ArmState => "arm-state",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capabilities of a device.
///
/// Serializes as the list of supported [`Capability`] names.
///
/// # Examples
///
/// ```
/// use homecore::{Capabilities, Capability};
///
/// let light = Capabilities::light();
/// assert!(light.supports(Capability::Brightness));
/// assert!(!light.supports(Capability::ArmState));
///
/// let thermostat = Capabilities::thermostat();
/// assert!(thermostat.temperature_target);
/// assert!(thermostat.temperature_sense);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Capability>", into = "Vec<Capability>")]
// Each flag is an independent feature of the device.
#[allow(clippy::struct_excessive_bools)]
pub struct Capabilities {
    /// Supports on/off control.
    pub power: bool,

    /// Supports brightness control.
    pub brightness: bool,

    /// Accepts a target temperature.
    pub temperature_target: bool,

    /// Reports a measured temperature.
    pub temperature_sense: bool,

    /// Supports arming and disarming.
    pub arm_state: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::basic()
    }
}

impl Capabilities {
    /// Creates capabilities for a plain on/off device.
    #[must_use]
    pub const fn basic() -> Self {
        Self {
            power: true,
            brightness: false,
            temperature_target: false,
            temperature_sense: false,
            arm_state: false,
        }
    }

    /// Creates capabilities for a dimmable light.
    #[must_use]
    pub const fn light() -> Self {
        Self {
            power: true,
            brightness: true,
            temperature_target: false,
            temperature_sense: false,
            arm_state: false,
        }
    }

    /// Creates capabilities for a thermostat with a built-in sensor.
    #[must_use]
    pub const fn thermostat() -> Self {
        Self {
            power: true,
            brightness: false,
            temperature_target: true,
            temperature_sense: true,
            arm_state: false,
        }
    }

    /// Creates capabilities for a security system.
    #[must_use]
    pub const fn security_system() -> Self {
        Self {
            power: true,
            brightness: false,
            temperature_target: false,
            temperature_sense: false,
            arm_state: true,
        }
    }

    /// Returns whether the given capability is supported.
    #[must_use]
    pub const fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Power => self.power,
            Capability::Brightness => self.brightness,
            Capability::TemperatureTarget => self.temperature_target,
            Capability::TemperatureSense => self.temperature_sense,
            Capability::ArmState => self.arm_state,
        }
    }

    /// Returns the supported capabilities in declaration order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(|c| self.supports(*c))
    }

    /// Returns the first supported capability that `allowed` lacks.
    #[must_use]
    pub fn first_outside(&self, allowed: &Self) -> Option<Capability> {
        self.iter().find(|c| !allowed.supports(*c))
    }

    fn set(&mut self, capability: Capability) {
        match capability {
            Capability::Power => self.power = true,
            Capability::Brightness => self.brightness = true,
            Capability::TemperatureTarget => self.temperature_target = true,
            Capability::TemperatureSense => self.temperature_sense = true,
            Capability::ArmState => self.arm_state = true,
        }
    }

    const fn none() -> Self {
        Self {
            power: false,
            brightness: false,
            temperature_target: false,
            temperature_sense: false,
            arm_state: false,
        }
    }
}

impl FromIterator<Capability> for Capabilities {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut caps = Self::none();
        for capability in iter {
            caps.set(capability);
        }
        caps
    }
}

impl From<Vec<Capability>> for Capabilities {
    fn from(list: Vec<Capability>) -> Self {
        list.into_iter().collect()
    }
}

impl From<Capabilities> for Vec<Capability> {
    fn from(caps: Capabilities) -> Self {
        caps.iter().collect()
    }
}

/// Builder for creating custom capabilities.
///
/// Starts from an empty set.
#[derive(Debug)]
pub struct CapabilitiesBuilder {
    inner: Capabilities,
}

impl Default for CapabilitiesBuilder {
    fn default() -> Self {
        Self {
            inner: Capabilities::none(),
        }
    }
}

impl CapabilitiesBuilder {
    /// Creates a new builder with no capabilities.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables on/off control.
    #[must_use]
    pub fn with_power(mut self) -> Self {
        self.inner.power = true;
        self
    }

    /// Enables brightness control.
    #[must_use]
    pub fn with_brightness(mut self) -> Self {
        self.inner.brightness = true;
        self
    }

    /// Enables target temperature control.
    #[must_use]
    pub fn with_temperature_target(mut self) -> Self {
        self.inner.temperature_target = true;
        self
    }

    /// Enables temperature sensing.
    #[must_use]
    pub fn with_temperature_sense(mut self) -> Self {
        self.inner.temperature_sense = true;
        self
    }

    /// Enables arm/disarm control.
    #[must_use]
    pub fn with_arm_state(mut self) -> Self {
        self.inner.arm_state = true;
        self
    }

    /// Builds the capabilities.
    #[must_use]
    pub fn build(self) -> Capabilities {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capabilities_are_power_only() {
        let caps = Capabilities::default();
        assert!(caps.power);
        assert!(!caps.brightness);
        assert!(!caps.temperature_target);
        assert!(!caps.temperature_sense);
        assert!(!caps.arm_state);
    }

    #[test]
    fn presets() {
        assert!(Capabilities::light().supports(Capability::Brightness));
        assert!(Capabilities::thermostat().supports(Capability::TemperatureSense));
        assert!(Capabilities::security_system().supports(Capability::ArmState));
        assert!(!Capabilities::security_system().supports(Capability::Brightness));
    }

    #[test]
    fn builder_pattern() {
        let caps = CapabilitiesBuilder::new()
            .with_power()
            .with_temperature_sense()
            .build();

        assert!(caps.power);
        assert!(caps.temperature_sense);
        assert!(!caps.temperature_target);
    }

    #[test]
    fn iter_lists_supported_in_order() {
        let listed: Vec<_> = Capabilities::thermostat().iter().collect();
        assert_eq!(
            listed,
            vec![
                Capability::Power,
                Capability::TemperatureTarget,
                Capability::TemperatureSense
            ]
        );
    }

    #[test]
    fn first_outside_finds_extra_capability() {
        let light = Capabilities::light();
        assert_eq!(Capabilities::basic().first_outside(&light), None);
        assert_eq!(
            Capabilities::thermostat().first_outside(&light),
            Some(Capability::TemperatureTarget)
        );
    }

    #[test]
    fn serializes_as_name_list() {
        let json = serde_json::to_string(&Capabilities::light()).unwrap();
        assert_eq!(json, r#"["power","brightness"]"#);

        let caps: Capabilities = serde_json::from_str(r#"["arm-state"]"#).unwrap();
        assert!(caps.arm_state);
        assert!(!caps.power);
    }
}
