// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device descriptors.
//!
//! A [`Device`] is plain data: an id, a display name, a [`DeviceKind`] tag
//! and a capability set. Behavior shared by all kinds lives in free
//! functions ([`validate_operation`](crate::command::validate_operation),
//! [`DeviceState::apply`](crate::state::DeviceState::apply)) rather than in a
//! type hierarchy.
//!
//! # Examples
//!
//! ```
//! use homecore::{Device, DeviceKind};
//!
//! let light = Device::light("001", "Living Room Light").unwrap();
//! assert_eq!(light.kind(), DeviceKind::Light);
//! assert_eq!(light.initial_state().brightness().map(|b| b.value()), Some(0));
//! ```

mod id;

pub use id::DeviceId;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::capabilities::Capabilities;
use crate::error::ValueError;
use crate::state::DeviceState;

/// The variant tag of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    /// A dimmable light.
    Light,
    /// A heating/cooling controller with a temperature sensor.
    Thermostat,
    /// An alarm system that can be armed.
    SecuritySystem,
}

impl DeviceKind {
    /// Returns the capability preset for this kind.
    #[must_use]
    pub const fn default_capabilities(&self) -> Capabilities {
        match self {
            Self::Light => Capabilities::light(),
            Self::Thermostat => Capabilities::thermostat(),
            Self::SecuritySystem => Capabilities::security_system(),
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Thermostat => write!(f, "thermostat"),
            Self::SecuritySystem => write!(f, "security system"),
        }
    }
}

/// A registered device.
///
/// Capabilities default to the kind's preset when omitted from
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    id: DeviceId,
    name: String,
    kind: DeviceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    capabilities: Option<Capabilities>,
}

impl Device {
    /// Creates a device with the kind's default capabilities.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::EmptyDeviceId` if `id` is blank.
    pub fn new(
        id: impl AsRef<str>,
        name: impl Into<String>,
        kind: DeviceKind,
    ) -> Result<Self, ValueError> {
        Ok(Self {
            id: DeviceId::new(id)?,
            name: name.into(),
            kind,
            capabilities: None,
        })
    }

    /// Creates a light.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::EmptyDeviceId` if `id` is blank.
    pub fn light(id: impl AsRef<str>, name: impl Into<String>) -> Result<Self, ValueError> {
        Self::new(id, name, DeviceKind::Light)
    }

    /// Creates a thermostat.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::EmptyDeviceId` if `id` is blank.
    pub fn thermostat(id: impl AsRef<str>, name: impl Into<String>) -> Result<Self, ValueError> {
        Self::new(id, name, DeviceKind::Thermostat)
    }

    /// Creates a security system.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::EmptyDeviceId` if `id` is blank.
    pub fn security_system(
        id: impl AsRef<str>,
        name: impl Into<String>,
    ) -> Result<Self, ValueError> {
        Self::new(id, name, DeviceKind::SecuritySystem)
    }

    /// Overrides the capability set.
    ///
    /// The override may narrow the kind's preset but never widen it: every
    /// capability needs a field in the kind's state.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::CapabilityMismatch` if a capability falls
    /// outside the kind's preset.
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Result<Self, ValueError> {
        self.capabilities = Some(capabilities);
        self.check_capabilities()?;
        Ok(self)
    }

    /// Checks that the capability set fits the kind.
    ///
    /// Descriptors loaded from configuration bypass
    /// [`with_capabilities`](Self::with_capabilities), so they are checked
    /// again on registration.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::CapabilityMismatch` for the first capability the
    /// kind has no state for.
    pub fn check_capabilities(&self) -> Result<(), ValueError> {
        match self
            .capabilities()
            .first_outside(&self.kind.default_capabilities())
        {
            Some(capability) => Err(ValueError::CapabilityMismatch {
                kind: self.kind.to_string(),
                capability: capability.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Returns the device id.
    #[must_use]
    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the variant tag.
    #[must_use]
    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    /// Returns the effective capability set.
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
            .unwrap_or_else(|| self.kind.default_capabilities())
    }

    /// Returns the snapshot a freshly registered device starts with.
    #[must_use]
    pub fn initial_state(&self) -> DeviceState {
        DeviceState::initial(self.kind)
    }
}
