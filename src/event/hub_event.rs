// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hub event types.

use serde::Serialize;

use crate::command::{CommandId, CommandResult};
use crate::device::DeviceId;
use crate::state::{DeviceState, StateDelta};

/// Events emitted by the dispatcher.
///
/// Events from one device's queue are published in the order they happen;
/// events from different devices interleave freely.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HubEvent {
    /// A device was registered.
    DeviceRegistered {
        /// The registered device.
        device_id: DeviceId,
    },

    /// A device was removed after its queue drained.
    DeviceRemoved {
        /// The removed device.
        device_id: DeviceId,
    },

    /// The driver is about to be invoked for a command.
    CommandStarted {
        /// The target device.
        device_id: DeviceId,
        /// The command being dispatched.
        command_id: CommandId,
        /// Attempt number, starting at 1.
        attempt: u32,
    },

    /// A command reached its terminal result.
    CommandCompleted {
        /// The result.
        result: CommandResult,
    },

    /// A device snapshot changed.
    StateChanged {
        /// The device.
        device_id: DeviceId,
        /// The change that was applied.
        delta: StateDelta,
        /// The complete new snapshot.
        snapshot: DeviceState,
    },
}

impl HubEvent {
    /// Returns the device this event concerns.
    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        match self {
            Self::DeviceRegistered { device_id }
            | Self::DeviceRemoved { device_id }
            | Self::CommandStarted { device_id, .. }
            | Self::StateChanged { device_id, .. } => device_id,
            Self::CommandCompleted { result } => &result.device_id,
        }
    }

    /// Returns the command this event concerns, if any.
    #[must_use]
    pub fn command_id(&self) -> Option<CommandId> {
        match self {
            Self::CommandStarted { command_id, .. } => Some(*command_id),
            Self::CommandCompleted { result } => Some(result.command_id),
            _ => None,
        }
    }

    /// Returns the snake_case name used as the serialized tag.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::DeviceRegistered { .. } => "device_registered",
            Self::DeviceRemoved { .. } => "device_removed",
            Self::CommandStarted { .. } => "command_started",
            Self::CommandCompleted { .. } => "command_completed",
            Self::StateChanged { .. } => "state_changed",
        }
    }

    /// Returns `true` if this is a state change.
    #[must_use]
    pub fn is_state_change(&self) -> bool {
        matches!(self, Self::StateChanged { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Command, Operation, Outcome};

    fn id() -> DeviceId {
        DeviceId::new("001").unwrap()
    }

    #[test]
    fn device_id_of_each_variant() {
        let cmd = Command::new(id(), Operation::TurnOn);
        let completed = HubEvent::CommandCompleted {
            result: CommandResult::new(&cmd, Outcome::Success, None, 1),
        };
        assert_eq!(completed.device_id(), &id());
        assert_eq!(completed.command_id(), Some(cmd.id()));

        let registered = HubEvent::DeviceRegistered { device_id: id() };
        assert_eq!(registered.command_id(), None);
    }

    #[test]
    fn serializes_with_event_tag() {
        let json = serde_json::to_value(HubEvent::DeviceRemoved { device_id: id() }).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"event": "device_removed", "device_id": "001"})
        );
    }

    #[test]
    fn name_matches_serialized_tag() {
        let event = HubEvent::DeviceRegistered { device_id: id() };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], event.name());
    }
}
