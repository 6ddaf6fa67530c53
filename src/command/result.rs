// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::device::DeviceId;
use crate::error::ValueError;
use crate::state::StateDelta;

use super::{Command, CommandId, Operation};

/// How a command ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    /// The driver applied the command.
    Success,
    /// The payload or target failed validation; the driver was not called.
    InvalidInput(ValueError),
    /// Every attempt timed out.
    Timeout,
    /// The device failed terminally or stayed unavailable.
    DeviceError(String),
    /// The command was cancelled before it was dispatched.
    Cancelled,
}

impl Outcome {
    /// Returns `true` for [`Outcome::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns a short label for logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::InvalidInput(_) => "invalid_input",
            Self::Timeout => "timeout",
            Self::DeviceError(_) => "device_error",
            Self::Cancelled => "cancelled",
        }
    }
}

/// The terminal result of a command. Produced exactly once per command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    /// The command this result belongs to.
    pub command_id: CommandId,
    /// The target device.
    pub device_id: DeviceId,
    /// The operation that was requested.
    pub operation: Operation,
    /// How the command ended.
    pub outcome: Outcome,
    /// The change the driver reported, on success.
    pub delta: Option<StateDelta>,
    /// Number of driver invocations made.
    pub attempts: u32,
    /// When the result was produced.
    pub completed_at: DateTime<Utc>,
}

impl CommandResult {
    pub(crate) fn new(
        command: &Command,
        outcome: Outcome,
        delta: Option<StateDelta>,
        attempts: u32,
    ) -> Self {
        Self {
            command_id: command.id(),
            device_id: command.device_id().clone(),
            operation: command.operation().clone(),
            outcome,
            delta,
            attempts,
            completed_at: Utc::now(),
        }
    }

    /// Returns `true` if the command succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_labels() {
        assert_eq!(Outcome::Success.label(), "success");
        assert_eq!(Outcome::Cancelled.label(), "cancelled");
        assert_eq!(Outcome::DeviceError("x".into()).label(), "device_error");
    }

    #[test]
    fn result_copies_command_fields() {
        let cmd = Command::new(DeviceId::new("002").unwrap(), Operation::TurnOff);
        let result = CommandResult::new(&cmd, Outcome::Timeout, None, 3);
        assert_eq!(result.command_id, cmd.id());
        assert_eq!(result.device_id.as_str(), "002");
        assert_eq!(result.operation, Operation::TurnOff);
        assert_eq!(result.attempts, 3);
        assert!(!result.is_success());
    }
}
