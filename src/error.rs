// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `homecore` library.
//!
//! Errors fall into two groups. Caller errors ([`Error::DeviceNotFound`],
//! [`Error::ShuttingDown`], configuration problems) are returned directly
//! from the [`Dispatcher`](crate::Dispatcher) API. Per-command failures
//! (validation, driver faults) never surface as `Err`: they are folded into
//! the [`Outcome`](crate::command::Outcome) of that command's result so one
//! failing device cannot disturb another.

use thiserror::Error;

use crate::device::DeviceId;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// A value failed validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// A driver call failed.
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),

    /// Configuration could not be loaded or is inconsistent.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// No device with this id is registered.
    #[error("device {0} not found")]
    DeviceNotFound(DeviceId),

    /// A device with this id is already registered.
    #[error("device {0} is already registered")]
    DuplicateDevice(DeviceId),

    /// The dispatcher is shutting down and no longer accepts work.
    #[error("dispatcher is shutting down")]
    ShuttingDown,

    /// The device queue stopped before producing a result.
    #[error("command queue for device {0} closed")]
    QueueClosed(DeviceId),
}

/// Errors related to value validation and constraints.
///
/// These are produced by the pure validation functions of the device model
/// and are reported to callers as
/// [`Outcome::InvalidInput`](crate::command::Outcome::InvalidInput).
#[derive(Debug, Error, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("{field} value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Name of the constrained quantity.
        field: String,
        /// Minimum allowed value.
        min: i64,
        /// Maximum allowed value.
        max: i64,
        /// The actual value that was provided.
        actual: i64,
    },

    /// The device lacks the capability the operation needs.
    #[error("operation {operation} requires the {capability} capability")]
    UnsupportedOperation {
        /// The requested operation name.
        operation: String,
        /// The missing capability.
        capability: String,
    },

    /// A capability was granted that the device kind has no state for.
    #[error("{kind} devices cannot have the {capability} capability")]
    CapabilityMismatch {
        /// The device kind.
        kind: String,
        /// The capability outside the kind's state.
        capability: String,
    },

    /// Device ids must not be empty.
    #[error("device id must not be empty")]
    EmptyDeviceId,
}

/// Errors reported by a [`DeviceDriver`](crate::driver::DeviceDriver).
///
/// `Unavailable` and `Timeout` are transient and retried by the dispatcher;
/// `MalformedResponse` is terminal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// The device or its transport cannot be reached.
    #[error("driver unavailable: {0}")]
    Unavailable(String),

    /// The device did not answer in time.
    #[error("driver timed out after {0} ms")]
    Timeout(u64),

    /// The device answered with something that could not be understood.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl DriverError {
    /// Returns `true` if the failure may go away on a later attempt.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

/// Errors related to loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration parsed but is not usable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
