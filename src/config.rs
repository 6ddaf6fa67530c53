// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration types.
//!
//! [`HubConfig`] tunes the dispatcher; [`HomeConfig`] adds the list of
//! devices to register at startup and can be loaded from JSON. Durations are
//! written in milliseconds and every field has a default.
//!
//! # Examples
//!
//! ```
//! use homecore::config::HomeConfig;
//!
//! let config = HomeConfig::from_json(r#"{
//!     "hub": { "command_timeout_ms": 2000, "retry": { "max_attempts": 5 } },
//!     "devices": [
//!         { "id": "001", "name": "Living Room Light", "kind": "light" },
//!         { "id": "003", "name": "Living Room Thermostat", "kind": "thermostat" }
//!     ]
//! }"#).unwrap();
//!
//! assert_eq!(config.hub.retry.max_attempts, 5);
//! assert_eq!(config.devices.len(), 2);
//! ```

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::device::Device;
use crate::error::ConfigError;
use crate::types::TemperatureRange;

/// Default capacity of the event channel.
pub(crate) const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Default capacity of each per-device command queue.
const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Settings for the [`Dispatcher`](crate::Dispatcher).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use homecore::config::{HubConfig, RetryPolicy};
///
/// let config = HubConfig::default()
///     .with_command_timeout(Duration::from_secs(2))
///     .with_retry(RetryPolicy::new().with_max_attempts(5));
/// assert_eq!(config.retry.max_attempts, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Retry policy for transient driver failures.
    pub retry: RetryPolicy,
    /// Upper bound for a single driver call.
    #[serde(rename = "command_timeout_ms", with = "duration_ms")]
    pub command_timeout: Duration,
    /// Plausible temperatures for setpoints and readings.
    pub temperature_range: TemperatureRange,
    /// Capacity of the event channel.
    pub event_capacity: usize,
    /// Capacity of each per-device command queue.
    pub queue_capacity: usize,
}

impl HubConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the per-call driver timeout.
    #[must_use]
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Sets the plausible temperature range.
    #[must_use]
    pub fn with_temperature_range(mut self, range: TemperatureRange) -> Self {
        self.temperature_range = range;
        self
    }

    /// Sets the event channel capacity.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Sets the per-device queue capacity.
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Checks that the settings are usable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for zero capacities, a zero timeout,
    /// zero retry attempts or an inverted temperature range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.event_capacity == 0 || self.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "event and queue capacities must be positive".to_string(),
            ));
        }
        if self.command_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "command timeout must be positive".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry policy must allow at least one attempt".to_string(),
            ));
        }
        if !self.temperature_range.is_well_formed() {
            return Err(ConfigError::Invalid(format!(
                "temperature range {}..={} is inverted",
                self.temperature_range.min, self.temperature_range.max
            )));
        }
        Ok(())
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            command_timeout: Duration::from_secs(5),
            temperature_range: TemperatureRange::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Retry policy for transient driver failures.
///
/// `max_attempts` counts every driver invocation, the first one included.
/// Delays grow exponentially from `initial_delay` up to `max_delay`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use homecore::config::RetryPolicy;
///
/// let policy = RetryPolicy::new()
///     .with_max_attempts(4)
///     .with_initial_delay(Duration::from_millis(100))
///     .with_max_delay(Duration::from_secs(1));
///
/// assert!(policy.should_retry(3));
/// assert!(!policy.should_retry(4));
/// assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
/// assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(200));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total number of driver invocations allowed per command.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    #[serde(rename = "initial_delay_ms", with = "duration_ms")]
    pub initial_delay: Duration,
    /// Upper bound for any delay.
    #[serde(rename = "max_delay_ms", with = "duration_ms")]
    pub max_delay: Duration,
    /// Multiplier applied after each failed attempt.
    pub backoff_multiplier: f32,
}

impl RetryPolicy {
    /// Creates a new retry policy with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a policy that never retries.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Sets the total number of attempts.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the delay before the first retry.
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay between attempts.
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    #[must_use]
    pub fn with_backoff_multiplier(mut self, multiplier: f32) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Returns the delay to wait after `attempts_made` failed attempts.
    #[must_use]
    pub fn delay_for_attempt(&self, attempts_made: u32) -> Duration {
        let exponent = attempts_made.saturating_sub(1);
        if exponent == 0 {
            return self.initial_delay.min(self.max_delay);
        }

        let multiplier = self
            .backoff_multiplier
            .powi(i32::try_from(exponent).unwrap_or(i32::MAX));

        // Delays are seconds at most, far from f32 precision limits
        #[allow(clippy::cast_precision_loss)]
        let delay_ms = self.initial_delay.as_millis() as f32 * multiplier;

        // Non-negative because both factors are; saturates on overflow
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let delay = Duration::from_millis(delay_ms as u64);

        delay.min(self.max_delay)
    }

    /// Returns true if another attempt is allowed after `attempts_made`.
    #[must_use]
    pub fn should_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

/// Hub settings plus the devices to register at startup.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeConfig {
    /// Dispatcher settings.
    pub hub: HubConfig,
    /// Devices registered when the dispatcher is built.
    pub devices: Vec<Device>,
}

impl HomeConfig {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Json` on malformed JSON and
    /// `ConfigError::Invalid` if [`validate`](Self::validate) fails.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks hub settings and every device: ids must be unique and each
    /// capability list must fit the device kind.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.hub.validate()?;
        let mut seen = HashSet::new();
        for device in &self.devices {
            device
                .check_capabilities()
                .map_err(|e| ConfigError::Invalid(format!("device {}: {e}", device.id())))?;
            if !seen.insert(device.id()) {
                return Err(ConfigError::Invalid(format!(
                    "device id {} is listed twice",
                    device.id()
                )));
            }
        }
        Ok(())
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
