// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Temperature values and their plausible range.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// A temperature in whole degrees Celsius.
///
/// The type itself accepts any `i32`; plausibility is checked against a
/// [`TemperatureRange`] when a command is validated.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Temperature(i32);

impl Temperature {
    /// Creates a temperature from degrees Celsius.
    #[must_use]
    pub const fn celsius(degrees: i32) -> Self {
        Self(degrees)
    }

    /// Returns the value in degrees Celsius.
    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°C", self.0)
    }
}

/// Inclusive bounds for temperatures a device may be asked to hold or report.
///
/// # Examples
///
/// ```
/// use homecore::types::TemperatureRange;
///
/// let range = TemperatureRange::default();
/// assert_eq!(range.check(23).unwrap().value(), 23);
/// assert!(range.check(200).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemperatureRange {
    /// Lowest accepted value.
    pub min: i32,
    /// Highest accepted value.
    pub max: i32,
}

impl TemperatureRange {
    /// Creates a range.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if `min` is greater than `max`.
    pub fn new(min: i32, max: i32) -> Result<Self, ValueError> {
        if min > max {
            return Err(ValueError::OutOfRange {
                field: "temperature range minimum".to_string(),
                min: i64::MIN,
                max: i64::from(max),
                actual: i64::from(min),
            });
        }
        Ok(Self { min, max })
    }

    /// Returns `true` if `min <= max`.
    #[must_use]
    pub const fn is_well_formed(&self) -> bool {
        self.min <= self.max
    }

    /// Returns `true` if the value lies inside the range.
    #[must_use]
    pub fn contains(&self, value: i64) -> bool {
        (i64::from(self.min)..=i64::from(self.max)).contains(&value)
    }

    /// Checks an unchecked integer payload against the range.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if the value is outside the range.
    pub fn check(&self, value: i64) -> Result<Temperature, ValueError> {
        if !self.contains(value) {
            return Err(ValueError::OutOfRange {
                field: "temperature".to_string(),
                min: i64::from(self.min),
                max: i64::from(self.max),
                actual: value,
            });
        }
        // In range means it fits in i32.
        i32::try_from(value)
            .map(Temperature)
            .map_err(|_| ValueError::OutOfRange {
                field: "temperature".to_string(),
                min: i64::from(self.min),
                max: i64::from(self.max),
                actual: value,
            })
    }
}

impl Default for TemperatureRange {
    fn default() -> Self {
        Self { min: -30, max: 60 }
    }
}
