// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for device control.
//!
//! Each constrained type checks its range at construction time, so a value
//! that exists is always valid.
//!
//! # Types
//!
//! - [`PowerState`] - On/Off state shared by every device
//! - [`Brightness`] - Light level (0-100%)
//! - [`Temperature`] - Signed whole degrees Celsius
//! - [`TemperatureRange`] - Plausible bounds for temperature values
//! - [`ArmState`] - Armed/Disarmed state of a security system

mod arm;
mod brightness;
mod power;
mod temperature;

pub use arm::ArmState;
pub use brightness::Brightness;
pub use power::PowerState;
pub use temperature::{Temperature, TemperatureRange};
