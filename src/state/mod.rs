// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state types.
//!
//! [`DeviceState`] is the last-known snapshot of a device. [`StateDelta`]
//! is a discrete change produced by a driver or by telemetry, applied to a
//! snapshot by the dispatcher.
//!
//! # Examples
//!
//! ```
//! use homecore::DeviceKind;
//! use homecore::state::{DeviceState, StateDelta};
//! use homecore::types::PowerState;
//!
//! let mut state = DeviceState::initial(DeviceKind::Light);
//! assert!(state.apply(&StateDelta::power_on()));
//! assert_eq!(state.power, PowerState::On);
//! ```

mod delta;
mod device_state;

pub use delta::StateDelta;
pub use device_state::{DeviceState, KindState};
