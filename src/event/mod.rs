// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event channel for dispatcher activity.
//!
//! Callers observe the hub through structured [`HubEvent`]s rather than log
//! text. The [`EventBus`] uses tokio's broadcast channel so any number of
//! subscribers receive every event.
//!
//! # Examples
//!
//! ```
//! use homecore::DeviceId;
//! use homecore::event::{EventBus, HubEvent};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(HubEvent::DeviceRegistered { device_id: DeviceId::new("001").unwrap() });
//! ```

mod event_bus;
mod hub_event;

pub use event_bus::{DeviceEvents, EventBus};
pub use hub_event::HubEvent;
