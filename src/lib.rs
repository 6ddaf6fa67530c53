// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `homecore` - async coordination core for smart-home devices.
//!
//! The crate accepts commands for lights, thermostats and security systems,
//! validates them against a typed device model, dispatches them to a
//! pluggable [`DeviceDriver`] and keeps a consistent snapshot of every
//! device.
//!
//! # Features
//!
//! - **Per-device queues**: commands for one device run in submission order,
//!   devices never wait on each other
//! - **Validation**: out-of-range values and unsupported operations are
//!   rejected before any driver call
//! - **Retries**: timeouts and unavailable devices are retried with
//!   exponential backoff
//! - **Observability**: structured [`HubEvent`]s on a broadcast channel and
//!   `tracing` diagnostics
//!
//! # Quick Start
//!
//! ```
//! use std::time::Duration;
//!
//! use homecore::{Device, Dispatcher, SimulatedDriver};
//!
//! #[tokio::main]
//! async fn main() -> homecore::Result<()> {
//!     let driver = SimulatedDriver::new().with_delay(Duration::from_millis(1));
//!     let hub = Dispatcher::new(driver);
//!
//!     let lamp = Device::light("001", "Living room")?;
//!     let thermostat = Device::thermostat("002", "Hallway")?;
//!     let (lamp_id, thermostat_id) = (lamp.id().clone(), thermostat.id().clone());
//!     hub.register_device(lamp)?;
//!     hub.register_device(thermostat)?;
//!
//!     hub.turn_on(&lamp_id).await?;
//!     hub.set_brightness(&lamp_id, 80).await?;
//!     hub.set_temperature(&thermostat_id, 23).await?;
//!
//!     // Out of range: reported in the result, the store is untouched
//!     let rejected = hub.set_brightness(&lamp_id, 150).await?;
//!     assert!(!rejected.is_success());
//!
//!     let state = hub.get_device_state(&lamp_id)?;
//!     assert!(state.power.is_on());
//!
//!     hub.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Loading Devices from JSON
//!
//! ```
//! use homecore::{Dispatcher, SimulatedDriver};
//! use homecore::config::HomeConfig;
//!
//! #[tokio::main]
//! async fn main() -> homecore::Result<()> {
//!     let config = HomeConfig::from_json(r#"{
//!         "hub": { "retry": { "max_attempts": 5 } },
//!         "devices": [
//!             { "id": "001", "name": "Lamp", "kind": "light" },
//!             { "id": "003", "name": "Alarm", "kind": "security_system" }
//!         ]
//!     }"#)?;
//!
//!     let hub = Dispatcher::from_home_config(SimulatedDriver::new(), config)?;
//!     assert_eq!(hub.device_ids().len(), 2);
//!     Ok(())
//! }
//! ```

mod capabilities;
pub mod command;
pub mod config;
mod device;
pub mod dispatcher;
pub mod driver;
pub mod error;
pub mod event;
pub mod state;
mod store;
pub mod types;

pub use capabilities::{Capabilities, CapabilitiesBuilder, Capability};
pub use command::{Command, CommandId, CommandResult, Operation, Outcome};
pub use config::{HomeConfig, HubConfig, RetryPolicy};
pub use device::{Device, DeviceId, DeviceKind};
pub use dispatcher::{CancelToken, CommandHandle, Dispatcher};
pub use driver::{DeviceDriver, SimulatedDriver};
pub use error::{ConfigError, DriverError, Error, Result, ValueError};
pub use event::{DeviceEvents, EventBus, HubEvent};
pub use state::{DeviceState, KindState, StateDelta};
pub use store::StateStore;
pub use types::{ArmState, Brightness, PowerState, Temperature, TemperatureRange};
