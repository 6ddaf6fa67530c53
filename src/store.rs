// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Last-known state of every registered device.
//!
//! The store is a concurrency-safe map from [`DeviceId`] to snapshot. Reads
//! can happen from anywhere at any time. Writes for a given device only come
//! from that device's dispatcher queue, so there is a single writer per id.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;

use crate::device::{Device, DeviceId};
use crate::error::Error;
use crate::state::{DeviceState, StateDelta};

struct Entry {
    device: Device,
    state: DeviceState,
    state_tx: watch::Sender<DeviceState>,
}

/// Concurrency-safe map of device snapshots.
///
/// Cloning shares the same underlying map.
///
/// # Examples
///
/// ```
/// use homecore::{Device, StateStore};
/// use homecore::state::StateDelta;
///
/// let store = StateStore::new();
/// let light = Device::light("001", "Living Room Light").unwrap();
/// let id = light.id().clone();
/// store.insert(light).unwrap();
///
/// assert_eq!(store.apply_delta(&id, &StateDelta::power_on()), Some(true));
/// assert!(store.get(&id).unwrap().power.is_on());
/// ```
#[derive(Clone, Default)]
pub struct StateStore {
    entries: Arc<RwLock<HashMap<DeviceId, Entry>>>,
}

impl StateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a device with its initial snapshot.
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateDevice` if the id is already present.
    pub fn insert(&self, device: Device) -> Result<(), Error> {
        let mut entries = self.entries.write();
        if entries.contains_key(device.id()) {
            return Err(Error::DuplicateDevice(device.id().clone()));
        }
        let state = device.initial_state();
        let (state_tx, _) = watch::channel(state.clone());
        entries.insert(
            device.id().clone(),
            Entry {
                device,
                state,
                state_tx,
            },
        );
        Ok(())
    }

    /// Removes a device, returning its descriptor.
    pub fn remove(&self, id: &DeviceId) -> Option<Device> {
        self.entries.write().remove(id).map(|entry| entry.device)
    }

    /// Returns `true` if the device is present.
    #[must_use]
    pub fn contains(&self, id: &DeviceId) -> bool {
        self.entries.read().contains_key(id)
    }

    /// Returns the current snapshot of a device.
    #[must_use]
    pub fn get(&self, id: &DeviceId) -> Option<DeviceState> {
        self.entries.read().get(id).map(|entry| entry.state.clone())
    }

    /// Returns the descriptor of a device.
    #[must_use]
    pub fn device(&self, id: &DeviceId) -> Option<Device> {
        self.entries.read().get(id).map(|entry| entry.device.clone())
    }

    /// Returns all descriptors, ordered by id.
    #[must_use]
    pub fn devices(&self) -> Vec<Device> {
        let mut devices: Vec<_> = self
            .entries
            .read()
            .values()
            .map(|entry| entry.device.clone())
            .collect();
        devices.sort_by(|a, b| a.id().cmp(b.id()));
        devices
    }

    /// Returns the number of devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if no device is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Applies a delta to a device's snapshot.
    ///
    /// Returns `None` if the device is unknown, otherwise whether the
    /// snapshot changed. Watchers are only notified on change.
    pub fn apply_delta(&self, id: &DeviceId, delta: &StateDelta) -> Option<bool> {
        let mut entries = self.entries.write();
        let entry = entries.get_mut(id)?;
        let changed = entry.state.apply(delta);
        if changed {
            entry.state_tx.send_replace(entry.state.clone());
        }
        Some(changed)
    }

    /// Creates a receiver that sees every new snapshot of a device.
    #[must_use]
    pub fn watch(&self, id: &DeviceId) -> Option<watch::Receiver<DeviceState>> {
        self.entries
            .read()
            .get(id)
            .map(|entry| entry.state_tx.subscribe())
    }
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore")
            .field("devices", &self.len())
            .finish()
    }
}
