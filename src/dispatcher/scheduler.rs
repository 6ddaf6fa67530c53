// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry of device queue tasks.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::device::DeviceId;
use crate::error::{Error, Result};

use super::worker::Job;

struct DeviceQueue {
    sender: mpsc::Sender<Job>,
    task: JoinHandle<()>,
}

/// Owns one queue task per device and coordinates shutdown.
pub(crate) struct Scheduler {
    queues: RwLock<HashMap<DeviceId, DeviceQueue>>,
    accepting: AtomicBool,
}

impl Scheduler {
    pub(crate) fn new() -> Self {
        Self {
            queues: RwLock::new(HashMap::new()),
            accepting: AtomicBool::new(true),
        }
    }

    pub(crate) fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::Acquire)
    }

    pub(crate) fn len(&self) -> usize {
        self.queues.read().len()
    }

    /// Returns `true` if a queue is running for the device.
    pub(crate) fn contains(&self, id: &DeviceId) -> bool {
        self.queues.read().contains_key(id)
    }

    /// Spawns the queue task for a device.
    ///
    /// `admit` runs under the registry lock right before the task is
    /// spawned; if it fails nothing is spawned. The task is only spawned if
    /// the scheduler still accepts work and no queue exists for the id.
    pub(crate) fn start<F, A>(
        &self,
        id: DeviceId,
        sender: mpsc::Sender<Job>,
        task: F,
        admit: A,
    ) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
        A: FnOnce() -> Result<()>,
    {
        let mut queues = self.queues.write();
        if !self.is_accepting() {
            return Err(Error::ShuttingDown);
        }
        if queues.contains_key(&id) {
            return Err(Error::DuplicateDevice(id));
        }
        admit()?;

        let task = tokio::spawn(task);
        queues.insert(id, DeviceQueue { sender, task });
        Ok(())
    }

    /// Returns a sender into the device's queue.
    pub(crate) fn sender(&self, id: &DeviceId) -> Result<mpsc::Sender<Job>> {
        let queues = self.queues.read();
        if !self.is_accepting() {
            return Err(Error::ShuttingDown);
        }
        queues
            .get(id)
            .map(|queue| queue.sender.clone())
            .ok_or_else(|| Error::DeviceNotFound(id.clone()))
    }

    /// Closes a device queue. The returned task finishes once every job
    /// already queued has been processed.
    ///
    /// Without a running queue `idle` runs instead, under the registry lock,
    /// so no queue can be started for the id meanwhile.
    pub(crate) fn close<I: FnOnce()>(&self, id: &DeviceId, idle: I) -> Option<JoinHandle<()>> {
        let mut queues = self.queues.write();
        let task = queues.remove(id).map(|queue| queue.task);
        if task.is_none() {
            idle();
        }
        task
    }

    /// Stops accepting work and waits until every queue has drained.
    pub(crate) async fn shutdown(&self) {
        let drained: Vec<(DeviceId, JoinHandle<()>)> = {
            let mut queues = self.queues.write();
            self.accepting.store(false, Ordering::Release);
            queues
                .drain()
                .map(|(id, queue)| (id, queue.task))
                .collect()
        };

        for (device_id, task) in drained {
            if let Err(e) = task.await {
                tracing::error!(%device_id, error = %e, "Device queue task failed");
            }
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("queues", &self.len())
            .field("accepting", &self.is_accepting())
            .finish()
    }
}
