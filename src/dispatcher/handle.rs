// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Handles for submitted commands.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::oneshot;

use crate::command::{Command, CommandId, CommandResult};
use crate::error::{Error, Result};

/// Cooperative cancellation flag for one command.
///
/// The device queue checks the flag once, when it dequeues the command.
/// Cancelling later has no effect on a driver call already in progress.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns `true` once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// A queued command whose result has not been collected yet.
///
/// Dropping the handle does not cancel the command.
#[derive(Debug)]
pub struct CommandHandle {
    command: Command,
    cancel: CancelToken,
    result_rx: oneshot::Receiver<CommandResult>,
}

impl CommandHandle {
    pub(crate) fn new(
        command: Command,
        cancel: CancelToken,
        result_rx: oneshot::Receiver<CommandResult>,
    ) -> Self {
        Self {
            command,
            cancel,
            result_rx,
        }
    }

    /// Returns the submitted command.
    #[must_use]
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Returns the command id.
    #[must_use]
    pub fn id(&self) -> CommandId {
        self.command.id()
    }

    /// Cancels the command if it has not been dispatched yet.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns a token that can cancel the command from elsewhere.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Waits for the terminal result.
    ///
    /// # Errors
    ///
    /// Returns `Error::QueueClosed` if the device queue stopped without
    /// producing a result.
    pub async fn result(self) -> Result<CommandResult> {
        let device_id = self.command.device_id().clone();
        self.result_rx
            .await
            .map_err(|_| Error::QueueClosed(device_id))
    }
}
