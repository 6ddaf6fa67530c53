// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event bus for broadcasting hub events.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::config::DEFAULT_EVENT_CAPACITY;
use crate::device::DeviceId;
use crate::error::ConfigError;

use super::HubEvent;

/// Broadcast channel carrying every [`HubEvent`] of a dispatcher.
///
/// # Capacity
///
/// The bus keeps at most `capacity` undelivered events per subscriber. A
/// subscriber that falls behind loses the oldest events and receives
/// `RecvError::Lagged`.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<HubEvent>,
}

impl EventBus {
    /// Creates a bus with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(DEFAULT_EVENT_CAPACITY);
        Self { sender }
    }

    /// Creates a bus holding up to `capacity` events per subscriber.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::Invalid(
                "event_capacity must be at least 1".to_string(),
            ));
        }
        let (sender, _) = broadcast::channel(capacity);
        Ok(Self { sender })
    }

    /// Subscribes to all events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<HubEvent> {
        self.sender.subscribe()
    }

    /// Subscribes to the events of a single device.
    #[must_use]
    pub fn subscribe_device(&self, device_id: DeviceId) -> DeviceEvents {
        DeviceEvents {
            device_id,
            rx: self.sender.subscribe(),
        }
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishes an event and returns how many subscribers will see it.
    pub fn publish(&self, event: HubEvent) -> usize {
        let device_id = event.device_id().clone();
        let kind = event.name();
        // No subscribers is not an error
        let delivered = self.sender.send(event).unwrap_or(0);
        tracing::trace!(%device_id, event = kind, delivered, "Published hub event");
        delivered
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver that only yields the events of one device.
#[derive(Debug)]
pub struct DeviceEvents {
    device_id: DeviceId,
    rx: broadcast::Receiver<HubEvent>,
}

impl DeviceEvents {
    /// Returns the device this receiver follows.
    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Waits for the next event of the device.
    ///
    /// # Errors
    ///
    /// Same as [`broadcast::Receiver::recv`]: `Lagged` if events were
    /// dropped, `Closed` once the dispatcher is gone.
    pub async fn recv(&mut self) -> Result<HubEvent, RecvError> {
        loop {
            let event = self.rx.recv().await?;
            if event.device_id() == &self.device_id {
                return Ok(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registered(id: &str) -> HubEvent {
        HubEvent::DeviceRegistered {
            device_id: DeviceId::new(id).unwrap(),
        }
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(
            EventBus::with_capacity(0),
            Err(ConfigError::Invalid(_))
        ));
        assert!(EventBus::with_capacity(1).is_ok());
    }

    #[test]
    fn publish_reports_delivery_count() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(registered("001")), 0);

        let _rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
        assert_eq!(bus.publish(registered("001")), 2);
    }

    #[tokio::test]
    async fn publish_delivers_to_multiple_subscribers() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(registered("001"));

        assert_eq!(rx1.recv().await.unwrap().device_id().as_str(), "001");
        assert_eq!(rx2.recv().await.unwrap().device_id().as_str(), "001");
    }

    #[tokio::test]
    async fn device_subscription_skips_other_devices() {
        let bus = EventBus::new();
        let mut events = bus.subscribe_device(DeviceId::new("002").unwrap());

        bus.publish(registered("001"));
        bus.publish(registered("002"));
        bus.publish(registered("003"));

        assert_eq!(events.recv().await.unwrap().device_id().as_str(), "002");
        drop(bus);
        assert!(matches!(events.recv().await, Err(RecvError::Closed)));
    }

    #[test]
    fn clone_shares_same_channel() {
        let bus1 = EventBus::new();
        let bus2 = bus1.clone();

        let _rx = bus1.subscribe();
        assert_eq!(bus2.subscriber_count(), 1);
    }
}
