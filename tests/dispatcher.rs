// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the dispatcher using the simulated driver.

use std::time::Duration;

use homecore::{
    ArmState, Capabilities, Device, DeviceId, Dispatcher, DriverError, Error, HomeConfig, HubConfig, HubEvent,
    Operation, Outcome, PowerState, RetryPolicy, SimulatedDriver, StateDelta, Temperature,
    ValueError,
};
use tokio::time::Instant;

const DRIVER_DELAY: Duration = Duration::from_millis(50);

fn id(value: &str) -> DeviceId {
    DeviceId::new(value).unwrap()
}

fn driver() -> SimulatedDriver {
    SimulatedDriver::new().with_delay(DRIVER_DELAY)
}

fn config() -> HubConfig {
    HubConfig::default().with_retry(
        RetryPolicy::default()
            .with_max_attempts(3)
            .with_initial_delay(Duration::from_millis(100)),
    )
}

/// A hub with a light "001", a thermostat "002" and an alarm "003".
fn home() -> Dispatcher<SimulatedDriver> {
    let hub = Dispatcher::with_config(driver(), config()).unwrap();
    hub.register_device(Device::light("001", "Living room").unwrap())
        .unwrap();
    hub.register_device(Device::thermostat("002", "Hallway").unwrap())
        .unwrap();
    hub.register_device(Device::security_system("003", "Alarm").unwrap())
        .unwrap();
    hub
}

// ============================================================================
// Registration
// ============================================================================

mod registration {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn new_devices_start_with_defaults() {
        let hub = home();

        let light = hub.get_device_state(&id("001")).unwrap();
        assert_eq!(light.power, PowerState::Off);
        assert_eq!(light.brightness().map(|b| b.value()), Some(0));

        let thermostat = hub.get_device_state(&id("002")).unwrap();
        assert_eq!(thermostat.power, PowerState::Off);
        assert_eq!(thermostat.current_temperature(), None);

        let alarm = hub.get_device_state(&id("003")).unwrap();
        assert_eq!(alarm.arm_state(), Some(ArmState::Disarmed));
    }

    #[tokio::test(start_paused = true)]
    async fn device_ids_are_sorted() {
        let hub = home();
        assert_eq!(hub.device_ids(), vec![id("001"), id("002"), id("003")]);
    }

    #[tokio::test(start_paused = true)]
    async fn remove_waits_for_queued_commands() {
        let hub = home();
        let lamp = id("001");
        let mut events = hub.subscribe();

        let first = hub.submit(&lamp, Operation::TurnOn).await.unwrap();
        let second = hub.submit(&lamp, Operation::SetBrightness(40)).await.unwrap();

        let removed = hub.remove_device(&lamp).await.unwrap();
        assert_eq!(removed.name(), "Living room");

        assert!(first.result().await.unwrap().is_success());
        assert!(second.result().await.unwrap().is_success());
        assert!(matches!(
            hub.get_device_state(&lamp),
            Err(Error::DeviceNotFound(_))
        ));
        assert!(matches!(
            hub.turn_on(&lamp).await,
            Err(Error::DeviceNotFound(_))
        ));

        let mut saw_removal = false;
        while let Ok(event) = events.try_recv() {
            if let HubEvent::DeviceRemoved { device_id } = event {
                assert_eq!(device_id, lamp);
                saw_removal = true;
            }
        }
        assert!(saw_removal);
    }

    #[tokio::test(start_paused = true)]
    async fn removed_id_can_be_registered_again() {
        let hub = home();
        hub.turn_on(&id("001")).await.unwrap();
        hub.remove_device(&id("001")).await.unwrap();

        hub.register_device(Device::light("001", "Kitchen").unwrap())
            .unwrap();
        let state = hub.get_device_state(&id("001")).unwrap();
        assert_eq!(state.power, PowerState::Off);
    }

    #[tokio::test(start_paused = true)]
    async fn capabilities_beyond_the_kind_are_refused() {
        let widened = Device::light("005", "Desk lamp")
            .unwrap()
            .with_capabilities(Capabilities::thermostat());
        assert!(matches!(
            widened,
            Err(ValueError::CapabilityMismatch { .. })
        ));

        let device: Device = serde_json::from_str(
            r#"{"id": "005", "name": "Desk lamp", "kind": "light",
                "capabilities": ["power", "temperature-target"]}"#,
        )
        .unwrap();
        let hub = home();
        assert!(matches!(
            hub.register_device(device),
            Err(Error::Value(ValueError::CapabilityMismatch { .. }))
        ));
        assert!(matches!(
            hub.set_temperature(&id("005"), 23).await,
            Err(Error::DeviceNotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn narrowed_capabilities_are_enforced() {
        let hub = home();
        let lamp = Device::light("005", "Hall switch")
            .unwrap()
            .with_capabilities(Capabilities::basic())
            .unwrap();
        hub.register_device(lamp).unwrap();

        assert!(hub.turn_on(&id("005")).await.unwrap().is_success());
        let dimmed = hub.set_brightness(&id("005"), 50).await.unwrap();
        assert!(matches!(
            dimmed.outcome,
            Outcome::InvalidInput(ValueError::UnsupportedOperation { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn loads_devices_from_json() {
        let config = HomeConfig::from_json(
            r#"{
                "hub": { "command_timeout_ms": 2000 },
                "devices": [
                    { "id": "001", "name": "Lamp", "kind": "light" },
                    { "id": "002", "name": "Thermostat", "kind": "thermostat" }
                ]
            }"#,
        )
        .unwrap();

        let hub = Dispatcher::from_home_config(driver(), config).unwrap();
        assert_eq!(hub.config().command_timeout, Duration::from_secs(2));
        assert_eq!(hub.device_ids(), vec![id("001"), id("002")]);
        assert!(hub.set_temperature(&id("002"), 21).await.unwrap().is_success());
    }
}

// ============================================================================
// Commands
// ============================================================================

mod commands {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn every_valid_brightness_is_stored_exactly() {
        let hub = home();
        let lamp = id("001");

        for level in 0..=100 {
            let result = hub.set_brightness(&lamp, level).await.unwrap();
            assert_eq!(result.outcome, Outcome::Success, "level {level}");
            let stored = hub.get_device_state(&lamp).unwrap().brightness().unwrap();
            assert_eq!(i64::from(stored.value()), level);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_range_brightness_is_rejected() {
        let hub = home();
        let lamp = id("001");
        hub.set_brightness(&lamp, 30).await.unwrap();
        let before = hub.get_device_state(&lamp).unwrap();
        let calls = hub.driver().invocations(&lamp);

        for level in [-1, 101, 150, i64::MAX] {
            let result = hub.set_brightness(&lamp, level).await.unwrap();
            assert!(
                matches!(
                    result.outcome,
                    Outcome::InvalidInput(ValueError::OutOfRange { .. })
                ),
                "level {level}"
            );
            assert_eq!(result.attempts, 0);
        }

        assert_eq!(hub.get_device_state(&lamp).unwrap(), before);
        assert_eq!(hub.driver().invocations(&lamp), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn turn_on_then_off() {
        let hub = home();
        let lamp = id("001");

        let on = hub.turn_on(&lamp).await.unwrap();
        let off = hub.turn_off(&lamp).await.unwrap();

        assert!(on.is_success());
        assert!(off.is_success());
        assert_eq!(hub.get_device_state(&lamp).unwrap().power, PowerState::Off);
    }

    #[tokio::test(start_paused = true)]
    async fn thermostat_setpoint() {
        let hub = home();
        let thermostat = id("002");

        assert!(hub.set_temperature(&thermostat, 23).await.unwrap().is_success());
        assert_eq!(
            hub.get_device_state(&thermostat).unwrap().target_temperature(),
            Some(Temperature::celsius(23))
        );

        let implausible = hub.set_temperature(&thermostat, 400).await.unwrap();
        assert!(matches!(implausible.outcome, Outcome::InvalidInput(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn arm_and_disarm() {
        let hub = home();
        let alarm = id("003");

        hub.arm(&alarm).await.unwrap();
        assert_eq!(
            hub.get_device_state(&alarm).unwrap().arm_state(),
            Some(ArmState::Armed)
        );
        hub.disarm(&alarm).await.unwrap();
        assert_eq!(
            hub.get_device_state(&alarm).unwrap().arm_state(),
            Some(ArmState::Disarmed)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unsupported_operation_is_invalid_input() {
        let hub = home();

        let result = hub.arm(&id("001")).await.unwrap();
        assert!(matches!(
            result.outcome,
            Outcome::InvalidInput(ValueError::UnsupportedOperation { .. })
        ));
        assert_eq!(hub.driver().invocations(&id("001")), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn same_device_commands_never_overlap() {
        let hub = home();
        let lamp = id("001");
        let mut events = hub.subscribe();

        let a = hub.submit(&lamp, Operation::TurnOn).await.unwrap();
        let b = hub.submit(&lamp, Operation::SetBrightness(60)).await.unwrap();
        let (a_id, b_id) = (a.id(), b.id());

        let a_result = a.result().await.unwrap();
        let b_result = b.result().await.unwrap();
        assert!(a_result.completed_at <= b_result.completed_at);

        let mut log = Vec::new();
        while let Ok(event) = events.try_recv() {
            match event {
                HubEvent::CommandStarted { command_id, .. } => log.push(("started", command_id)),
                HubEvent::CommandCompleted { result } => {
                    log.push(("completed", result.command_id));
                }
                _ => {}
            }
        }

        let a_done = log.iter().position(|e| *e == ("completed", a_id)).unwrap();
        let b_start = log.iter().position(|e| *e == ("started", b_id)).unwrap();
        assert!(a_done < b_start);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_device_does_not_delay_others() {
        let config = config().with_command_timeout(Duration::from_secs(60));
        let hub = Dispatcher::with_config(driver(), config).unwrap();
        hub.register_device(Device::light("slow", "Garage").unwrap())
            .unwrap();
        hub.register_device(Device::light("fast", "Kitchen").unwrap())
            .unwrap();
        hub.driver()
            .set_device_delay(&id("slow"), Duration::from_secs(30));

        let slow = hub.submit(&id("slow"), Operation::TurnOn).await.unwrap();
        let start = Instant::now();
        let fast = hub.turn_on(&id("fast")).await.unwrap();

        assert!(fast.is_success());
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(
            hub.get_device_state(&id("slow")).unwrap().power,
            PowerState::Off
        );

        assert!(slow.result().await.unwrap().is_success());
        assert!(start.elapsed() >= Duration::from_secs(30));
    }
}

// ============================================================================
// Retries
// ============================================================================

mod retries {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn timeouts_then_success_within_budget() {
        let hub = home();
        let lamp = id("001");
        hub.driver().inject_fault(&lamp, DriverError::Timeout(500));
        hub.driver().inject_fault(&lamp, DriverError::Timeout(500));

        let result = hub.turn_on(&lamp).await.unwrap();

        assert_eq!(result.outcome, Outcome::Success);
        assert_eq!(result.attempts, 3);
        assert_eq!(hub.driver().invocations(&lamp), 3);
        assert_eq!(hub.get_device_state(&lamp).unwrap().power, PowerState::On);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_waits_between_attempts() {
        let hub = Dispatcher::with_config(
            SimulatedDriver::new().with_delay(Duration::ZERO),
            config(),
        )
        .unwrap();
        let lamp = id("001");
        hub.register_device(Device::light("001", "Living room").unwrap())
            .unwrap();
        hub.driver().inject_fault(&lamp, DriverError::Timeout(500));
        hub.driver().inject_fault(&lamp, DriverError::Timeout(500));

        let start = Instant::now();
        let result = hub.turn_on(&lamp).await.unwrap();

        // 100 ms after the first failure, 200 ms after the second
        assert_eq!(result.attempts, 3);
        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_timeouts_report_timeout() {
        let hub = home();
        let lamp = id("001");
        for _ in 0..3 {
            hub.driver().inject_fault(&lamp, DriverError::Timeout(500));
        }

        let result = hub.turn_on(&lamp).await.unwrap();

        assert_eq!(result.outcome, Outcome::Timeout);
        assert_eq!(hub.driver().invocations(&lamp), 3);
        assert_eq!(hub.get_device_state(&lamp).unwrap().power, PowerState::Off);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_unavailability_is_device_error() {
        let hub = home();
        let lamp = id("001");
        for _ in 0..3 {
            hub.driver()
                .inject_fault(&lamp, DriverError::Unavailable("offline".into()));
        }

        let result = hub.turn_on(&lamp).await.unwrap();

        assert!(matches!(result.outcome, Outcome::DeviceError(_)));
        assert_eq!(result.attempts, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_response_is_not_retried() {
        let hub = home();
        let lamp = id("001");
        hub.driver()
            .inject_fault(&lamp, DriverError::MalformedResponse("garbage".into()));

        let result = hub.turn_on(&lamp).await.unwrap();

        assert!(matches!(result.outcome, Outcome::DeviceError(_)));
        assert_eq!(hub.driver().invocations(&lamp), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_stays_with_its_device() {
        let hub = home();
        hub.driver()
            .inject_fault(&id("001"), DriverError::MalformedResponse("garbage".into()));

        let failed = hub.turn_on(&id("001")).await.unwrap();
        let armed = hub.arm(&id("003")).await.unwrap();
        let retried = hub.turn_on(&id("001")).await.unwrap();

        assert!(!failed.is_success());
        assert!(armed.is_success());
        assert!(retried.is_success());
    }
}

// ============================================================================
// Cancellation and Shutdown
// ============================================================================

mod lifecycle {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn cancel_before_dispatch_skips_driver() {
        let hub = home();
        let lamp = id("001");

        let busy = hub.submit(&lamp, Operation::TurnOn).await.unwrap();
        let queued = hub.submit(&lamp, Operation::SetBrightness(90)).await.unwrap();
        queued.cancel();

        assert!(busy.result().await.unwrap().is_success());
        let cancelled = queued.result().await.unwrap();

        assert_eq!(cancelled.outcome, Outcome::Cancelled);
        assert_eq!(cancelled.attempts, 0);
        assert_eq!(hub.driver().invocations(&lamp), 1);
        assert_eq!(
            hub.get_device_state(&lamp).unwrap().brightness().map(|b| b.value()),
            Some(0)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_drains_queued_commands() {
        let hub = home();
        let mut handles = Vec::new();
        for device in ["001", "002", "003"] {
            handles.push(hub.submit(&id(device), Operation::TurnOn).await.unwrap());
            handles.push(hub.submit(&id(device), Operation::TurnOff).await.unwrap());
        }

        hub.shutdown().await;

        for handle in handles {
            assert!(handle.result().await.unwrap().is_success());
        }
        assert!(hub.is_shutting_down());
        assert!(matches!(hub.turn_on(&id("001")).await, Err(Error::ShuttingDown)));
        assert!(matches!(
            hub.register_device(Device::light("009", "Porch").unwrap()),
            Err(Error::ShuttingDown)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn state_survives_shutdown() {
        let hub = home();
        hub.turn_on(&id("001")).await.unwrap();
        hub.shutdown().await;

        assert_eq!(hub.get_device_state(&id("001")).unwrap().power, PowerState::On);
    }
}

// ============================================================================
// Telemetry and Events
// ============================================================================

mod telemetry {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn read_temperature_stores_reading() {
        let hub = home();
        let thermostat = id("002");

        let result = hub.read_temperature(&thermostat).await.unwrap();

        assert!(result.is_success());
        let reading = hub
            .get_device_state(&thermostat)
            .unwrap()
            .current_temperature()
            .unwrap();
        assert!((10..=39).contains(&reading.value()));
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_uses_driver_telemetry() {
        let hub = home();
        let thermostat = id("002");
        hub.driver()
            .set_sensor_reading(&thermostat, Temperature::celsius(19));

        let result = hub.refresh_telemetry(&thermostat).await.unwrap();

        assert_eq!(
            result.delta,
            Some(StateDelta::current_temperature(Temperature::celsius(19)))
        );
        assert_eq!(
            hub.get_device_state(&thermostat).unwrap().current_temperature(),
            Some(Temperature::celsius(19))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn ingest_validates_and_applies() {
        let hub = home();
        let thermostat = id("002");
        let reading = StateDelta::current_temperature(Temperature::celsius(21));

        assert!(hub.ingest_telemetry(&thermostat, reading.clone()).await.unwrap());
        assert!(!hub.ingest_telemetry(&thermostat, reading).await.unwrap());

        let implausible = StateDelta::current_temperature(Temperature::celsius(500));
        assert!(matches!(
            hub.ingest_telemetry(&thermostat, implausible).await,
            Err(Error::Value(ValueError::OutOfRange { .. }))
        ));

        let wrong_kind = StateDelta::current_temperature(Temperature::celsius(20));
        assert!(matches!(
            hub.ingest_telemetry(&id("001"), wrong_kind).await,
            Err(Error::Value(ValueError::UnsupportedOperation { .. }))
        ));
        assert_eq!(
            hub.get_device_state(&thermostat).unwrap().current_temperature(),
            Some(Temperature::celsius(21))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn command_publishes_state_change_then_completion() {
        let hub = home();
        let lamp = id("001");
        let mut events = hub.subscribe();

        hub.set_brightness(&lamp, 80).await.unwrap();

        match events.recv().await.unwrap() {
            HubEvent::CommandStarted { attempt, .. } => assert_eq!(attempt, 1),
            other => panic!("unexpected event: {other:?}"),
        }
        match events.recv().await.unwrap() {
            HubEvent::StateChanged { snapshot, .. } => {
                assert_eq!(snapshot.brightness().map(|b| b.value()), Some(80));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        match events.recv().await.unwrap() {
            HubEvent::CommandCompleted { result } => assert!(result.is_success()),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn device_subscription_sees_only_its_device() {
        let hub = home();
        let mut alarm_events = hub.subscribe_device(&id("003")).unwrap();

        hub.turn_on(&id("001")).await.unwrap();
        hub.arm(&id("003")).await.unwrap();

        let first = alarm_events.recv().await.unwrap();
        assert_eq!(first.device_id(), &id("003"));
        assert!(matches!(first, HubEvent::CommandStarted { .. }));
        assert!(matches!(
            hub.subscribe_device(&id("404")),
            Err(Error::DeviceNotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_state_publishes_no_state_event() {
        let hub = home();
        let lamp = id("001");
        hub.turn_off(&lamp).await.unwrap();

        let mut events = hub.subscribe();
        hub.turn_off(&lamp).await.unwrap();

        let mut changes = 0;
        while let Ok(event) = events.try_recv() {
            if event.is_state_change() {
                changes += 1;
            }
        }
        assert_eq!(changes, 0);
    }
}
