// SPDX-License-Identifier: MPL-2.0

//! Demo program: run a short evening routine against simulated devices.
//!
//! Two lights, a thermostat and a security system are driven through the
//! dispatcher. Every command result is printed from the event channel.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=homecore=debug cargo run --example smart_home
//! ```

use homecore::{
    Device, DeviceId, Dispatcher, HubEvent, Outcome, SimulatedDriver, StateDelta,
};
use tokio::sync::broadcast::error::RecvError;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "homecore=info".into()),
        )
        .init();

    let hub = Dispatcher::new(SimulatedDriver::new());
    let printer = tokio::spawn(print_events(hub.subscribe()));

    let devices = [
        Device::light("001", "Living room light")?,
        Device::light("002", "Bedroom light")?,
        Device::thermostat("003", "Thermostat")?,
        Device::security_system("004", "Front door alarm")?,
    ];
    for device in devices {
        hub.register_device(device)?;
    }

    let living_room = DeviceId::new("001")?;
    let bedroom = DeviceId::new("002")?;
    let thermostat = DeviceId::new("003")?;
    let alarm = DeviceId::new("004")?;

    // Both lights switch on together; each device has its own queue
    let (a, b) = tokio::join!(hub.turn_on(&living_room), hub.turn_on(&bedroom));
    a?;
    b?;

    hub.set_brightness(&living_room, 80).await?;
    hub.set_temperature(&thermostat, 23).await?;
    hub.read_temperature(&thermostat).await?;
    hub.arm(&alarm).await?;

    let (a, b) = tokio::join!(hub.turn_off(&living_room), hub.turn_off(&bedroom));
    a?;
    b?;

    hub.disarm(&alarm).await?;

    // Rejected before reaching the driver
    hub.set_brightness(&bedroom, 120).await?;

    hub.shutdown().await;

    let mut summary = Vec::new();
    for id in hub.device_ids() {
        let device = hub.device(&id)?;
        let state = hub.get_device_state(&id)?;
        summary.push(format!("  {id} {:<20} {}", device.name(), serde_json::to_string(&state)?));
    }

    // The event channel closes with the last dispatcher handle
    drop(hub);
    printer.await?;

    println!("Final state:");
    for line in summary {
        println!("{line}");
    }
    Ok(())
}

async fn print_events(mut events: tokio::sync::broadcast::Receiver<HubEvent>) {
    loop {
        match events.recv().await {
            Ok(HubEvent::CommandCompleted { result }) => match &result.outcome {
                Outcome::Success => match &result.delta {
                    Some(StateDelta::CurrentTemperature(t)) => {
                        println!("[{}] {} -> current temperature {t}", result.device_id, result.operation);
                    }
                    _ => println!("[{}] {} -> ok", result.device_id, result.operation),
                },
                outcome => println!(
                    "[{}] {} -> {} ({outcome:?})",
                    result.device_id,
                    result.operation,
                    outcome.label()
                ),
            },
            Ok(HubEvent::DeviceRegistered { device_id }) => println!("[{device_id}] registered"),
            Ok(_) => {}
            Err(RecvError::Lagged(missed)) => println!("(missed {missed} events)"),
            Err(RecvError::Closed) => break,
        }
    }
}
