use std::sync::Arc;
use std::time::{Duration, Instant};

use ha_mqtt_device::homeassistant::{
    BinarySensor, Device, EntityCategory, EntityOptions, MqttTransport, Sensor, StateClass,
};
use ha_mqtt_device::settings::Settings;
use ha_mqtt_device::StaticIdentity;
use rumqttc::{Event, EventLoop, Packet};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{util::SubscriberInitExt, Layer};

enum TransportEvent {
    Message { topic: String, payload: Vec<u8> },
    Reconnected,
    Disconnected,
}

#[tokio::main]
async fn main() {
    init_tracing();

    info!("Starting");
    let settings = match Settings::new() {
        Ok(settings) => settings,
        Err(x) => {
            error!("Failed to read settings: {}", x);
            std::process::exit(1);
        }
    };

    if let Err(x) = run(settings).await {
        error!("Failure while announcing device: {}", x);
        std::process::exit(1);
    }
}

async fn run(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let identity = StaticIdentity::from(settings.identity);
    let transport = Arc::new(MqttTransport::new(settings.mqtt.into()));
    let mut device = Device::new(Arc::clone(&transport), &identity, settings.device.into())?;

    let eventloop = transport.connect(100)?;
    let (tx, mut rx) = mpsc::channel(32);
    tokio::spawn(poll_events(eventloop, tx));

    device.init().await?;

    let uptime = Sensor::new(
        &device,
        EntityOptions::new("Uptime")
            .with_object_id("uptime")
            .with_state_class(StateClass::TotalIncreasing)
            .with_unit_of_measurement("s")
            .with_icon("mdi:timer-outline")
            .with_entity_category(EntityCategory::Diagnostic),
    );
    uptime.init().await?;

    let connectivity = BinarySensor::new(
        &device,
        EntityOptions::new("Connectivity")
            .with_object_id("connectivity")
            .with_device_class("connectivity")
            .with_entity_category(EntityCategory::Diagnostic),
    );
    connectivity.init().await?;
    connectivity.on().await?;

    let started = Instant::now();
    let mut ticker = tokio::time::interval(Duration::from_secs(settings.publish_interval_secs));

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(TransportEvent::Message { topic, payload }) => {
                    device.handle_message(&topic, &payload).await?
                }
                // clean sessions drop the status subscription on reconnect
                Some(TransportEvent::Reconnected) => device.init().await?,
                Some(TransportEvent::Disconnected) => device.mark_unavailable(),
                None => break,
            },
            _ = ticker.tick() => {
                uptime
                    .publish_state(started.elapsed().as_secs().to_string())
                    .await?
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    transport.disconnect().await?;
    Ok(())
}

async fn poll_events(mut eventloop: EventLoop, tx: mpsc::Sender<TransportEvent>) {
    let mut connected_once = false;

    loop {
        let event = match eventloop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => TransportEvent::Message {
                topic: publish.topic,
                payload: publish.payload.to_vec(),
            },
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!("MQTT connected");
                if !connected_once {
                    connected_once = true;
                    continue;
                }
                TransportEvent::Reconnected
            }
            Ok(_) => continue,
            Err(e) => {
                error!("MQTT connection error: {:?}", e);
                tokio::time::sleep(Duration::from_secs(1)).await;
                TransportEvent::Disconnected
            }
        };

        if tx.send(event).await.is_err() {
            break;
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_filter(tracing_subscriber::filter::LevelFilter::INFO),
        )
        .init();
}
