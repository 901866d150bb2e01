use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ha_mqtt_device::homeassistant::{Device, DeviceOptions, Transport, TransportError};
use ha_mqtt_device::StaticIdentity;
use rumqttc::{LastWill, QoS};

pub const HARDWARE_ID: &str = "a1b2c3";
pub const MAC_ADDRESS: &str = "a1:b2:c3:d4:e5:f6";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub payload: Vec<u8>,
    pub retain: bool,
    pub qos: QoS,
}

impl Published {
    pub fn payload_str(&self) -> String {
        String::from_utf8(self.payload.clone()).unwrap()
    }
}

/// In-memory transport that records every interaction.
#[derive(Default)]
pub struct RecordingTransport {
    published: Mutex<Vec<Published>>,
    subscriptions: Mutex<Vec<String>>,
    last_will: Mutex<Option<LastWill>>,
    failing_topics: Mutex<Vec<String>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every publish to `topic` fails from now on.
    pub fn fail_on(&self, topic: &str) {
        self.failing_topics.lock().unwrap().push(topic.to_owned());
    }

    pub fn published(&self) -> Vec<Published> {
        self.published.lock().unwrap().clone()
    }

    pub fn published_to(&self, topic: &str) -> Vec<Published> {
        self.published()
            .into_iter()
            .filter(|message| message.topic == topic)
            .collect()
    }

    pub fn clear(&self) {
        self.published.lock().unwrap().clear();
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.lock().unwrap().clone()
    }

    pub fn last_will(&self) -> Option<LastWill> {
        self.last_will.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        retain: bool,
        qos: QoS,
    ) -> Result<(), TransportError> {
        if self
            .failing_topics
            .lock()
            .unwrap()
            .iter()
            .any(|failing| failing == topic)
        {
            return Err(TransportError::ConnectionLost);
        }

        self.published.lock().unwrap().push(Published {
            topic: topic.to_owned(),
            payload,
            retain,
            qos,
        });
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<(), TransportError> {
        self.subscriptions.lock().unwrap().push(topic.to_owned());
        Ok(())
    }

    fn set_last_will(&self, will: LastWill) -> Result<(), TransportError> {
        *self.last_will.lock().unwrap() = Some(will);
        Ok(())
    }
}

pub fn identity() -> StaticIdentity {
    StaticIdentity::new(HARDWARE_ID, MAC_ADDRESS)
}

/// The availability-aware `Shed` device used across tests.
pub fn shed(transport: &Arc<RecordingTransport>) -> Device<RecordingTransport> {
    Device::new(
        Arc::clone(transport),
        &identity(),
        DeviceOptions::new("Shed", "ESP32", "ACME").with_device_id("shed1"),
    )
    .unwrap()
}

/// A device without availability channel.
pub fn basic_shed(transport: &Arc<RecordingTransport>) -> Device<RecordingTransport> {
    Device::new(
        Arc::clone(transport),
        &identity(),
        DeviceOptions::new("Shed", "ESP32", "ACME"),
    )
    .unwrap()
}
