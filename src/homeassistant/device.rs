use std::sync::Arc;

use rumqttc::{LastWill, QoS};
use serde_json::Value;
use tracing::{debug, info};

use super::messages::{AvailabilityConfig, DeviceConfig};
use super::transport::Transport;
use super::{
    hub_status_topic, join_topic, DEFAULT_DISCOVERY_PREFIX, HA_ONLINE_PAYLOAD, PAYLOAD_AVAILABLE,
    PAYLOAD_NOT_AVAILABLE,
};
use crate::error::Result;
use crate::identity::IdentityProvider;
use crate::settings::DeviceSettings;

/// Presence of the device as announced on its availability topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityState {
    Available,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceOptions {
    pub name: String,
    pub model: String,
    pub manufacturer: String,
    /// Enables the availability channel when set.
    pub device_id: Option<String>,
    pub discovery_prefix: String,
}

impl DeviceOptions {
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        manufacturer: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            manufacturer: manufacturer.into(),
            device_id: None,
            discovery_prefix: DEFAULT_DISCOVERY_PREFIX.to_owned(),
        }
    }

    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    pub fn with_discovery_prefix(mut self, discovery_prefix: impl Into<String>) -> Self {
        self.discovery_prefix = discovery_prefix.into();
        self
    }
}

impl From<DeviceSettings> for DeviceOptions {
    fn from(val: DeviceSettings) -> Self {
        Self {
            name: val.name,
            model: val.model,
            manufacturer: val.manufacturer,
            device_id: val.device_id,
            discovery_prefix: val.discovery_prefix,
        }
    }
}

/// The physical host every entity belongs to.
///
/// The `device` block is serialized once here and embedded unchanged into the
/// config of every entity created from this device.
pub struct Device<T: Transport + ?Sized> {
    transport: Arc<T>,
    config: DeviceConfig,
    config_block: Value,
    availability: Option<AvailabilityConfig>,
    availability_block: Option<Value>,
    hardware_id: String,
    discovery_prefix: String,
    hub_status_topic: String,
    state: AvailabilityState,
}

impl<T: Transport + ?Sized> Device<T> {
    /// Builds the device and, when a `device_id` is configured, registers the
    /// `offline` last will on its availability topic.
    pub fn new(
        transport: Arc<T>,
        identity: &impl IdentityProvider,
        options: DeviceOptions,
    ) -> Result<Self> {
        let hardware_id = identity.hardware_id().to_owned();
        let config = DeviceConfig {
            name: options.name,
            model: options.model,
            manufacturer: options.manufacturer,
            identifiers: vec![hardware_id.clone()],
            connections: vec![("mac".to_owned(), identity.mac_address().to_owned())],
        };

        let availability = options.device_id.map(|device_id| AvailabilityConfig {
            payload_available: PAYLOAD_AVAILABLE.to_owned(),
            payload_not_available: PAYLOAD_NOT_AVAILABLE.to_owned(),
            topic: join_topic([
                Some(options.discovery_prefix.as_str()),
                Some(format!("{}-{}", device_id, hardware_id).as_str()),
                Some("avail"),
            ]),
        });

        if let Some(availability) = &availability {
            transport.set_last_will(LastWill::new(
                availability.topic.as_str(),
                availability.payload_not_available.as_str(),
                QoS::AtLeastOnce,
                true,
            ))?;
        }

        let config_block = serde_json::to_value(&config)?;
        let availability_block = availability
            .as_ref()
            .map(|availability| serde_json::to_value([availability]))
            .transpose()?;

        Ok(Self {
            transport,
            config,
            config_block,
            availability,
            availability_block,
            hardware_id,
            hub_status_topic: hub_status_topic(&options.discovery_prefix),
            discovery_prefix: options.discovery_prefix,
            state: AvailabilityState::Unavailable,
        })
    }

    /// Subscribes to the hub status topic and announces the device as available.
    pub async fn init(&mut self) -> Result<()> {
        if self.availability.is_none() {
            debug!(device = %self.config.name, "No availability channel configured");
            return Ok(());
        }

        self.transport.subscribe(&self.hub_status_topic).await?;
        self.announce_available().await
    }

    /// Re-announces presence when the hub reports it came back online.
    ///
    /// Anything but `online` on the hub status topic is ignored.
    pub async fn handle_message(&mut self, topic: &str, payload: &[u8]) -> Result<()> {
        if self.availability.is_none() || topic != self.hub_status_topic {
            return Ok(());
        }

        if payload != HA_ONLINE_PAYLOAD {
            debug!(
                topic,
                payload = %String::from_utf8_lossy(payload),
                "Ignoring hub status"
            );
            return Ok(());
        }

        info!(device = %self.config.name, "Hub restarted, re-announcing availability");
        self.announce_available().await
    }

    /// Records that the transport lost its connection; the broker delivers the last will.
    pub fn mark_unavailable(&mut self) {
        self.state = AvailabilityState::Unavailable;
    }

    async fn announce_available(&mut self) -> Result<()> {
        if let Some(availability) = &self.availability {
            self.transport
                .publish(
                    &availability.topic,
                    availability.payload_available.clone().into_bytes(),
                    true,
                    QoS::AtLeastOnce,
                )
                .await?;
            self.state = AvailabilityState::Available;
        }

        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn availability(&self) -> Option<&AvailabilityConfig> {
        self.availability.as_ref()
    }

    pub fn availability_topic(&self) -> Option<&str> {
        self.availability.as_ref().map(|a| a.topic.as_str())
    }

    pub fn hardware_id(&self) -> &str {
        &self.hardware_id
    }

    pub fn discovery_prefix(&self) -> &str {
        &self.discovery_prefix
    }

    pub fn hub_status_topic(&self) -> &str {
        &self.hub_status_topic
    }

    pub fn state(&self) -> AvailabilityState {
        self.state
    }

    pub(crate) fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub(crate) fn config_block(&self) -> &Value {
        &self.config_block
    }

    pub(crate) fn availability_block(&self) -> Option<&Value> {
        self.availability_block.as_ref()
    }
}
