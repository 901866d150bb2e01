use std::sync::Arc;

use rumqttc::QoS;
use serde_json::{Map, Value};
use tracing::info;

use super::device::Device;
use super::join_topic;
use super::messages::{Component, EntityCategory, ExtraConfig, StateClass};
use super::transport::Transport;
use crate::error::Result;

/// Everything that varies between entities of one device.
///
/// Defaults: object id suffixed with the hardware id, state not retained and,
/// for binary sensors, an initial `OFF` right after the config.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityOptions {
    pub name: String,
    pub object_id: Option<String>,
    pub node_id: Option<String>,
    /// Falls back to the device's prefix.
    pub discovery_prefix: Option<String>,
    pub suffix_hardware_id: bool,
    /// Replaces `<base_topic>/state`; used by groups sharing one topic.
    pub state_topic: Option<String>,
    pub retain_state: bool,
    pub publish_initial_state: bool,
    pub device_class: Option<String>,
    pub state_class: Option<StateClass>,
    pub unit_of_measurement: Option<String>,
    pub icon: Option<String>,
    pub entity_category: Option<EntityCategory>,
    pub extra: ExtraConfig,
}

impl EntityOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            object_id: None,
            node_id: None,
            discovery_prefix: None,
            suffix_hardware_id: true,
            state_topic: None,
            retain_state: false,
            publish_initial_state: true,
            device_class: None,
            state_class: None,
            unit_of_measurement: None,
            icon: None,
            entity_category: None,
            extra: ExtraConfig::default(),
        }
    }

    pub fn with_object_id(mut self, object_id: impl Into<String>) -> Self {
        self.object_id = Some(object_id.into());
        self
    }

    pub fn with_node_id(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    pub fn with_discovery_prefix(mut self, discovery_prefix: impl Into<String>) -> Self {
        self.discovery_prefix = Some(discovery_prefix.into());
        self
    }

    pub fn without_hardware_suffix(mut self) -> Self {
        self.suffix_hardware_id = false;
        self
    }

    pub fn with_state_topic(mut self, state_topic: impl Into<String>) -> Self {
        self.state_topic = Some(state_topic.into());
        self
    }

    pub fn with_retained_state(mut self) -> Self {
        self.retain_state = true;
        self
    }

    pub fn without_initial_state(mut self) -> Self {
        self.publish_initial_state = false;
        self
    }

    pub fn with_device_class(mut self, device_class: impl Into<String>) -> Self {
        self.device_class = Some(device_class.into());
        self
    }

    pub fn with_state_class(mut self, state_class: StateClass) -> Self {
        self.state_class = Some(state_class);
        self
    }

    pub fn with_unit_of_measurement(mut self, unit: impl Into<String>) -> Self {
        self.unit_of_measurement = Some(unit.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_entity_category(mut self, entity_category: EntityCategory) -> Self {
        self.entity_category = Some(entity_category);
        self
    }

    pub fn with_extra(mut self, extra: ExtraConfig) -> Self {
        self.extra = extra;
        self
    }
}

/// One capability of a device as announced to Home Assistant.
pub struct Entity<T: Transport + ?Sized> {
    transport: Arc<T>,
    component: Component,
    object_id: String,
    unique_id: String,
    base_topic: String,
    config_topic: String,
    state_topic: String,
    config: Map<String, Value>,
    retain_state: bool,
    publish_initial_state: bool,
}

impl<T: Transport + ?Sized> Clone for Entity<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            component: self.component,
            object_id: self.object_id.clone(),
            unique_id: self.unique_id.clone(),
            base_topic: self.base_topic.clone(),
            config_topic: self.config_topic.clone(),
            state_topic: self.state_topic.clone(),
            config: self.config.clone(),
            retain_state: self.retain_state,
            publish_initial_state: self.publish_initial_state,
        }
    }
}

impl<T: Transport + ?Sized> Entity<T> {
    pub fn new(device: &Device<T>, component: Component, options: EntityOptions) -> Self {
        let hardware_id = device.hardware_id();
        let discovery_prefix = options
            .discovery_prefix
            .as_deref()
            .unwrap_or(device.discovery_prefix());
        let raw_object_id = options.object_id.as_deref().unwrap_or(component.as_str());

        let object_id = if options.suffix_hardware_id {
            format!("{}-{}", raw_object_id, hardware_id)
        } else {
            raw_object_id.to_owned()
        };
        let node_id = options.node_id.as_deref().filter(|node_id| !node_id.is_empty());
        let unique_id = match node_id {
            Some(node_id) => format!("{}-{}-{}", node_id, raw_object_id, hardware_id),
            None => format!("{}-{}", raw_object_id, hardware_id),
        };

        let base_topic = join_topic([
            Some(discovery_prefix),
            Some(component.as_str()),
            node_id,
            Some(object_id.as_str()),
        ]);
        let config_topic = format!("{}/config", base_topic);
        let state_topic = options
            .state_topic
            .clone()
            .unwrap_or_else(|| format!("{}/state", base_topic));

        let mut config = Map::new();
        config.insert("name".to_owned(), options.name.into());
        config.insert(
            "stat_t".to_owned(),
            match options.state_topic {
                Some(state_topic) => state_topic.into(),
                None => "~/state".into(),
            },
        );
        config.insert("~".to_owned(), base_topic.clone().into());
        config.insert("uniq_id".to_owned(), unique_id.clone().into());

        let optional: [(&str, Option<Value>); 5] = [
            ("device_class", options.device_class.map(Value::from)),
            ("state_class", options.state_class.map(|c| c.as_str().into())),
            (
                "unit_of_measurement",
                options.unit_of_measurement.map(Value::from),
            ),
            ("icon", options.icon.map(Value::from)),
            (
                "entity_category",
                options.entity_category.map(|c| c.as_str().into()),
            ),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                config.insert(key.to_owned(), value);
            }
        }

        for (key, value) in options.extra.iter() {
            config.insert(key.clone(), value.clone());
        }

        config.insert("device".to_owned(), device.config_block().clone());
        if let Some(availability) = device.availability_block() {
            config.insert("availability".to_owned(), availability.clone());
        }

        Self {
            transport: Arc::clone(device.transport()),
            component,
            object_id,
            unique_id,
            base_topic,
            config_topic,
            state_topic,
            config,
            retain_state: options.retain_state,
            publish_initial_state: options.publish_initial_state,
        }
    }

    /// Publishes the discovery config, retained so a hub subscribing later still sees it.
    pub async fn init(&self) -> Result<()> {
        let payload = self.config_payload()?;
        info!(topic = %self.config_topic, "Registering entity");
        self.transport
            .publish(&self.config_topic, payload, true, QoS::AtLeastOnce)
            .await?;

        Ok(())
    }

    pub async fn publish_state(&self, state: impl Into<Vec<u8>>) -> Result<()> {
        self.transport
            .publish(
                &self.state_topic,
                state.into(),
                self.retain_state,
                QoS::AtMostOnce,
            )
            .await?;

        Ok(())
    }

    /// Deregisters the entity by clearing its retained config.
    pub async fn remove(&self) -> Result<()> {
        info!(topic = %self.config_topic, "Removing entity");
        self.transport
            .publish(&self.config_topic, Vec::new(), true, QoS::AtLeastOnce)
            .await?;

        Ok(())
    }

    pub fn config_payload(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.config)?)
    }

    pub fn component(&self) -> Component {
        self.component
    }

    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn base_topic(&self) -> &str {
        &self.base_topic
    }

    pub fn config_topic(&self) -> &str {
        &self.config_topic
    }

    pub fn state_topic(&self) -> &str {
        &self.state_topic
    }

    pub fn config(&self) -> &Map<String, Value> {
        &self.config
    }

    pub(crate) fn publish_initial_state(&self) -> bool {
        self.publish_initial_state
    }
}
