use std::sync::Arc;

use rumqttc::QoS;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::binary_sensor::BinarySensor;
use super::device::Device;
use super::entity::{Entity, EntityOptions};
use super::join_topic;
use super::messages::{Component, ExtraConfig};
use super::sensor::Sensor;
use super::transport::Transport;
use crate::error::{Error, Result};

const STATE_TOPIC_KEYS: [&str; 2] = ["state_topic", "stat_t"];

/// Entities sharing one JSON state topic, each picking its value with a template.
pub struct EntityGroup<T: Transport + ?Sized> {
    transport: Arc<T>,
    hardware_id: String,
    node_id: String,
    discovery_prefix: String,
    extra_conf: ExtraConfig,
    state_topic: String,
    entities: Vec<Entity<T>>,
}

impl<T: Transport + ?Sized> EntityGroup<T> {
    /// Fails when `extra_conf` has no value template; without one the shared
    /// payload cannot be split into member values.
    pub fn new(
        device: &Device<T>,
        node_id: impl Into<String>,
        discovery_prefix: Option<String>,
        mut extra_conf: ExtraConfig,
    ) -> Result<Self> {
        if !extra_conf.has_value_template() {
            return Err(Error::MissingValueTemplate);
        }

        let node_id = node_id.into();
        let discovery_prefix =
            discovery_prefix.unwrap_or_else(|| device.discovery_prefix().to_owned());

        let removed: Vec<Value> = STATE_TOPIC_KEYS
            .iter()
            .filter_map(|key| extra_conf.remove(key))
            .collect();
        let explicit_state_topic = removed.into_iter().find_map(|value| match value {
            Value::String(topic) => Some(topic),
            other => {
                debug!(node_id = %node_id, value = %other, "Ignoring non-string state topic");
                None
            }
        });
        let state_topic = explicit_state_topic.unwrap_or_else(|| {
            join_topic([
                Some(discovery_prefix.as_str()),
                Some(Component::Sensor.as_str()),
                Some(node_id.as_str()),
                Some("state"),
            ])
        });

        Ok(Self {
            transport: Arc::clone(device.transport()),
            hardware_id: device.hardware_id().to_owned(),
            node_id,
            discovery_prefix,
            extra_conf,
            state_topic,
            entities: Vec::new(),
        })
    }

    /// `device` must be the one the group was created from.
    pub fn create_sensor(
        &mut self,
        device: &Device<T>,
        options: EntityOptions,
    ) -> Result<Sensor<T>> {
        let entity = self.create_entity(device, Component::Sensor, options)?;
        Ok(Sensor::from(entity))
    }

    pub fn create_binary_sensor(
        &mut self,
        device: &Device<T>,
        options: EntityOptions,
    ) -> Result<BinarySensor<T>> {
        let entity = self.create_entity(device, Component::BinarySensor, options)?;
        Ok(BinarySensor::from(entity))
    }

    fn create_entity(
        &mut self,
        device: &Device<T>,
        component: Component,
        options: EntityOptions,
    ) -> Result<Entity<T>> {
        if !Arc::ptr_eq(device.transport(), &self.transport)
            || device.hardware_id() != self.hardware_id
        {
            return Err(Error::ForeignDevice);
        }

        let options = self.member_options(options);
        let entity = Entity::new(device, component, options);
        self.entities.push(entity.clone());

        Ok(entity)
    }

    /// Group settings win over the member's, except for the member's own value template.
    fn member_options(&self, mut options: EntityOptions) -> EntityOptions {
        let mut own = std::mem::take(&mut options.extra);
        let own_template = own.take_value_template();

        let mut shared = self.extra_conf.clone();
        if !own_template.is_empty() {
            shared.take_value_template();
        }

        let mut extra = own.merge(&shared);
        for (key, value) in own_template {
            extra = extra.with(key, value);
        }
        options.extra = extra;
        options.node_id = Some(self.node_id.clone());
        options.discovery_prefix = Some(self.discovery_prefix.clone());
        options.state_topic = Some(self.state_topic.clone());
        options.publish_initial_state = false;

        options
    }

    /// Publishes the config of every member, in creation order.
    pub async fn init(&self) -> Result<()> {
        for entity in &self.entities {
            entity.init().await?;
        }

        Ok(())
    }

    /// Publishes one JSON document for the whole group.
    pub async fn publish_state<S: Serialize + ?Sized>(&self, state: &S) -> Result<()> {
        let payload = serde_json::to_vec(state)?;
        self.transport
            .publish(&self.state_topic, payload, false, QoS::AtMostOnce)
            .await?;

        Ok(())
    }

    /// Removes members one by one; stops at the first failure.
    pub async fn remove_group(&self) -> Result<()> {
        info!(node_id = %self.node_id, count = self.entities.len(), "Removing group");
        for entity in &self.entities {
            entity.remove().await?;
        }

        Ok(())
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn state_topic(&self) -> &str {
        &self.state_topic
    }

    pub fn entities(&self) -> &[Entity<T>] {
        &self.entities
    }
}
