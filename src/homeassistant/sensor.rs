use super::device::Device;
use super::entity::{Entity, EntityOptions};
use super::messages::Component;
use super::transport::Transport;
use crate::error::Result;

/// A read-only value published as-is, e.g. a temperature already formatted by the caller.
pub struct Sensor<T: Transport + ?Sized> {
    entity: Entity<T>,
}

impl<T: Transport + ?Sized> Sensor<T> {
    pub fn new(device: &Device<T>, options: EntityOptions) -> Self {
        Self {
            entity: Entity::new(device, Component::Sensor, options),
        }
    }

    pub async fn init(&self) -> Result<()> {
        self.entity.init().await
    }

    pub async fn publish_state(&self, state: impl Into<Vec<u8>>) -> Result<()> {
        self.entity.publish_state(state).await
    }

    pub async fn remove(&self) -> Result<()> {
        self.entity.remove().await
    }

    pub fn entity(&self) -> &Entity<T> {
        &self.entity
    }
}

impl<T: Transport + ?Sized> From<Entity<T>> for Sensor<T> {
    fn from(entity: Entity<T>) -> Self {
        Self { entity }
    }
}
