use super::device::Device;
use super::entity::{Entity, EntityOptions};
use super::messages::Component;
use super::transport::Transport;
use crate::error::Result;

pub const PAYLOAD_ON: &[u8] = b"ON";
pub const PAYLOAD_OFF: &[u8] = b"OFF";

pub struct BinarySensor<T: Transport + ?Sized> {
    entity: Entity<T>,
}

impl<T: Transport + ?Sized> BinarySensor<T> {
    pub fn new(device: &Device<T>, options: EntityOptions) -> Self {
        Self {
            entity: Entity::new(device, Component::BinarySensor, options),
        }
    }

    /// Publishes the config followed by an initial `OFF`, so the hub never
    /// shows a configured entity without a state.
    pub async fn init(&self) -> Result<()> {
        self.entity.init().await?;
        if self.entity.publish_initial_state() {
            self.off().await?;
        }

        Ok(())
    }

    pub async fn publish_state(&self, state: bool) -> Result<()> {
        let payload = if state { PAYLOAD_ON } else { PAYLOAD_OFF };
        self.entity.publish_state(payload).await
    }

    pub async fn on(&self) -> Result<()> {
        self.publish_state(true).await
    }

    pub async fn off(&self) -> Result<()> {
        self.publish_state(false).await
    }

    pub async fn remove(&self) -> Result<()> {
        self.entity.remove().await
    }

    pub fn entity(&self) -> &Entity<T> {
        &self.entity
    }
}

impl<T: Transport + ?Sized> From<Entity<T>> for BinarySensor<T> {
    fn from(entity: Entity<T>) -> Self {
        Self { entity }
    }
}
