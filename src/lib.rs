pub mod error;
pub mod homeassistant;
pub mod identity;
pub mod settings;

pub use error::{Error, Result};
pub use homeassistant::{
    AvailabilityState, BinarySensor, Component, Device, DeviceOptions, Entity, EntityCategory,
    EntityGroup, EntityOptions, ExtraConfig, MqttTransport, Sensor, StateClass, Transport,
    TransportError,
};
pub use identity::{IdentityProvider, StaticIdentity};
