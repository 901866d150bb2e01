pub mod binary_sensor;
pub mod device;
pub mod entity;
pub mod group;
pub mod messages;
pub mod sensor;
pub mod transport;

pub use binary_sensor::BinarySensor;
pub use device::{AvailabilityState, Device, DeviceOptions};
pub use entity::{Entity, EntityOptions};
pub use group::EntityGroup;
pub use messages::{Component, EntityCategory, ExtraConfig, StateClass};
pub use sensor::Sensor;
pub use transport::{MqttTransport, Transport, TransportError};

pub const DEFAULT_DISCOVERY_PREFIX: &str = "homeassistant";

/// Payload the hub publishes on its status topic once it (re)starts.
pub const HA_ONLINE_PAYLOAD: &[u8] = b"online";

pub const PAYLOAD_AVAILABLE: &str = "online";
pub const PAYLOAD_NOT_AVAILABLE: &str = "offline";

/// Joins topic segments with `/`, skipping absent and empty ones.
pub(crate) fn join_topic<'a>(segments: impl IntoIterator<Item = Option<&'a str>>) -> String {
    segments
        .into_iter()
        .flatten()
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

pub(crate) fn hub_status_topic(discovery_prefix: &str) -> String {
    join_topic([Some(discovery_prefix), Some("status")])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_segment_is_skipped() {
        let topic = join_topic([Some("homeassistant"), Some("sensor"), None, Some("temp")]);

        assert_eq!(topic, "homeassistant/sensor/temp");
    }

    #[test]
    fn test_empty_segment_is_skipped() {
        let topic = join_topic([Some("homeassistant"), Some("sensor"), Some(""), Some("temp")]);

        assert_eq!(topic, "homeassistant/sensor/temp");
    }

    #[test]
    fn test_present_segment_is_kept() {
        let topic = join_topic([
            Some("homeassistant"),
            Some("sensor"),
            Some("garden"),
            Some("temp"),
        ]);

        assert_eq!(topic, "homeassistant/sensor/garden/temp");
    }

    #[test]
    fn test_hub_status_topic_follows_prefix() {
        assert_eq!(hub_status_topic("homeassistant"), "homeassistant/status");
        assert_eq!(hub_status_topic("ha"), "ha/status");
    }
}
