use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, ClientError, EventLoop, LastWill, MqttOptions, QoS};
use thiserror::Error;
use tracing::{debug, info};

use crate::settings::MQTTConfig;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport is not connected yet")]
    NotConnected,

    #[error("last will can only be registered before connecting")]
    AlreadyConnected,

    #[error("broker connection lost")]
    ConnectionLost,

    #[error("transport state lock was poisoned")]
    Poisoned,

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// The publish/subscribe operations devices and entities need from an MQTT client.
///
/// Implementations own delivery, retries and reconnects; callers only see the
/// outcome of each call.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        retain: bool,
        qos: QoS,
    ) -> Result<(), TransportError>;

    async fn subscribe(&self, topic: &str) -> Result<(), TransportError>;

    /// Must be called before the underlying connection is established.
    fn set_last_will(&self, will: LastWill) -> Result<(), TransportError>;
}

impl From<MQTTConfig> for MqttOptions {
    fn from(val: MQTTConfig) -> Self {
        let mut config = MqttOptions::new(val.client_id, val.host, val.port);
        config
            .set_credentials(val.username, val.password)
            .set_keep_alive(Duration::from_secs(20));

        config
    }
}

/// [`Transport`] backed by a `rumqttc` async client.
///
/// The options are held until [`MqttTransport::connect`] so a last will can
/// still be registered; afterwards every call goes through the client.
pub struct MqttTransport {
    options: Mutex<Option<MqttOptions>>,
    client: OnceLock<AsyncClient>,
}

impl MqttTransport {
    pub fn new(options: MqttOptions) -> Self {
        Self {
            options: Mutex::new(Some(options)),
            client: OnceLock::new(),
        }
    }

    /// Creates the client. The returned event loop must be polled by the caller.
    pub fn connect(&self, cap: usize) -> Result<EventLoop, TransportError> {
        let options = self
            .options
            .lock()
            .map_err(|_| TransportError::Poisoned)?
            .take()
            .ok_or(TransportError::AlreadyConnected)?;

        info!(
            "Connecting to {}:{} as {}",
            options.broker_address().0,
            options.broker_address().1,
            options.client_id()
        );
        let (client, eventloop) = AsyncClient::new(options, cap);
        self.client
            .set(client)
            .map_err(|_| TransportError::AlreadyConnected)?;

        Ok(eventloop)
    }

    pub async fn disconnect(&self) -> Result<(), TransportError> {
        self.client()?.disconnect().await?;
        Ok(())
    }

    fn client(&self) -> Result<&AsyncClient, TransportError> {
        self.client.get().ok_or(TransportError::NotConnected)
    }
}

#[async_trait]
impl Transport for MqttTransport {
    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        retain: bool,
        qos: QoS,
    ) -> Result<(), TransportError> {
        debug!(topic, retain, ?qos, bytes = payload.len(), "Publishing");
        self.client()?.publish(topic, qos, retain, payload).await?;
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<(), TransportError> {
        debug!(topic, "Subscribing");
        self.client()?.subscribe(topic, QoS::AtLeastOnce).await?;
        Ok(())
    }

    fn set_last_will(&self, will: LastWill) -> Result<(), TransportError> {
        let mut options = self.options.lock().map_err(|_| TransportError::Poisoned)?;
        let options = options.as_mut().ok_or(TransportError::AlreadyConnected)?;
        options.set_last_will(will);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> MqttTransport {
        MqttTransport::new(MqttOptions::new("test", "localhost", 1883))
    }

    #[tokio::test]
    async fn test_publish_before_connect_fails() {
        let result = transport()
            .publish("a/b", b"x".to_vec(), false, QoS::AtMostOnce)
            .await;

        assert!(matches!(result, Err(TransportError::NotConnected)));
    }

    #[tokio::test]
    async fn test_last_will_is_rejected_after_connect() {
        let transport = transport();
        let _eventloop = transport.connect(10).unwrap();

        let will = LastWill::new("a/avail", "offline", QoS::AtLeastOnce, true);
        let result = transport.set_last_will(will);

        assert!(matches!(result, Err(TransportError::AlreadyConnected)));
        assert!(matches!(
            transport.connect(10),
            Err(TransportError::AlreadyConnected)
        ));
    }

    #[test]
    fn test_mqtt_config_maps_to_options() {
        let options: MqttOptions = MQTTConfig {
            host: "broker".to_owned(),
            port: 1884,
            username: "user".to_owned(),
            password: "secret".to_owned(),
            client_id: "shed".to_owned(),
        }
        .into();

        assert_eq!(options.broker_address(), ("broker".to_owned(), 1884));
        assert_eq!(options.client_id(), "shed");
    }
}
