use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use ha_mqtt_device::settings::MQTTConfig;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, Publish, QoS};
use testcontainers::{
    core::{ContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};
use tokio::task::JoinHandle;
use tracing::info;

pub async fn start_hivemq() -> (ContainerAsync<GenericImage>, u16) {
    let mqtt_server = GenericImage::new("hivemq/hivemq-ce", "latest")
        .with_exposed_port(ContainerPort::Tcp(1883))
        .with_wait_for(WaitFor::message_on_stdout("Started HiveMQ in"))
        .with_network("bridge")
        .start()
        .await
        .expect("Failed to start container, is Docker running?");

    let port = mqtt_server
        .get_host_port_ipv4(1883)
        .await
        .expect("Failed to get port binding");

    (mqtt_server, port)
}

pub fn mqtt_config(client_id: &str, port: u16) -> MQTTConfig {
    MQTTConfig {
        client_id: client_id.to_owned(),
        host: "localhost".to_owned(),
        port,
        username: "".to_owned(),
        password: "".to_owned(),
    }
}

/// Stands in for Home Assistant: records everything published below a topic filter.
pub struct CollectingClient {
    // dropping the client would end the event loop
    _client: AsyncClient,
    received_messages: Arc<Mutex<Vec<Publish>>>,
    worker: JoinHandle<()>,
}

impl CollectingClient {
    pub async fn start(config: &MQTTConfig, filter: &str) -> Self {
        let config = MQTTConfig {
            client_id: "collecting-client".to_owned(),
            ..config.clone()
        };
        let options: MqttOptions = config.into();
        let (client, mut eventloop) = AsyncClient::new(options, 100);
        client.subscribe(filter, QoS::AtLeastOnce).await.unwrap();

        let received_messages = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received_messages);
        let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();

        let worker = tokio::spawn(async move {
            let mut ready_tx = Some(ready_tx);
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::SubAck(_))) => {
                        if let Some(ready) = ready_tx.take() {
                            let _ = ready.send(());
                        }
                    }
                    Ok(Event::Incoming(Packet::Publish(message))) => {
                        info!("Received message on {}", message.topic);
                        sink.lock().unwrap().push(message);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        info!("Collecting client stopped: {:?}", e);
                        break;
                    }
                }
            }
        });

        ready_rx.await.expect("Collecting client did not report ready");
        Self {
            _client: client,
            received_messages,
            worker,
        }
    }

    /// Waits until `count` messages arrived or `timeout` elapsed and returns what was received.
    pub async fn wait_for_messages(&self, count: usize, timeout: Duration) -> Vec<Publish> {
        let start = Instant::now();
        while self.received_messages.lock().unwrap().len() < count && start.elapsed() < timeout {
            tokio::time::sleep(Duration::from_millis(200)).await;
        }

        self.received_messages.lock().unwrap().clone()
    }

    pub fn stop(self) {
        self.worker.abort();
    }
}

pub fn by_topic(messages: &[Publish]) -> HashMap<String, Vec<String>> {
    let mut actual: HashMap<String, Vec<String>> = HashMap::new();
    for message in messages {
        let payload = String::from_utf8(message.payload.to_vec()).unwrap();
        actual
            .entry(message.topic.clone())
            .or_default()
            .push(payload);
    }

    actual
}
