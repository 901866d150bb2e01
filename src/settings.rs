use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::homeassistant::DEFAULT_DISCOVERY_PREFIX;

#[derive(Debug, Deserialize)]
#[allow(unused)]
pub struct Settings {
    pub mqtt: MQTTConfig,
    pub device: DeviceSettings,
    pub identity: IdentityConfig,
    #[serde(default = "default_publish_interval")]
    pub publish_interval_secs: u64,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default.toml"))
            .add_source(File::with_name("config/secrets.toml").required(false))
            .add_source(Environment::with_prefix("HA").separator("__"))
            .build()?;

        Self::from_config(settings)
    }

    fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: Self = config.try_deserialize()?;
        if settings.publish_interval_secs == 0 {
            return Err(ConfigError::Message(
                "publish_interval_secs must be at least 1".to_owned(),
            ));
        }

        Ok(settings)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[allow(unused)]
pub struct MQTTConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub client_id: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DeviceSettings {
    pub name: String,
    pub model: String,
    pub manufacturer: String,
    /// Enables the availability topic and last will.
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default = "default_discovery_prefix")]
    pub discovery_prefix: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IdentityConfig {
    pub hardware_id: String,
    pub mac_address: String,
}

fn default_discovery_prefix() -> String {
    DEFAULT_DISCOVERY_PREFIX.to_owned()
}

fn default_publish_interval() -> u64 {
    60
}
