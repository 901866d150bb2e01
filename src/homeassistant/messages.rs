use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys Home Assistant accepts for the value template of an entity.
const VALUE_TEMPLATE_KEYS: [&str; 2] = ["value_template", "val_tpl"];

/// Hub-defined entity category, decides the payload schema and topic segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Sensor,
    BinarySensor,
}

impl Component {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Component::Sensor => "sensor",
            Component::BinarySensor => "binary_sensor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateClass {
    Measurement,
    Total,
    TotalIncreasing,
}

impl StateClass {
    pub const fn as_str(&self) -> &'static str {
        match self {
            StateClass::Measurement => "measurement",
            StateClass::Total => "total",
            StateClass::TotalIncreasing => "total_increasing",
        }
    }
}

/// Classification of a non-primary entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    /// Exposes a configuration parameter of the device.
    Config,
    /// Exposes diagnostics such as RSSI or the MAC address.
    Diagnostic,
}

impl EntityCategory {
    pub const fn as_str(&self) -> &'static str {
        match self {
            EntityCategory::Config => "config",
            EntityCategory::Diagnostic => "diagnostic",
        }
    }
}

/// The `device` block embedded into every entity config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceConfig {
    /// Name of the device.
    pub name: String,

    /// Model of the device.
    pub model: String,

    /// Manufacturer of the device.
    pub manufacturer: String,

    /// List of IDs that uniquely identify the device.
    pub identifiers: Vec<String>,

    /// List of connections of the device, e.g. `["mac", "02:5b:26:a8:dc:12"]`.
    pub connections: Vec<(String, String)>,
}

/// One entry of the `availability` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityConfig {
    /// Represents the available state.
    pub payload_available: String,

    /// Represents the unavailable state.
    pub payload_not_available: String,

    /// The MQTT topic subscribed to receive availability updates.
    pub topic: String,
}

/// Free-form discovery keys supplied by the caller, merged into an entity config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtraConfig(Map<String, Value>);

impl ExtraConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn has_value_template(&self) -> bool {
        VALUE_TEMPLATE_KEYS.iter().any(|key| self.contains_key(key))
    }

    /// Removes and returns every value template entry.
    pub fn take_value_template(&mut self) -> Vec<(String, Value)> {
        VALUE_TEMPLATE_KEYS
            .iter()
            .filter_map(|key| self.0.remove(*key).map(|value| ((*key).to_owned(), value)))
            .collect()
    }

    /// Returns `self` with every entry of `overrides` written on top.
    pub fn merge(mut self, overrides: &ExtraConfig) -> Self {
        for (key, value) in overrides.iter() {
            self.0.insert(key.clone(), value.clone());
        }

        self
    }
}

impl From<Map<String, Value>> for ExtraConfig {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ExtraConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}
