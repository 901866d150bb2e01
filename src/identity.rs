use crate::settings::IdentityConfig;

/// Source of the values that make topics and device payloads globally unique.
pub trait IdentityProvider {
    /// Stable identifier of the physical unit, hex encoded.
    fn hardware_id(&self) -> &str;

    /// Network MAC address in colon separated hex.
    fn mac_address(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticIdentity {
    hardware_id: String,
    mac_address: String,
}

impl StaticIdentity {
    pub fn new(hardware_id: impl Into<String>, mac_address: impl Into<String>) -> Self {
        Self {
            hardware_id: hardware_id.into(),
            mac_address: mac_address.into(),
        }
    }

    /// Builds the identity from the raw unique id and MAC bytes a board reports.
    pub fn from_bytes(unique_id: &[u8], mac: &[u8]) -> Self {
        Self::new(hex::encode(unique_id), format_mac(mac))
    }
}

impl IdentityProvider for StaticIdentity {
    fn hardware_id(&self) -> &str {
        &self.hardware_id
    }

    fn mac_address(&self) -> &str {
        &self.mac_address
    }
}

impl From<IdentityConfig> for StaticIdentity {
    fn from(val: IdentityConfig) -> Self {
        Self::new(val.hardware_id, val.mac_address)
    }
}

/// Lowercase colon separated hex, e.g. `24:0a:c4:00:01:ff`.
pub fn format_mac(mac: &[u8]) -> String {
    mac.iter()
        .map(|byte| hex::encode([*byte]))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_format_mac() {
        let mac = [0x24, 0x0a, 0xc4, 0x00, 0x01, 0xff];

        assert_eq!(format_mac(&mac), "24:0a:c4:00:01:ff");
    }

    #[test]
    fn test_empty_mac_gives_empty_string() {
        assert_eq!(format_mac(&[]), "");
    }

    #[test]
    fn test_identity_from_bytes() {
        let identity = StaticIdentity::from_bytes(&[0xde, 0xad, 0x0b], &[0x01, 0x02]);

        assert_eq!(identity.hardware_id(), "dead0b");
        assert_eq!(identity.mac_address(), "01:02");
    }
}
