//! Device topology configuration
//!
//! A topology lists the chips of a fake device, their ports, initial link
//! status and any MAC already programmed. Files are JSON:
//!
//! ```json
//! {
//!   "max_chips": 4,
//!   "chips": [
//!     { "chip_id": 1,
//!       "ports": [ { "port_id": 10, "speed": 100000, "status": "up",
//!                    "mac": "02:00:00:00:00:0a" } ] }
//!   ]
//! }
//! ```

use crate::error::Result;
use chip_sdk::{
    ChipId, LinkStatus, MacAddress, PhyPort, PortId, SdkError, SdkResult, SwitchChip,
    CHIP_SDK_CHIP_MAX,
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::os::raw::c_int;
use std::path::Path;

/// Port entry of a chip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortConfig {
    pub port_id: PortId,

    /// Speed in Mbps
    #[serde(default)]
    pub speed: c_int,

    #[serde(default)]
    pub status: LinkStatus,

    /// MAC programmed on the port before the test starts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<MacAddress>,
}

/// Chip entry of a topology
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipConfig {
    pub chip_id: ChipId,

    #[serde(default)]
    pub ports: Vec<PortConfig>,
}

impl ChipConfig {
    /// Builds the C chip record for this entry.
    ///
    /// A repeated port id or more ports than a chip has slots is a malformed
    /// descriptor, reported as `InvalidParameter` like `Device::add_chip`.
    pub fn to_switch_chip(&self) -> SdkResult<SwitchChip> {
        let mut chip = SwitchChip::new(self.chip_id);
        for port in &self.ports {
            chip.add_port(
                PhyPort::new(port.port_id)
                    .with_speed(port.speed)
                    .with_status(port.status),
            )
            .map_err(|e| SdkError::invalid_parameter(format!("chip {}: {}", self.chip_id, e)))?;
        }
        Ok(chip)
    }
}

/// Complete device topology
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Maximum number of chips the device accepts
    #[serde(default = "default_max_chips")]
    pub max_chips: usize,

    #[serde(default)]
    pub chips: Vec<ChipConfig>,
}

fn default_max_chips() -> usize {
    CHIP_SDK_CHIP_MAX
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            max_chips: default_max_chips(),
            chips: Vec::new(),
        }
    }
}

impl DeviceConfig {
    /// Parses a topology from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a topology file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config = Self::from_json_str(&contents)?;
        debug!(
            "Loaded topology {} with {} chips",
            path.display(),
            config.chips.len()
        );
        Ok(config)
    }

    /// Checks the topology without building a device.
    pub fn validate(&self) -> SdkResult<()> {
        if self.max_chips == 0 {
            return Err(SdkError::invalid_parameter("max_chips must be at least 1"));
        }

        if self.chips.len() > self.max_chips {
            return Err(SdkError::no_resource(format!(
                "{} chips listed, device holds {}",
                self.chips.len(),
                self.max_chips
            )));
        }

        let mut seen = HashSet::new();
        for chip in &self.chips {
            if !seen.insert(chip.chip_id) {
                return Err(SdkError::already_exists(format!("chip {}", chip.chip_id)));
            }
            chip.to_switch_chip()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const TOPOLOGY: &str = r#"{
        "chips": [
            { "chip_id": 1,
              "ports": [
                { "port_id": 10, "speed": 100000, "status": "up", "mac": "02:00:00:00:00:0a" },
                { "port_id": 11 }
              ] },
            { "chip_id": 2 }
        ]
    }"#;

    #[test]
    fn test_parse_with_defaults() {
        let config = DeviceConfig::from_json_str(TOPOLOGY).unwrap();
        assert_eq!(config.max_chips, CHIP_SDK_CHIP_MAX);
        assert_eq!(config.chips.len(), 2);

        let port = &config.chips[0].ports[1];
        assert_eq!(port.speed, 0);
        assert_eq!(port.status, LinkStatus::Unknown);
        assert_eq!(port.mac, None);

        assert_eq!(
            config.chips[0].ports[0].mac,
            Some(MacAddress::new([2, 0, 0, 0, 0, 0x0a]))
        );
        assert!(config.chips[1].ports.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_rejects_bad_values() {
        let bad_status = r#"{ "chips": [ { "chip_id": 1, "ports": [ { "port_id": 1, "status": "flapping" } ] } ] }"#;
        assert!(DeviceConfig::from_json_str(bad_status).is_err());

        let bad_mac = r#"{ "chips": [ { "chip_id": 1, "ports": [ { "port_id": 1, "mac": "zz" } ] } ] }"#;
        assert!(DeviceConfig::from_json_str(bad_mac).is_err());
    }

    #[test]
    fn test_validate() {
        let mut config = DeviceConfig::from_json_str(TOPOLOGY).unwrap();
        config.max_chips = 1;
        assert!(matches!(config.validate(), Err(SdkError::NoResource { .. })));

        config.max_chips = 0;
        assert!(matches!(
            config.validate(),
            Err(SdkError::InvalidParameter { .. })
        ));

        let mut config = DeviceConfig::from_json_str(TOPOLOGY).unwrap();
        config.chips[1].chip_id = 1;
        assert!(matches!(
            config.validate(),
            Err(SdkError::AlreadyExists { .. })
        ));

        let mut config = DeviceConfig::default();
        config.chips.push(ChipConfig {
            chip_id: 5,
            ports: (0..9)
                .map(|port_id| PortConfig {
                    port_id,
                    speed: 0,
                    status: LinkStatus::Down,
                    mac: None,
                })
                .collect(),
        });
        assert!(matches!(
            config.validate(),
            Err(SdkError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_duplicate_port_is_malformed() {
        let json = r#"{ "chips": [ { "chip_id": 1, "ports": [ { "port_id": 4 }, { "port_id": 4 } ] } ] }"#;
        let config = DeviceConfig::from_json_str(json).unwrap();

        assert!(matches!(
            config.chips[0].to_switch_chip(),
            Err(SdkError::InvalidParameter { .. })
        ));
        assert!(matches!(
            config.validate(),
            Err(SdkError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_to_switch_chip() {
        let config = DeviceConfig::from_json_str(TOPOLOGY).unwrap();
        let chip = config.chips[0].to_switch_chip().unwrap();
        assert_eq!(chip.chip_id, 1);
        assert_eq!(chip.num_of_ports, 2);
        assert_eq!(chip.ports[0].status, LinkStatus::Up);
        assert_eq!(chip.ports[0].speed, 100_000);
        assert_eq!(chip.ports[1].port_id, 11);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TOPOLOGY.as_bytes()).unwrap();

        let config = DeviceConfig::load(file.path()).unwrap();
        assert_eq!(config.chips.len(), 2);

        assert!(DeviceConfig::load("/nonexistent/topology.json").is_err());
    }
}
