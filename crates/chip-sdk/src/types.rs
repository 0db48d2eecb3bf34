//! C-compatible chip and port records.
//!
//! These mirror the structs in the SDK header field for field. The SDK hands
//! out chips as fixed-size records: a chip carries a fixed array of port
//! slots and a count of how many of them are in use.

use crate::error::{SdkError, SdkResult};
use crate::mac::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::os::raw::c_int;
use std::str::FromStr;

/// Number of chips the SDK reports at most on a default device.
pub const CHIP_SDK_CHIP_MAX: usize = 4;

/// Number of physical port slots in a [`SwitchChip`] record.
pub const CHIP_SDK_PHY_PORT_PER_CHIP: usize = 8;

/// Chip identifier (C `int`).
pub type ChipId = c_int;

/// Port identifier, unique within a chip (C `int`).
pub type PortId = c_int;

/// Globally addresses a physical port as (chip, port).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhyPortId(pub ChipId, pub PortId);

impl PhyPortId {
    pub const fn chip(&self) -> ChipId {
        self.0
    }

    pub const fn port(&self) -> PortId {
        self.1
    }
}

impl fmt::Display for PhyPortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, self.1)
    }
}

/// Link status of a physical port.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Down = 0,
    Up = 1,
    /// No link report has been seen for the port yet.
    #[default]
    Unknown = 2,
}

impl LinkStatus {
    /// Converts a raw C value, rejecting anything outside the enum.
    pub fn from_raw(raw: c_int) -> Option<Self> {
        match raw {
            0 => Some(LinkStatus::Down),
            1 => Some(LinkStatus::Up),
            2 => Some(LinkStatus::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LinkStatus::Down => "down",
            LinkStatus::Up => "up",
            LinkStatus::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for LinkStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "down" => Ok(LinkStatus::Down),
            "up" => Ok(LinkStatus::Up),
            "unknown" => Ok(LinkStatus::Unknown),
            _ => Err(ParseError::InvalidLinkStatus(s.to_string())),
        }
    }
}

/// Link status notification registered with the SDK.
pub type LinkStatusCallback = extern "C" fn(chip_id: c_int, port_id: c_int, status: LinkStatus);

/// A physical port record (`PhyPort` in the SDK header).
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PhyPort {
    pub port_id: PortId,
    /// Port speed in Mbps. Informational only.
    pub speed: c_int,
    pub status: LinkStatus,
}

impl PhyPort {
    pub fn new(port_id: PortId) -> Self {
        Self {
            port_id,
            ..Default::default()
        }
    }

    pub fn with_speed(mut self, speed: c_int) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_status(mut self, status: LinkStatus) -> Self {
        self.status = status;
        self
    }
}

/// A switch chip record (`SwitchChip` in the SDK header).
///
/// Only the first `num_of_ports` entries of `ports` are live.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SwitchChip {
    pub chip_id: ChipId,
    pub num_of_ports: c_int,
    pub ports: [PhyPort; CHIP_SDK_PHY_PORT_PER_CHIP],
}

impl SwitchChip {
    /// Creates a chip with no ports.
    pub fn new(chip_id: ChipId) -> Self {
        Self {
            chip_id,
            ..Default::default()
        }
    }

    /// Appends a port to the next free slot.
    ///
    /// # Errors
    ///
    /// Fails with `NoResource` when every slot is taken and with
    /// `AlreadyExists` when the port id is already on this chip.
    pub fn add_port(&mut self, port: PhyPort) -> SdkResult<()> {
        if self.port(port.port_id).is_some() {
            return Err(SdkError::already_exists(format!(
                "port {} on chip {}",
                port.port_id, self.chip_id
            )));
        }

        let used = self.port_count();
        if used >= CHIP_SDK_PHY_PORT_PER_CHIP {
            return Err(SdkError::no_resource(format!(
                "port slots on chip {}",
                self.chip_id
            )));
        }

        self.ports[used] = port;
        self.num_of_ports += 1;
        Ok(())
    }

    /// Returns the number of live ports, clamped to the slot array.
    pub fn port_count(&self) -> usize {
        usize::try_from(self.num_of_ports)
            .unwrap_or(0)
            .min(CHIP_SDK_PHY_PORT_PER_CHIP)
    }

    /// Returns the live ports.
    pub fn ports(&self) -> &[PhyPort] {
        &self.ports[..self.port_count()]
    }

    /// Returns the slot index of a live port.
    pub fn port_index(&self, port_id: PortId) -> Option<usize> {
        self.ports().iter().position(|p| p.port_id == port_id)
    }

    pub fn port(&self, port_id: PortId) -> Option<&PhyPort> {
        let index = self.port_index(port_id)?;
        Some(&self.ports[index])
    }

    /// Checks that a descriptor received from a caller is well formed.
    ///
    /// The port count must fit the slot array and live port ids must be
    /// unique.
    pub fn validate(&self) -> SdkResult<()> {
        let count = self.num_of_ports;
        if count < 0 || count as usize > CHIP_SDK_PHY_PORT_PER_CHIP {
            return Err(SdkError::invalid_parameter(format!(
                "chip {} has {} ports (max {})",
                self.chip_id, count, CHIP_SDK_PHY_PORT_PER_CHIP
            )));
        }

        let ports = self.ports();
        for (i, port) in ports.iter().enumerate() {
            if ports[..i].iter().any(|p| p.port_id == port.port_id) {
                return Err(SdkError::invalid_parameter(format!(
                    "chip {} lists port {} twice",
                    self.chip_id, port.port_id
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_link_status_raw() {
        assert_eq!(LinkStatus::from_raw(0), Some(LinkStatus::Down));
        assert_eq!(LinkStatus::from_raw(1), Some(LinkStatus::Up));
        assert_eq!(LinkStatus::from_raw(2), Some(LinkStatus::Unknown));
        assert_eq!(LinkStatus::from_raw(3), None);
        assert_eq!(LinkStatus::from_raw(-1), None);
        assert_eq!(LinkStatus::default(), LinkStatus::Unknown);
    }

    #[test]
    fn test_link_status_parse() {
        assert_eq!("UP".parse::<LinkStatus>().unwrap(), LinkStatus::Up);
        assert_eq!(LinkStatus::Down.to_string(), "down");
        assert!("flapping".parse::<LinkStatus>().is_err());
    }

    #[test]
    fn test_add_port() {
        let mut chip = SwitchChip::new(1);
        chip.add_port(PhyPort::new(10).with_speed(100_000)).unwrap();
        chip.add_port(PhyPort::new(11)).unwrap();

        assert_eq!(chip.num_of_ports, 2);
        assert_eq!(chip.port(11).map(|p| p.port_id), Some(11));
        assert_eq!(chip.port(10).map(|p| p.speed), Some(100_000));
        assert!(chip.port(12).is_none());
    }

    #[test]
    fn test_add_port_duplicate() {
        let mut chip = SwitchChip::new(0);
        chip.add_port(PhyPort::new(3)).unwrap();
        let err = chip.add_port(PhyPort::new(3)).unwrap_err();
        assert!(matches!(err, SdkError::AlreadyExists { .. }));
        assert_eq!(chip.num_of_ports, 1);
    }

    #[test]
    fn test_add_port_full() {
        let mut chip = SwitchChip::new(0);
        for id in 0..CHIP_SDK_PHY_PORT_PER_CHIP as PortId {
            chip.add_port(PhyPort::new(id)).unwrap();
        }
        let err = chip.add_port(PhyPort::new(100)).unwrap_err();
        assert!(matches!(err, SdkError::NoResource { .. }));
    }

    #[test]
    fn test_stale_slots_are_not_ports() {
        // Slot 0 holds a default port with id 0 but the chip has no ports.
        let chip = SwitchChip::new(0);
        assert!(chip.port(0).is_none());
        assert!(chip.ports().is_empty());
    }

    #[test]
    fn test_validate() {
        let mut chip = SwitchChip::new(0);
        chip.add_port(PhyPort::new(0)).unwrap();
        assert!(chip.validate().is_ok());

        let mut oversized = chip;
        oversized.num_of_ports = CHIP_SDK_PHY_PORT_PER_CHIP as c_int + 1;
        assert!(matches!(
            oversized.validate(),
            Err(SdkError::InvalidParameter { .. })
        ));

        let mut negative = chip;
        negative.num_of_ports = -1;
        assert!(negative.validate().is_err());
        assert_eq!(negative.port_count(), 0);

        let mut duplicate = chip;
        duplicate.ports[1] = PhyPort::new(0);
        duplicate.num_of_ports = 2;
        assert!(duplicate.validate().is_err());
    }

    #[test]
    fn test_phy_port_id_display() {
        let id = PhyPortId(1, 10);
        assert_eq!(id.to_string(), "1/10");
        assert_eq!(id.chip(), 1);
        assert_eq!(id.port(), 10);
    }
}
