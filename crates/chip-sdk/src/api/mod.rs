//! Operation traits of the chip SDK.
//!
//! The SDK has two faces:
//!
//! - [`ChipSdk`]: the vendor API that switch configuration code programs
//!   against (chip discovery, link notifications, MAC programming)
//! - [`DeviceControl`]: the test-configuration API used by harnesses to
//!   describe chips and drive link state on a fake device
//!
//! A C shim over either trait only translates pointers and status codes.

use std::sync::Arc;

use crate::error::SdkResult;
use crate::mac::MacAddress;
use crate::types::{ChipId, LinkStatus, PhyPort, PhyPortId, SwitchChip};

/// Handler invoked when a port's link status changes.
pub type LinkStatusHandler = Arc<dyn Fn(PhyPortId, LinkStatus) + Send + Sync>;

/// Vendor-facing SDK operations.
pub trait ChipSdk: Send + Sync {
    /// Returns every chip on the device in registration order.
    fn init(&self) -> SdkResult<Vec<SwitchChip>>;

    /// Installs the link status handler, replacing any previous one.
    ///
    /// `None` clears the handler.
    fn register_link_status_callback(&self, handler: Option<LinkStatusHandler>) -> SdkResult<()>;

    /// Programs the MAC address of a port.
    fn set_mac(&self, port: PhyPortId, mac: &MacAddress) -> SdkResult<()>;
}

/// Test-configuration operations on a fake device.
pub trait DeviceControl: Send + Sync {
    /// Registers a chip. Chip ids are unique.
    fn add_chip(&self, chip: &SwitchChip) -> SdkResult<()>;

    /// Returns a snapshot of a chip, or `None` if it was never added.
    fn get_chip(&self, chip_id: ChipId) -> Option<SwitchChip>;

    /// Returns a snapshot of a port, or `None` if the chip or port is unknown.
    fn get_phy_port(&self, port: PhyPortId) -> Option<PhyPort>;

    /// Updates a port's link status and notifies the registered handler.
    fn set_link_status(&self, port: PhyPortId, status: LinkStatus) -> SdkResult<()>;

    /// Returns the MAC programmed on a port.
    ///
    /// An unknown chip or port is an error; a known port without a MAC is
    /// `Ok(None)`.
    fn get_mac(&self, port: PhyPortId) -> SdkResult<Option<MacAddress>>;
}
