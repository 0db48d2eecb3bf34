//! In-memory fake of the switch chip SDK.
//!
//! Switch configuration code is written against the vendor's C SDK. This
//! crate stands in for that SDK in tests so the configuration logic can run
//! without hardware:
//!
//! - [`Device`]: the fake chip. Holds chip and port records, MAC
//!   programming and the link status callback slot.
//! - [`DeviceConfig`]: topology description used to populate a device,
//!   loadable from JSON.
//! - [`shim`]: `extern "C"` exports of both the vendor SDK surface and the
//!   test-configuration surface, bound to one process-wide [`Device`].
//!
//! # Example
//!
//! ```
//! use chip_sdk::{LinkStatus, PhyPort, PhyPortId, SwitchChip};
//! use chip_sdk_stub::Device;
//!
//! let device = Device::default();
//! let mut chip = SwitchChip::new(1);
//! chip.add_port(PhyPort::new(10)).unwrap();
//! device.add_chip(&chip).unwrap();
//!
//! device.set_link_status(PhyPortId(1, 10), LinkStatus::Up).unwrap();
//! assert_eq!(
//!     device.get_phy_port(PhyPortId(1, 10)).map(|p| p.status),
//!     Some(LinkStatus::Up)
//! );
//! ```

mod config;
mod device;
mod error;
pub mod shim;

pub use config::{ChipConfig, DeviceConfig, PortConfig};
pub use device::Device;
pub use error::{Result, StubError};
