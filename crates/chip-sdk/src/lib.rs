//! Types and interfaces of the switch chip SDK.
//!
//! The chip SDK is a small C-linkage API exposed by the switch ASIC vendor.
//! This crate holds everything both sides of that boundary agree on:
//!
//! - [`types`]: C-compatible chip and port records, identifiers and limits
//! - [`mac`]: the 6-byte MAC address carried across the boundary
//! - [`error`]: SDK status codes and the Rust error type built on them
//! - [`api`]: the operation traits implemented by an SDK backend
//!
//! # Example
//!
//! ```ignore
//! use chip_sdk::{ChipSdk, MacAddress, PhyPortId, SdkResult};
//!
//! fn program_port_mac(sdk: &dyn ChipSdk, port: PhyPortId) -> SdkResult<()> {
//!     let mac: MacAddress = "02:00:00:00:00:01".parse().unwrap();
//!     sdk.set_mac(port, &mac)
//! }
//! ```

pub mod api;
pub mod error;
pub mod mac;
pub mod types;

pub use api::{ChipSdk, DeviceControl, LinkStatusHandler};
pub use error::{SdkError, SdkResult, SdkStatus, SdkStatusExt};
pub use mac::{MacAddress, ParseError};
pub use types::{
    ChipId, LinkStatus, LinkStatusCallback, PhyPort, PhyPortId, PortId, SwitchChip,
    CHIP_SDK_CHIP_MAX, CHIP_SDK_PHY_PORT_PER_CHIP,
};
