// Test fixtures over the C exports of the stub

#![allow(dead_code)]

use std::os::raw::c_int;
use std::ptr;

use chip_sdk::{
    ChipId, LinkStatus, LinkStatusCallback, MacAddress, PhyPort, PhyPortId, PortId, SdkError,
    SdkResult, SdkStatus, SwitchChip,
};
use chip_sdk_stub::shim::*;

pub trait ChipFixture {
    fn with_ports(id: ChipId, ports: &[PortId]) -> Self;
}

impl ChipFixture for SwitchChip {
    fn with_ports(id: ChipId, ports: &[PortId]) -> Self {
        let mut chip = SwitchChip::new(id);
        for &port_id in ports {
            chip.add_port(PhyPort::new(port_id))
                .expect("Failed to add port to fixture chip");
        }
        chip
    }
}

/// Copies the record behind a pointer returned by the shim.
macro_rules! ptr_to_option {
    ($ptr:expr) => {{
        let ptr = $ptr;
        if ptr.is_null() {
            None
        } else {
            Some(unsafe { *ptr })
        }
    }};
}

/// Drives the process-wide shim device the way a C harness would.
///
/// Creating a fixture resets the device; dropping it resets it again.
pub struct DeviceFixture;

impl DeviceFixture {
    pub fn new() -> Self {
        device_reset();
        DeviceFixture
    }

    pub fn add_chip(&self, chip: &SwitchChip) -> SdkResult<()> {
        unsafe { device_add_chip(chip) }.into_result()
    }

    pub fn get_chip(&self, chip_id: ChipId) -> Option<SwitchChip> {
        ptr_to_option!(device_get_chip(chip_id))
    }

    pub fn get_phy_port(&self, port: PhyPortId) -> Option<PhyPort> {
        ptr_to_option!(device_get_phy_port(port.0, port.1))
    }

    pub fn set_link_status(&self, port: PhyPortId, status: LinkStatus) -> SdkResult<()> {
        device_set_link_status(port.0, port.1, status as c_int).into_result()
    }

    pub fn get_mac_addr(&self, port: PhyPortId) -> Option<MacAddress> {
        ptr_to_option!(device_get_mac_addr(port.0, port.1))
    }

    /// Returns the raw status so callers can tell NOT_FOUND from NOT_SET.
    pub fn lookup_mac(&self, port: PhyPortId) -> Result<MacAddress, SdkStatus> {
        let mut mac = MacAddress::ZERO;
        match unsafe { device_lookup_mac(port.0, port.1, &mut mac) } {
            SdkStatus::Success => Ok(mac),
            status => Err(status),
        }
    }

    pub fn set_mac(&self, port: PhyPortId, mac: &MacAddress) -> SdkResult<()> {
        unsafe { chip_sdk_set_mac(port.0, port.1, mac) }.into_result()
    }

    pub fn register_link_status_callback(&self, cb: Option<LinkStatusCallback>) -> SdkResult<()> {
        chip_sdk_register_link_status_callback(cb).into_result()
    }

    /// Reads every chip with the two-call sizing protocol.
    pub fn init(&self) -> SdkResult<Vec<SwitchChip>> {
        let mut count: c_int = 0;
        match unsafe { chip_sdk_init(ptr::null_mut(), &mut count) } {
            SdkStatus::Success => return Ok(Vec::new()),
            SdkStatus::BufferTooSmall => {}
            status => return status.into_result().map(|_| Vec::new()),
        }

        let mut chips = vec![SwitchChip::default(); count as usize];
        unsafe { chip_sdk_init(chips.as_mut_ptr(), &mut count) }.into_result()?;
        chips.truncate(count as usize);
        Ok(chips)
    }

    /// Reads chips into a buffer of fixed capacity.
    pub fn init_with_capacity(&self, capacity: usize) -> (SdkStatus, c_int, Vec<SwitchChip>) {
        let mut chips = vec![SwitchChip::default(); capacity];
        let mut count = capacity as c_int;
        let status = unsafe { chip_sdk_init(chips.as_mut_ptr(), &mut count) };
        (status, count, chips)
    }
}

impl Drop for DeviceFixture {
    fn drop(&mut self) {
        device_reset();
    }
}

pub fn expect_status(result: SdkResult<()>, status: SdkStatus) {
    match result {
        Ok(()) => assert_eq!(SdkStatus::Success, status),
        Err(e) => assert_eq!(SdkError::status(&e), status),
    }
}
