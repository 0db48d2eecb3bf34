//! C-linkage exports of the fake SDK.
//!
//! Two surfaces are exported, both bound to one process-wide [`Device`]:
//!
//! - the vendor SDK functions (`chip_sdk_*`) called by switch configuration
//!   code under test
//! - the device configuration functions (`device_*`) called by the test
//!   harness to describe chips and drive link state
//!
//! These functions only validate pointers and translate between C values and
//! [`Device`] calls. They never unwind across the boundary: every outcome is
//! a [`SdkStatus`] or a null pointer.
//!
//! Pointers returned by the `device_get_*` functions point into the device's
//! storage. They stay valid until [`device_reset`] and always show the
//! current state of the record.

use std::os::raw::c_int;
use std::ptr;
use std::slice;
use std::sync::Arc;

use chip_sdk::{
    ChipId, LinkStatus, LinkStatusCallback, LinkStatusHandler, MacAddress, PhyPort, PhyPortId,
    PortId, SdkError, SdkResult, SdkStatus, SwitchChip, CHIP_SDK_PHY_PORT_PER_CHIP,
};
use log::{debug, warn};
use once_cell::sync::OnceCell;

use crate::device::Device;

// =============================================================================
// Process-wide device
// =============================================================================

static SHIM_DEVICE: OnceCell<Device> = OnceCell::new();

/// Installs the device served by the C exports.
///
/// Must run before the first C call; otherwise a default device has already
/// been created and the install fails.
pub fn install_device(device: Device) -> SdkResult<()> {
    SHIM_DEVICE.set(device).map_err(|_| {
        warn!("Shim device already initialized, install ignored");
        SdkError::already_exists("shim device")
    })?;
    debug!("Shim device installed");
    Ok(())
}

/// Returns the device served by the C exports, creating a default one on
/// first use.
pub fn shim_device() -> &'static Device {
    SHIM_DEVICE.get_or_init(Device::default)
}

fn count_to_c(count: usize) -> c_int {
    c_int::try_from(count).unwrap_or(c_int::MAX)
}

// =============================================================================
// Vendor SDK surface
// =============================================================================

/// Copies every chip into `chips`.
///
/// `*chip_num` holds the capacity of `chips` on entry. On success it is set
/// to the number of chips written. If the buffer is too small nothing is
/// written, `CHIP_SDK_BUFFER_TOO_SMALL` is returned and `*chip_num` is set to
/// the required count. A null `chips` is a sizing query.
///
/// # Safety
///
/// - `chip_num` must be valid for reads and writes
/// - if non-null, `chips` must be valid for writes of `*chip_num` records
#[no_mangle]
pub unsafe extern "C" fn chip_sdk_init(
    chips: *mut SwitchChip,
    chip_num: *mut c_int,
) -> SdkStatus {
    if chip_num.is_null() {
        warn!("chip_sdk_init called with null chip_num");
        return SdkStatus::InvalidParam;
    }

    let capacity = if chips.is_null() {
        0
    } else {
        usize::try_from(*chip_num).unwrap_or(0)
    };
    let buffer: &mut [SwitchChip] = if capacity == 0 {
        &mut []
    } else {
        slice::from_raw_parts_mut(chips, capacity)
    };

    match shim_device().get_chips_into(buffer) {
        Ok(written) => {
            *chip_num = count_to_c(written);
            SdkStatus::Success
        }
        Err(e) => {
            if let Some(required) = e.required_capacity() {
                *chip_num = count_to_c(required);
            }
            e.status()
        }
    }
}

/// Registers the link status callback. A null callback clears it.
#[no_mangle]
pub extern "C" fn chip_sdk_register_link_status_callback(
    cb: Option<LinkStatusCallback>,
) -> SdkStatus {
    let handler = cb.map(|cb| {
        let handler: LinkStatusHandler =
            Arc::new(move |port: PhyPortId, status: LinkStatus| cb(port.0, port.1, status));
        handler
    });
    shim_device().register_link_status_callback(handler);
    SdkStatus::Success
}

/// Programs the MAC address of a port.
///
/// # Safety
///
/// - `mac` must be null or point to a valid 6-byte MAC
#[no_mangle]
pub unsafe extern "C" fn chip_sdk_set_mac(
    chip_id: ChipId,
    port_id: PortId,
    mac: *const MacAddress,
) -> SdkStatus {
    if mac.is_null() {
        warn!(
            "chip_sdk_set_mac called with null mac for port {}/{}",
            chip_id, port_id
        );
        return SdkStatus::InvalidParam;
    }

    shim_device()
        .set_mac(PhyPortId(chip_id, port_id), &*mac)
        .into()
}

// =============================================================================
// Device configuration surface
// =============================================================================

/// Copies a chip descriptor written by C code.
///
/// Fields are read as raw C values, so a port status outside `LinkStatus`
/// is rejected instead of being materialised as an enum. Slots past
/// `num_of_ports` are not read.
///
/// # Safety
///
/// `chip` must be non-null and valid for reads of a `SwitchChip`.
unsafe fn read_chip(chip: *const SwitchChip) -> SdkResult<SwitchChip> {
    let chip_id = ptr::addr_of!((*chip).chip_id).read();
    let num_of_ports = ptr::addr_of!((*chip).num_of_ports).read();

    let mut record = SwitchChip::new(chip_id);
    record.num_of_ports = num_of_ports;

    let live = usize::try_from(num_of_ports)
        .unwrap_or(0)
        .min(CHIP_SDK_PHY_PORT_PER_CHIP);
    for index in 0..live {
        let port = ptr::addr_of!((*chip).ports[index]);
        let port_id = ptr::addr_of!((*port).port_id).read();
        let raw_status = ptr::addr_of!((*port).status).cast::<c_int>().read();
        let status = LinkStatus::from_raw(raw_status).ok_or_else(|| {
            SdkError::invalid_parameter(format!(
                "port {} on chip {} has invalid link status {}",
                port_id, chip_id, raw_status
            ))
        })?;

        record.ports[index] = PhyPort::new(port_id)
            .with_speed(ptr::addr_of!((*port).speed).read())
            .with_status(status);
    }

    Ok(record)
}

/// Registers a chip with the device.
///
/// # Safety
///
/// - `chip` must be null or point to memory laid out as a `SwitchChip`
#[no_mangle]
pub unsafe extern "C" fn device_add_chip(chip: *const SwitchChip) -> SdkStatus {
    if chip.is_null() {
        warn!("device_add_chip called with null chip");
        return SdkStatus::InvalidParam;
    }

    let record = match read_chip(chip) {
        Ok(record) => record,
        Err(e) => {
            warn!("device_add_chip rejected descriptor: {}", e);
            return e.status();
        }
    };
    shim_device().add_chip(&record).into()
}

/// Returns the chip record, or null if the chip does not exist.
#[no_mangle]
pub extern "C" fn device_get_chip(chip_id: ChipId) -> *const SwitchChip {
    shim_device().chip_ptr(chip_id).unwrap_or(ptr::null())
}

/// Returns the port record, or null if the chip or port does not exist.
#[no_mangle]
pub extern "C" fn device_get_phy_port(chip_id: ChipId, port_id: PortId) -> *const PhyPort {
    shim_device()
        .port_ptr(PhyPortId(chip_id, port_id))
        .unwrap_or(ptr::null())
}

/// Sets the link status of a port and fires the registered callback.
///
/// `status` is the raw C enum value; anything outside `LinkStatus` is
/// rejected with `CHIP_SDK_INVALID_PARAM`.
#[no_mangle]
pub extern "C" fn device_set_link_status(
    chip_id: ChipId,
    port_id: PortId,
    status: c_int,
) -> SdkStatus {
    let Some(link_status) = LinkStatus::from_raw(status) else {
        warn!(
            "device_set_link_status called with invalid status {} for port {}/{}",
            status, chip_id, port_id
        );
        return SdkStatus::InvalidParam;
    };

    shim_device()
        .set_link_status(PhyPortId(chip_id, port_id), link_status)
        .into()
}

/// Returns the MAC of a port, or null if the port does not exist or has no
/// MAC. Use [`device_lookup_mac`] to tell the two apart.
#[no_mangle]
pub extern "C" fn device_get_mac_addr(chip_id: ChipId, port_id: PortId) -> *const MacAddress {
    shim_device()
        .mac_ptr(PhyPortId(chip_id, port_id))
        .unwrap_or(ptr::null())
}

/// Copies the MAC of a port into `mac_out`.
///
/// Returns `CHIP_SDK_NOT_FOUND` for an unknown chip or port and
/// `CHIP_SDK_NOT_SET` for a port without a MAC; `mac_out` is left untouched
/// in both cases.
///
/// # Safety
///
/// - `mac_out` must be null or valid for a 6-byte write
#[no_mangle]
pub unsafe extern "C" fn device_lookup_mac(
    chip_id: ChipId,
    port_id: PortId,
    mac_out: *mut MacAddress,
) -> SdkStatus {
    if mac_out.is_null() {
        warn!("device_lookup_mac called with null output");
        return SdkStatus::InvalidParam;
    }

    let port = PhyPortId(chip_id, port_id);
    match shim_device().get_mac(port) {
        Ok(Some(mac)) => {
            *mac_out = mac;
            SdkStatus::Success
        }
        Ok(None) => SdkStatus::NotSet,
        Err(e) => e.status(),
    }
}

/// Drops every chip and the link status callback.
///
/// Pointers previously returned by `device_get_*` dangle afterwards.
#[no_mangle]
pub extern "C" fn device_reset() {
    shim_device().clear();
}
