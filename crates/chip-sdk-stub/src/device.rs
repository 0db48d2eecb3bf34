//! The fake chip device.
//!
//! A [`Device`] owns every chip record of the simulated switch. Chips are
//! registered once and then mutated in place; they are only dropped by
//! [`Device::clear`], which harnesses call on teardown.
//!
//! Each chip record lives in its own heap slot, so its address stays fixed
//! while the chip list grows. The C shim relies on this to hand out
//! pointers into the registry.

use std::fmt;
use std::ptr::{self, NonNull};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chip_sdk::{
    ChipId, ChipSdk, DeviceControl, LinkStatus, LinkStatusHandler, MacAddress, PhyPort,
    PhyPortId, SdkError, SdkResult, SwitchChip, CHIP_SDK_CHIP_MAX, CHIP_SDK_PHY_PORT_PER_CHIP,
};
use log::debug;

use crate::config::{ChipConfig, DeviceConfig, PortConfig};

/// Registry entry for one chip.
struct ChipRecord {
    chip: SwitchChip,
    /// MAC per port slot, meaningful only where `mac_set` is true.
    macs: [MacAddress; CHIP_SDK_PHY_PORT_PER_CHIP],
    mac_set: [bool; CHIP_SDK_PHY_PORT_PER_CHIP],
}

impl ChipRecord {
    fn new(chip: SwitchChip) -> Self {
        Self {
            chip,
            macs: [MacAddress::ZERO; CHIP_SDK_PHY_PORT_PER_CHIP],
            mac_set: [false; CHIP_SDK_PHY_PORT_PER_CHIP],
        }
    }

    fn mac(&self, index: usize) -> Option<MacAddress> {
        self.mac_set[index].then_some(self.macs[index])
    }
}

/// Heap slot owning one chip record.
///
/// The record is allocated once and only ever reached through the pointer
/// returned by `Box::into_raw`. Writes and the addresses handed to C are
/// all derived from that pointer, so a C reader keeps seeing later writes.
struct ChipSlot(NonNull<ChipRecord>);

// SAFETY: the slot owns its record and every access is serialised by the
// chip table lock of the owning device.
unsafe impl Send for ChipSlot {}
unsafe impl Sync for ChipSlot {}

impl ChipSlot {
    fn new(chip: SwitchChip) -> Self {
        let raw = Box::into_raw(Box::new(ChipRecord::new(chip)));
        // SAFETY: `Box::into_raw` never returns null.
        Self(unsafe { NonNull::new_unchecked(raw) })
    }

    fn record(&self) -> &ChipRecord {
        // SAFETY: the record lives as long as the slot; writes need
        // `&mut self`, so none can overlap this borrow.
        unsafe { self.0.as_ref() }
    }

    fn set_status(&mut self, index: usize, status: LinkStatus) {
        // SAFETY: exclusive access through `&mut self`; raw place write.
        unsafe { (*self.0.as_ptr()).chip.ports[index].status = status }
    }

    fn set_mac(&mut self, index: usize, mac: MacAddress) {
        let record = self.0.as_ptr();
        // SAFETY: as for `set_status`.
        unsafe {
            (*record).macs[index] = mac;
            (*record).mac_set[index] = true;
        }
    }

    fn chip_ptr(&self) -> *const SwitchChip {
        // SAFETY: in-bounds projection without creating a reference.
        unsafe { ptr::addr_of!((*self.0.as_ptr()).chip) }
    }

    fn port_ptr(&self, index: usize) -> *const PhyPort {
        // SAFETY: as for `chip_ptr`; `index` is a live slot.
        unsafe { ptr::addr_of!((*self.0.as_ptr()).chip.ports[index]) }
    }

    fn mac_ptr(&self, index: usize) -> *const MacAddress {
        // SAFETY: as for `port_ptr`.
        unsafe { ptr::addr_of!((*self.0.as_ptr()).macs[index]) }
    }
}

impl Drop for ChipSlot {
    fn drop(&mut self) {
        // SAFETY: allocated by `Box::into_raw` in `ChipSlot::new` and freed
        // only here.
        drop(unsafe { Box::from_raw(self.0.as_ptr()) });
    }
}

type ChipTable = Vec<ChipSlot>;

fn find_chip(chips: &[ChipSlot], chip_id: ChipId) -> Option<&ChipSlot> {
    chips.iter().find(|slot| slot.record().chip.chip_id == chip_id)
}

/// Resolves a port to its chip slot and port index.
fn locate_port(chips: &[ChipSlot], port: PhyPortId) -> SdkResult<(&ChipSlot, usize)> {
    let slot = find_chip(chips, port.chip())
        .ok_or_else(|| SdkError::not_found(format!("chip {}", port.chip())))?;
    let index = slot
        .record()
        .chip
        .port_index(port.port())
        .ok_or_else(|| SdkError::not_found(format!("port {}", port)))?;
    Ok((slot, index))
}

fn locate_port_mut(
    chips: &mut [ChipSlot],
    port: PhyPortId,
) -> SdkResult<(&mut ChipSlot, usize)> {
    let slot = chips
        .iter_mut()
        .find(|slot| slot.record().chip.chip_id == port.chip())
        .ok_or_else(|| SdkError::not_found(format!("chip {}", port.chip())))?;
    let index = slot
        .record()
        .chip
        .port_index(port.port())
        .ok_or_else(|| SdkError::not_found(format!("port {}", port)))?;
    Ok((slot, index))
}

/// In-memory switch device standing in for the vendor SDK.
///
/// All operations take `&self`; chip state sits behind a reader/writer lock
/// so lookups run concurrently and mutations are exclusive. The link status
/// handler is called after the state lock is released, so a handler may
/// call back into the device.
pub struct Device {
    max_chips: usize,
    chips: RwLock<ChipTable>,
    link_status_handler: RwLock<Option<LinkStatusHandler>>,
}

impl Default for Device {
    fn default() -> Self {
        Self::with_capacity(CHIP_SDK_CHIP_MAX)
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("max_chips", &self.max_chips)
            .field("chips", &self.chip_count())
            .field("link_status_handler", &self.has_link_status_callback())
            .finish()
    }
}

impl Device {
    /// Creates an empty device accepting up to `max_chips` chips.
    pub fn with_capacity(max_chips: usize) -> Self {
        Self {
            max_chips,
            chips: RwLock::new(Vec::with_capacity(max_chips)),
            link_status_handler: RwLock::new(None),
        }
    }

    /// Builds a device populated from a topology.
    ///
    /// Preset MACs are programmed directly; no link notification is sent
    /// while populating.
    pub fn from_config(config: &DeviceConfig) -> SdkResult<Self> {
        config.validate()?;

        let device = Self::with_capacity(config.max_chips);
        for chip_config in &config.chips {
            device.add_chip(&chip_config.to_switch_chip()?)?;
            for port in &chip_config.ports {
                if let Some(mac) = port.mac {
                    device.set_mac(PhyPortId(chip_config.chip_id, port.port_id), &mac)?;
                }
            }
        }
        Ok(device)
    }

    /// Exports the current state as a topology.
    pub fn snapshot(&self) -> DeviceConfig {
        let chips = self.read_chips();
        DeviceConfig {
            max_chips: self.max_chips,
            chips: chips
                .iter()
                .map(|slot| {
                    let record = slot.record();
                    ChipConfig {
                        chip_id: record.chip.chip_id,
                        ports: record
                            .chip
                            .ports()
                            .iter()
                            .enumerate()
                            .map(|(index, port)| PortConfig {
                                port_id: port.port_id,
                                speed: port.speed,
                                status: port.status,
                                mac: record.mac(index),
                            })
                            .collect(),
                    }
                })
                .collect(),
        }
    }

    /// Maximum number of chips this device accepts.
    pub fn capacity(&self) -> usize {
        self.max_chips
    }

    pub fn chip_count(&self) -> usize {
        self.read_chips().len()
    }

    pub fn is_empty(&self) -> bool {
        self.chip_count() == 0
    }

    /// Registers a chip.
    ///
    /// # Errors
    ///
    /// - `InvalidParameter` if the descriptor is malformed
    /// - `AlreadyExists` if the chip id is taken (the existing chip is kept)
    /// - `NoResource` if the device is full
    pub fn add_chip(&self, chip: &SwitchChip) -> SdkResult<()> {
        chip.validate()?;

        let mut chips = self.write_chips();
        if find_chip(&chips, chip.chip_id).is_some() {
            return Err(SdkError::already_exists(format!("chip {}", chip.chip_id)));
        }
        if chips.len() >= self.max_chips {
            return Err(SdkError::no_resource(format!(
                "chip table full ({} chips)",
                self.max_chips
            )));
        }

        chips.push(ChipSlot::new(*chip));
        debug!(
            "Added chip {} with {} ports",
            chip.chip_id,
            chip.port_count()
        );
        Ok(())
    }

    pub fn get_chip(&self, chip_id: ChipId) -> Option<SwitchChip> {
        find_chip(&self.read_chips(), chip_id).map(|slot| slot.record().chip)
    }

    pub fn get_phy_port(&self, port: PhyPortId) -> Option<PhyPort> {
        let chips = self.read_chips();
        locate_port(&chips, port)
            .ok()
            .map(|(slot, index)| slot.record().chip.ports[index])
    }

    /// Updates the link status of a port.
    ///
    /// The registered handler, if any, runs on the calling thread once the
    /// new status is visible to readers. It runs outside the state lock, so
    /// when several threads update the same port at once their notifications
    /// may arrive in a different order from the writes; the last
    /// notification is not guaranteed to match the stored status.
    pub fn set_link_status(&self, port: PhyPortId, status: LinkStatus) -> SdkResult<()> {
        {
            let mut chips = self.write_chips();
            let (slot, index) = locate_port_mut(&mut chips, port)?;
            slot.set_status(index, status);
        }
        debug!("Link status of port {} set to {}", port, status);

        let handler = self.read_handler().clone();
        if let Some(handler) = handler {
            handler(port, status);
        }
        Ok(())
    }

    /// Returns the MAC of a port.
    ///
    /// `Err(NotFound)` for an unknown chip or port, `Ok(None)` for a port
    /// whose MAC was never set.
    pub fn get_mac(&self, port: PhyPortId) -> SdkResult<Option<MacAddress>> {
        let chips = self.read_chips();
        let (slot, index) = locate_port(&chips, port)?;
        Ok(slot.record().mac(index))
    }

    pub fn set_mac(&self, port: PhyPortId, mac: &MacAddress) -> SdkResult<()> {
        let mut chips = self.write_chips();
        let (slot, index) = locate_port_mut(&mut chips, port)?;
        slot.set_mac(index, *mac);
        debug!("MAC of port {} set to {}", port, mac);
        Ok(())
    }

    /// Copies every chip into `buffer` in registration order.
    ///
    /// Returns the number of chips written. If `buffer` is too short nothing
    /// is written and the error carries the required length, so callers can
    /// size a buffer and retry.
    pub fn get_chips_into(&self, buffer: &mut [SwitchChip]) -> SdkResult<usize> {
        let chips = self.read_chips();
        if buffer.len() < chips.len() {
            return Err(SdkError::buffer_too_small(chips.len(), buffer.len()));
        }

        for (out, slot) in buffer.iter_mut().zip(chips.iter()) {
            *out = slot.record().chip;
        }
        Ok(chips.len())
    }

    /// Returns every chip in registration order.
    pub fn chips(&self) -> Vec<SwitchChip> {
        self.read_chips()
            .iter()
            .map(|slot| slot.record().chip)
            .collect()
    }

    /// Installs or clears the link status handler.
    pub fn register_link_status_callback(&self, handler: Option<LinkStatusHandler>) {
        let installed = handler.is_some();
        *self.write_handler() = handler;
        if installed {
            debug!("Link status callback registered");
        } else {
            debug!("Link status callback cleared");
        }
    }

    pub fn has_link_status_callback(&self) -> bool {
        self.read_handler().is_some()
    }

    /// Drops every chip and the link status handler.
    ///
    /// Pointers previously handed out by the C shim dangle after this.
    pub fn clear(&self) {
        self.write_chips().clear();
        *self.write_handler() = None;
        debug!("Device cleared");
    }

    // The pointers below stay valid until the chip is dropped by `clear`
    // and observe every later write to the record.

    pub(crate) fn chip_ptr(&self, chip_id: ChipId) -> Option<*const SwitchChip> {
        let chips = self.read_chips();
        find_chip(&chips, chip_id).map(ChipSlot::chip_ptr)
    }

    pub(crate) fn port_ptr(&self, port: PhyPortId) -> Option<*const PhyPort> {
        let chips = self.read_chips();
        let (slot, index) = locate_port(&chips, port).ok()?;
        Some(slot.port_ptr(index))
    }

    pub(crate) fn mac_ptr(&self, port: PhyPortId) -> Option<*const MacAddress> {
        let chips = self.read_chips();
        let (slot, index) = locate_port(&chips, port).ok()?;
        slot.record().mac_set[index].then(|| slot.mac_ptr(index))
    }

    // Every mutation is a single field store, so state behind a poisoned
    // lock is still consistent.
    fn read_chips(&self) -> RwLockReadGuard<'_, ChipTable> {
        self.chips.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_chips(&self) -> RwLockWriteGuard<'_, ChipTable> {
        self.chips.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_handler(&self) -> RwLockReadGuard<'_, Option<LinkStatusHandler>> {
        self.link_status_handler
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_handler(&self) -> RwLockWriteGuard<'_, Option<LinkStatusHandler>> {
        self.link_status_handler
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl ChipSdk for Device {
    fn init(&self) -> SdkResult<Vec<SwitchChip>> {
        Ok(self.chips())
    }

    fn register_link_status_callback(&self, handler: Option<LinkStatusHandler>) -> SdkResult<()> {
        Device::register_link_status_callback(self, handler);
        Ok(())
    }

    fn set_mac(&self, port: PhyPortId, mac: &MacAddress) -> SdkResult<()> {
        Device::set_mac(self, port, mac)
    }
}

impl DeviceControl for Device {
    fn add_chip(&self, chip: &SwitchChip) -> SdkResult<()> {
        Device::add_chip(self, chip)
    }

    fn get_chip(&self, chip_id: ChipId) -> Option<SwitchChip> {
        Device::get_chip(self, chip_id)
    }

    fn get_phy_port(&self, port: PhyPortId) -> Option<PhyPort> {
        Device::get_phy_port(self, port)
    }

    fn set_link_status(&self, port: PhyPortId, status: LinkStatus) -> SdkResult<()> {
        Device::set_link_status(self, port, status)
    }

    fn get_mac(&self, port: PhyPortId) -> SdkResult<Option<MacAddress>> {
        Device::get_mac(self, port)
    }
}
