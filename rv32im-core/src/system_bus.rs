use crate::address_map::{AddressMap, AddressMapError};
use crate::bus::{Bus, BusError, BusResult};
use crate::AddressRange;
use log::debug;

/// Abstraction of a system's main bus connecting all devices to the core.
///
/// This can be thought of as a crossbar providing a single *master* interface for the entire
/// 32-bit physical address space, and delegating requests to the appropriate device's *slave*
/// interface depending on a configurable address mapping. Devices see addresses relative to the
/// start of their region.
///
/// Accesses are always in the form of `(address, size)` pairs. The access request is forwarded to
/// the device that `address` maps to, if and only if the entire address range
/// `address..(address+size)` is contained within the region that `address` is in. Otherwise, or
/// if `address` lies in a vacant region, the access fails with [`BusError::AccessFault`].
#[derive(Debug, Default)]
pub struct SystemBus {
    memory_map: AddressMap<Box<dyn Bus>>,
}

impl SystemBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `device` to the bus, serving the addresses in `range`.
    pub fn attach(
        &mut self,
        range: AddressRange,
        device: Box<dyn Bus>,
    ) -> Result<(), AddressMapError> {
        debug!("attaching {device:?} at {range}");
        self.memory_map.insert(range, device)
    }

    /// Returns the mapped regions in ascending address order.
    pub fn regions(&self) -> impl Iterator<Item = AddressRange> + '_ {
        self.memory_map.iter().map(|(range, _)| range)
    }

    /// Validates that the `(address, size)` pair lies entirely within `range`.
    fn check_access(range: AddressRange, address: u32, size: usize) -> BusResult {
        if range.contains_access(address, size) {
            Ok(())
        } else {
            Err(BusError::AccessFault { address, size })
        }
    }
}

impl Bus for SystemBus {
    fn read(&mut self, buf: &mut [u8], address: u32) -> BusResult {
        let (range, device) = self.memory_map.range_value_mut(address);
        let device = device.ok_or(BusError::AccessFault {
            address,
            size: buf.len(),
        })?;
        Self::check_access(range, address, buf.len())?;
        device
            .read(buf, address - range.start())
            .map_err(|err| err.rebase(range.start()))
    }

    fn read_pure(&self, buf: &mut [u8], address: u32) -> BusResult {
        let (range, device) = self.memory_map.range_value(address);
        let device = device.ok_or(BusError::AccessFault {
            address,
            size: buf.len(),
        })?;
        Self::check_access(range, address, buf.len())?;
        device
            .read_pure(buf, address - range.start())
            .map_err(|err| err.rebase(range.start()))
    }

    fn write(&mut self, address: u32, buf: &[u8]) -> BusResult {
        let (range, device) = self.memory_map.range_value_mut(address);
        let device = device.ok_or(BusError::AccessFault {
            address,
            size: buf.len(),
        })?;
        Self::check_access(range, address, buf.len())?;
        device
            .write(address - range.start(), buf)
            .map_err(|err| err.rebase(range.start()))
    }
}
