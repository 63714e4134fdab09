//! The memory capability consumed by the core.
//!
//! Devices expose the byte-oriented [`Bus`] interface. The core only ever sees the narrower
//! [`Memory`] interface of 8/16/32-bit accesses, which is provided for every [`Bus`].

use std::fmt::Debug;
use thiserror::Error;

/// A byte-addressed slave interface, loosely modelled after a TileLink-like bus.
///
/// Accesses can be made for any `(address, size)` pair, where the size is `buf.len()`. Addresses
/// need not be naturally aligned to the access size; it is up to the implementor to decide which
/// pairs it supports. Unsupported pairs must be rejected with [`BusError::AccessFault`] rather
/// than panicking.
///
/// Values are serialized in little-endian byte order.
pub trait Bus: Debug {
    /// Invoke a read access for `address` with size `buf.len()`, writing the result to `buf`.
    ///
    /// A read may have side effects on the device.
    fn read(&mut self, buf: &mut [u8], address: u32) -> BusResult;

    /// Request an effect-free read for `address` with size `buf.len()`, e.g. for memory dumps.
    fn read_pure(&self, buf: &mut [u8], address: u32) -> BusResult;

    /// Invoke a write access for `address` with size `buf.len()`, reading the data from `buf`.
    fn write(&mut self, address: u32, buf: &[u8]) -> BusResult;
}

pub type BusResult = Result<(), BusError>;

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum BusError {
    /// The `(address, size)` pair is not backed by any device, or the device rejected it.
    #[error("access fault for {size} byte(s) at {address:#010x}")]
    AccessFault { address: u32, size: usize },
    /// A device requested the simulation to stop with the given status code.
    #[error("exit requested with code {code}")]
    Exit { code: u32 },
}

impl BusError {
    /// Rebase the address reported in this error by `offset`.
    ///
    /// Used by devices that forward accesses with a translated address.
    pub fn rebase(self, offset: u32) -> Self {
        match self {
            Self::AccessFault { address, size } => Self::AccessFault {
                address: address.wrapping_add(offset),
                size,
            },
            exit @ Self::Exit { .. } => exit,
        }
    }
}

/// Word-granular access to an address space, as used by the core.
///
/// Addresses are passed through exactly as computed: no alignment masking is applied.
pub trait Memory {
    fn read_u8(&mut self, address: u32) -> Result<u8, BusError>;
    fn read_u16(&mut self, address: u32) -> Result<u16, BusError>;
    fn read_u32(&mut self, address: u32) -> Result<u32, BusError>;
    fn write_u8(&mut self, address: u32, value: u8) -> BusResult;
    fn write_u16(&mut self, address: u32, value: u16) -> BusResult;
    fn write_u32(&mut self, address: u32, value: u32) -> BusResult;
}

macro_rules! access_fns {
    ( $( $read_fn:ident, $write_fn:ident => $u:ident ),* $(,)? ) => {
        $(
            fn $read_fn(&mut self, address: u32) -> Result<$u, BusError> {
                let mut buf = [0u8; std::mem::size_of::<$u>()];
                self.read(&mut buf, address)?;
                Ok($u::from_le_bytes(buf))
            }

            fn $write_fn(&mut self, address: u32, value: $u) -> BusResult {
                self.write(address, &value.to_le_bytes())
            }
        )*
    };
}

impl<B: Bus + ?Sized> Memory for B {
    access_fns! {
        read_u8, write_u8 => u8,
        read_u16, write_u16 => u16,
        read_u32, write_u32 => u32,
    }
}
