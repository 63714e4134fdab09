use crate::bus::{Bus, BusError, BusResult};
use log::debug;
use std::fmt;
use thiserror::Error;

/// Byte-based RAM implementation with support for misaligned memory access.
///
/// Addresses are relative to the start of the RAM. Accesses that extend past the last byte are
/// rejected as a whole with [`BusError::AccessFault`].
#[derive(Clone, Eq, PartialEq)]
pub struct Ram {
    data: Box<[u8]>,
}

impl fmt::Debug for Ram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ram").field("len", &self.len()).finish()
    }
}

impl Ram {
    /// Create a new zero-initialized RAM resource that can hold `size` bytes.
    ///
    /// `size` must be at least one, and at most `1 << 32` (since it must be addressable by `u32`).
    /// If `size` does not satisfy these conditions, `None` is returned and nothing is allocated.
    pub fn new(size: usize) -> Option<Self> {
        if size == 0 || (usize::BITS > 32 && size as u64 > (1 << 32)) {
            None
        } else {
            Some(Self {
                data: vec![0u8; size].into_boxed_slice(),
            })
        }
    }

    /// Returns the size expressed in bytes. Guaranteed to be at least one.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Copy a program image into RAM starting at `offset`.
    pub fn load(&mut self, offset: u32, image: &[u8]) -> Result<(), LoadError> {
        let start = offset as usize;
        let end = start
            .checked_add(image.len())
            .filter(|&end| end <= self.len())
            .ok_or(LoadError::TooLarge {
                offset,
                image_size: image.len(),
                ram_size: self.len(),
            })?;
        debug!(
            "loading {} bytes into RAM at [{:#010x}..{:#010x})",
            image.len(),
            start,
            end
        );
        self.data[start..end].copy_from_slice(image);
        Ok(())
    }

    /// Returns the bytes backing `size` bytes at `address`, or `None` if out of range.
    fn slice(&self, address: u32, size: usize) -> Option<std::ops::Range<usize>> {
        const_assert!(usize::BITS >= 32);
        let start = address as usize;
        start
            .checked_add(size)
            .filter(|&end| end <= self.len())
            .map(|end| start..end)
    }
}

impl Bus for Ram {
    fn read(&mut self, buf: &mut [u8], address: u32) -> BusResult {
        self.read_pure(buf, address)
    }

    fn read_pure(&self, buf: &mut [u8], address: u32) -> BusResult {
        let range = self.slice(address, buf.len()).ok_or(BusError::AccessFault {
            address,
            size: buf.len(),
        })?;
        buf.copy_from_slice(&self.data[range]);
        Ok(())
    }

    fn write(&mut self, address: u32, buf: &[u8]) -> BusResult {
        let range = self.slice(address, buf.len()).ok_or(BusError::AccessFault {
            address,
            size: buf.len(),
        })?;
        self.data[range].copy_from_slice(buf);
        Ok(())
    }
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum LoadError {
    #[error("image ({image_size} bytes at offset {offset:#x}) is larger than memory ({ram_size} bytes)")]
    TooLarge {
        offset: u32,
        image_size: usize,
        ram_size: usize,
    },
    #[error("load address {address:#010x} is not backed by RAM")]
    Unmapped { address: u32 },
}
