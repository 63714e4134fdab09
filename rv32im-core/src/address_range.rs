use std::fmt;
use std::fmt::{Display, Formatter};
use std::ops::{Range, RangeInclusive};
use thiserror::Error;

/// A non-empty range in a 32-bit address space bounded inclusively below and above.
///
/// Enforces the invariant that `self.start() <= self.end()`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AddressRange {
    start: u32,
    end: u32,
}

impl Default for AddressRange {
    fn default() -> Self {
        Self::full()
    }
}

impl Display for AddressRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#x}, {:#x}]", self.start, self.end)
    }
}

impl AddressRange {
    pub fn new(start: u32, end: u32) -> Result<Self, InvalidBoundsError> {
        (start <= end)
            .then_some(Self { start, end })
            .ok_or(InvalidBoundsError { start, end })
    }

    /// Create the range of `size` bytes starting at `base`.
    ///
    /// Fails if `size` is zero or if the range would run past the end of the address space.
    pub fn with_size(base: u32, size: u32) -> Result<Self, InvalidBoundsError> {
        match size.checked_sub(1).and_then(|delta| base.checked_add(delta)) {
            Some(end) => Self::new(base, end),
            None => Err(InvalidBoundsError {
                start: base,
                end: base.wrapping_add(size),
            }),
        }
    }

    /// Create a new address range covering all possible 32-bit addresses.
    pub fn full() -> Self {
        Self {
            start: 0,
            end: u32::MAX,
        }
    }

    pub fn start(self) -> u32 {
        self.start
    }

    pub fn end(self) -> u32 {
        self.end
    }

    /// Check if an address is contained within this address range.
    pub fn contains(self, address: u32) -> bool {
        self.start <= address && address <= self.end
    }

    /// Check if the `size` bytes starting at `address` all lie within this range.
    ///
    /// An access of size `0` is contained if `address` is.
    pub fn contains_access(self, address: u32, size: usize) -> bool {
        if !self.contains(address) {
            return false;
        }
        match size.checked_sub(1) {
            None => true,
            Some(delta) => u32::try_from(delta)
                .map(|delta| self.end - address >= delta)
                .unwrap_or(false),
        }
    }

    /// Returns `self.end() - self.start()`, which is the size minus 1.
    ///
    /// This value is always within the range `0..=u32::MAX`.
    pub fn delta(self) -> u32 {
        self.end - self.start
    }

    /// Returns the size of this address range if it is representable by a `usize`, or `None`
    /// otherwise.
    pub fn size(self) -> Option<usize> {
        usize::try_from(self.delta())
            .ok()
            .and_then(|n| n.checked_add(1))
    }

    /// Returns `true` if both ranges share at least one address.
    pub fn overlaps(self, other: Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl TryFrom<RangeInclusive<u32>> for AddressRange {
    type Error = InvalidBoundsError;

    fn try_from(value: RangeInclusive<u32>) -> Result<Self, Self::Error> {
        Self::new(*value.start(), *value.end())
    }
}

impl TryFrom<Range<u32>> for AddressRange {
    type Error = InvalidBoundsError;

    fn try_from(value: Range<u32>) -> Result<Self, Self::Error> {
        match value.end.checked_sub(1) {
            Some(end) => Self::new(value.start, end),
            None => Err(InvalidBoundsError {
                start: value.start,
                end: value.end,
            }),
        }
    }
}

impl From<AddressRange> for RangeInclusive<u32> {
    fn from(value: AddressRange) -> Self {
        value.start..=value.end
    }
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[error("bounds [{start:#x}, {end:#x}] do not form a valid 32-bit address range")]
pub struct InvalidBoundsError {
    start: u32,
    end: u32,
}

#[macro_export]
macro_rules! address_range {
    ($start:expr, $end:expr) => {
        $crate::address_range::AddressRange::new($start, $end).unwrap()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_size() {
        let range = AddressRange::with_size(0x8000_0000, 12).unwrap();
        assert_eq!(0x8000_0000, range.start());
        assert_eq!(0x8000_000B, range.end());
        assert_eq!(Some(12), range.size());
        assert!(AddressRange::with_size(0, 0).is_err());
        assert!(AddressRange::with_size(u32::MAX, 2).is_err());
        assert_eq!(Some(1), AddressRange::with_size(u32::MAX, 1).unwrap().size());
    }

    #[test]
    fn test_contains_access() {
        let range = address_range![0x100, 0x10F];
        assert!(range.contains_access(0x100, 4));
        assert!(range.contains_access(0x10C, 4));
        assert!(!range.contains_access(0x10D, 4));
        assert!(!range.contains_access(0xFF, 1));
        assert!(range.contains_access(0x10F, 0));
        assert!(AddressRange::full().contains_access(u32::MAX, 1));
        assert!(!AddressRange::full().contains_access(u32::MAX, 2));
    }

    #[test]
    fn test_overlaps() {
        let a = address_range![0x0, 0xFF];
        assert!(a.overlaps(address_range![0xFF, 0x1FF]));
        assert!(!a.overlaps(address_range![0x100, 0x1FF]));
    }

    #[test]
    fn test_from_exclusive_range() {
        assert_eq!(address_range![0, 15], AddressRange::try_from(0..16).unwrap());
        assert!(AddressRange::try_from(0..0).is_err());
    }
}
