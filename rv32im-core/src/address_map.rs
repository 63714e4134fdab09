use crate::{address_range, AddressRange};
use std::cmp::Ordering;
use thiserror::Error;

/// Generic map of 32-bit address ranges to values of type `T`.
///
/// The ranges cannot overlap.
#[derive(Debug)]
pub struct AddressMap<T> {
    ordered_ranges: Vec<(AddressRange, T)>,
}

impl<T> Default for AddressMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> AddressMap<T> {
    /// Create new empty map.
    pub fn new() -> Self {
        Self {
            ordered_ranges: Vec::new(),
        }
    }

    /// Map `range` to `value`, keeping the ranges ordered.
    pub fn insert(&mut self, range: AddressRange, value: T) -> Result<(), AddressMapError> {
        let index = match self.search(range.start()) {
            Ok(_) => return Err(AddressMapError::OverlappingAddressRanges),
            Err(index) => index,
        };
        if let Some((next, _)) = self.ordered_ranges.get(index) {
            if range.overlaps(*next) {
                return Err(AddressMapError::OverlappingAddressRanges);
            }
        }
        self.ordered_ranges.insert(index, (range, value));
        Ok(())
    }

    /// Returns the address range that contains `address`.
    ///
    /// Note that even if `address` maps to a vacant region, that region's range will be returned.
    pub fn range(&self, address: u32) -> AddressRange {
        self.range_value(address).0
    }

    /// Returns the value that the address range containing `address` maps to, or `None` if that
    /// address range is vacant.
    pub fn value(&self, address: u32) -> Option<&T> {
        self.range_value(address).1
    }

    /// Returns the address range that contains `address`, and the value that it maps to.
    ///
    /// The second item will be `None` if `address` is in a vacant region.
    pub fn range_value(&self, address: u32) -> (AddressRange, Option<&T>) {
        match self.search(address) {
            Ok(index) => {
                let (range, value) = &self.ordered_ranges[index];
                (*range, Some(value))
            }
            Err(index) => (self.vacant_range(index), None),
        }
    }

    /// Mutable counterpart of [`range_value`](Self::range_value).
    pub fn range_value_mut(&mut self, address: u32) -> (AddressRange, Option<&mut T>) {
        match self.search(address) {
            Ok(index) => {
                let (range, value) = &mut self.ordered_ranges[index];
                (*range, Some(value))
            }
            Err(index) => (self.vacant_range(index), None),
        }
    }

    /// Iterate over all mapped ranges in ascending address order.
    pub fn iter(&self) -> impl Iterator<Item = (AddressRange, &T)> {
        self.ordered_ranges.iter().map(|(range, value)| (*range, value))
    }

    fn search(&self, address: u32) -> Result<usize, usize> {
        self.ordered_ranges.binary_search_by(|(range, _)| {
            if address < range.start() {
                Ordering::Greater
            } else if address <= range.end() {
                Ordering::Equal
            } else {
                Ordering::Less
            }
        })
    }

    /// Returns the vacant range that would be located at `index` in `ordered_ranges`.
    fn vacant_range(&self, index: usize) -> AddressRange {
        let start = index
            .checked_sub(1)
            .and_then(|i| self.ordered_ranges.get(i))
            // Cannot overflow: a range ending at `u32::MAX` leaves no vacant region after it.
            .map(|(range, _)| range.end() + 1)
            .unwrap_or(0);
        let end = self
            .ordered_ranges
            .get(index)
            // Cannot underflow: a range starting at `0` leaves no vacant region before it.
            .map(|(range, _)| range.start() - 1)
            .unwrap_or(u32::MAX);
        address_range![start, end]
    }
}

impl<T> TryFrom<Vec<(AddressRange, T)>> for AddressMap<T> {
    type Error = AddressMapError;

    fn try_from(mut value: Vec<(AddressRange, T)>) -> Result<Self, Self::Error> {
        value.sort_by_key(|(range, _)| range.start());

        let mut iter = value.iter();
        if let Some((mut prev_range, _)) = iter.next() {
            for &(range, _) in iter {
                if range.start() <= prev_range.end() {
                    return Err(AddressMapError::OverlappingAddressRanges);
                }
                prev_range = range;
            }
        }

        Ok(Self {
            ordered_ranges: value,
        })
    }
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum AddressMapError {
    /// Attempt to add an address range that overlaps with a previously added address range.
    #[error("address range overlaps with previously added address range")]
    OverlappingAddressRanges,
}

#[macro_export]
macro_rules! addr_map {
    ($([$start:expr, $end:expr] => $value:expr,)*) => {
        $crate::address_map::AddressMap::try_from(vec![
            $(($crate::address_range![$start, $end], $value)),*
        ]).unwrap()
    };
}
