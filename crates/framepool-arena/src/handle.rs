//! Allocation handles.
//!
//! An [`Allocation`] names a granted block by its base address. It is
//! generation-scoped: the `generation` field allows an O(1) staleness
//! check after the pool has been reset.

use std::fmt;
use std::ops::Range;

use framepool_core::{Addr, Generation, SizeRequest};

/// A granted, non-overlapping range of storage slots.
///
/// `size` is the requested length and bounds the writable range
/// `[addr, addr + size)`. `block_units` is the rounded length the
/// allocator actually reserved; the slots between the two are padding
/// that the wide read port may touch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct Allocation {
    pub(crate) addr: Addr,
    pub(crate) size: SizeRequest,
    pub(crate) block_units: u32,
    pub(crate) generation: Generation,
}

impl Allocation {
    pub(crate) fn new(
        addr: Addr,
        size: SizeRequest,
        block_units: u32,
        generation: Generation,
    ) -> Self {
        Self {
            addr,
            size,
            block_units,
            generation,
        }
    }

    /// Base address (`o_addr`).
    pub fn addr(&self) -> Addr {
        self.addr
    }

    /// Requested length.
    pub fn size(&self) -> SizeRequest {
        self.size
    }

    /// Requested length in units.
    pub fn len(&self) -> u32 {
        self.size.units()
    }

    /// Whether the request was for zero units.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reserved length in units, after rounding.
    pub fn block_units(&self) -> u32 {
        self.block_units
    }

    /// Pool generation the block was granted in.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Writable slot range `[addr, addr + size)`.
    pub fn range(&self) -> Range<u32> {
        self.addr.0..self.addr.0 + self.len()
    }

    /// Reserved slot range `[addr, addr + block_units)`.
    pub fn block_range(&self) -> Range<u32> {
        self.addr.0..self.addr.0 + self.block_units
    }

    /// Whether the reserved ranges of two allocations intersect.
    pub fn overlaps(&self, other: &Allocation) -> bool {
        let a = self.block_range();
        let b = other.block_range();
        a.start < b.end && b.start < a.end
    }
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Allocation(addr={}, size={}, block={}, gen={})",
            self.addr, self.size, self.block_units, self.generation
        )
    }
}
