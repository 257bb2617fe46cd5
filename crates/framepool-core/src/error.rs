//! Error types for the allocator and storage engine.
//!
//! Organised by subsystem: bounded-type construction, allocation, and
//! storage access. Allocation errors are the software form of the `o_err`
//! flag; storage errors cover accesses the hardware would silently corrupt.

use std::error::Error;
use std::fmt;

use crate::id::{Addr, Generation};
use crate::width::Width;

/// A value did not fit the bounded type it was being converted into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RangeError {
    /// Size request wider than the 5-bit `request_size` bus.
    SizeRequest {
        /// The rejected value.
        value: u32,
    },
    /// Bit count that is not a supported port width.
    Width {
        /// The rejected bit count.
        bits: u32,
    },
    /// `RD_WIDTH` is not a whole multiple of `MAU`, or `MAU` is wider
    /// than a storage slot.
    Ratio {
        /// Write unit width.
        mau: Width,
        /// Read word width.
        rd_width: Width,
    },
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeRequest { value } => {
                write!(f, "size request {value} does not fit in 5 bits")
            }
            Self::Width { bits } => write!(f, "unsupported port width: {bits} bits"),
            Self::Ratio { mau, rd_width } => {
                write!(f, "read width {rd_width} is not a multiple of MAU {mau}")
            }
        }
    }
}

impl Error for RangeError {}

/// Reasons an allocation request is refused.
///
/// A refused request never changes free-space state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// The request exceeds the maximum supported block size.
    RequestTooLarge {
        /// Requested units.
        requested: u32,
        /// Largest grantable request.
        max: u32,
    },
    /// No contiguous free range is large enough for the rounded block.
    PoolExhausted {
        /// Block units the request rounded up to.
        requested: u32,
        /// Longest contiguous free run at the time of the request.
        largest_free: u32,
    },
    /// Release of an address that is not the base of a live block.
    NotLive {
        /// The address passed to release.
        addr: Addr,
    },
    /// An allocation handle from a generation that has since been reset.
    StaleHandle {
        /// The generation encoded in the handle.
        handle_generation: Generation,
        /// The pool's current generation.
        current: Generation,
    },
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestTooLarge { requested, max } => {
                write!(f, "request of {requested} units exceeds maximum block size {max}")
            }
            Self::PoolExhausted {
                requested,
                largest_free,
            } => {
                write!(
                    f,
                    "pool exhausted: block of {requested} units, largest free run {largest_free}"
                )
            }
            Self::NotLive { addr } => write!(f, "address {addr} is not a live block"),
            Self::StaleHandle {
                handle_generation,
                current,
            } => {
                write!(
                    f,
                    "stale handle: generation {handle_generation}, current {current}"
                )
            }
        }
    }
}

impl Error for AllocError {}

/// Storage accesses that cannot be carried out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageError {
    /// The access runs past the end of the pool.
    OutOfBounds {
        /// First slot of the access.
        addr: Addr,
        /// Slots the access touches.
        len: u32,
        /// Pool capacity in slots.
        capacity: u32,
    },
    /// A wide read whose address is not a multiple of the width ratio.
    Misaligned {
        /// The offending address.
        addr: Addr,
        /// Required alignment in slots.
        ratio: u32,
    },
    /// A write value with bits set above the write unit width.
    ValueTooWide {
        /// The rejected value.
        value: u64,
        /// The write unit width.
        mau: Width,
    },
    /// A block writer was asked to write past the end of its allocation.
    BlockOverrun {
        /// Base of the allocation.
        base: Addr,
        /// Allocation length in units.
        size: u32,
    },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds {
                addr,
                len,
                capacity,
            } => {
                write!(
                    f,
                    "access of {len} slots at {addr} exceeds capacity {capacity}"
                )
            }
            Self::Misaligned { addr, ratio } => {
                write!(f, "read at {addr} is not aligned to {ratio} slots")
            }
            Self::ValueTooWide { value, mau } => {
                write!(f, "value {value:#x} does not fit in a {mau} unit")
            }
            Self::BlockOverrun { base, size } => {
                write!(f, "write past end of {size}-unit block at {base}")
            }
        }
    }
}

impl Error for StorageError {}
