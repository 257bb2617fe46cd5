//! Strongly-typed addresses, generations, and cycle counters.

use std::fmt;

/// Linear address of a storage slot, in MAU-sized units.
///
/// Addresses are index handles into the pool, never pointers. `Addr(n)`
/// names the n-th write unit of the backing memory; a wide read at `n`
/// covers slots `n..n + RATIO`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Addr(pub u32);

impl Addr {
    /// Address `n` units past this one.
    pub fn offset(self, n: u32) -> Self {
        Self(self.0 + n)
    }

    /// The address as a slot index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

impl From<u32> for Addr {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Pool epoch.
///
/// Incremented each time the pool is reset. An allocation handle carries
/// the generation it was granted in, so a handle that outlived a reset can
/// be recognised as stale in O(1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Generation(pub u32);

impl Generation {
    /// The generation after this one, wrapping at `u32::MAX`.
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Generation {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Monotonically increasing clock edge counter for one clock domain.
///
/// Each domain keeps its own counter; cycles from different domains are
/// not comparable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Cycle(pub u64);

impl Cycle {
    /// Number of cycles elapsed since `earlier`, saturating at zero.
    pub fn since(self, earlier: Cycle) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Cycle {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addr_offset_and_display() {
        let a = Addr(0x10);
        assert_eq!(a.offset(4), Addr(0x14));
        assert_eq!(a.index(), 16);
        assert_eq!(a.to_string(), "0x0010");
    }

    #[test]
    fn generation_wraps() {
        assert_eq!(Generation(u32::MAX).next(), Generation(0));
        assert_eq!(Generation(3).next(), Generation(4));
    }

    #[test]
    fn cycle_since_saturates() {
        assert_eq!(Cycle(10).since(Cycle(4)), 6);
        assert_eq!(Cycle(4).since(Cycle(10)), 0);
    }
}
