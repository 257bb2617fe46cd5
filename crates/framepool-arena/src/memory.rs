//! Shared backing memory.
//!
//! [`SharedMemory`] is a fixed array of MAU-wide slots held behind an
//! `Arc` by both ports. Each slot is an atomic, so the write and read
//! halves can run on different threads without a lock.

use std::sync::atomic::{AtomicU32, Ordering};

use framepool_core::{Addr, StorageError, Width};

/// Fixed-capacity slot array.
///
/// Slot loads and stores are `Relaxed`. Visibility of a finished block
/// to the read domain comes from the hand-off that publishes it (a
/// channel send/recv pair), not from the slots themselves.
pub struct SharedMemory {
    slots: Box<[AtomicU32]>,
    mau: Width,
}

// Compile-time assertion: SharedMemory must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<SharedMemory>();
};

impl SharedMemory {
    /// Allocate `capacity` zeroed slots of `mau` width.
    ///
    /// # Panics
    ///
    /// Panics if `mau` is 64 bits. [`Ratio::new`](framepool_core::Ratio::new)
    /// rejects that pairing, so configs that validated never hit it.
    pub fn new(capacity: u32, mau: Width) -> Self {
        assert!(mau != Width::Bits64, "slots hold at most 32 bits");
        let slots = (0..capacity).map(|_| AtomicU32::new(0)).collect();
        Self { slots, mau }
    }

    /// Number of slots.
    pub fn capacity(&self) -> u32 {
        self.slots.len() as u32
    }

    /// Slot width.
    pub fn mau(&self) -> Width {
        self.mau
    }

    /// Check that `[addr, addr + len)` lies inside the pool.
    pub fn check_range(&self, addr: Addr, len: u32) -> Result<(), StorageError> {
        let end = addr.0 as u64 + len as u64;
        if end > self.slots.len() as u64 {
            return Err(StorageError::OutOfBounds {
                addr,
                len,
                capacity: self.capacity(),
            });
        }
        Ok(())
    }

    /// Store one unit.
    pub fn store(&self, addr: Addr, value: u64) -> Result<(), StorageError> {
        if !self.mau.fits(value) {
            return Err(StorageError::ValueTooWide {
                value,
                mau: self.mau,
            });
        }
        self.check_range(addr, 1)?;
        self.slots[addr.index()].store(value as u32, Ordering::Relaxed);
        Ok(())
    }

    /// Load one unit.
    pub fn load(&self, addr: Addr) -> Result<u64, StorageError> {
        self.check_range(addr, 1)?;
        Ok(self.slots[addr.index()].load(Ordering::Relaxed) as u64)
    }

    /// Load `len` consecutive units starting at `addr`.
    pub fn load_run(
        &self,
        addr: Addr,
        len: u32,
    ) -> Result<impl Iterator<Item = u64> + '_, StorageError> {
        self.check_range(addr, len)?;
        let start = addr.index();
        Ok(self.slots[start..start + len as usize]
            .iter()
            .map(|slot| slot.load(Ordering::Relaxed) as u64))
    }

    /// Memory usage of the slot array in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.slots.len() * std::mem::size_of::<AtomicU32>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_memory_is_zeroed() {
        let mem = SharedMemory::new(16, Width::Bits8);
        assert_eq!(mem.capacity(), 16);
        assert!((0..16).all(|i| mem.load(Addr(i)).unwrap() == 0));
    }

    #[test]
    fn store_then_load() {
        let mem = SharedMemory::new(16, Width::Bits8);
        mem.store(Addr(3), 0xab).unwrap();
        assert_eq!(mem.load(Addr(3)).unwrap(), 0xab);
    }

    #[test]
    fn store_rejects_wide_value() {
        let mem = SharedMemory::new(16, Width::Bits8);
        assert_eq!(
            mem.store(Addr(0), 0x100),
            Err(StorageError::ValueTooWide {
                value: 0x100,
                mau: Width::Bits8
            })
        );
    }

    #[test]
    fn out_of_bounds_access() {
        let mem = SharedMemory::new(16, Width::Bits16);
        assert!(matches!(
            mem.load(Addr(16)),
            Err(StorageError::OutOfBounds { .. })
        ));
        assert!(mem.check_range(Addr(12), 4).is_ok());
        assert!(mem.check_range(Addr(13), 4).is_err());
    }

    #[test]
    fn load_run_reads_in_order() {
        let mem = SharedMemory::new(8, Width::Bits8);
        for i in 0..8 {
            mem.store(Addr(i), i as u64 * 2).unwrap();
        }
        let run: Vec<u64> = mem.load_run(Addr(2), 3).unwrap().collect();
        assert_eq!(run, vec![4, 6, 8]);
    }
}
