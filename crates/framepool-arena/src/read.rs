//! Width-adapting read access to the pool.
//!
//! [`ReadPort`] returns one `RD_WIDTH`-wide word per read, packing
//! `RATIO` consecutive MAU-wide slots lowest-address-first. For an
//! allocation of `N` units the port produces exactly `ceil(N / RATIO)`
//! words, and splitting them in order gives back the `N` units.
//!
//! # Precondition
//!
//! Reading a block the write domain is still filling returns whatever
//! the slots hold at that moment. The port does not detect this; callers
//! read only blocks that have been handed over as complete.

use std::sync::Arc;

use framepool_core::{Addr, Ratio, StorageError};

use crate::handle::Allocation;
use crate::memory::SharedMemory;

/// Read port with a fixed width ratio.
#[derive(Clone)]
pub struct ReadPort {
    memory: Arc<SharedMemory>,
    ratio: Ratio,
}

impl ReadPort {
    pub(crate) fn new(memory: Arc<SharedMemory>, ratio: Ratio) -> Self {
        Self { memory, ratio }
    }

    /// The width ratio this port reads at.
    pub fn ratio(&self) -> Ratio {
        self.ratio
    }

    /// Read one word starting at `addr`.
    ///
    /// `addr` must be a multiple of `RATIO` and the whole word must lie
    /// inside the pool.
    pub fn read_word(&self, addr: Addr) -> Result<u64, StorageError> {
        let ratio = self.ratio.get();
        if addr.0 % ratio != 0 {
            return Err(StorageError::Misaligned { addr, ratio });
        }
        let units = self.memory.load_run(addr, ratio)?;
        Ok(self.ratio.pack(units))
    }

    /// Read the `ceil(N / RATIO)` words that cover `allocation`.
    pub fn read_block(&self, allocation: &Allocation) -> Result<Vec<u64>, StorageError> {
        let words = self.ratio.words_for(allocation.len() as usize);
        let step = self.ratio.get();
        (0..words as u32)
            .map(|i| self.read_word(allocation.addr().offset(i * step)))
            .collect()
    }

    /// Read `allocation` and split it back into its `N` write units.
    pub fn drain_units(&self, allocation: &Allocation) -> Result<Vec<u64>, StorageError> {
        let words = self.read_block(allocation)?;
        Ok(self.ratio.reassemble(&words, allocation.len() as usize))
    }

    /// The shared memory behind this port.
    pub fn memory(&self) -> &Arc<SharedMemory> {
        &self.memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::BlockAllocator;
    use crate::size_class::BlockSizes;
    use crate::write::WritePort;
    use framepool_core::{SizeRequest, Width};

    fn ports(rd_width: Width) -> (BlockAllocator, WritePort, ReadPort) {
        let memory = Arc::new(SharedMemory::new(64, Width::Bits8));
        let ratio = Ratio::new(Width::Bits8, rd_width).unwrap();
        (
            BlockAllocator::new(BlockSizes::new(4, 16), 64),
            WritePort::new(Arc::clone(&memory)),
            ReadPort::new(memory, ratio),
        )
    }

    #[test]
    fn same_width_read_returns_units() {
        let (mut alloc, w, r) = ports(Width::Bits8);
        let a = alloc.allocate(SizeRequest::new(16).unwrap()).unwrap();
        w.block(a).extend(0..16).unwrap();
        let words = r.read_block(&a).unwrap();
        assert_eq!(words, (0..16).collect::<Vec<u64>>());
    }

    #[test]
    fn wide_read_packs_four_units() {
        let (mut alloc, w, r) = ports(Width::Bits32);
        let a = alloc.allocate(SizeRequest::new(16).unwrap()).unwrap();
        w.block(a).extend(0..16).unwrap();
        let words = r.read_block(&a).unwrap();
        assert_eq!(
            words,
            vec![0x0302_0100, 0x0706_0504, 0x0b0a_0908, 0x0f0e_0d0c]
        );
        assert_eq!(r.drain_units(&a).unwrap(), (0..16).collect::<Vec<u64>>());
    }

    #[test]
    fn partial_last_word() {
        let (mut alloc, w, r) = ports(Width::Bits32);
        let a = alloc.allocate(SizeRequest::new(6).unwrap()).unwrap();
        w.block(a).extend([1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(r.read_block(&a).unwrap().len(), 2);
        assert_eq!(r.drain_units(&a).unwrap(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn misaligned_wide_read() {
        let (_, _, r) = ports(Width::Bits32);
        assert_eq!(
            r.read_word(Addr(2)),
            Err(StorageError::Misaligned {
                addr: Addr(2),
                ratio: 4
            })
        );
    }

    #[test]
    fn read_past_end() {
        let (_, _, r) = ports(Width::Bits32);
        assert!(matches!(
            r.read_word(Addr(64)),
            Err(StorageError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn empty_allocation_reads_nothing() {
        let (mut alloc, _, r) = ports(Width::Bits32);
        let a = alloc.allocate(SizeRequest::new(0).unwrap()).unwrap();
        assert!(r.read_block(&a).unwrap().is_empty());
    }
}
