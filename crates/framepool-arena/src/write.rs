//! Write-side access to the pool.
//!
//! [`WritePort`] is the raw write port: one MAU-wide unit at a
//! caller-supplied address. [`BlockWriter`] wraps it for one allocation
//! and advances the running address itself, refusing to step outside
//! `[addr, addr + size)`.

use std::sync::Arc;

use framepool_core::{Addr, StorageError};

use crate::handle::Allocation;
use crate::memory::SharedMemory;

/// Raw write port.
///
/// Writes are confined to the pool but not to any allocation; confining
/// them to a granted range is the caller's job (or use [`BlockWriter`]).
#[derive(Clone)]
pub struct WritePort {
    memory: Arc<SharedMemory>,
}

impl WritePort {
    pub(crate) fn new(memory: Arc<SharedMemory>) -> Self {
        Self { memory }
    }

    /// Write one unit at `addr`.
    pub fn write(&self, addr: Addr, unit: u64) -> Result<(), StorageError> {
        self.memory.store(addr, unit)
    }

    /// Write `units` at consecutive addresses starting at `base`.
    ///
    /// The whole range is bounds-checked before the first store, so an
    /// out-of-range run writes nothing.
    pub fn write_run(&self, base: Addr, units: &[u64]) -> Result<(), StorageError> {
        self.memory.check_range(base, units.len() as u32)?;
        for (i, &unit) in units.iter().enumerate() {
            self.memory.store(base.offset(i as u32), unit)?;
        }
        Ok(())
    }

    /// Start a sequential writer for `allocation`.
    pub fn block(&self, allocation: Allocation) -> BlockWriter<'_> {
        BlockWriter {
            port: self,
            allocation,
            cursor: 0,
        }
    }

    /// Pool capacity in slots.
    pub fn capacity(&self) -> u32 {
        self.memory.capacity()
    }

    /// The shared memory behind this port.
    pub fn memory(&self) -> &Arc<SharedMemory> {
        &self.memory
    }
}

/// Sequential writer bounded by one allocation.
///
/// Each [`push()`](Self::push) writes at the running address and advances
/// it, as the write port does when `wr_en` is held for consecutive cycles.
pub struct BlockWriter<'a> {
    port: &'a WritePort,
    allocation: Allocation,
    cursor: u32,
}

impl BlockWriter<'_> {
    /// Write the next unit.
    pub fn push(&mut self, unit: u64) -> Result<(), StorageError> {
        if self.cursor >= self.allocation.len() {
            return Err(StorageError::BlockOverrun {
                base: self.allocation.addr(),
                size: self.allocation.len(),
            });
        }
        self.port
            .write(self.allocation.addr().offset(self.cursor), unit)?;
        self.cursor += 1;
        Ok(())
    }

    /// Write every unit of `units` in order, stopping at the first error.
    pub fn extend<I>(&mut self, units: I) -> Result<(), StorageError>
    where
        I: IntoIterator<Item = u64>,
    {
        for unit in units {
            self.push(unit)?;
        }
        Ok(())
    }

    /// The address the next unit goes to.
    pub fn next_addr(&self) -> Addr {
        self.allocation.addr().offset(self.cursor)
    }

    /// Units written so far.
    pub fn written(&self) -> u32 {
        self.cursor
    }

    /// Units left before the allocation is full.
    pub fn remaining(&self) -> u32 {
        self.allocation.len() - self.cursor
    }

    /// Whether every unit of the allocation has been written.
    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }

    /// Finish writing and hand back the allocation.
    pub fn finish(self) -> Allocation {
        self.allocation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::BlockAllocator;
    use crate::size_class::BlockSizes;
    use framepool_core::{SizeRequest, Width};

    fn setup() -> (BlockAllocator, WritePort) {
        let memory = Arc::new(SharedMemory::new(64, Width::Bits8));
        (
            BlockAllocator::new(BlockSizes::new(4, 16), 64),
            WritePort::new(memory),
        )
    }

    #[test]
    fn block_writer_advances_address() {
        let (mut alloc, port) = setup();
        let a = alloc.allocate(SizeRequest::new(3).unwrap()).unwrap();
        let mut w = port.block(a);
        assert_eq!(w.next_addr(), a.addr());
        w.extend([7, 8, 9]).unwrap();
        assert!(w.is_full());
        let a = w.finish();
        let mem = port.memory();
        let stored: Vec<u64> = mem.load_run(a.addr(), 3).unwrap().collect();
        assert_eq!(stored, vec![7, 8, 9]);
    }

    #[test]
    fn block_writer_refuses_overrun() {
        let (mut alloc, port) = setup();
        let a = alloc.allocate(SizeRequest::new(2).unwrap()).unwrap();
        let mut w = port.block(a);
        w.extend([1, 2]).unwrap();
        assert_eq!(
            w.push(3),
            Err(StorageError::BlockOverrun {
                base: a.addr(),
                size: 2
            })
        );
        // Padding slot past the requested size is untouched.
        assert_eq!(port.memory().load(a.addr().offset(2)).unwrap(), 0);
    }

    #[test]
    fn write_run_is_all_or_nothing() {
        let (_, port) = setup();
        assert!(port.write_run(Addr(62), &[1, 2, 3]).is_err());
        assert_eq!(port.memory().load(Addr(62)).unwrap(), 0);
    }
}
