//! Frame pool orchestrator.
//!
//! [`FramePool`] is the top-level arena type. It owns the allocator, the
//! backing memory, and both ports. Single-threaded callers use it
//! directly; callers with separate write and read clock domains
//! [`split()`](FramePool::split) it into a [`Producer`] (allocator + write
//! port) and a [`Consumer`] (read port).

use std::sync::Arc;

use tracing::debug;

use framepool_core::{AllocError, SizeRequest};

use crate::allocator::BlockAllocator;
use crate::config::{ConfigError, PoolConfig};
use crate::handle::Allocation;
use crate::memory::SharedMemory;
use crate::read::ReadPort;
use crate::write::WritePort;

/// Allocator, backing memory, and both ports.
pub struct FramePool {
    config: PoolConfig,
    allocator: BlockAllocator,
    write: WritePort,
    read: ReadPort,
}

impl FramePool {
    /// Create a pool. Validates `config` first.
    pub fn new(config: PoolConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let ratio = config.ratio()?;
        let memory = Arc::new(SharedMemory::new(config.capacity_units, config.mau));
        debug!(
            capacity = config.capacity_units,
            mau = %config.mau,
            rd_width = %config.rd_width,
            max_request = config.max_request_units,
            "frame pool created"
        );
        Ok(Self {
            allocator: BlockAllocator::new(config.block_sizes(), config.capacity_units),
            write: WritePort::new(Arc::clone(&memory)),
            read: ReadPort::new(memory, ratio),
            config,
        })
    }

    /// Validate a request and reserve a block for it.
    pub fn allocate(&mut self, request: SizeRequest) -> Result<Allocation, AllocError> {
        self.allocator.allocate(request)
    }

    /// Release a previously granted block.
    pub fn release(&mut self, allocation: &Allocation) -> Result<(), AllocError> {
        self.allocator.release_allocation(allocation)
    }

    /// Drop every block and start a new generation.
    pub fn reset(&mut self) {
        self.allocator.reset();
    }

    /// The configuration this pool was built from.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Free-space state.
    pub fn allocator(&self) -> &BlockAllocator {
        &self.allocator
    }

    /// The write port.
    pub fn writer(&self) -> &WritePort {
        &self.write
    }

    /// The read port.
    pub fn reader(&self) -> &ReadPort {
        &self.read
    }

    /// Split into write-domain and read-domain halves.
    pub fn split(self) -> (Producer, Consumer) {
        (
            Producer {
                allocator: self.allocator,
                port: self.write,
            },
            Consumer { port: self.read },
        )
    }
}

/// Write clock domain half: the allocator and the write port.
pub struct Producer {
    allocator: BlockAllocator,
    port: WritePort,
}

impl Producer {
    /// Validate a request and reserve a block for it.
    pub fn allocate(&mut self, request: SizeRequest) -> Result<Allocation, AllocError> {
        self.allocator.allocate(request)
    }

    /// Release a previously granted block.
    pub fn release(&mut self, allocation: &Allocation) -> Result<(), AllocError> {
        self.allocator.release_allocation(allocation)
    }

    /// Free-space state.
    pub fn allocator(&self) -> &BlockAllocator {
        &self.allocator
    }

    /// The write port.
    pub fn port(&self) -> &WritePort {
        &self.port
    }

    /// Take the allocator and port apart.
    pub fn into_parts(self) -> (BlockAllocator, WritePort) {
        (self.allocator, self.port)
    }
}

/// Read clock domain half: the read port.
///
/// Cheap to clone; every clone reads the same memory.
#[derive(Clone)]
pub struct Consumer {
    port: ReadPort,
}

impl Consumer {
    /// The read port.
    pub fn port(&self) -> &ReadPort {
        &self.port
    }

    /// Take the read port out.
    pub fn into_port(self) -> ReadPort {
        self.port
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framepool_core::Width;

    fn req(units: u32) -> SizeRequest {
        SizeRequest::new(units).unwrap()
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(FramePool::new(PoolConfig::new(3)).is_err());
    }

    #[test]
    fn second_block_never_disturbs_first() {
        let mut pool = FramePool::new(PoolConfig::default()).unwrap();
        let first = pool.allocate(req(16)).unwrap();
        pool.writer().block(first).extend(0..16).unwrap();

        let second = pool.allocate(req(8)).unwrap();
        assert!(!first.overlaps(&second));
        pool.writer().block(second).extend([0xff; 8]).unwrap();

        assert_eq!(
            pool.reader().drain_units(&first).unwrap(),
            (0..16).collect::<Vec<u64>>()
        );
        assert_eq!(pool.reader().drain_units(&second).unwrap(), vec![0xff; 8]);
    }

    #[test]
    fn split_halves_share_memory() {
        let pool = FramePool::new(PoolConfig::new(64).with_rd_width(Width::Bits16)).unwrap();
        let (mut producer, consumer) = pool.split();
        let a = producer.allocate(req(4)).unwrap();
        producer.port().block(a).extend([1, 2, 3, 4]).unwrap();
        assert_eq!(consumer.port().read_block(&a).unwrap(), vec![0x0201, 0x0403]);
        producer.release(&a).unwrap();
        assert_eq!(producer.allocator().live_count(), 0);
    }

    #[test]
    fn reset_invalidates_handles() {
        let mut pool = FramePool::new(PoolConfig::default()).unwrap();
        let a = pool.allocate(req(4)).unwrap();
        pool.reset();
        assert!(matches!(
            pool.release(&a),
            Err(AllocError::StaleHandle { .. })
        ));
    }
}
