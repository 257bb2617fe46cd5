//! Block allocator and dual-port storage for framepool.
//!
//! The arena owns the backing memory of the frame pool and the free-space
//! state that partitions it. Addresses are index handles into that memory;
//! all access goes through allocator-issued [`Allocation`]s or through the
//! raw ports, which take addresses the allocator produced.
//!
//! # Architecture
//!
//! ```text
//! FramePool (orchestrator)
//! ├── BlockAllocator (write clock domain)
//! │   ├── BlockSizes (request validation + rounding)
//! │   └── IndexMap<Addr, LiveBlock> (grant order, ring cursor)
//! ├── WritePort ──┐
//! └── ReadPort  ──┴── Arc<SharedMemory> (atomic MAU-wide slots)
//! ```
//!
//! [`FramePool::split()`] hands the allocator and write port to the
//! producer half and the read port to the consumer half, so each can move
//! to its own thread.
//!
//! # Cross-domain contract
//!
//! The two ports never lock. Concurrent access to *different* slots is
//! always safe; reading a block while it is still being written yields
//! whatever the slots hold at that instant. Callers publish a finished
//! block to the read side through a channel, which is the only ordering
//! point between the domains.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod allocator;
pub mod config;
pub mod handle;
pub mod memory;
pub mod pool;
pub mod read;
pub mod size_class;
pub mod write;

// Public re-exports for the primary API surface.
pub use allocator::BlockAllocator;
pub use config::{ConfigError, PoolConfig};
pub use handle::Allocation;
pub use memory::SharedMemory;
pub use pool::{Consumer, FramePool, Producer};
pub use read::ReadPort;
pub use size_class::BlockSizes;
pub use write::{BlockWriter, WritePort};
