//! framepool: a size-validating frame allocator with dual-clock,
//! asymmetric-width storage for network packet pipelines.
//!
//! This is the facade crate that re-exports the public API from the
//! framepool sub-crates. For most users, adding `framepool` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use framepool::prelude::*;
//!
//! // 8-bit writes, 32-bit reads: RATIO = 4.
//! let mut pool = FramePool::new(PoolConfig::new(64).with_rd_width(Width::Bits32)).unwrap();
//!
//! let block = pool.allocate(SizeRequest::new(6).unwrap()).unwrap();
//! pool.writer().block(block).extend([1, 2, 3, 4, 5, 6]).unwrap();
//!
//! let words = pool.reader().read_block(&block).unwrap();
//! assert_eq!(words, vec![0x0403_0201, 0x0000_0605]);
//! assert_eq!(pool.reader().drain_units(&block).unwrap(), vec![1, 2, 3, 4, 5, 6]);
//!
//! // Oversize requests are refused without touching free space.
//! assert!(pool.allocate(SizeRequest::new(18).unwrap()).is_err());
//! pool.release(&block).unwrap();
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `framepool-core` | Bounded sizes and widths, addresses, signal bundles, errors |
//! | [`arena`] | `framepool-arena` | Block allocator, shared storage, write and read ports |
//! | [`engine`] | `framepool-engine` | Allocator FSM, clocked ports, dual-clock engine |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Bounded types, signal bundles and error enums (`framepool-core`).
pub use framepool_core as types;

/// Block allocator and dual-port storage (`framepool-arena`).
///
/// [`arena::FramePool`] is the entry point; [`arena::FramePool::split()`]
/// separates it into write-domain and read-domain halves.
pub use framepool_arena as arena;

/// Cycle-level models and the dual-clock engine (`framepool-engine`).
///
/// [`engine::AllocatorUnit`] for signal-level work,
/// [`engine::FrameEngine`] for threaded producer/consumer operation.
pub use framepool_engine as engine;

/// Common imports for typical framepool usage.
///
/// ```rust
/// use framepool::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use framepool_core::{Addr, Ratio, SizeRequest, Width};

    // Errors
    pub use framepool_core::{AllocError, StorageError};

    // Arena
    pub use framepool_arena::{Allocation, FramePool, PoolConfig};

    // Engine
    pub use framepool_engine::{
        AllocatorUnit, EngineConfig, EngineError, Frame, FrameEngine, StreamBeat,
    };
}
