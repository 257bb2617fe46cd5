//! Core types for the framepool workspace.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the bounded integer types that mirror the fixed-width hardware fields
//! (`request_size`, `MAU`, `RD_WIDTH`), the address and generation ids,
//! the per-cycle signal bundles, the width packing helpers, and the
//! error enums shared by the allocator and the storage engine.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod signal;
pub mod size;
pub mod width;

pub use error::{AllocError, RangeError, StorageError};
pub use id::{Addr, Cycle, Generation};
pub use signal::{AllocInputs, AllocOutputs, ReadInputs, ReadOutputs, WriteInputs};
pub use size::SizeRequest;
pub use width::{Ratio, Width};
