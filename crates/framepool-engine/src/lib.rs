//! Signal-level models and the dual-clock frame engine.
//!
//! Provides the cycle-accurate allocator state machine, clocked write and
//! read ports, the stream-to-frame assembler that stands in for the
//! decode pipeline's output, a request/response allocation channel, and
//! [`FrameEngine`], which runs the write and read clock domains on their
//! own threads.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod alloc_unit;
pub mod assembler;
pub mod channel;
pub mod clock;
pub mod config;
mod domain;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod ports;

pub use alloc_unit::{AllocatorUnit, Phase};
pub use assembler::{Frame, FrameAssembler, StreamBeat};
pub use channel::{AllocChannel, AllocService};
pub use clock::Clock;
pub use config::{ClockConfig, ConfigError, EngineConfig};
pub use engine::{DeliveredFrame, FrameEngine, ShutdownReport};
pub use error::EngineError;
pub use metrics::EngineMetrics;
pub use ports::{ClockedReadPort, ClockedWritePort};
