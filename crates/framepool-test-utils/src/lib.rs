//! Test utilities for framepool development.
//!
//! Provides payload generators ([`ramp_payload`], [`seeded_payload`]), a
//! bounded pulse waiter ([`CycleHarness`]) for signal-level tests, and
//! [`init_test_tracing`] for log output under `cargo test`.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
pub mod harness;

pub use fixtures::{ramp_payload, seeded_payload};
pub use harness::{init_test_tracing, CycleHarness, Pulse};
